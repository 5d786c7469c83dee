use thiserror::Error;

use crate::flows::BookingTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("validation failed for `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("no units available in any configured branch for the requested period")]
    AvailabilityExhausted,
    #[error(transparent)]
    Transition(#[from] BookingTransitionError),
    #[error("booking invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] BookingError),
    #[error("external service `{service}` failed: {reason}")]
    ExternalService { service: &'static str, reason: String },
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("no availability: {message}")]
    NoAvailability { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NoAvailability { .. } => {
                "No units are available for the selected dates. Try different dates or equipment."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NoAvailability { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(BookingError::AvailabilityExhausted) => Self::NoAvailability {
                message: "all configured branches are exhausted".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Domain(BookingError::Validation { .. })
            | ApplicationError::Domain(BookingError::Transition(_)) => Self::BadRequest {
                message: "booking validation failed".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Domain(BookingError::InvariantViolation(message)) => Self::Internal {
                message,
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::ExternalService { service, reason } => Self::ServiceUnavailable {
                message: format!("{service}: {reason}"),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
