use serde::{Deserialize, Serialize};

/// Named booking stages. Branching is explicit in the transition table;
/// `NoAvailability` and `Abandoned` are terminal failure exits,
/// `ReturnComplete` is the terminal success.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingState {
    BranchSelection,
    EquipmentSelection,
    DateSelection,
    AvailabilityCheck,
    Quote,
    CustomerInfo,
    QuoteSubmitted,
    PaymentPending,
    Confirmed,
    DeliveryDispatched,
    DeliveryComplete,
    ExtensionOffer,
    ReturnReminder,
    ReturnComplete,
    NoAvailability,
    Abandoned,
}

/// Stage inputs and external signals. Payloads travel separately through
/// the session; the table only decides legality and ordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    BranchChosen,
    EquipmentChosen,
    DatesChosen,
    AvailabilityResolved,
    AvailabilityExhausted,
    QuoteAccepted,
    CustomerProvided,
    QuoteConfirmed,
    PaymentConfirmed,
    DispatchConfirmed,
    DeliveryConfirmed,
    ExtensionOffered,
    ExtensionAccepted,
    ExtensionDeclined,
    ReturnDue,
    MarkedOverdue,
    ReturnConfirmed,
    AbandonRequested,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookingContext {
    pub missing_customer_fields: Vec<String>,
}

/// Side work a transition demands of the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingAction {
    CheckAvailability,
    InvalidateDerived,
    ComputePricing,
    AssignQuoteId,
    PlaceReservation,
    AssignBookingId,
    CommitBooking,
    ExtendRentalPeriod,
    FlagOverdue,
    ReleaseReservation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: BookingState,
    pub to: BookingState,
    pub event: BookingEvent,
    pub actions: Vec<BookingAction>,
}
