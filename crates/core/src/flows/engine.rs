use thiserror::Error;

use crate::flows::states::{
    BookingAction, BookingContext, BookingEvent, BookingState, TransitionOutcome,
};

pub trait FlowDefinition {
    fn initial_state(&self) -> BookingState;
    fn transition(
        &self,
        current: &BookingState,
        event: &BookingEvent,
        context: &BookingContext,
    ) -> Result<TransitionOutcome, BookingTransitionError>;
}

/// The standard two-sided rental flow: selection stages, availability
/// resolution with cross-branch fallback, quote, payment, delivery, the
/// revisitable extension offer, and return.
#[derive(Clone, Debug, Default)]
pub struct StandardRentalFlow;

impl FlowDefinition for StandardRentalFlow {
    fn initial_state(&self) -> BookingState {
        BookingState::BranchSelection
    }

    fn transition(
        &self,
        current: &BookingState,
        event: &BookingEvent,
        context: &BookingContext,
    ) -> Result<TransitionOutcome, BookingTransitionError> {
        transition_standard(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> BookingState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &BookingState,
        event: &BookingEvent,
        context: &BookingContext,
    ) -> Result<TransitionOutcome, BookingTransitionError> {
        self.flow.transition(current, event, context)
    }
}

impl Default for FlowEngine<StandardRentalFlow> {
    fn default() -> Self {
        Self::new(StandardRentalFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingTransitionError {
    #[error("missing required fields before transition from {state:?}: {missing_fields:?}")]
    MissingRequiredFields { state: BookingState, missing_fields: Vec<String> },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: BookingState, event: BookingEvent },
}

fn transition_standard(
    current: &BookingState,
    event: &BookingEvent,
    context: &BookingContext,
) -> Result<TransitionOutcome, BookingTransitionError> {
    use BookingAction::{
        AssignBookingId, AssignQuoteId, CheckAvailability, CommitBooking, ComputePricing,
        ExtendRentalPeriod, FlagOverdue, InvalidateDerived, PlaceReservation, ReleaseReservation,
    };
    use BookingEvent::{
        AbandonRequested, AvailabilityExhausted, AvailabilityResolved, BranchChosen,
        CustomerProvided, DatesChosen, DeliveryConfirmed, DispatchConfirmed, EquipmentChosen,
        ExtensionAccepted, ExtensionDeclined, ExtensionOffered, MarkedOverdue, PaymentConfirmed,
        QuoteAccepted, QuoteConfirmed, ReturnConfirmed, ReturnDue,
    };
    use BookingState::{
        Abandoned, AvailabilityCheck, BranchSelection, Confirmed, CustomerInfo, DateSelection,
        DeliveryComplete, DeliveryDispatched, EquipmentSelection, ExtensionOffer, NoAvailability,
        PaymentPending, Quote, QuoteSubmitted, ReturnComplete, ReturnReminder,
    };

    let (to, actions) = match (current, event) {
        (BranchSelection, BranchChosen) => (EquipmentSelection, Vec::new()),
        (EquipmentSelection, EquipmentChosen) => (DateSelection, Vec::new()),
        (DateSelection, DatesChosen) => (AvailabilityCheck, vec![CheckAvailability]),
        // Revisiting dates before quote acceptance drops the stale
        // availability and pricing and re-resolves.
        (AvailabilityCheck, DatesChosen) | (Quote, DatesChosen) => {
            (AvailabilityCheck, vec![InvalidateDerived, CheckAvailability])
        }
        (AvailabilityCheck, AvailabilityResolved) => (Quote, vec![ComputePricing]),
        (AvailabilityCheck, AvailabilityExhausted) | (CustomerInfo, AvailabilityExhausted) => {
            (NoAvailability, Vec::new())
        }
        (Quote, QuoteAccepted) => (CustomerInfo, Vec::new()),
        (CustomerInfo, CustomerProvided) => {
            if !context.missing_customer_fields.is_empty() {
                return Err(BookingTransitionError::MissingRequiredFields {
                    state: current.clone(),
                    missing_fields: context.missing_customer_fields.clone(),
                });
            }
            (QuoteSubmitted, vec![AssignQuoteId, PlaceReservation])
        }
        (QuoteSubmitted, QuoteConfirmed) => (PaymentPending, Vec::new()),
        (PaymentPending, PaymentConfirmed) => (Confirmed, vec![AssignBookingId, CommitBooking]),
        (Confirmed, DispatchConfirmed) => (DeliveryDispatched, Vec::new()),
        (DeliveryDispatched, DeliveryConfirmed) => (DeliveryComplete, Vec::new()),
        (DeliveryComplete, ExtensionOffered) => (ExtensionOffer, Vec::new()),
        (ExtensionOffer, ExtensionAccepted) => (DeliveryComplete, vec![ExtendRentalPeriod]),
        (ExtensionOffer, ExtensionDeclined) => (ReturnReminder, Vec::new()),
        (DeliveryComplete, ReturnDue) => (ReturnReminder, Vec::new()),
        (ReturnReminder, MarkedOverdue) => (ReturnReminder, vec![FlagOverdue]),
        (ReturnReminder, ReturnConfirmed) => (ReturnComplete, vec![ReleaseReservation]),
        (
            BranchSelection | EquipmentSelection | DateSelection | AvailabilityCheck | Quote
            | CustomerInfo | QuoteSubmitted | PaymentPending,
            AbandonRequested,
        ) => (Abandoned, vec![ReleaseReservation]),
        _ => {
            return Err(BookingTransitionError::InvalidTransition {
                state: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, event: event.clone(), actions })
}

#[cfg(test)]
mod tests {
    use crate::flows::engine::{BookingTransitionError, FlowEngine, StandardRentalFlow};
    use crate::flows::states::{BookingAction, BookingContext, BookingEvent, BookingState};

    fn advance(
        engine: &FlowEngine<StandardRentalFlow>,
        state: BookingState,
        event: BookingEvent,
    ) -> BookingState {
        engine
            .apply(&state, &event, &BookingContext::default())
            .unwrap_or_else(|error| panic!("expected valid transition: {error}"))
            .to
    }

    #[test]
    fn happy_path_reaches_return_complete() {
        let engine = FlowEngine::default();
        let mut state = engine.initial_state();
        assert_eq!(state, BookingState::BranchSelection);

        for event in [
            BookingEvent::BranchChosen,
            BookingEvent::EquipmentChosen,
            BookingEvent::DatesChosen,
            BookingEvent::AvailabilityResolved,
            BookingEvent::QuoteAccepted,
            BookingEvent::CustomerProvided,
            BookingEvent::QuoteConfirmed,
            BookingEvent::PaymentConfirmed,
            BookingEvent::DispatchConfirmed,
            BookingEvent::DeliveryConfirmed,
            BookingEvent::ReturnDue,
            BookingEvent::ReturnConfirmed,
        ] {
            state = advance(&engine, state, event);
        }

        assert_eq!(state, BookingState::ReturnComplete);
    }

    #[test]
    fn availability_resolution_demands_pricing_computation() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(
                &BookingState::AvailabilityCheck,
                &BookingEvent::AvailabilityResolved,
                &BookingContext::default(),
            )
            .expect("availability -> quote");

        assert_eq!(outcome.to, BookingState::Quote);
        assert_eq!(outcome.actions, vec![BookingAction::ComputePricing]);
    }

    #[test]
    fn revisiting_dates_from_quote_invalidates_and_rechecks() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(&BookingState::Quote, &BookingEvent::DatesChosen, &BookingContext::default())
            .expect("quote -> availability check");

        assert_eq!(outcome.to, BookingState::AvailabilityCheck);
        assert_eq!(
            outcome.actions,
            vec![BookingAction::InvalidateDerived, BookingAction::CheckAvailability]
        );
    }

    #[test]
    fn dates_cannot_change_after_quote_submission() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(
                &BookingState::QuoteSubmitted,
                &BookingEvent::DatesChosen,
                &BookingContext::default(),
            )
            .expect_err("submitted quotes have fixed dates");

        assert!(matches!(error, BookingTransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn exhausted_availability_is_terminal() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(
                &BookingState::AvailabilityCheck,
                &BookingEvent::AvailabilityExhausted,
                &BookingContext::default(),
            )
            .expect("availability check -> no availability");
        assert_eq!(outcome.to, BookingState::NoAvailability);

        let error = engine
            .apply(
                &BookingState::NoAvailability,
                &BookingEvent::AvailabilityResolved,
                &BookingContext::default(),
            )
            .expect_err("terminal state accepts nothing");
        assert!(matches!(error, BookingTransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn missing_customer_fields_are_rejected_without_transition() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(
                &BookingState::CustomerInfo,
                &BookingEvent::CustomerProvided,
                &BookingContext {
                    missing_customer_fields: vec!["phone".to_owned(), "address".to_owned()],
                },
            )
            .expect_err("must reject missing fields");

        assert!(matches!(error, BookingTransitionError::MissingRequiredFields { .. }));
    }

    #[test]
    fn confirmed_is_only_reachable_through_payment() {
        let engine = FlowEngine::default();
        for event in [
            BookingEvent::QuoteConfirmed,
            BookingEvent::DispatchConfirmed,
            BookingEvent::AvailabilityResolved,
        ] {
            let error = engine
                .apply(&BookingState::PaymentPending, &event, &BookingContext::default())
                .expect_err("only the payment signal advances payment-pending");
            assert!(matches!(error, BookingTransitionError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn extension_offer_loops_back_on_accept_and_proceeds_on_decline() {
        let engine = FlowEngine::default();
        let context = BookingContext::default();

        let offered = engine
            .apply(&BookingState::DeliveryComplete, &BookingEvent::ExtensionOffered, &context)
            .expect("delivery complete -> extension offer");
        assert_eq!(offered.to, BookingState::ExtensionOffer);

        let accepted = engine
            .apply(&offered.to, &BookingEvent::ExtensionAccepted, &context)
            .expect("extension accepted loops back");
        assert_eq!(accepted.to, BookingState::DeliveryComplete);
        assert_eq!(accepted.actions, vec![BookingAction::ExtendRentalPeriod]);

        let declined = engine
            .apply(&BookingState::ExtensionOffer, &BookingEvent::ExtensionDeclined, &context)
            .expect("extension declined proceeds to return");
        assert_eq!(declined.to, BookingState::ReturnReminder);
    }

    #[test]
    fn overdue_marking_stays_in_return_reminder() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(
                &BookingState::ReturnReminder,
                &BookingEvent::MarkedOverdue,
                &BookingContext::default(),
            )
            .expect("overdue marking is a self-loop");
        assert_eq!(outcome.to, BookingState::ReturnReminder);
        assert_eq!(outcome.actions, vec![BookingAction::FlagOverdue]);
    }

    #[test]
    fn abandon_is_allowed_before_payment_but_not_after() {
        let engine = FlowEngine::default();
        let context = BookingContext::default();

        let abandoned = engine
            .apply(&BookingState::QuoteSubmitted, &BookingEvent::AbandonRequested, &context)
            .expect("pre-payment abandon");
        assert_eq!(abandoned.to, BookingState::Abandoned);
        assert_eq!(abandoned.actions, vec![BookingAction::ReleaseReservation]);

        let error = engine
            .apply(&BookingState::Confirmed, &BookingEvent::AbandonRequested, &context)
            .expect_err("confirmed bookings cannot be abandoned");
        assert!(matches!(error, BookingTransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn replay_is_deterministic_for_same_event_sequence() {
        let engine = FlowEngine::default();
        let events = [
            BookingEvent::BranchChosen,
            BookingEvent::EquipmentChosen,
            BookingEvent::DatesChosen,
            BookingEvent::AvailabilityResolved,
            BookingEvent::QuoteAccepted,
        ];

        let run = |engine: &FlowEngine<StandardRentalFlow>| {
            let mut state = engine.initial_state();
            let mut actions = Vec::new();
            for event in &events {
                let outcome = engine
                    .apply(&state, event, &BookingContext::default())
                    .expect("deterministic run");
                actions.push(outcome.actions);
                state = outcome.to;
            }
            (state, actions)
        };

        assert_eq!(run(&engine), run(&engine));
    }
}
