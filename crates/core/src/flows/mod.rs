pub mod engine;
pub mod states;

pub use engine::{BookingTransitionError, FlowDefinition, FlowEngine, StandardRentalFlow};
pub use states::{BookingAction, BookingContext, BookingEvent, BookingState, TransitionOutcome};
