pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod ports;
pub mod pricing;
pub mod session;

pub use config::{AppConfig, BranchConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::booking::{
    AvailabilityResolution, BookingId, BookingRecord, DeliveryStatus, PaymentStatus, QuoteId,
    ReturnStatus,
};
pub use domain::customer::CustomerDetails;
pub use domain::equipment::{BranchId, CategoryId, EquipmentCategory, RateTable};
pub use domain::period::RentalPeriod;
pub use errors::{ApplicationError, BookingError, InterfaceError};
pub use flows::{
    BookingAction, BookingContext, BookingEvent, BookingState, BookingTransitionError, FlowEngine,
    StandardRentalFlow,
};
pub use ports::{
    AvailabilityLookup, BookingStore, HoldResult, InMemoryBookingStore, InMemoryInventory,
    InMemoryRateBook, PortError, RateTableLookup, ReferenceGenerator, ReservationLedger,
    SequenceReferences, UuidReferences,
};
pub use pricing::{
    billing_advice, price, price_with, BillingUnit, PricingBreakdown, PricingOptions, TieBreak,
};
pub use session::{BookingSession, SessionPorts};
