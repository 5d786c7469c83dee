use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerDetails;
use crate::domain::equipment::{BranchId, CategoryId};
use crate::domain::period::RentalPeriod;
use crate::errors::BookingError;
use crate::pricing::PricingBreakdown;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Dispatched,
    Delivered,
    Completed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    #[default]
    Pending,
    Extended,
    Returned,
    Overdue,
}

/// Outcome of the external availability check for a booking attempt.
/// `fulfilling_branch` differs from the chosen branch on a cross-branch
/// booking, which carries a delivery surcharge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResolution {
    pub local_units_free: u32,
    pub fulfilling_branch: BranchId,
    pub cross_branch: bool,
    pub delivery_fee: Decimal,
}

/// The single mutable accumulator for one booking attempt. Stages fill it
/// in incrementally; derived fields are cleared when an earlier stage is
/// revisited, and identifiers are assigned exactly once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub branch: Option<BranchId>,
    pub category: Option<CategoryId>,
    pub equipment_name: Option<String>,
    pub period: Option<RentalPeriod>,
    pub availability: Option<AvailabilityResolution>,
    pub pricing: Option<PricingBreakdown>,
    pub customer: Option<CustomerDetails>,
    pub total_cost: Option<Decimal>,
    pub deposit_amount: Option<Decimal>,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub return_status: ReturnStatus,
    pub quote_id: Option<QuoteId>,
    pub booking_id: Option<BookingId>,
    pub booking_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn new() -> Self {
        Self {
            branch: None,
            category: None,
            equipment_name: None,
            period: None,
            availability: None,
            pricing: None,
            customer: None,
            total_cost: None,
            deposit_amount: None,
            payment_status: PaymentStatus::default(),
            delivery_status: DeliveryStatus::default(),
            return_status: ReturnStatus::default(),
            quote_id: None,
            booking_id: None,
            booking_reference: None,
            created_at: Utc::now(),
        }
    }

    /// Clears everything derived from the availability check onwards.
    /// Called when the customer revisits date selection before accepting
    /// the quote. Assigned identifiers are never cleared.
    pub fn invalidate_derived(&mut self) {
        self.availability = None;
        self.pricing = None;
        self.total_cost = None;
        self.deposit_amount = None;
    }

    pub fn delivery_fee(&self) -> Decimal {
        self.availability.as_ref().map(|a| a.delivery_fee).unwrap_or(Decimal::ZERO)
    }

    pub fn assign_quote_id(&mut self, id: QuoteId) -> Result<(), BookingError> {
        if self.quote_id.is_some() {
            return Err(BookingError::InvariantViolation("quote id already assigned".to_owned()));
        }
        self.quote_id = Some(id);
        Ok(())
    }

    pub fn assign_booking_id(&mut self, id: BookingId) -> Result<(), BookingError> {
        if self.booking_id.is_some() {
            return Err(BookingError::InvariantViolation("booking id already assigned".to_owned()));
        }
        self.booking_id = Some(id);
        Ok(())
    }

    /// Payment completion. A paid booking must carry a booking id, so the
    /// id is assigned in the same step.
    pub fn record_payment(&mut self, id: BookingId) -> Result<(), BookingError> {
        self.assign_booking_id(id)?;
        self.payment_status = PaymentStatus::Paid;
        Ok(())
    }

    /// Delivery may only dispatch once payment has completed. Violations
    /// are contract failures, not user-correctable validation.
    pub fn begin_dispatch(&mut self) -> Result<(), BookingError> {
        if self.payment_status != PaymentStatus::Paid {
            return Err(BookingError::InvariantViolation(
                "delivery cannot dispatch before payment is confirmed".to_owned(),
            ));
        }
        self.delivery_status = DeliveryStatus::Dispatched;
        Ok(())
    }
}

impl Default for BookingRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{BookingId, BookingRecord, DeliveryStatus, PaymentStatus, QuoteId};
    use crate::domain::equipment::BranchId;
    use crate::errors::BookingError;

    #[test]
    fn new_record_starts_with_pending_status_tracks() {
        let record = BookingRecord::new();
        assert_eq!(record.payment_status, PaymentStatus::Pending);
        assert_eq!(record.delivery_status, DeliveryStatus::Pending);
        assert!(record.quote_id.is_none());
    }

    #[test]
    fn invalidate_derived_clears_pricing_but_not_identifiers() {
        let mut record = BookingRecord::new();
        record.total_cost = Some(Decimal::new(450, 0));
        record.deposit_amount = Some(Decimal::new(135, 0));
        record.quote_id = Some(QuoteId("QT-1".to_owned()));

        record.invalidate_derived();

        assert!(record.total_cost.is_none());
        assert!(record.deposit_amount.is_none());
        assert!(record.pricing.is_none());
        assert!(record.availability.is_none());
        assert_eq!(record.quote_id, Some(QuoteId("QT-1".to_owned())));
    }

    #[test]
    fn quote_id_is_assigned_exactly_once() {
        let mut record = BookingRecord::new();
        record.assign_quote_id(QuoteId("QT-1".to_owned())).expect("first assignment");
        let error = record
            .assign_quote_id(QuoteId("QT-2".to_owned()))
            .expect_err("second assignment must fail");
        assert!(matches!(error, BookingError::InvariantViolation(_)));
    }

    #[test]
    fn payment_sets_paid_and_booking_id_together() {
        let mut record = BookingRecord::new();
        record.record_payment(BookingId("BK-1".to_owned())).expect("payment recorded");
        assert_eq!(record.payment_status, PaymentStatus::Paid);
        assert!(record.booking_id.is_some());
    }

    #[test]
    fn dispatch_before_payment_is_an_invariant_violation() {
        let mut record = BookingRecord::new();
        record.branch = Some(BranchId("durban".to_owned()));
        let error = record.begin_dispatch().expect_err("unpaid dispatch must fail");
        assert!(matches!(error, BookingError::InvariantViolation(_)));
        assert_eq!(record.delivery_status, DeliveryStatus::Pending);
    }

    #[test]
    fn dispatch_after_payment_succeeds() {
        let mut record = BookingRecord::new();
        record.record_payment(BookingId("BK-2".to_owned())).expect("payment recorded");
        record.begin_dispatch().expect("paid dispatch");
        assert_eq!(record.delivery_status, DeliveryStatus::Dispatched);
    }
}
