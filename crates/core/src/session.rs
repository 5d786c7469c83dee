use std::sync::Arc;

use chrono::NaiveDate;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use crate::config::AppConfig;
use crate::domain::booking::{AvailabilityResolution, BookingRecord, DeliveryStatus, ReturnStatus};
use crate::domain::customer::CustomerDetails;
use crate::domain::equipment::{BranchId, CategoryId, RateTable};
use crate::domain::period::RentalPeriod;
use crate::errors::{ApplicationError, BookingError};
use crate::flows::{
    BookingAction, BookingContext, BookingEvent, BookingState, FlowEngine, StandardRentalFlow,
    TransitionOutcome,
};
use crate::ports::{
    AvailabilityLookup, BookingStore, HoldResult, PortError, RateTableLookup, ReferenceGenerator,
    ReservationLedger,
};
use crate::pricing::{price_with, quote_totals, PricingOptions};

/// External collaborators a session needs, injected by the caller.
#[derive(Clone)]
pub struct SessionPorts {
    pub availability: Arc<dyn AvailabilityLookup>,
    pub rate_tables: Arc<dyn RateTableLookup>,
    pub ledger: Arc<dyn ReservationLedger>,
    pub store: Arc<dyn BookingStore>,
    pub references: Arc<dyn ReferenceGenerator>,
}

/// Drives one booking attempt through the rental flow. Owns the record
/// exclusively; every stage method validates its input, applies the flow
/// transition, and only then mutates the record. A rejected transition
/// leaves both state and record untouched.
pub struct BookingSession {
    engine: FlowEngine<StandardRentalFlow>,
    state: BookingState,
    record: BookingRecord,
    config: AppConfig,
    rates: Option<RateTable>,
    ports: SessionPorts,
    audit: Arc<dyn AuditSink>,
    correlation_id: String,
}

impl BookingSession {
    pub fn new(
        config: AppConfig,
        ports: SessionPorts,
        audit: Arc<dyn AuditSink>,
        correlation_id: impl Into<String>,
    ) -> Self {
        let engine = FlowEngine::default();
        let state = engine.initial_state();
        Self {
            engine,
            state,
            record: BookingRecord::new(),
            config,
            rates: None,
            ports,
            audit,
            correlation_id: correlation_id.into(),
        }
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn record(&self) -> &BookingRecord {
        &self.record
    }

    pub fn choose_branch(&mut self, branch: BranchId) -> Result<(), ApplicationError> {
        if !self.config.branches.iter().any(|b| b.id == branch.0) {
            return Err(BookingError::Validation {
                field: "branch",
                reason: format!("unknown branch `{}`", branch.0),
            }
            .into());
        }
        let outcome = self.apply(&BookingEvent::BranchChosen, &BookingContext::default())?;
        self.record.branch = Some(branch);
        self.commit(outcome);
        Ok(())
    }

    pub async fn choose_equipment(&mut self, category: CategoryId) -> Result<(), ApplicationError> {
        let catalog_entry = self
            .ports
            .rate_tables
            .category(&category)
            .await
            .map_err(external("rate_tables"))?
            .ok_or_else(|| BookingError::Validation {
                field: "equipment_category",
                reason: format!("unknown equipment category `{}`", category.0),
            })?;
        if !catalog_entry.active {
            return Err(BookingError::Validation {
                field: "equipment_category",
                reason: format!("equipment category `{}` is not available for rental", category.0),
            }
            .into());
        }
        let rates = self
            .ports
            .rate_tables
            .rates(&category)
            .await
            .map_err(external("rate_tables"))?
            .ok_or_else(|| BookingError::Validation {
                field: "equipment_category",
                reason: format!("no rate table for category `{}`", category.0),
            })?;

        let outcome = self.apply(&BookingEvent::EquipmentChosen, &BookingContext::default())?;
        self.record.category = Some(category);
        self.record.equipment_name = Some(catalog_entry.name);
        self.rates = Some(rates);
        self.commit(outcome);
        Ok(())
    }

    /// Valid both as the first date choice and as a revision from the
    /// availability or quote stages; revisions drop derived data.
    pub fn choose_dates(&mut self, start: NaiveDate, end: NaiveDate) -> Result<(), ApplicationError> {
        let period = RentalPeriod::new(start, end, self.config.rental.max_rental_days)?;
        let outcome = self.apply(&BookingEvent::DatesChosen, &BookingContext::default())?;
        if outcome.actions.contains(&BookingAction::InvalidateDerived) {
            self.record.invalidate_derived();
        }
        self.record.period = Some(period);
        self.commit(outcome);
        Ok(())
    }

    /// Probes the chosen branch first, then every other configured branch
    /// in order. A cross-branch fulfilment carries the configured delivery
    /// surcharge; exhaustion everywhere is terminal for the attempt.
    pub async fn resolve_availability(&mut self) -> Result<(), ApplicationError> {
        let branch = self.required_branch()?;
        let category = self.required_category()?;
        let period = self.required_period()?;

        let local = self
            .ports
            .availability
            .units_free(&category, &branch, &period)
            .await
            .map_err(external("availability"))?;

        let resolution = if local >= 1 {
            Some(AvailabilityResolution {
                local_units_free: local,
                fulfilling_branch: branch.clone(),
                cross_branch: false,
                delivery_fee: rust_decimal::Decimal::ZERO,
            })
        } else {
            let mut found = None;
            for candidate in self.config.branches.iter().filter(|b| b.id != branch.0) {
                let alternate = BranchId(candidate.id.clone());
                let units = self
                    .ports
                    .availability
                    .units_free(&category, &alternate, &period)
                    .await
                    .map_err(external("availability"))?;
                if units >= 1 {
                    found = Some(AvailabilityResolution {
                        local_units_free: 0,
                        fulfilling_branch: alternate,
                        cross_branch: true,
                        delivery_fee: self.config.rental.cross_branch_delivery_fee,
                    });
                    break;
                }
            }
            found
        };

        let Some(resolution) = resolution else {
            let outcome =
                self.apply(&BookingEvent::AvailabilityExhausted, &BookingContext::default())?;
            self.commit(outcome);
            self.emit(
                "availability.exhausted",
                AuditCategory::Availability,
                AuditOutcome::Failed,
                &[("branch", branch.0.as_str())],
            );
            return Err(BookingError::AvailabilityExhausted.into());
        };

        let outcome = self.apply(&BookingEvent::AvailabilityResolved, &BookingContext::default())?;
        if outcome.actions.contains(&BookingAction::ComputePricing) {
            self.compute_quote(&period, &resolution)?;
        }
        self.emit(
            "availability.resolved",
            AuditCategory::Availability,
            AuditOutcome::Success,
            &[
                ("fulfilling_branch", resolution.fulfilling_branch.0.as_str()),
                ("cross_branch", if resolution.cross_branch { "true" } else { "false" }),
            ],
        );
        self.record.availability = Some(resolution);
        self.commit(outcome);
        Ok(())
    }

    pub fn accept_quote(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::QuoteAccepted, &BookingContext::default())?;
        self.commit(outcome);
        Ok(())
    }

    /// Collects contact details, assigns the quote id, and places the
    /// reservation hold. Losing the capacity race at this point is the
    /// same terminal exhaustion as losing it at the availability check.
    pub async fn provide_customer(
        &mut self,
        details: CustomerDetails,
    ) -> Result<(), ApplicationError> {
        let context = BookingContext { missing_customer_fields: details.missing_fields() };
        let outcome = self.apply(&BookingEvent::CustomerProvided, &context)?;

        let category = self.required_category()?;
        let period = self.required_period()?;
        let fulfilling_branch = self
            .record
            .availability
            .as_ref()
            .map(|a| a.fulfilling_branch.clone())
            .ok_or_else(|| {
                BookingError::InvariantViolation("availability missing at quote submission".to_owned())
            })?;

        let quote_id = self.ports.references.next_quote_id();
        let hold = self
            .ports
            .ledger
            .hold(&quote_id, &category, &fulfilling_branch, &period)
            .await
            .map_err(external("reservations"))?;
        if hold == HoldResult::NoCapacity {
            let exhausted =
                self.apply(&BookingEvent::AvailabilityExhausted, &BookingContext::default())?;
            self.commit(exhausted);
            self.emit(
                "reservation.hold_refused",
                AuditCategory::Reservation,
                AuditOutcome::Failed,
                &[("quote_id", quote_id.0.as_str())],
            );
            return Err(BookingError::AvailabilityExhausted.into());
        }

        self.emit(
            "reservation.hold_placed",
            AuditCategory::Reservation,
            AuditOutcome::Success,
            &[("quote_id", quote_id.0.as_str())],
        );
        self.record.customer = Some(details);
        self.record.assign_quote_id(quote_id)?;
        self.commit(outcome);
        Ok(())
    }

    /// External quote-acceptance trigger; no recomputation happens here.
    pub fn confirm_quote(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::QuoteConfirmed, &BookingContext::default())?;
        self.commit(outcome);
        Ok(())
    }

    /// Payment-completion signal: marks the record paid, assigns the
    /// booking id, and commits to the store. A store failure leaves the
    /// session unchanged so the signal can be retried.
    pub async fn confirm_payment(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::PaymentConfirmed, &BookingContext::default())?;

        let booking_id = self.ports.references.next_booking_id();
        let mut updated = self.record.clone();
        updated.record_payment(booking_id.clone())?;
        let reference = self
            .ports
            .store
            .commit(&booking_id, &updated)
            .await
            .map_err(external("booking_store"))?;
        updated.booking_reference = Some(reference);

        self.emit(
            "persistence.booking_committed",
            AuditCategory::Persistence,
            AuditOutcome::Success,
            &[("booking_id", booking_id.0.as_str())],
        );
        self.record = updated;
        self.commit(outcome);
        Ok(())
    }

    pub fn dispatch_delivery(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::DispatchConfirmed, &BookingContext::default())?;
        self.record.begin_dispatch()?;
        self.commit(outcome);
        Ok(())
    }

    pub fn confirm_delivery(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::DeliveryConfirmed, &BookingContext::default())?;
        self.record.delivery_status = DeliveryStatus::Delivered;
        self.commit(outcome);
        Ok(())
    }

    pub fn offer_extension(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::ExtensionOffered, &BookingContext::default())?;
        self.commit(outcome);
        Ok(())
    }

    /// Extends the rental span forward and re-validates the reservation
    /// for the longer period. The fixed quote is not repriced.
    pub async fn accept_extension(&mut self, new_end: NaiveDate) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::ExtensionAccepted, &BookingContext::default())?;

        let mut extended = self.required_period()?;
        extended.extend_to(new_end, self.config.rental.max_rental_days)?;
        let category = self.required_category()?;
        let fulfilling_branch = self
            .record
            .availability
            .as_ref()
            .map(|a| a.fulfilling_branch.clone())
            .ok_or_else(|| {
                BookingError::InvariantViolation("availability missing at extension".to_owned())
            })?;
        let quote_id = self.record.quote_id.clone().ok_or_else(|| {
            BookingError::InvariantViolation("quote id missing at extension".to_owned())
        })?;

        let hold = self
            .ports
            .ledger
            .hold(&quote_id, &category, &fulfilling_branch, &extended)
            .await
            .map_err(external("reservations"))?;
        if hold == HoldResult::NoCapacity {
            return Err(BookingError::AvailabilityExhausted.into());
        }

        self.record.period = Some(extended);
        self.record.return_status = ReturnStatus::Extended;
        self.commit(outcome);
        Ok(())
    }

    pub fn decline_extension(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::ExtensionDeclined, &BookingContext::default())?;
        self.commit(outcome);
        Ok(())
    }

    pub fn mark_return_due(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::ReturnDue, &BookingContext::default())?;
        self.commit(outcome);
        Ok(())
    }

    pub fn mark_overdue(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::MarkedOverdue, &BookingContext::default())?;
        self.record.return_status = ReturnStatus::Overdue;
        self.commit(outcome);
        Ok(())
    }

    pub async fn confirm_return(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::ReturnConfirmed, &BookingContext::default())?;
        if let Some(quote_id) = self.record.quote_id.clone() {
            self.ports.ledger.release(&quote_id).await.map_err(external("reservations"))?;
        }
        self.record.return_status = ReturnStatus::Returned;
        self.record.delivery_status = DeliveryStatus::Completed;
        self.commit(outcome);
        Ok(())
    }

    /// Walks away from an uncommitted attempt, releasing any hold.
    pub async fn abandon(&mut self) -> Result<(), ApplicationError> {
        let outcome = self.apply(&BookingEvent::AbandonRequested, &BookingContext::default())?;
        if let Some(quote_id) = self.record.quote_id.clone() {
            self.ports.ledger.release(&quote_id).await.map_err(external("reservations"))?;
        }
        self.commit(outcome);
        Ok(())
    }

    fn compute_quote(
        &mut self,
        period: &RentalPeriod,
        resolution: &AvailabilityResolution,
    ) -> Result<(), ApplicationError> {
        let rates = self.rates.clone().ok_or_else(|| {
            BookingError::InvariantViolation("rate table missing at quote computation".to_owned())
        })?;
        let options = PricingOptions {
            tie_break: self.config.pricing.tie_break,
            currency_symbol: self.config.rental.currency_symbol.clone(),
        };
        let breakdown = price_with(period, &rates, &options);
        let totals = quote_totals(breakdown.total, resolution.delivery_fee);

        self.emit(
            "pricing.quote_computed",
            AuditCategory::Pricing,
            AuditOutcome::Success,
            &[("total", &totals.total_cost.to_string()), ("deposit", &totals.deposit.to_string())],
        );
        self.record.pricing = Some(breakdown);
        self.record.total_cost = Some(totals.total_cost);
        self.record.deposit_amount = Some(totals.deposit);
        Ok(())
    }

    fn apply(
        &self,
        event: &BookingEvent,
        context: &BookingContext,
    ) -> Result<TransitionOutcome, BookingError> {
        self.engine.apply(&self.state, event, context).map_err(|error| {
            self.emit(
                "flow.transition_rejected",
                AuditCategory::Flow,
                AuditOutcome::Rejected,
                &[("state", &format!("{:?}", self.state)), ("error", &error.to_string())],
            );
            BookingError::from(error)
        })
    }

    /// Adopts an applied transition. The audit event is emitted here, after
    /// the transition's side work has succeeded, so the trail never claims
    /// a transition that a failing port rolled back.
    fn commit(&mut self, outcome: TransitionOutcome) {
        self.emit(
            "flow.transition_applied",
            AuditCategory::Flow,
            AuditOutcome::Success,
            &[
                ("from", &format!("{:?}", outcome.from)),
                ("to", &format!("{:?}", outcome.to)),
                ("event", &format!("{:?}", outcome.event)),
            ],
        );
        self.state = outcome.to;
    }

    fn emit(
        &self,
        event_type: &str,
        category: AuditCategory,
        outcome: AuditOutcome,
        metadata: &[(&str, &str)],
    ) {
        let mut event = AuditEvent::new(
            self.record.quote_id.clone(),
            self.correlation_id.clone(),
            event_type,
            category,
            "booking-session",
            outcome,
        );
        for (key, value) in metadata {
            event = event.with_metadata(*key, *value);
        }
        self.audit.emit(event);
    }

    fn required_branch(&self) -> Result<BranchId, BookingError> {
        self.record.branch.clone().ok_or_else(|| {
            BookingError::InvariantViolation("branch missing for current stage".to_owned())
        })
    }

    fn required_category(&self) -> Result<CategoryId, BookingError> {
        self.record.category.clone().ok_or_else(|| {
            BookingError::InvariantViolation("category missing for current stage".to_owned())
        })
    }

    fn required_period(&self) -> Result<RentalPeriod, BookingError> {
        self.record.period.ok_or_else(|| {
            BookingError::InvariantViolation("rental period missing for current stage".to_owned())
        })
    }
}

fn external(service: &'static str) -> impl Fn(PortError) -> ApplicationError {
    move |error| ApplicationError::ExternalService { service, reason: error.to_string() }
}
