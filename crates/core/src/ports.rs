use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::booking::{BookingId, BookingRecord, QuoteId};
use crate::domain::equipment::{BranchId, CategoryId, EquipmentCategory, RateTable};
use crate::domain::period::RentalPeriod;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("`{service}` is unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },
    #[error("`{service}` timed out")]
    Timeout { service: &'static str },
}

/// Point-in-time unit count for a category at a branch over a period.
#[async_trait]
pub trait AvailabilityLookup: Send + Sync {
    async fn units_free(
        &self,
        category: &CategoryId,
        branch: &BranchId,
        period: &RentalPeriod,
    ) -> Result<u32, PortError>;
}

#[async_trait]
pub trait RateTableLookup: Send + Sync {
    async fn category(&self, id: &CategoryId) -> Result<Option<EquipmentCategory>, PortError>;
    async fn rates(&self, id: &CategoryId) -> Result<Option<RateTable>, PortError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldResult {
    Placed,
    NoCapacity,
}

/// Reservation holds close the window between the availability check and
/// the committed booking: a placed hold counts against capacity, so two
/// sessions racing for the last unit cannot both submit a quote.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    /// Places or replaces the hold for `reference`. Replacing re-validates
    /// capacity for the new period, which is how extensions are held.
    async fn hold(
        &self,
        reference: &QuoteId,
        category: &CategoryId,
        branch: &BranchId,
        period: &RentalPeriod,
    ) -> Result<HoldResult, PortError>;

    async fn release(&self, reference: &QuoteId) -> Result<(), PortError>;
}

/// Persists a finalized booking. Idempotent: committing the same booking
/// id again returns the reference of the first commit.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn commit(&self, booking_id: &BookingId, record: &BookingRecord)
        -> Result<String, PortError>;
}

/// Uniqueness is the only contract on generated identifiers.
pub trait ReferenceGenerator: Send + Sync {
    fn next_quote_id(&self) -> QuoteId;
    fn next_booking_id(&self) -> BookingId;
}

pub struct UuidReferences;

impl ReferenceGenerator for UuidReferences {
    fn next_quote_id(&self) -> QuoteId {
        QuoteId(format!("QT-{}", Uuid::new_v4()))
    }

    fn next_booking_id(&self) -> BookingId {
        BookingId(format!("BK-{}", Uuid::new_v4()))
    }
}

/// Monotonic counter references for tests and demos.
#[derive(Default)]
pub struct SequenceReferences {
    counter: AtomicU64,
}

impl ReferenceGenerator for SequenceReferences {
    fn next_quote_id(&self) -> QuoteId {
        QuoteId(format!("QT-{:04}", self.counter.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn next_booking_id(&self) -> BookingId {
        BookingId(format!("BK-{:04}", self.counter.fetch_add(1, Ordering::Relaxed) + 1))
    }
}

#[derive(Clone, Debug)]
struct Hold {
    category: CategoryId,
    branch: BranchId,
    period: RentalPeriod,
}

/// Deterministic inventory: fixed unit capacities per branch and category,
/// with holds counted against them.
#[derive(Default)]
pub struct InMemoryInventory {
    capacity: HashMap<(BranchId, CategoryId), u32>,
    holds: Mutex<HashMap<QuoteId, Hold>>,
}

impl InMemoryInventory {
    pub fn with_capacity(units: impl IntoIterator<Item = (BranchId, CategoryId, u32)>) -> Self {
        Self {
            capacity: units.into_iter().map(|(b, c, n)| ((b, c), n)).collect(),
            holds: Mutex::new(HashMap::new()),
        }
    }

    fn held_units(
        &self,
        category: &CategoryId,
        branch: &BranchId,
        period: &RentalPeriod,
        excluding: Option<&QuoteId>,
    ) -> u32 {
        let holds = match self.holds.lock() {
            Ok(holds) => holds,
            Err(poisoned) => poisoned.into_inner(),
        };
        holds
            .iter()
            .filter(|(reference, _)| Some(*reference) != excluding)
            .filter(|(_, hold)| {
                hold.category == *category
                    && hold.branch == *branch
                    && hold.period.overlaps(period)
            })
            .count() as u32
    }
}

#[async_trait]
impl AvailabilityLookup for InMemoryInventory {
    async fn units_free(
        &self,
        category: &CategoryId,
        branch: &BranchId,
        period: &RentalPeriod,
    ) -> Result<u32, PortError> {
        let capacity =
            self.capacity.get(&(branch.clone(), category.clone())).copied().unwrap_or(0);
        Ok(capacity.saturating_sub(self.held_units(category, branch, period, None)))
    }
}

#[async_trait]
impl ReservationLedger for InMemoryInventory {
    async fn hold(
        &self,
        reference: &QuoteId,
        category: &CategoryId,
        branch: &BranchId,
        period: &RentalPeriod,
    ) -> Result<HoldResult, PortError> {
        let capacity =
            self.capacity.get(&(branch.clone(), category.clone())).copied().unwrap_or(0);
        let held = self.held_units(category, branch, period, Some(reference));
        if held >= capacity {
            return Ok(HoldResult::NoCapacity);
        }
        let mut holds = match self.holds.lock() {
            Ok(holds) => holds,
            Err(poisoned) => poisoned.into_inner(),
        };
        holds.insert(
            reference.clone(),
            Hold { category: category.clone(), branch: branch.clone(), period: *period },
        );
        Ok(HoldResult::Placed)
    }

    async fn release(&self, reference: &QuoteId) -> Result<(), PortError> {
        let mut holds = match self.holds.lock() {
            Ok(holds) => holds,
            Err(poisoned) => poisoned.into_inner(),
        };
        holds.remove(reference);
        Ok(())
    }
}

/// Deterministic category catalog and rate book.
#[derive(Default)]
pub struct InMemoryRateBook {
    entries: HashMap<CategoryId, (EquipmentCategory, RateTable)>,
}

impl InMemoryRateBook {
    pub fn with_entries(
        entries: impl IntoIterator<Item = (EquipmentCategory, RateTable)>,
    ) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(category, rates)| (category.id.clone(), (category, rates)))
                .collect(),
        }
    }
}

#[async_trait]
impl RateTableLookup for InMemoryRateBook {
    async fn category(&self, id: &CategoryId) -> Result<Option<EquipmentCategory>, PortError> {
        Ok(self.entries.get(id).map(|(category, _)| category.clone()))
    }

    async fn rates(&self, id: &CategoryId) -> Result<Option<RateTable>, PortError> {
        Ok(self.entries.get(id).map(|(_, rates)| rates.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryBookingStore {
    committed: Mutex<HashMap<BookingId, (String, BookingRecord)>>,
}

impl InMemoryBookingStore {
    pub fn committed_count(&self) -> usize {
        match self.committed.lock() {
            Ok(committed) => committed.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn commit(
        &self,
        booking_id: &BookingId,
        record: &BookingRecord,
    ) -> Result<String, PortError> {
        let mut committed = match self.committed.lock() {
            Ok(committed) => committed,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some((reference, _)) = committed.get(booking_id) {
            return Ok(reference.clone());
        }
        let reference = format!("REF-{}", booking_id.0);
        committed.insert(booking_id.clone(), (reference.clone(), record.clone()));
        Ok(reference)
    }
}
