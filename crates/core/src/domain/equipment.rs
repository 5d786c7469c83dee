use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

/// An equipment type carrying its own rate table, e.g. wheelchairs or
/// oxygen concentrators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentCategory {
    pub id: CategoryId,
    pub name: String,
    pub active: bool,
}

/// Per-category billing rates, all in the same opaque currency unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub daily: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
}

impl RateTable {
    pub fn is_non_negative(&self) -> bool {
        self.daily >= Decimal::ZERO && self.weekly >= Decimal::ZERO && self.monthly >= Decimal::ZERO
    }
}
