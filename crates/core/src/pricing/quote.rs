use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Upfront deposit share of the total cost. Fixed business policy.
pub const DEPOSIT_RATE: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// The figures fixed when a customer accepts a quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTotals {
    pub rental_total: Decimal,
    pub delivery_fee: Decimal,
    pub total_cost: Decimal,
    pub deposit: Decimal,
}

/// Combines the optimizer total with any cross-branch delivery fee and
/// derives the deposit: 30% of the combined total, rounded to the nearest
/// whole currency unit (midpoint away from zero).
pub fn quote_totals(rental_total: Decimal, delivery_fee: Decimal) -> QuoteTotals {
    let total_cost = rental_total + delivery_fee;
    let deposit = (total_cost * DEPOSIT_RATE)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    QuoteTotals { rental_total, delivery_fee, total_cost, deposit }
}
