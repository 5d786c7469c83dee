pub mod optimizer;
pub mod quote;

pub use optimizer::{
    billing_advice, price, price_with, BillingUnit, BreakdownLine, PricingBreakdown,
    PricingOptions, TieBreak,
};
pub use quote::{quote_totals, QuoteTotals, DEPOSIT_RATE};
