use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use medirent_core::pricing::{billing_advice, price_with, quote_totals, PricingOptions};
use medirent_core::{AppConfig, LoadOptions, RateTable, RentalPeriod};

use crate::commands::CommandResult;

pub fn run(
    start: NaiveDate,
    end: NaiveDate,
    daily: Decimal,
    weekly: Decimal,
    monthly: Decimal,
) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("quote", "config_validation", error.to_string(), 2);
        }
    };

    let rates = RateTable { daily, weekly, monthly };
    if !rates.is_non_negative() {
        return CommandResult::failure("quote", "validation", "rates must not be negative", 1);
    }
    let period = match RentalPeriod::new(start, end, config.rental.max_rental_days) {
        Ok(period) => period,
        Err(error) => return CommandResult::failure("quote", "validation", error.to_string(), 1),
    };

    let options = PricingOptions {
        tie_break: config.pricing.tie_break,
        currency_symbol: config.rental.currency_symbol.clone(),
    };
    let breakdown = price_with(&period, &rates, &options);
    let totals = quote_totals(breakdown.total, Decimal::ZERO);
    let advice = billing_advice(breakdown.duration_days);

    let details = json!({
        "duration_days": breakdown.duration_days,
        "total": breakdown.total,
        "summary": breakdown.summary,
        "lines": breakdown.lines,
        "deposit": totals.deposit,
        "advice": advice,
    });
    CommandResult::success("quote", format!("priced {} day rental", breakdown.duration_days), Some(details))
}
