use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::equipment::RateTable;
use crate::domain::period::RentalPeriod;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingUnit {
    Month,
    Week,
    Day,
}

impl BillingUnit {
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
        }
    }

    fn label(&self, count: u32) -> String {
        if count == 1 {
            self.singular().to_owned()
        } else {
            format!("{}s", self.singular())
        }
    }
}

/// One adopted billing unit: `count` units at `rate` each.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub unit: BillingUnit,
    pub count: u32,
    pub rate: Decimal,
    pub line_total: Decimal,
}

/// The cheapest decomposition of a rental span into billing units.
/// `lines` carries only units actually used; `summary` is the
/// customer-facing rendering of the same decomposition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub duration_days: i64,
    pub total: Decimal,
    pub lines: Vec<BreakdownLine>,
    pub summary: String,
}

/// What wins when two candidate decompositions cost exactly the same.
/// `PreferFiner` keeps the earlier, finer-grained candidate (daily before
/// weekly before monthly); `PreferCoarser` adopts the longer billing unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    PreferFiner,
    PreferCoarser,
}

#[derive(Clone, Debug)]
pub struct PricingOptions {
    pub tie_break: TieBreak,
    pub currency_symbol: String,
}

impl Default for PricingOptions {
    fn default() -> Self {
        Self { tie_break: TieBreak::default(), currency_symbol: "R".to_owned() }
    }
}

/// Prices a rental span with the default options. Pure: identical inputs
/// always produce identical output.
pub fn price(period: &RentalPeriod, rates: &RateTable) -> PricingBreakdown {
    price_with(period, rates, &PricingOptions::default())
}

/// Evaluates the three candidate decompositions and keeps the cheapest:
/// daily-only, weekly plus remainder days (spans of 7+ days), monthly plus
/// weekly plus remainder days (spans of 30+ days). A month is 30 days and a
/// week is 7 for decomposition purposes. No rounding happens here.
pub fn price_with(
    period: &RentalPeriod,
    rates: &RateTable,
    options: &PricingOptions,
) -> PricingBreakdown {
    let days = period.duration_days();

    let mut best = decompose(&[(BillingUnit::Day, days as u32)], rates);
    if days >= 7 {
        let candidate =
            decompose(&[(BillingUnit::Week, (days / 7) as u32), (BillingUnit::Day, (days % 7) as u32)], rates);
        adopt(&mut best, candidate, options.tie_break);
    }
    if days >= 30 {
        let rem = days % 30;
        let candidate = decompose(
            &[
                (BillingUnit::Month, (days / 30) as u32),
                (BillingUnit::Week, (rem / 7) as u32),
                (BillingUnit::Day, (rem % 7) as u32),
            ],
            rates,
        );
        adopt(&mut best, candidate, options.tie_break);
    }

    let total = best.iter().map(|line| line.line_total).sum();
    let summary = render_summary(&best, &options.currency_symbol);
    PricingBreakdown { duration_days: days, total, lines: best, summary }
}

/// Plain-language billing recommendation for a span. Informational only;
/// the cost computation never consults it.
pub fn billing_advice(duration_days: i64) -> &'static str {
    if duration_days <= 6 {
        "daily billing is the most cost-effective for short rentals"
    } else if duration_days <= 29 {
        "weekly billing offers better value for this duration"
    } else {
        "monthly billing gives the best savings for long rentals"
    }
}

fn decompose(counts: &[(BillingUnit, u32)], rates: &RateTable) -> Vec<BreakdownLine> {
    counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|&(unit, count)| {
            let rate = match unit {
                BillingUnit::Month => rates.monthly,
                BillingUnit::Week => rates.weekly,
                BillingUnit::Day => rates.daily,
            };
            BreakdownLine { unit, count, rate, line_total: rate * Decimal::from(count) }
        })
        .collect()
}

fn adopt(best: &mut Vec<BreakdownLine>, candidate: Vec<BreakdownLine>, tie_break: TieBreak) {
    let best_cost: Decimal = best.iter().map(|line| line.line_total).sum();
    let candidate_cost: Decimal = candidate.iter().map(|line| line.line_total).sum();
    let replace = match tie_break {
        TieBreak::PreferFiner => candidate_cost < best_cost,
        TieBreak::PreferCoarser => candidate_cost <= best_cost,
    };
    if replace {
        *best = candidate;
    }
}

fn render_summary(lines: &[BreakdownLine], symbol: &str) -> String {
    lines
        .iter()
        .map(|line| {
            format!(
                "{} {} @ {symbol}{}/{}",
                line.count,
                line.unit.label(line.count),
                line.rate,
                line.unit.singular()
            )
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{billing_advice, price, price_with, BillingUnit, PricingOptions, TieBreak};
    use crate::domain::equipment::RateTable;
    use crate::domain::period::RentalPeriod;

    fn period_of_days(days: i64) -> RentalPeriod {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date");
        RentalPeriod::new(start, start + chrono::Days::new((days - 1) as u64), 400)
            .expect("valid period")
    }

    fn reference_rates() -> RateTable {
        RateTable {
            daily: Decimal::new(85, 0),
            weekly: Decimal::new(450, 0),
            monthly: Decimal::new(1200, 0),
        }
    }

    #[test]
    fn seven_day_span_picks_one_week_over_seven_days() {
        let breakdown = price(&period_of_days(7), &reference_rates());
        assert_eq!(breakdown.total, Decimal::new(450, 0));
        assert_eq!(breakdown.summary, "1 week @ R450/week");
        assert_eq!(breakdown.lines.len(), 1);
        assert_eq!(breakdown.lines[0].unit, BillingUnit::Week);
        assert_eq!(breakdown.lines[0].count, 1);
    }

    #[test]
    fn ten_day_span_picks_week_plus_remainder_days() {
        let breakdown = price(&period_of_days(10), &reference_rates());
        assert_eq!(breakdown.total, Decimal::new(705, 0));
        assert_eq!(breakdown.summary, "1 week @ R450/week + 3 days @ R85/day");
    }

    #[test]
    fn thirty_five_day_span_picks_month_plus_days() {
        let breakdown = price(&period_of_days(35), &reference_rates());
        assert_eq!(breakdown.total, Decimal::new(1625, 0));
        assert_eq!(breakdown.summary, "1 month @ R1200/month + 5 days @ R85/day");
    }

    #[test]
    fn cheap_month_beats_daily_for_thirty_five_days() {
        let rates = RateTable {
            daily: Decimal::new(100, 0),
            weekly: Decimal::new(700, 0),
            monthly: Decimal::new(2000, 0),
        };
        let breakdown = price(&period_of_days(35), &rates);
        let daily_only = Decimal::new(3500, 0);
        assert!(breakdown.total <= daily_only);
        assert_eq!(breakdown.lines[0].unit, BillingUnit::Month);
    }

    #[test]
    fn duration_is_inclusive_day_count() {
        for days in [1, 2, 6, 7, 29, 30, 31, 90, 365] {
            let breakdown = price(&period_of_days(days), &reference_rates());
            assert_eq!(breakdown.duration_days, days);
        }
    }

    #[test]
    fn pricing_is_idempotent_for_identical_inputs() {
        let first = price(&period_of_days(23), &reference_rates());
        let second = price(&period_of_days(23), &reference_rates());
        assert_eq!(first, second);
    }

    #[test]
    fn total_never_decreases_as_span_grows() {
        // A table where each coarser unit prices above the span it can
        // replace, so no unit boundary produces a cheaper longer rental.
        let rates = RateTable {
            daily: Decimal::new(100, 0),
            weekly: Decimal::new(650, 0),
            monthly: Decimal::new(2800, 0),
        };
        let mut previous = Decimal::ZERO;
        for days in 1..=120 {
            let total = price(&period_of_days(days), &rates).total;
            assert!(
                total >= previous,
                "total for {days} days ({total}) below total for {} days ({previous})",
                days - 1
            );
            previous = total;
        }
    }

    #[test]
    fn exact_tie_keeps_daily_under_prefer_finer() {
        let rates = RateTable {
            daily: Decimal::new(100, 0),
            weekly: Decimal::new(700, 0),
            monthly: Decimal::new(3000, 0),
        };
        let breakdown = price(&period_of_days(7), &rates);
        assert_eq!(breakdown.total, Decimal::new(700, 0));
        assert_eq!(breakdown.lines[0].unit, BillingUnit::Day);
        assert_eq!(breakdown.summary, "7 days @ R100/day");
    }

    #[test]
    fn exact_tie_adopts_week_under_prefer_coarser() {
        let rates = RateTable {
            daily: Decimal::new(100, 0),
            weekly: Decimal::new(700, 0),
            monthly: Decimal::new(3000, 0),
        };
        let options =
            PricingOptions { tie_break: TieBreak::PreferCoarser, ..PricingOptions::default() };
        let breakdown = price_with(&period_of_days(7), &rates, &options);
        assert_eq!(breakdown.total, Decimal::new(700, 0));
        assert_eq!(breakdown.lines[0].unit, BillingUnit::Week);
        assert_eq!(breakdown.summary, "1 week @ R700/week");
    }

    #[test]
    fn unused_units_are_absent_from_lines() {
        let breakdown = price(&period_of_days(14), &reference_rates());
        assert_eq!(breakdown.lines.len(), 1);
        assert_eq!(breakdown.summary, "2 weeks @ R450/week");
    }

    #[test]
    fn currency_symbol_is_configurable() {
        let options = PricingOptions { currency_symbol: "$".to_owned(), ..Default::default() };
        let breakdown = price_with(&period_of_days(3), &reference_rates(), &options);
        assert_eq!(breakdown.summary, "3 days @ $85/day");
    }

    #[test]
    fn breakdown_serializes_units_in_snake_case() {
        let breakdown = price(&period_of_days(10), &reference_rates());
        let value = serde_json::to_value(&breakdown).expect("serializable breakdown");
        assert_eq!(value["lines"][0]["unit"], "week");
        assert_eq!(value["lines"][1]["unit"], "day");
        assert_eq!(value["duration_days"], 10);
    }

    #[test]
    fn advice_bands_match_duration() {
        assert!(billing_advice(1).contains("daily"));
        assert!(billing_advice(6).contains("daily"));
        assert!(billing_advice(7).contains("weekly"));
        assert!(billing_advice(29).contains("weekly"));
        assert!(billing_advice(30).contains("monthly"));
        assert!(billing_advice(365).contains("monthly"));
    }
}
