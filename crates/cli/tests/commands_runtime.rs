use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use medirent_cli::commands::{book, config, quote};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).expect("valid date")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output must be valid JSON")
}

#[test]
fn quote_prices_a_week_at_the_weekly_rate() {
    let result = quote::run(
        date(1),
        date(7),
        Decimal::new(85, 0),
        Decimal::new(450, 0),
        Decimal::new(1200, 0),
    );
    assert_eq!(result.exit_code, 0, "expected successful quote");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "quote");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["details"]["duration_days"], 7);
    assert_eq!(payload["details"]["total"], "450");
    assert_eq!(payload["details"]["summary"], "1 week @ R450/week");
    assert_eq!(payload["details"]["deposit"], "135");
    assert!(payload["details"]["advice"].as_str().expect("advice").contains("weekly"));
}

#[test]
fn quote_includes_only_used_units_in_lines() {
    let result = quote::run(
        date(1),
        date(10),
        Decimal::new(85, 0),
        Decimal::new(450, 0),
        Decimal::new(1200, 0),
    );
    let payload = parse_payload(&result.output);
    let lines = payload["details"]["lines"].as_array().expect("lines array");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["unit"], "week");
    assert_eq!(lines[1]["unit"], "day");
    assert_eq!(payload["details"]["total"], "705");
}

#[test]
fn quote_rejects_inverted_date_range() {
    let result = quote::run(
        date(7),
        date(1),
        Decimal::new(85, 0),
        Decimal::new(450, 0),
        Decimal::new(1200, 0),
    );
    assert_eq!(result.exit_code, 1, "expected validation failure code");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "validation");
}

#[test]
fn book_walks_a_demo_booking_to_return() {
    let result = book::run("durban".to_owned(), "wheelchair".to_owned(), date(1), date(7));
    assert_eq!(result.exit_code, 0, "expected successful demo booking: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "book");
    assert_eq!(payload["status"], "ok");

    let transcript = payload["details"]["transcript"].as_array().expect("transcript array");
    let stages: Vec<&str> =
        transcript.iter().map(|entry| entry["stage"].as_str().expect("stage")).collect();
    assert_eq!(
        stages,
        vec![
            "branch",
            "equipment",
            "dates",
            "availability",
            "quote",
            "customer",
            "payment",
            "delivery",
            "extension",
            "return"
        ]
    );
    assert_eq!(transcript.last().expect("entries")["state"], "ReturnComplete");
}

#[test]
fn book_rejects_an_unknown_branch() {
    let result = book::run("pretoria".to_owned(), "wheelchair".to_owned(), date(1), date(7));
    assert_eq!(result.exit_code, 1);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "validation");
}

#[test]
fn config_reports_the_default_policy() {
    let result = config::run();
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "config");
    assert_eq!(payload["details"]["rental"]["max_rental_days"], 365);
    assert_eq!(payload["details"]["pricing"]["tie_break"], "prefer_finer");
    assert_eq!(payload["details"]["branches"].as_array().expect("branches").len(), 2);
}
