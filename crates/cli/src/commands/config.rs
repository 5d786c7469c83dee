use serde_json::json;

use medirent_core::{AppConfig, LoadOptions};

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", error.to_string(), 2);
        }
    };

    let details = json!({
        "branches": config.branches,
        "rental": {
            "max_rental_days": config.rental.max_rental_days,
            "cross_branch_delivery_fee": config.rental.cross_branch_delivery_fee,
            "currency_symbol": config.rental.currency_symbol,
        },
        "pricing": { "tie_break": config.pricing.tie_break },
        "logging": { "level": config.logging.level, "format": config.logging.format },
    });
    CommandResult::success("config", "effective configuration", Some(details))
}
