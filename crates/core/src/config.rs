use std::env;
use std::fs;
use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::TieBreak;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub branches: Vec<BranchConfig>,
    pub rental: RentalRules,
    pub pricing: PricingRules,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchConfig {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RentalRules {
    pub max_rental_days: i64,
    pub cross_branch_delivery_fee: Decimal,
    pub currency_symbol: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingRules {
    pub tie_break: TieBreak,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub max_rental_days: Option<i64>,
    pub cross_branch_delivery_fee: Option<Decimal>,
    pub tie_break: Option<TieBreak>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            branches: vec![
                BranchConfig { id: "durban".to_owned(), name: "Durban".to_owned() },
                BranchConfig { id: "johannesburg".to_owned(), name: "Johannesburg".to_owned() },
            ],
            rental: RentalRules {
                max_rental_days: 365,
                cross_branch_delivery_fee: Decimal::new(150, 0),
                currency_symbol: "R".to_owned(),
            },
            pricing: PricingRules { tie_break: TieBreak::PreferFiner },
            logging: LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for TieBreak {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prefer_finer" => Ok(Self::PreferFiner),
            "prefer_coarser" => Ok(Self::PreferCoarser),
            other => Err(ConfigError::Validation(format!(
                "unsupported tie break `{other}` (expected prefer_finer|prefer_coarser)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    branches: Option<Vec<BranchConfig>>,
    rental: Option<FileRentalRules>,
    pricing: Option<FilePricingRules>,
    logging: Option<FileLoggingConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct FileRentalRules {
    max_rental_days: Option<i64>,
    cross_branch_delivery_fee: Option<Decimal>,
    currency_symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FilePricingRules {
    tie_break: Option<TieBreak>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLoggingConfig {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Layered load: defaults, then the TOML policy file (if present),
    /// then `MEDIRENT_*` environment variables, then explicit overrides.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = options
            .config_path
            .or_else(|| env::var("MEDIRENT_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("medirent.toml"));
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let file = parse_file(&path, &contents)?;
                config.apply_file(file);
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                if options.require_file {
                    return Err(ConfigError::MissingConfigFile(path));
                }
            }
            Err(source) => return Err(ConfigError::ReadFile { path, source }),
        }

        config.apply_overrides(env_overrides()?);
        config.apply_overrides(options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(branches) = file.branches {
            self.branches = branches;
        }
        if let Some(rental) = file.rental {
            if let Some(days) = rental.max_rental_days {
                self.rental.max_rental_days = days;
            }
            if let Some(fee) = rental.cross_branch_delivery_fee {
                self.rental.cross_branch_delivery_fee = fee;
            }
            if let Some(symbol) = rental.currency_symbol {
                self.rental.currency_symbol = symbol;
            }
        }
        if let Some(pricing) = file.pricing {
            if let Some(tie_break) = pricing.tie_break {
                self.pricing.tie_break = tie_break;
            }
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(days) = overrides.max_rental_days {
            self.rental.max_rental_days = days;
        }
        if let Some(fee) = overrides.cross_branch_delivery_fee {
            self.rental.cross_branch_delivery_fee = fee;
        }
        if let Some(tie_break) = overrides.tie_break {
            self.pricing.tie_break = tie_break;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.branches.len() < 2 {
            return Err(ConfigError::Validation(
                "at least two branches must be configured".to_owned(),
            ));
        }
        let mut ids: Vec<&str> = self.branches.iter().map(|b| b.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.branches.len() {
            return Err(ConfigError::Validation("branch ids must be unique".to_owned()));
        }
        if self.rental.max_rental_days < 1 {
            return Err(ConfigError::Validation(
                "max_rental_days must be at least 1".to_owned(),
            ));
        }
        if self.rental.cross_branch_delivery_fee < Decimal::ZERO {
            return Err(ConfigError::Validation(
                "cross_branch_delivery_fee must not be negative".to_owned(),
            ));
        }
        Ok(())
    }
}

fn parse_file(path: &std::path::Path, contents: &str) -> Result<FileConfig, ConfigError> {
    toml::from_str(contents)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn env_overrides() -> Result<ConfigOverrides, ConfigError> {
    let mut overrides = ConfigOverrides::default();
    if let Ok(value) = env::var("MEDIRENT_MAX_RENTAL_DAYS") {
        overrides.max_rental_days = Some(value.parse().map_err(|_| {
            ConfigError::InvalidEnvOverride { key: "MEDIRENT_MAX_RENTAL_DAYS".to_owned(), value }
        })?);
    }
    if let Ok(value) = env::var("MEDIRENT_DELIVERY_FEE") {
        overrides.cross_branch_delivery_fee = Some(value.parse().map_err(|_| {
            ConfigError::InvalidEnvOverride { key: "MEDIRENT_DELIVERY_FEE".to_owned(), value }
        })?);
    }
    if let Ok(value) = env::var("MEDIRENT_TIE_BREAK") {
        overrides.tie_break = Some(value.parse()?);
    }
    if let Ok(value) = env::var("MEDIRENT_LOG_LEVEL") {
        overrides.log_level = Some(value);
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rust_decimal::Decimal;

    use super::{parse_file, AppConfig, BranchConfig, ConfigError, ConfigOverrides, LogFormat};
    use crate::pricing::TieBreak;

    #[test]
    fn defaults_carry_two_branches_and_reference_policy() {
        let config = AppConfig::default();
        assert_eq!(config.branches.len(), 2);
        assert_eq!(config.rental.max_rental_days, 365);
        assert_eq!(config.rental.cross_branch_delivery_fee, Decimal::new(150, 0));
        assert_eq!(config.rental.currency_symbol, "R");
        assert_eq!(config.pricing.tie_break, TieBreak::PreferFiner);
        config.validate().expect("defaults must validate");
    }

    #[test]
    fn file_values_override_defaults() {
        let contents = r#"
            [[branches]]
            id = "durban"
            name = "Durban"

            [[branches]]
            id = "cape-town"
            name = "Cape Town"

            [[branches]]
            id = "johannesburg"
            name = "Johannesburg"

            [rental]
            max_rental_days = 180
            cross_branch_delivery_fee = 200
            currency_symbol = "R"

            [pricing]
            tie_break = "prefer_coarser"

            [logging]
            level = "debug"
            format = "json"
        "#;
        let file = parse_file(Path::new("medirent.toml"), contents).expect("parseable file");
        let mut config = AppConfig::default();
        config.apply_file(file);

        assert_eq!(config.branches.len(), 3);
        assert_eq!(config.rental.max_rental_days, 180);
        assert_eq!(config.pricing.tie_break, TieBreak::PreferCoarser);
        assert_eq!(config.logging.format, LogFormat::Json);
        config.validate().expect("file config must validate");
    }

    #[test]
    fn explicit_overrides_win_over_defaults() {
        let mut config = AppConfig::default();
        config.apply_overrides(ConfigOverrides {
            max_rental_days: Some(90),
            cross_branch_delivery_fee: Some(Decimal::new(250, 0)),
            tie_break: Some(TieBreak::PreferCoarser),
            log_level: Some("trace".to_owned()),
        });

        assert_eq!(config.rental.max_rental_days, 90);
        assert_eq!(config.rental.cross_branch_delivery_fee, Decimal::new(250, 0));
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn fewer_than_two_branches_fails_validation() {
        let mut config = AppConfig::default();
        config.branches.truncate(1);
        let error = config.validate().expect_err("one branch must fail");
        assert!(matches!(error, ConfigError::Validation(_)));
    }

    #[test]
    fn duplicate_branch_ids_fail_validation() {
        let mut config = AppConfig::default();
        config.branches.push(BranchConfig { id: "durban".to_owned(), name: "Durban 2".to_owned() });
        let error = config.validate().expect_err("duplicate ids must fail");
        assert!(matches!(error, ConfigError::Validation(_)));
    }

    #[test]
    fn negative_delivery_fee_fails_validation() {
        let mut config = AppConfig::default();
        config.rental.cross_branch_delivery_fee = Decimal::new(-1, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn tie_break_parses_from_str() {
        assert_eq!("prefer_coarser".parse::<TieBreak>().expect("valid"), TieBreak::PreferCoarser);
        assert!("sometimes".parse::<TieBreak>().is_err());
    }
}
