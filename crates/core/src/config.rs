use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::settings::CalculationSettings;
use crate::validation::ValidationMode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub settings: CalculationSettings,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationConfig {
    pub tolerance: Decimal,
    pub pass_threshold_pct: Decimal,
    pub mode: ValidationMode,
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
    pub tolerance: Option<Decimal>,
    pub pass_threshold_pct: Option<Decimal>,
    pub mode: Option<ValidationMode>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
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
            settings: CalculationSettings::default(),
            validation: ValidationConfig {
                tolerance: Decimal::new(200, 2),
                pass_threshold_pct: Decimal::new(95, 0),
                mode: ValidationMode::Summary,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
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
struct ConfigPatch {
    settings: Option<SettingsPatch>,
    validation: Option<ValidationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsPatch {
    rate_forex_risk_pct: Option<Decimal>,
    rate_fin_commission_pct: Option<Decimal>,
    rate_loan_interest_daily_pct: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct ValidationPatch {
    tolerance: Option<Decimal>,
    pass_threshold_pct: Option<Decimal>,
    mode: Option<ValidationMode>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Precedence: programmatic overrides > environment > file > defaults.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("landed.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(settings) = patch.settings {
            if let Some(rate) = settings.rate_forex_risk_pct {
                self.settings.rate_forex_risk_pct = rate;
            }
            if let Some(rate) = settings.rate_fin_commission_pct {
                self.settings.rate_fin_commission_pct = rate;
            }
            if let Some(rate) = settings.rate_loan_interest_daily_pct {
                self.settings.rate_loan_interest_daily_pct = rate;
            }
        }

        if let Some(validation) = patch.validation {
            if let Some(tolerance) = validation.tolerance {
                self.validation.tolerance = tolerance;
            }
            if let Some(threshold) = validation.pass_threshold_pct {
                self.validation.pass_threshold_pct = threshold;
            }
            if let Some(mode) = validation.mode {
                self.validation.mode = mode;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LANDED_RATE_FOREX_RISK") {
            self.settings.rate_forex_risk_pct = parse_decimal("LANDED_RATE_FOREX_RISK", &value)?;
        }
        if let Some(value) = read_env("LANDED_RATE_FIN_COMMISSION") {
            self.settings.rate_fin_commission_pct =
                parse_decimal("LANDED_RATE_FIN_COMMISSION", &value)?;
        }
        if let Some(value) = read_env("LANDED_RATE_LOAN_INTEREST_DAILY") {
            self.settings.rate_loan_interest_daily_pct =
                parse_decimal("LANDED_RATE_LOAN_INTEREST_DAILY", &value)?;
        }
        if let Some(value) = read_env("LANDED_VALIDATION_TOLERANCE") {
            self.validation.tolerance = parse_decimal("LANDED_VALIDATION_TOLERANCE", &value)?;
        }
        if let Some(value) = read_env("LANDED_VALIDATION_PASS_THRESHOLD") {
            self.validation.pass_threshold_pct =
                parse_decimal("LANDED_VALIDATION_PASS_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("LANDED_VALIDATION_MODE") {
            self.validation.mode = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "LANDED_VALIDATION_MODE".to_string(),
                value,
            })?;
        }
        if let Some(value) = read_env("LANDED_LOGGING_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("LANDED_LOGGING_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(tolerance) = overrides.tolerance {
            self.validation.tolerance = tolerance;
        }
        if let Some(threshold) = overrides.pass_threshold_pct {
            self.validation.pass_threshold_pct = threshold;
        }
        if let Some(mode) = overrides.mode {
            self.validation.mode = mode;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("settings.rate_forex_risk_pct", self.settings.rate_forex_risk_pct),
            ("settings.rate_fin_commission_pct", self.settings.rate_fin_commission_pct),
            (
                "settings.rate_loan_interest_daily_pct",
                self.settings.rate_loan_interest_daily_pct,
            ),
        ];
        for (name, rate) in rates {
            if rate < Decimal::ZERO {
                return Err(ConfigError::Validation(format!("{name} must not be negative")));
            }
        }
        if self.validation.tolerance < Decimal::ZERO {
            return Err(ConfigError::Validation(
                "validation.tolerance must not be negative".to_string(),
            ));
        }
        if self.validation.pass_threshold_pct < Decimal::ZERO
            || self.validation.pass_threshold_pct > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::Validation(
                "validation.pass_threshold_pct must be within 0..=100".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = read_env("LANDED_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let default = PathBuf::from("landed.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value)
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use rust_decimal_macros::dec;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::validation::ValidationMode;

    #[test]
    fn defaults_match_the_documented_baseline() {
        let config = AppConfig::load(LoadOptions::default()).unwrap();
        assert_eq!(config.validation.tolerance, dec!(2.00));
        assert_eq!(config.validation.pass_threshold_pct, dec!(95));
        assert_eq!(config.validation.mode, ValidationMode::Summary);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landed.toml");
        fs::write(
            &path,
            r#"
[settings]
rate_forex_risk_pct = 1.5
rate_loan_interest_daily_pct = 0.05

[validation]
tolerance = 0.50
mode = "detailed"

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .unwrap();

        assert_eq!(config.settings.rate_forex_risk_pct, dec!(1.5));
        assert_eq!(config.settings.rate_loan_interest_daily_pct, dec!(0.05));
        // untouched keys keep their defaults
        assert_eq!(config.settings.rate_fin_commission_pct, dec!(0));
        assert_eq!(config.validation.tolerance, dec!(0.50));
        assert_eq!(config.validation.mode, ValidationMode::Detailed);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/landed.toml")),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn programmatic_overrides_win_over_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landed.toml");
        fs::write(&path, "[validation]\ntolerance = 5.0\n").unwrap();

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides { tolerance: Some(dec!(0.25)), ..Default::default() },
        })
        .unwrap();

        assert_eq!(config.validation.tolerance, dec!(0.25));
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landed.toml");
        fs::write(&path, "[validation]\npass_threshold_pct = 150\n").unwrap();

        let result = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
