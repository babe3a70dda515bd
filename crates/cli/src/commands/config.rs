use std::env;
use std::fs;
use std::path::Path;

use landed_core::{AppConfig, LogFormat, ValidationMode};
use toml::Value;

pub fn run(config: &AppConfig, config_path: Option<&Path>) -> String {
    let file_doc = config_path.and_then(|path| {
        fs::read_to_string(path).ok().and_then(|raw| raw.parse::<Value>().ok())
    });

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "settings.rate_forex_risk_pct",
        &config.settings.rate_forex_risk_pct.to_string(),
        field_source("settings.rate_forex_risk_pct", "LANDED_RATE_FOREX_RISK", file_doc.as_ref()),
    ));
    lines.push(render_line(
        "settings.rate_fin_commission_pct",
        &config.settings.rate_fin_commission_pct.to_string(),
        field_source(
            "settings.rate_fin_commission_pct",
            "LANDED_RATE_FIN_COMMISSION",
            file_doc.as_ref(),
        ),
    ));
    lines.push(render_line(
        "settings.rate_loan_interest_daily_pct",
        &config.settings.rate_loan_interest_daily_pct.to_string(),
        field_source(
            "settings.rate_loan_interest_daily_pct",
            "LANDED_RATE_LOAN_INTEREST_DAILY",
            file_doc.as_ref(),
        ),
    ));
    lines.push(render_line(
        "validation.tolerance",
        &config.validation.tolerance.to_string(),
        field_source("validation.tolerance", "LANDED_VALIDATION_TOLERANCE", file_doc.as_ref()),
    ));
    lines.push(render_line(
        "validation.pass_threshold_pct",
        &config.validation.pass_threshold_pct.to_string(),
        field_source(
            "validation.pass_threshold_pct",
            "LANDED_VALIDATION_PASS_THRESHOLD",
            file_doc.as_ref(),
        ),
    ));
    lines.push(render_line(
        "validation.mode",
        match config.validation.mode {
            ValidationMode::Summary => "summary",
            ValidationMode::Detailed => "detailed",
        },
        field_source("validation.mode", "LANDED_VALIDATION_MODE", file_doc.as_ref()),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source("logging.level", "LANDED_LOGGING_LEVEL", file_doc.as_ref()),
    ));
    lines.push(render_line(
        "logging.format",
        match config.logging.format {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        },
        field_source("logging.format", "LANDED_LOGGING_FORMAT", file_doc.as_ref()),
    ));

    lines.join("\n")
}

fn render_line(key: &str, value: &str, source: &'static str) -> String {
    format!("  {key} = {value} ({source})")
}

fn field_source(dotted_key: &str, env_key: &str, file_doc: Option<&Value>) -> &'static str {
    if env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false) {
        return "env";
    }
    if let Some(doc) = file_doc {
        let mut cursor = doc;
        let mut found = true;
        for part in dotted_key.split('.') {
            match cursor.get(part) {
                Some(next) => cursor = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if found {
            return "file";
        }
    }
    "default"
}

#[cfg(test)]
mod tests {
    use std::fs;

    use landed_core::{AppConfig, ConfigOverrides, LoadOptions};

    use super::run;

    #[test]
    fn attributes_file_values_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landed.toml");
        fs::write(&path, "[validation]\ntolerance = 0.5\n").unwrap();

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .unwrap();

        let output = run(&config, Some(&path));
        assert!(output.contains("validation.tolerance = 0.5 (file)"));
        assert!(output.contains("validation.pass_threshold_pct = 95 (default)"));
    }
}
