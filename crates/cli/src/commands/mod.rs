pub mod calculate;
pub mod config;
pub mod validate;
pub mod variables;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use landed_core::{
    Currency, ExchangeRateSnapshot, ExpectedValue, ProductInput, QuoteDefaults,
};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }

    pub fn with_payload(command: &str, status: &str, payload: serde_json::Value, exit_code: u8) -> Self {
        let mut envelope = serde_json::Map::new();
        envelope.insert("command".to_string(), serde_json::Value::String(command.to_string()));
        envelope.insert("status".to_string(), serde_json::Value::String(status.to_string()));
        if let serde_json::Value::Object(fields) = payload {
            envelope.extend(fields);
        }
        Self {
            exit_code,
            output: serde_json::to_string_pretty(&serde_json::Value::Object(envelope))
                .unwrap_or_else(|error| fallback_envelope(&error.to_string())),
        }
    }
}

fn serialize_payload(payload: &CommandOutcome) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| fallback_envelope(&error.to_string()))
}

fn fallback_envelope(message: &str) -> String {
    format!(
        "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
        message.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Quote file shape shared by `calculate` and `validate`: the defaults block
/// plus product rows, exactly the structures the engine consumes.
#[derive(Debug, Deserialize)]
pub struct QuoteFile {
    pub defaults: QuoteDefaults,
    pub products: Vec<ProductInput>,
}

#[derive(Debug, Deserialize)]
pub struct RatesFile {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub rates: BTreeMap<String, Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedFile {
    pub records: Vec<ExpectedRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedRecord {
    pub product_id: String,
    pub values: Vec<ExpectedValue>,
}

pub(crate) fn load_quote(path: &Path) -> Result<QuoteFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read quote file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse quote file `{}`", path.display()))
}

pub(crate) fn load_snapshot(path: &Path) -> Result<ExchangeRateSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read rates file `{}`", path.display()))?;
    let file: RatesFile = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse rates file `{}`", path.display()))?;

    ExchangeRateSnapshot::new(
        file.timestamp,
        file.source,
        file.rates.into_iter().map(|(code, rate)| (Currency::new(code), rate)),
    )
    .with_context(|| format!("invalid rate snapshot `{}`", path.display()))
}

pub(crate) fn load_expected(path: &Path) -> Result<ExpectedFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read expected file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse expected file `{}`", path.display()))
}
