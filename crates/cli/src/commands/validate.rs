use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;

use landed_core::{
    calculate_quote, compare, validate_batch, AppConfig, FieldMapping, ValidationMode,
};

use super::{load_expected, load_quote, load_snapshot, CommandResult};

pub fn run(
    config: &AppConfig,
    input: &Path,
    rates: &Path,
    expected: &Path,
    mode: Option<&str>,
    tolerance: Option<&str>,
) -> CommandResult {
    let mode = match mode {
        Some(raw) => match ValidationMode::from_str(raw) {
            Ok(mode) => mode,
            Err(error) => return CommandResult::failure("validate", "input", error.to_string(), 2),
        },
        None => config.validation.mode,
    };
    let tolerance = match tolerance {
        Some(raw) => match Decimal::from_str(raw) {
            Ok(tolerance) => tolerance,
            Err(_) => {
                return CommandResult::failure(
                    "validate",
                    "input",
                    format!("invalid tolerance `{raw}`"),
                    2,
                )
            }
        },
        None => config.validation.tolerance,
    };

    let quote = match load_quote(input) {
        Ok(quote) => quote,
        Err(error) => return CommandResult::failure("validate", "input", format!("{error:#}"), 2),
    };
    let snapshot = match load_snapshot(rates) {
        Ok(snapshot) => snapshot,
        Err(error) => return CommandResult::failure("validate", "input", format!("{error:#}"), 2),
    };
    let expected = match load_expected(expected) {
        Ok(expected) => expected,
        Err(error) => return CommandResult::failure("validate", "input", format!("{error:#}"), 2),
    };

    let calculation =
        match calculate_quote(&quote.defaults, &quote.products, &config.settings, &snapshot) {
            Ok(calculation) => calculation,
            Err(error) => {
                return CommandResult::failure("validate", "calculation", error.to_string(), 1)
            }
        };

    let mapping = FieldMapping::standard();
    let empty_trail = Vec::new();
    let mut reports = Vec::new();
    let mut report_rows = Vec::new();

    for record in &expected.records {
        // A product that failed to price compares against an empty trail:
        // every mapped field shows up as failed instead of vanishing.
        let trail = calculation
            .products
            .iter()
            .find(|product| product.product_id.0 == record.product_id)
            .map(|product| &product.phase_results)
            .unwrap_or(&empty_trail);

        let report = compare(&record.values, trail, &mapping, tolerance, mode);
        report_rows.push(json!({
            "product_id": &record.product_id,
            "report": &report,
        }));
        reports.push(report);
    }

    let batch = validate_batch(reports, config.validation.pass_threshold_pct);

    let payload = json!({
        "mode": mode,
        "tolerance": tolerance,
        "threshold_pct": batch.threshold_pct,
        "pass_rate_pct": batch.pass_rate_pct,
        "total_fields": batch.total_fields,
        "passed_fields": batch.passed_fields,
        "accepted": batch.accepted,
        "records": report_rows,
    });

    let exit_code = u8::from(!batch.accepted);
    CommandResult::with_payload("validate", "ok", payload, exit_code)
}
