use std::path::Path;

use serde_json::json;

use landed_core::{calculate_quote, AppConfig};

use super::{load_quote, load_snapshot, CommandResult};

pub fn run(config: &AppConfig, input: &Path, rates: &Path) -> CommandResult {
    let quote = match load_quote(input) {
        Ok(quote) => quote,
        Err(error) => {
            return CommandResult::failure("calculate", "input", format!("{error:#}"), 2)
        }
    };
    let snapshot = match load_snapshot(rates) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            return CommandResult::failure("calculate", "input", format!("{error:#}"), 2)
        }
    };

    let calculation =
        match calculate_quote(&quote.defaults, &quote.products, &config.settings, &snapshot) {
            Ok(calculation) => calculation,
            Err(error) => {
                return CommandResult::failure("calculate", "calculation", error.to_string(), 1)
            }
        };

    let failures: Vec<_> = calculation
        .failures
        .iter()
        .map(|failure| {
            json!({
                "product_id": &failure.product_id.0,
                "error": failure.error.to_string(),
            })
        })
        .collect();

    let exit_code = u8::from(!calculation.failures.is_empty());
    let payload = json!({
        "run_id": calculation.run_id,
        "quote_id": &calculation.quote_id.0,
        "currency": &calculation.currency,
        "fingerprint": &calculation.fingerprint.hash_hex,
        "priced_products": calculation.products.iter().map(|p| &p.priced).collect::<Vec<_>>(),
        "phase_results": calculation
            .products
            .iter()
            .map(|p| json!({ "product_id": &p.product_id.0, "trail": &p.phase_results }))
            .collect::<Vec<_>>(),
        "warnings": &calculation.warnings,
        "failures": failures,
    });

    CommandResult::with_payload("calculate", "ok", payload, exit_code)
}
