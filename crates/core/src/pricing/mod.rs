pub mod inputs;
pub(crate) mod phases;
pub mod state;

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::{Currency, Money};
use crate::domain::product::{ProductId, ProductInput};
use crate::domain::quote::{QuoteDefaults, QuoteId};
use crate::domain::settings::CalculationSettings;
use crate::errors::{CalculationError, ProductFailure};
use crate::fingerprint::RunFingerprint;
use crate::fx::ExchangeRateSnapshot;
use crate::resolver::{resolve_product, ResolutionWarning, ResolvedProduct};
use crate::pricing::state::{CalcState, PhaseId, PhaseResult};

/// Final pricing for one line item. Cost and sales figures are tagged with
/// the reference currency; the four display fields carry the quote currency,
/// rounded once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedProduct {
    pub product_id: ProductId,
    pub quantity: u32,
    pub landed_cost: Money,
    pub financing_cost: Money,
    pub full_cost: Money,
    pub net_sales: Money,
    pub gross_sales: Money,
    pub margin_pct: Decimal,
    pub unit_sales_price: Money,
    pub total_sales_price: Money,
    pub profit: Money,
    pub unit_profit: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCalculation {
    pub product_id: ProductId,
    pub priced: PricedProduct,
    pub phase_results: Vec<PhaseResult>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteCalculation {
    /// Correlation id for logs and downstream persistence. Unique per run;
    /// everything else about a run is deterministic.
    pub run_id: Uuid,
    pub quote_id: QuoteId,
    pub currency: Currency,
    pub products: Vec<ProductCalculation>,
    pub failures: Vec<ProductFailure>,
    pub warnings: Vec<ResolutionWarning>,
    pub fingerprint: RunFingerprint,
}

pub trait PricingPipeline: Send + Sync {
    fn run(
        &self,
        resolved: &ResolvedProduct,
        quote_currency: &Currency,
        snapshot: &ExchangeRateSnapshot,
    ) -> Result<(PricedProduct, Vec<PhaseResult>), CalculationError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPricingPipeline;

impl PricingPipeline for DeterministicPricingPipeline {
    fn run(
        &self,
        resolved: &ResolvedProduct,
        quote_currency: &Currency,
        snapshot: &ExchangeRateSnapshot,
    ) -> Result<(PricedProduct, Vec<PhaseResult>), CalculationError> {
        let mut state = CalcState::from_resolved(resolved, snapshot)?;
        let mut trail = Vec::new();

        for phase in PhaseId::ALL {
            let (next, mut results) = phases::run_phase(phase, state);
            state = next;
            trail.append(&mut results);
        }

        // Client-facing fields go back into the quote currency, rounded
        // exactly once. Appended to the trail under the final phase so the
        // validation mapping can reach them.
        let unit_sales_price =
            snapshot.display_from_reference(state.unit_sales_price, quote_currency)?;
        let total_sales_price =
            snapshot.display_from_reference(state.gross_sales, quote_currency)?;
        let profit = snapshot.display_from_reference(state.profit, quote_currency)?;
        let unit_profit = snapshot.display_from_reference(state.unit_profit, quote_currency)?;

        let display_fields = [
            ("unit_sales_price_quote", &unit_sales_price),
            ("total_sales_price_quote", &total_sales_price),
            ("profit_quote", &profit),
            ("unit_profit_quote", &unit_profit),
        ];
        for (variable, money) in display_fields {
            trail.push(PhaseResult {
                phase_index: PhaseId::Profit.index(),
                phase: PhaseId::Profit.name().to_owned(),
                variable: variable.to_owned(),
                value: money.amount,
                currency: money.currency.clone(),
            });
        }

        let priced = PricedProduct {
            product_id: resolved.product_id.clone(),
            quantity: resolved.quantity,
            landed_cost: Money::reference(state.landed_cost),
            financing_cost: Money::reference(state.financing_total),
            full_cost: Money::reference(state.full_cost),
            net_sales: Money::reference(state.net_sales),
            gross_sales: Money::reference(state.gross_sales),
            margin_pct: state.margin_pct,
            unit_sales_price,
            total_sales_price,
            profit,
            unit_profit,
        };

        Ok((priced, trail))
    }
}

/// Prices a whole quote. Products fail independently: a missing variable or
/// unknown currency on one line lands in `failures` while the rest of the
/// quote continues. Only quote-level problems (bad defaults, bad settings,
/// unconvertible display currency) abort the run.
pub fn calculate_quote(
    defaults: &QuoteDefaults,
    products: &[ProductInput],
    settings: &CalculationSettings,
    snapshot: &ExchangeRateSnapshot,
) -> Result<QuoteCalculation, CalculationError> {
    let quote_violations = inputs::validate_defaults(defaults);
    if !quote_violations.is_empty() {
        return Err(CalculationError::invalid_input(format!(
            "quote defaults rejected: {}",
            inputs::summarize(&quote_violations)
        )));
    }
    let settings_violations = inputs::validate_settings(settings);
    if !settings_violations.is_empty() {
        return Err(CalculationError::invalid_input(format!(
            "calculation settings rejected: {}",
            inputs::summarize(&settings_violations)
        )));
    }
    // Display conversion happens for every priced product, so an unknown
    // quote currency fails fast instead of after the first pipeline run.
    snapshot.rate_to_reference(&defaults.currency)?;

    let pipeline = DeterministicPricingPipeline;
    let mut calculations = Vec::new();
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_ids: BTreeSet<String> = BTreeSet::new();

    for product in products {
        let mut violations = inputs::validate_product(product);
        if !product.id.0.trim().is_empty() && !seen_ids.insert(product.id.0.clone()) {
            violations.push(inputs::InputViolation {
                code: "DUPLICATE_PRODUCT_ID".to_owned(),
                message: format!("Duplicate product id in quote: {}", product.id.0),
                suggestion: Some("Consolidate duplicate lines or use distinct ids".to_owned()),
            });
        }
        if !violations.is_empty() {
            record_failure(
                &mut failures,
                product.id.clone(),
                CalculationError::invalid_input(inputs::summarize(&violations)),
            );
            continue;
        }

        match price_one(product, defaults, settings, snapshot, &pipeline, &mut warnings) {
            Ok(calculation) => calculations.push(calculation),
            Err(error) => record_failure(&mut failures, product.id.clone(), error),
        }
    }

    let fingerprint = RunFingerprint::from_trails(
        calculations.iter().map(|calculation| calculation.phase_results.as_slice()),
    );

    Ok(QuoteCalculation {
        run_id: Uuid::new_v4(),
        quote_id: defaults.quote_id.clone(),
        currency: defaults.currency.clone(),
        products: calculations,
        failures,
        warnings,
        fingerprint,
    })
}

fn price_one(
    product: &ProductInput,
    defaults: &QuoteDefaults,
    settings: &CalculationSettings,
    snapshot: &ExchangeRateSnapshot,
    pipeline: &dyn PricingPipeline,
    warnings: &mut Vec<ResolutionWarning>,
) -> Result<ProductCalculation, CalculationError> {
    let (resolved, mut resolution_warnings) = resolve_product(product, defaults, settings)?;
    warnings.append(&mut resolution_warnings);

    let violations = inputs::validate_resolved(&resolved);
    if !violations.is_empty() {
        return Err(CalculationError::invalid_input(inputs::summarize(&violations)));
    }

    let (priced, phase_results) = pipeline.run(&resolved, &defaults.currency, snapshot)?;
    Ok(ProductCalculation { product_id: product.id.clone(), priced, phase_results })
}

fn record_failure(
    failures: &mut Vec<ProductFailure>,
    product_id: ProductId,
    error: CalculationError,
) {
    tracing::warn!(
        product_id = %product_id.0,
        error = %error,
        "product failed to price; continuing with remaining products"
    );
    failures.push(ProductFailure { product_id, error });
}
