use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::Money;
use crate::domain::product::ProductInput;
use crate::domain::quote::QuoteDefaults;
use crate::domain::settings::CalculationSettings;
use crate::resolver::ResolvedProduct;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputViolation {
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl InputViolation {
    fn new(code: &str, message: impl Into<String>, suggestion: &str) -> Self {
        Self {
            code: code.to_owned(),
            message: message.into(),
            suggestion: Some(suggestion.to_owned()),
        }
    }
}

/// Quote-level checks. Any violation here fails the whole run before any
/// product is priced.
pub fn validate_defaults(defaults: &QuoteDefaults) -> Vec<InputViolation> {
    let mut violations = Vec::new();

    if defaults.currency.as_str().is_empty() {
        violations.push(InputViolation::new(
            "EMPTY_QUOTE_CURRENCY",
            "Quote has no display currency",
            "Set a currency code on the quote",
        ));
    }

    if let Some(markup) = defaults.markup_pct {
        if markup < Decimal::ZERO {
            violations.push(InputViolation::new(
                "NEGATIVE_MARKUP",
                format!("Quote-level markup is negative: {markup}%"),
                "Use a markup percentage of zero or more",
            ));
        }
    }

    if let Some(advance) = defaults.advance_payment_pct {
        if advance < Decimal::ZERO || advance > Decimal::ONE_HUNDRED {
            violations.push(InputViolation::new(
                "ADVANCE_OUT_OF_RANGE",
                format!("Advance payment share must be within 0..=100, got {advance}%"),
                "Use an advance percentage between 0 and 100",
            ));
        }
    }

    let rates = [
        ("sales_vat_pct", defaults.sales_vat_pct),
        ("agent_commission_pct", defaults.agent_commission_pct),
        ("customer_discount_pct", defaults.customer_discount_pct),
        ("warranty_reserve_pct", defaults.warranty_reserve_pct),
        ("import_vat_pct", defaults.import_vat_pct),
        ("insurance_pct", defaults.insurance_pct),
        ("bank_transfer_fee_pct", defaults.bank_transfer_fee_pct),
    ];
    for (name, rate) in rates {
        if let Some(rate) = rate {
            if rate < Decimal::ZERO {
                violations.push(InputViolation::new(
                    "NEGATIVE_RATE",
                    format!("Quote default `{name}` is negative: {rate}%"),
                    "Percentage defaults must be zero or more",
                ));
            }
        }
    }

    let fees: [(&str, Option<&Money>); 11] = [
        ("freight_cost", defaults.freight_cost.as_ref()),
        ("inland_transport_cost", defaults.inland_transport_cost.as_ref()),
        ("loading_cost", defaults.loading_cost.as_ref()),
        ("unloading_cost", defaults.unloading_cost.as_ref()),
        ("handling_cost", defaults.handling_cost.as_ref()),
        ("storage_cost", defaults.storage_cost.as_ref()),
        ("packaging_cost_per_unit", defaults.packaging_cost_per_unit.as_ref()),
        ("customs_processing_fee", defaults.customs_processing_fee.as_ref()),
        ("broker_fee", defaults.broker_fee.as_ref()),
        ("documentation_fee", defaults.documentation_fee.as_ref()),
        ("certification_fee", defaults.certification_fee.as_ref()),
    ];
    for (name, fee) in fees {
        if let Some(fee) = fee {
            if fee.amount < Decimal::ZERO {
                violations.push(InputViolation::new(
                    "NEGATIVE_COST",
                    format!("Quote default `{name}` is negative: {fee}"),
                    "Cost defaults must be zero or more",
                ));
            }
        }
    }

    violations
}

pub fn validate_settings(settings: &CalculationSettings) -> Vec<InputViolation> {
    let mut violations = Vec::new();
    let rates = [
        ("rate_forex_risk", settings.rate_forex_risk_pct),
        ("rate_fin_commission", settings.rate_fin_commission_pct),
        ("rate_loan_interest_daily", settings.rate_loan_interest_daily_pct),
    ];
    for (name, rate) in rates {
        if rate < Decimal::ZERO {
            violations.push(InputViolation::new(
                "NEGATIVE_RATE",
                format!("Admin rate `{name}` is negative: {rate}%"),
                "Organization rates must be zero or more",
            ));
        }
    }
    violations
}

/// Structural checks on the raw row, before resolution.
pub fn validate_product(product: &ProductInput) -> Vec<InputViolation> {
    let mut violations = Vec::new();

    if product.id.0.trim().is_empty() {
        violations.push(InputViolation::new(
            "MISSING_PRODUCT_ID",
            "Product row is missing an id",
            "Give every line item a stable id",
        ));
    }

    if product.base_price.amount <= Decimal::ZERO {
        violations.push(InputViolation::new(
            "NON_POSITIVE_BASE_PRICE",
            format!("Product {} has non-positive base price {}", product.id.0, product.base_price),
            "Use a positive base price",
        ));
    }

    violations
}

/// Checks on the fully resolved variable set, still before the pipeline.
/// Overrides land here too, so a negative markup smuggled through the
/// override map is caught exactly like a quote-level one.
pub fn validate_resolved(resolved: &ResolvedProduct) -> Vec<InputViolation> {
    let mut violations = Vec::new();

    if resolved.markup_pct < Decimal::ZERO {
        violations.push(InputViolation::new(
            "NEGATIVE_MARKUP",
            format!(
                "Product {} resolved to a negative markup: {}%",
                resolved.product_id.0, resolved.markup_pct
            ),
            "Use a markup percentage of zero or more",
        ));
    }

    if resolved.advance_payment_pct < Decimal::ZERO
        || resolved.advance_payment_pct > Decimal::ONE_HUNDRED
    {
        violations.push(InputViolation::new(
            "ADVANCE_OUT_OF_RANGE",
            format!(
                "Product {} resolved advance payment share {}% outside 0..=100",
                resolved.product_id.0, resolved.advance_payment_pct
            ),
            "Use an advance percentage between 0 and 100",
        ));
    }

    let rates = [
        ("supplier_discount_pct", resolved.supplier_discount_pct),
        ("insurance_pct", resolved.insurance_pct),
        ("duty_rate_pct", resolved.duty_rate_pct),
        ("excise_rate_pct", resolved.excise_rate_pct),
        ("import_vat_pct", resolved.import_vat_pct),
        ("bank_transfer_fee_pct", resolved.bank_transfer_fee_pct),
        ("sales_vat_pct", resolved.sales_vat_pct),
        ("agent_commission_pct", resolved.agent_commission_pct),
        ("customer_discount_pct", resolved.customer_discount_pct),
        ("warranty_reserve_pct", resolved.warranty_reserve_pct),
    ];
    for (name, rate) in rates {
        if rate < Decimal::ZERO {
            violations.push(InputViolation::new(
                "NEGATIVE_RATE",
                format!(
                    "Product {} resolved `{name}` to a negative rate: {rate}%",
                    resolved.product_id.0
                ),
                "Percentage variables must be zero or more",
            ));
        }
    }

    let costs = [
        ("packaging_cost_per_unit", &resolved.packaging_cost_per_unit),
        ("freight_cost", &resolved.freight_cost),
        ("inland_transport_cost", &resolved.inland_transport_cost),
        ("loading_cost", &resolved.loading_cost),
        ("unloading_cost", &resolved.unloading_cost),
        ("handling_cost", &resolved.handling_cost),
        ("storage_cost", &resolved.storage_cost),
        ("customs_processing_fee", &resolved.customs_processing_fee),
        ("broker_fee", &resolved.broker_fee),
        ("documentation_fee", &resolved.documentation_fee),
        ("certification_fee", &resolved.certification_fee),
    ];
    for (name, cost) in costs {
        if cost.amount < Decimal::ZERO {
            violations.push(InputViolation::new(
                "NEGATIVE_COST",
                format!(
                    "Product {} resolved `{name}` to a negative cost: {cost}",
                    resolved.product_id.0
                ),
                "Cost variables must be zero or more",
            ));
        }
    }

    violations
}

pub fn summarize(violations: &[InputViolation]) -> String {
    violations.iter().map(|violation| violation.code.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{validate_defaults, validate_product};
    use crate::domain::money::{Currency, Money};
    use crate::domain::product::{ProductId, ProductInput};
    use crate::domain::quote::{QuoteDefaults, QuoteId};

    #[test]
    fn negative_markup_and_bad_advance_are_flagged() {
        let mut defaults = QuoteDefaults::new(QuoteId("Q-1".to_owned()), Currency::new("EUR"));
        defaults.markup_pct = Some(dec!(-5));
        defaults.advance_payment_pct = Some(dec!(120));

        let violations = validate_defaults(&defaults);
        assert!(violations.iter().any(|v| v.code == "NEGATIVE_MARKUP"));
        assert!(violations.iter().any(|v| v.code == "ADVANCE_OUT_OF_RANGE"));
    }

    #[test]
    fn clean_defaults_pass() {
        let mut defaults = QuoteDefaults::new(QuoteId("Q-1".to_owned()), Currency::new("EUR"));
        defaults.markup_pct = Some(dec!(30));
        assert!(validate_defaults(&defaults).is_empty());
    }

    #[test]
    fn product_row_needs_id_and_positive_price() {
        let product = ProductInput::new(
            ProductId("  ".to_owned()),
            1,
            Money::new(dec!(0), Currency::new("USD")),
        );

        let violations = validate_product(&product);
        assert!(violations.iter().any(|v| v.code == "MISSING_PRODUCT_ID"));
        assert!(violations.iter().any(|v| v.code == "NON_POSITIVE_BASE_PRICE"));
    }
}
