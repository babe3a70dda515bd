use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::Money;
use crate::domain::product::{ProductId, ProductInput};
use crate::domain::quote::QuoteDefaults;
use crate::domain::settings::CalculationSettings;
use crate::errors::CalculationError;
use crate::variables::{spec, VariableKey, VariableScope, VariableValue};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WarningReason {
    /// An admin-protected variable arrived as a product override. Never
    /// honored, regardless of the caller.
    AdminProtectedOverride,
    /// The variable cannot be supplied from the override tier at all.
    OutOfScopeOverride,
    /// The override carried the wrong value kind for this variable.
    TypeMismatch { expected: String, found: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionWarning {
    pub product_id: ProductId,
    pub variable: VariableKey,
    pub reason: WarningReason,
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            WarningReason::AdminProtectedOverride => write!(
                f,
                "ignored override of admin-protected variable `{}` on product {}",
                self.variable, self.product_id.0
            ),
            WarningReason::OutOfScopeOverride => write!(
                f,
                "ignored override of `{}` on product {}: variable is not overridable per product",
                self.variable, self.product_id.0
            ),
            WarningReason::TypeMismatch { expected, found } => write!(
                f,
                "ignored override of `{}` on product {}: expected {expected}, got {found}",
                self.variable, self.product_id.0
            ),
        }
    }
}

/// Every variable the pipeline consumes, fully resolved for one line item.
/// Monetary fields still carry their original currencies; normalization into
/// the reference currency is the pipeline's first concern, not the resolver's.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedProduct {
    pub product_id: ProductId,
    pub quantity: u32,
    pub base_price: Money,
    pub supplier_discount_pct: Decimal,
    pub packaging_cost_per_unit: Money,
    pub weight_kg: Decimal,
    pub customs_code: String,
    pub supplier_country: String,
    pub freight_cost: Money,
    pub inland_transport_cost: Money,
    pub loading_cost: Money,
    pub unloading_cost: Money,
    pub insurance_pct: Decimal,
    pub handling_cost: Money,
    pub storage_cost: Money,
    pub duty_rate_pct: Decimal,
    pub excise_rate_pct: Decimal,
    pub import_vat_pct: Decimal,
    pub customs_processing_fee: Money,
    pub broker_fee: Money,
    pub documentation_fee: Money,
    pub certification_fee: Money,
    pub bank_transfer_fee_pct: Decimal,
    pub advance_payment_pct: Decimal,
    pub days_to_advance: u32,
    pub days_to_delivery: u32,
    pub deferral_days: u32,
    pub markup_pct: Decimal,
    pub sales_vat_pct: Decimal,
    pub agent_commission_pct: Decimal,
    pub customer_discount_pct: Decimal,
    pub warranty_reserve_pct: Decimal,
    pub rate_forex_risk_pct: Decimal,
    pub rate_fin_commission_pct: Decimal,
    pub rate_loan_interest_daily_pct: Decimal,
}

/// Resolves one variable through the precedence chain: product override,
/// quote default, admin setting, documented static fallback. Pure; override
/// rejections land in `warnings`, never in the error channel.
pub fn resolve(
    key: VariableKey,
    product: &ProductInput,
    defaults: &QuoteDefaults,
    settings: &CalculationSettings,
    warnings: &mut Vec<ResolutionWarning>,
) -> Result<VariableValue, CalculationError> {
    if let Some(value) = override_value(key, product, warnings) {
        return Ok(value);
    }
    if let Some(value) = product_structural(key, product) {
        return Ok(value);
    }
    if let Some(value) = quote_default(key, defaults) {
        return Ok(value);
    }
    if let Some(value) = admin_value(key, settings) {
        return Ok(value);
    }
    if let Some(fallback) = spec(key).fallback {
        return Ok(fallback);
    }
    Err(CalculationError::missing_variable(key.name(), product.id.clone()))
}

/// Materializes the full variable set for one line item.
pub fn resolve_product(
    product: &ProductInput,
    defaults: &QuoteDefaults,
    settings: &CalculationSettings,
) -> Result<(ResolvedProduct, Vec<ResolutionWarning>), CalculationError> {
    let mut ctx = ResolutionContext { product, defaults, settings, warnings: Vec::new() };

    let resolved = ResolvedProduct {
        product_id: product.id.clone(),
        quantity: ctx.count(VariableKey::Quantity)?,
        base_price: ctx.money(VariableKey::BasePrice)?,
        supplier_discount_pct: ctx.number(VariableKey::SupplierDiscountPct)?,
        packaging_cost_per_unit: ctx.money(VariableKey::PackagingCostPerUnit)?,
        weight_kg: ctx.number(VariableKey::WeightKg)?,
        customs_code: ctx.text(VariableKey::CustomsCode)?,
        supplier_country: ctx.text(VariableKey::SupplierCountry)?,
        freight_cost: ctx.money(VariableKey::FreightCost)?,
        inland_transport_cost: ctx.money(VariableKey::InlandTransportCost)?,
        loading_cost: ctx.money(VariableKey::LoadingCost)?,
        unloading_cost: ctx.money(VariableKey::UnloadingCost)?,
        insurance_pct: ctx.number(VariableKey::InsurancePct)?,
        handling_cost: ctx.money(VariableKey::HandlingCost)?,
        storage_cost: ctx.money(VariableKey::StorageCost)?,
        duty_rate_pct: ctx.number(VariableKey::DutyRatePct)?,
        excise_rate_pct: ctx.number(VariableKey::ExciseRatePct)?,
        import_vat_pct: ctx.number(VariableKey::ImportVatPct)?,
        customs_processing_fee: ctx.money(VariableKey::CustomsProcessingFee)?,
        broker_fee: ctx.money(VariableKey::BrokerFee)?,
        documentation_fee: ctx.money(VariableKey::DocumentationFee)?,
        certification_fee: ctx.money(VariableKey::CertificationFee)?,
        bank_transfer_fee_pct: ctx.number(VariableKey::BankTransferFeePct)?,
        advance_payment_pct: ctx.number(VariableKey::AdvancePaymentPct)?,
        days_to_advance: ctx.count(VariableKey::DaysToAdvance)?,
        days_to_delivery: ctx.count(VariableKey::DaysToDelivery)?,
        deferral_days: ctx.count(VariableKey::DeferralDays)?,
        markup_pct: ctx.number(VariableKey::MarkupPct)?,
        sales_vat_pct: ctx.number(VariableKey::SalesVatPct)?,
        agent_commission_pct: ctx.number(VariableKey::AgentCommissionPct)?,
        customer_discount_pct: ctx.number(VariableKey::CustomerDiscountPct)?,
        warranty_reserve_pct: ctx.number(VariableKey::WarrantyReservePct)?,
        rate_forex_risk_pct: ctx.number(VariableKey::RateForexRisk)?,
        rate_fin_commission_pct: ctx.number(VariableKey::RateFinCommission)?,
        rate_loan_interest_daily_pct: ctx.number(VariableKey::RateLoanInterestDaily)?,
    };

    Ok((resolved, ctx.warnings))
}

struct ResolutionContext<'a> {
    product: &'a ProductInput,
    defaults: &'a QuoteDefaults,
    settings: &'a CalculationSettings,
    warnings: Vec<ResolutionWarning>,
}

impl ResolutionContext<'_> {
    fn resolve(&mut self, key: VariableKey) -> Result<VariableValue, CalculationError> {
        resolve(key, self.product, self.defaults, self.settings, &mut self.warnings)
    }

    fn number(&mut self, key: VariableKey) -> Result<Decimal, CalculationError> {
        match self.resolve(key)? {
            VariableValue::Number(value) => Ok(value),
            other => Err(kind_error(key, "number", &other, &self.product.id)),
        }
    }

    fn money(&mut self, key: VariableKey) -> Result<Money, CalculationError> {
        match self.resolve(key)? {
            VariableValue::Money(value) => Ok(value),
            other => Err(kind_error(key, "money", &other, &self.product.id)),
        }
    }

    fn count(&mut self, key: VariableKey) -> Result<u32, CalculationError> {
        match self.resolve(key)? {
            VariableValue::Count(value) => Ok(value),
            other => Err(kind_error(key, "count", &other, &self.product.id)),
        }
    }

    fn text(&mut self, key: VariableKey) -> Result<String, CalculationError> {
        match self.resolve(key)? {
            VariableValue::Text(value) => Ok(value),
            other => Err(kind_error(key, "text", &other, &self.product.id)),
        }
    }
}

fn kind_error(
    key: VariableKey,
    expected: &str,
    found: &VariableValue,
    product_id: &ProductId,
) -> CalculationError {
    CalculationError::invalid_input(format!(
        "variable `{key}` resolved to {} where {expected} was expected (product {})",
        found.kind(),
        product_id.0
    ))
}

fn expected_kind(key: VariableKey) -> &'static str {
    use VariableKey as K;
    match key {
        K::Quantity | K::DaysToAdvance | K::DaysToDelivery | K::DeferralDays => "count",
        K::BasePrice
        | K::PackagingCostPerUnit
        | K::FreightCost
        | K::InlandTransportCost
        | K::LoadingCost
        | K::UnloadingCost
        | K::HandlingCost
        | K::StorageCost
        | K::CustomsProcessingFee
        | K::BrokerFee
        | K::DocumentationFee
        | K::CertificationFee => "money",
        K::CustomsCode | K::SupplierCountry | K::QuoteCurrency => "text",
        _ => "number",
    }
}

fn override_value(
    key: VariableKey,
    product: &ProductInput,
    warnings: &mut Vec<ResolutionWarning>,
) -> Option<VariableValue> {
    let value = product.overrides.get(&key)?.clone();

    match spec(key).scope {
        VariableScope::Both => {
            let expected = expected_kind(key);
            if value.kind() != expected {
                tracing::warn!(
                    variable = %key,
                    product_id = %product.id.0,
                    expected,
                    found = value.kind(),
                    "ignoring mistyped product override"
                );
                warnings.push(ResolutionWarning {
                    product_id: product.id.clone(),
                    variable: key,
                    reason: WarningReason::TypeMismatch {
                        expected: expected.to_owned(),
                        found: value.kind().to_owned(),
                    },
                });
                return None;
            }
            Some(value)
        }
        VariableScope::Admin => {
            tracing::warn!(
                variable = %key,
                product_id = %product.id.0,
                "ignoring override of admin-protected variable"
            );
            warnings.push(ResolutionWarning {
                product_id: product.id.clone(),
                variable: key,
                reason: WarningReason::AdminProtectedOverride,
            });
            None
        }
        VariableScope::Product | VariableScope::Quote => {
            tracing::warn!(
                variable = %key,
                product_id = %product.id.0,
                "ignoring out-of-scope product override"
            );
            warnings.push(ResolutionWarning {
                product_id: product.id.clone(),
                variable: key,
                reason: WarningReason::OutOfScopeOverride,
            });
            None
        }
    }
}

fn product_structural(key: VariableKey, product: &ProductInput) -> Option<VariableValue> {
    match key {
        VariableKey::Quantity => Some(VariableValue::Count(product.quantity)),
        VariableKey::BasePrice => Some(VariableValue::Money(product.base_price.clone())),
        VariableKey::SupplierDiscountPct => {
            product.supplier_discount_pct.map(VariableValue::Number)
        }
        VariableKey::WeightKg => product.weight_kg.map(VariableValue::Number),
        VariableKey::CustomsCode => {
            let code = product.customs_code.trim();
            (!code.is_empty()).then(|| VariableValue::Text(code.to_owned()))
        }
        VariableKey::SupplierCountry => {
            let country = product.supplier_country.trim();
            (!country.is_empty()).then(|| VariableValue::Text(country.to_owned()))
        }
        VariableKey::DutyRatePct => product.duty_rate_pct.map(VariableValue::Number),
        VariableKey::ExciseRatePct => product.excise_rate_pct.map(VariableValue::Number),
        _ => None,
    }
}

fn quote_default(key: VariableKey, defaults: &QuoteDefaults) -> Option<VariableValue> {
    match key {
        VariableKey::PackagingCostPerUnit => {
            defaults.packaging_cost_per_unit.clone().map(VariableValue::Money)
        }
        VariableKey::FreightCost => defaults.freight_cost.clone().map(VariableValue::Money),
        VariableKey::InlandTransportCost => {
            defaults.inland_transport_cost.clone().map(VariableValue::Money)
        }
        VariableKey::LoadingCost => defaults.loading_cost.clone().map(VariableValue::Money),
        VariableKey::UnloadingCost => defaults.unloading_cost.clone().map(VariableValue::Money),
        VariableKey::InsurancePct => defaults.insurance_pct.map(VariableValue::Number),
        VariableKey::HandlingCost => defaults.handling_cost.clone().map(VariableValue::Money),
        VariableKey::StorageCost => defaults.storage_cost.clone().map(VariableValue::Money),
        VariableKey::ImportVatPct => defaults.import_vat_pct.map(VariableValue::Number),
        VariableKey::CustomsProcessingFee => {
            defaults.customs_processing_fee.clone().map(VariableValue::Money)
        }
        VariableKey::BrokerFee => defaults.broker_fee.clone().map(VariableValue::Money),
        VariableKey::DocumentationFee => {
            defaults.documentation_fee.clone().map(VariableValue::Money)
        }
        VariableKey::CertificationFee => {
            defaults.certification_fee.clone().map(VariableValue::Money)
        }
        VariableKey::BankTransferFeePct => {
            defaults.bank_transfer_fee_pct.map(VariableValue::Number)
        }
        VariableKey::AdvancePaymentPct => defaults.advance_payment_pct.map(VariableValue::Number),
        VariableKey::DaysToAdvance => defaults.days_to_advance.map(VariableValue::Count),
        VariableKey::DaysToDelivery => defaults.days_to_delivery.map(VariableValue::Count),
        VariableKey::DeferralDays => defaults.deferral_days.map(VariableValue::Count),
        VariableKey::MarkupPct => defaults.markup_pct.map(VariableValue::Number),
        VariableKey::SalesVatPct => defaults.sales_vat_pct.map(VariableValue::Number),
        VariableKey::AgentCommissionPct => {
            defaults.agent_commission_pct.map(VariableValue::Number)
        }
        VariableKey::CustomerDiscountPct => {
            defaults.customer_discount_pct.map(VariableValue::Number)
        }
        VariableKey::WarrantyReservePct => {
            defaults.warranty_reserve_pct.map(VariableValue::Number)
        }
        VariableKey::QuoteCurrency => {
            Some(VariableValue::Text(defaults.currency.as_str().to_owned()))
        }
        _ => None,
    }
}

fn admin_value(key: VariableKey, settings: &CalculationSettings) -> Option<VariableValue> {
    match key {
        VariableKey::RateForexRisk => Some(VariableValue::Number(settings.rate_forex_risk_pct)),
        VariableKey::RateFinCommission => {
            Some(VariableValue::Number(settings.rate_fin_commission_pct))
        }
        VariableKey::RateLoanInterestDaily => {
            Some(VariableValue::Number(settings.rate_loan_interest_daily_pct))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{resolve, resolve_product, WarningReason};
    use crate::domain::money::{Currency, Money};
    use crate::domain::product::{ProductId, ProductInput};
    use crate::domain::quote::{QuoteDefaults, QuoteId};
    use crate::domain::settings::CalculationSettings;
    use crate::errors::CalculationError;
    use crate::variables::{VariableKey, VariableValue};

    fn settings() -> CalculationSettings {
        CalculationSettings {
            rate_forex_risk_pct: dec!(1.5),
            rate_fin_commission_pct: dec!(0.8),
            rate_loan_interest_daily_pct: dec!(0.05),
        }
    }

    fn defaults() -> QuoteDefaults {
        let mut defaults = QuoteDefaults::new(QuoteId("Q-1".to_owned()), Currency::new("EUR"));
        defaults.markup_pct = Some(dec!(30));
        defaults.import_vat_pct = Some(dec!(20));
        defaults
    }

    fn product() -> ProductInput {
        let mut product = ProductInput::new(
            ProductId("P-1".to_owned()),
            10,
            Money::new(dec!(100), Currency::new("USD")),
        );
        product.customs_code = "8471 30".to_owned();
        product.supplier_country = "DE".to_owned();
        product.duty_rate_pct = Some(dec!(5));
        product
    }

    #[test]
    fn product_override_beats_quote_default() {
        let mut product = product();
        product.overrides.insert(VariableKey::MarkupPct, VariableValue::Number(dec!(25)));

        let (resolved, warnings) = resolve_product(&product, &defaults(), &settings()).unwrap();
        assert_eq!(resolved.markup_pct, dec!(25));
        assert!(warnings.is_empty());
    }

    #[test]
    fn quote_default_applies_without_override() {
        let (resolved, _) = resolve_product(&product(), &defaults(), &settings()).unwrap();
        assert_eq!(resolved.markup_pct, dec!(30));
    }

    #[test]
    fn admin_rates_ignore_override_attempts() {
        let mut product = product();
        product.overrides.insert(VariableKey::RateForexRisk, VariableValue::Number(dec!(0)));
        product
            .overrides
            .insert(VariableKey::RateLoanInterestDaily, VariableValue::Number(dec!(99)));

        let (resolved, warnings) = resolve_product(&product, &defaults(), &settings()).unwrap();
        assert_eq!(resolved.rate_forex_risk_pct, dec!(1.5));
        assert_eq!(resolved.rate_loan_interest_daily_pct, dec!(0.05));
        assert_eq!(
            warnings
                .iter()
                .filter(|w| w.reason == WarningReason::AdminProtectedOverride)
                .count(),
            2
        );
    }

    #[test]
    fn missing_required_variable_fails_with_its_name() {
        let mut product = product();
        product.duty_rate_pct = None;

        let error = resolve_product(&product, &defaults(), &settings()).unwrap_err();
        assert_eq!(
            error,
            CalculationError::MissingVariable {
                variable: "duty_rate_pct".to_owned(),
                product_id: ProductId("P-1".to_owned()),
            }
        );
    }

    #[test]
    fn static_fallbacks_fill_unset_optionals() {
        let (resolved, _) = resolve_product(&product(), &defaults(), &settings()).unwrap();
        assert_eq!(resolved.advance_payment_pct, Decimal::ONE_HUNDRED);
        assert_eq!(resolved.supplier_discount_pct, Decimal::ZERO);
        assert_eq!(resolved.freight_cost, Money::zero(Currency::reference()));
        assert_eq!(resolved.days_to_delivery, 0);
    }

    #[test]
    fn mistyped_override_is_ignored_with_warning() {
        let mut product = product();
        product
            .overrides
            .insert(VariableKey::MarkupPct, VariableValue::Text("thirty".to_owned()));

        let (resolved, warnings) = resolve_product(&product, &defaults(), &settings()).unwrap();
        assert_eq!(resolved.markup_pct, dec!(30), "quote default should apply");
        assert!(warnings
            .iter()
            .any(|w| matches!(w.reason, WarningReason::TypeMismatch { .. })));
    }

    #[test]
    fn structural_variables_reject_override_tier() {
        let mut product = product();
        product.overrides.insert(VariableKey::Quantity, VariableValue::Count(99));

        let (resolved, warnings) = resolve_product(&product, &defaults(), &settings()).unwrap();
        assert_eq!(resolved.quantity, 10);
        assert!(warnings.iter().any(|w| w.reason == WarningReason::OutOfScopeOverride));
    }

    #[test]
    fn single_variable_contract_resolves_through_tiers() {
        let mut warnings = Vec::new();
        let value = resolve(
            VariableKey::SalesVatPct,
            &product(),
            &defaults(),
            &settings(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(value, VariableValue::Number(Decimal::ZERO));
        assert!(warnings.is_empty());
    }
}
