use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::{Currency, Money};

/// The closed set of calculation variables. Keys are versioned with the
/// pipeline: renaming or removing one is a wire-format change for the
/// validation field mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKey {
    // procurement
    Quantity,
    BasePrice,
    SupplierDiscountPct,
    PackagingCostPerUnit,
    WeightKg,
    CustomsCode,
    SupplierCountry,
    // logistics
    FreightCost,
    InlandTransportCost,
    LoadingCost,
    UnloadingCost,
    InsurancePct,
    HandlingCost,
    StorageCost,
    // customs
    DutyRatePct,
    ExciseRatePct,
    ImportVatPct,
    CustomsProcessingFee,
    // brokerage and documentation
    BrokerFee,
    DocumentationFee,
    CertificationFee,
    BankTransferFeePct,
    // payment milestones
    AdvancePaymentPct,
    DaysToAdvance,
    DaysToDelivery,
    DeferralDays,
    // pricing
    MarkupPct,
    SalesVatPct,
    AgentCommissionPct,
    CustomerDiscountPct,
    WarrantyReservePct,
    QuoteCurrency,
    // admin-protected financing rates
    RateForexRisk,
    RateFinCommission,
    RateLoanInterestDaily,
}

impl VariableKey {
    pub const ALL: [VariableKey; 35] = [
        VariableKey::Quantity,
        VariableKey::BasePrice,
        VariableKey::SupplierDiscountPct,
        VariableKey::PackagingCostPerUnit,
        VariableKey::WeightKg,
        VariableKey::CustomsCode,
        VariableKey::SupplierCountry,
        VariableKey::FreightCost,
        VariableKey::InlandTransportCost,
        VariableKey::LoadingCost,
        VariableKey::UnloadingCost,
        VariableKey::InsurancePct,
        VariableKey::HandlingCost,
        VariableKey::StorageCost,
        VariableKey::DutyRatePct,
        VariableKey::ExciseRatePct,
        VariableKey::ImportVatPct,
        VariableKey::CustomsProcessingFee,
        VariableKey::BrokerFee,
        VariableKey::DocumentationFee,
        VariableKey::CertificationFee,
        VariableKey::BankTransferFeePct,
        VariableKey::AdvancePaymentPct,
        VariableKey::DaysToAdvance,
        VariableKey::DaysToDelivery,
        VariableKey::DeferralDays,
        VariableKey::MarkupPct,
        VariableKey::SalesVatPct,
        VariableKey::AgentCommissionPct,
        VariableKey::CustomerDiscountPct,
        VariableKey::WarrantyReservePct,
        VariableKey::QuoteCurrency,
        VariableKey::RateForexRisk,
        VariableKey::RateFinCommission,
        VariableKey::RateLoanInterestDaily,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VariableKey::Quantity => "quantity",
            VariableKey::BasePrice => "base_price",
            VariableKey::SupplierDiscountPct => "supplier_discount_pct",
            VariableKey::PackagingCostPerUnit => "packaging_cost_per_unit",
            VariableKey::WeightKg => "weight_kg",
            VariableKey::CustomsCode => "customs_code",
            VariableKey::SupplierCountry => "supplier_country",
            VariableKey::FreightCost => "freight_cost",
            VariableKey::InlandTransportCost => "inland_transport_cost",
            VariableKey::LoadingCost => "loading_cost",
            VariableKey::UnloadingCost => "unloading_cost",
            VariableKey::InsurancePct => "insurance_pct",
            VariableKey::HandlingCost => "handling_cost",
            VariableKey::StorageCost => "storage_cost",
            VariableKey::DutyRatePct => "duty_rate_pct",
            VariableKey::ExciseRatePct => "excise_rate_pct",
            VariableKey::ImportVatPct => "import_vat_pct",
            VariableKey::CustomsProcessingFee => "customs_processing_fee",
            VariableKey::BrokerFee => "broker_fee",
            VariableKey::DocumentationFee => "documentation_fee",
            VariableKey::CertificationFee => "certification_fee",
            VariableKey::BankTransferFeePct => "bank_transfer_fee_pct",
            VariableKey::AdvancePaymentPct => "advance_payment_pct",
            VariableKey::DaysToAdvance => "days_to_advance",
            VariableKey::DaysToDelivery => "days_to_delivery",
            VariableKey::DeferralDays => "deferral_days",
            VariableKey::MarkupPct => "markup_pct",
            VariableKey::SalesVatPct => "sales_vat_pct",
            VariableKey::AgentCommissionPct => "agent_commission_pct",
            VariableKey::CustomerDiscountPct => "customer_discount_pct",
            VariableKey::WarrantyReservePct => "warranty_reserve_pct",
            VariableKey::QuoteCurrency => "quote_currency",
            VariableKey::RateForexRisk => "rate_forex_risk",
            VariableKey::RateFinCommission => "rate_fin_commission",
            VariableKey::RateLoanInterestDaily => "rate_loan_interest_daily",
        }
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableValue {
    Number(Decimal),
    Money(Money),
    Count(u32),
    Text(String),
}

impl VariableValue {
    pub fn kind(&self) -> &'static str {
        match self {
            VariableValue::Number(_) => "number",
            VariableValue::Money(_) => "money",
            VariableValue::Count(_) => "count",
            VariableValue::Text(_) => "text",
        }
    }
}

/// Which tiers may legally supply a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableScope {
    /// Structural field on the product row; no quote-level default exists.
    Product,
    /// Quote-level only; product overrides are ignored with a warning.
    Quote,
    /// Product override, then quote default.
    Both,
    /// Organization settings only; any override attempt is ignored with a
    /// warning so malformed input cannot escalate privilege.
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VariableSpec {
    pub key: VariableKey,
    pub scope: VariableScope,
    pub required: bool,
    pub fallback: Option<VariableValue>,
}

fn zero_money() -> VariableValue {
    VariableValue::Money(Money::zero(Currency::reference()))
}

fn zero_number() -> VariableValue {
    VariableValue::Number(Decimal::ZERO)
}

/// Static registry: scope, requiredness and the documented tier-4 fallback
/// for every variable. Required variables have no fallback on purpose; they
/// surface as `MissingVariable` instead of silently pricing with a guess.
pub fn spec(key: VariableKey) -> VariableSpec {
    use VariableKey as K;
    use VariableScope as S;

    let (scope, required, fallback) = match key {
        K::Quantity => (S::Product, true, None),
        K::BasePrice => (S::Product, true, None),
        K::SupplierDiscountPct => (S::Product, false, Some(zero_number())),
        K::PackagingCostPerUnit => (S::Both, false, Some(zero_money())),
        K::WeightKg => (S::Product, false, Some(zero_number())),
        K::CustomsCode => (S::Product, true, None),
        K::SupplierCountry => (S::Product, true, None),
        K::FreightCost => (S::Both, false, Some(zero_money())),
        K::InlandTransportCost => (S::Both, false, Some(zero_money())),
        K::LoadingCost => (S::Both, false, Some(zero_money())),
        K::UnloadingCost => (S::Both, false, Some(zero_money())),
        K::InsurancePct => (S::Both, false, Some(zero_number())),
        K::HandlingCost => (S::Both, false, Some(zero_money())),
        K::StorageCost => (S::Both, false, Some(zero_money())),
        K::DutyRatePct => (S::Product, true, None),
        K::ExciseRatePct => (S::Product, false, Some(zero_number())),
        K::ImportVatPct => (S::Both, true, None),
        K::CustomsProcessingFee => (S::Both, false, Some(zero_money())),
        K::BrokerFee => (S::Both, false, Some(zero_money())),
        K::DocumentationFee => (S::Both, false, Some(zero_money())),
        K::CertificationFee => (S::Both, false, Some(zero_money())),
        K::BankTransferFeePct => (S::Both, false, Some(zero_number())),
        // Full prepayment by default: no financed principal, no financing cost.
        K::AdvancePaymentPct => {
            (S::Both, false, Some(VariableValue::Number(Decimal::ONE_HUNDRED)))
        }
        K::DaysToAdvance => (S::Both, false, Some(VariableValue::Count(0))),
        K::DaysToDelivery => (S::Both, false, Some(VariableValue::Count(0))),
        K::DeferralDays => (S::Both, false, Some(VariableValue::Count(0))),
        K::MarkupPct => (S::Both, true, None),
        K::SalesVatPct => (S::Both, false, Some(zero_number())),
        K::AgentCommissionPct => (S::Both, false, Some(zero_number())),
        K::CustomerDiscountPct => (S::Both, false, Some(zero_number())),
        K::WarrantyReservePct => (S::Both, false, Some(zero_number())),
        K::QuoteCurrency => (S::Quote, true, None),
        K::RateForexRisk => (S::Admin, true, None),
        K::RateFinCommission => (S::Admin, true, None),
        K::RateLoanInterestDaily => (S::Admin, true, None),
    };

    VariableSpec { key, scope, required, fallback }
}

pub fn is_admin_protected(key: VariableKey) -> bool {
    matches!(spec(key).scope, VariableScope::Admin)
}

#[cfg(test)]
mod tests {
    use super::{is_admin_protected, spec, VariableKey, VariableScope};

    #[test]
    fn registry_covers_every_key() {
        // spec() is a total match, so this mostly guards ALL staying in sync.
        assert_eq!(VariableKey::ALL.len(), 35);
        for key in VariableKey::ALL {
            let spec = spec(key);
            assert_eq!(spec.key, key);
            if spec.required {
                assert!(spec.fallback.is_none(), "{key} is required but has a fallback");
            } else {
                assert!(spec.fallback.is_some(), "{key} is optional but has no fallback");
            }
        }
    }

    #[test]
    fn only_the_three_financing_rates_are_admin_protected() {
        let admin: Vec<_> =
            VariableKey::ALL.into_iter().filter(|key| is_admin_protected(*key)).collect();
        assert_eq!(
            admin,
            vec![
                VariableKey::RateForexRisk,
                VariableKey::RateFinCommission,
                VariableKey::RateLoanInterestDaily,
            ]
        );
    }

    #[test]
    fn duty_rate_is_product_scoped_and_required() {
        let spec = spec(VariableKey::DutyRatePct);
        assert_eq!(spec.scope, VariableScope::Product);
        assert!(spec.required);
    }

    #[test]
    fn names_are_snake_case_and_unique() {
        let mut names: Vec<_> = VariableKey::ALL.iter().map(|key| key.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), VariableKey::ALL.len());
    }
}
