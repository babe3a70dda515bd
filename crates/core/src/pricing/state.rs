use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::Currency;
use crate::errors::CalculationError;
use crate::fx::ExchangeRateSnapshot;
use crate::resolver::ResolvedProduct;

/// The 13 pipeline stages, in execution order. The order is part of the
/// engine's version: phase `n` always observes phase `n-1`'s output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    ProcurementNet,
    Packaging,
    Freight,
    InsuranceHandling,
    CustomsValue,
    CustomsDuties,
    ImportVat,
    BrokerageDocs,
    LandedCost,
    Financing,
    MarkupPricing,
    SalesVat,
    Profit,
}

impl PhaseId {
    pub const ALL: [PhaseId; 13] = [
        PhaseId::ProcurementNet,
        PhaseId::Packaging,
        PhaseId::Freight,
        PhaseId::InsuranceHandling,
        PhaseId::CustomsValue,
        PhaseId::CustomsDuties,
        PhaseId::ImportVat,
        PhaseId::BrokerageDocs,
        PhaseId::LandedCost,
        PhaseId::Financing,
        PhaseId::MarkupPricing,
        PhaseId::SalesVat,
        PhaseId::Profit,
    ];

    pub fn index(self) -> u8 {
        self as u8 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            PhaseId::ProcurementNet => "procurement_net",
            PhaseId::Packaging => "packaging",
            PhaseId::Freight => "freight",
            PhaseId::InsuranceHandling => "insurance_handling",
            PhaseId::CustomsValue => "customs_value",
            PhaseId::CustomsDuties => "customs_duties",
            PhaseId::ImportVat => "import_vat",
            PhaseId::BrokerageDocs => "brokerage_docs",
            PhaseId::LandedCost => "landed_cost",
            PhaseId::Financing => "financing",
            PhaseId::MarkupPricing => "markup_pricing",
            PhaseId::SalesVat => "sales_vat",
            PhaseId::Profit => "profit",
        }
    }
}

/// One audited intermediate value. Appended as each phase executes, never
/// mutated; the variable names are the wire format the validation field
/// mapping keys into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase_index: u8,
    pub phase: String,
    pub variable: String,
    pub value: Decimal,
    pub currency: Currency,
}

/// Working state threaded through the phases. Monetary inputs are already
/// normalized into the reference currency; everything a phase writes is in
/// the reference currency too.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CalcState {
    // normalized inputs
    pub quantity_units: u32,
    pub quantity: Decimal,
    pub base_price: Decimal,
    pub supplier_discount_pct: Decimal,
    pub packaging_cost_per_unit: Decimal,
    pub freight_cost: Decimal,
    pub inland_transport_cost: Decimal,
    pub loading_cost: Decimal,
    pub unloading_cost: Decimal,
    pub insurance_pct: Decimal,
    pub handling_cost: Decimal,
    pub storage_cost: Decimal,
    pub duty_rate_pct: Decimal,
    pub excise_rate_pct: Decimal,
    pub import_vat_pct: Decimal,
    pub customs_processing_fee: Decimal,
    pub broker_fee: Decimal,
    pub documentation_fee: Decimal,
    pub certification_fee: Decimal,
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

    // phase outputs
    pub net_unit_purchase_price: Decimal,
    pub goods_subtotal: Decimal,
    pub packaging_total: Decimal,
    pub procurement_total: Decimal,
    pub freight_total: Decimal,
    pub insurance_cost: Decimal,
    pub logistics_total: Decimal,
    pub customs_value: Decimal,
    pub customs_duty: Decimal,
    pub excise_duty: Decimal,
    pub duties_total: Decimal,
    pub import_vat: Decimal,
    pub bank_transfer_fee: Decimal,
    pub fees_total: Decimal,
    pub landed_cost: Decimal,
    pub unit_landed_cost: Decimal,
    pub financed_principal: Decimal,
    pub financed_days: Decimal,
    pub forex_risk_cost: Decimal,
    pub financing_commission: Decimal,
    pub loan_interest: Decimal,
    pub financing_total: Decimal,
    pub warranty_reserve: Decimal,
    pub full_cost: Decimal,
    pub net_sales: Decimal,
    pub sales_vat: Decimal,
    pub gross_sales: Decimal,
    pub unit_sales_price_net: Decimal,
    pub unit_sales_price: Decimal,
    pub agent_commission: Decimal,
    pub profit: Decimal,
    pub unit_profit: Decimal,
    pub margin_pct: Decimal,
}

impl CalcState {
    /// Normalizes every monetary input into the reference currency using the
    /// run's snapshot. The only place the pipeline touches exchange rates on
    /// the way in.
    pub(crate) fn from_resolved(
        resolved: &ResolvedProduct,
        snapshot: &ExchangeRateSnapshot,
    ) -> Result<Self, CalculationError> {
        Ok(Self {
            quantity_units: resolved.quantity,
            quantity: Decimal::from(resolved.quantity),
            base_price: snapshot.to_reference(&resolved.base_price)?,
            supplier_discount_pct: resolved.supplier_discount_pct,
            packaging_cost_per_unit: snapshot.to_reference(&resolved.packaging_cost_per_unit)?,
            freight_cost: snapshot.to_reference(&resolved.freight_cost)?,
            inland_transport_cost: snapshot.to_reference(&resolved.inland_transport_cost)?,
            loading_cost: snapshot.to_reference(&resolved.loading_cost)?,
            unloading_cost: snapshot.to_reference(&resolved.unloading_cost)?,
            insurance_pct: resolved.insurance_pct,
            handling_cost: snapshot.to_reference(&resolved.handling_cost)?,
            storage_cost: snapshot.to_reference(&resolved.storage_cost)?,
            duty_rate_pct: resolved.duty_rate_pct,
            excise_rate_pct: resolved.excise_rate_pct,
            import_vat_pct: resolved.import_vat_pct,
            customs_processing_fee: snapshot.to_reference(&resolved.customs_processing_fee)?,
            broker_fee: snapshot.to_reference(&resolved.broker_fee)?,
            documentation_fee: snapshot.to_reference(&resolved.documentation_fee)?,
            certification_fee: snapshot.to_reference(&resolved.certification_fee)?,
            bank_transfer_fee_pct: resolved.bank_transfer_fee_pct,
            advance_payment_pct: resolved.advance_payment_pct,
            days_to_advance: resolved.days_to_advance,
            days_to_delivery: resolved.days_to_delivery,
            deferral_days: resolved.deferral_days,
            markup_pct: resolved.markup_pct,
            sales_vat_pct: resolved.sales_vat_pct,
            agent_commission_pct: resolved.agent_commission_pct,
            customer_discount_pct: resolved.customer_discount_pct,
            warranty_reserve_pct: resolved.warranty_reserve_pct,
            rate_forex_risk_pct: resolved.rate_forex_risk_pct,
            rate_fin_commission_pct: resolved.rate_fin_commission_pct,
            rate_loan_interest_daily_pct: resolved.rate_loan_interest_daily_pct,
            ..Self::default()
        })
    }
}

/// Fraction of a percentage value: 30 -> 0.30.
pub(crate) fn pct(rate: Decimal) -> Decimal {
    rate / Decimal::ONE_HUNDRED
}

/// Quantity-guarded division: unit figures are zero, not an error, for
/// zero-quantity products.
pub(crate) fn per_unit(total: Decimal, quantity: Decimal) -> Decimal {
    if quantity.is_zero() {
        Decimal::ZERO
    } else {
        total / quantity
    }
}
