use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::{Currency, Money};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

/// Quote-level defaults. Every optional field is a tier-2 value in the
/// resolution chain: a product override beats it, and the static fallback
/// (or an admin setting) sits beneath it. Immutable once a calculation run
/// starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDefaults {
    pub quote_id: QuoteId,
    /// Display currency for client-facing output fields.
    pub currency: Currency,
    /// Informational delivery terms (e.g. "CIF Novorossiysk"). Carried
    /// through to output, never consulted by the pipeline.
    pub delivery_terms: Option<String>,

    // payment milestones
    pub advance_payment_pct: Option<Decimal>,
    pub days_to_advance: Option<u32>,
    pub days_to_delivery: Option<u32>,
    pub deferral_days: Option<u32>,

    // pricing
    pub markup_pct: Option<Decimal>,
    pub sales_vat_pct: Option<Decimal>,
    pub agent_commission_pct: Option<Decimal>,
    pub customer_discount_pct: Option<Decimal>,
    pub warranty_reserve_pct: Option<Decimal>,

    // duties and percentage fees
    pub import_vat_pct: Option<Decimal>,
    pub insurance_pct: Option<Decimal>,
    pub bank_transfer_fee_pct: Option<Decimal>,

    // per-leg logistics defaults
    pub freight_cost: Option<Money>,
    pub inland_transport_cost: Option<Money>,
    pub loading_cost: Option<Money>,
    pub unloading_cost: Option<Money>,
    pub handling_cost: Option<Money>,
    pub storage_cost: Option<Money>,
    pub packaging_cost_per_unit: Option<Money>,

    // flat fee defaults
    pub customs_processing_fee: Option<Money>,
    pub broker_fee: Option<Money>,
    pub documentation_fee: Option<Money>,
    pub certification_fee: Option<Money>,
}

impl QuoteDefaults {
    /// A defaults record with only the mandatory fields set. Useful as a
    /// starting point for callers and fixtures.
    pub fn new(quote_id: QuoteId, currency: Currency) -> Self {
        Self {
            quote_id,
            currency,
            delivery_terms: None,
            advance_payment_pct: None,
            days_to_advance: None,
            days_to_delivery: None,
            deferral_days: None,
            markup_pct: None,
            sales_vat_pct: None,
            agent_commission_pct: None,
            customer_discount_pct: None,
            warranty_reserve_pct: None,
            import_vat_pct: None,
            insurance_pct: None,
            bank_transfer_fee_pct: None,
            freight_cost: None,
            inland_transport_cost: None,
            loading_cost: None,
            unloading_cost: None,
            handling_cost: None,
            storage_cost: None,
            packaging_cost_per_unit: None,
            customs_processing_fee: None,
            broker_fee: None,
            documentation_fee: None,
            certification_fee: None,
        }
    }
}
