use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::Money;
use crate::variables::{VariableKey, VariableValue};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// One quote line item as uploaded or entered. Product-scoped variables are
/// structural fields; quote-scoped variables can be superseded per product
/// through `overrides`, keyed by the closed [`VariableKey`] enum so an
/// unknown or misspelled variable cannot reach the resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub id: ProductId,
    pub quantity: u32,
    pub base_price: Money,
    pub customs_code: String,
    pub supplier_country: String,
    pub weight_kg: Option<Decimal>,
    pub supplier_discount_pct: Option<Decimal>,
    /// Import duty rate for this customs code. Product-scoped and required:
    /// there is no meaningful quote-wide default for a tariff line.
    pub duty_rate_pct: Option<Decimal>,
    pub excise_rate_pct: Option<Decimal>,
    #[serde(default)]
    pub overrides: BTreeMap<VariableKey, VariableValue>,
}

impl ProductInput {
    pub fn new(id: ProductId, quantity: u32, base_price: Money) -> Self {
        Self {
            id,
            quantity,
            base_price,
            customs_code: String::new(),
            supplier_country: String::new(),
            weight_kg: None,
            supplier_discount_pct: None,
            duty_rate_pct: None,
            excise_rate_pct: None,
            overrides: BTreeMap::new(),
        }
    }
}
