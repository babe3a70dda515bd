use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Organization-wide, admin-only rates. These are the tier-3 fallback beneath
/// quote defaults and the only source for the three protected financing
/// variables: product or quote values for them are never honored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationSettings {
    pub rate_forex_risk_pct: Decimal,
    pub rate_fin_commission_pct: Decimal,
    pub rate_loan_interest_daily_pct: Decimal,
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            rate_forex_risk_pct: Decimal::ZERO,
            rate_fin_commission_pct: Decimal::ZERO,
            rate_loan_interest_daily_pct: Decimal::ZERO,
        }
    }
}
