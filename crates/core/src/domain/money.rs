use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper-case ISO-4217-style currency code. The engine's reference currency
/// is USD; everything else must have a rate in the run's snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn reference() -> Self {
        Self("USD".to_owned())
    }

    pub fn is_reference(&self) -> bool {
        self.0 == "USD"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount that always carries its currency. Bare numeric monetary values
/// never cross a module boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self { amount: Decimal::ZERO, currency }
    }

    pub fn reference(amount: Decimal) -> Self {
        Self { amount, currency: Currency::reference() }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{Currency, Money};

    #[test]
    fn currency_normalizes_case_and_whitespace() {
        assert_eq!(Currency::new(" eur "), Currency("EUR".to_owned()));
    }

    #[test]
    fn reference_currency_is_usd() {
        assert!(Currency::reference().is_reference());
        assert!(!Currency::new("EUR").is_reference());
    }

    #[test]
    fn money_displays_amount_with_tag() {
        let money = Money::new(dec!(12.50), Currency::new("RUB"));
        assert_eq!(money.to_string(), "12.50 RUB");
    }
}
