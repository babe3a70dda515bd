use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::money::{Currency, Money};
use crate::errors::CalculationError;

/// Number of decimal places kept on display-converted fields. Intermediate
/// phase values keep full precision; rounding happens exactly once.
pub const DISPLAY_SCALE: u32 = 2;

/// Immutable exchange-rate snapshot for one calculation run. Every rate is
/// expressed as units of the reference currency (USD) per one unit of the
/// quoted currency. Fetched once by the caller, never refreshed mid-run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
    timestamp: DateTime<Utc>,
    source: String,
    rates: BTreeMap<Currency, Decimal>,
}

impl ExchangeRateSnapshot {
    /// Builds a snapshot, rejecting non-positive rates up front. A zero rate
    /// would make `from_reference` divide by zero on first use.
    pub fn new(
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
        rates: impl IntoIterator<Item = (Currency, Decimal)>,
    ) -> Result<Self, CalculationError> {
        let mut map = BTreeMap::new();
        for (currency, rate) in rates {
            if rate <= Decimal::ZERO {
                return Err(CalculationError::invalid_input(format!(
                    "non-positive exchange rate {rate} for {currency}"
                )));
            }
            map.insert(currency, rate);
        }
        map.insert(Currency::reference(), Decimal::ONE);
        Ok(Self { timestamp, source: source.into(), rates: map })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rate_to_reference(&self, currency: &Currency) -> Result<Decimal, CalculationError> {
        if currency.is_reference() {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(currency)
            .copied()
            .ok_or_else(|| CalculationError::unknown_currency(currency.as_str()))
    }

    /// Converts a tagged amount into the reference currency.
    pub fn to_reference(&self, money: &Money) -> Result<Decimal, CalculationError> {
        let rate = self.rate_to_reference(&money.currency)?;
        Ok(money.amount * rate)
    }

    /// Converts a reference-currency amount into `target`, keeping full
    /// precision. Use [`Self::display_from_reference`] for client-facing
    /// fields.
    pub fn from_reference(
        &self,
        amount: Decimal,
        target: &Currency,
    ) -> Result<Money, CalculationError> {
        let rate = self.rate_to_reference(target)?;
        Ok(Money::new(amount / rate, target.clone()))
    }

    /// Display conversion: reference amount into `target`, rounded half-up
    /// to two decimal places. The single place in the engine where rounding
    /// happens.
    pub fn display_from_reference(
        &self,
        amount: Decimal,
        target: &Currency,
    ) -> Result<Money, CalculationError> {
        let converted = self.from_reference(amount, target)?;
        Ok(Money::new(round_display(converted.amount), converted.currency))
    }
}

pub fn round_display(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // Pin the scale so display amounts always serialize with two places.
    rounded.rescale(DISPLAY_SCALE);
    rounded
}
