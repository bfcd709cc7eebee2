//! Settlement currencies and the single conversion rule used across the engine.
//!
//! Every conversion goes through [`ExchangeRate`], whose value is the amount of
//! pesos per dollar: `ARS = USD * rate` and `USD = ARS / rate`.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// Settlement currency of a party, a charge or a financing rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ars,
    #[default]
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ars => "ARS",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Pesos per dollar. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    /// Validates a raw rate as entered by the user or returned by the rate lookup.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidExchangeRate`] when `value <= 0`; a zero rate
    /// would otherwise turn every peso amount into a division by zero.
    pub fn new(value: Decimal) -> Result<Self, PricingError> {
        if value <= Decimal::ZERO {
            return Err(PricingError::InvalidExchangeRate(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn usd_to_ars(&self, usd: Decimal) -> Decimal {
        usd * self.0
    }

    pub fn ars_to_usd(&self, ars: Decimal) -> Decimal {
        ars / self.0
    }

    /// Expresses `amount`, denominated in `from`, in currency `to`.
    pub fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Decimal {
        match (from, to) {
            (Currency::Usd, Currency::Ars) => self.usd_to_ars(amount),
            (Currency::Ars, Currency::Usd) => self.ars_to_usd(amount),
            _ => amount,
        }
    }
}

impl<'de> Deserialize<'de> for ExchangeRate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        ExchangeRate::new(value).map_err(serde::de::Error::custom)
    }
}

/// Converts only when the currencies differ, validating the raw rate lazily.
///
/// Same-currency amounts pass through even when no usable rate has been entered yet.
pub fn convert_with_raw_rate(
    amount: Decimal,
    from: Currency,
    to: Currency,
    raw_rate: Decimal,
) -> Result<Decimal, PricingError> {
    if from == to {
        return Ok(amount);
    }
    Ok(ExchangeRate::new(raw_rate)?.convert(amount, from, to))
}

/// Rounds a monetary amount half away from zero.
pub fn round_money(amount: Decimal, decimals: u32) -> Decimal {
    amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rejects_non_positive_rate() {
        assert_eq!(
            ExchangeRate::new(dec!(0)),
            Err(PricingError::InvalidExchangeRate(dec!(0)))
        );
        assert!(ExchangeRate::new(dec!(-5)).is_err());
    }

    #[test]
    fn test_conversion_direction() {
        let rate = ExchangeRate::new(dec!(1000)).unwrap();
        assert_eq!(rate.convert(dec!(30), Currency::Usd, Currency::Ars), dec!(30000));
        assert_eq!(rate.convert(dec!(30000), Currency::Ars, Currency::Usd), dec!(30));
        assert_eq!(rate.convert(dec!(12), Currency::Usd, Currency::Usd), dec!(12));
    }

    #[test]
    fn test_same_currency_does_not_need_rate() {
        let amount = convert_with_raw_rate(dec!(50), Currency::Ars, Currency::Ars, dec!(0));
        assert_eq!(amount, Ok(dec!(50)));

        let amount = convert_with_raw_rate(dec!(50), Currency::Ars, Currency::Usd, dec!(0));
        assert!(amount.is_err());
    }

    #[test]
    fn test_currency_wire_format() {
        assert_eq!(serde_json::to_string(&Currency::Ars).unwrap(), "\"ARS\"");
        let parsed: Currency = serde_json::from_str("\"USD\"").unwrap();
        assert_eq!(parsed, Currency::Usd);
    }

    #[test]
    fn test_rate_deserialization_validates() {
        assert!(serde_json::from_str::<ExchangeRate>("0").is_err());
        let rate: ExchangeRate = serde_json::from_str("1250.5").unwrap();
        assert_eq!(rate.value(), dec!(1250.5));
        let rate: ExchangeRate = serde_json::from_str("\"980.25\"").unwrap();
        assert_eq!(rate.value(), dec!(980.25));
        assert!(serde_json::from_str::<ExchangeRate>("\"-1\"").is_err());
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(10.005), 2), dec!(10.01));
        assert_eq!(round_money(dec!(-10.005), 2), dec!(-10.01));
    }
}
