//! F/SB composition: splitting the operation total between party A (F) and party B (SB).

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::{Currency, convert_with_raw_rate, round_money};
use crate::error::{PricingError, ensure_non_negative, ensure_percentage};

/// One of the two economic parties of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    A,
    B,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::A => f.write_str("A"),
            Party::B => f.write_str("B"),
        }
    }
}

/// How party A's share is entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMode {
    #[default]
    #[serde(rename = "porcentaje")]
    Percentage,
    #[serde(rename = "importe")]
    Amount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitInput {
    /// Operation total in USD.
    pub total_usd: Decimal,
    pub mode: SplitMode,
    /// Party A's share in `[0, 100]`, used in percentage mode.
    pub percentage_a: Decimal,
    /// Party A's fixed amount in `currency_a`, used in amount mode.
    pub amount_a: Decimal,
    pub currency_a: Currency,
    pub currency_b: Currency,
    /// Raw exchange rate; validated only when a conversion is needed.
    pub exchange_rate: Decimal,
}

/// Result of the split. Amounts are rounded to the configured precision and
/// party B always absorbs the rounding so both shares add up to the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub percentage_a: Decimal,
    pub percentage_b: Decimal,
    pub amount_a_usd: Decimal,
    pub amount_b_usd: Decimal,
    /// Party A's share in `currency_a`.
    pub amount_a: Decimal,
    /// Party B's share in `currency_b`.
    pub amount_b: Decimal,
    pub currency_a: Currency,
    pub currency_b: Currency,
}

impl Split {
    pub fn amount_usd(&self, party: Party) -> Decimal {
        match party {
            Party::A => self.amount_a_usd,
            Party::B => self.amount_b_usd,
        }
    }
}

/// Splits the operation total between both parties.
///
/// # Errors
///
/// Rejects a percentage outside `[0, 100]`, a negative fixed amount, a fixed
/// amount larger than the total and a non-positive exchange rate whenever a
/// peso conversion is required.
pub fn split_total(input: &SplitInput, decimals: u32) -> Result<Split, PricingError> {
    ensure_non_negative("total", input.total_usd)?;

    let (percentage_a, percentage_b, amount_a_usd) = match input.mode {
        SplitMode::Percentage => {
            ensure_percentage("porcA", input.percentage_a)?;
            let amount_a_usd =
                round_money(input.total_usd * input.percentage_a / Decimal::ONE_HUNDRED, decimals);
            (
                input.percentage_a,
                Decimal::ONE_HUNDRED - input.percentage_a,
                amount_a_usd,
            )
        }
        SplitMode::Amount => {
            ensure_non_negative("impA", input.amount_a)?;
            let amount_a_usd = round_money(
                convert_with_raw_rate(
                    input.amount_a,
                    input.currency_a,
                    Currency::Usd,
                    input.exchange_rate,
                )?,
                decimals,
            );
            if amount_a_usd > input.total_usd {
                return Err(PricingError::OutOfRange {
                    field: "impA",
                    value: amount_a_usd,
                    min: Decimal::ZERO,
                    max: input.total_usd,
                });
            }
            let percentage_a = if input.total_usd.is_zero() {
                Decimal::ZERO
            } else {
                round_money(amount_a_usd / input.total_usd * Decimal::ONE_HUNDRED, decimals)
            };
            (percentage_a, Decimal::ONE_HUNDRED - percentage_a, amount_a_usd)
        }
    };

    let amount_b_usd = input.total_usd - amount_a_usd;

    let amount_a = match (input.mode, input.currency_a) {
        // the entered amount is already in A's currency
        (SplitMode::Amount, _) => input.amount_a,
        (SplitMode::Percentage, currency) => round_money(
            convert_with_raw_rate(amount_a_usd, Currency::Usd, currency, input.exchange_rate)?,
            decimals,
        ),
    };
    let amount_b = round_money(
        convert_with_raw_rate(amount_b_usd, Currency::Usd, input.currency_b, input.exchange_rate)?,
        decimals,
    );

    tracing::debug!(
        %amount_a_usd,
        %amount_b_usd,
        %percentage_a,
        currency_a = %input.currency_a,
        currency_b = %input.currency_b,
        "split operation total"
    );

    Ok(Split {
        percentage_a,
        percentage_b,
        amount_a_usd,
        amount_b_usd,
        amount_a,
        amount_b,
        currency_a: input.currency_a,
        currency_b: input.currency_b,
    })
}
