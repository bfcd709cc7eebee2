//! Financing rules and the coverage check that blocks the wizard until every
//! financeable balance is assigned to installment plans.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::composition::Party;
use crate::currency::{Currency, convert_with_raw_rate};
use crate::error::PricingError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    #[default]
    Mensual,
    Bimestral,
    Trimestral,
    Semestral,
    Anual,
    /// A single payment.
    Unico,
}

impl Periodicity {
    /// Months between two consecutive installments.
    pub fn months(&self) -> u32 {
        match self {
            Periodicity::Mensual => 1,
            Periodicity::Bimestral => 2,
            Periodicity::Trimestral => 3,
            Periodicity::Semestral => 6,
            Periodicity::Anual => 12,
            Periodicity::Unico => 0,
        }
    }
}

/// Longest plan a rule may carry: fifty years of monthly installments.
pub const MAX_INSTALLMENTS: u32 = 600;

/// Highest annual rate a rule may carry, as a percentage.
pub const MAX_ANNUAL_RATE: Decimal = dec!(1000);

/// Amortization system used when a rule carries interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmortizationSystem {
    /// Fixed installments (French system).
    #[default]
    Price,
    /// Constant amortization, decreasing installments.
    Sac,
}

/// One installment plan line assigned to a party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingRule {
    pub id: String,
    #[serde(rename = "moneda")]
    pub currency: Currency,
    #[serde(rename = "saldoFinanciar")]
    pub balance: Decimal,
    #[serde(rename = "numCuotas")]
    pub installments: u32,
    #[serde(rename = "periodicidad", default)]
    pub periodicity: Periodicity,
    #[serde(rename = "importeCuota", default)]
    pub installment_amount: Decimal,
    #[serde(rename = "primerVencimiento", default)]
    pub first_due_date: Option<NaiveDate>,
    #[serde(rename = "activa", default = "default_active")]
    pub active: bool,
    /// Annual effective rate as a percentage, when the plan carries interest.
    #[serde(rename = "tasaAnual", default, skip_serializing_if = "Option::is_none")]
    pub annual_rate: Option<Decimal>,
    #[serde(rename = "sistema", default)]
    pub system: AmortizationSystem,
}

fn default_active() -> bool {
    true
}

impl FinancingRule {
    pub fn new(id: impl Into<String>, currency: Currency, balance: Decimal, installments: u32) -> Self {
        Self {
            id: id.into(),
            currency,
            balance,
            installments,
            periodicity: Periodicity::default(),
            installment_amount: Decimal::ZERO,
            first_due_date: None,
            active: true,
            annual_rate: None,
            system: AmortizationSystem::default(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), PricingError> {
        if self.balance.is_sign_negative() && !self.balance.is_zero() {
            return Err(PricingError::InvalidInstallments {
                rule_id: self.id.clone(),
                reason: format!("balance cannot be negative, got {}", self.balance),
            });
        }
        if self.installments == 0 {
            return Err(PricingError::InvalidInstallments {
                rule_id: self.id.clone(),
                reason: "installments cannot be zero".into(),
            });
        }
        if self.installments > MAX_INSTALLMENTS {
            return Err(PricingError::InvalidInstallments {
                rule_id: self.id.clone(),
                reason: format!(
                    "installments cannot exceed {MAX_INSTALLMENTS}, got {}",
                    self.installments
                ),
            });
        }
        if let Some(rate) = self.annual_rate {
            if rate.is_sign_negative() && !rate.is_zero() {
                return Err(PricingError::InvalidInstallments {
                    rule_id: self.id.clone(),
                    reason: format!("annual rate cannot be negative, got {rate}"),
                });
            }
            if rate > MAX_ANNUAL_RATE {
                return Err(PricingError::InvalidInstallments {
                    rule_id: self.id.clone(),
                    reason: format!("annual rate cannot exceed {MAX_ANNUAL_RATE}%, got {rate}"),
                });
            }
        }
        Ok(())
    }
}

/// How much of each party's financeable balance the active rules leave uncovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub total_rules_a: Decimal,
    pub remaining_a: Decimal,
    pub total_rules_b: Decimal,
    pub remaining_b: Decimal,
    /// Party B's financeable balance, in `currency_b`.
    pub financeable_b: Decimal,
    pub currency_b: Currency,
}

impl Coverage {
    pub fn is_covered(&self, tolerance: Decimal) -> bool {
        self.remaining_a <= tolerance
            && (self.financeable_b <= Decimal::ZERO || self.remaining_b <= tolerance)
    }

    /// # Errors
    ///
    /// Returns [`PricingError::UncoveredBalance`] naming the first party whose
    /// remaining balance exceeds `tolerance`.
    pub fn ensure_covered(&self, tolerance: Decimal) -> Result<(), PricingError> {
        if self.remaining_a > tolerance {
            return Err(PricingError::UncoveredBalance {
                party: Party::A,
                currency: Currency::Ars,
                missing: self.remaining_a,
            });
        }
        if self.financeable_b > Decimal::ZERO && self.remaining_b > tolerance {
            return Err(PricingError::UncoveredBalance {
                party: Party::B,
                currency: self.currency_b,
                missing: self.remaining_b,
            });
        }
        Ok(())
    }
}

/// Sums the active rules of both parties against their financeable balances.
///
/// Party A's rules are normalized to pesos, party B's to `currency_b`. The
/// exchange rate is only required when a rule is in the other currency.
pub fn coverage(
    rules_a: &[FinancingRule],
    rules_b: &[FinancingRule],
    financeable_a_ars: Decimal,
    financeable_b: Decimal,
    currency_b: Currency,
    exchange_rate: Decimal,
) -> Result<Coverage, PricingError> {
    let total_rules_a = active_total(rules_a, Currency::Ars, exchange_rate)?;
    let total_rules_b = active_total(rules_b, currency_b, exchange_rate)?;

    let coverage = Coverage {
        total_rules_a,
        remaining_a: (financeable_a_ars - total_rules_a).max(Decimal::ZERO),
        total_rules_b,
        remaining_b: (financeable_b - total_rules_b).max(Decimal::ZERO),
        financeable_b,
        currency_b,
    };
    tracing::debug!(
        remaining_a = %coverage.remaining_a,
        remaining_b = %coverage.remaining_b,
        currency_b = %currency_b,
        "computed financing coverage"
    );
    Ok(coverage)
}

fn active_total(
    rules: &[FinancingRule],
    target: Currency,
    exchange_rate: Decimal,
) -> Result<Decimal, PricingError> {
    rules
        .iter()
        .filter(|rule| rule.active)
        .map(|rule| convert_with_raw_rate(rule.balance, rule.currency, target, exchange_rate))
        .sum()
}
