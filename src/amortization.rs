//! Installment plans for a financing rule.
//!
//! Interest-free rules split the balance evenly. Rules with an annual rate use
//! one of the two usual amortization systems:
//! - **Price (French system)**: fixed installments for the whole plan.
//! - **SAC (constant amortization)**: fixed principal per installment, so the
//!   installment decreases as interest falls.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::financing::{AmortizationSystem, FinancingRule, Periodicity};

/// One installment of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position in the plan.
    pub number: u32,
    /// Due date, when the rule has a first due date.
    pub due_date: Option<NaiveDate>,
    /// Total paid in this installment.
    pub payment: Decimal,
    /// The portion of the payment that reduces the balance.
    pub amortization: Decimal,
    /// The portion of the payment that covers interest.
    pub interest: Decimal,
    /// The balance left after the payment.
    pub remaining_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    /// First installment; the fixed installment for Price and interest-free plans.
    pub first_payment: Decimal,
    pub last_payment: Decimal,
    pub total_paid: Decimal,
    pub installments: Vec<Installment>,
}

/// Converts an annual effective rate percentage into the equivalent rate per period.
///
/// 12% a year paid monthly is `(1.12)^(1/12) - 1`, a bit less than 1% a month.
pub fn periodic_rate(annual_percentage: Decimal, periodicity: Periodicity) -> Result<Decimal, anyhow::Error> {
    let months = periodicity.months();
    if months == 0 || annual_percentage.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let base = Decimal::ONE + annual_percentage / Decimal::ONE_HUNDRED;
    let exponent = Decimal::from(months) / dec!(12);

    let growth = base
        .checked_powd(exponent)
        .ok_or_else(|| anyhow::anyhow!("Annual rate {annual_percentage}% cannot be converted per period."))?;
    Ok(growth - Decimal::ONE)
}

/// Number of installments actually paid: a single-payment rule always has one.
pub fn effective_installments(rule: &FinancingRule) -> u32 {
    match rule.periodicity {
        Periodicity::Unico => 1,
        _ => rule.installments,
    }
}

/// Installment count and periodic rate of a rule, after checking its terms.
fn plan_terms(rule: &FinancingRule) -> Result<(u32, Decimal), anyhow::Error> {
    rule.validate()?;
    let rate = match rule.annual_rate {
        Some(annual) => periodic_rate(annual, rule.periodicity)?,
        None => Decimal::ZERO,
    };
    Ok((effective_installments(rule), rate))
}

/// Builds the full installment plan of a rule.
///
/// # Errors
///
/// Returns an error if the rule has zero installments, more than
/// [`MAX_INSTALLMENTS`](crate::financing::MAX_INSTALLMENTS), or amounts that
/// leave the decimal range.
pub fn installment_plan(rule: &FinancingRule) -> Result<InstallmentPlan, anyhow::Error> {
    let (count, rate) = plan_terms(rule)?;

    let mut plan = if rate.is_zero() {
        calculate_even_plan(rule.balance, count)?
    } else {
        match rule.system {
            AmortizationSystem::Price => calculate_price_plan(rule.balance, rate, count)?,
            AmortizationSystem::Sac => calculate_sac_plan(rule.balance, rate, count)?,
        }
    };

    if let Some(first) = rule.first_due_date {
        for installment in &mut plan.installments {
            installment.due_date = due_date(first, rule.periodicity, installment.number - 1);
        }
    }

    Ok(plan)
}

/// The installment shown on the rule: the first (and for fixed plans, every) payment.
///
/// Computed from the plan terms alone, without building the schedule.
pub fn installment_amount(rule: &FinancingRule) -> Result<Decimal, anyhow::Error> {
    let (count, rate) = plan_terms(rule)?;
    let amortization = rule.balance / Decimal::from(count);

    if rate.is_zero() {
        // a single installment carries the whole balance unrounded, as in the plan
        return Ok(if count == 1 { rule.balance } else { amortization.round_dp(2) });
    }

    let payment = match rule.system {
        AmortizationSystem::Price => price_payment(rule.balance, rate, count)?,
        AmortizationSystem::Sac => amortization
            .checked_add(checked_mul(rule.balance, rate)?)
            .ok_or_else(out_of_range)?,
    };
    Ok(payment.round_dp(2))
}

/// Due date of installment `index` (0-based). End-of-month dates clamp to the
/// last day of shorter months.
pub fn due_date(first: NaiveDate, periodicity: Periodicity, index: u32) -> Option<NaiveDate> {
    let months = periodicity.months().checked_mul(index)?;
    first.checked_add_months(Months::new(months))
}

fn out_of_range() -> anyhow::Error {
    anyhow::anyhow!("Installment amounts exceed the supported decimal range.")
}

fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, anyhow::Error> {
    a.checked_mul(b).ok_or_else(out_of_range)
}

fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, anyhow::Error> {
    a.checked_add(b).ok_or_else(out_of_range)
}

/// Fixed payment: PMT = P * [i(1 + i)^n] / [(1 + i)^n – 1]
fn price_payment(
    total_amount: Decimal,
    periodic_rate: Decimal,
    total_installments: u32,
) -> Result<Decimal, anyhow::Error> {
    let i_plus_1_pow_n = (Decimal::ONE + periodic_rate)
        .checked_powu(total_installments.into())
        .ok_or_else(out_of_range)?;
    checked_mul(total_amount, checked_mul(periodic_rate, i_plus_1_pow_n)?)?
        .checked_div(i_plus_1_pow_n - Decimal::ONE)
        .ok_or_else(out_of_range)
}

fn calculate_even_plan(total_amount: Decimal, total_installments: u32) -> Result<InstallmentPlan, anyhow::Error> {
    if total_installments == 0 {
        return Err(anyhow::anyhow!("Total installments cannot be zero."));
    }

    let payment = (total_amount / Decimal::from(total_installments)).round_dp(2);
    let mut current_balance = total_amount;
    let mut installments = Vec::new();

    for number in 1..=total_installments {
        // the last installment absorbs the rounding
        let amortization = if number == total_installments {
            current_balance
        } else {
            payment
        };
        current_balance -= amortization;
        installments.push(Installment {
            number,
            due_date: None,
            payment: amortization,
            amortization,
            interest: Decimal::ZERO,
            remaining_balance: current_balance.max(Decimal::ZERO),
        });
    }

    Ok(InstallmentPlan {
        first_payment: installments.first().map(|i| i.payment).unwrap_or_default(),
        last_payment: installments.last().map(|i| i.payment).unwrap_or_default(),
        total_paid: total_amount.round_dp(2),
        installments,
    })
}

fn calculate_price_plan(
    total_amount: Decimal,
    periodic_rate: Decimal,
    total_installments: u32,
) -> Result<InstallmentPlan, anyhow::Error> {
    if total_installments == 0 {
        return Err(anyhow::anyhow!("Total installments cannot be zero."));
    }

    let fixed_payment = price_payment(total_amount, periodic_rate, total_installments)?;

    let mut current_balance = total_amount;
    let mut total_paid = Decimal::ZERO;
    let mut installments = Vec::new();

    for number in 1..=total_installments {
        let interest = checked_mul(current_balance, periodic_rate)?;
        let amortization = fixed_payment - interest;
        current_balance -= amortization;
        total_paid = checked_add(total_paid, fixed_payment)?;
        installments.push(Installment {
            number,
            due_date: None,
            payment: fixed_payment.round_dp(2),
            amortization: amortization.round_dp(2),
            interest: interest.round_dp(2),
            remaining_balance: current_balance.max(Decimal::ZERO).round_dp(2),
        });
    }

    Ok(InstallmentPlan {
        first_payment: fixed_payment.round_dp(2),
        last_payment: fixed_payment.round_dp(2),
        total_paid: total_paid.round_dp(2),
        installments,
    })
}

fn calculate_sac_plan(
    total_amount: Decimal,
    periodic_rate: Decimal,
    total_installments: u32,
) -> Result<InstallmentPlan, anyhow::Error> {
    if total_installments == 0 {
        return Err(anyhow::anyhow!("Total installments cannot be zero."));
    }

    let fixed_amortization = total_amount / Decimal::from(total_installments);
    let mut current_balance = total_amount;
    let mut total_paid = Decimal::ZERO;
    let mut installments = Vec::new();

    for number in 1..=total_installments {
        let interest = checked_mul(current_balance, periodic_rate)?;
        let payment = checked_add(fixed_amortization, interest)?;
        current_balance -= fixed_amortization;
        total_paid = checked_add(total_paid, payment)?;
        installments.push(Installment {
            number,
            due_date: None,
            payment: payment.round_dp(2),
            amortization: fixed_amortization.round_dp(2),
            interest: interest.round_dp(2),
            remaining_balance: current_balance.max(Decimal::ZERO).round_dp(2),
        });
    }

    Ok(InstallmentPlan {
        first_payment: installments.first().map(|i| i.payment).unwrap_or_default(),
        last_payment: installments.last().map(|i| i.payment).unwrap_or_default(),
        total_paid: total_paid.round_dp(2),
        installments,
    })
}
