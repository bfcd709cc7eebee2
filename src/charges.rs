//! Secondary charges of a sale (stamp duty, furnishing, blueprints, notary
//! certification, other expenses) and the balance each party has to finance.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::composition::{Party, Split};
use crate::currency::{Currency, convert_with_raw_rate, round_money};
use crate::error::{PricingError, ensure_non_negative, ensure_percentage};

/// When a charge is paid.
///
/// `Waived` (bonificado) and `Unset` are different states: a waived charge is
/// zeroed on purpose, an unset one simply has no moment chosen yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMoment {
    #[serde(rename = "Firma de Boleto")]
    AtSigning,
    #[serde(rename = "Fecha Posesión A")]
    PossessionA,
    #[serde(rename = "Fecha Posesión B")]
    PossessionB,
    #[serde(rename = "Financiado A")]
    FinancedA,
    #[serde(rename = "Financiado B")]
    FinancedB,
    #[serde(rename = "Bonificado")]
    Waived,
    #[default]
    #[serde(rename = "-")]
    Unset,
}

impl PaymentMoment {
    pub const ALL: [PaymentMoment; 7] = [
        PaymentMoment::AtSigning,
        PaymentMoment::PossessionA,
        PaymentMoment::PossessionB,
        PaymentMoment::FinancedA,
        PaymentMoment::FinancedB,
        PaymentMoment::Waived,
        PaymentMoment::Unset,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMoment::AtSigning => "Firma de Boleto",
            PaymentMoment::PossessionA => "Fecha Posesión A",
            PaymentMoment::PossessionB => "Fecha Posesión B",
            PaymentMoment::FinancedA => "Financiado A",
            PaymentMoment::FinancedB => "Financiado B",
            PaymentMoment::Waived => "Bonificado",
            PaymentMoment::Unset => "-",
        }
    }

    /// The party whose financed balance absorbs the charge, if any.
    pub fn financed_by(&self) -> Option<Party> {
        match self {
            PaymentMoment::FinancedA => Some(Party::A),
            PaymentMoment::FinancedB => Some(Party::B),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMoment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Charge {
    SignatureCertification,
    Stamp,
    Furnishing,
    UnitBlueprints,
    GarageBlueprints,
    OtherExpenses,
}

impl Charge {
    pub const ALL: [Charge; 6] = [
        Charge::SignatureCertification,
        Charge::Stamp,
        Charge::Furnishing,
        Charge::UnitBlueprints,
        Charge::GarageBlueprints,
        Charge::OtherExpenses,
    ];

    /// Notary certification and stamp duty are billed in pesos, the rest in dollars.
    pub fn currency(&self) -> Currency {
        match self {
            Charge::SignatureCertification | Charge::Stamp => Currency::Ars,
            _ => Currency::Usd,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMoments {
    pub signature_certification: PaymentMoment,
    pub stamp: PaymentMoment,
    pub furnishing: PaymentMoment,
    pub unit_blueprints: PaymentMoment,
    pub garage_blueprints: PaymentMoment,
    pub other_expenses: PaymentMoment,
}

impl PaymentMoments {
    pub fn get(&self, charge: Charge) -> PaymentMoment {
        match charge {
            Charge::SignatureCertification => self.signature_certification,
            Charge::Stamp => self.stamp,
            Charge::Furnishing => self.furnishing,
            Charge::UnitBlueprints => self.unit_blueprints,
            Charge::GarageBlueprints => self.garage_blueprints,
            Charge::OtherExpenses => self.other_expenses,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeInput {
    /// Operation total in USD.
    pub total_usd: Decimal,
    /// Party A's share including IVA, in pesos. Base of the stamp duty.
    pub party_a_ars_with_iva: Decimal,
    pub signature_certification: Decimal,
    pub stamp_percentage: Decimal,
    pub furnishing_percentage: Decimal,
    pub unit_blueprint_rate_m2: Decimal,
    pub unit_blueprint_m2: Decimal,
    pub garage_blueprint_rate: Decimal,
    pub garage_count: u32,
    pub other_expenses: Decimal,
    pub moments: PaymentMoments,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeLine {
    pub charge: Charge,
    pub currency: Currency,
    pub amount: Decimal,
    pub moment: PaymentMoment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeBreakdown {
    pub lines: Vec<ChargeLine>,
    pub total_ars: Decimal,
    pub total_usd: Decimal,
}

impl ChargeBreakdown {
    pub fn amount(&self, charge: Charge) -> Decimal {
        self.lines
            .iter()
            .find(|line| line.charge == charge)
            .map(|line| line.amount)
            .unwrap_or_default()
    }
}

/// Party A's peso value, grossed up by IVA when it applies.
pub fn party_a_ars_with_iva(
    split: &Split,
    exchange_rate: Decimal,
    apply_iva: bool,
    iva_percentage: Decimal,
) -> Result<Decimal, PricingError> {
    let base = party_amount_in(split, Party::A, Currency::Ars, exchange_rate)?;
    if !apply_iva {
        return Ok(base);
    }
    Ok(base * (Decimal::ONE_HUNDRED + iva_percentage) / Decimal::ONE_HUNDRED)
}

/// Derives every charge amount and the per-currency totals.
///
/// # Errors
///
/// Rejects percentages outside `[0, 100]` and negative rates, surfaces or amounts.
pub fn compute_charges(input: &ChargeInput, decimals: u32) -> Result<ChargeBreakdown, PricingError> {
    ensure_percentage("selladoPorcentaje", input.stamp_percentage)?;
    ensure_percentage("alhajamiemtoPorcentaje", input.furnishing_percentage)?;
    ensure_non_negative("certificacionFirmas", input.signature_certification)?;
    ensure_non_negative("planosUnidadValorM2", input.unit_blueprint_rate_m2)?;
    ensure_non_negative("planosUnidadM2", input.unit_blueprint_m2)?;
    ensure_non_negative("planosCocheraValor", input.garage_blueprint_rate)?;
    ensure_non_negative("otrosGastos", input.other_expenses)?;

    let lines: Vec<ChargeLine> = Charge::ALL
        .iter()
        .map(|&charge| {
            let moment = input.moments.get(charge);
            let amount = if moment == PaymentMoment::Waived {
                Decimal::ZERO
            } else {
                round_money(raw_amount(input, charge), decimals)
            };
            ChargeLine {
                charge,
                currency: charge.currency(),
                amount,
                moment,
            }
        })
        .collect();

    let total_in = |currency: Currency| -> Decimal {
        lines
            .iter()
            .filter(|line| line.currency == currency)
            .map(|line| line.amount)
            .sum()
    };
    let total_ars = total_in(Currency::Ars);
    let total_usd = total_in(Currency::Usd);

    tracing::debug!(%total_ars, %total_usd, "computed charges");

    Ok(ChargeBreakdown {
        lines,
        total_ars,
        total_usd,
    })
}

fn raw_amount(input: &ChargeInput, charge: Charge) -> Decimal {
    match charge {
        Charge::SignatureCertification => input.signature_certification,
        Charge::Stamp => input.party_a_ars_with_iva * input.stamp_percentage / Decimal::ONE_HUNDRED,
        Charge::Furnishing => input.total_usd * input.furnishing_percentage / Decimal::ONE_HUNDRED,
        Charge::UnitBlueprints => input.unit_blueprint_rate_m2 * input.unit_blueprint_m2,
        Charge::GarageBlueprints => input.garage_blueprint_rate * Decimal::from(input.garage_count),
        Charge::OtherExpenses => input.other_expenses,
    }
}

/// Down payments already agreed per party and currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Advances {
    pub ars_a: Decimal,
    pub ars_b: Decimal,
    pub usd_a: Decimal,
    pub usd_b: Decimal,
}

impl Advances {
    fn validate(&self) -> Result<(), PricingError> {
        ensure_non_negative("anticipoArsA", self.ars_a)?;
        ensure_non_negative("anticipoArsB", self.ars_b)?;
        ensure_non_negative("anticipoUsdA", self.usd_a)?;
        ensure_non_negative("anticipoUsdB", self.usd_b)?;
        Ok(())
    }

    fn of(&self, party: Party) -> (Decimal, Decimal) {
        match party {
            Party::A => (self.ars_a, self.usd_a),
            Party::B => (self.ars_b, self.usd_b),
        }
    }
}

/// Balances left to finance. Party A is always expressed in pesos, party B in
/// its settlement currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinanceableTotals {
    pub party_a_ars: Decimal,
    pub party_b: Decimal,
    pub currency_b: Currency,
}

/// Party share minus its advances plus every charge financed into it.
pub fn financeable_totals(
    split: &Split,
    advances: &Advances,
    charges: &ChargeBreakdown,
    exchange_rate: Decimal,
    decimals: u32,
) -> Result<FinanceableTotals, PricingError> {
    advances.validate()?;

    let party_a_ars = financeable_for(
        split,
        Party::A,
        Currency::Ars,
        advances,
        charges,
        exchange_rate,
    )?;
    let party_b = financeable_for(
        split,
        Party::B,
        split.currency_b,
        advances,
        charges,
        exchange_rate,
    )?;

    let totals = FinanceableTotals {
        party_a_ars: round_money(party_a_ars, decimals),
        party_b: round_money(party_b, decimals),
        currency_b: split.currency_b,
    };
    tracing::debug!(
        party_a_ars = %totals.party_a_ars,
        party_b = %totals.party_b,
        currency_b = %totals.currency_b,
        "computed financeable totals"
    );
    Ok(totals)
}

fn financeable_for(
    split: &Split,
    party: Party,
    currency: Currency,
    advances: &Advances,
    charges: &ChargeBreakdown,
    exchange_rate: Decimal,
) -> Result<Decimal, PricingError> {
    let base = party_amount_in(split, party, currency, exchange_rate)?;

    let (advance_ars, advance_usd) = advances.of(party);
    let paid = convert_with_raw_rate(advance_ars, Currency::Ars, currency, exchange_rate)?
        + convert_with_raw_rate(advance_usd, Currency::Usd, currency, exchange_rate)?;

    let mut financed_charges = Decimal::ZERO;
    for line in &charges.lines {
        if line.moment.financed_by() == Some(party) && !line.amount.is_zero() {
            financed_charges +=
                convert_with_raw_rate(line.amount, line.currency, currency, exchange_rate)?;
        }
    }

    Ok((base - paid + financed_charges).max(Decimal::ZERO))
}

/// A party's share in `currency`, reusing the share already held in that
/// currency so no round trip through dollars loses cents.
fn party_amount_in(
    split: &Split,
    party: Party,
    currency: Currency,
    exchange_rate: Decimal,
) -> Result<Decimal, PricingError> {
    let (own_amount, own_currency) = match party {
        Party::A => (split.amount_a, split.currency_a),
        Party::B => (split.amount_b, split.currency_b),
    };
    if own_currency == currency {
        return Ok(own_amount);
    }
    convert_with_raw_rate(split.amount_usd(party), Currency::Usd, currency, exchange_rate)
}
