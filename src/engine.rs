//! The full pricing pipeline over one wizard snapshot:
//! total → F/SB split → charges → financeable balances → rule coverage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::installment_amount;
use crate::charges::{
    Charge, ChargeBreakdown, ChargeInput, FinanceableTotals, PaymentMoment, compute_charges,
    financeable_totals, party_a_ars_with_iva,
};
use crate::composition::{Split, SplitMode, split_total};
use crate::config::EngineConfig;
use crate::error::PricingError;
use crate::financing::{Coverage, FinancingRule, coverage};
use crate::units::total_price;
use crate::wizard::WizardData;

/// Every value derived from a [`WizardData`] snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub unit_prices: Vec<Decimal>,
    pub total_usd: Decimal,
    pub split: Split,
    pub charges: ChargeBreakdown,
    pub financeable: FinanceableTotals,
    /// Present only for financed sales.
    pub coverage: Option<Coverage>,
    pub installments_a: Vec<Decimal>,
    pub installments_b: Vec<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: EngineConfig,
}

impl PricingEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Derives every total from the inputs of `data` without touching it.
    ///
    /// Derived fields already stored in `data` are ignored, so evaluating the
    /// same inputs twice yields identical results.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid input: a percentage out of range, a negative
    /// amount, or a non-positive exchange rate where a conversion is needed.
    pub fn evaluate(&self, data: &WizardData) -> Result<Pricing, PricingError> {
        let decimals = self.config.decimals;

        let unit_prices = unit_prices(data)?;
        let total_usd = operation_total(data, &unit_prices);

        let split = split_total(&data.split_input(total_usd), decimals)?;

        let stamp_base = if data.stamp_percentage.is_zero() || data.stamp_moment == PaymentMoment::Waived {
            Decimal::ZERO
        } else {
            party_a_ars_with_iva(
                &split,
                data.exchange_rate,
                data.apply_iva,
                self.config.iva_percentage,
            )?
        };

        let charges = compute_charges(
            &ChargeInput {
                total_usd,
                party_a_ars_with_iva: stamp_base,
                signature_certification: data.signature_certification,
                stamp_percentage: data.stamp_percentage,
                furnishing_percentage: data.furnishing_percentage,
                unit_blueprint_rate_m2: data.unit_blueprint_rate_m2,
                unit_blueprint_m2: data.unit_blueprint_m2,
                garage_blueprint_rate: data.garage_blueprint_rate,
                garage_count: data.garage_count(),
                other_expenses: data.other_expenses,
                moments: data.payment_moments(),
            },
            decimals,
        )?;

        let (financeable, coverage) = if data.is_financed() {
            let financeable = financeable_totals(
                &split,
                &data.advances(),
                &charges,
                data.exchange_rate,
                decimals,
            )?;
            let coverage = coverage(
                &data.financing_rules_a,
                &data.financing_rules_b,
                financeable.party_a_ars,
                financeable.party_b,
                financeable.currency_b,
                data.exchange_rate,
            )?;
            (financeable, Some(coverage))
        } else {
            (
                FinanceableTotals {
                    party_a_ars: Decimal::ZERO,
                    party_b: Decimal::ZERO,
                    currency_b: split.currency_b,
                },
                None,
            )
        };

        let installments_a = rule_installments(&data.financing_rules_a);
        let installments_b = rule_installments(&data.financing_rules_b);

        tracing::debug!(
            %total_usd,
            total_charges_ars = %charges.total_ars,
            total_charges_usd = %charges.total_usd,
            financeable_a = %financeable.party_a_ars,
            financeable_b = %financeable.party_b,
            "evaluated wizard snapshot"
        );

        Ok(Pricing {
            unit_prices,
            total_usd,
            split,
            charges,
            financeable,
            coverage,
            installments_a,
            installments_b,
        })
    }

    /// Operation total in USD, with every unit priced from its list price and discount.
    pub fn evaluate_total(&self, data: &WizardData) -> Result<Decimal, PricingError> {
        Ok(operation_total(data, &unit_prices(data)?))
    }

    /// Evaluates `data` and writes every derived field back into it.
    ///
    /// On error `data` is left untouched.
    pub fn recompute(&self, data: &mut WizardData) -> Result<Pricing, PricingError> {
        let pricing = self.evaluate(data)?;
        apply(&pricing, data);
        Ok(pricing)
    }

    /// Checks that the active financing rules cover both financeable balances.
    /// Cash sales have nothing to cover.
    pub fn validate_financing(&self, data: &WizardData) -> Result<(), PricingError> {
        let pricing = self.evaluate(data)?;
        match pricing.coverage {
            Some(coverage) => coverage.ensure_covered(self.config.tolerance),
            None => Ok(()),
        }
    }
}

fn unit_prices(data: &WizardData) -> Result<Vec<Decimal>, PricingError> {
    data.units
        .iter()
        .map(|unit| unit.compute_negotiated_price())
        .collect()
}

fn operation_total(data: &WizardData, unit_prices: &[Decimal]) -> Decimal {
    if unit_prices.is_empty() {
        total_price(&[], data.legacy_price, &data.garages, data.storage.as_ref())
    } else {
        unit_prices.iter().copied().sum()
    }
}

/// Installment amount per rule; rules without installments show zero until corrected.
fn rule_installments(rules: &[FinancingRule]) -> Vec<Decimal> {
    rules
        .iter()
        .map(|rule| match installment_amount(rule) {
            Ok(amount) => amount,
            Err(err) => {
                tracing::debug!(rule_id = %rule.id, error = %err, "installment amount unavailable");
                Decimal::ZERO
            }
        })
        .collect()
}

fn apply(pricing: &Pricing, data: &mut WizardData) {
    for (unit, price) in data.units.iter_mut().zip(&pricing.unit_prices) {
        unit.negotiated_price = *price;
    }

    data.total_price = pricing.total_usd;
    if data.split_mode == SplitMode::Amount {
        data.percentage_a = pricing.split.percentage_a;
    }
    data.percentage_b = pricing.split.percentage_b;
    data.amount_a_usd = pricing.split.amount_a_usd;
    data.amount_b_usd = pricing.split.amount_b_usd;

    data.stamp_amount = pricing.charges.amount(Charge::Stamp);
    data.furnishing_amount = pricing.charges.amount(Charge::Furnishing);
    data.unit_blueprints_amount = pricing.charges.amount(Charge::UnitBlueprints);
    data.garage_blueprints_amount = pricing.charges.amount(Charge::GarageBlueprints);
    data.total_charges_ars = pricing.charges.total_ars;
    data.total_charges_usd = pricing.charges.total_usd;

    data.total_financed_ars = pricing.financeable.party_a_ars;
    data.total_financed_usd = pricing.financeable.party_b;

    for (rule, amount) in data.financing_rules_a.iter_mut().zip(&pricing.installments_a) {
        rule.installment_amount = *amount;
    }
    for (rule, amount) in data.financing_rules_b.iter_mut().zip(&pricing.installments_b) {
        rule.installment_amount = *amount;
    }
}
