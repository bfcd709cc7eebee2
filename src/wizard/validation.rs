use rust_decimal::Decimal;

use super::WizardData;
use super::flow::{WizardStep, visible_steps};
use crate::currency::ExchangeRate;
use crate::engine::PricingEngine;
use crate::error::{PricingError, ensure_non_negative};

/// Checks the fields owned by `step` before the wizard may leave it.
///
/// Errors are user-facing and name the field to correct.
pub fn validate_step(
    step: WizardStep,
    data: &WizardData,
    engine: &PricingEngine,
) -> Result<(), PricingError> {
    let result = match step {
        WizardStep::Project => validate_project(data),
        WizardStep::Units => validate_units(data),
        WizardStep::Commercial => validate_commercial(data),
        WizardStep::Composition => validate_composition(data, engine),
        WizardStep::Iva => ExchangeRate::new(data.exchange_rate).map(|_| ()),
        WizardStep::Payment => validate_payment(data),
        WizardStep::Charges => engine.evaluate(data).map(|_| ()),
        WizardStep::FinancingRules => validate_financing_rules(data, engine),
        WizardStep::Summary => validate_all(data, engine),
    };

    if let Err(err) = &result {
        tracing::warn!(%step, error = %err, "wizard step blocked");
    }
    result
}

fn validate_project(data: &WizardData) -> Result<(), PricingError> {
    if data.project.trim().is_empty() {
        return Err(PricingError::MissingSelection("proyecto"));
    }
    Ok(())
}

fn validate_units(data: &WizardData) -> Result<(), PricingError> {
    if data.units.is_empty() && data.legacy_price <= Decimal::ZERO {
        return Err(PricingError::MissingSelection("unidades"));
    }
    Ok(())
}

fn validate_commercial(data: &WizardData) -> Result<(), PricingError> {
    for unit in &data.units {
        unit.compute_negotiated_price()?;
    }
    ensure_non_negative("precioNegociado", data.legacy_price)?;
    for garage in &data.garages {
        ensure_non_negative("cocheras.precioNegociado", garage.negotiated_price)?;
    }
    if let Some(storage) = &data.storage {
        ensure_non_negative("baulera.precioNegociado", storage.negotiated_price)?;
    }
    Ok(())
}

fn validate_composition(data: &WizardData, engine: &PricingEngine) -> Result<(), PricingError> {
    if data.uses_pesos() {
        ExchangeRate::new(data.exchange_rate)?;
    }
    let total = engine.evaluate_total(data)?;
    crate::composition::split_total(&data.split_input(total), engine.config().decimals)?;
    Ok(())
}

fn validate_payment(data: &WizardData) -> Result<(), PricingError> {
    ExchangeRate::new(data.exchange_rate)?;
    let advances = [
        ("anticipoArsA", data.advance_ars_a),
        ("anticipoArsB", data.advance_ars_b),
        ("anticipoUsdA", data.advance_usd_a),
        ("anticipoUsdB", data.advance_usd_b),
    ];
    for (field, value) in advances {
        ensure_non_negative(field, value)?;
    }
    if data.possession_date.is_none() {
        return Err(PricingError::MissingSelection("fechaPosesion"));
    }
    Ok(())
}

fn validate_financing_rules(data: &WizardData, engine: &PricingEngine) -> Result<(), PricingError> {
    let rules = data.financing_rules_a.iter().chain(&data.financing_rules_b);
    for rule in rules.filter(|rule| rule.active) {
        rule.validate()?;
    }
    engine.validate_financing(data)
}

fn validate_all(data: &WizardData, engine: &PricingEngine) -> Result<(), PricingError> {
    visible_steps(data)
        .into_iter()
        .filter(|step| *step != WizardStep::Summary)
        .try_for_each(|step| validate_step(step, data, engine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::SplitMode;
    use crate::currency::Currency;
    use crate::financing::FinancingRule;
    use crate::units::{DiscountKind, SelectedUnit};
    use crate::wizard::PaymentMode;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn complete() -> WizardData {
        WizardData {
            project: "Torre Norte".into(),
            units: vec![SelectedUnit {
                id: "3B".into(),
                kind: "Departamento".into(),
                list_price: dec!(100000),
                ..Default::default()
            }],
            split_mode: SplitMode::Percentage,
            percentage_a: dec!(40),
            currency_a: Currency::Ars,
            currency_b: Currency::Usd,
            exchange_rate: dec!(1000),
            payment_mode: PaymentMode::Financed,
            possession_date: NaiveDate::from_ymd_opt(2027, 3, 1),
            financing_rules_a: vec![FinancingRule::new("a1", Currency::Ars, dec!(40000000), 20)],
            financing_rules_b: vec![FinancingRule::new("b1", Currency::Usd, dec!(60000), 36)],
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_data_passes_every_step() {
        let engine = PricingEngine::default();
        let data = complete();
        for step in visible_steps(&data) {
            assert_eq!(validate_step(step, &data, &engine), Ok(()), "step {step}");
        }
    }

    #[test]
    fn test_missing_units() {
        let mut data = complete();
        data.units.clear();
        assert_eq!(
            validate_step(WizardStep::Units, &data, &PricingEngine::default()),
            Err(PricingError::MissingSelection("unidades"))
        );
    }

    #[test]
    fn test_discount_out_of_range_blocks_commercial_step() {
        let mut data = complete();
        data.units[0].discount_kind = DiscountKind::Percentage;
        data.units[0].discount_value = dec!(150);
        assert!(validate_step(WizardStep::Commercial, &data, &PricingEngine::default()).is_err());
    }

    #[test]
    fn test_payment_requires_rate_and_possession_date() {
        let engine = PricingEngine::default();
        let mut data = complete();
        data.possession_date = None;
        assert_eq!(
            validate_step(WizardStep::Payment, &data, &engine),
            Err(PricingError::MissingSelection("fechaPosesion"))
        );

        data.exchange_rate = Decimal::ZERO;
        assert_eq!(
            validate_step(WizardStep::Payment, &data, &engine),
            Err(PricingError::InvalidExchangeRate(Decimal::ZERO))
        );
    }

    #[test]
    fn test_composition_in_dollars_needs_no_rate() {
        let mut data = complete();
        data.currency_a = Currency::Usd;
        data.exchange_rate = Decimal::ZERO;
        assert!(validate_step(WizardStep::Composition, &data, &PricingEngine::default()).is_ok());
    }

    #[test]
    fn test_active_rule_without_installments_is_rejected() {
        let mut data = complete();
        data.financing_rules_b[0].installments = 0;
        assert!(matches!(
            validate_step(WizardStep::FinancingRules, &data, &PricingEngine::default()),
            Err(PricingError::InvalidInstallments { .. })
        ));
    }

    #[test]
    fn test_summary_reports_uncovered_party_b() {
        let mut data = complete();
        data.financing_rules_b[0].balance = dec!(50000);
        assert!(matches!(
            validate_step(WizardStep::Summary, &data, &PricingEngine::default()),
            Err(PricingError::UncoveredBalance { missing, .. }) if missing == dec!(10000)
        ));
    }
}
