//! Property-based tests for the pricing pipeline.

use minuta_pricing::{
    Currency, FinancingRule, GarageData, PaymentMode, PaymentMoment, PricingEngine, SelectedUnit,
    SplitMode, StorageData, WizardData,
    composition::{SplitInput, split_total},
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

/// Amount with two decimals between 0 and `max_units`.
fn arb_amount(max_units: i64) -> impl Strategy<Value = Decimal> {
    (0..=max_units * 100).prop_map(|cents| Decimal::new(cents, 2))
}

/// Percentage with up to three decimals in `[0, 100]`.
fn arb_percentage() -> impl Strategy<Value = Decimal> {
    (0i64..=100_000).prop_map(|thousandths| Decimal::new(thousandths, 3))
}

fn arb_currency() -> impl Strategy<Value = Currency> {
    prop_oneof![Just(Currency::Ars), Just(Currency::Usd)]
}

fn arb_moment() -> impl Strategy<Value = PaymentMoment> {
    proptest::sample::select(PaymentMoment::ALL.to_vec())
}

fn arb_split_mode() -> impl Strategy<Value = SplitMode> {
    prop_oneof![Just(SplitMode::Percentage), Just(SplitMode::Amount)]
}

fn unit(index: usize, price: Decimal) -> SelectedUnit {
    SelectedUnit {
        id: format!("U{index}"),
        kind: "Departamento".into(),
        list_price: price,
        ..Default::default()
    }
}

/// Pieces of a sale: either selected units or the legacy price with garages and
/// a storage room. The last field is the operation total they add up to.
type Sale = (Vec<SelectedUnit>, Decimal, Vec<GarageData>, Option<StorageData>, Decimal);

fn arb_sale() -> impl Strategy<Value = Sale> {
    let by_units = proptest::collection::vec(arb_amount(500_000), 1..4).prop_map(|prices| {
        let total: Decimal = prices.iter().copied().sum();
        let units: Vec<SelectedUnit> =
            prices.into_iter().enumerate().map(|(i, price)| unit(i, price)).collect();
        (units, Decimal::ZERO, Vec::<GarageData>::new(), None::<StorageData>, total)
    });

    let legacy = (
        arb_amount(500_000),
        proptest::collection::vec(arb_amount(30_000), 0..3),
        proptest::option::of(arb_amount(10_000)),
    )
        .prop_map(|(legacy_price, garage_prices, storage_price)| {
            let total = legacy_price
                + garage_prices.iter().copied().sum::<Decimal>()
                + storage_price.unwrap_or_default();
            let garages: Vec<GarageData> = garage_prices
                .into_iter()
                .map(|price| GarageData {
                    list_price: price,
                    negotiated_price: price,
                    ..Default::default()
                })
                .collect();
            let storage = storage_price.map(|price| StorageData {
                list_price: price,
                negotiated_price: price,
                ..Default::default()
            });
            (Vec::<SelectedUnit>::new(), legacy_price, garages, storage, total)
        });

    prop_oneof![by_units, legacy]
}

fn arb_wizard() -> impl Strategy<Value = WizardData> {
    (
        arb_sale(),
        (arb_split_mode(), arb_percentage(), 0i64..=1_000),
        (arb_currency(), arb_currency(), (1i64..=2_000).prop_map(Decimal::from)),
        (any::<bool>(), any::<bool>()),
        (arb_percentage(), arb_moment(), arb_moment()),
        (arb_amount(5_000_000), arb_amount(50_000)),
        (arb_amount(5_000), arb_amount(5_000), proptest::option::of(0i64..=30)),
    )
        .prop_map(
            |(
                (units, legacy_price, garages, storage, total),
                (split_mode, percentage_a, fraction),
                (currency_a, currency_b, rate),
                (apply_iva, financed),
                (furnishing, stamp_moment, furnishing_moment),
                (advance_ars_a, advance_usd_b),
                (rule_a, rule_b, annual_rate),
            )| {
                // a fixed amount between zero and the total, entered in A's currency
                let fixed_usd = (total * Decimal::new(fraction, 3)).round_dp(2);
                let amount_a = match currency_a {
                    Currency::Ars => fixed_usd * rate,
                    Currency::Usd => fixed_usd,
                };

                let mut financed_a = FinancingRule::new("a1", Currency::Usd, rule_a, 12);
                financed_a.annual_rate = annual_rate.map(Decimal::from);

                WizardData {
                    project: "Torre Norte".into(),
                    units,
                    legacy_price,
                    garages,
                    storage,
                    split_mode,
                    percentage_a,
                    amount_a,
                    currency_a,
                    currency_b,
                    apply_iva,
                    exchange_rate: rate,
                    payment_mode: if financed { PaymentMode::Financed } else { PaymentMode::Cash },
                    advance_ars_a,
                    advance_usd_b,
                    stamp_percentage: Decimal::ONE,
                    stamp_moment,
                    furnishing_percentage: furnishing,
                    furnishing_moment,
                    financing_rules_a: vec![financed_a],
                    financing_rules_b: vec![FinancingRule::new("b1", currency_b, rule_b, 24)],
                    ..Default::default()
                }
            },
        )
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn recompute_is_idempotent(data in arb_wizard()) {
        let engine = PricingEngine::default();
        let mut once = data.clone();
        let first = engine.recompute(&mut once).unwrap();

        let mut twice = once.clone();
        let second = engine.recompute(&mut twice).unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.percentage_a + once.percentage_b, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn percentages_always_add_to_hundred(total in arb_amount(1_000_000), percentage_a in arb_percentage()) {
        let split = split_total(
            &SplitInput {
                total_usd: total,
                mode: SplitMode::Percentage,
                percentage_a,
                amount_a: Decimal::ZERO,
                currency_a: Currency::Usd,
                currency_b: Currency::Usd,
                exchange_rate: Decimal::ONE,
            },
            2,
        )
        .unwrap();

        prop_assert_eq!(split.percentage_a + split.percentage_b, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn shares_conserve_the_total(
        total in arb_amount(1_000_000),
        percentage_a in arb_percentage(),
        fraction in 0i64..=1_000,
        currency_a in arb_currency(),
        rate in (1i64..=2_000).prop_map(Decimal::from),
    ) {
        let tolerance = Decimal::new(1, 2);
        let base = SplitInput {
            total_usd: total,
            mode: SplitMode::Percentage,
            percentage_a,
            amount_a: Decimal::ZERO,
            currency_a,
            currency_b: Currency::Usd,
            exchange_rate: rate,
        };

        let by_percentage = split_total(&base, 2).unwrap();
        prop_assert!((by_percentage.amount_a_usd + by_percentage.amount_b_usd - total).abs() <= tolerance);

        // a fixed amount between zero and the total, entered in A's currency
        let fixed_usd = (total * Decimal::new(fraction, 3)).round_dp(2);
        let amount_a = match currency_a {
            Currency::Ars => fixed_usd * rate,
            Currency::Usd => fixed_usd,
        };
        let by_amount = split_total(&SplitInput { mode: SplitMode::Amount, amount_a, ..base }, 2).unwrap();
        prop_assert!((by_amount.amount_a_usd + by_amount.amount_b_usd - total).abs() <= tolerance);
    }

    #[test]
    fn waived_charges_are_always_zero(data in arb_wizard()) {
        let mut data = data;
        data.stamp_moment = PaymentMoment::Waived;
        data.furnishing_moment = PaymentMoment::Waived;

        let engine = PricingEngine::default();
        engine.recompute(&mut data).unwrap();

        prop_assert_eq!(data.stamp_amount, Decimal::ZERO);
        prop_assert_eq!(data.furnishing_amount, Decimal::ZERO);
    }
}
