//! Property-based tests for the costing engine and the stage machine.
//!
//! These use proptest to verify invariants across a wide range of inputs,
//! catching edge cases the unit tests might miss.

use bagforge_api::costing::{
    derive_consumption, derive_costs, job_card_status, reconcile, scale_consumption, stage_gate,
    Consumption, Dimensions, FixedCharges, Formula, GatePolicy, JobStatus, PricingEdit,
    CONSUMPTION_DP, INCHES_PER_METER, MONEY_DP,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Dimensions in inches, 0.1 .. 1000.0 with one decimal place.
fn dim_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000).prop_map(|v| Decimal::new(v, 1))
}

// Money values, 0.01 .. 1000.00 with two decimal places.
fn money_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000).prop_map(|v| Decimal::new(v, 2))
}

fn status_strategy() -> impl Strategy<Value = JobStatus> {
    prop_oneof![
        Just(JobStatus::Pending),
        Just(JobStatus::InProgress),
        Just(JobStatus::Completed),
    ]
}

proptest! {
    #[test]
    fn standard_consumption_matches_reference_formula(
        length in dim_strategy(),
        width in dim_strategy(),
        roll_width in dim_strategy(),
    ) {
        let dims = Dimensions::new(Some(length), Some(width), Some(roll_width));
        let got = derive_consumption(Formula::Standard, &dims)
            .expect("positive inputs always derive");
        let expected = ((length * width) / (roll_width * INCHES_PER_METER))
            .round_dp(CONSUMPTION_DP);
        prop_assert_eq!(got, expected);
        prop_assert!(got >= Decimal::ZERO);
        prop_assert!(got.scale() <= CONSUMPTION_DP);
    }

    #[test]
    fn standard_consumption_is_monotonic_in_length(
        short in dim_strategy(),
        extra in dim_strategy(),
        width in dim_strategy(),
        roll_width in dim_strategy(),
    ) {
        let long = short + extra;
        let a = derive_consumption(
            Formula::Standard,
            &Dimensions::new(Some(short), Some(width), Some(roll_width)),
        )
        .unwrap();
        let b = derive_consumption(
            Formula::Standard,
            &Dimensions::new(Some(long), Some(width), Some(roll_width)),
        )
        .unwrap();
        prop_assert!(a <= b, "longer bag consumed less: {} > {}", a, b);
    }

    #[test]
    fn linear_consumption_ignores_width_and_roll(
        length in dim_strategy(),
        width in dim_strategy(),
        roll_width in dim_strategy(),
    ) {
        let with_all = derive_consumption(
            Formula::Linear,
            &Dimensions::new(Some(length), Some(width), Some(roll_width)),
        );
        let length_only =
            derive_consumption(Formula::Linear, &Dimensions::new(Some(length), None, None));
        prop_assert_eq!(with_all, length_only);
    }

    #[test]
    fn manual_consumption_survives_any_dimensions(
        value in money_strategy(),
        length in dim_strategy(),
        width in dim_strategy(),
        roll_width in dim_strategy(),
    ) {
        let manual = Consumption::Manual(value);
        let dims = Dimensions::new(Some(length), Some(width), Some(roll_width));
        prop_assert_eq!(manual.resolve(&dims), Some(value));
    }

    #[test]
    fn scaling_multiplies_and_rounds(
        unit in money_strategy(),
        quantity in 1i32..=100_000,
    ) {
        let scaled = scale_consumption(unit, quantity);
        let expected = (unit * Decimal::from(quantity)).round_dp(CONSUMPTION_DP);
        prop_assert_eq!(scaled, expected);
        // Scaling by one is the identity (inputs already fit the precision).
        prop_assert_eq!(scale_consumption(unit, 1), unit);
    }

    #[test]
    fn total_cost_is_charges_plus_material(
        cutting in money_strategy(),
        printing in money_strategy(),
        stitching in money_strategy(),
        transport in money_strategy(),
        costs in proptest::collection::vec(money_strategy(), 0..6),
    ) {
        let charges = FixedCharges { cutting, printing, stitching, transport };
        let breakdown = derive_costs(&charges, costs.clone());
        let material: Decimal = costs.iter().copied().sum();
        prop_assert_eq!(breakdown.material_cost, material.round_dp(MONEY_DP));
        prop_assert_eq!(
            breakdown.total_cost,
            (cutting + printing + stitching + transport + breakdown.material_cost)
                .round_dp(MONEY_DP)
        );
    }

    // Editing the rate, then feeding the derived margin back, reproduces the
    // rate up to the two rounding steps involved.
    #[test]
    fn pricing_round_trips_within_rounding(
        total_cost in money_strategy(),
        rate in money_strategy(),
    ) {
        let first = reconcile(total_cost, PricingEdit::SellingRate(rate));
        let margin = first.margin.expect("non-zero cost has a margin");
        let second = reconcile(total_cost, PricingEdit::Margin(margin));

        // Margin was rounded to 2dp, so the recovered rate may drift by up to
        // cost * 0.005% plus its own rounding step.
        let tolerance = total_cost * dec!(0.00005) + dec!(0.01);
        let drift = (second.selling_rate - rate).abs();
        prop_assert!(
            drift <= tolerance,
            "rate {} round-tripped to {} (drift {} > tolerance {})",
            rate,
            second.selling_rate,
            drift,
            tolerance
        );
    }

    #[test]
    fn supplying_both_pricing_fields_is_always_rejected(
        rate in money_strategy(),
        margin in money_strategy(),
    ) {
        prop_assert!(PricingEdit::from_options(Some(rate), Some(margin)).is_err());
    }

    #[test]
    fn all_completed_gate_requires_nonempty_all_done(
        statuses in proptest::collection::vec(status_strategy(), 0..8),
    ) {
        let open = stage_gate(GatePolicy::AllCompleted, &statuses);
        let expected =
            !statuses.is_empty() && statuses.iter().all(|s| *s == JobStatus::Completed);
        prop_assert_eq!(open, expected);
    }

    #[test]
    fn any_started_gate_requires_one_started(
        statuses in proptest::collection::vec(status_strategy(), 0..8),
    ) {
        let open = stage_gate(GatePolicy::AnyStarted, &statuses);
        let expected = statuses.iter().any(|s| s.started());
        prop_assert_eq!(open, expected);
    }

    #[test]
    fn card_status_derivation_is_consistent(
        statuses in proptest::collection::vec(status_strategy(), 0..8),
    ) {
        let derived = job_card_status(&statuses);
        if !statuses.is_empty() && statuses.iter().all(|s| *s == JobStatus::Completed) {
            prop_assert_eq!(derived, JobStatus::Completed);
        } else if statuses.iter().any(|s| s.started()) {
            prop_assert_eq!(derived, JobStatus::InProgress);
        } else {
            prop_assert_eq!(derived, JobStatus::Pending);
        }
    }
}
