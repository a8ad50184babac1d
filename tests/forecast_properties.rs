use battery_passport::clock::FixedClock;
use battery_passport::domain::{BatteryChemistry, SohObservation};
use battery_passport::forecast::{years_to_threshold, DegradationForecaster, PredictionInput};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
}

fn forecaster(capacity: f64) -> DegradationForecaster<FixedClock> {
    DegradationForecaster::with_clock(BatteryChemistry::Nmc, capacity, FixedClock(now())).unwrap()
}

prop_compose! {
    fn arb_observation()(
        days_ago in 0i64..2000,
        soh in 60.0f64..100.0,
    ) -> SohObservation {
        SohObservation {
            date: now() - Duration::days(days_ago),
            soh_percent: soh,
            mileage_km: None,
        }
    }
}

prop_compose! {
    fn arb_input()(
        soh in 40.0f64..100.0,
        age in 0.0f64..15.0,
        mileage in proptest::option::of(1_000u32..60_000),
        fast_ratio in 0.0f64..1.0,
        history in proptest::option::of(proptest::collection::vec(arb_observation(), 0..12)),
    ) -> PredictionInput {
        PredictionInput {
            current_soh: soh,
            age_years: age,
            history,
            annual_mileage_km: mileage,
            fast_charge_ratio: fast_ratio,
        }
    }
}

proptest! {
    #[test]
    fn projections_decline_monotonically_and_stay_in_range(input in arb_input()) {
        let prediction = forecaster(60.0).predict(&input);

        let steps = [
            prediction.current_soh,
            prediction.predicted_soh_1year,
            prediction.predicted_soh_2year,
            prediction.predicted_soh_3year,
            prediction.predicted_soh_5year,
        ];
        for pair in steps.windows(2) {
            prop_assert!(pair[1] <= pair[0]);
        }
        for soh in steps {
            prop_assert!((0.0..=100.0).contains(&soh));
        }
    }

    #[test]
    fn annual_rate_is_positive_and_confidence_bounded(input in arb_input()) {
        let prediction = forecaster(60.0).predict(&input);

        prop_assert!(prediction.annual_degradation_rate > 0.0);
        prop_assert!((0.0..=1.0).contains(&prediction.confidence));
    }

    #[test]
    fn at_or_below_threshold_means_zero_years(
        threshold in 50.0f64..90.0,
        below in 0.0f64..30.0,
        rate in 0.1f64..6.0,
    ) {
        prop_assert_eq!(years_to_threshold(threshold - below, threshold, rate), Some(0.0));
    }

    #[test]
    fn threshold_years_shrink_with_faster_decline(
        soh in 85.0f64..100.0,
        slow_rate in 0.5f64..2.0,
        extra in 0.5f64..3.0,
    ) {
        let slow = years_to_threshold(soh, 80.0, slow_rate);
        let fast = years_to_threshold(soh, 80.0, slow_rate + extra);

        match (slow, fast) {
            (Some(s), Some(f)) => prop_assert!(f <= s),
            _ => prop_assert!(false, "both rates are positive, years must exist"),
        }
    }

    #[test]
    fn projection_curve_is_monotone_and_anchored(
        soh in 40.0f64..100.0,
        years in 1u32..30,
    ) {
        let curve = forecaster(60.0).projection_curve(soh, years);

        prop_assert_eq!(curve.len(), years as usize + 1);
        prop_assert_eq!(curve[0].year, 2026);
        for pair in curve.windows(2) {
            prop_assert_eq!(pair[1].year, pair[0].year + 1);
            prop_assert!(pair[1].soh_percent <= pair[0].soh_percent);
            prop_assert!(pair[1].soh_percent >= 0.0);
        }
    }

    #[test]
    fn remaining_value_scales_with_capacity_and_soh(
        soh in 40.0f64..100.0,
        capacity in 20.0f64..120.0,
    ) {
        let prediction = forecaster(capacity).predict(&PredictionInput::new(soh, 3.0));

        let expected = (capacity * soh / 100.0 * 150.0).round();
        prop_assert_eq!(prediction.estimated_remaining_value_chf, expected);
    }
}
