//! Property-based tests for risk classification and form validation
//!
//! Tier boundaries, widget ranges, and record derivation.

use labdelay::{
    form::{
        batch_options, FormError, RawValue, DAYS_SINCE_START, HOUR_OF_DAY, LAB_OCCUPANCY,
        SCIENTIST_WORKLOAD,
    },
    risk::{RiskAssessment, LOW_RISK_LIMIT, MODERATE_RISK_LIMIT},
    FeatureRecord, FormInput, FormSubmission, RiskTier, SchemaVersion,
};
use proptest::prelude::*;

// ============================================================================
// Risk tiers
// ============================================================================

#[test]
fn test_boundaries_belong_to_upper_tier() {
    assert_eq!(RiskTier::classify(LOW_RISK_LIMIT), RiskTier::Moderate);
    assert_eq!(RiskTier::classify(MODERATE_RISK_LIMIT), RiskTier::High);
    assert_eq!(RiskTier::classify(14.999), RiskTier::Low);
    assert_eq!(RiskTier::classify(44.999), RiskTier::Moderate);
}

#[test]
fn test_nan_is_high() {
    assert_eq!(RiskTier::classify(f64::NAN), RiskTier::High);
    assert_eq!(RiskTier::classify(f64::INFINITY), RiskTier::High);
    assert_eq!(RiskTier::classify(f64::NEG_INFINITY), RiskTier::Low);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_below_low_limit_is_low(delay in -1000.0f64..LOW_RISK_LIMIT) {
        prop_assert_eq!(RiskTier::classify(delay), RiskTier::Low);
    }

    #[test]
    fn prop_moderate_band(delay in LOW_RISK_LIMIT..MODERATE_RISK_LIMIT) {
        prop_assert_eq!(RiskTier::classify(delay), RiskTier::Moderate);
    }

    #[test]
    fn prop_at_or_above_moderate_limit_is_high(delay in MODERATE_RISK_LIMIT..10_000.0f64) {
        prop_assert_eq!(RiskTier::classify(delay), RiskTier::High);
    }

    #[test]
    fn prop_classification_is_monotonic(a in -100.0f64..200.0, b in -100.0f64..200.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(RiskTier::classify(lo) <= RiskTier::classify(hi));
    }

    #[test]
    fn prop_card_shows_one_decimal(delay in 0.0f64..500.0) {
        let card = RiskAssessment::new(delay);
        let text = card.delay_text();
        prop_assert!(text.starts_with("Expected Delay: "));
        prop_assert!(text.ends_with(" minutes"));
        let number = text
            .trim_start_matches("Expected Delay: ")
            .trim_end_matches(" minutes");
        prop_assert_eq!(number.split('.').nth(1).map(str::len), Some(1));
        prop_assert_eq!(card.label, card.tier.label());
    }
}

// ============================================================================
// Widget ranges
// ============================================================================

fn int(n: u32) -> Option<RawValue> {
    Some(RawValue::Number(f64::from(n)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_in_range_integers_are_accepted(
        occupancy in LAB_OCCUPANCY.min..=LAB_OCCUPANCY.max,
        workload in SCIENTIST_WORKLOAD.min..=SCIENTIST_WORKLOAD.max,
        hour in HOUR_OF_DAY.min..=HOUR_OF_DAY.max,
        days in DAYS_SINCE_START.min..=DAYS_SINCE_START.max,
    ) {
        let input = FormInput::from_submission(&FormSubmission {
            lab_occupancy: int(occupancy),
            scientist_workload: int(workload),
            hour_of_day: int(hour),
            days_since_start: int(days),
            ..FormSubmission::default()
        })
        .unwrap();
        prop_assert_eq!(input.lab_occupancy(), occupancy);
        prop_assert_eq!(input.hour_of_day(), hour);
        prop_assert_eq!(input.stress_index(), f64::from(workload * occupancy));
    }

    #[test]
    fn prop_occupancy_above_range_is_rejected(occupancy in 101u32..10_000) {
        let err = FormInput::from_submission(&FormSubmission {
            lab_occupancy: int(occupancy),
            ..FormSubmission::default()
        })
        .unwrap_err();
        let is_out_of_range = matches!(err, FormError::OutOfRange { field: "lab_occupancy", .. });
        prop_assert!(is_out_of_range);
    }

    #[test]
    fn prop_days_above_range_is_rejected(days in 731u32..100_000) {
        let result = FormInput::from_submission(&FormSubmission {
            days_since_start: Some(RawValue::Text(days.to_string())),
            ..FormSubmission::default()
        });
        prop_assert!(result.is_err());
    }

    #[test]
    fn prop_temperature_range(temp in 18.0f64..=30.0, outside in 30.01f64..100.0) {
        let ok = FormInput::from_submission(&FormSubmission {
            mean_ambient_temp: Some(RawValue::Number(temp)),
            ..FormSubmission::default()
        });
        prop_assert!(ok.is_ok());

        let err = FormInput::from_submission(&FormSubmission {
            mean_ambient_temp: Some(RawValue::Number(outside)),
            ..FormSubmission::default()
        });
        prop_assert!(err.is_err());
    }

    #[test]
    fn prop_only_listed_batches_are_accepted(index in 0usize..12, suffix in "[0-9]{4}") {
        let options = batch_options();
        let listed = &options[index % options.len()];
        let input = FormInput::from_submission(&FormSubmission {
            reagent_batch_id: Some(RawValue::Text(listed.clone())),
            ..FormSubmission::default()
        })
        .unwrap();
        prop_assert_eq!(input.reagent_batch_id().as_str(), listed.as_str());

        let unlisted = FormInput::from_submission(&FormSubmission {
            reagent_batch_id: Some(RawValue::Text(format!("BATCH_{suffix}"))),
            ..FormSubmission::default()
        });
        prop_assert!(unlisted.is_err());
    }

    #[test]
    fn prop_records_carry_every_schema_column(
        occupancy in LAB_OCCUPANCY.min..=LAB_OCCUPANCY.max,
        workload in SCIENTIST_WORKLOAD.min..=SCIENTIST_WORKLOAD.max,
    ) {
        let input = FormInput::from_submission(&FormSubmission {
            lab_occupancy: int(occupancy),
            scientist_workload: int(workload),
            ..FormSubmission::default()
        })
        .unwrap();
        for schema in SchemaVersion::ALL {
            let record = FeatureRecord::from_input(&input, schema);
            prop_assert_eq!(record.version(), schema);
            prop_assert!(record.validate_columns(&schema.column_names()).is_ok());
        }
    }
}

#[test]
fn test_batch_options_are_unique_and_sorted() {
    let options = batch_options();
    let mut sorted = options.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(options, sorted);
    assert_eq!(options.len(), 12);
    assert!(options.iter().any(|b| b == "BATCH_392"));
}
