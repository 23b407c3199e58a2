//! Hand-parameterized demo models
//!
//! No trained model ships with the repository. These artifacts encode the
//! heuristics the page's insight panel describes so the whole prediction
//! path can be exercised end to end:
//!
//! - stress index (workload × occupancy) above 500 and above 1000
//! - machine aging past 600 days
//! - the known bad reagent batch
//!
//! Values are illustrative, not fitted.

use crate::{
    artifact::{ArtifactError, ModelArtifact, ModelMetadata},
    form::{batch_options, ExperienceLevel, ExperimentType, InstrumentType, BAD_BATCH},
    model::{CategoricalColumn, NumericColumn, Pipeline, Preprocessor, Regressor, RegressionTreeNode},
    record::{ColumnKind, SchemaVersion},
};

/// Name written into demo metadata
pub const DEMO_MODEL_NAME: &str = "lab-delay-demo";

/// Stress index above which moderate congestion kicks in
pub const STRESS_THRESHOLD: f64 = 500.0;

/// Stress index above which the lab is saturated
pub const SEVERE_STRESS_THRESHOLD: f64 = 1000.0;

/// Instrument age (days) past which drift adds delay
pub const AGING_THRESHOLD_DAYS: f64 = 600.0;

/// Minutes added by the known bad batch
pub const BAD_BATCH_PENALTY: f64 = 45.0;

fn categories<T: ToString>(options: &[T]) -> Vec<String> {
    options.iter().map(ToString::to_string).collect()
}

fn categorical_columns() -> Vec<CategoricalColumn> {
    vec![
        CategoricalColumn {
            name: "experiment_type".to_string(),
            categories: categories(ExperimentType::ALL),
        },
        CategoricalColumn {
            name: "instrument_type".to_string(),
            categories: categories(InstrumentType::ALL),
        },
        CategoricalColumn {
            name: "scientist_experience_level".to_string(),
            categories: categories(ExperienceLevel::ALL),
        },
        CategoricalColumn {
            name: "reagent_batch_id".to_string(),
            categories: batch_options(),
        },
    ]
}

fn numeric_columns(schema: SchemaVersion) -> Vec<NumericColumn> {
    schema
        .columns()
        .iter()
        .filter(|c| c.kind == ColumnKind::Numeric)
        .map(|c| NumericColumn::passthrough(c.name))
        .collect()
}

fn feature_names(schema: SchemaVersion) -> Vec<String> {
    schema
        .column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

// Split on a one-hot column: present → `hit`, absent → 0
fn one_hot_stump(index: Option<usize>, hit: f64) -> Option<RegressionTreeNode> {
    index.map(|i| {
        RegressionTreeNode::split(i, 0.5, RegressionTreeNode::leaf(0.0), RegressionTreeNode::leaf(hit))
    })
}

/// Gradient-boosted demo model over the canonical schema
///
/// # Errors
///
/// Only if the hand-built pipeline fails artifact validation.
pub fn demo_v2() -> Result<ModelArtifact, ArtifactError> {
    let preprocessor = Preprocessor {
        numeric: numeric_columns(SchemaVersion::V2),
        categorical: categorical_columns(),
    };
    let idx = |column: &str| preprocessor.numeric_index(column);
    let stress = idx("stress_index").unwrap_or_default();
    let days = idx("days_since_start").unwrap_or_default();
    let hour = idx("hour_of_day").unwrap_or_default();

    let mut trees = vec![
        RegressionTreeNode::split(
            stress,
            STRESS_THRESHOLD,
            RegressionTreeNode::leaf(0.0),
            RegressionTreeNode::split(
                stress,
                SEVERE_STRESS_THRESHOLD,
                RegressionTreeNode::leaf(15.0),
                RegressionTreeNode::leaf(35.0),
            ),
        ),
        RegressionTreeNode::split(
            days,
            AGING_THRESHOLD_DAYS,
            RegressionTreeNode::leaf(0.0),
            RegressionTreeNode::leaf(12.0),
        ),
        // late bookings queue behind the day shift
        RegressionTreeNode::split(
            hour,
            16.0,
            RegressionTreeNode::leaf(0.0),
            RegressionTreeNode::leaf(5.0),
        ),
    ];
    trees.extend(one_hot_stump(
        preprocessor.one_hot_index("reagent_batch_id", BAD_BATCH),
        BAD_BATCH_PENALTY,
    ));
    trees.extend(one_hot_stump(
        preprocessor.one_hot_index("scientist_experience_level", ExperienceLevel::Senior.as_str()),
        -3.0,
    ));

    ModelArtifact::new(
        ModelMetadata {
            name: DEMO_MODEL_NAME.to_string(),
            version: "2".to_string(),
            feature_names: feature_names(SchemaVersion::V2),
            description: Some("Demo gradient boosting stumps: stress, aging, bad batch".to_string()),
        },
        SchemaVersion::V2,
        Pipeline {
            preprocessor,
            regressor: Regressor::GradientBoosting {
                init: 8.0,
                learning_rate: 1.0,
                trees,
            },
        },
    )
}

/// Linear demo model over the legacy schema
///
/// # Errors
///
/// Only if the hand-built pipeline fails artifact validation.
pub fn demo_v1() -> Result<ModelArtifact, ArtifactError> {
    let preprocessor = Preprocessor {
        numeric: numeric_columns(SchemaVersion::V1),
        categorical: categorical_columns(),
    };
    let mut coefficients = vec![0.0; preprocessor.output_width()];
    for (column, weight) in [
        ("scientist_workload", 1.0),
        ("lab_occupancy_level", 0.05),
        ("expected_duration", 0.02),
        ("days_since_start", 0.01),
    ] {
        if let Some(i) = preprocessor.numeric_index(column) {
            coefficients[i] = weight;
        }
    }
    if let Some(i) = preprocessor.one_hot_index("reagent_batch_id", BAD_BATCH) {
        coefficients[i] = BAD_BATCH_PENALTY;
    }

    ModelArtifact::new(
        ModelMetadata {
            name: DEMO_MODEL_NAME.to_string(),
            version: "1".to_string(),
            feature_names: feature_names(SchemaVersion::V1),
            description: Some("Demo linear model over the legacy columns".to_string()),
        },
        SchemaVersion::V1,
        Pipeline {
            preprocessor,
            regressor: Regressor::LinearRegression {
                intercept: 2.0,
                coefficients,
            },
        },
    )
}

/// Demo artifact for `schema`
///
/// # Errors
///
/// Only if the hand-built pipeline fails artifact validation.
pub fn demo_artifact(schema: SchemaVersion) -> Result<ModelArtifact, ArtifactError> {
    match schema {
        SchemaVersion::V1 => demo_v1(),
        SchemaVersion::V2 => demo_v2(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        form::{FormInput, FormSubmission, RawValue},
        model::ModelKind,
        record::FeatureRecord,
    };

    fn predict(schema: SchemaVersion, submission: &FormSubmission) -> f64 {
        let artifact = demo_artifact(schema).unwrap();
        let input = FormInput::from_submission(submission).unwrap();
        artifact
            .predict(&FeatureRecord::from_input(&input, schema))
            .unwrap()
    }

    fn with_batch(batch: &str) -> FormSubmission {
        FormSubmission {
            reagent_batch_id: Some(RawValue::Text(batch.to_string())),
            ..FormSubmission::default()
        }
    }

    #[test]
    fn test_demo_artifacts_validate() {
        for schema in SchemaVersion::ALL {
            let artifact = demo_artifact(schema).unwrap();
            assert_eq!(artifact.schema, schema);
            artifact.validate().unwrap();
        }
        assert_eq!(demo_v2().unwrap().kind(), ModelKind::GradientBoosting);
        assert_eq!(demo_v1().unwrap().kind(), ModelKind::LinearRegression);
    }

    #[test]
    fn test_defaults_are_low_risk() {
        assert_eq!(predict(SchemaVersion::V2, &FormSubmission::default()), 8.0);
        assert!(predict(SchemaVersion::V1, &FormSubmission::default()) < 15.0);
    }

    #[test]
    fn test_bad_batch_raises_delay() {
        for schema in SchemaVersion::ALL {
            let good = predict(schema, &with_batch("BATCH_001"));
            let bad = predict(schema, &with_batch(BAD_BATCH));
            assert!(bad - good >= 40.0, "{schema}: {good} -> {bad}");
        }
    }

    #[test]
    fn test_stress_and_aging_add_delay() {
        let busy = FormSubmission {
            scientist_workload: Some(RawValue::Number(15.0)),
            lab_occupancy: Some(RawValue::Number(90.0)),
            days_since_start: Some(RawValue::Number(700.0)),
            ..FormSubmission::default()
        };
        // 8 + 35 (stress 1350) + 12 (aging)
        assert_eq!(predict(SchemaVersion::V2, &busy), 55.0);
    }

    #[test]
    fn test_survives_byte_round_trip() {
        let artifact = demo_v2().unwrap();
        let decoded = ModelArtifact::from_bytes(&artifact.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, artifact);
    }
}
