//! Feature records: the single-row table handed to the model
//!
//! Two schema versions exist. V2 is canonical; V1 is the legacy layout that
//! uses `mean_ambient_temp` and has no engineered features. Each version is a
//! plain struct built from a [`FormInput`], so the mapping from widgets to
//! model columns is fixed at compile time. [`FeatureRecord::validate_columns`]
//! compares the record against the column list a model declares and fails on
//! any difference instead of dropping or inventing columns.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::FormInput;

/// Schema mismatch between a record and a model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// Column sets differ
    #[error(
        "Feature schema mismatch for {version}: missing columns {missing:?}, unexpected columns {unexpected:?}"
    )]
    SchemaMismatch {
        /// Schema version of the record
        version: SchemaVersion,
        /// Columns the model expects but the record lacks
        missing: Vec<String>,
        /// Columns the record has but the model does not expect
        unexpected: Vec<String>,
    },

    /// Model was built for another schema version
    #[error("Schema version mismatch: model expects {model}, record is {record}")]
    VersionMismatch {
        /// Version declared by the model
        model: SchemaVersion,
        /// Version requested for the record
        record: SchemaVersion,
    },

    /// Unrecognized schema version text
    #[error("Unknown schema version '{0}' (expected v1 or v2)")]
    UnknownVersion(String),
}

/// Record schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Legacy: `mean_ambient_temp`, no hour of day, no stress index
    V1,
    /// Canonical: `ambient_temp`, `hour_of_day`, `stress_index`
    #[default]
    V2,
}

impl SchemaVersion {
    /// Both versions, oldest first
    pub const ALL: [Self; 2] = [Self::V1, Self::V2];

    /// Numeric code stored in artifact headers
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Inverse of [`SchemaVersion::code`]
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }

    /// Column names in model order
    #[must_use]
    pub fn columns(self) -> &'static [ColumnSpec] {
        match self {
            Self::V1 => FeatureRecordV1::COLUMNS,
            Self::V2 => FeatureRecordV2::COLUMNS,
        }
    }

    /// Column names only
    #[must_use]
    pub fn column_names(self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }

    /// Compare this schema's column set with the names a model declares
    ///
    /// # Errors
    ///
    /// Returns `RecordError::SchemaMismatch` when the sets differ or a name
    /// is listed twice.
    pub fn check_columns<S: AsRef<str>>(self, expected: &[S]) -> Result<(), RecordError> {
        let have: BTreeSet<&str> = self.column_names().into_iter().collect();
        let want: BTreeSet<&str> = expected.iter().map(AsRef::as_ref).collect();

        if have == want && expected.len() == want.len() {
            return Ok(());
        }

        let missing: Vec<String> = want.difference(&have).map(|s| (*s).to_string()).collect();
        let mut unexpected: Vec<String> =
            have.difference(&want).map(|s| (*s).to_string()).collect();
        if missing.is_empty() && unexpected.is_empty() {
            // same set, some name listed more than once
            let mut seen = BTreeSet::new();
            unexpected = expected
                .iter()
                .map(AsRef::as_ref)
                .filter(|c| !seen.insert(*c))
                .map(ToString::to_string)
                .collect();
        }

        Err(RecordError::SchemaMismatch {
            version: self,
            missing,
            unexpected,
        })
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            _ => Err(RecordError::UnknownVersion(s.to_string())),
        }
    }
}

/// Whether a column is numeric or categorical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Continuous value
    Numeric,
    /// Label from a closed set
    Categorical,
}

/// Name and kind of one record column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    /// Column name as the model knows it
    pub name: &'static str,
    /// Column kind
    pub kind: ColumnKind,
}

const fn numeric(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Numeric,
    }
}

const fn categorical(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Categorical,
    }
}

/// One cell of the record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Numeric cell
    Numeric(f64),
    /// Categorical cell
    Categorical(String),
}

impl FeatureValue {
    /// Column kind of this value
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "{v}"),
            Self::Categorical(s) => f.write_str(s),
        }
    }
}

/// Canonical record layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecordV2 {
    /// Active projects per scientist
    pub scientist_workload: f64,
    /// Lab occupancy (%)
    pub lab_occupancy_level: f64,
    /// Expected duration (minutes)
    pub expected_duration: f64,
    /// Ambient temperature (°C)
    pub ambient_temp: f64,
    /// Days since installation
    pub days_since_start: f64,
    /// Hour of booking
    pub hour_of_day: f64,
    /// Workload × occupancy
    pub stress_index: f64,
    /// Experiment type label
    pub experiment_type: String,
    /// Instrument type label
    pub instrument_type: String,
    /// Experience level label
    pub scientist_experience_level: String,
    /// Reagent batch id
    pub reagent_batch_id: String,
}

impl FeatureRecordV2 {
    /// Columns in model order
    pub const COLUMNS: &'static [ColumnSpec] = &[
        numeric("scientist_workload"),
        numeric("lab_occupancy_level"),
        numeric("expected_duration"),
        numeric("ambient_temp"),
        numeric("days_since_start"),
        numeric("hour_of_day"),
        numeric("stress_index"),
        categorical("experiment_type"),
        categorical("instrument_type"),
        categorical("scientist_experience_level"),
        categorical("reagent_batch_id"),
    ];

    fn cells(&self) -> Vec<FeatureValue> {
        use FeatureValue::{Categorical, Numeric};
        vec![
            Numeric(self.scientist_workload),
            Numeric(self.lab_occupancy_level),
            Numeric(self.expected_duration),
            Numeric(self.ambient_temp),
            Numeric(self.days_since_start),
            Numeric(self.hour_of_day),
            Numeric(self.stress_index),
            Categorical(self.experiment_type.clone()),
            Categorical(self.instrument_type.clone()),
            Categorical(self.scientist_experience_level.clone()),
            Categorical(self.reagent_batch_id.clone()),
        ]
    }
}

impl From<&FormInput> for FeatureRecordV2 {
    fn from(input: &FormInput) -> Self {
        Self {
            scientist_workload: f64::from(input.scientist_workload()),
            lab_occupancy_level: f64::from(input.lab_occupancy()),
            expected_duration: input.expected_duration(),
            ambient_temp: input.mean_ambient_temp(),
            days_since_start: f64::from(input.days_since_start()),
            hour_of_day: f64::from(input.hour_of_day()),
            stress_index: input.stress_index(),
            experiment_type: input.experiment_type().to_string(),
            instrument_type: input.instrument_type().to_string(),
            scientist_experience_level: input.scientist_experience().to_string(),
            reagent_batch_id: input.reagent_batch_id().to_string(),
        }
    }
}

/// Legacy record layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecordV1 {
    /// Active projects per scientist
    pub scientist_workload: f64,
    /// Lab occupancy (%)
    pub lab_occupancy_level: f64,
    /// Expected duration (minutes)
    pub expected_duration: f64,
    /// Mean ambient temperature (°C)
    pub mean_ambient_temp: f64,
    /// Days since installation
    pub days_since_start: f64,
    /// Experiment type label
    pub experiment_type: String,
    /// Instrument type label
    pub instrument_type: String,
    /// Experience level label
    pub scientist_experience_level: String,
    /// Reagent batch id
    pub reagent_batch_id: String,
}

impl FeatureRecordV1 {
    /// Columns in model order
    pub const COLUMNS: &'static [ColumnSpec] = &[
        numeric("scientist_workload"),
        numeric("lab_occupancy_level"),
        numeric("expected_duration"),
        numeric("mean_ambient_temp"),
        numeric("days_since_start"),
        categorical("experiment_type"),
        categorical("instrument_type"),
        categorical("scientist_experience_level"),
        categorical("reagent_batch_id"),
    ];

    fn cells(&self) -> Vec<FeatureValue> {
        use FeatureValue::{Categorical, Numeric};
        vec![
            Numeric(self.scientist_workload),
            Numeric(self.lab_occupancy_level),
            Numeric(self.expected_duration),
            Numeric(self.mean_ambient_temp),
            Numeric(self.days_since_start),
            Categorical(self.experiment_type.clone()),
            Categorical(self.instrument_type.clone()),
            Categorical(self.scientist_experience_level.clone()),
            Categorical(self.reagent_batch_id.clone()),
        ]
    }
}

impl From<&FormInput> for FeatureRecordV1 {
    fn from(input: &FormInput) -> Self {
        Self {
            scientist_workload: f64::from(input.scientist_workload()),
            lab_occupancy_level: f64::from(input.lab_occupancy()),
            expected_duration: input.expected_duration(),
            mean_ambient_temp: input.mean_ambient_temp(),
            days_since_start: f64::from(input.days_since_start()),
            experiment_type: input.experiment_type().to_string(),
            instrument_type: input.instrument_type().to_string(),
            scientist_experience_level: input.scientist_experience().to_string(),
            reagent_batch_id: input.reagent_batch_id().to_string(),
        }
    }
}

/// A feature record of either schema version
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum FeatureRecord {
    /// Legacy layout
    V1(FeatureRecordV1),
    /// Canonical layout
    V2(FeatureRecordV2),
}

impl FeatureRecord {
    /// Build the record for `version` from validated form input
    #[must_use]
    pub fn from_input(input: &FormInput, version: SchemaVersion) -> Self {
        match version {
            SchemaVersion::V1 => Self::V1(input.into()),
            SchemaVersion::V2 => Self::V2(input.into()),
        }
    }

    /// Schema version of this record
    #[must_use]
    pub fn version(&self) -> SchemaVersion {
        match self {
            Self::V1(_) => SchemaVersion::V1,
            Self::V2(_) => SchemaVersion::V2,
        }
    }

    /// `(column, value)` pairs in model order
    #[must_use]
    pub fn columns(&self) -> Vec<(&'static str, FeatureValue)> {
        let cells = match self {
            Self::V1(r) => r.cells(),
            Self::V2(r) => r.cells(),
        };
        self.version()
            .columns()
            .iter()
            .map(|c| c.name)
            .zip(cells)
            .collect()
    }

    /// Look up one column by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.columns()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Check that the record has exactly the columns a model expects
    ///
    /// Order is not significant; models address columns by name.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::SchemaMismatch` listing missing and unexpected
    /// columns when the sets differ.
    pub fn validate_columns<S: AsRef<str>>(&self, expected: &[S]) -> Result<(), RecordError> {
        self.version().check_columns(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormSubmission, RawValue};

    fn sample_input() -> FormInput {
        FormInput::from_submission(&FormSubmission {
            scientist_workload: Some(RawValue::Number(5.0)),
            lab_occupancy: Some(RawValue::Number(70.0)),
            ..FormSubmission::default()
        })
        .unwrap()
    }

    #[test]
    fn test_v2_column_order() {
        let record = FeatureRecord::from_input(&sample_input(), SchemaVersion::V2);
        let names: Vec<&str> = record.columns().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "scientist_workload",
                "lab_occupancy_level",
                "expected_duration",
                "ambient_temp",
                "days_since_start",
                "hour_of_day",
                "stress_index",
                "experiment_type",
                "instrument_type",
                "scientist_experience_level",
                "reagent_batch_id",
            ]
        );
    }

    #[test]
    fn test_v2_values() {
        let record = FeatureRecord::from_input(&sample_input(), SchemaVersion::V2);
        assert_eq!(record.get("stress_index"), Some(FeatureValue::Numeric(350.0)));
        assert_eq!(record.get("ambient_temp"), Some(FeatureValue::Numeric(22.0)));
        assert_eq!(record.get("expected_duration"), Some(FeatureValue::Numeric(60.0)));
        assert_eq!(
            record.get("reagent_batch_id"),
            Some(FeatureValue::Categorical("BATCH_001".to_string()))
        );
        assert_eq!(record.get("priority_level"), None);
    }

    #[test]
    fn test_v1_layout() {
        let record = FeatureRecord::from_input(&sample_input(), SchemaVersion::V1);
        assert_eq!(record.version(), SchemaVersion::V1);
        assert_eq!(record.columns().len(), 9);
        assert_eq!(record.get("mean_ambient_temp"), Some(FeatureValue::Numeric(22.0)));
        assert_eq!(record.get("ambient_temp"), None);
        assert_eq!(record.get("stress_index"), None);
        assert_eq!(record.get("hour_of_day"), None);
    }

    #[test]
    fn test_cells_align_with_column_kinds() {
        for version in SchemaVersion::ALL {
            let record = FeatureRecord::from_input(&sample_input(), version);
            for (spec, (_, value)) in version.columns().iter().zip(record.columns()) {
                assert_eq!(spec.kind, value.kind(), "{} in {version}", spec.name);
            }
        }
    }

    #[test]
    fn test_validate_exact_match_any_order() {
        let record = FeatureRecord::from_input(&sample_input(), SchemaVersion::V2);
        let mut names = SchemaVersion::V2.column_names();
        names.reverse();
        assert!(record.validate_columns(&names).is_ok());
    }

    #[test]
    fn test_validate_reports_missing_and_unexpected() {
        let record = FeatureRecord::from_input(&sample_input(), SchemaVersion::V2);
        let err = record
            .validate_columns(&SchemaVersion::V1.column_names())
            .unwrap_err();
        match err {
            RecordError::SchemaMismatch {
                version,
                missing,
                unexpected,
            } => {
                assert_eq!(version, SchemaVersion::V2);
                assert_eq!(missing, vec!["mean_ambient_temp".to_string()]);
                assert_eq!(
                    unexpected,
                    vec![
                        "ambient_temp".to_string(),
                        "hour_of_day".to_string(),
                        "stress_index".to_string()
                    ]
                );
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_duplicate_columns() {
        let record = FeatureRecord::from_input(&sample_input(), SchemaVersion::V1);
        let mut names = SchemaVersion::V1.column_names();
        names.push("reagent_batch_id");
        let err = record.validate_columns(&names).unwrap_err();
        assert!(err.to_string().contains("reagent_batch_id"));
    }

    #[test]
    fn test_schema_version_parse_and_codes() {
        assert_eq!("v1".parse::<SchemaVersion>().unwrap(), SchemaVersion::V1);
        assert_eq!("V2".parse::<SchemaVersion>().unwrap(), SchemaVersion::V2);
        assert!("v3".parse::<SchemaVersion>().is_err());
        for v in SchemaVersion::ALL {
            assert_eq!(SchemaVersion::from_code(v.code()), Some(v));
        }
        assert_eq!(SchemaVersion::from_code(7), None);
    }

    #[test]
    fn test_record_serializes_with_schema_tag() {
        let record = FeatureRecord::from_input(&sample_input(), SchemaVersion::V2);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"schema\":\"v2\""));
        assert!(json.contains("\"stress_index\":350.0"));
    }
}
