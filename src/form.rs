//! Form collector: widget domains, defaults, and validated input
//!
//! Every widget on the operations form is either a bounded number or a closed
//! enumeration. A submission arrives as loosely-typed [`FormSubmission`]
//! values (URL-encoded form or JSON) and is validated once into an immutable
//! [`FormInput`], which is then passed by value into the prediction step.
//!
//! ## Example
//!
//! ```
//! use labdelay::form::{ExperimentType, FormInput, FormSubmission, RawValue};
//!
//! let submission = FormSubmission {
//!     experiment_type: Some(RawValue::Text("Pilot".to_string())),
//!     ..FormSubmission::default()
//! };
//! let input = FormInput::from_submission(&submission).unwrap();
//! assert_eq!(input.experiment_type(), ExperimentType::Pilot);
//! assert_eq!(input.expected_duration(), 90.0);
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for a single form field
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    /// Numeric value outside the widget's range
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Submitted value
        value: String,
        /// Lower bound (inclusive)
        min: String,
        /// Upper bound (inclusive)
        max: String,
    },

    /// Value could not be parsed as a number
    #[error("{field}: '{value}' is not a valid number")]
    InvalidNumber {
        /// Field name
        field: &'static str,
        /// Submitted value
        value: String,
    },

    /// Value is not one of the enumerated options
    #[error("{field}: '{value}' is not an allowed option")]
    UnknownOption {
        /// Field name
        field: &'static str,
        /// Submitted value
        value: String,
    },
}

// ============================================================================
// Closed enumerations
// ============================================================================

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal, default = $default:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// Every option, in display order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Form field this enumeration is collected through
            pub const FIELD: &'static str = $field;

            /// Option text, as shown in the form and sent to the model
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FormError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(FormError::UnknownOption {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

closed_enum! {
    /// Kind of experiment being booked
    ExperimentType, field = "experiment_type", default = Validation {
        /// Method validation run
        Validation => "Validation",
        /// Quality control run
        Qc => "QC",
        /// Pilot study
        Pilot => "Pilot",
        /// Screening assay
        Screening => "Screening",
        /// Research and development
        RnD => "R&D",
    }
}

closed_enum! {
    /// Instrument the experiment is booked on
    InstrumentType, field = "instrument_type", default = Microscope {
        /// Microscope
        Microscope => "Microscope",
        /// Centrifuge
        Centrifuge => "Centrifuge",
        /// Spectrometer
        Spectrometer => "Spectrometer",
        /// High-performance liquid chromatography
        Hplc => "HPLC",
        /// Incubator
        Incubator => "Incubator",
        /// Polymerase chain reaction cycler
        Pcr => "PCR",
    }
}

closed_enum! {
    /// Experience level of the scientist running the experiment
    ExperienceLevel, field = "scientist_experience", default = Junior {
        /// Junior scientist
        Junior => "Junior",
        /// Mid-level scientist
        Mid => "Mid",
        /// Senior scientist
        Senior => "Senior",
    }
}

closed_enum! {
    /// Booking priority. Collected by the form; no model schema consumes it.
    PriorityLevel, field = "priority_level", default = Low {
        /// Low priority
        Low => "Low",
        /// Medium priority
        Medium => "Medium",
        /// High priority
        High => "High",
        /// Critical priority
        Critical => "Critical",
    }
}

impl ExperimentType {
    /// Default expected duration in minutes for this experiment type
    #[must_use]
    pub fn default_duration(self) -> f64 {
        match self {
            Self::Validation => 60.0,
            Self::Qc => 45.0,
            Self::Pilot => 90.0,
            Self::Screening => 30.0,
            Self::RnD => 120.0,
        }
    }
}

/// Default expected duration (minutes) for an experiment type
#[must_use]
pub fn default_duration(experiment_type: ExperimentType) -> f64 {
    experiment_type.default_duration()
}

// ============================================================================
// Reagent batches
// ============================================================================

/// Number of sequentially generated batches (`BATCH_001`..`BATCH_010`)
pub const GENERATED_BATCH_COUNT: u32 = 10;

/// Batch identifiers listed in addition to the generated sequence
pub const FLAGGED_BATCHES: [&str; 3] = ["BATCH_392", "BATCH_042", "BATCH_007"];

/// Batch known to be defective
pub const BAD_BATCH: &str = "BATCH_392";

/// Selectable reagent batches, sorted, without duplicates
///
/// `BATCH_007` is both generated and flagged; it is listed once.
#[must_use]
pub fn batch_options() -> Vec<String> {
    let mut options: Vec<String> = (1..=GENERATED_BATCH_COUNT)
        .map(|i| format!("BATCH_{i:03}"))
        .chain(FLAGGED_BATCHES.iter().map(|b| (*b).to_string()))
        .collect();
    options.sort();
    options.dedup();
    options
}

/// A reagent batch identifier drawn from [`batch_options`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReagentBatch(String);

impl ReagentBatch {
    /// Form field the batch is collected through
    pub const FIELD: &'static str = "reagent_batch_id";

    /// Batch identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the batch is one of the flagged literals
    #[must_use]
    pub fn is_flagged(&self) -> bool {
        FLAGGED_BATCHES.contains(&self.0.as_str())
    }

    /// Whether the batch is the known defective one
    #[must_use]
    pub fn is_known_bad(&self) -> bool {
        self.0 == BAD_BATCH
    }
}

impl Default for ReagentBatch {
    fn default() -> Self {
        Self("BATCH_001".to_string())
    }
}

impl fmt::Display for ReagentBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReagentBatch {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if batch_options().iter().any(|b| b == s) {
            Ok(Self(s.to_string()))
        } else {
            Err(FormError::UnknownOption {
                field: Self::FIELD,
                value: s.to_string(),
            })
        }
    }
}

// ============================================================================
// Numeric bounds
// ============================================================================

/// Inclusive range and default of a numeric widget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    /// Form field name
    pub field: &'static str,
    /// Minimum (inclusive)
    pub min: T,
    /// Maximum (inclusive)
    pub max: T,
    /// Value used when the field is not submitted
    pub default: T,
}

impl<T: PartialOrd + Copy + fmt::Display> Bounds<T> {
    /// Check `value` against the range
    ///
    /// # Errors
    ///
    /// Returns `FormError::OutOfRange` when `value` falls outside `[min, max]`.
    pub fn check(&self, value: T) -> Result<T, FormError> {
        if value < self.min || value > self.max {
            return Err(FormError::OutOfRange {
                field: self.field,
                value: value.to_string(),
                min: self.min.to_string(),
                max: self.max.to_string(),
            });
        }
        Ok(value)
    }
}

/// Lab occupancy, percent of resources in use
pub const LAB_OCCUPANCY: Bounds<u32> = Bounds {
    field: "lab_occupancy",
    min: 0,
    max: 100,
    default: 70,
};

/// Concurrent experiments per scientist
pub const SCIENTIST_WORKLOAD: Bounds<u32> = Bounds {
    field: "scientist_workload",
    min: 1,
    max: 20,
    default: 5,
};

/// Hour of the experiment booking
pub const HOUR_OF_DAY: Bounds<u32> = Bounds {
    field: "hour_of_day",
    min: 0,
    max: 23,
    default: 10,
};

/// Days since the instrument was installed
pub const DAYS_SINCE_START: Bounds<u32> = Bounds {
    field: "days_since_start",
    min: 0,
    max: 730,
    default: 100,
};

/// Mean ambient temperature in °C
pub const MEAN_AMBIENT_TEMP: Bounds<f64> = Bounds {
    field: "mean_ambient_temp",
    min: 18.0,
    max: 30.0,
    default: 22.0,
};

/// Form field carrying the expected duration override
pub const EXPECTED_DURATION_FIELD: &str = "expected_duration";

// ============================================================================
// Submission → FormInput
// ============================================================================

/// A raw widget value: a JSON number or any text (form posts are always text)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Numeric value
    Number(f64),
    /// Textual value
    Text(String),
}

impl RawValue {
    /// Text form, `None` when blank
    fn text(&self) -> Option<String> {
        match self {
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) if s.trim().is_empty() => None,
            Self::Text(s) => Some(s.trim().to_string()),
        }
    }
}

/// Widget values as submitted; every field is optional and defaults apply
///
/// Names outside the widget set are rejected rather than ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormSubmission {
    /// Lab occupancy (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_occupancy: Option<RawValue>,
    /// Scientist workload (active projects)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientist_workload: Option<RawValue>,
    /// Hour of day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour_of_day: Option<RawValue>,
    /// Days since installation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_since_start: Option<RawValue>,
    /// Reagent batch id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reagent_batch_id: Option<RawValue>,
    /// Experiment type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_type: Option<RawValue>,
    /// Instrument type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_type: Option<RawValue>,
    /// Scientist experience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientist_experience: Option<RawValue>,
    /// Priority level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_level: Option<RawValue>,
    /// Mean ambient temperature (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_ambient_temp: Option<RawValue>,
    /// Expected duration override (minutes); blank means "derive from type"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_duration: Option<RawValue>,
}

fn parse_int(raw: Option<&RawValue>, bounds: &Bounds<u32>) -> Result<u32, FormError> {
    let Some(raw) = raw else {
        return Ok(bounds.default);
    };
    let value = match raw {
        RawValue::Number(n) => {
            if !n.is_finite() || n.fract() != 0.0 {
                return Err(FormError::InvalidNumber {
                    field: bounds.field,
                    value: n.to_string(),
                });
            }
            if *n < 0.0 || *n > f64::from(u32::MAX) {
                return Err(FormError::OutOfRange {
                    field: bounds.field,
                    value: n.to_string(),
                    min: bounds.min.to_string(),
                    max: bounds.max.to_string(),
                });
            }
            *n as u32
        },
        RawValue::Text(_) => {
            let Some(text) = raw.text() else {
                return Ok(bounds.default);
            };
            match text.parse::<i64>() {
                Ok(v) => u32::try_from(v).map_err(|_| FormError::OutOfRange {
                    field: bounds.field,
                    value: text.clone(),
                    min: bounds.min.to_string(),
                    max: bounds.max.to_string(),
                })?,
                Err(_) => {
                    return Err(FormError::InvalidNumber {
                        field: bounds.field,
                        value: text,
                    })
                },
            }
        },
    };
    bounds.check(value)
}

fn parse_float(field: &'static str, raw: Option<&RawValue>) -> Result<Option<f64>, FormError> {
    let Some(text) = raw.and_then(RawValue::text) else {
        return Ok(None);
    };
    let value = match raw {
        Some(RawValue::Number(n)) => *n,
        _ => text.parse::<f64>().map_err(|_| FormError::InvalidNumber {
            field,
            value: text.clone(),
        })?,
    };
    if !value.is_finite() {
        return Err(FormError::InvalidNumber {
            field,
            value: text,
        });
    }
    Ok(Some(value))
}

fn parse_choice<T>(raw: Option<&RawValue>) -> Result<T, FormError>
where
    T: FromStr<Err = FormError> + Default,
{
    match raw.and_then(RawValue::text) {
        Some(text) => text.parse(),
        None => Ok(T::default()),
    }
}

/// Validated widget values for one interaction
///
/// Constructed once per submit and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormInput {
    lab_occupancy: u32,
    scientist_workload: u32,
    hour_of_day: u32,
    days_since_start: u32,
    reagent_batch_id: ReagentBatch,
    experiment_type: ExperimentType,
    instrument_type: InstrumentType,
    scientist_experience: ExperienceLevel,
    priority_level: PriorityLevel,
    mean_ambient_temp: f64,
    expected_duration: f64,
    duration_overridden: bool,
}

impl Default for FormInput {
    fn default() -> Self {
        let experiment_type = ExperimentType::default();
        Self {
            lab_occupancy: LAB_OCCUPANCY.default,
            scientist_workload: SCIENTIST_WORKLOAD.default,
            hour_of_day: HOUR_OF_DAY.default,
            days_since_start: DAYS_SINCE_START.default,
            reagent_batch_id: ReagentBatch::default(),
            experiment_type,
            instrument_type: InstrumentType::default(),
            scientist_experience: ExperienceLevel::default(),
            priority_level: PriorityLevel::default(),
            mean_ambient_temp: MEAN_AMBIENT_TEMP.default,
            expected_duration: experiment_type.default_duration(),
            duration_overridden: false,
        }
    }
}

impl FormInput {
    /// Validate a submission, filling absent fields with their defaults
    ///
    /// # Errors
    ///
    /// Returns the first `FormError` found, in widget order.
    pub fn from_submission(submission: &FormSubmission) -> Result<Self, FormError> {
        let lab_occupancy = parse_int(submission.lab_occupancy.as_ref(), &LAB_OCCUPANCY)?;
        let scientist_workload =
            parse_int(submission.scientist_workload.as_ref(), &SCIENTIST_WORKLOAD)?;
        let hour_of_day = parse_int(submission.hour_of_day.as_ref(), &HOUR_OF_DAY)?;
        let days_since_start = parse_int(submission.days_since_start.as_ref(), &DAYS_SINCE_START)?;
        let reagent_batch_id: ReagentBatch = parse_choice(submission.reagent_batch_id.as_ref())?;
        let experiment_type: ExperimentType = parse_choice(submission.experiment_type.as_ref())?;
        let instrument_type: InstrumentType = parse_choice(submission.instrument_type.as_ref())?;
        let scientist_experience: ExperienceLevel =
            parse_choice(submission.scientist_experience.as_ref())?;
        let priority_level: PriorityLevel = parse_choice(submission.priority_level.as_ref())?;

        let mean_ambient_temp = match parse_float(
            MEAN_AMBIENT_TEMP.field,
            submission.mean_ambient_temp.as_ref(),
        )? {
            Some(t) => MEAN_AMBIENT_TEMP.check(t)?,
            None => MEAN_AMBIENT_TEMP.default,
        };

        let (expected_duration, duration_overridden) =
            match parse_float(EXPECTED_DURATION_FIELD, submission.expected_duration.as_ref())? {
                Some(d) if d < 0.0 => {
                    return Err(FormError::OutOfRange {
                        field: EXPECTED_DURATION_FIELD,
                        value: d.to_string(),
                        min: "0".to_string(),
                        max: "inf".to_string(),
                    })
                },
                Some(d) => (d, true),
                None => (experiment_type.default_duration(), false),
            };

        Ok(Self {
            lab_occupancy,
            scientist_workload,
            hour_of_day,
            days_since_start,
            reagent_batch_id,
            experiment_type,
            instrument_type,
            scientist_experience,
            priority_level,
            mean_ambient_temp,
            expected_duration,
            duration_overridden,
        })
    }

    /// Best-effort input for re-displaying a rejected submission
    ///
    /// Fields that fail validation take their defaults; valid fields keep the
    /// submitted value.
    #[must_use]
    pub fn salvage(submission: &FormSubmission) -> Self {
        let int = |raw: &Option<RawValue>, bounds: &Bounds<u32>| {
            parse_int(raw.as_ref(), bounds).unwrap_or(bounds.default)
        };
        let experiment_type: ExperimentType =
            parse_choice(submission.experiment_type.as_ref()).unwrap_or_default();
        let mean_ambient_temp =
            parse_float(MEAN_AMBIENT_TEMP.field, submission.mean_ambient_temp.as_ref())
                .ok()
                .flatten()
                .and_then(|t| MEAN_AMBIENT_TEMP.check(t).ok())
                .unwrap_or(MEAN_AMBIENT_TEMP.default);
        let duration =
            parse_float(EXPECTED_DURATION_FIELD, submission.expected_duration.as_ref())
                .ok()
                .flatten()
                .filter(|d| *d >= 0.0);

        Self {
            lab_occupancy: int(&submission.lab_occupancy, &LAB_OCCUPANCY),
            scientist_workload: int(&submission.scientist_workload, &SCIENTIST_WORKLOAD),
            hour_of_day: int(&submission.hour_of_day, &HOUR_OF_DAY),
            days_since_start: int(&submission.days_since_start, &DAYS_SINCE_START),
            reagent_batch_id: parse_choice(submission.reagent_batch_id.as_ref())
                .unwrap_or_default(),
            experiment_type,
            instrument_type: parse_choice(submission.instrument_type.as_ref()).unwrap_or_default(),
            scientist_experience: parse_choice(submission.scientist_experience.as_ref())
                .unwrap_or_default(),
            priority_level: parse_choice(submission.priority_level.as_ref()).unwrap_or_default(),
            mean_ambient_temp,
            expected_duration: duration.unwrap_or_else(|| experiment_type.default_duration()),
            duration_overridden: duration.is_some(),
        }
    }

    /// Raw submission that reproduces this input
    ///
    /// The duration is only included when it was overridden, so a re-submit
    /// with a different experiment type re-derives it.
    #[must_use]
    pub fn to_submission(&self) -> FormSubmission {
        let text = |s: &str| Some(RawValue::Text(s.to_string()));
        let number = |n: f64| Some(RawValue::Number(n));
        FormSubmission {
            lab_occupancy: number(f64::from(self.lab_occupancy)),
            scientist_workload: number(f64::from(self.scientist_workload)),
            hour_of_day: number(f64::from(self.hour_of_day)),
            days_since_start: number(f64::from(self.days_since_start)),
            reagent_batch_id: text(self.reagent_batch_id.as_str()),
            experiment_type: text(self.experiment_type.as_str()),
            instrument_type: text(self.instrument_type.as_str()),
            scientist_experience: text(self.scientist_experience.as_str()),
            priority_level: text(self.priority_level.as_str()),
            mean_ambient_temp: number(self.mean_ambient_temp),
            expected_duration: if self.duration_overridden {
                number(self.expected_duration)
            } else {
                None
            },
        }
    }

    /// Lab occupancy (%)
    #[must_use]
    pub fn lab_occupancy(&self) -> u32 {
        self.lab_occupancy
    }

    /// Scientist workload (active projects)
    #[must_use]
    pub fn scientist_workload(&self) -> u32 {
        self.scientist_workload
    }

    /// Hour of day (0-23)
    #[must_use]
    pub fn hour_of_day(&self) -> u32 {
        self.hour_of_day
    }

    /// Days since installation
    #[must_use]
    pub fn days_since_start(&self) -> u32 {
        self.days_since_start
    }

    /// Reagent batch
    #[must_use]
    pub fn reagent_batch_id(&self) -> &ReagentBatch {
        &self.reagent_batch_id
    }

    /// Experiment type
    #[must_use]
    pub fn experiment_type(&self) -> ExperimentType {
        self.experiment_type
    }

    /// Instrument type
    #[must_use]
    pub fn instrument_type(&self) -> InstrumentType {
        self.instrument_type
    }

    /// Scientist experience level
    #[must_use]
    pub fn scientist_experience(&self) -> ExperienceLevel {
        self.scientist_experience
    }

    /// Priority level
    #[must_use]
    pub fn priority_level(&self) -> PriorityLevel {
        self.priority_level
    }

    /// Mean ambient temperature (°C)
    #[must_use]
    pub fn mean_ambient_temp(&self) -> f64 {
        self.mean_ambient_temp
    }

    /// Expected duration in minutes (override or derived default)
    #[must_use]
    pub fn expected_duration(&self) -> f64 {
        self.expected_duration
    }

    /// Whether the duration was entered rather than derived
    #[must_use]
    pub fn duration_overridden(&self) -> bool {
        self.duration_overridden
    }

    /// Engineered feature: workload × occupancy
    #[must_use]
    pub fn stress_index(&self) -> f64 {
        f64::from(self.scientist_workload) * f64::from(self.lab_occupancy)
    }
}

// ============================================================================
// Widget descriptions
// ============================================================================

/// Page section a widget is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// "Operational Parameters"
    Operational,
    /// "Simulation & Supply Chain (V2)"
    SimulationSupply,
    /// "Experiment Details"
    ExperimentDetails,
    /// "Advanced Configuration (Hidden Variables)"
    Advanced,
}

impl Section {
    /// Section heading
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Operational => "Operational Parameters",
            Self::SimulationSupply => "Simulation & Supply Chain (V2)",
            Self::ExperimentDetails => "Experiment Details",
            Self::Advanced => "Advanced Configuration (Hidden Variables)",
        }
    }
}

/// Widget type and domain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Bounded slider
    Slider {
        /// Minimum
        min: f64,
        /// Maximum
        max: f64,
        /// Step
        step: f64,
        /// Default value
        default: f64,
    },
    /// Free number entry, non-negative; the default depends on another field
    Number {
        /// Minimum
        min: f64,
        /// Default per option of the controlling field
        defaults: Vec<(String, f64)>,
    },
    /// Drop-down of closed options
    Select {
        /// Allowed values in display order
        options: Vec<String>,
        /// Default value
        default: String,
    },
}

/// Description of one widget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Form field name
    pub name: &'static str,
    /// Label shown next to the widget
    pub label: &'static str,
    /// Help text
    pub help: &'static str,
    /// Section of the page
    pub section: Section,
    /// Type and domain
    #[serde(flatten)]
    pub kind: FieldKind,
}

fn int_slider(bounds: &Bounds<u32>) -> FieldKind {
    FieldKind::Slider {
        min: f64::from(bounds.min),
        max: f64::from(bounds.max),
        step: 1.0,
        default: f64::from(bounds.default),
    }
}

fn select<T: Copy + fmt::Display + Default>(all: &[T]) -> FieldKind {
    FieldKind::Select {
        options: all.iter().map(ToString::to_string).collect(),
        default: T::default().to_string(),
    }
}

/// All widgets of the form, in page order
#[must_use]
pub fn field_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            name: LAB_OCCUPANCY.field,
            label: "Lab Occupancy (%)",
            help: "Current utilization of lab resources.",
            section: Section::Operational,
            kind: int_slider(&LAB_OCCUPANCY),
        },
        FieldSpec {
            name: SCIENTIST_WORKLOAD.field,
            label: "Scientist Workload (Active Projects)",
            help: "Number of concurrent experiments per scientist.",
            section: Section::Operational,
            kind: int_slider(&SCIENTIST_WORKLOAD),
        },
        FieldSpec {
            name: HOUR_OF_DAY.field,
            label: "Time of Day (Hour)",
            help: "Hour of the experiment booking (0-23).",
            section: Section::Operational,
            kind: int_slider(&HOUR_OF_DAY),
        },
        FieldSpec {
            name: DAYS_SINCE_START.field,
            label: "Days Since Installation (Simulate Aging)",
            help: "Higher values simulate older machines (Drift).",
            section: Section::SimulationSupply,
            kind: int_slider(&DAYS_SINCE_START),
        },
        FieldSpec {
            name: ReagentBatch::FIELD,
            label: "Reagent Batch ID",
            help: "Select the batch used for this experiment.",
            section: Section::SimulationSupply,
            kind: FieldKind::Select {
                options: batch_options(),
                default: ReagentBatch::default().to_string(),
            },
        },
        FieldSpec {
            name: ExperimentType::FIELD,
            label: "Experiment Type",
            help: "",
            section: Section::ExperimentDetails,
            kind: select(ExperimentType::ALL),
        },
        FieldSpec {
            name: InstrumentType::FIELD,
            label: "Instrument Type",
            help: "",
            section: Section::ExperimentDetails,
            kind: select(InstrumentType::ALL),
        },
        FieldSpec {
            name: ExperienceLevel::FIELD,
            label: "Scientist Experience",
            help: "",
            section: Section::ExperimentDetails,
            kind: select(ExperienceLevel::ALL),
        },
        FieldSpec {
            name: PriorityLevel::FIELD,
            label: "Priority Level",
            help: "",
            section: Section::ExperimentDetails,
            kind: select(PriorityLevel::ALL),
        },
        FieldSpec {
            name: MEAN_AMBIENT_TEMP.field,
            label: "Mean Ambient Temp (°C)",
            help: "",
            section: Section::Advanced,
            kind: FieldKind::Slider {
                min: MEAN_AMBIENT_TEMP.min,
                max: MEAN_AMBIENT_TEMP.max,
                step: 0.1,
                default: MEAN_AMBIENT_TEMP.default,
            },
        },
        FieldSpec {
            name: EXPECTED_DURATION_FIELD,
            label: "Expected Duration (mins)",
            help: "Leave blank to use the default for the experiment type.",
            section: Section::Advanced,
            kind: FieldKind::Number {
                min: 0.0,
                defaults: ExperimentType::ALL
                    .iter()
                    .map(|t| (t.to_string(), t.default_duration()))
                    .collect(),
            },
        },
    ]
}
