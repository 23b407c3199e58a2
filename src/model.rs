//! Regression pipeline evaluation
//!
//! A pipeline is a column transformer followed by one regressor, the same
//! shape as the scikit-learn pipelines the lab models are exported from:
//!
//! - numeric columns are standardised, `(x - mean) / scale`
//! - categorical columns are one-hot encoded; unknown categories encode as an
//!   all-zero block
//! - the encoded vector is numeric columns first, then categorical blocks
//!
//! Regressors: linear, gradient-boosted regression trees, random forest.
//! Trees are CART regression trees (`x[feature] <= threshold` goes left).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{ColumnKind, FeatureRecord, FeatureValue};

/// Errors raised while validating or evaluating a pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Record has no value for a column the preprocessor reads
    #[error("Column '{0}' not present in feature record")]
    ColumnMissing(String),

    /// Column value has the wrong kind
    #[error("Column '{column}' expected {expected:?} value, got {actual:?}")]
    KindMismatch {
        /// Column name
        column: String,
        /// Kind the preprocessor expects
        expected: ColumnKind,
        /// Kind found in the record
        actual: ColumnKind,
    },

    /// Standard scaler with a zero or non-finite scale
    #[error("Column '{0}' has an invalid scale")]
    InvalidScale(String),

    /// Regressor input width disagrees with the preprocessor output
    #[error("Regressor expects {expected} inputs, preprocessor produces {actual}")]
    WidthMismatch {
        /// Width the regressor was fitted on
        expected: usize,
        /// Width the preprocessor produces
        actual: usize,
    },

    /// Tree split references a feature past the encoded width
    #[error("Tree split on feature {index}, but only {width} features are encoded")]
    FeatureIndexOutOfRange {
        /// Referenced feature index
        index: usize,
        /// Encoded width
        width: usize,
    },

    /// Ensemble without trees
    #[error("Ensemble has no trees")]
    EmptyEnsemble,

    /// Hyperparameter or coefficient is not a finite number
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Offending value
        value: f64,
    },

    /// Model output is NaN or infinite
    #[error("Model produced a non-finite prediction ({0})")]
    NonFinite(f64),
}

// ============================================================================
// Preprocessor
// ============================================================================

fn unit_scale() -> f64 {
    1.0
}

/// Standardised numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    /// Record column name
    pub name: String,
    /// Mean subtracted before scaling
    #[serde(default)]
    pub mean: f64,
    /// Divisor applied after centring
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

impl NumericColumn {
    /// Pass-through column (mean 0, scale 1)
    #[must_use]
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mean: 0.0,
            scale: 1.0,
        }
    }
}

/// One-hot encoded categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    /// Record column name
    pub name: String,
    /// Known categories, one output per category
    pub categories: Vec<String>,
}

/// Column transformer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    /// Numeric columns, encoded first
    #[serde(default)]
    pub numeric: Vec<NumericColumn>,
    /// Categorical columns, encoded after the numeric block
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
}

impl Preprocessor {
    /// Record columns this preprocessor reads
    #[must_use]
    pub fn input_columns(&self) -> Vec<&str> {
        self.numeric
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.categorical.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// Length of the encoded vector
    #[must_use]
    pub fn output_width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Names of encoded features, `num__<col>` and `cat__<col>_<category>`
    #[must_use]
    pub fn encoded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .numeric
            .iter()
            .map(|c| format!("num__{}", c.name))
            .collect();
        for column in &self.categorical {
            names.extend(
                column
                    .categories
                    .iter()
                    .map(|cat| format!("cat__{}_{cat}", column.name)),
            );
        }
        names
    }

    /// Position of `cat__<column>_<category>` in the encoded vector
    #[must_use]
    pub fn one_hot_index(&self, column: &str, category: &str) -> Option<usize> {
        let mut offset = self.numeric.len();
        for c in &self.categorical {
            if c.name == column {
                return c
                    .categories
                    .iter()
                    .position(|k| k == category)
                    .map(|i| offset + i);
            }
            offset += c.categories.len();
        }
        None
    }

    /// Position of a numeric column in the encoded vector
    #[must_use]
    pub fn numeric_index(&self, column: &str) -> Option<usize> {
        self.numeric.iter().position(|c| c.name == column)
    }

    fn validate(&self) -> Result<(), ModelError> {
        for column in &self.numeric {
            if !column.scale.is_finite() || column.scale == 0.0 || !column.mean.is_finite() {
                return Err(ModelError::InvalidScale(column.name.clone()));
            }
        }
        Ok(())
    }

    /// Encode one record
    ///
    /// # Errors
    ///
    /// Fails when a column is absent from the record or has the wrong kind.
    pub fn transform(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        let cells = record.columns();
        let lookup = |name: &str| {
            cells
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v)
                .ok_or_else(|| ModelError::ColumnMissing(name.to_string()))
        };

        let mut out = Vec::with_capacity(self.output_width());
        for column in &self.numeric {
            match lookup(&column.name)? {
                FeatureValue::Numeric(x) => out.push((x - column.mean) / column.scale),
                other => {
                    return Err(ModelError::KindMismatch {
                        column: column.name.clone(),
                        expected: ColumnKind::Numeric,
                        actual: other.kind(),
                    })
                },
            }
        }
        for column in &self.categorical {
            match lookup(&column.name)? {
                FeatureValue::Categorical(value) => {
                    out.extend(
                        column
                            .categories
                            .iter()
                            .map(|cat| if cat == value { 1.0 } else { 0.0 }),
                    );
                },
                other => {
                    return Err(ModelError::KindMismatch {
                        column: column.name.clone(),
                        expected: ColumnKind::Categorical,
                        actual: other.kind(),
                    })
                },
            }
        }
        Ok(out)
    }
}

// ============================================================================
// Regression trees
// ============================================================================

/// Leaf node in a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionLeaf {
    /// Predicted value
    pub value: f64,
    /// Training samples that reached this leaf
    #[serde(default)]
    pub n_samples: usize,
}

/// Internal node in a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionNode {
    /// Encoded feature index to split on
    pub feature_idx: usize,
    /// Split threshold
    pub threshold: f64,
    /// Subtree for `x[feature_idx] <= threshold`
    pub left: Box<RegressionTreeNode>,
    /// Subtree for `x[feature_idx] > threshold`
    pub right: Box<RegressionTreeNode>,
}

/// A node in a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionTreeNode {
    /// Internal split
    Node(RegressionNode),
    /// Leaf value
    Leaf(RegressionLeaf),
}

impl RegressionTreeNode {
    /// Leaf with the given value
    #[must_use]
    pub fn leaf(value: f64) -> Self {
        Self::Leaf(RegressionLeaf {
            value,
            n_samples: 0,
        })
    }

    /// Split on `feature_idx` at `threshold`
    #[must_use]
    pub fn split(feature_idx: usize, threshold: f64, left: Self, right: Self) -> Self {
        Self::Node(RegressionNode {
            feature_idx,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Depth of the tree rooted here (leaves have depth 0)
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 0,
            Self::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    fn validate(&self, width: usize) -> Result<(), ModelError> {
        match self {
            Self::Leaf(leaf) => finite("leaf.value", leaf.value),
            Self::Node(node) => {
                if node.feature_idx >= width {
                    return Err(ModelError::FeatureIndexOutOfRange {
                        index: node.feature_idx,
                        width,
                    });
                }
                finite("threshold", node.threshold)?;
                node.left.validate(width)?;
                node.right.validate(width)
            },
        }
    }

    /// Predict for one encoded sample
    ///
    /// # Errors
    ///
    /// Fails when a split references a feature outside `x`.
    pub fn predict_one(&self, x: &[f64]) -> Result<f64, ModelError> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => return Ok(leaf.value),
                Self::Node(internal) => {
                    let value =
                        x.get(internal.feature_idx)
                            .ok_or(ModelError::FeatureIndexOutOfRange {
                                index: internal.feature_idx,
                                width: x.len(),
                            })?;
                    node = if *value <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                },
            }
        }
    }
}

fn finite(name: &str, value: f64) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter {
            name: name.to_string(),
            value,
        })
    }
}

// ============================================================================
// Regressors
// ============================================================================

/// Regressor family, as stored in artifact headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Ordinary least squares / ridge style linear model
    LinearRegression,
    /// Gradient-boosted regression trees
    GradientBoosting,
    /// Random forest of regression trees
    RandomForest,
}

impl ModelKind {
    /// Header code
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::LinearRegression => 0x0001,
            Self::GradientBoosting => 0x0002,
            Self::RandomForest => 0x0003,
        }
    }

    /// Inverse of [`ModelKind::code`]
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0001 => Some(Self::LinearRegression),
            0x0002 => Some(Self::GradientBoosting),
            0x0003 => Some(Self::RandomForest),
            _ => None,
        }
    }

    /// Display name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LinearRegression => "LinearRegression",
            Self::GradientBoosting => "GradientBoosting",
            Self::RandomForest => "RandomForest",
        }
    }
}

/// Fitted regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Regressor {
    /// `intercept + Σ coefficients[i] * x[i]`
    LinearRegression {
        /// Bias term
        intercept: f64,
        /// One weight per encoded feature
        coefficients: Vec<f64>,
    },
    /// `init + learning_rate * Σ tree(x)`
    GradientBoosting {
        /// Initial prediction (training mean)
        init: f64,
        /// Shrinkage
        learning_rate: f64,
        /// Boosting stages
        trees: Vec<RegressionTreeNode>,
    },
    /// Mean of tree predictions
    RandomForest {
        /// Ensemble members
        trees: Vec<RegressionTreeNode>,
    },
}

impl Regressor {
    /// Family of this regressor
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::LinearRegression { .. } => ModelKind::LinearRegression,
            Self::GradientBoosting { .. } => ModelKind::GradientBoosting,
            Self::RandomForest { .. } => ModelKind::RandomForest,
        }
    }

    fn validate(&self, width: usize) -> Result<(), ModelError> {
        match self {
            Self::LinearRegression {
                intercept,
                coefficients,
            } => {
                finite("intercept", *intercept)?;
                if coefficients.len() != width {
                    return Err(ModelError::WidthMismatch {
                        expected: coefficients.len(),
                        actual: width,
                    });
                }
                for (i, c) in coefficients.iter().enumerate() {
                    finite(&format!("coefficients[{i}]"), *c)?;
                }
                Ok(())
            },
            Self::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => {
                finite("init", *init)?;
                finite("learning_rate", *learning_rate)?;
                trees.iter().try_for_each(|t| t.validate(width))
            },
            Self::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::EmptyEnsemble);
                }
                trees.iter().try_for_each(|t| t.validate(width))
            },
        }
    }

    /// Predict for one encoded sample
    ///
    /// # Errors
    ///
    /// Fails when `x` is narrower than the regressor expects.
    pub fn predict_one(&self, x: &[f64]) -> Result<f64, ModelError> {
        match self {
            Self::LinearRegression {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != x.len() {
                    return Err(ModelError::WidthMismatch {
                        expected: coefficients.len(),
                        actual: x.len(),
                    });
                }
                Ok(intercept
                    + coefficients
                        .iter()
                        .zip(x)
                        .map(|(w, v)| w * v)
                        .sum::<f64>())
            },
            Self::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => {
                let mut sum = 0.0;
                for tree in trees {
                    sum += tree.predict_one(x)?;
                }
                Ok(init + learning_rate * sum)
            },
            Self::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::EmptyEnsemble);
                }
                let mut sum = 0.0;
                for tree in trees {
                    sum += tree.predict_one(x)?;
                }
                Ok(sum / trees.len() as f64)
            },
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Preprocessor + regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Column transformer
    pub preprocessor: Preprocessor,
    /// Fitted regressor
    pub regressor: Regressor,
}

impl Pipeline {
    /// Check internal consistency (scales, widths, tree indices)
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.preprocessor.validate()?;
        self.regressor.validate(self.preprocessor.output_width())
    }

    /// Predict the delay in minutes for one record
    ///
    /// # Errors
    ///
    /// Fails on encoding errors or a non-finite result.
    pub fn predict(&self, record: &FeatureRecord) -> Result<f64, ModelError> {
        let x = self.preprocessor.transform(record)?;
        let y = self.regressor.predict_one(&x)?;
        if !y.is_finite() {
            return Err(ModelError::NonFinite(y));
        }
        Ok(y)
    }
}
