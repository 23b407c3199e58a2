//! Risk tiers for a predicted delay
//!
//! | delay (min) | tier     |
//! |-------------|----------|
//! | `< 15`      | Low      |
//! | `[15, 45)`  | Moderate |
//! | `>= 45`     | High     |
//!
//! Boundaries belong to the upper tier. Anything that is neither `< 15` nor
//! in `[15, 45)` is High, NaN included.

use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the Low tier, in minutes
pub const LOW_RISK_LIMIT: f64 = 15.0;

/// Upper bound (exclusive) of the Moderate tier, in minutes
pub const MODERATE_RISK_LIMIT: f64 = 45.0;

/// Three-tier delay risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// No action needed
    Low,
    /// Monitor
    Moderate,
    /// Reschedule or reallocate
    High,
}

impl RiskTier {
    /// Every tier, lowest first
    pub const ALL: [Self; 3] = [Self::Low, Self::Moderate, Self::High];

    /// Classify a predicted delay in minutes
    #[must_use]
    pub fn classify(delay_minutes: f64) -> Self {
        if delay_minutes < LOW_RISK_LIMIT {
            Self::Low
        } else if (LOW_RISK_LIMIT..MODERATE_RISK_LIMIT).contains(&delay_minutes) {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Headline shown on the result card
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW RISK",
            Self::Moderate => "MODERATE RISK",
            Self::High => "HIGH RISK (BOTTLENECK)",
        }
    }

    /// Accent colour of the result card
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "green",
            Self::Moderate => "orange",
            Self::High => "red",
        }
    }

    /// Recommended action
    #[must_use]
    pub fn advice(self) -> &'static str {
        match self {
            Self::Low => "Process is standard. No intervention needed.",
            Self::Moderate => "Monitor closely. Potential minor delays expected.",
            Self::High => "CRITICAL: Reschedule or allocate backup resources immediately.",
        }
    }

    /// Short machine name (`low`, `moderate`, `high`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// Classify a predicted delay in minutes
#[must_use]
pub fn classify(delay_minutes: f64) -> RiskTier {
    RiskTier::classify(delay_minutes)
}

/// Everything the result card shows for one prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Predicted delay in minutes
    pub delay_minutes: f64,
    /// Tier
    pub tier: RiskTier,
    /// Headline
    pub label: &'static str,
    /// Accent colour
    pub color: &'static str,
    /// Recommended action
    pub advice: &'static str,
}

impl RiskAssessment {
    /// Assess a predicted delay
    #[must_use]
    pub fn new(delay_minutes: f64) -> Self {
        let tier = RiskTier::classify(delay_minutes);
        Self {
            delay_minutes,
            tier,
            label: tier.label(),
            color: tier.color(),
            advice: tier.advice(),
        }
    }

    /// `Expected Delay: 10.0 minutes`
    #[must_use]
    pub fn delay_text(&self) -> String {
        format!("Expected Delay: {:.1} minutes", self.delay_minutes)
    }
}
