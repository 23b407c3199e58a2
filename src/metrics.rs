//! Prediction counters in Prometheus text format
//!
//! Tracks:
//! - predictions per risk tier
//! - model-not-found and other prediction failures
//! - rejected form submissions
//! - total prediction latency

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{predictor::PredictionError, risk::RiskTier};

/// Shared prediction counters
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    low: Arc<AtomicUsize>,
    moderate: Arc<AtomicUsize>,
    high: Arc<AtomicUsize>,
    model_not_found: Arc<AtomicUsize>,
    prediction_failed: Arc<AtomicUsize>,
    invalid_input: Arc<AtomicUsize>,
    /// Total prediction time in microseconds
    total_prediction_time_us: Arc<AtomicU64>,
    start_time: Instant,
}

impl MetricsCollector {
    /// Create a new metrics collector
    #[must_use]
    pub fn new() -> Self {
        Self {
            low: Arc::new(AtomicUsize::new(0)),
            moderate: Arc::new(AtomicUsize::new(0)),
            high: Arc::new(AtomicUsize::new(0)),
            model_not_found: Arc::new(AtomicUsize::new(0)),
            prediction_failed: Arc::new(AtomicUsize::new(0)),
            invalid_input: Arc::new(AtomicUsize::new(0)),
            total_prediction_time_us: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    fn tier_counter(&self, tier: RiskTier) -> &AtomicUsize {
        match tier {
            RiskTier::Low => &self.low,
            RiskTier::Moderate => &self.moderate,
            RiskTier::High => &self.high,
        }
    }

    /// Record a successful prediction
    #[allow(clippy::cast_possible_truncation)]
    pub fn record_prediction(&self, tier: RiskTier, duration: Duration) {
        self.tier_counter(tier).fetch_add(1, Ordering::Relaxed);
        self.total_prediction_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record a prediction that produced no number
    pub fn record_failure(&self, error: &PredictionError) {
        let counter = match error {
            PredictionError::ModelNotFound { .. } => &self.model_not_found,
            PredictionError::Failed { .. } => &self.prediction_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a submission rejected before prediction
    pub fn record_invalid_input(&self) {
        self.invalid_input.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of metrics
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let low = self.low.load(Ordering::Relaxed);
        let moderate = self.moderate.load(Ordering::Relaxed);
        let high = self.high.load(Ordering::Relaxed);
        let model_not_found = self.model_not_found.load(Ordering::Relaxed);
        let prediction_failed = self.prediction_failed.load(Ordering::Relaxed);
        let successful = low + moderate + high;
        let total_time_us = self.total_prediction_time_us.load(Ordering::Relaxed);

        MetricsSnapshot {
            low_risk: low,
            moderate_risk: moderate,
            high_risk: high,
            model_not_found,
            prediction_failed,
            invalid_input: self.invalid_input.load(Ordering::Relaxed),
            total_prediction_time_us: total_time_us,
            uptime_secs: self.start_time.elapsed().as_secs(),
            avg_latency_ms: if successful > 0 {
                (total_time_us as f64 / 1000.0) / successful as f64
            } else {
                0.0
            },
        }
    }

    /// Export metrics in Prometheus format
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        format!(
            "# HELP labdelay_predictions_total Successful predictions by risk tier\n\
             # TYPE labdelay_predictions_total counter\n\
             labdelay_predictions_total{{tier=\"low\"}} {}\n\
             labdelay_predictions_total{{tier=\"moderate\"}} {}\n\
             labdelay_predictions_total{{tier=\"high\"}} {}\n\
             # HELP labdelay_prediction_errors_total Predictions that produced no number\n\
             # TYPE labdelay_prediction_errors_total counter\n\
             labdelay_prediction_errors_total{{kind=\"model_not_found\"}} {}\n\
             labdelay_prediction_errors_total{{kind=\"prediction_failed\"}} {}\n\
             # HELP labdelay_invalid_input_total Rejected form submissions\n\
             # TYPE labdelay_invalid_input_total counter\n\
             labdelay_invalid_input_total {}\n\
             # HELP labdelay_prediction_time_seconds Total prediction time\n\
             # TYPE labdelay_prediction_time_seconds counter\n\
             labdelay_prediction_time_seconds {:.6}\n\
             # HELP labdelay_avg_latency_ms Average prediction latency in milliseconds\n\
             # TYPE labdelay_avg_latency_ms gauge\n\
             labdelay_avg_latency_ms {:.2}\n\
             # HELP labdelay_uptime_seconds Uptime in seconds\n\
             # TYPE labdelay_uptime_seconds counter\n\
             labdelay_uptime_seconds {}\n",
            s.low_risk,
            s.moderate_risk,
            s.high_risk,
            s.model_not_found,
            s.prediction_failed,
            s.invalid_input,
            s.total_prediction_time_us as f64 / 1_000_000.0,
            s.avg_latency_ms,
            s.uptime_secs
        )
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.low,
            &self.moderate,
            &self.high,
            &self.model_not_found,
            &self.prediction_failed,
            &self.invalid_input,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.total_prediction_time_us.store(0, Ordering::Relaxed);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Predictions classified Low
    pub low_risk: usize,
    /// Predictions classified Moderate
    pub moderate_risk: usize,
    /// Predictions classified High
    pub high_risk: usize,
    /// Predictions that found no model file
    pub model_not_found: usize,
    /// Predictions that failed for any other reason
    pub prediction_failed: usize,
    /// Submissions rejected by form validation
    pub invalid_input: usize,
    /// Total prediction time in microseconds
    pub total_prediction_time_us: u64,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Average prediction latency in milliseconds
    pub avg_latency_ms: f64,
}

impl MetricsSnapshot {
    /// Successful predictions across all tiers
    #[must_use]
    pub fn successful(&self) -> usize {
        self.low_risk + self.moderate_risk + self.high_risk
    }
}
