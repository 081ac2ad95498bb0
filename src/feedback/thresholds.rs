//! Audience-specific performance thresholds.
//!
//! Defaults:
//!
//! | metric            | b2b      | b2c      |
//! |-------------------|----------|----------|
//! | `engagementScore` | >= 40    | >= 30    |
//! | `conversionRate`  | >= 2.0   | >= 1.5   |
//! | `leadQuality`     | >= 50    | -        |
//! | `socialShares`    | -        | >= 10    |
//! | `timeOnPage`      | >= 120   | >= 60    |
//! | `bounceRate`      | <= 60    | <= 70    |

use crate::constants::metric_keys::*;
use crate::models::{Audience, MetricMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    /// Value must be at least the threshold
    Minimum,
    /// Value must not exceed the threshold (ceilings such as bounce rate)
    Maximum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricThreshold {
    pub metric: String,
    pub kind: ThresholdKind,
    pub value: f64,
}

impl MetricThreshold {
    pub fn min(metric: &str, value: f64) -> Self {
        Self {
            metric: metric.to_string(),
            kind: ThresholdKind::Minimum,
            value,
        }
    }

    pub fn max(metric: &str, value: f64) -> Self {
        Self {
            metric: metric.to_string(),
            kind: ThresholdKind::Maximum,
            value,
        }
    }

    pub fn is_breached(&self, observed: f64) -> bool {
        match self.kind {
            ThresholdKind::Minimum => observed < self.value,
            ThresholdKind::Maximum => observed > self.value,
        }
    }

    /// Distance past the threshold relative to the threshold itself, 0 when met
    pub fn severity(&self, observed: f64) -> f64 {
        if !self.is_breached(observed) || self.value == 0.0 {
            return 0.0;
        }
        ((observed - self.value) / self.value).abs()
    }
}

/// Outcome of checking one metric map against an audience's thresholds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThresholdEvaluation {
    /// Metrics that had a threshold and were checked
    pub analyzed: Vec<String>,
    /// Metrics that breached their threshold, ordered by name
    pub breached: Vec<String>,
}

impl ThresholdEvaluation {
    pub fn has_breaches(&self) -> bool {
        !self.breached.is_empty()
    }

    pub fn breach_ratio(&self) -> f64 {
        if self.analyzed.is_empty() {
            0.0
        } else {
            self.breached.len() as f64 / self.analyzed.len() as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudienceThresholds {
    pub b2b: Vec<MetricThreshold>,
    pub b2c: Vec<MetricThreshold>,
}

impl Default for AudienceThresholds {
    fn default() -> Self {
        Self {
            b2b: vec![
                MetricThreshold::min(ENGAGEMENT_SCORE, 40.0),
                MetricThreshold::min(CONVERSION_RATE, 2.0),
                MetricThreshold::min(LEAD_QUALITY, 50.0),
                MetricThreshold::min(TIME_ON_PAGE, 120.0),
                MetricThreshold::max(BOUNCE_RATE, 60.0),
            ],
            b2c: vec![
                MetricThreshold::min(ENGAGEMENT_SCORE, 30.0),
                MetricThreshold::min(CONVERSION_RATE, 1.5),
                MetricThreshold::min(SOCIAL_SHARES, 10.0),
                MetricThreshold::min(TIME_ON_PAGE, 60.0),
                MetricThreshold::max(BOUNCE_RATE, 70.0),
            ],
        }
    }
}

impl AudienceThresholds {
    pub fn for_audience(&self, audience: Audience) -> &[MetricThreshold] {
        match audience {
            Audience::B2b => &self.b2b,
            Audience::B2c => &self.b2c,
        }
    }

    pub fn threshold(&self, audience: Audience, metric: &str) -> Option<&MetricThreshold> {
        self.for_audience(audience)
            .iter()
            .find(|threshold| threshold.metric == metric)
    }

    /// Check every metric that has a threshold; metrics without one are
    /// ignored, and so are NaN or infinite readings
    pub fn evaluate(&self, audience: Audience, metrics: &MetricMap) -> ThresholdEvaluation {
        let mut evaluation = ThresholdEvaluation::default();

        for (name, value) in metrics {
            if !value.is_finite() {
                debug!(metric = %name, value = %value, "Skipping non-finite metric");
                continue;
            }
            if let Some(threshold) = self.threshold(audience, name) {
                evaluation.analyzed.push(name.clone());
                if threshold.is_breached(*value) {
                    evaluation.breached.push(name.clone());
                }
            }
        }

        evaluation
    }
}
