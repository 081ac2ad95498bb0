//! Post-publication performance data consumed by the feedback monitor.

use super::content::Audience;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named numeric metrics, ordered by name for stable reporting
pub type MetricMap = BTreeMap<String, f64>;

/// One append-only entry of the performance time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetricRecord {
    pub content_id: String,
    pub content_type: String,
    pub audience: Audience,
    pub metrics: MetricMap,
    pub recorded_at: DateTime<Utc>,
}

impl PerformanceMetricRecord {
    pub fn new(
        content_id: impl Into<String>,
        content_type: impl Into<String>,
        audience: Audience,
        metrics: MetricMap,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            content_type: content_type.into(),
            audience,
            metrics,
            recorded_at: Utc::now(),
        }
    }
}

/// Point-in-time metrics gathered for one piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub content_id: String,
    pub audience: Audience,
    pub metrics: MetricMap,
    pub collected_at: DateTime<Utc>,
}

/// Signal raised when a recorded metric breaches its audience threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceIssue {
    pub content_id: String,
    pub content_type: String,
    pub audience: Audience,
    pub breached_metrics: Vec<String>,
    pub detected_at: DateTime<Utc>,
}

/// Inclusive time window used by trend analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window ending now and reaching `days` back
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Convenience for building metric maps in tests and callers
pub fn metric_map<const N: usize>(entries: [(&str, f64); N]) -> MetricMap {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
