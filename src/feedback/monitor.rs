//! # Feedback Monitor
//!
//! Ingests post-publication performance metrics into an append-only time
//! series, raises a `PerformanceIssueDetected` signal when a record breaches
//! its audience thresholds, and turns the history into suggestions and trends.

use super::suggestions::{
    build_plan, fallback_guidance, AppliedImprovement, Improvement, ImprovementExecutor,
    ImprovementPlan, ImprovementReport, ImprovementStatus, LoggingImprovementExecutor,
};
use super::trends::{self, average_metrics, TrendAnalysis};
use crate::config::FeedbackConfig;
use crate::constants::{events, metric_keys::*, metrics};
use crate::error::ServiceError;
use crate::events::{EngineEvent, EventPublisher, Telemetry};
use crate::logging::log_feedback_operation;
use crate::models::{Audience, MetricMap, PerformanceIssue, PerformanceMetricRecord, PerformanceSnapshot, TimeRange};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Where current metrics for a piece of content come from
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn collect(&self, content_id: &str, audience: Audience) -> Result<MetricMap, ServiceError>;
}

/// Deterministic stand-in for an analytics provider.
///
/// Values are derived from a hash of the content id, so the same content
/// always reports the same numbers. b2b content reports `leadQuality`, b2c
/// content reports `socialShares`.
#[derive(Debug, Default)]
pub struct SyntheticMetricsSource;

impl SyntheticMetricsSource {
    fn unit(content_id: &str, salt: &str) -> f64 {
        let mut hasher = DefaultHasher::new();
        content_id.hash(&mut hasher);
        salt.hash(&mut hasher);
        (hasher.finish() % 10_000) as f64 / 10_000.0
    }

    fn scaled(content_id: &str, metric: &str, low: f64, high: f64) -> f64 {
        let value = low + (high - low) * Self::unit(content_id, metric);
        (value * 100.0).round() / 100.0
    }
}

#[async_trait]
impl MetricsSource for SyntheticMetricsSource {
    async fn collect(&self, content_id: &str, audience: Audience) -> Result<MetricMap, ServiceError> {
        let mut metrics = MetricMap::new();
        let mut put = |name: &str, low: f64, high: f64| {
            metrics.insert(name.to_string(), Self::scaled(content_id, name, low, high));
        };

        match audience {
            Audience::B2b => {
                put(ENGAGEMENT_SCORE, 20.0, 90.0);
                put(CONVERSION_RATE, 0.5, 6.0);
                put(LEAD_QUALITY, 20.0, 95.0);
                put(TIME_ON_PAGE, 45.0, 300.0);
                put(BOUNCE_RATE, 25.0, 80.0);
            }
            Audience::B2c => {
                put(ENGAGEMENT_SCORE, 15.0, 95.0);
                put(CONVERSION_RATE, 0.3, 5.0);
                put(SOCIAL_SHARES, 0.0, 120.0);
                put(TIME_ON_PAGE, 20.0, 240.0);
                put(BOUNCE_RATE, 30.0, 85.0);
            }
        }

        Ok(metrics)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    /// Derived from recorded history for the content type and audience
    History,
    /// No matching history; generic guidance
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestions {
    pub content_type: String,
    pub audience: Audience,
    pub based_on_records: usize,
    pub average_metrics: MetricMap,
    pub suggestions: Vec<String>,
    pub source: SuggestionSource,
}

pub struct FeedbackMonitor {
    config: FeedbackConfig,
    records: RwLock<Vec<PerformanceMetricRecord>>,
    metrics_source: Arc<dyn MetricsSource>,
    executor: Arc<dyn ImprovementExecutor>,
    publisher: Option<EventPublisher>,
    telemetry: Telemetry,
}

impl std::fmt::Debug for FeedbackMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackMonitor")
            .field("config", &self.config)
            .field("records", &self.records.read().len())
            .finish()
    }
}

impl Default for FeedbackMonitor {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}

impl FeedbackMonitor {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            records: RwLock::new(Vec::new()),
            metrics_source: Arc::new(SyntheticMetricsSource),
            executor: Arc::new(LoggingImprovementExecutor),
            publisher: None,
            telemetry: Telemetry::default(),
        }
    }

    pub fn with_metrics_source(mut self, source: Arc<dyn MetricsSource>) -> Self {
        self.metrics_source = source;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn ImprovementExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Publish `PerformanceIssueDetected` on the engine event bus
    pub fn with_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub async fn collect_performance_metrics(
        &self,
        content_id: &str,
        audience: Audience,
    ) -> Result<PerformanceSnapshot, ServiceError> {
        let metrics = self.metrics_source.collect(content_id, audience).await?;
        debug!(content_id = content_id, audience = %audience, metrics = metrics.len(), "Collected performance metrics");

        Ok(PerformanceSnapshot {
            content_id: content_id.to_string(),
            audience,
            metrics,
            collected_at: Utc::now(),
        })
    }

    /// Append a record and check it against the audience thresholds.
    ///
    /// Returns the issue that was signalled, if any metric breached.
    pub fn record_content_performance(&self, record: PerformanceMetricRecord) -> Option<PerformanceIssue> {
        let evaluation = self.config.thresholds.evaluate(record.audience, &record.metrics);

        let issue = evaluation.has_breaches().then(|| PerformanceIssue {
            content_id: record.content_id.clone(),
            content_type: record.content_type.clone(),
            audience: record.audience,
            breached_metrics: evaluation.breached.clone(),
            detected_at: Utc::now(),
        });

        self.telemetry.event(
            events::PERFORMANCE_RECORDED,
            json!({
                "contentId": record.content_id,
                "contentType": record.content_type,
                "audience": record.audience,
                "analyzed": evaluation.analyzed.len(),
            }),
        );
        log_feedback_operation(
            "record_content_performance",
            &record.content_id,
            record.audience.as_str(),
            if issue.is_some() { "issue_detected" } else { "ok" },
            Some(&format!("breached={:?}", evaluation.breached)),
        );

        self.records.write().push(record);

        if let Some(issue) = &issue {
            self.signal_issue(issue);
        }
        issue
    }

    /// Ranked suggestions for a metrics snapshot
    pub fn generate_improvement_suggestions(&self, snapshot: &PerformanceSnapshot) -> ImprovementPlan {
        build_plan(
            &snapshot.content_id,
            snapshot.audience,
            &snapshot.metrics,
            &self.config.thresholds,
            self.config.high_priority_ratio,
        )
    }

    /// Attempt every improvement independently; one failure does not stop the rest
    pub async fn apply_automated_improvements(
        &self,
        content_id: &str,
        improvements: Vec<Improvement>,
    ) -> ImprovementReport {
        let attempts = improvements.into_iter().map(|improvement| async move {
            match self.executor.apply(content_id, &improvement).await {
                Ok(result) => AppliedImprovement {
                    improvement,
                    success: true,
                    result: Some(result),
                    error: None,
                },
                Err(e) => AppliedImprovement {
                    improvement,
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                },
            }
        });
        let report = ImprovementReport::from_results(content_id, join_all(attempts).await);

        self.telemetry.event(
            events::IMPROVEMENTS_APPLIED,
            json!({
                "contentId": content_id,
                "total": report.summary.total,
                "succeeded": report.summary.succeeded,
                "status": report.status,
            }),
        );
        log_feedback_operation(
            "apply_automated_improvements",
            content_id,
            "-",
            match report.status {
                ImprovementStatus::Completed => "completed",
                ImprovementStatus::Partial => "partial",
            },
            Some(&format!("{}/{} succeeded", report.summary.succeeded, report.summary.total)),
        );

        report
    }

    /// Trends over the records inside `time_range` (all records when `None`)
    pub fn analyze_performance_trends(&self, time_range: Option<TimeRange>) -> TrendAnalysis {
        let records: Vec<PerformanceMetricRecord> = self
            .records
            .read()
            .iter()
            .filter(|record| time_range.map_or(true, |range| range.contains(record.recorded_at)))
            .cloned()
            .collect();

        trends::analyze(
            &records,
            time_range,
            &self.config.thresholds,
            self.config.trend_stability_band,
        )
    }

    /// Suggestions from history for one content type and audience
    pub fn get_optimization_suggestions(&self, content_type: &str, audience: Audience) -> OptimizationSuggestions {
        let records = self.records.read();
        let matching: Vec<&PerformanceMetricRecord> = records
            .iter()
            .filter(|record| record.content_type == content_type && record.audience == audience)
            .collect();

        if matching.is_empty() {
            return OptimizationSuggestions {
                content_type: content_type.to_string(),
                audience,
                based_on_records: 0,
                average_metrics: MetricMap::new(),
                suggestions: fallback_guidance(audience),
                source: SuggestionSource::Fallback,
            };
        }

        let averages = average_metrics(matching.iter().copied());
        let plan = build_plan(
            content_type,
            audience,
            &averages,
            &self.config.thresholds,
            self.config.high_priority_ratio,
        );
        let mut suggestions: Vec<String> = plan
            .suggestions
            .into_iter()
            .map(|suggestion| suggestion.suggestion)
            .collect();
        if suggestions.is_empty() {
            suggestions.push(format!(
                "{content_type} content for {audience} meets every threshold on average; keep the current approach"
            ));
        }

        OptimizationSuggestions {
            content_type: content_type.to_string(),
            audience,
            based_on_records: matching.len(),
            average_metrics: averages,
            suggestions,
            source: SuggestionSource::History,
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }

    fn signal_issue(&self, issue: &PerformanceIssue) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(EngineEvent::PerformanceIssueDetected(issue.clone()));
        }

        self.telemetry.event(
            events::PERFORMANCE_ISSUE_DETECTED,
            json!({
                "contentId": issue.content_id,
                "contentType": issue.content_type,
                "audience": issue.audience,
                "breachedMetrics": issue.breached_metrics,
            }),
        );
        self.telemetry.metric(
            metrics::PERFORMANCE_ISSUE_COUNT,
            issue.breached_metrics.len() as f64,
            &[("audience", issue.audience.as_str()), ("content_type", issue.content_type.as_str())],
        );
    }
}
