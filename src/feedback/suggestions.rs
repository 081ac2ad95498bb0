//! Improvement suggestions and automated improvement results.

use super::thresholds::{AudienceThresholds, ThresholdEvaluation};
use crate::constants::metric_keys::*;
use crate::error::ServiceError;
use crate::models::{Audience, MetricMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionPriority {
    Low,
    Medium,
    High,
}

impl SuggestionPriority {
    /// `high` above the high-water mark, `low` with no breaches, `medium` otherwise
    pub fn from_evaluation(evaluation: &ThresholdEvaluation, high_priority_ratio: f64) -> Self {
        if !evaluation.has_breaches() {
            Self::Low
        } else if evaluation.breach_ratio() > high_priority_ratio {
            Self::High
        } else {
            Self::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementSuggestion {
    pub metric: String,
    pub current_value: f64,
    pub threshold: f64,
    pub suggestion: String,
    /// Relative distance past the threshold; suggestions are ranked by it
    pub impact: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub analyzed: usize,
    pub below_threshold: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPlan {
    pub content_id: String,
    pub suggestions: Vec<ImprovementSuggestion>,
    pub priority: SuggestionPriority,
    pub metrics: MetricsSummary,
}

/// Ranked suggestions for every breached metric, most severe first
pub fn build_plan(
    content_id: &str,
    audience: Audience,
    metrics: &MetricMap,
    thresholds: &AudienceThresholds,
    high_priority_ratio: f64,
) -> ImprovementPlan {
    let evaluation = thresholds.evaluate(audience, metrics);

    let mut suggestions: Vec<ImprovementSuggestion> = evaluation
        .breached
        .iter()
        .filter_map(|metric| {
            let threshold = thresholds.threshold(audience, metric)?;
            let current_value = *metrics.get(metric)?;
            Some(ImprovementSuggestion {
                metric: metric.clone(),
                current_value,
                threshold: threshold.value,
                suggestion: suggestion_for(metric, audience).to_string(),
                impact: threshold.severity(current_value),
            })
        })
        .collect();
    suggestions.sort_by(|a, b| b.impact.total_cmp(&a.impact).then_with(|| a.metric.cmp(&b.metric)));

    ImprovementPlan {
        content_id: content_id.to_string(),
        priority: SuggestionPriority::from_evaluation(&evaluation, high_priority_ratio),
        metrics: MetricsSummary {
            analyzed: evaluation.analyzed.len(),
            below_threshold: evaluation.breached.len(),
        },
        suggestions,
    }
}

/// Remediation advice for one underperforming metric
pub fn suggestion_for(metric: &str, audience: Audience) -> &'static str {
    match (metric, audience) {
        (ENGAGEMENT_SCORE, Audience::B2b) => {
            "Lead with a concrete business problem and add data-backed examples"
        }
        (ENGAGEMENT_SCORE, Audience::B2c) => {
            "Open with a relatable story and add visuals to hold attention"
        }
        (CONVERSION_RATE, Audience::B2b) => {
            "Add a clear call to action tied to a demo, trial or consultation"
        }
        (CONVERSION_RATE, Audience::B2c) => {
            "Shorten the path to purchase and repeat the call to action near the end"
        }
        (BOUNCE_RATE, _) => "Tighten the introduction and match the headline promise in the first paragraph",
        (TIME_ON_PAGE, _) => "Break long sections up with subheadings, lists and examples",
        (LEAD_QUALITY, _) => "Target decision-maker keywords and gate in-depth resources",
        (SOCIAL_SHARES, _) => "Add shareable takeaways and social previews",
        _ => "Review this metric against comparable content and adjust structure",
    }
}

/// Generic guidance used when no matching history exists
pub fn fallback_guidance(audience: Audience) -> Vec<String> {
    let guidance: &[&str] = match audience {
        Audience::B2b => &[
            "Anchor each section in a measurable business outcome",
            "Cite industry data and authoritative sources",
            "Close with a clear next step for decision makers",
        ],
        Audience::B2c => &[
            "Keep paragraphs short and conversational",
            "Use visuals and concrete everyday examples",
            "Make the content easy to share",
        ],
    };
    guidance.iter().map(|line| line.to_string()).collect()
}

/// An automated change requested for a piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    /// Kind of change, e.g. `rewrite_introduction`
    pub kind: String,
    /// Metric the change targets, if any
    pub metric: Option<String>,
    #[serde(default)]
    pub parameters: Value,
}

impl Improvement {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            metric: None,
            parameters: Value::Null,
        }
    }

    pub fn for_metric(kind: &str, metric: &str) -> Self {
        Self {
            metric: Some(metric.to_string()),
            ..Self::new(kind)
        }
    }
}

/// Applies one improvement to a piece of content
#[async_trait]
pub trait ImprovementExecutor: Send + Sync {
    async fn apply(&self, content_id: &str, improvement: &Improvement) -> Result<Value, ServiceError>;
}

/// Default executor: records the request and reports success
#[derive(Debug, Default)]
pub struct LoggingImprovementExecutor;

#[async_trait]
impl ImprovementExecutor for LoggingImprovementExecutor {
    async fn apply(&self, content_id: &str, improvement: &Improvement) -> Result<Value, ServiceError> {
        info!(
            content_id = content_id,
            kind = %improvement.kind,
            metric = ?improvement.metric,
            "Applying automated improvement"
        );
        Ok(serde_json::json!({ "applied": improvement.kind }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedImprovement {
    pub improvement: Improvement,
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementStatus {
    Completed,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementReport {
    pub content_id: String,
    pub applied_improvements: Vec<AppliedImprovement>,
    pub summary: ImprovementSummary,
    pub status: ImprovementStatus,
}

impl ImprovementReport {
    pub fn from_results(content_id: &str, applied_improvements: Vec<AppliedImprovement>) -> Self {
        let succeeded = applied_improvements.iter().filter(|applied| applied.success).count();
        let total = applied_improvements.len();
        let status = if succeeded == total {
            ImprovementStatus::Completed
        } else {
            ImprovementStatus::Partial
        };

        Self {
            content_id: content_id.to_string(),
            applied_improvements,
            summary: ImprovementSummary {
                total,
                succeeded,
                failed: total - succeeded,
            },
            status,
        }
    }
}
