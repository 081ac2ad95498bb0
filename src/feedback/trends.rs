//! Trend analysis over the recorded performance time series.

use super::suggestions::suggestion_for;
use super::thresholds::AudienceThresholds;
use crate::constants::metric_keys::ENGAGEMENT_SCORE;
use crate::models::{Audience, MetricMap, PerformanceMetricRecord, TimeRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    Ok,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeTrend {
    pub content_type: String,
    pub data_points: usize,
    pub average_engagement: Option<f64>,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceInsight {
    pub audience: Audience,
    pub data_points: usize,
    pub average_metrics: MetricMap,
    /// Fraction of records with at least one breached threshold
    pub issue_rate: f64,
    /// Metric breached most often, if any was
    pub weakest_metric: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub status: TrendStatus,
    pub time_range: Option<TimeRange>,
    pub data_points: usize,
    pub content_type_trends: Vec<ContentTypeTrend>,
    pub audience_insights: Vec<AudienceInsight>,
    pub recommendations: Vec<String>,
}

impl TrendAnalysis {
    pub fn insufficient_data(time_range: Option<TimeRange>) -> Self {
        Self {
            status: TrendStatus::InsufficientData,
            time_range,
            data_points: 0,
            content_type_trends: Vec::new(),
            audience_insights: Vec::new(),
            recommendations: vec![
                "Not enough performance data in this window; record more results before drawing conclusions"
                    .to_string(),
            ],
        }
    }
}

/// Aggregate `records` (already filtered to the window)
pub fn analyze(
    records: &[PerformanceMetricRecord],
    time_range: Option<TimeRange>,
    thresholds: &AudienceThresholds,
    stability_band: f64,
) -> TrendAnalysis {
    if records.is_empty() {
        return TrendAnalysis::insufficient_data(time_range);
    }

    let mut sorted: Vec<&PerformanceMetricRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.recorded_at);

    let mut by_type: BTreeMap<&str, Vec<&PerformanceMetricRecord>> = BTreeMap::new();
    let mut by_audience: BTreeMap<Audience, Vec<&PerformanceMetricRecord>> = BTreeMap::new();
    for record in &sorted {
        by_type.entry(record.content_type.as_str()).or_default().push(record);
        by_audience.entry(record.audience).or_default().push(record);
    }

    let content_type_trends: Vec<ContentTypeTrend> = by_type
        .into_iter()
        .map(|(content_type, records)| content_type_trend(content_type, &records, stability_band))
        .collect();

    let audience_insights: Vec<AudienceInsight> = by_audience
        .into_iter()
        .map(|(audience, records)| audience_insight(audience, &records, thresholds))
        .collect();

    let recommendations = recommendations(&content_type_trends, &audience_insights);

    TrendAnalysis {
        status: TrendStatus::Ok,
        time_range,
        data_points: records.len(),
        content_type_trends,
        audience_insights,
        recommendations,
    }
}

/// Relative change of `later` against `earlier`, bucketed by the stability band
pub fn direction(earlier: f64, later: f64, stability_band: f64) -> TrendDirection {
    let change = if earlier == 0.0 {
        if later > 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        (later - earlier) / earlier.abs()
    };

    if change > stability_band {
        TrendDirection::Improving
    } else if change < -stability_band {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Mean of every metric across the records
pub fn average_metrics<'a>(records: impl IntoIterator<Item = &'a PerformanceMetricRecord>) -> MetricMap {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for record in records {
        for (name, value) in &record.metrics {
            let entry = sums.entry(name.clone()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(name, (sum, count))| (name, sum / count as f64))
        .collect()
}

fn engagement_mean(records: &[&PerformanceMetricRecord]) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|record| record.metrics.get(ENGAGEMENT_SCORE).copied())
        .collect();
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

// Records arrive sorted by `recorded_at`
fn content_type_trend(
    content_type: &str,
    records: &[&PerformanceMetricRecord],
    stability_band: f64,
) -> ContentTypeTrend {
    let (earlier, later) = records.split_at(records.len() / 2);
    let direction = match (engagement_mean(earlier), engagement_mean(later)) {
        (Some(before), Some(after)) => direction(before, after, stability_band),
        _ => TrendDirection::Stable,
    };

    ContentTypeTrend {
        content_type: content_type.to_string(),
        data_points: records.len(),
        average_engagement: engagement_mean(records),
        direction,
    }
}

fn audience_insight(
    audience: Audience,
    records: &[&PerformanceMetricRecord],
    thresholds: &AudienceThresholds,
) -> AudienceInsight {
    let mut breach_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut records_with_issues = 0;
    for record in records {
        let evaluation = thresholds.evaluate(audience, &record.metrics);
        if evaluation.has_breaches() {
            records_with_issues += 1;
        }
        for metric in evaluation.breached {
            *breach_counts.entry(metric).or_default() += 1;
        }
    }

    // Highest count wins; ties go to the alphabetically first metric
    let weakest_metric = breach_counts
        .iter()
        .max_by(|(name_a, count_a), (name_b, count_b)| count_a.cmp(count_b).then_with(|| name_b.cmp(name_a)))
        .map(|(name, _)| name.clone());

    AudienceInsight {
        audience,
        data_points: records.len(),
        average_metrics: average_metrics(records.iter().copied()),
        issue_rate: records_with_issues as f64 / records.len() as f64,
        weakest_metric,
    }
}

fn recommendations(trends: &[ContentTypeTrend], insights: &[AudienceInsight]) -> Vec<String> {
    let mut recommendations = Vec::new();

    for trend in trends {
        match trend.direction {
            TrendDirection::Declining => recommendations.push(format!(
                "Engagement for {} content is declining; refresh structure and openings",
                trend.content_type
            )),
            TrendDirection::Improving => recommendations.push(format!(
                "Engagement for {} content is improving; reuse its recent patterns",
                trend.content_type
            )),
            TrendDirection::Stable => {}
        }
    }

    for insight in insights {
        if let Some(metric) = &insight.weakest_metric {
            recommendations.push(format!(
                "{} content most often misses {}: {}",
                insight.audience.as_str().to_uppercase(),
                metric,
                suggestion_for(metric, insight.audience)
            ));
        }
    }

    if recommendations.is_empty() {
        recommendations.push("Performance is stable and within thresholds; keep the current strategy".to_string());
    }
    recommendations
}
