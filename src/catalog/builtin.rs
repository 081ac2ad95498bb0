//! Workflows shipped with the engine.

use crate::models::{Layer, WorkflowDefinition, WorkflowStep};

pub mod services {
    pub const INTENT_ANALYZER: &str = "intent-analyzer";
    pub const KEYWORD_RESEARCHER: &str = "keyword-researcher";
    pub const COMPETITOR_ANALYZER: &str = "competitor-analyzer";
    pub const CONTENT_STRUCTURER: &str = "content-structurer";
    pub const CONTENT_GENERATOR: &str = "content-generator";
    pub const SUMMARIZER: &str = "summarizer";
    pub const SEO_OPTIMIZER: &str = "seo-optimizer";
    pub const CITATION_SCORER: &str = "citation-scorer";
    pub const AUTHORITY_SCORER: &str = "authority-scorer";
    pub const FRESHNESS_SCORER: &str = "freshness-scorer";
}

use services::*;

pub fn builtin_workflows() -> Vec<WorkflowDefinition> {
    vec![standard(), quick(), comprehensive(), refresh()]
}

fn standard() -> WorkflowDefinition {
    WorkflowDefinition::new(
        "standard",
        "1.0.0",
        vec![
            WorkflowStep::new("intent_analysis", Layer::Bottom, INTENT_ANALYZER, &[]),
            WorkflowStep::new("keyword_research", Layer::Bottom, KEYWORD_RESEARCHER, &["intent_analysis"]),
            WorkflowStep::new(
                "content_structuring",
                Layer::Middle,
                CONTENT_STRUCTURER,
                &["intent_analysis", "keyword_research"],
            ),
            WorkflowStep::new("content_generation", Layer::Middle, CONTENT_GENERATOR, &["content_structuring"]),
            WorkflowStep::new("seo_optimization", Layer::Top, SEO_OPTIMIZER, &["content_generation"]),
            WorkflowStep::new("citation_scoring", Layer::Top, CITATION_SCORER, &["content_generation"]),
        ],
    )
    .with_description("Research, structure, draft and optimize a single article")
}

fn quick() -> WorkflowDefinition {
    WorkflowDefinition::new(
        "quick",
        "1.0.0",
        vec![
            WorkflowStep::new("intent_analysis", Layer::Bottom, INTENT_ANALYZER, &[]),
            WorkflowStep::new("content_generation", Layer::Middle, CONTENT_GENERATOR, &["intent_analysis"]),
        ],
    )
    .with_description("Low-latency draft without research or optimization")
}

fn comprehensive() -> WorkflowDefinition {
    WorkflowDefinition::new(
        "comprehensive",
        "1.0.0",
        vec![
            WorkflowStep::new("intent_analysis", Layer::Bottom, INTENT_ANALYZER, &[]),
            WorkflowStep::new("keyword_research", Layer::Bottom, KEYWORD_RESEARCHER, &["intent_analysis"]),
            WorkflowStep::new("competitor_analysis", Layer::Bottom, COMPETITOR_ANALYZER, &["intent_analysis"]),
            WorkflowStep::new(
                "content_structuring",
                Layer::Middle,
                CONTENT_STRUCTURER,
                &["keyword_research", "competitor_analysis"],
            ),
            WorkflowStep::new("content_generation", Layer::Middle, CONTENT_GENERATOR, &["content_structuring"]),
            WorkflowStep::new("summarization", Layer::Middle, SUMMARIZER, &["content_generation"]),
            WorkflowStep::new("seo_optimization", Layer::Top, SEO_OPTIMIZER, &["content_generation"]),
            WorkflowStep::new("citation_scoring", Layer::Top, CITATION_SCORER, &["content_generation"]),
            WorkflowStep::new(
                "authority_scoring",
                Layer::Top,
                AUTHORITY_SCORER,
                &["citation_scoring"],
            ),
            WorkflowStep::new("freshness_scoring", Layer::Top, FRESHNESS_SCORER, &["content_generation"]),
        ],
    )
    .with_description("Full research, drafting, optimization and authority pipeline")
}

fn refresh() -> WorkflowDefinition {
    WorkflowDefinition::new(
        "refresh",
        "1.0.0",
        vec![
            WorkflowStep::new("freshness_scoring", Layer::Top, FRESHNESS_SCORER, &[]),
            WorkflowStep::new("keyword_research", Layer::Bottom, KEYWORD_RESEARCHER, &["freshness_scoring"]),
            WorkflowStep::new("content_generation", Layer::Middle, CONTENT_GENERATOR, &["keyword_research"]),
            WorkflowStep::new("seo_optimization", Layer::Top, SEO_OPTIMIZER, &["content_generation"]),
        ],
    )
    .with_description("Update existing content that has gone stale")
}
