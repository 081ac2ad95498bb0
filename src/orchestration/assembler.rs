//! Final content assembly from an accumulated pipeline context.
//!
//! `title`, `summary` and `sections` are taken from the most recent step output
//! that provides them. Anything no step produced falls back to a default
//! derived from the request.

use super::types::PipelineContext;
use crate::constants::defaults::{CHARS_PER_TOKEN, WORDS_PER_MINUTE};
use crate::models::{ContentMetadata, ContentRequest, ContentSection, GeneratedContent};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Default, Clone, Copy)]
pub struct ContentAssembler;

impl ContentAssembler {
    pub fn assemble(&self, context: &PipelineContext) -> GeneratedContent {
        let request = &context.request;

        let title = self
            .latest_string(context, "title")
            .unwrap_or_else(|| default_title(request));
        let summary = self
            .latest_string(context, "summary")
            .unwrap_or_else(|| default_summary(request));
        let sections = self
            .latest_sections(context)
            .unwrap_or_else(|| default_sections(request));

        let word_count: usize = sections
            .iter()
            .map(|section| section.content.split_whitespace().count())
            .sum();
        let char_count: usize = sections
            .iter()
            .map(|section| section.content.chars().count())
            .sum();

        let content_id = format!(
            "content_{}",
            context.job_id.unwrap_or_else(Uuid::new_v4).simple()
        );

        GeneratedContent {
            content_id,
            title,
            summary,
            sections,
            content_type: request.content_type.clone(),
            audience: request.audience,
            tone_of_voice: request.tone_of_voice.clone(),
            metadata: ContentMetadata {
                workflow_type: context.workflow_type.clone(),
                workflow_version: context.workflow_version.clone(),
                steps_applied: context.completed_steps.clone(),
                word_count,
                reading_time_minutes: (word_count / WORDS_PER_MINUTE).max(1),
                estimated_token_count: char_count / CHARS_PER_TOKEN,
                llm_target: request.llm_target.clone(),
            },
            step_outputs: context.outputs.clone(),
            generated_at: Utc::now(),
        }
    }

    /// Completed step outputs, most recent first
    fn outputs_newest_first<'a>(
        &self,
        context: &'a PipelineContext,
    ) -> impl Iterator<Item = &'a Value> + 'a {
        context
            .completed_steps
            .iter()
            .rev()
            .filter_map(|step| context.outputs.get(step))
    }

    fn latest_string(&self, context: &PipelineContext, field: &str) -> Option<String> {
        self.outputs_newest_first(context)
            .filter_map(|output| output.get(field).and_then(Value::as_str))
            .find(|value| !value.trim().is_empty())
            .map(str::to_string)
    }

    fn latest_sections(&self, context: &PipelineContext) -> Option<Vec<ContentSection>> {
        self.outputs_newest_first(context)
            .filter_map(|output| output.get("sections"))
            .filter_map(|sections| serde_json::from_value::<Vec<ContentSection>>(sections.clone()).ok())
            .find(|sections| !sections.is_empty())
    }
}

fn default_title(request: &ContentRequest) -> String {
    format!(
        "{}: A Comprehensive Guide for {} Success",
        request.topic,
        request.audience.as_str().to_uppercase()
    )
}

fn default_summary(request: &ContentRequest) -> String {
    format!(
        "This guide explores {} for {} audiences, with actionable strategies and practical implementation guidance.",
        request.topic, request.audience
    )
}

fn default_sections(request: &ContentRequest) -> Vec<ContentSection> {
    let topic = &request.topic;
    let audience = request.audience;

    let mut sections = vec![ContentSection {
        title: "Introduction".to_string(),
        content: format!(
            "Welcome to this guide on {topic}. It is written for a {audience} audience and focuses on insights you can act on."
        ),
    }];

    sections.extend(
        request
            .key_points
            .iter()
            .enumerate()
            .map(|(index, point)| ContentSection {
                title: format!("Key Focus Area {}: {point}", index + 1),
                content: format!(
                    "{point} is a critical aspect of {topic}. This section covers practical applications and proven strategies for this area."
                ),
            }),
    );

    sections.push(ContentSection {
        title: "Conclusion and Next Steps".to_string(),
        content: format!(
            "{topic} is a significant opportunity for {audience} organizations. Applying the practices outlined here leads to sustainable results."
        ),
    });

    sections
}
