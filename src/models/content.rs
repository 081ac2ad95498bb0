//! Content requests and the artifact assembled from a pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use super::job::JobPriority;

/// Target audience of a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    B2b,
    B2c,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B2b => "b2b",
            Self::B2c => "b2c",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b2b" => Ok(Self::B2b),
            "b2c" => Ok(Self::B2c),
            _ => Err(format!("Invalid audience: {s}")),
        }
    }
}

/// A content generation request as submitted by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub topic: String,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default = "default_content_type", alias = "contentType")]
    pub content_type: String,
    /// Workflow to run; the configured default is used when absent
    #[serde(default, alias = "workflowType")]
    pub workflow_type: Option<String>,
    #[serde(default, alias = "keyPoints")]
    pub key_points: Vec<String>,
    #[serde(default = "default_tone", alias = "toneOfVoice")]
    pub tone_of_voice: String,
    #[serde(default = "default_llm_target", alias = "llmTarget")]
    pub llm_target: String,
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default, alias = "projectId")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub priority: Option<JobPriority>,
    /// Free-form options forwarded to collaborators
    #[serde(default)]
    pub options: HashMap<String, Value>,
}

fn default_content_type() -> String {
    "blog_post".to_string()
}

fn default_tone() -> String {
    "professional".to_string()
}

fn default_llm_target() -> String {
    "general".to_string()
}

impl ContentRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            audience: Audience::default(),
            content_type: default_content_type(),
            workflow_type: None,
            key_points: Vec::new(),
            tone_of_voice: default_tone(),
            llm_target: default_llm_target(),
            user_id: None,
            project_id: None,
            priority: None,
            options: HashMap::new(),
        }
    }

    pub fn with_workflow(mut self, workflow_type: impl Into<String>) -> Self {
        self.workflow_type = Some(workflow_type.into());
        self
    }

    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }

    pub fn with_key_points(mut self, key_points: Vec<String>) -> Self {
        self.key_points = key_points;
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub workflow_type: String,
    pub workflow_version: String,
    pub steps_applied: Vec<String>,
    pub word_count: usize,
    pub reading_time_minutes: usize,
    pub estimated_token_count: usize,
    pub llm_target: String,
}

/// Finished content artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub content_id: String,
    pub title: String,
    pub summary: String,
    pub sections: Vec<ContentSection>,
    pub content_type: String,
    pub audience: Audience,
    pub tone_of_voice: String,
    pub metadata: ContentMetadata,
    /// Raw output of every executed step, keyed by step name
    pub step_outputs: HashMap<String, Value>,
    pub generated_at: DateTime<Utc>,
}
