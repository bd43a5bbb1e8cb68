use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Article-level trust label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCheckStatus {
    /// Not processed yet. Never a terminal value.
    #[default]
    Pending,
    Verified,
    PartiallyVerified,
    Uncertain,
    /// Processing failed before any verdict could be aggregated
    Error,
}

impl FactCheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactCheckStatus::Pending => "pending",
            FactCheckStatus::Verified => "verified",
            FactCheckStatus::PartiallyVerified => "partially_verified",
            FactCheckStatus::Uncertain => "uncertain",
            FactCheckStatus::Error => "error",
        }
    }
}

impl fmt::Display for FactCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Article record as delivered by a news fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub source_name: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "general".to_string()
}

/// An article flowing through the pipeline.
///
/// `url` identifies the article within a batch. Only `content` and
/// `fact_check_status` change after creation, and only inside the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub author: String,
    pub description: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub category: String,
    pub fact_check_status: FactCheckStatus,
}

impl Article {
    pub fn from_raw(raw: RawArticle) -> Self {
        Self {
            title: raw.title,
            content: raw.content,
            author: raw.author,
            description: raw.description,
            url: raw.url,
            published_at: raw.published_at,
            source_name: raw.source_name,
            category: raw.category,
            fact_check_status: FactCheckStatus::Pending,
        }
    }

    /// Text handed to the judges for neutralization
    pub fn analysis_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Article::from_raw(raw)
    }
}
