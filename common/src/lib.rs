/*!
common/src/lib.rs

Shared configuration types for newsjudge.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges a default file with an override file
- Validation of the judge ensemble and endpoint URLs
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_NEWS_API_KEY_ENV: &str = "NEWS_API_KEY";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// News feed configuration section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsApiConfig {
    /// API root, `/top-headlines` is appended (default: https://newsapi.org/v2)
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Two-letter country code (default "us")
    pub country: Option<String>,
    pub category: Option<String>,
    pub page_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

/// Which backend protocol a judge speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeBackend {
    /// OpenAI-compatible chat completions endpoint
    Openai,
    /// Google Gemini generateContent endpoint
    Gemini,
}

/// One member of the judge ensemble (`[[judges]]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    pub name: String,
    pub backend: JudgeBackend,
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

impl JudgeConfig {
    /// Endpoint to call, falling back to the public endpoint of the backend
    pub fn api_url_or_default(&self) -> &str {
        match (&self.api_url, self.backend) {
            (Some(url), _) => url.as_str(),
            (None, JudgeBackend::Openai) => DEFAULT_OPENAI_URL,
            (None, JudgeBackend::Gemini) => DEFAULT_GEMINI_URL,
        }
    }

    /// Environment variable holding this judge's key
    pub fn api_key_env_or_default(&self) -> &str {
        match (&self.api_key_env, self.backend) {
            (Some(var), _) => var.as_str(),
            (None, JudgeBackend::Openai) => "OPENAI_API_KEY",
            (None, JudgeBackend::Gemini) => "GEMINI_API_KEY",
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum words for a sentence to count as a claim (default 6)
    pub min_claim_words: Option<usize>,
    /// Upper bound for any single judge call (default 60)
    pub judge_timeout_seconds: Option<u64>,
    /// Articles processed at the same time (default 4)
    pub article_concurrency: Option<usize>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub news_api: Option<NewsApiConfig>,
    #[serde(default)]
    pub judges: Vec<JudgeConfig>,
    pub pipeline: Option<PipelineConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Arrays such as
    /// `[[judges]]` are replaced wholesale, not appended.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Check the judge ensemble and every configured URL.
    pub fn validate(&self) -> Result<()> {
        if self.judges.is_empty() {
            anyhow::bail!("At least one [[judges]] entry is required");
        }

        let mut names = HashSet::new();
        for judge in &self.judges {
            if judge.name.trim().is_empty() {
                anyhow::bail!("Judge name must not be empty");
            }
            if !names.insert(judge.name.as_str()) {
                anyhow::bail!("Duplicate judge name: {}", judge.name);
            }
            url::Url::parse(judge.api_url_or_default())
                .with_context(|| format!("Invalid api_url for judge {}", judge.name))?;
        }

        if let Some(base) = self.news_api.as_ref().and_then(|n| n.base_url.as_deref()) {
            url::Url::parse(base).context("Invalid news_api.base_url")?;
        }

        if let Some(pipeline) = &self.pipeline {
            if pipeline.article_concurrency == Some(0) {
                anyhow::bail!("pipeline.article_concurrency must be at least 1");
            }
            if pipeline.judge_timeout_seconds == Some(0) {
                anyhow::bail!("pipeline.judge_timeout_seconds must be at least 1");
            }
        }

        Ok(())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
