use std::sync::Arc;
use std::time::Duration;

use common::{JudgeBackend, JudgeConfig};

use crate::verdict::Verdict;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiJudge;
pub use openai::OpenAiJudge;

/// Capability implemented by every AI backend in the ensemble.
///
/// Implementations own their HTTP client and credentials and must be safe to
/// call concurrently.
#[async_trait::async_trait]
pub trait Judge: Send + Sync {
    /// Name used in logs and in per-claim verdict tables
    fn name(&self) -> &str;

    /// Rewrite text in neutral, fact-focused language
    async fn neutralize(&self, text: &str) -> Result<String, BackendError>;

    /// Judge a single claim. Failures are reported as [`Verdict::Unknown`],
    /// never as an error.
    async fn verify(&self, claim: &str) -> Verdict;
}

/// Failure of a judge's backend call
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("judge {judge} timed out after {timeout:?}")]
    Timeout { judge: String, timeout: Duration },

    #[error("judge {judge} call failed: {message}")]
    Call { judge: String, message: String },

    #[error("judge {judge} returned an unusable response: {reason}")]
    Unusable { judge: String, reason: String },
}

impl BackendError {
    pub fn judge(&self) -> &str {
        match self {
            BackendError::Timeout { judge, .. }
            | BackendError::Call { judge, .. }
            | BackendError::Unusable { judge, .. } => judge,
        }
    }
}

/// Read a true/false answer out of free text.
///
/// The first standalone `true` or `false` decides, flipped when directly
/// preceded by `not`. Without either word, a leading `yes`/`no` is accepted.
/// Anything else is `Unknown`.
pub fn parse_verdict(answer: &str) -> Verdict {
    let words: Vec<String> = answer
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    for (i, word) in words.iter().enumerate() {
        let value = match word.as_str() {
            "true" => true,
            "false" => false,
            _ => continue,
        };
        let negated = i > 0 && words[i - 1] == "not";
        return Verdict::from(value != negated);
    }

    match words.first().map(String::as_str) {
        Some("yes") => Verdict::True,
        Some("no") => Verdict::False,
        _ => Verdict::Unknown,
    }
}

/// Construct the judge described by `config`.
///
/// The API key is resolved by the caller; this function never reads the
/// environment.
pub fn build_judge(config: &JudgeConfig, api_key: impl Into<String>) -> Arc<dyn Judge> {
    let timeout_secs = config.timeout_seconds.unwrap_or(30);
    let max_tokens = config.max_tokens.unwrap_or(1000);
    let temperature = config.temperature.unwrap_or(0.3);

    match config.backend {
        JudgeBackend::Openai => {
            let model = config.model.clone().unwrap_or_else(|| openai::DEFAULT_MODEL.to_string());
            Arc::new(
                OpenAiJudge::new(&config.name, config.api_url_or_default(), api_key, model)
                    .with_defaults(timeout_secs, max_tokens, temperature),
            )
        }
        JudgeBackend::Gemini => {
            let model = config.model.clone().unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());
            Arc::new(
                GeminiJudge::new(&config.name, config.api_url_or_default(), api_key, model)
                    .with_defaults(timeout_secs, max_tokens, temperature),
            )
        }
    }
}
