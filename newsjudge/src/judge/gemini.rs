use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{parse_verdict, BackendError, Judge};
use crate::verdict::Verdict;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Judge backed by the Gemini `generateContent` API.
///
/// `base_url` is the API root (e.g. `https://generativelanguage.googleapis.com/v1beta`);
/// the request goes to `{base_url}/models/{model}:generateContent`.
pub struct GeminiJudge {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    default_timeout: Duration,
    default_max_tokens: usize,
    default_temperature: f32,
    client: reqwest::Client,
}

impl GeminiJudge {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            default_timeout: Duration::from_secs(30),
            default_max_tokens: 1000,
            default_temperature: 0.3,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_defaults(
        mut self,
        timeout_secs: u64,
        max_tokens: usize,
        temperature: f32,
    ) -> Self {
        self.default_timeout = Duration::from_secs(timeout_secs);
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn call_failed(&self, message: impl Into<String>) -> BackendError {
        BackendError::Call {
            judge: self.name.clone(),
            message: message.into(),
        }
    }

    fn unusable(&self, reason: impl Into<String>) -> BackendError {
        BackendError::Unusable {
            judge: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Single-turn generation; returns the trimmed text of the first candidate
    async fn generate(&self, prompt: String) -> Result<String, BackendError> {
        tokio::time::timeout(self.default_timeout, self.request(prompt))
            .await
            .map_err(|_| BackendError::Timeout {
                judge: self.name.clone(),
                timeout: self.default_timeout,
            })?
    }

    async fn request(&self, prompt: String) -> Result<String, BackendError> {
        let req_body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: self.default_temperature,
                max_output_tokens: self.default_max_tokens,
            },
        };

        let url = self.endpoint();
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&req_body)
            .send()
            .await
            .map_err(|e| self.call_failed(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.call_failed(format!("Gemini API error {}: {} (URL: {})", status, body, url)));
        }

        let resp_body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| self.unusable(format!("failed to parse response: {}", e)))?;

        if let Some(usage) = &resp_body.usage_metadata {
            debug!(
                judge = %self.name,
                model = %self.model,
                prompt_tokens = usage.prompt_token_count.unwrap_or(0),
                completion_tokens = usage.candidates_token_count.unwrap_or(0),
                "gemini usage"
            );
        }

        let candidate = resp_body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| self.unusable("response has no candidates"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(self.unusable("empty candidate text"));
        }
        Ok(text.to_string())
    }
}

#[async_trait::async_trait]
impl Judge for GeminiJudge {
    fn name(&self) -> &str {
        &self.name
    }

    async fn neutralize(&self, text: &str) -> Result<String, BackendError> {
        let prompt = format!(
            "Analyze this news content for neutrality and bias, then rewrite it in neutral, \
             fact-focused language without sensational wording. Reply with the rewritten text only.\n\n{}",
            text
        );
        self.generate(prompt).await
    }

    async fn verify(&self, claim: &str) -> Verdict {
        let prompt = format!("Fact check this claim and respond with TRUE or FALSE: {}", claim);
        match self.generate(prompt).await {
            Ok(answer) => {
                let verdict = parse_verdict(&answer);
                if verdict == Verdict::Unknown {
                    warn!(judge = %self.name, claim, answer = %answer, "could not parse fact-check answer");
                }
                verdict
            }
            Err(e) => {
                warn!(judge = %self.name, claim, error = %e, "fact-check call failed");
                Verdict::Unknown
            }
        }
    }
}

// Gemini API request/response structures
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<usize>,
    #[serde(default)]
    candidates_token_count: Option<usize>,
}
