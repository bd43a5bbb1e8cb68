use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{parse_verdict, BackendError, Judge};
use crate::verdict::Verdict;

pub const DEFAULT_MODEL: &str = "gpt-4";

const NEUTRALIZE_SYSTEM_PROMPT: &str =
    "You are a neutral news analyzer focusing on fact-checking and bias removal. \
     Rewrite the article in neutral, fact-focused language without sensational wording. \
     Reply with the rewritten text only.";

const VERIFY_SYSTEM_PROMPT: &str = "You are a fact-checker. Respond with true or false.";

/// Judge backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiJudge {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    default_timeout: Duration,
    default_max_tokens: usize,
    default_temperature: f32,
    client: reqwest::Client,
}

impl OpenAiJudge {
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

    /// One system + user exchange; returns the trimmed assistant message.
    /// The timeout covers the request and reading the response body.
    async fn chat(&self, system: &str, user: String) -> Result<String, BackendError> {
        tokio::time::timeout(self.default_timeout, self.exchange(system, user))
            .await
            .map_err(|_| BackendError::Timeout {
                judge: self.name.clone(),
                timeout: self.default_timeout,
            })?
    }

    async fn exchange(&self, system: &str, user: String) -> Result<String, BackendError> {
        let req_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            max_tokens: Some(self.default_max_tokens),
            temperature: Some(self.default_temperature),
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&req_body)
            .send()
            .await
            .map_err(|e| self.call_failed(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.call_failed(format!("API error {}: {}", status, body)));
        }

        let resp_body: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.unusable(format!("failed to parse response: {}", e)))?;

        if let Some(usage) = &resp_body.usage {
            debug!(
                judge = %self.name,
                model = resp_body.model.as_deref().unwrap_or(&self.model),
                prompt_tokens = usage.prompt_tokens.unwrap_or(0),
                completion_tokens = usage.completion_tokens.unwrap_or(0),
                "chat completion usage"
            );
        }

        let choice = resp_body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.unusable("response has no choices"))?;

        let content = choice.message.content.trim().to_string();
        if content.is_empty() {
            return Err(self.unusable("empty message content"));
        }
        Ok(content)
    }
}

#[async_trait::async_trait]
impl Judge for OpenAiJudge {
    fn name(&self) -> &str {
        &self.name
    }

    async fn neutralize(&self, text: &str) -> Result<String, BackendError> {
        self.chat(NEUTRALIZE_SYSTEM_PROMPT, text.to_string()).await
    }

    async fn verify(&self, claim: &str) -> Verdict {
        let prompt = format!("Is this claim verifiable and accurate? {}", claim);
        match self.chat(VERIFY_SYSTEM_PROMPT, prompt).await {
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

// OpenAI API request/response structures
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<usize>,
    #[serde(default)]
    completion_tokens: Option<usize>,
}
