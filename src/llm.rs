//! Language-model boundary.
//!
//! The agent treats the model as an opaque service behind the
//! [`LlmClient`] trait: one blocking request, one untrusted text response.
//! [`HttpLlm`] speaks the OpenAI-compatible `/chat/completions` contract
//! (Mistral, OpenAI, local gateways) with an explicit timeout and no
//! retries. Tests substitute scripted implementations.
//!
//! Response cleanup shared by the extraction and translation callers
//! lives here too ([`strip_code_fences`]): models regularly wrap output
//! in markdown fences even when told not to.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;

/// A single-turn completion client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt and return the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Client for OpenAI-compatible chat-completion endpoints.
pub struct HttpLlm {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpLlm {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmClient for HttpLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Chat API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        let content = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing message content"))?;

        Ok(content.to_string())
    }
}

/// A client that always errors; used when `[llm] provider = "disabled"`.
pub struct DisabledLlm;

#[async_trait]
impl LlmClient for DisabledLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("LLM provider is disabled. Set [llm] provider in config.")
    }
}

/// Instantiate the client named by the configuration.
pub fn create_llm(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledLlm)),
        "openai" => Ok(Arc::new(HttpLlm::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

/// Remove a surrounding markdown code fence, if present.
///
/// Handles ```` ```json ````, ```` ```sql ```` and bare ```` ``` ````
/// openers, with or without a trailing fence.
pub fn strip_code_fences(raw: &str) -> String {
    let mut body = raw.trim();
    for opener in ["```json", "```sql", "```"] {
        if let Some(rest) = body.strip_prefix(opener) {
            body = rest;
            break;
        }
    }
    body = body.strip_suffix("```").unwrap_or(body);
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"name\": \"Jane\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"name\": \"Jane\"}");
    }

    #[test]
    fn strips_sql_fence() {
        let raw = "```sql\nSELECT * FROM cv_records LIMIT 10;\n```";
        assert_eq!(strip_code_fences(raw), "SELECT * FROM cv_records LIMIT 10;");
    }

    #[test]
    fn strips_bare_fence_without_newlines() {
        assert_eq!(strip_code_fences("```SELECT 1;```"), "SELECT 1;");
    }

    #[test]
    fn unfenced_text_is_untouched() {
        assert_eq!(strip_code_fences("  SELECT 1;  "), "SELECT 1;");
    }

    #[tokio::test]
    async fn disabled_llm_errors() {
        let err = DisabledLlm.complete("hi").await.unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }
}
