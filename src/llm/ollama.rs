//! LLM client for a local Ollama instance.
//!
//! API (simplified): `POST /api/generate` with
//! `{ "model": "...", "prompt": "...", "stream": false }`; the
//! non-streaming response carries the completion in `.response`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerateOptions, LlmClient, LlmError};

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

pub struct OllamaLlmClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaLlmClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        }
    }
}

#[async_trait]
impl LlmClient for OllamaLlmClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, LlmError> {
        let knobs = if options.max_tokens.is_some() || options.temperature.is_some() {
            Some(OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            })
        } else {
            None
        };

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: knobs,
        };

        let url = format!("{}/api/generate", self.base_url);
        debug!("Calling Ollama model {} at {}", self.model, url);

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = OllamaLlmClient::new("http://localhost:11434/", "llama3");
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.model_name(), "llama3");
    }

    #[test]
    fn test_request_serializes_options_only_when_set() {
        let request = OllamaRequest {
            model: "llama3".into(),
            prompt: "hi".into(),
            stream: false,
            options: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("options").is_none());

        let request = OllamaRequest {
            model: "llama3".into(),
            prompt: "hi".into(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: None,
                num_predict: Some(900),
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["options"]["num_predict"], 900);
    }
}
