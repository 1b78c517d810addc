//! LLM clients for answer synthesis.
//!
//! A client turns a prompt into a single text completion under a
//! provider/model identity. Implementations: dummy (dev/test), Ollama
//! (local inference), and OpenAI-compatible APIs. The provider is picked
//! from settings at startup.

mod dummy;
mod ollama;
mod openai;

pub use dummy::DummyLlmClient;
pub use ollama::OllamaLlmClient;
pub use openai::OpenAiLlmClient;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Settings;
use crate::error::PipelineError;

/// Provider-agnostic generation knobs. Unknown options are ignored by
/// implementations that don't support them.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerateOptions {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Minimal interface for an LLM backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;

    /// Generate a single text completion for a prompt.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, LlmError>;
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unsupported LLM provider: {0}. Currently supported: 'dummy', 'ollama', 'openai'")]
    UnsupportedProvider(String),
    #[error("Missing configuration: {0}")]
    Config(String),
}

impl From<LlmError> for PipelineError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Connection(msg) | LlmError::Api(msg) => PipelineError::Transport(msg),
            LlmError::Parse(msg) => PipelineError::Parse(msg),
            other => PipelineError::Internal(other.to_string()),
        }
    }
}

/// Build the LLM client selected by settings.
pub fn create_llm_client(settings: &Settings) -> Result<Arc<dyn LlmClient>, LlmError> {
    match settings.llm_provider.as_str() {
        "dummy" | "dev" => Ok(Arc::new(DummyLlmClient::new(&settings.llm_model))),
        "ollama" => Ok(Arc::new(OllamaLlmClient::new(
            &settings.ollama_base_url,
            &settings.llm_model,
        ))),
        "openai" => {
            let api_key = settings
                .openai_api_key
                .clone()
                .ok_or_else(|| LlmError::Config("OPENAI_API_KEY is not set".to_string()))?;
            Ok(Arc::new(OpenAiLlmClient::new(
                api_key,
                &settings.openai_model,
            )))
        }
        other => Err(LlmError::UnsupportedProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_provider() {
        let mut settings = Settings {
            api_name: String::new(),
            api_version: String::new(),
            api_port: 0,
            database_url: String::new(),
            llm_provider: "dummy".to_string(),
            llm_model: "test-model".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4.1-mini".to_string(),
        };

        let client = create_llm_client(&settings).unwrap();
        assert_eq!(client.provider_name(), "dummy");
        assert_eq!(client.model_name(), "test-model");

        settings.llm_provider = "ollama".to_string();
        let client = create_llm_client(&settings).unwrap();
        assert_eq!(client.provider_name(), "ollama");

        settings.llm_provider = "openai".to_string();
        assert!(matches!(
            create_llm_client(&settings),
            Err(LlmError::Config(_))
        ));

        settings.openai_api_key = Some("sk-test".to_string());
        let client = create_llm_client(&settings).unwrap();
        assert_eq!(client.provider_name(), "openai");

        settings.llm_provider = "mystery".to_string();
        assert!(matches!(
            create_llm_client(&settings),
            Err(LlmError::UnsupportedProvider(_))
        ));
    }
}
