//! Dev/test LLM client that never calls a real model.

use async_trait::async_trait;

use super::{GenerateOptions, LlmClient, LlmError};

/// Echo-style client for unit tests and local development.
pub struct DummyLlmClient {
    model: String,
}

impl DummyLlmClient {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for DummyLlmClient {
    fn provider_name(&self) -> &str {
        "dummy"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String, LlmError> {
        let mut snippet: String = prompt.trim().chars().take(200).collect();
        if prompt.trim().chars().count() > 200 {
            snippet.push('…');
        }

        Ok(format!(
            "[dummy completion from {}:{}] Prompt snippet: {}",
            self.provider_name(),
            self.model,
            snippet
        ))
    }
}
