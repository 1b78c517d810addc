//! Runtime configuration loaded from environment variables.
//!
//! Every setting has a default so the service starts with no configuration
//! at all; `.env` files are loaded by the binary before settings are read.

/// Service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// API metadata.
    pub api_name: String,
    pub api_version: String,

    /// Port the HTTP server binds to.
    pub api_port: u16,

    /// SQLite database path or `sqlite:` URL.
    pub database_url: String,

    /// LLM provider: "dummy", "ollama", or "openai".
    pub llm_provider: String,
    /// Model name for the dummy/ollama providers.
    pub llm_model: String,

    /// Ollama server base URL.
    pub ollama_base_url: String,

    /// OpenAI credentials (only used when `llm_provider` is "openai").
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl Settings {
    /// Base defaults without env overrides.
    fn base_default() -> Self {
        Self {
            api_name: "InquiryOS API".to_string(),
            api_version: env!("CARGO_PKG_VERSION").to_string(),
            api_port: 8000,
            database_url: "inquiryos.db".to_string(),
            llm_provider: "ollama".to_string(),
            llm_model: "llama3".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4.1-mini".to_string(),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars: `API_PORT`, `DATABASE_URL`, `LLM_PROVIDER`,
    /// `LLM_MODEL`, `OLLAMA_BASE_URL`, `OPENAI_API_KEY`, `OPENAI_MODEL`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("API_PORT") {
            if let Ok(port) = val.parse() {
                self.api_port = port;
            }
        }
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.database_url = val;
        }
        if let Ok(val) = std::env::var("LLM_PROVIDER") {
            self.llm_provider = val.to_lowercase();
        }
        if let Ok(val) = std::env::var("LLM_MODEL") {
            self.llm_model = val;
        }
        if let Ok(val) = std::env::var("OLLAMA_BASE_URL") {
            self.ollama_base_url = val;
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.openai_api_key = Some(val);
        }
        if let Ok(val) = std::env::var("OPENAI_MODEL") {
            self.openai_model = val;
        }
        self
    }

    /// Model in use for the configured provider.
    pub fn model_name(&self) -> &str {
        match self.llm_provider.as_str() {
            "openai" => &self.openai_model,
            _ => &self.llm_model,
        }
    }

    /// Provider label stamped on new runs, e.g. `"ollama:llama3"`.
    pub fn model_provider_label(&self) -> String {
        format!("{}:{}", self.llm_provider, self.model_name())
    }
}
