//! Configuration for the description service

use serde::{Deserialize, Serialize};

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Which service describes snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescribeBackendKind {
    /// shelfsight relay (`POST /process-image`)
    Relay,
    /// OpenAI chat completions with image input
    OpenAi,
}

/// Description service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescribeConfig {
    pub backend: DescribeBackendKind,

    /// Relay base URL
    pub relay_url: String,

    /// OpenAI API base URL
    pub openai_base_url: String,

    /// Vision model name
    pub model: String,

    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Answer length limit
    pub max_tokens: u32,

    pub temperature: f32,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            backend: DescribeBackendKind::Relay,
            relay_url: "http://localhost:3000".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_tokens: 40,
            temperature: 0.3,
        }
    }
}

impl DescribeConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [("Relay URL", &self.relay_url), ("OpenAI base URL", &self.openai_base_url)] {
            if url.is_empty() {
                return Err(format!("{} cannot be empty", name));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("{} must start with http:// or https://", name));
            }
        }

        if self.model.is_empty() || self.model.len() > 100 {
            return Err("Model name must be 1-100 characters".to_string());
        }

        if !self
            .model
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err("Model name contains invalid characters".to_string());
        }

        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err("Timeout must be between 1 and 300 seconds".to_string());
        }

        if self.max_tokens == 0 || self.max_tokens > 4096 {
            return Err("Max tokens must be between 1 and 4096".to_string());
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("Temperature must be between 0.0 and 2.0".to_string());
        }

        Ok(())
    }

    /// API key from the config, else from the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
    }
}
