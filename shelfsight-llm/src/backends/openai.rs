//! OpenAI vision backend (chat completions with an image input)

use crate::backends::{truncate_message, DescriptionBackend};
use crate::config::DescribeConfig;
use crate::error::{DescribeError, Result};
use crate::prompt::{system_prompt, user_prompt};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use shelfsight_core::{EncodedImage, FieldSelection};
use std::time::Duration;
use tracing::debug;

pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn new(config: &DescribeConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| DescribeError::MissingApiKey("OpenAI".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Chat completions request body for one snapshot
    pub fn request_body(&self, image: &EncodedImage, fields: &FieldSelection) -> Value {
        let data_url = format!("data:{};base64,{}", image.mime_type, STANDARD.encode(&image.bytes));
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt(fields) },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": user_prompt(fields) },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        })
    }
}

/// First choice's message content
fn extract_answer(json: &Value) -> Result<String> {
    let choices = json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| DescribeError::InvalidResponse("Invalid response format: no choices array".to_string()))?;

    let first = choices
        .first()
        .ok_or_else(|| DescribeError::InvalidResponse("No choices in response".to_string()))?;

    // null content means the model chose not to answer
    Ok(first
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string())
}

/// First characters of a key for logs; short keys are fully masked
fn key_hint(key: &str) -> String {
    if key.chars().count() > 8 {
        key.chars().take(8).collect()
    } else {
        "***".to_string()
    }
}

#[async_trait]
impl DescriptionBackend for OpenAiBackend {
    async fn describe_raw(&self, image: &EncodedImage, fields: &FieldSelection) -> Result<String> {
        let body = self.request_body(image, fields);

        debug!("Making request to OpenAI with key {}...", key_hint(&self.api_key));

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(DescribeError::RateLimit);
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(DescribeError::AuthenticationFailed);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DescribeError::Status {
                status: status.as_u16(),
                message: truncate_message(&text),
            });
        }

        let json: Value = response.json().await?;
        extract_answer(&json)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
