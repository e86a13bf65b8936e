//! Client for the shelfsight relay (`POST /process-image`)

use crate::backends::{truncate_message, DescriptionBackend};
use crate::config::DescribeConfig;
use crate::error::{DescribeError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use shelfsight_core::{EncodedImage, FieldSelection};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RelayReply {
    description: Option<String>,
    error: Option<String>,
}

/// Uploads snapshots to a relay that talks to the vision model
pub struct RelayBackend {
    client: Client,
    url: String,
}

impl RelayBackend {
    pub fn new(config: &DescribeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/process-image", config.relay_url.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DescriptionBackend for RelayBackend {
    async fn describe_raw(&self, image: &EncodedImage, fields: &FieldSelection) -> Result<String> {
        let image_part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name())
            .mime_str(image.mime_type)?;
        let form = Form::new()
            .part("image", image_part)
            .text("fields", serde_json::to_string(fields)?);

        debug!("Uploading {} byte snapshot to {}", image.bytes.len(), self.url);
        let response = self.client.post(&self.url).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        let reply: Option<RelayReply> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let message = reply
                .and_then(|r| r.error)
                .unwrap_or_else(|| truncate_message(&body));
            return Err(DescribeError::Status {
                status: status.as_u16(),
                message,
            });
        }

        match reply {
            Some(RelayReply {
                description: Some(description),
                ..
            }) => Ok(description),
            Some(RelayReply { error: Some(error), .. }) => Err(DescribeError::InvalidResponse(error)),
            _ => Err(DescribeError::InvalidResponse(format!(
                "Missing description in relay reply: {}",
                truncate_message(&body)
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "relay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_path() {
        let config = DescribeConfig {
            relay_url: "http://relay.local:3000/".to_string(),
            ..Default::default()
        };
        let backend = RelayBackend::new(&config).unwrap();
        assert_eq!(backend.url(), "http://relay.local:3000/process-image");
    }
}
