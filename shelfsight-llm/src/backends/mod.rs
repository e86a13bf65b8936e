//! Description service backends

pub mod relay;
pub mod openai;

use crate::config::{DescribeBackendKind, DescribeConfig};
use crate::error::{DescribeError, Result};
use async_trait::async_trait;
use shelfsight_core::{EncodedImage, FieldSelection};
use std::sync::Arc;

/// Remote service answering "what is this object" for one snapshot
#[async_trait]
pub trait DescriptionBackend: Send + Sync {
    /// Raw answer text; failures are never retried by the caller
    async fn describe_raw(&self, image: &EncodedImage, fields: &FieldSelection) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Build the configured backend
pub fn build_backend(config: &DescribeConfig) -> Result<Arc<dyn DescriptionBackend>> {
    config.validate().map_err(DescribeError::Config)?;
    match config.backend {
        DescribeBackendKind::Relay => Ok(Arc::new(relay::RelayBackend::new(config)?)),
        DescribeBackendKind::OpenAi => Ok(Arc::new(openai::OpenAiBackend::new(config)?)),
    }
}

/// Cap error bodies carried into error messages
pub(crate) fn truncate_message(text: &str) -> String {
    const MAX: usize = 500;
    if text.len() > MAX {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text[..end].to_string()
    } else {
        text.to_string()
    }
}
