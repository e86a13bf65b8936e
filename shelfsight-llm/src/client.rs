//! Description client used by the capture pipeline

use crate::backends::DescriptionBackend;
use crate::compose::compose_description;
use crate::error::Result;
use shelfsight_core::{EncodedImage, FieldSelection};
use std::sync::Arc;
use tracing::{info, warn};

/// Asks the backend once and composes the spoken description
#[derive(Clone)]
pub struct DescriptionClient {
    backend: Arc<dyn DescriptionBackend>,
}

impl DescriptionClient {
    pub fn new(backend: Arc<dyn DescriptionBackend>) -> Self {
        Self { backend }
    }

    /// Describe a snapshot; one attempt, no retries
    pub async fn describe(&self, image: &EncodedImage, fields: &FieldSelection) -> Result<String> {
        let raw = match self.backend.describe_raw(image, fields).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Description via {} failed: {}", self.backend.name(), e);
                return Err(e);
            }
        };
        let description = compose_description(&raw, fields);
        info!("Description: {}", description);
        Ok(description)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DescribeError;
    use async_trait::async_trait;
    use bytes::Bytes;

    struct FixedBackend(std::result::Result<&'static str, u16>);

    #[async_trait]
    impl DescriptionBackend for FixedBackend {
        async fn describe_raw(&self, _image: &EncodedImage, _fields: &FieldSelection) -> Result<String> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(DescribeError::Status {
                    status,
                    message: "boom".to_string(),
                }),
            }
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn image() -> EncodedImage {
        EncodedImage::jpeg(Bytes::from_static(b"jpeg"), 1, 1)
    }

    #[tokio::test]
    async fn test_describe_composes() {
        let client = DescriptionClient::new(Arc::new(FixedBackend(Ok("Milk, 1-2 months"))));
        let description = client.describe(&image(), &FieldSelection::default()).await.unwrap();
        assert_eq!(description, "Milk, expires in 1-2 months");
    }

    #[tokio::test]
    async fn test_describe_propagates_failure() {
        let client = DescriptionClient::new(Arc::new(FixedBackend(Err(500))));
        let result = client.describe(&image(), &FieldSelection::default()).await;
        assert!(matches!(result, Err(DescribeError::Status { status: 500, .. })));
    }
}
