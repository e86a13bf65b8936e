//! shelfsight-llm: remote object description
//!
//! A [`DescriptionBackend`] turns one snapshot plus a field selection into a
//! raw answer from a vision-language model. [`DescriptionClient`] normalizes
//! that answer and composes the sentence that gets spoken.

pub mod error;
pub mod config;
pub mod prompt;
pub mod compose;
pub mod backends;
pub mod client;
pub mod relay;

pub use error::{DescribeError, Result};
pub use config::{DescribeBackendKind, DescribeConfig};
pub use compose::{compose_description, normalize_answer};
pub use backends::{build_backend, DescriptionBackend};
pub use backends::openai::OpenAiBackend;
pub use backends::relay::RelayBackend;
pub use client::DescriptionClient;
pub use relay::relay_router;
