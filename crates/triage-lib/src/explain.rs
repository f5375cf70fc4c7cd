//! Explanation service contract

use crate::error::ExplainError;

pub use async_trait::async_trait;

/// Opaque text-in/text-out assistant used to annotate issues
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, prompt: &str) -> Result<String, ExplainError>;
}
