//! Generation service port.
//!
//! Abstraction over the text/structured generation backend. The pipeline
//! never treats an empty or malformed result as fatal: every call site
//! defines a fallback value and records the degradation on the session.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::DomainResult;

/// Port trait for generation backends.
///
/// Implementations must be `Send + Sync` for concurrent use across tokio
/// tasks, and should enforce their own bounded timeouts — the pipeline does
/// not cancel in-flight calls.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate free text. An empty string is a legal degraded result.
    async fn generate_text(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> DomainResult<String>;

    /// Generate a structured value. The result may be a mapping, a sequence,
    /// or `Value::Null`; callers normalize through
    /// [`crate::domain::models::StructuredValue`].
    async fn generate_structured(&self, prompt: &str, temperature: f32) -> DomainResult<Value>;
}
