//! Offline port implementations.
//!
//! Used by the CLI when no real generation/retrieval backend is wired up,
//! and by tests exercising the degraded path. Every call returns the empty
//! result its port documents as a legal degraded outcome, so a full session
//! runs end to end on fallbacks and synthetic data alone.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{FetchOutcome, GenerationService, RetrievalService, SearchHit};

/// Generation backend that generates nothing.
#[derive(Debug, Default, Clone)]
pub struct OfflineGeneration;

#[async_trait]
impl GenerationService for OfflineGeneration {
    async fn generate_text(
        &self,
        _prompt: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> DomainResult<String> {
        Ok(String::new())
    }

    async fn generate_structured(&self, _prompt: &str, _temperature: f32) -> DomainResult<Value> {
        Ok(Value::Null)
    }
}

/// Retrieval backend that finds nothing.
#[derive(Debug, Default, Clone)]
pub struct OfflineRetrieval;

#[async_trait]
impl RetrievalService for OfflineRetrieval {
    async fn search(&self, _query: &str) -> DomainResult<Vec<SearchHit>> {
        Ok(Vec::new())
    }

    async fn fetch(&self, _url: &str) -> DomainResult<FetchOutcome> {
        Ok(FetchOutcome {
            success: false,
            content: None,
            error: Some("offline".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_generation_returns_empty_results() {
        let generation = OfflineGeneration;
        assert_eq!(generation.generate_text("p", 0.7, 100).await.unwrap(), "");
        assert_eq!(
            generation.generate_structured("p", 0.7).await.unwrap(),
            Value::Null
        );
    }

    #[tokio::test]
    async fn test_offline_retrieval_finds_nothing() {
        let retrieval = OfflineRetrieval;
        assert!(retrieval.search("anything").await.unwrap().is_empty());

        let fetch = retrieval.fetch("https://example.com").await.unwrap();
        assert!(!fetch.success);
        assert!(fetch.usable_content().is_none());
    }
}
