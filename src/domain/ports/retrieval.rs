//! Retrieval service port.
//!
//! Abstraction over web search and page fetching. Fetch results are
//! validated defensively at the call site: only well-formed successful
//! outcomes contribute data, everything else is logged and skipped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub score: f64,
}

/// Outcome of fetching a single URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub success: bool,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FetchOutcome {
    /// A fetch that succeeded and actually carries content.
    pub fn usable_content(&self) -> Option<&str> {
        if self.success {
            self.content.as_deref().filter(|c| !c.is_empty())
        } else {
            None
        }
    }
}

/// Port trait for retrieval backends.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    /// Search for documents matching a query. An empty result list is a
    /// legal degraded outcome.
    async fn search(&self, query: &str) -> DomainResult<Vec<SearchHit>>;

    /// Fetch a single page.
    async fn fetch(&self, url: &str) -> DomainResult<FetchOutcome>;
}
