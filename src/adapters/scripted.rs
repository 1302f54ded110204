//! Scripted port implementations for tests.
//!
//! Responses are queued ahead of time and consumed in call order; an
//! exhausted queue degrades to the same empty results as the offline
//! adapters, so partial scripts exercise fallback paths deliberately.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{FetchOutcome, GenerationService, RetrievalService, SearchHit};

/// Generation backend replaying queued responses.
#[derive(Debug, Default)]
pub struct ScriptedGeneration {
    structured: Mutex<VecDeque<DomainResult<Value>>>,
    text: Mutex<VecDeque<DomainResult<String>>>,
}

impl ScriptedGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next structured response.
    pub fn push_structured(&self, value: Value) {
        self.structured.lock().expect("queue lock").push_back(Ok(value));
    }

    /// Queue a structured failure.
    pub fn push_structured_error(&self, message: &str) {
        self.structured
            .lock()
            .expect("queue lock")
            .push_back(Err(DomainError::GenerationFailed(message.to_string())));
    }

    /// Queue the next text response.
    pub fn push_text(&self, text: &str) {
        self.text
            .lock()
            .expect("queue lock")
            .push_back(Ok(text.to_string()));
    }
}

#[async_trait]
impl GenerationService for ScriptedGeneration {
    async fn generate_text(
        &self,
        _prompt: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> DomainResult<String> {
        self.text
            .lock()
            .expect("queue lock")
            .pop_front()
            .unwrap_or(Ok(String::new()))
    }

    async fn generate_structured(&self, _prompt: &str, _temperature: f32) -> DomainResult<Value> {
        self.structured
            .lock()
            .expect("queue lock")
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

/// Retrieval backend serving canned hits and pages.
#[derive(Debug, Default)]
pub struct ScriptedRetrieval {
    hits: Vec<SearchHit>,
    pages: HashMap<String, FetchOutcome>,
    fail_searches: bool,
}

impl ScriptedRetrieval {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these hits for every search.
    pub fn with_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.hits = hits;
        self
    }

    /// Make every search fail outright.
    pub fn with_search_failure(mut self) -> Self {
        self.fail_searches = true;
        self
    }

    /// Serve this page for the given URL.
    pub fn with_page(mut self, url: &str, content: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchOutcome {
                success: true,
                content: Some(content.to_string()),
                error: None,
            },
        );
        self
    }
}

#[async_trait]
impl RetrievalService for ScriptedRetrieval {
    async fn search(&self, query: &str) -> DomainResult<Vec<SearchHit>> {
        if self.fail_searches {
            return Err(DomainError::RetrievalFailed(format!(
                "search backend unavailable for '{query}'"
            )));
        }
        Ok(self.hits.clone())
    }

    async fn fetch(&self, url: &str) -> DomainResult<FetchOutcome> {
        Ok(self.pages.get(url).cloned().unwrap_or(FetchOutcome {
            success: false,
            content: None,
            error: Some("not scripted".to_string()),
        }))
    }
}
