//! Process-wide session registry.
//!
//! Maps session ids to their research records. Access is limited to
//! insert-on-create and read-by-id; sessions never share mutable state, so
//! the registry itself needs no coordination beyond the map lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{RecordSnapshot, ResearchRecord};

/// Shared handle to one session's record.
pub type RecordHandle = Arc<RwLock<ResearchRecord>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, RecordHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a fresh record, returning its handle.
    pub async fn create(&self, max_iterations: u32) -> RecordHandle {
        let record = ResearchRecord::new(max_iterations);
        let id = record.session_id;
        let handle = Arc::new(RwLock::new(record));

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, Arc::clone(&handle));
        handle
    }

    /// Look up a session by id.
    pub async fn get(&self, id: Uuid) -> Option<RecordHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).cloned()
    }

    /// Status snapshot for external reporting.
    pub async fn snapshot(&self, id: Uuid) -> DomainResult<RecordSnapshot> {
        let handle = self
            .get(id)
            .await
            .ok_or(DomainError::SessionNotFound(id))?;
        let record = handle.read().await;
        Ok(record.snapshot())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
