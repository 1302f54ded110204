//! Port traits consumed by the pipeline.
//!
//! External collaborators (generation, retrieval) are passed into the
//! pipeline as explicit dependencies, never reached through ambient
//! singletons, so tests substitute scripted implementations freely.

pub mod generation;
pub mod retrieval;

pub use generation::GenerationService;
pub use retrieval::{FetchOutcome, RetrievalService, SearchHit};
