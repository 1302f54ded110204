//! Port adapters.
//!
//! Real generation/retrieval backends live outside this crate; the adapters
//! here implement the ports for offline operation and scripted testing.

pub mod offline;
pub mod scripted;

pub use offline::{OfflineGeneration, OfflineRetrieval};
pub use scripted::{ScriptedGeneration, ScriptedRetrieval};
