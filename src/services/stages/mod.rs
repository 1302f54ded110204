//! Pipeline stage implementations.
//!
//! Each stage reads and mutates the research record, consuming the external
//! generation/retrieval services through their ports. Stages never fail the
//! pipeline: every external degradation is logged on the record and replaced
//! with a documented fallback.

pub mod collection;
pub mod discovery;
pub mod experiment;
pub mod question;

pub use collection::CollectionStage;
pub use discovery::DiscoveryStage;
pub use experiment::ExperimentStage;
pub use question::QuestionStage;

use rand::rngs::StdRng;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::domain::models::StructuredValue;

/// Seeded random source shared by the stages that need jitter or synthetic
/// data. Injected at pipeline construction so sessions are reproducible.
pub type SharedRng = Arc<Mutex<StdRng>>;

/// Extract the list of entries from a structured generation result that may
/// be a mapping holding the list under `key`, a bare sequence, or absent.
pub(crate) fn structured_list(raw: Option<Value>, key: &str) -> Vec<Value> {
    match StructuredValue::classify(raw) {
        StructuredValue::Mapping(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        StructuredValue::Sequence(items) => items,
        StructuredValue::Absent => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_list_from_mapping() {
        let items = structured_list(Some(json!({"questions": [{"question": "q1"}]})), "questions");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_structured_list_from_bare_sequence() {
        let items = structured_list(Some(json!([{"question": "q1"}, {"question": "q2"}])), "questions");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_structured_list_degrades_to_empty() {
        assert!(structured_list(None, "questions").is_empty());
        assert!(structured_list(Some(json!("noise")), "questions").is_empty());
        assert!(structured_list(Some(json!({"other": 1})), "questions").is_empty());
    }
}
