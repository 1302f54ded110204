//! The research record: the single mutable aggregate threaded through every
//! pipeline stage.
//!
//! One record exists per research session. It is created with defaults at
//! session start, mutated in place by each stage, and becomes conceptually
//! final once the controller reaches its terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::critique::Critique;
use super::experiment::{ExperimentDesign, ExperimentResults};

/// A candidate research domain surfaced by the discovery stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(rename = "domain")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_novelty")]
    pub novelty_score: f64,
    #[serde(default)]
    pub feasibility_score: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub potential_impact: String,
}

fn default_novelty() -> f64 {
    0.8
}

impl Domain {
    /// Combined selection score: novelty weighted over feasibility.
    pub fn combined_score(&self) -> f64 {
        0.7 * self.novelty_score + 0.3 * self.feasibility_score
    }
}

/// A candidate research question with peer-review scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchQuestion {
    pub question: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default = "default_question_score")]
    pub novelty_score: f64,
    #[serde(default = "default_question_score")]
    pub feasibility_score: f64,
    #[serde(default)]
    pub required_data: Vec<String>,
    #[serde(default)]
    pub peer_reviewed: bool,
}

fn default_question_score() -> f64 {
    0.7
}

impl ResearchQuestion {
    /// Mean of novelty and feasibility, used for selection and confidence.
    pub fn mean_score(&self) -> f64 {
        (self.novelty_score + self.feasibility_score) / 2.0
    }
}

/// A data source descriptor driving one collection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// Source kind: `arxiv`, `github`, `dataset`, or `web`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub expected_data: String,
}

/// One named dataset after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dataset {
    /// At least one element converted to a finite number.
    Numeric(Vec<f64>),
    /// Nothing converted; a truncated preview of the raw elements is kept
    /// for text inspection.
    Preview(Vec<Value>),
    /// The raw value was not a sequence and passed through unchanged.
    Raw(Value),
}

impl Dataset {
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric(values) => Some(values),
            _ => None,
        }
    }
}

/// Collected data in its cleaned form, keyed by dataset name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectedData {
    pub cleaned: BTreeMap<String, Dataset>,
    /// Whether the cleaned datasets were synthesized rather than retrieved.
    #[serde(default)]
    pub synthetic: bool,
}

impl CollectedData {
    /// Names of datasets with at least two numeric points, in key order.
    pub fn numeric_keys(&self) -> Vec<&str> {
        self.cleaned
            .iter()
            .filter(|(_, dataset)| dataset.as_numeric().is_some_and(|v| v.len() >= 2))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Timestamped audit message recorded by a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub timestamp: DateTime<Utc>,
    pub stage: String,
    pub text: String,
}

/// The mutable research record for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub session_id: Uuid,

    // Domain discovery
    pub discovered_domains: Vec<Domain>,
    pub selected_domain: Option<Domain>,

    // Question generation
    pub research_questions: Vec<ResearchQuestion>,
    pub selected_question: Option<ResearchQuestion>,

    // Data collection
    pub data_sources: Vec<DataSource>,
    pub collected_data: CollectedData,

    // Experiment
    pub hypothesis: Option<String>,
    pub experiment_design: Option<ExperimentDesign>,
    pub experiment_results: Option<ExperimentResults>,

    // Critique and iteration
    pub critiques: Vec<Critique>,
    pub iteration_count: u32,
    pub max_iterations: u32,

    // Confidence bookkeeping, values in [0, 100]
    pub confidence_scores: BTreeMap<String, f64>,

    // Control flow
    pub should_iterate: bool,
    pub is_complete: bool,

    // Audit trail
    pub messages: Vec<SessionMessage>,

    pub created_at: DateTime<Utc>,
}

impl ResearchRecord {
    /// Create a fresh record with all defaults and a fixed iteration cap.
    pub fn new(max_iterations: u32) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            discovered_domains: Vec::new(),
            selected_domain: None,
            research_questions: Vec::new(),
            selected_question: None,
            data_sources: Vec::new(),
            collected_data: CollectedData::default(),
            hypothesis: None,
            experiment_design: None,
            experiment_results: None,
            critiques: Vec::new(),
            iteration_count: 0,
            max_iterations,
            confidence_scores: BTreeMap::new(),
            should_iterate: true,
            is_complete: false,
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append an audit message.
    pub fn add_message(&mut self, stage: &str, text: impl Into<String>) {
        self.messages.push(SessionMessage {
            timestamp: Utc::now(),
            stage: stage.to_string(),
            text: text.into(),
        });
    }

    /// Record a named confidence score, clamped to `[0, 100]`.
    pub fn set_confidence(&mut self, metric: &str, value: f64) {
        self.confidence_scores
            .insert(metric.to_string(), value.clamp(0.0, 100.0));
    }

    /// The latest critique, if any cycle has completed.
    pub fn last_critique(&self) -> Option<&Critique> {
        self.critiques.last()
    }

    /// True once the iteration cap has been reached.
    pub fn at_iteration_cap(&self) -> bool {
        self.iteration_count >= self.max_iterations
    }

    /// Serializable status projection for external reporting. Excludes the
    /// numeric datasets and raw generated text.
    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            session_id: self.session_id,
            domain: self.selected_domain.as_ref().map(|d| d.name.clone()),
            question: self.selected_question.as_ref().map(|q| q.question.clone()),
            iteration_count: self.iteration_count,
            max_iterations: self.max_iterations,
            confidence_scores: self.confidence_scores.clone(),
            is_complete: self.is_complete,
        }
    }

    /// The complete, self-sufficient input for downstream report formatting.
    /// Only meaningful once the record is finalized.
    pub fn report_inputs(&self) -> ReportInputs {
        ReportInputs {
            experiment_results: self.experiment_results.clone(),
            final_critique: self.critiques.last().cloned(),
            confidence_scores: self.confidence_scores.clone(),
        }
    }
}

/// Status projection of a record, safe to hand to external observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub session_id: Uuid,
    pub domain: Option<String>,
    pub question: Option<String>,
    pub iteration_count: u32,
    pub max_iterations: u32,
    pub confidence_scores: BTreeMap<String, f64>,
    pub is_complete: bool,
}

/// Finalized inputs for report generation. The formatter must never need to
/// re-run any analysis from these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInputs {
    pub experiment_results: Option<ExperimentResults>,
    pub final_critique: Option<Critique>,
    pub confidence_scores: BTreeMap<String, f64>,
}
