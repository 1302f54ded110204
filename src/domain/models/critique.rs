//! Critique models appended to the research record each cycle.

use serde::{Deserialize, Serialize};

/// Methodology critique after normalization. Every field is guaranteed
/// present; the score is clamped to `[0, 10]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologyCritique {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub biases: Vec<String>,
    pub missing_controls: Vec<String>,
    pub methodology_score: f64,
}

/// Results critique after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsCritique {
    pub statistical_validity: String,
    pub practical_significance: String,
    pub issues: Vec<String>,
    pub alternative_explanations: Vec<String>,
    pub results_score: f64,
}

/// One complete critique record. Append-only on the research record: the
/// critique log is a decision history, never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    pub methodology: MethodologyCritique,
    pub results: ResultsCritique,
    pub limitations: Vec<String>,
    /// Composite quality score in `[0, 10]`, rounded to one decimal.
    pub overall_score: f64,
    pub should_iterate: bool,
    pub recommendations: Vec<String>,
}
