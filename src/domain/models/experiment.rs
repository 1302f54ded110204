//! Experiment design and result models.

use serde::{Deserialize, Serialize};

use super::analysis::DetailedAnalysis;

/// Hypothesis specification, normally produced by the generation service
/// with a templated fallback when the service degrades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisSpec {
    pub hypothesis: String,
    #[serde(default)]
    pub null_hypothesis: String,
    #[serde(default = "default_test_type")]
    pub test_type: String,
    #[serde(default)]
    pub expected_outcome: String,
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,
}

fn default_test_type() -> String {
    "t-test".to_string()
}

fn default_significance_level() -> f64 {
    0.05
}

impl HypothesisSpec {
    /// Fallback hypothesis when generation returns nothing usable.
    pub fn fallback(question: &str) -> Self {
        Self {
            hypothesis: format!(
                "There is a significant relationship between the variables relevant to: {question}"
            ),
            null_hypothesis: "There is no significant relationship between the variables"
                .to_string(),
            test_type: default_test_type(),
            expected_outcome: "Statistical significance at p < 0.05".to_string(),
            significance_level: default_significance_level(),
        }
    }
}

/// Methodology derived from the hypothesis and available data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Methodology {
    pub test_type: String,
    pub sample_size: usize,
    pub controls: String,
    pub procedure: String,
}

/// Split of dataset names into independent and dependent variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variables {
    pub independent: Vec<String>,
    pub dependent: Vec<String>,
}

/// Full experiment design recorded on the research record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentDesign {
    pub hypothesis: HypothesisSpec,
    pub methodology: Methodology,
    pub variables: Variables,
}

/// Top-level statistical summary, composed from the detailed analysis with
/// the t-test preferred and regression as fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    pub p_value: f64,
    pub effect_size: f64,
    pub significant: bool,
}

impl Default for StatisticalSummary {
    fn default() -> Self {
        // Neutral defaults: the experiment "found nothing" rather than failing.
        Self {
            p_value: 1.0,
            effect_size: 0.0,
            significant: false,
        }
    }
}

/// Results of one experiment pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub statistical: StatisticalSummary,
    pub interpretation: String,
    /// Confidence in the experiment outcome, in `[0, 1]`.
    pub confidence: f64,
    pub detailed: DetailedAnalysis,
}
