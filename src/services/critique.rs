//! Critique and scoring engine.
//!
//! Converts possibly-malformed structured feedback from the generation
//! service into well-formed critiques, computes the bounded composite
//! quality score, and applies the iterate/stop decision rule. All
//! normalization is total: whatever shape the backend returns, the critique
//! appended to the record has every field populated and every score in
//! range.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::structured::{
    clamped_score_field, string_field, string_list_field, StructuredValue,
};
use crate::domain::models::{
    Critique, MethodologyCritique, ResearchRecord, ResultsCritique, StatisticalSummary,
};
use crate::domain::ports::GenerationService;

const CRITIQUE_TEMPERATURE: f32 = 0.6;

/// Score assumed when the backend supplies no usable methodology score.
const DEFAULT_METHODOLOGY_SCORE: f64 = 6.5;

/// Confidence assumed when the experiment stage recorded none.
const DEFAULT_CONFIDENCE: f64 = 0.5;

const BASE_LIMITATIONS: [&str; 5] = [
    "Limited sample size may affect generalizability",
    "Synthetic data components reduce real-world applicability",
    "Cross-sectional design limits causal inference",
    "Potential unmeasured confounding variables",
    "Limited external validity due to data sources",
];

const GENERAL_RECOMMENDATIONS: [&str; 3] = [
    "Increase sample size for more robust results",
    "Consider alternative statistical approaches",
    "Validate findings with independent dataset",
];

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize raw methodology feedback into a complete critique.
pub fn normalize_methodology(raw: Option<serde_json::Value>) -> MethodologyCritique {
    let map = StructuredValue::classify(raw).into_mapping("strengths");

    MethodologyCritique {
        strengths: string_list_field(
            &map,
            "strengths",
            &[
                "Clear hypothesis formulation",
                "Appropriate statistical test selected",
            ],
        ),
        weaknesses: string_list_field(
            &map,
            "weaknesses",
            &[
                "Limited sample size",
                "Potential confounding variables not addressed",
            ],
        ),
        biases: string_list_field(&map, "biases", &["Selection bias in data collection"]),
        missing_controls: string_list_field(
            &map,
            "missing_controls",
            &["Need for randomization", "Lack of blinding"],
        ),
        methodology_score: clamped_score_field(
            &map,
            "methodology_score",
            DEFAULT_METHODOLOGY_SCORE,
            0.0,
            10.0,
        ),
    }
}

/// Default results score when the backend supplies none: generous for a
/// significant result, middling otherwise.
fn default_results_score(p_value: f64) -> f64 {
    if p_value < 0.05 {
        7.0
    } else {
        6.0
    }
}

/// Normalize raw results feedback into a complete critique, using the
/// statistical summary for the p-value and effect-size dependent defaults.
pub fn normalize_results(
    raw: Option<serde_json::Value>,
    stats: &StatisticalSummary,
) -> ResultsCritique {
    let map = StructuredValue::classify(raw).into_mapping("issues");

    let validity_default = if stats.p_value < 0.10 {
        "Marginally significant"
    } else {
        "Not significant"
    };
    let practical_default = if stats.effect_size.abs() > 0.3 {
        "Moderate effect size"
    } else {
        "Small effect"
    };

    ResultsCritique {
        statistical_validity: string_field(&map, "statistical_validity", validity_default),
        practical_significance: string_field(&map, "practical_significance", practical_default),
        issues: string_list_field(
            &map,
            "issues",
            &["Limited statistical power", "Potential Type II error"],
        ),
        alternative_explanations: string_list_field(
            &map,
            "alternative_explanations",
            &["Random variation", "Unmeasured confounders"],
        ),
        results_score: clamped_score_field(
            &map,
            "results_score",
            default_results_score(stats.p_value),
            0.0,
            10.0,
        ),
    }
}

// ---------------------------------------------------------------------------
// Scoring and decision
// ---------------------------------------------------------------------------

/// Composite quality score: mean of the two critique scores plus a
/// confidence bonus of up to 2 points, clamped to `[0, 10]` and rounded to
/// one decimal. The clamp applies to the final score, so an out-of-range
/// confidence can never push the result past 10.
pub fn overall_score(methodology_score: f64, results_score: f64, confidence: f64) -> f64 {
    let confidence_bonus = confidence.min(1.0) * 2.0;
    let overall = (methodology_score + results_score) / 2.0 + confidence_bonus;
    (overall.clamp(0.0, 10.0) * 10.0).round() / 10.0
}

/// The iterate/stop decision. Rules are evaluated in order; the first match
/// wins. The p-value escape hatch (rule 5) only applies on the first pass,
/// and the hard iteration cap is always honored first.
pub fn decide_iteration(
    overall: f64,
    iteration_count: u32,
    max_iterations: u32,
    p_value: f64,
) -> bool {
    if iteration_count >= max_iterations {
        return false;
    }
    if iteration_count >= 1 && overall >= 6.5 {
        return false;
    }
    if iteration_count == 0 && overall < 6.0 {
        return true;
    }
    if overall >= 7.0 {
        return false;
    }
    if iteration_count == 0 && p_value > 0.10 {
        return true;
    }
    false
}

/// Fixed limitations list, with significance and effect-size caveats
/// appended when warranted, truncated to five entries with the base items
/// first.
pub fn limitations(stats: Option<&StatisticalSummary>) -> Vec<String> {
    let mut list: Vec<String> = BASE_LIMITATIONS.iter().map(|s| (*s).to_string()).collect();

    if let Some(stats) = stats {
        if stats.p_value > 0.05 {
            list.push("Results do not reach conventional statistical significance".to_string());
        }
        if stats.effect_size.abs() < 0.3 {
            list.push("Small effect size limits practical implications".to_string());
        }
    }

    list.truncate(5);
    list
}

/// Actionable recommendations: up to two methodology weaknesses and two
/// results issues rephrased as actions, then the general list, capped at
/// five.
pub fn recommendations(
    methodology: &MethodologyCritique,
    results: &ResultsCritique,
) -> Vec<String> {
    let mut recs = Vec::new();

    for weakness in methodology.weaknesses.iter().take(2) {
        recs.push(format!("Address {weakness} in next iteration"));
    }
    for issue in results.issues.iter().take(2) {
        recs.push(format!("Mitigate {issue} with additional analysis"));
    }
    recs.extend(GENERAL_RECOMMENDATIONS.iter().map(|s| (*s).to_string()));

    recs.truncate(5);
    recs
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The critique engine: drives both critique generations, normalizes their
/// output, and appends the scored critique to the record.
pub struct CritiqueEngine {
    generation: Arc<dyn GenerationService>,
}

impl CritiqueEngine {
    pub fn new(generation: Arc<dyn GenerationService>) -> Self {
        Self { generation }
    }

    /// Run the full critique pass for the current cycle.
    ///
    /// Appends the critique to the record, updates the `critique` confidence
    /// score, and sets the iterate recommendation. The controller enforces
    /// the iteration cap afterwards.
    pub async fn critique(&self, record: &mut ResearchRecord) -> DomainResult<()> {
        record.add_message("critic", "Initiating critical analysis");

        let stats = record
            .experiment_results
            .as_ref()
            .map(|r| r.statistical.clone())
            .unwrap_or_default();
        let confidence = record
            .experiment_results
            .as_ref()
            .map_or(DEFAULT_CONFIDENCE, |r| r.confidence);

        let methodology_prompt = self.methodology_prompt(record);
        let methodology_raw = self
            .generate_feedback(record, "critic", &methodology_prompt)
            .await;
        let methodology = normalize_methodology(methodology_raw);

        let results_prompt = self.results_prompt(record, &stats);
        let results_raw = self
            .generate_feedback(record, "critic", &results_prompt)
            .await;
        let results = normalize_results(results_raw, &stats);

        let overall = overall_score(methodology.methodology_score, results.results_score, confidence);
        let should_iterate = decide_iteration(
            overall,
            record.iteration_count,
            record.max_iterations,
            stats.p_value,
        );

        debug!(
            overall,
            should_iterate,
            iteration = record.iteration_count,
            "critique scored"
        );
        record.add_message(
            "critic",
            format!("Analysis complete. Overall quality score: {overall:.1}/10"),
        );
        if should_iterate {
            record.add_message("critic", "Recommending iteration to address identified issues");
        } else {
            record.add_message(
                "critic",
                "Research meets quality threshold or max iterations reached",
            );
        }

        let critique = Critique {
            limitations: limitations(Some(&stats)),
            recommendations: recommendations(&methodology, &results),
            methodology,
            results,
            overall_score: overall,
            should_iterate,
        };

        record.critiques.push(critique);
        record.set_confidence("critique", overall * 10.0);
        record.should_iterate = should_iterate;

        Ok(())
    }

    /// Call the generation service, degrading to `None` (and a session
    /// message) on failure so normalization fills in the defaults.
    async fn generate_feedback(
        &self,
        record: &mut ResearchRecord,
        stage: &str,
        prompt: &str,
    ) -> Option<serde_json::Value> {
        match self
            .generation
            .generate_structured(prompt, CRITIQUE_TEMPERATURE)
            .await
        {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "critique generation failed, using defaults");
                record.add_message(stage, format!("Critique generation degraded: {err}"));
                None
            }
        }
    }

    fn methodology_prompt(&self, record: &ResearchRecord) -> String {
        let hypothesis = record.hypothesis.as_deref().unwrap_or("Unknown");
        let design = record
            .experiment_design
            .as_ref()
            .and_then(|d| serde_json::to_string(d).ok())
            .unwrap_or_else(|| "None".to_string());

        format!(
            "Critically evaluate this experimental methodology:\n\n\
             Hypothesis: {hypothesis}\n\
             Methodology: {design}\n\n\
             Identify strengths, weaknesses, potential biases, and missing controls.\n\
             Return ONLY JSON:\n\
             {{\"strengths\": [...], \"weaknesses\": [...], \"biases\": [...], \
             \"missing_controls\": [...], \"methodology_score\": 0-10}}"
        )
    }

    fn results_prompt(&self, record: &ResearchRecord, stats: &StatisticalSummary) -> String {
        let interpretation = record
            .experiment_results
            .as_ref()
            .map_or("None", |r| r.interpretation.as_str());

        format!(
            "Critically evaluate these results:\n\n\
             P-value: {}\nEffect Size: {}\nInterpretation: {}\n\n\
             Assess statistical significance, practical significance, potential issues, \
             and alternative explanations.\n\
             Return ONLY JSON:\n\
             {{\"statistical_validity\": \"...\", \"practical_significance\": \"...\", \
             \"issues\": [...], \"alternative_explanations\": [...], \"results_score\": 0-10}}",
            stats.p_value, stats.effect_size, interpretation
        )
    }
}
