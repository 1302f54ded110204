//! Experiment design and execution stage.
//!
//! Formulates a hypothesis for the selected question, designs the
//! methodology, and drives the analysis engine over the cleaned datasets:
//! descriptive statistics for every numeric series, the Welch test over the
//! first two, regression and the correlation matrix across all of them. The
//! top-level statistical summary prefers the t-test and falls back to the
//! regression fit, degrading to neutral defaults when neither completed.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AnalysisConfig, AnalysisOutcome, DetailedAnalysis, ExperimentDesign, ExperimentResults,
    HypothesisSpec, Methodology, ResearchRecord, StatisticalSummary, StructuredValue, Variables,
};
use crate::domain::ports::GenerationService;
use crate::services::analysis;

const HYPOTHESIS_TEMPERATURE: f32 = 0.7;
const INTERPRETATION_TEMPERATURE: f32 = 0.7;
const INTERPRETATION_MAX_TOKENS: u32 = 2048;

pub struct ExperimentStage {
    generation: Arc<dyn GenerationService>,
    config: AnalysisConfig,
}

impl ExperimentStage {
    pub fn new(generation: Arc<dyn GenerationService>, config: AnalysisConfig) -> Self {
        Self { generation, config }
    }

    pub async fn run(&self, record: &mut ResearchRecord) -> DomainResult<()> {
        let question = record
            .selected_question
            .as_ref()
            .map_or_else(|| "Unknown".to_string(), |q| q.question.clone());
        let cleaned = record.collected_data.cleaned.clone();
        let dataset_names: Vec<String> = cleaned.keys().cloned().collect();

        record.add_message(
            "experiment",
            "Analyzing data structure and formulating hypothesis",
        );

        let hypothesis = self.formulate_hypothesis(record, &question, &dataset_names).await;
        record.add_message(
            "experiment",
            format!("Hypothesis: {}", hypothesis.hypothesis),
        );

        record.add_message("experiment", "Designing experimental protocol");
        let numeric: BTreeMap<String, Vec<f64>> = cleaned
            .iter()
            .filter_map(|(name, dataset)| {
                dataset
                    .as_numeric()
                    .filter(|values| values.len() >= 2)
                    .map(|values| (name.clone(), values.to_vec()))
            })
            .collect();

        let design = ExperimentDesign {
            methodology: Methodology {
                test_type: hypothesis.test_type.clone(),
                sample_size: numeric.values().map(Vec::len).sum(),
                controls: "Standard statistical controls applied".to_string(),
                procedure: format!(
                    "Perform {} analysis on available datasets",
                    hypothesis.test_type
                ),
            },
            variables: identify_variables(&numeric),
            hypothesis: hypothesis.clone(),
        };

        record.add_message("experiment", "Executing statistical analysis");
        let detailed = self.analyze(&numeric);
        let statistical = compose_summary(&detailed);

        let test_degraded = detailed
            .t_test
            .as_ref()
            .map_or(true, |t| !t.is_completed());
        if test_degraded {
            record.add_message(
                "experiment",
                "Statistical test could not be completed, continuing with neutral defaults",
            );
        }

        record.add_message("experiment", summarize(&detailed));
        record.add_message("experiment", "Analysis complete, interpreting results");

        let interpretation = self
            .interpret(record, &hypothesis, &statistical)
            .await;
        let confidence = confidence_from(&statistical);

        info!(
            p_value = statistical.p_value,
            effect_size = statistical.effect_size,
            confidence,
            "experiment complete"
        );
        record.add_message(
            "experiment",
            format!("Experiment complete (confidence: {:.0}%)", confidence * 100.0),
        );

        record.hypothesis = Some(hypothesis.hypothesis.clone());
        record.experiment_design = Some(design);
        record.experiment_results = Some(ExperimentResults {
            statistical,
            interpretation,
            confidence,
            detailed,
        });
        record.set_confidence("experiment", confidence * 100.0);

        Ok(())
    }

    async fn formulate_hypothesis(
        &self,
        record: &mut ResearchRecord,
        question: &str,
        dataset_names: &[String],
    ) -> HypothesisSpec {
        let prompt = format!(
            "Based on this research question and available data, formulate a testable \
             hypothesis.\n\n\
             Question: {question}\nAvailable Data: {dataset_names:?}\n\n\
             Return ONLY JSON:\n\
             {{\"hypothesis\": \"...\", \"null_hypothesis\": \"...\", \
             \"test_type\": \"t-test|correlation|regression|anova\", \
             \"expected_outcome\": \"...\", \"significance_level\": 0.05}}"
        );

        let raw = match self
            .generation
            .generate_structured(&prompt, HYPOTHESIS_TEMPERATURE)
            .await
        {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "hypothesis generation failed");
                record.add_message("experiment", format!("Hypothesis generation degraded: {err}"));
                None
            }
        };

        let map = StructuredValue::classify(raw).into_mapping("hypothesis");
        if map.contains_key("hypothesis") {
            if let Ok(spec) = serde_json::from_value::<HypothesisSpec>(serde_json::Value::Object(map))
            {
                return spec;
            }
        }
        HypothesisSpec::fallback(question)
    }

    /// Drive the analysis engine over the numeric datasets.
    fn analyze(&self, numeric: &BTreeMap<String, Vec<f64>>) -> DetailedAnalysis {
        let mut detailed = DetailedAnalysis::default();

        for (name, values) in numeric {
            if let Some(stats) = analysis::describe(values) {
                detailed.descriptive.insert(name.clone(), stats);
            }
        }

        let keys: Vec<&String> = numeric.keys().collect();
        if keys.len() < 2 {
            return detailed;
        }

        let cap = |values: &[f64], limit: usize| -> Vec<f64> {
            values.iter().copied().take(limit).collect()
        };

        let g1 = cap(&numeric[keys[0]], self.config.t_test_sample_cap);
        let g2 = cap(&numeric[keys[1]], self.config.t_test_sample_cap);
        detailed.group1_stats = analysis::describe(&g1);
        detailed.group2_stats = analysis::describe(&g2);
        detailed.t_test = Some(analysis::two_sample_test(&g1, &g2));

        let x = cap(&numeric[keys[0]], self.config.regression_sample_cap);
        let y = cap(&numeric[keys[1]], self.config.regression_sample_cap);
        detailed.linear_regression = Some(analysis::regress(&x, &y).into());

        let capped: BTreeMap<String, Vec<f64>> = numeric
            .iter()
            .map(|(name, values)| (name.clone(), cap(values, self.config.regression_sample_cap)))
            .collect();
        detailed.correlations = Some(analysis::correlate(&capped).into());

        detailed
    }

    async fn interpret(
        &self,
        record: &mut ResearchRecord,
        hypothesis: &HypothesisSpec,
        stats: &StatisticalSummary,
    ) -> String {
        let prompt = format!(
            "Interpret these experimental results in the context of the hypothesis.\n\n\
             Hypothesis: {}\nP-value: {}\nEffect Size: {}\nSignificant: {}\n\n\
             Provide a clear, scientific interpretation (2-3 sentences).",
            hypothesis.hypothesis, stats.p_value, stats.effect_size, stats.significant
        );

        let generated = match self
            .generation
            .generate_text(&prompt, INTERPRETATION_TEMPERATURE, INTERPRETATION_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "interpretation generation failed");
                record.add_message(
                    "experiment",
                    format!("Interpretation generation degraded: {err}"),
                );
                String::new()
            }
        };

        if !generated.trim().is_empty() {
            return generated;
        }

        if stats.significant {
            format!(
                "The results show statistical significance (p={:.4}), suggesting support for \
                 the hypothesis. The effect size of {:.3} indicates a meaningful practical \
                 impact.",
                stats.p_value, stats.effect_size
            )
        } else {
            format!(
                "The results do not show statistical significance (p={:.4}). The hypothesis \
                 cannot be supported with the current data and methodology.",
                stats.p_value
            )
        }
    }
}

/// First two numeric datasets become the compared variables, the rest are
/// treated as dependent.
fn identify_variables(numeric: &BTreeMap<String, Vec<f64>>) -> Variables {
    let keys: Vec<String> = numeric.keys().cloned().collect();
    if keys.len() > 2 {
        Variables {
            independent: keys[..2].to_vec(),
            dependent: keys[2..].to_vec(),
        }
    } else {
        Variables {
            independent: keys,
            dependent: Vec::new(),
        }
    }
}

/// Compose the top-level summary: t-test values when the test ran, the
/// regression fit (r-squared as effect size) as fallback, neutral defaults
/// otherwise.
pub fn compose_summary(detailed: &DetailedAnalysis) -> StatisticalSummary {
    if let Some(t_test) = &detailed.t_test {
        return StatisticalSummary {
            p_value: t_test.p_value,
            effect_size: t_test.effect_size,
            significant: t_test.significant,
        };
    }

    if let Some(AnalysisOutcome::Completed(fit)) = &detailed.linear_regression {
        return StatisticalSummary {
            p_value: fit.p_value,
            effect_size: fit.r_squared,
            significant: fit.p_value < 0.05,
        };
    }

    StatisticalSummary::default()
}

/// Experiment confidence ladder over the statistical summary.
pub fn confidence_from(stats: &StatisticalSummary) -> f64 {
    let effect = stats.effect_size.abs();
    if stats.p_value < 0.01 && effect > 0.5 {
        0.90
    } else if stats.p_value < 0.05 && effect > 0.3 {
        0.75
    } else if stats.p_value < 0.10 {
        0.60
    } else {
        0.45
    }
}

/// Programmatic one-line summary of the detailed analysis.
fn summarize(detailed: &DetailedAnalysis) -> String {
    let mut parts = Vec::new();

    if let Some(t_test) = &detailed.t_test {
        if t_test.is_completed() {
            parts.push(format!(
                "T-test p={:.4}, effect size={:.3} ({})",
                t_test.p_value,
                t_test.effect_size,
                if t_test.significant {
                    "significant"
                } else {
                    "not significant"
                }
            ));
        } else {
            parts.push("T-test could not be completed.".to_string());
        }
    }

    match &detailed.linear_regression {
        Some(AnalysisOutcome::Completed(fit)) => {
            parts.push(format!(
                "Linear regression R^2={:.3}, p={:.4}",
                fit.r_squared, fit.p_value
            ));
        }
        Some(AnalysisOutcome::Failed { .. }) => {
            parts.push("Regression failed to fit.".to_string());
        }
        None => {}
    }

    if let Some(AnalysisOutcome::Completed(corr)) = &detailed.correlations {
        if !corr.strong_correlations.is_empty() {
            parts.push(format!(
                "Found strong correlations: {} pairs",
                corr.strong_correlations.len()
            ));
        }
    }

    if parts.is_empty() {
        "No statistical analysis performed.".to_string()
    } else {
        parts.join(" ")
    }
}
