//! Data collection stage.
//!
//! Generates data-source descriptors for the selected question, searches and
//! fetches pages through the retrieval port, extracts numeric series from
//! page text, and cleans everything through the analysis engine. When too
//! little real numeric data survives, seeded synthetic datasets are
//! substituted so the experiment stage always has something to analyze —
//! with the degradation recorded and the collection confidence lowered.
//!
//! Fetches within a source are dispatched concurrently and merged by source
//! index, so results are deterministic regardless of completion order.

use futures::future::join_all;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{CollectedData, CollectionConfig, DataSource, ResearchRecord};
use crate::domain::ports::{GenerationService, RetrievalService};
use crate::services::analysis;

use super::SharedRng;

const SOURCE_TEMPERATURE: f32 = 0.7;

/// Confidence recorded when real numeric data was collected.
const COLLECTED_CONFIDENCE: f64 = 0.75;

/// Confidence recorded when the stage fell back to synthetic data.
const SYNTHETIC_CONFIDENCE: f64 = 0.50;

/// Points per synthetic dataset.
const SYNTHETIC_LEN: usize = 50;

pub struct CollectionStage {
    generation: Arc<dyn GenerationService>,
    retrieval: Arc<dyn RetrievalService>,
    rng: SharedRng,
    config: CollectionConfig,
}

impl CollectionStage {
    pub fn new(
        generation: Arc<dyn GenerationService>,
        retrieval: Arc<dyn RetrievalService>,
        rng: SharedRng,
        config: CollectionConfig,
    ) -> Self {
        Self {
            generation,
            retrieval,
            rng,
            config,
        }
    }

    pub async fn run(&self, record: &mut ResearchRecord) -> DomainResult<()> {
        let question = match &record.selected_question {
            Some(q) => q.question.clone(),
            None => {
                record.add_message("collection", "No question selected, using fallback");
                "How can emerging technologies be applied to solve current limitations?"
                    .to_string()
            }
        };
        let domain = record
            .selected_domain
            .as_ref()
            .map_or_else(|| "Unknown".to_string(), |d| d.name.clone());

        record.add_message("collection", "Initiating data collection protocol");

        let sources = {
            let generated = self.generate_sources(record, &question, &domain).await;
            if generated.is_empty() {
                fallback_sources(&question)
            } else {
                generated
            }
        };
        record.add_message(
            "collection",
            format!("Identified {} data sources", sources.len()),
        );

        let mut raw = Map::new();
        let source_count = sources.len().min(self.config.max_sources);
        for (idx, source) in sources.iter().take(self.config.max_sources).enumerate() {
            let label = idx + 1;
            record.add_message(
                "collection",
                format!("Collecting data from source {label}/{source_count}"),
            );

            let numbers = self.collect_from_source(record, source).await;
            if !numbers.is_empty() {
                let kind = if source.kind.is_empty() {
                    "web"
                } else {
                    source.kind.as_str()
                };
                raw.insert(format!("{kind}_source_{label}_numbers"), json!(numbers));
            }
        }

        record.add_message("collection", "Processing and cleaning collected data");

        let synthetic = raw.len() < 2;
        if synthetic {
            record.add_message("collection", "Generating synthetic data for analysis");
            raw = self.synthetic_datasets();
        }

        let cleaned = analysis::clean(&raw);
        let confidence = if synthetic {
            SYNTHETIC_CONFIDENCE
        } else {
            COLLECTED_CONFIDENCE
        };

        info!(datasets = cleaned.len(), synthetic, "data collection complete");
        record.add_message(
            "collection",
            format!("Data collection complete, {} datasets ready", cleaned.len()),
        );

        record.data_sources = sources;
        record.collected_data = CollectedData { cleaned, synthetic };
        record.set_confidence("data_collection", confidence * 100.0);

        Ok(())
    }

    async fn generate_sources(
        &self,
        record: &mut ResearchRecord,
        question: &str,
        domain: &str,
    ) -> Vec<DataSource> {
        let prompt = format!(
            "Given this research question, identify 3-5 diverse data sources that could \
             provide relevant information.\n\n\
             Question: {question}\nDomain: {domain}\n\n\
             Consider academic papers, public datasets, code repositories, and reports.\n\
             Return ONLY JSON:\n\
             {{\"data_sources\": [{{\"type\": \"arxiv|github|dataset|web\", \
             \"search_query\": \"...\", \"expected_data\": \"...\"}}]}}"
        );

        let raw = match self
            .generation
            .generate_structured(&prompt, SOURCE_TEMPERATURE)
            .await
        {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "source generation failed");
                record.add_message("collection", format!("Source generation degraded: {err}"));
                None
            }
        };

        super::structured_list(raw, "data_sources")
            .into_iter()
            .filter_map(|value| serde_json::from_value::<DataSource>(value).ok())
            .filter(|source| !source.search_query.trim().is_empty())
            .collect()
    }

    /// Collect numeric tokens from one source: snippets for archive-style
    /// sources, fetched page content otherwise.
    async fn collect_from_source(
        &self,
        record: &mut ResearchRecord,
        source: &DataSource,
    ) -> Vec<f64> {
        let hits = match self.retrieval.search(&source.search_query).await {
            Ok(hits) => hits,
            Err(err) => {
                warn!(query = %source.search_query, error = %err, "source search failed");
                record.add_message(
                    "collection",
                    format!("Search failed for '{}': {err}", source.search_query),
                );
                return Vec::new();
            }
        };

        if source.kind == "arxiv" {
            let text: String = hits
                .iter()
                .take(3)
                .map(|hit| format!("{} {}", hit.title, hit.snippet))
                .collect::<Vec<_>>()
                .join(" ");
            return analysis::extract_numbers(&text, self.config.numbers_per_source);
        }

        let urls: Vec<String> = hits
            .iter()
            .filter(|hit| !hit.url.is_empty())
            .take(self.config.pages_per_source)
            .map(|hit| hit.url.clone())
            .collect();

        // Fetches run concurrently; join_all preserves input order so the
        // merge below is deterministic by source index.
        let outcomes = join_all(urls.iter().map(|url| self.retrieval.fetch(url))).await;

        let mut numbers = Vec::new();
        for (url, outcome) in urls.iter().zip(outcomes) {
            match outcome {
                Ok(fetch) => {
                    if let Some(content) = fetch.usable_content() {
                        let remaining = self.config.numbers_per_source.saturating_sub(numbers.len());
                        numbers.extend(analysis::extract_numbers(content, remaining));
                    } else {
                        let reason = fetch
                            .error
                            .unwrap_or_else(|| "unknown error".to_string());
                        record.add_message(
                            "collection",
                            format!("Failed to scrape {url}: {reason}"),
                        );
                    }
                }
                Err(err) => {
                    record.add_message(
                        "collection",
                        format!("Scraper returned unexpected result for {url}, skipping: {err}"),
                    );
                }
            }
        }
        numbers
    }

    /// Three seeded normally-distributed datasets standing in for real
    /// measurements when collection degrades.
    fn synthetic_datasets(&self) -> Map<String, Value> {
        let mut rng = self.rng.lock().expect("rng lock");

        let mut series = |mean: f64, sd: f64| -> Value {
            let values: Vec<f64> = (0..SYNTHETIC_LEN)
                .map(|_| {
                    // Box-Muller transform
                    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
                    let u2: f64 = rng.gen();
                    mean + sd * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
                })
                .collect();
            json!(values)
        };

        let mut raw = Map::new();
        raw.insert("baseline_metrics".to_string(), series(100.0, 15.0));
        raw.insert("experimental_metrics".to_string(), series(110.0, 18.0));
        raw.insert("control_group".to_string(), series(95.0, 12.0));
        raw
    }
}

/// Fallback data sources derived from the question alone.
fn fallback_sources(question: &str) -> Vec<DataSource> {
    let truncated: String = question.chars().take(100).collect();
    vec![
        DataSource {
            kind: "arxiv".to_string(),
            search_query: truncated.clone(),
            expected_data: "Academic papers and research findings".to_string(),
        },
        DataSource {
            kind: "web".to_string(),
            search_query: format!("{truncated} research data"),
            expected_data: "Research reports and datasets".to_string(),
        },
        DataSource {
            kind: "github".to_string(),
            search_query: format!("{truncated} implementation"),
            expected_data: "Code repositories and documentation".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    use crate::adapters::offline::{OfflineGeneration, OfflineRetrieval};

    fn stage(seed: u64) -> CollectionStage {
        CollectionStage::new(
            Arc::new(OfflineGeneration::default()),
            Arc::new(OfflineRetrieval::default()),
            Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
            CollectionConfig::default(),
        )
    }

    #[test]
    fn test_fallback_sources_cover_three_kinds() {
        let sources = fallback_sources("What limits scalability?");
        let kinds: Vec<&str> = sources.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, vec!["arxiv", "web", "github"]);
    }

    #[test]
    fn test_synthetic_datasets_are_seeded_and_sized() {
        let first = stage(3).synthetic_datasets();
        let second = stage(3).synthetic_datasets();
        assert_eq!(first, second);

        let Value::Array(values) = &first["baseline_metrics"] else {
            panic!("expected array");
        };
        assert_eq!(values.len(), SYNTHETIC_LEN);
    }

    #[tokio::test]
    async fn test_offline_collection_degrades_to_synthetic() {
        let stage = stage(11);
        let mut record = ResearchRecord::new(2);

        stage.run(&mut record).await.unwrap();

        assert!(record.collected_data.synthetic);
        assert_eq!(record.collected_data.cleaned.len(), 3);
        assert!(record.collected_data.numeric_keys().len() >= 2);
        assert_eq!(
            record.confidence_scores["data_collection"],
            SYNTHETIC_CONFIDENCE * 100.0
        );
    }
}
