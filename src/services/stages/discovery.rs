//! Domain discovery stage.
//!
//! Scans the retrieval service for emerging research activity, asks the
//! generation service to extract candidate domains from the hits, and
//! selects the most promising one. Runs exactly once per session.

use chrono::{Datelike, Utc};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Domain, ResearchRecord};
use crate::domain::ports::{GenerationService, RetrievalService, SearchHit};

use super::{structured_list, SharedRng};

const DISCOVERY_TEMPERATURE: f32 = 0.9;

/// Queries issued per session, sampled from the base list.
const QUERIES_PER_SESSION: usize = 6;

/// Hits formatted into the extraction prompt.
const MAX_PROMPT_HITS: usize = 40;

pub struct DiscoveryStage {
    generation: Arc<dyn GenerationService>,
    retrieval: Arc<dyn RetrievalService>,
    rng: SharedRng,
}

impl DiscoveryStage {
    pub fn new(
        generation: Arc<dyn GenerationService>,
        retrieval: Arc<dyn RetrievalService>,
        rng: SharedRng,
    ) -> Self {
        Self {
            generation,
            retrieval,
            rng,
        }
    }

    pub async fn run(&self, record: &mut ResearchRecord) -> DomainResult<()> {
        record.add_message("discovery", "Scanning for emerging research domains");

        let hits = self.gather_hits(record).await;
        record.add_message(
            "discovery",
            format!("Found {} unique potential sources", hits.len()),
        );

        let mut domains = if hits.is_empty() {
            record.add_message("discovery", "No search results found, using fallback domains");
            fallback_domains()
        } else {
            let extracted = self.extract_domains(record, &hits).await;
            if extracted.is_empty() {
                record.add_message(
                    "discovery",
                    "Could not extract valid domains from search results, using fallback",
                );
                fallback_domains()
            } else {
                extracted
            }
        };

        // Selection by combined score, novelty weighted over feasibility.
        domains.sort_by(|a, b| {
            b.combined_score()
                .partial_cmp(&a.combined_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let selected = domains[0].clone();
        let confidence = selected.combined_score().clamp(0.0, 1.0);

        info!(domain = %selected.name, confidence, "domain selected");
        record.add_message(
            "discovery",
            format!("Selected domain: {} (confidence {:.0}%)", selected.name, confidence * 100.0),
        );

        record.discovered_domains = domains;
        record.selected_domain = Some(selected);
        record.set_confidence("domain_selection", confidence * 100.0);

        Ok(())
    }

    /// Issue the sampled queries and dedupe results by title.
    async fn gather_hits(&self, record: &mut ResearchRecord) -> Vec<SearchHit> {
        let queries = self.sample_queries();
        let mut hits = Vec::new();

        for query in &queries {
            match self.retrieval.search(query).await {
                Ok(results) => hits.extend(results),
                Err(err) => {
                    warn!(query = %query, error = %err, "search failed");
                    record.add_message("discovery", format!("Search failed for '{query}': {err}"));
                }
            }
        }

        let mut seen = HashSet::new();
        hits.retain(|hit| {
            let title = hit.title.trim().to_lowercase();
            title.len() > 10 && seen.insert(title)
        });
        hits
    }

    fn sample_queries(&self) -> Vec<String> {
        let year = Utc::now().year();
        let mut queries = vec![
            format!("breakthrough scientific discovery {year}"),
            format!("emerging AI research {year}"),
            format!("quantum computing advances {year}"),
            format!("biotech innovations {year}"),
            format!("climate tech breakthroughs {year}"),
            format!("new technology {year}"),
            format!("cutting edge research {year}"),
            format!("revolutionary science {year}"),
            format!("next generation technology {year}"),
            format!("innovative research {year}"),
        ];

        let mut rng = self.rng.lock().expect("rng lock");
        queries.shuffle(&mut *rng);
        queries.truncate(QUERIES_PER_SESSION);
        queries
    }

    async fn extract_domains(
        &self,
        record: &mut ResearchRecord,
        hits: &[SearchHit],
    ) -> Vec<Domain> {
        let formatted: Vec<String> = hits
            .iter()
            .take(MAX_PROMPT_HITS)
            .enumerate()
            .map(|(i, hit)| format!("{}. {}\n   {}", i + 1, hit.title, hit.snippet))
            .collect();

        let prompt = format!(
            "Extract 5-7 emerging scientific domains mentioned in these search results.\n\
             Be specific; only use domains actually present in the results.\n\n\
             Search Results:\n{}\n\n\
             Return ONLY a JSON array:\n\
             [{{\"domain\": \"...\", \"description\": \"...\", \"novelty_score\": 0.7-0.95, \
             \"keywords\": [...], \"potential_impact\": \"...\"}}]",
            formatted.join("\n\n")
        );

        let raw = match self
            .generation
            .generate_structured(&prompt, DISCOVERY_TEMPERATURE)
            .await
        {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "domain extraction failed");
                record.add_message("discovery", format!("Domain extraction degraded: {err}"));
                None
            }
        };

        structured_list(raw, "domains")
            .into_iter()
            .filter_map(|value| serde_json::from_value::<Domain>(value).ok())
            .filter(|domain| domain.name.trim().len() > 5)
            .collect()
    }
}

/// Fixed fallback domains used when search and extraction both degrade.
fn fallback_domains() -> Vec<Domain> {
    let entries: [(&str, &str, f64, &[&str], &str); 5] = [
        (
            "Quantum-Enhanced Machine Learning",
            "Integration of quantum computing principles with deep learning architectures",
            0.85,
            &["quantum", "ML", "hybrid algorithms"],
            "Revolutionary computational efficiency in AI training",
        ),
        (
            "Synthetic Biology for Carbon Capture",
            "Engineered organisms designed to sequester atmospheric CO2 at industrial scale",
            0.82,
            &["synthetic biology", "climate", "bioengineering"],
            "Scalable solution for climate change mitigation",
        ),
        (
            "Neuromorphic Computing Hardware",
            "Brain-inspired chip architectures for energy-efficient AI",
            0.88,
            &["neuromorphic", "hardware", "spiking networks"],
            "Orders of magnitude more efficient AI inference",
        ),
        (
            "AI-Driven Drug Repurposing",
            "Using large models to discover new applications for existing pharmaceuticals",
            0.79,
            &["AI", "drug discovery", "repurposing"],
            "Faster and cheaper treatment development",
        ),
        (
            "Molecular Data Storage",
            "Encoding digital information in synthetic DNA for ultra-dense long-term storage",
            0.91,
            &["DNA storage", "molecular computing", "data preservation"],
            "Exabyte-scale storage in microscopic volumes",
        ),
    ];

    entries
        .into_iter()
        .map(|(name, description, novelty, keywords, impact)| Domain {
            name: name.to_string(),
            description: description.to_string(),
            novelty_score: novelty,
            feasibility_score: 0.0,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            potential_impact: impact.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_domains_select_highest_novelty() {
        let domains = fallback_domains();
        let best = domains
            .iter()
            .max_by(|a, b| {
                a.combined_score()
                    .partial_cmp(&b.combined_score())
                    .unwrap()
            })
            .unwrap();
        assert_eq!(best.name, "Molecular Data Storage");
    }
}
