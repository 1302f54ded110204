//! `sagan run` - execute one research session.
//!
//! Without a wired-up backend the session runs against the offline adapters:
//! every external call degrades to its documented fallback and the pipeline
//! completes on synthetic data, which exercises the full control flow.

use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::{OfflineGeneration, OfflineRetrieval};
use crate::domain::models::ResearchRecord;
use crate::infrastructure::config::ConfigLoader;
use crate::services::ResearchPipeline;

#[derive(Args)]
pub struct RunArgs {
    /// Config file path (defaults to the hierarchical project config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the iteration cap
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,
}

pub async fn execute(args: RunArgs, json: bool) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    ConfigLoader::validate(&config)?;

    let pipeline = ResearchPipeline::new(
        config,
        Arc::new(OfflineGeneration),
        Arc::new(OfflineRetrieval),
    );
    let record = pipeline.run().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record.snapshot())?);
    } else {
        print_summary(&record);
    }

    Ok(())
}

fn print_summary(record: &ResearchRecord) {
    let snapshot = record.snapshot();

    println!("Session {}", snapshot.session_id);
    println!(
        "Domain:    {}",
        snapshot.domain.as_deref().unwrap_or("(none)")
    );
    println!(
        "Question:  {}",
        snapshot.question.as_deref().unwrap_or("(none)")
    );
    println!(
        "Cycles:    {}/{}",
        snapshot.iteration_count, snapshot.max_iterations
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Confidence metric", "Score"]);
    for (metric, value) in &snapshot.confidence_scores {
        table.add_row(vec![
            Cell::new(metric),
            Cell::new(format!("{value:.1}%")),
        ]);
    }
    println!("{table}");

    if let Some(critique) = record.last_critique() {
        println!("Final quality score: {:.1}/10", critique.overall_score);
        println!("Recommendations:");
        for recommendation in &critique.recommendations {
            println!("  - {recommendation}");
        }
    }

    if let Some(results) = &record.experiment_results {
        println!(
            "Statistics: p={:.4}, effect size={:.3}, significant={}",
            results.statistical.p_value,
            results.statistical.effect_size,
            results.statistical.significant
        );
        println!("Interpretation: {}", results.interpretation);
    }
}
