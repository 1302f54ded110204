//! Sagan - Autonomous Research Pipeline
//!
//! Sagan runs an automated, iterative research loop: discover a domain,
//! formulate a question and hypothesis, gather numeric data, run statistical
//! analysis, critique the outcome, and either iterate or finalize — bounded
//! by a hard iteration cap.
//!
//! # Architecture
//!
//! The crate follows hexagonal layering:
//!
//! - **Domain Layer** (`domain`): the research record, statistical result
//!   models, and the generation/retrieval port traits
//! - **Service Layer** (`services`): the analysis engine, the critique and
//!   scoring engine, the pipeline state machine, and the session registry
//! - **Adapters** (`adapters`): offline and scripted port implementations
//! - **Infrastructure Layer** (`infrastructure`): configuration loading
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sagan::adapters::{OfflineGeneration, OfflineRetrieval};
//! use sagan::domain::models::Config;
//! use sagan::services::ResearchPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = ResearchPipeline::new(
//!         Config::default(),
//!         Arc::new(OfflineGeneration),
//!         Arc::new(OfflineRetrieval),
//!     );
//!     let record = pipeline.run().await?;
//!     println!("{}", serde_json::to_string_pretty(&record.snapshot())?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, Critique, RecordSnapshot, ReportInputs, ResearchRecord, StatisticalSummary,
};
pub use domain::ports::{GenerationService, RetrievalService};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ResearchPipeline, SessionRegistry};
