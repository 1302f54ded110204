//! The research pipeline: an explicit finite state machine sequencing the
//! stages of one research session.
//!
//! `Init -> Discover -> Question -> Collect -> Experiment -> Critique ->
//! Decide -> {Collect | Finalize} -> Done`. Discovery and question
//! generation run exactly once; the collect/experiment/critique sub-cycle
//! repeats until the critique engine stops recommending iteration or the
//! iteration cap is reached. The pipeline always terminates in at most
//! `max_iterations` cycles regardless of critique output.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, ResearchRecord};
use crate::domain::ports::{GenerationService, RetrievalService};
use crate::services::critique::CritiqueEngine;
use crate::services::registry::SessionRegistry;
use crate::services::stages::{
    CollectionStage, DiscoveryStage, ExperimentStage, QuestionStage, SharedRng,
};

/// Pipeline states. `Decide` is the only state with a conditional edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Discover,
    Question,
    Collect,
    Experiment,
    Critique,
    Decide,
    Finalize,
    Done,
}

/// One research pipeline instance. External collaborators are injected as
/// explicit dependencies so tests can substitute scripted implementations.
pub struct ResearchPipeline {
    config: Config,
    discovery: DiscoveryStage,
    question: QuestionStage,
    collection: CollectionStage,
    experiment: ExperimentStage,
    critic: CritiqueEngine,
}

impl ResearchPipeline {
    pub fn new(
        config: Config,
        generation: Arc<dyn GenerationService>,
        retrieval: Arc<dyn RetrievalService>,
    ) -> Self {
        let rng: SharedRng = Arc::new(Mutex::new(StdRng::seed_from_u64(config.seed)));

        Self {
            discovery: DiscoveryStage::new(
                Arc::clone(&generation),
                Arc::clone(&retrieval),
                Arc::clone(&rng),
            ),
            question: QuestionStage::new(Arc::clone(&generation), Arc::clone(&rng)),
            collection: CollectionStage::new(
                Arc::clone(&generation),
                Arc::clone(&retrieval),
                rng,
                config.collection.clone(),
            ),
            experiment: ExperimentStage::new(Arc::clone(&generation), config.analysis.clone()),
            critic: CritiqueEngine::new(generation),
            config,
        }
    }

    /// Run a complete session on a fresh record and return the finalized
    /// record.
    pub async fn run(&self) -> DomainResult<ResearchRecord> {
        let handle = Arc::new(RwLock::new(ResearchRecord::new(self.config.max_iterations)));
        self.drive(&handle).await?;
        let record = handle.read().await.clone();
        Ok(record)
    }

    /// Run a complete session registered for external status reporting.
    /// The record is inserted at creation; observers read snapshots by id
    /// between stage transitions.
    pub async fn run_in_registry(&self, registry: &SessionRegistry) -> DomainResult<Uuid> {
        let handle = registry.create(self.config.max_iterations).await;
        let session_id = handle.read().await.session_id;
        self.drive(&handle).await?;
        Ok(session_id)
    }

    /// Drive the state machine to `Done`. The record lock is held per stage:
    /// only the owning stage mutates the record, and only after all of its
    /// own concurrent sub-calls completed.
    async fn drive(&self, handle: &Arc<RwLock<ResearchRecord>>) -> DomainResult<()> {
        let mut stage = Stage::Init;
        while stage != Stage::Done {
            let mut record = handle.write().await;
            let next = self.step(stage, &mut record).await?;
            debug!(from = ?stage, to = ?next, "stage transition");
            stage = next;
        }
        Ok(())
    }

    async fn step(&self, stage: Stage, record: &mut ResearchRecord) -> DomainResult<Stage> {
        match stage {
            Stage::Init => {
                info!(session_id = %record.session_id, "initializing research session");
                record.add_message("system", "Initializing autonomous research pipeline");
                Ok(Stage::Discover)
            }
            Stage::Discover => {
                self.discovery.run(record).await?;
                Ok(Stage::Question)
            }
            Stage::Question => {
                self.question.run(record).await?;
                Ok(Stage::Collect)
            }
            Stage::Collect => {
                if record.iteration_count > 0 {
                    record.add_message(
                        "system",
                        format!(
                            "Iteration {} - refining data collection",
                            record.iteration_count + 1
                        ),
                    );
                }
                self.collection.run(record).await?;
                Ok(Stage::Experiment)
            }
            Stage::Experiment => {
                self.experiment.run(record).await?;
                Ok(Stage::Critique)
            }
            Stage::Critique => {
                self.critic.critique(record).await?;
                Ok(Stage::Decide)
            }
            Stage::Decide => {
                if Self::decide(record) {
                    Ok(Stage::Collect)
                } else {
                    Ok(Stage::Finalize)
                }
            }
            Stage::Finalize => {
                record.is_complete = true;
                record.should_iterate = false;
                record.add_message("system", "Research session finalized");
                info!(
                    session_id = %record.session_id,
                    iterations = record.iteration_count,
                    "session complete"
                );
                Ok(Stage::Done)
            }
            Stage::Done => Ok(Stage::Done),
        }
    }

    /// Close out the cycle that just completed: bump the iteration count,
    /// then force the iterate flag off once the cap is reached, regardless
    /// of the critique's own recommendation.
    fn decide(record: &mut ResearchRecord) -> bool {
        record.iteration_count += 1;

        if record.at_iteration_cap() {
            record.should_iterate = false;
        }

        if record.should_iterate {
            record.add_message(
                "system",
                format!(
                    "Completed iteration {}/{}. Continuing",
                    record.iteration_count, record.max_iterations
                ),
            );
        } else {
            record.add_message(
                "system",
                format!(
                    "Research iterations complete ({}/{})",
                    record.iteration_count, record.max_iterations
                ),
            );
        }

        record.should_iterate
    }
}
