pub mod analysis;
pub mod config;
pub mod critique;
pub mod experiment;
pub mod record;
pub mod structured;

pub use analysis::{
    AnalysisOutcome, CorrelationAnalysis, DescriptiveStats, DetailedAnalysis, LinearRegression,
    StrongCorrelation, TwoSampleTest,
};
pub use config::{AnalysisConfig, CollectionConfig, Config, LoggingConfig};
pub use critique::{Critique, MethodologyCritique, ResultsCritique};
pub use experiment::{
    ExperimentDesign, ExperimentResults, HypothesisSpec, Methodology, StatisticalSummary,
    Variables,
};
pub use record::{
    CollectedData, DataSource, Dataset, Domain, RecordSnapshot, ReportInputs, ResearchQuestion,
    ResearchRecord, SessionMessage,
};
pub use structured::StructuredValue;
