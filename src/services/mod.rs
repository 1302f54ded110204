pub mod analysis;
pub mod critique;
pub mod pipeline;
pub mod registry;
pub mod stages;

pub use critique::CritiqueEngine;
pub use pipeline::{ResearchPipeline, Stage};
pub use registry::{RecordHandle, SessionRegistry};
