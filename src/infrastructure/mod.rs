//! Infrastructure layer: configuration loading and other process-level
//! concerns.

pub mod config;
