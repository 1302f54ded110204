use serde::{Deserialize, Serialize};

/// Main configuration structure for sagan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Maximum number of collect/experiment/critique cycles per session.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Seed for the injected random source (peer-review jitter, synthetic
    /// data). Fixed so sessions are reproducible under test.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Data collection limits
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Analysis sampling caps
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_max_iterations() -> u32 {
    2
}

const fn default_seed() -> u64 {
    42
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            seed: default_seed(),
            collection: CollectionConfig::default(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Limits applied during the data collection stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CollectionConfig {
    /// Number of data sources actually collected from.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Pages fetched per non-archive source.
    #[serde(default = "default_pages_per_source")]
    pub pages_per_source: usize,

    /// Numeric tokens kept per source when extracting from page text.
    #[serde(default = "default_numbers_per_source")]
    pub numbers_per_source: usize,
}

const fn default_max_sources() -> usize {
    3
}

const fn default_pages_per_source() -> usize {
    2
}

const fn default_numbers_per_source() -> usize {
    50
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            max_sources: default_max_sources(),
            pages_per_source: default_pages_per_source(),
            numbers_per_source: default_numbers_per_source(),
        }
    }
}

/// Sampling caps applied before the heavier statistical passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// Points per group fed into the two-sample test.
    #[serde(default = "default_t_test_cap")]
    pub t_test_sample_cap: usize,

    /// Points per series fed into regression and correlation.
    #[serde(default = "default_regression_cap")]
    pub regression_sample_cap: usize,
}

const fn default_t_test_cap() -> usize {
    200
}

const fn default_regression_cap() -> usize {
    500
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            t_test_sample_cap: default_t_test_cap(),
            regression_sample_cap: default_regression_cap(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
