//! Result types produced by the statistical analysis engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive statistics for a single numeric series.
///
/// `std` is the sample (N-1) standard deviation, defined as 0.0 for a
/// single-element series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Outcome of the Welch two-sample test.
///
/// When either group has fewer than two usable elements the test degrades to
/// neutral defaults (`p_value = 1.0`, not significant, zero effect size) with
/// `error` set, so callers can continue without special-casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoSampleTest {
    pub t_statistic: Option<f64>,
    pub p_value: f64,
    pub significant: bool,
    pub effect_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TwoSampleTest {
    /// The documented insufficient-data outcome.
    pub fn insufficient() -> Self {
        Self {
            t_statistic: None,
            p_value: 1.0,
            significant: false,
            effect_size: 0.0,
            error: Some("Insufficient data for t-test".to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.error.is_none()
    }
}

/// Ordinary least-squares simple linear regression fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub std_err: f64,
}

/// A pair of series whose Pearson correlation exceeds the strong threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrongCorrelation {
    pub var1: String,
    pub var2: String,
    pub correlation: f64,
}

/// Full pairwise Pearson correlation analysis.
///
/// `matrix[i][j]` is the correlation between `variables[i]` and
/// `variables[j]`; `None` marks undefined correlations (fewer than two
/// aligned points, or zero variance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    pub variables: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
    pub strong_correlations: Vec<StrongCorrelation>,
}

/// Explicit success-or-failure wrapper for analysis steps that can degrade.
///
/// Stored in the detailed experiment results so a failed regression or
/// correlation pass is a visible, serializable branch rather than a silently
/// dropped field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome<T> {
    Completed(T),
    Failed { error: String },
}

impl<T> AnalysisOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Failed { .. } => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for AnalysisOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Completed(value),
            Err(err) => Self::Failed { error: err.to_string() },
        }
    }
}

/// Per-dataset and cross-dataset detail backing the statistical summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedAnalysis {
    pub descriptive: BTreeMap<String, DescriptiveStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_test: Option<TwoSampleTest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group1_stats: Option<DescriptiveStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group2_stats: Option<DescriptiveStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear_regression: Option<AnalysisOutcome<LinearRegression>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlations: Option<AnalysisOutcome<CorrelationAnalysis>>,
}
