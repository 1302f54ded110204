//! Statistical analysis engine.
//!
//! Pure numeric functions over cleaned datasets: descriptive statistics, the
//! Welch two-sample test with Cohen's d, ordinary least-squares regression,
//! and pairwise Pearson correlation with strong-pair extraction. Every
//! operation is total — malformed or insufficient input degrades to a
//! structured error or a documented neutral default, never a panic and never
//! a NaN escaping the engine.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::models::{
    CorrelationAnalysis, Dataset, DescriptiveStats, LinearRegression, StrongCorrelation,
    TwoSampleTest,
};

/// Threshold above which an absolute correlation counts as strong.
const STRONG_CORRELATION: f64 = 0.7;

/// Conventional alpha for the significance flag.
const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Raw elements kept as a preview when a dataset has no numeric content.
const PREVIEW_LEN: usize = 50;

/// Structured failures from analysis steps that cannot complete.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    #[error("not enough paired samples: need {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

// ---------------------------------------------------------------------------
// Cleaning and coercion
// ---------------------------------------------------------------------------

/// Attempt numeric coercion of a single raw element.
///
/// Accepts JSON numbers, booleans, and numeric strings with thousands
/// separators. Non-finite values are invalid and excluded.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Clean a raw mapping of named datasets.
///
/// For each sequence value: flatten one level of nesting, drop nulls,
/// coerce per element. If at least one element converts, the dataset is
/// numeric; otherwise the first [`PREVIEW_LEN`] raw elements are kept as a
/// preview for text inspection. Non-sequence values pass through unchanged.
///
/// Re-cleaning an already-numeric dataset is a no-op.
pub fn clean(raw: &serde_json::Map<String, Value>) -> BTreeMap<String, Dataset> {
    let mut cleaned = BTreeMap::new();

    for (key, value) in raw {
        let Value::Array(items) = value else {
            cleaned.insert(key.clone(), Dataset::Raw(value.clone()));
            continue;
        };

        let mut flat = Vec::new();
        for item in items {
            match item {
                Value::Array(inner) => flat.extend(inner.iter().cloned()),
                Value::Null => {}
                other => flat.push(other.clone()),
            }
        }
        flat.retain(|v| !v.is_null());

        let numeric: Vec<f64> = flat.iter().filter_map(coerce_numeric).collect();

        let dataset = if numeric.is_empty() {
            flat.truncate(PREVIEW_LEN);
            Dataset::Preview(flat)
        } else {
            Dataset::Numeric(numeric)
        };
        cleaned.insert(key.clone(), dataset);
    }

    cleaned
}

/// Pull numeric tokens out of free text, e.g. fetched page content.
///
/// Tokens are stripped of surrounding punctuation, thousands separators are
/// removed, and non-finite parses are discarded.
pub fn extract_numbers(text: &str, cap: usize) -> Vec<f64> {
    text.split_whitespace()
        .filter_map(|token| {
            let trimmed =
                token.trim_matches(|c: char| !c.is_ascii_digit() && !matches!(c, '-' | '+' | '.'));
            if trimmed.is_empty() {
                return None;
            }
            trimmed.replace(',', "").parse::<f64>().ok()
        })
        .filter(|v| v.is_finite())
        .take(cap)
        .collect()
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Descriptive statistics over a series. Non-finite values are excluded
/// first; `None` when nothing remains.
pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    let count = finite.len();
    let mean = finite.iter().sum::<f64>() / count as f64;

    let mut sorted = finite.clone();
    sorted.sort_by(f64::total_cmp);
    let median = if count % 2 == 1 {
        sorted[count / 2]
    } else {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    };

    // Sample standard deviation is undefined for a single point; report 0.
    let std = if count > 1 {
        (finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    Some(DescriptiveStats {
        mean,
        median,
        std,
        min: sorted[0],
        max: sorted[count - 1],
        count,
    })
}

// ---------------------------------------------------------------------------
// Welch two-sample test
// ---------------------------------------------------------------------------

/// Welch (unequal-variance) two-sample test with Cohen's d.
///
/// Both groups need at least two finite elements; otherwise the documented
/// insufficient-data outcome is returned and the caller continues with
/// neutral statistics.
pub fn two_sample_test(group1: &[f64], group2: &[f64]) -> TwoSampleTest {
    let g1: Vec<f64> = group1.iter().copied().filter(|v| v.is_finite()).collect();
    let g2: Vec<f64> = group2.iter().copied().filter(|v| v.is_finite()).collect();

    if g1.len() < 2 || g2.len() < 2 {
        return TwoSampleTest::insufficient();
    }

    let (n1, n2) = (g1.len() as f64, g2.len() as f64);
    let m1 = g1.iter().sum::<f64>() / n1;
    let m2 = g2.iter().sum::<f64>() / n2;
    let v1 = g1.iter().map(|v| (v - m1).powi(2)).sum::<f64>() / (n1 - 1.0);
    let v2 = g2.iter().map(|v| (v - m2).powi(2)).sum::<f64>() / (n2 - 1.0);

    let pooled_sd = ((v1 + v2) / 2.0).sqrt();
    let effect_size = if pooled_sd > 0.0 {
        (m1 - m2).abs() / pooled_sd
    } else {
        0.0
    };

    let standard_error = (v1 / n1 + v2 / n2).sqrt();
    if standard_error == 0.0 {
        // Two identical constant groups: no variation to test.
        return TwoSampleTest {
            t_statistic: None,
            p_value: 1.0,
            significant: false,
            effect_size: 0.0,
            error: Some("zero variance in both groups".to_string()),
        };
    }

    let t = (m1 - m2) / standard_error;

    // Welch-Satterthwaite degrees of freedom
    let df = (v1 / n1 + v2 / n2).powi(2)
        / ((v1 / n1).powi(2) / (n1 - 1.0) + (v2 / n2).powi(2) / (n2 - 1.0));

    let p_value = student_t_two_sided_p(t, df);

    TwoSampleTest {
        t_statistic: Some(t),
        p_value,
        significant: p_value < SIGNIFICANCE_LEVEL,
        effect_size,
        error: None,
    }
}

// ---------------------------------------------------------------------------
// Linear regression
// ---------------------------------------------------------------------------

/// Ordinary least-squares simple linear regression.
///
/// `x` and `y` are paired by position and truncated to the shorter length;
/// at least two pairs are required and `x` must vary.
pub fn regress(x: &[f64], y: &[f64]) -> Result<LinearRegression, AnalysisError> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();

    let n = pairs.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData { needed: 2, got: n });
    }

    let nf = n as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / nf;

    let ss_xx: f64 = pairs.iter().map(|(a, _)| (a - mean_x).powi(2)).sum();
    let ss_yy: f64 = pairs.iter().map(|(_, b)| (b - mean_y).powi(2)).sum();
    let ss_xy: f64 = pairs
        .iter()
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum();

    if ss_xx == 0.0 {
        return Err(AnalysisError::DegenerateInput("zero variance in x".to_string()));
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;

    let r = if ss_yy > 0.0 {
        ss_xy / (ss_xx * ss_yy).sqrt()
    } else {
        0.0
    };
    let r_squared = r * r;

    let df = nf - 2.0;
    let residual_ss = (ss_yy - slope * ss_xy).max(0.0);
    let (std_err, p_value) = if df > 0.0 {
        let std_err = (residual_ss / df / ss_xx).sqrt();
        let p_value = if std_err > 0.0 {
            student_t_two_sided_p(slope / std_err, df)
        } else if slope == 0.0 {
            1.0
        } else {
            // Perfect fit with nonzero slope
            0.0
        };
        (std_err, p_value)
    } else {
        // Two points always fit exactly; no residual degrees of freedom.
        (0.0, 1.0)
    };

    Ok(LinearRegression {
        slope,
        intercept,
        r_squared,
        p_value,
        std_err,
    })
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson correlation of two series paired by position.
///
/// `None` when fewer than two pairs remain or either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();

    let n = pairs.len() as f64;
    if pairs.len() < 2 {
        return None;
    }

    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let ss_xx: f64 = pairs.iter().map(|(a, _)| (a - mean_x).powi(2)).sum();
    let ss_yy: f64 = pairs.iter().map(|(_, b)| (b - mean_y).powi(2)).sum();
    let ss_xy: f64 = pairs
        .iter()
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum();

    if ss_xx == 0.0 || ss_yy == 0.0 {
        return None;
    }

    let r = ss_xy / (ss_xx * ss_yy).sqrt();
    r.is_finite().then_some(r.clamp(-1.0, 1.0))
}

/// Full pairwise correlation matrix over named series, with every unordered
/// pair whose `|r|` exceeds [`STRONG_CORRELATION`] listed separately.
/// Undefined correlations stay out of the strong list.
pub fn correlate(
    series: &BTreeMap<String, Vec<f64>>,
) -> Result<CorrelationAnalysis, AnalysisError> {
    if series.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            got: series.len(),
        });
    }

    let variables: Vec<String> = series.keys().cloned().collect();
    let columns: Vec<&Vec<f64>> = series.values().collect();
    let k = variables.len();

    let mut matrix = vec![vec![None; k]; k];
    let mut strong = Vec::new();

    for i in 0..k {
        for j in i..k {
            let r = pearson(columns[i], columns[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;

            if i != j {
                if let Some(r) = r {
                    if r.abs() > STRONG_CORRELATION {
                        strong.push(StrongCorrelation {
                            var1: variables[i].clone(),
                            var2: variables[j].clone(),
                            correlation: r,
                        });
                    }
                }
            }
        }
    }

    Ok(CorrelationAnalysis {
        variables,
        matrix,
        strong_correlations: strong,
    })
}

// ---------------------------------------------------------------------------
// Student's t distribution
// ---------------------------------------------------------------------------

/// Two-sided p-value for a t statistic with `df` degrees of freedom,
/// via the regularized incomplete beta function.
fn student_t_two_sided_p(t: f64, df: f64) -> f64 {
    if !t.is_finite() || df <= 0.0 {
        return 1.0;
    }
    let x = df / (df + t * t);
    incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// Regularized incomplete beta function I_x(a, b), continued-fraction form.
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let log_bt = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let bt = log_bt.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        bt * beta_cf(a, b, x) / a
    } else {
        1.0 - bt * beta_cf(b, a, 1.0 - x) / b
    }
}

/// Continued fraction for the incomplete beta function.
fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-12;
    const TINY: f64 = 1e-30;

    let mut c = 1.0;
    let mut d = 1.0 - (a + b) * x / (a + 1.0);
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((a + m2 - 1.0) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (a + b + m) * x / ((a + m2) * (a + m2 + 1.0));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

/// Log gamma, Lanczos approximation.
fn ln_gamma(x: f64) -> f64 {
    const G: usize = 7;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_59,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_571_6e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        std::f64::consts::PI.ln() - (std::f64::consts::PI * x).sin().ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut a = COEFFS[0];
        for (i, coeff) in COEFFS.iter().enumerate().skip(1) {
            a += coeff / (x + i as f64);
        }
        let t = x + G as f64 + 0.5;
        0.5 * (2.0 * std::f64::consts::PI).ln() + (t - 0.5) * t.ln() - t + a.ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_map(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_clean_flattens_and_coerces() {
        let raw = raw_map(json!({
            "metrics": [1, [2, 3], null, "4", "1,234.5", "noise"],
        }));

        let cleaned = clean(&raw);
        assert_eq!(
            cleaned["metrics"].as_numeric().unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 1234.5]
        );
    }

    #[test]
    fn test_clean_keeps_preview_when_nothing_converts() {
        let raw = raw_map(json!({
            "notes": ["alpha", "beta", "gamma"],
        }));

        let cleaned = clean(&raw);
        match &cleaned["notes"] {
            Dataset::Preview(items) => assert_eq!(items.len(), 3),
            other => panic!("expected preview, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_preview_truncates_to_fifty() {
        let items: Vec<Value> = (0..80).map(|i| json!(format!("item{i}"))).collect();
        let raw = raw_map(json!({ "long": items }));

        let cleaned = clean(&raw);
        match &cleaned["long"] {
            Dataset::Preview(items) => assert_eq!(items.len(), 50),
            other => panic!("expected preview, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_passes_non_sequences_through() {
        let raw = raw_map(json!({ "label": "summary text" }));
        let cleaned = clean(&raw);
        assert_eq!(cleaned["label"], Dataset::Raw(json!("summary text")));
    }

    #[test]
    fn test_clean_is_idempotent_on_numeric_data() {
        let raw = raw_map(json!({ "values": [1.5, 2.5, 3.5] }));
        let first = clean(&raw);

        let reencoded = raw_map(json!({
            "values": first["values"].as_numeric().unwrap(),
        }));
        let second = clean(&reencoded);

        assert_eq!(first["values"], second["values"]);
    }

    #[test]
    fn test_coerce_excludes_non_finite() {
        assert_eq!(coerce_numeric(&json!("inf")), None);
        assert_eq!(coerce_numeric(&json!("NaN")), None);
        assert_eq!(coerce_numeric(&json!("2.5")), Some(2.5));
        assert_eq!(coerce_numeric(&json!(true)), Some(1.0));
    }

    #[test]
    fn test_describe_single_element() {
        let stats = describe(&[5.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.median, 5.0);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.min, 5.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_describe_empty_is_none() {
        assert!(describe(&[]).is_none());
        assert!(describe(&[f64::NAN, f64::INFINITY]).is_none());
    }

    #[test]
    fn test_describe_sample_std() {
        let stats = describe(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.median - 5.0).abs() < 1e-12);
        // Sample variance of [2,4,6,8] is 20/3
        assert!((stats.std - (20.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_two_sample_test_insufficient_data() {
        let result = two_sample_test(&[1.0], &[2.0, 3.0]);
        assert_eq!(result.error.as_deref(), Some("Insufficient data for t-test"));
        assert_eq!(result.p_value, 1.0);
        assert!(!result.significant);
        assert_eq!(result.effect_size, 0.0);
    }

    #[test]
    fn test_two_sample_test_separated_groups() {
        let g1 = [1.0, 1.1, 0.9, 1.2, 0.8, 1.0, 1.1, 0.9];
        let g2 = [5.0, 5.1, 4.9, 5.2, 4.8, 5.0, 5.1, 4.9];

        let result = two_sample_test(&g1, &g2);
        assert!(result.is_completed());
        assert!(result.significant);
        assert!(result.p_value < 0.001);
        assert!(result.effect_size > 2.0);
    }

    #[test]
    fn test_two_sample_test_identical_constant_groups() {
        let result = two_sample_test(&[3.0, 3.0, 3.0], &[3.0, 3.0, 3.0]);
        assert!(!result.significant);
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.effect_size, 0.0);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_two_sample_p_value_matches_reference() {
        // Welch test on these groups: t ~= -3.286, df = 6, p ~= 0.0167
        let g1 = [1.0, 2.0, 3.0, 4.0];
        let g2 = [4.0, 5.0, 6.0, 7.0];

        let result = two_sample_test(&g1, &g2);
        assert!((result.p_value - 0.0167).abs() < 0.002);
        assert!(result.significant);
    }

    #[test]
    fn test_regress_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];

        let fit = regress(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert!(fit.p_value < 1e-6);
    }

    #[test]
    fn test_regress_truncates_to_shorter() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.0, 4.0, 6.0];

        let fit = regress(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_regress_rejects_single_pair() {
        let err = regress(&[1.0], &[2.0]).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { needed: 2, got: 1 });
    }

    #[test]
    fn test_regress_rejects_constant_x() {
        let err = regress(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateInput(_)));
    }

    #[test]
    fn test_correlate_perfect_pair() {
        let mut series = BTreeMap::new();
        series.insert("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        series.insert("b".to_string(), vec![2.0, 4.0, 6.0, 8.0]);

        let analysis = correlate(&series).unwrap();
        let r = analysis.matrix[0][1].unwrap();
        assert!((r - 1.0).abs() < 1e-9);

        assert_eq!(analysis.strong_correlations.len(), 1);
        let strong = &analysis.strong_correlations[0];
        assert_eq!(strong.var1, "a");
        assert_eq!(strong.var2, "b");
    }

    #[test]
    fn test_correlate_skips_undefined_pairs() {
        let mut series = BTreeMap::new();
        series.insert("constant".to_string(), vec![5.0, 5.0, 5.0]);
        series.insert("varying".to_string(), vec![1.0, 2.0, 3.0]);

        let analysis = correlate(&series).unwrap();
        assert_eq!(analysis.matrix[0][1], None);
        assert!(analysis.strong_correlations.is_empty());
    }

    #[test]
    fn test_correlate_unequal_lengths_align_by_position() {
        let mut series = BTreeMap::new();
        series.insert("a".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        series.insert("b".to_string(), vec![10.0, 20.0, 30.0]);

        let analysis = correlate(&series).unwrap();
        let r = analysis.matrix[0][1].unwrap();
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlate_needs_two_series() {
        let mut series = BTreeMap::new();
        series.insert("only".to_string(), vec![1.0, 2.0]);
        assert!(correlate(&series).is_err());
    }

    #[test]
    fn test_extract_numbers_from_text() {
        let text = "Throughput rose from 1,200 ops to 1,800 ops (a 50% gain) in 3.5 days.";
        let numbers = extract_numbers(text, 10);
        assert_eq!(numbers, vec![1200.0, 1800.0, 50.0, 3.5]);
    }

    #[test]
    fn test_extract_numbers_respects_cap() {
        let text = "1 2 3 4 5 6 7 8";
        assert_eq!(extract_numbers(text, 3), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_student_t_reference_values() {
        // Known two-sided p-values: t=2.0, df=10 -> ~0.0734; t=1.0, df=5 -> ~0.3632
        assert!((student_t_two_sided_p(2.0, 10.0) - 0.0734).abs() < 0.002);
        assert!((student_t_two_sided_p(1.0, 5.0) - 0.3632).abs() < 0.002);
        assert!((student_t_two_sided_p(0.0, 8.0) - 1.0).abs() < 1e-9);
    }
}
