//! Property tests for the scoring and analysis invariants.

use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;

use sagan::services::analysis;
use sagan::services::critique;

proptest! {
    /// The composite score stays in [0, 10] for any combination of inputs,
    /// including confidence values far outside [0, 1].
    #[test]
    fn overall_score_is_bounded(
        methodology in 0.0f64..=10.0,
        results in 0.0f64..=10.0,
        confidence in -5.0f64..=5.0,
    ) {
        let overall = critique::overall_score(methodology, results, confidence);
        prop_assert!((0.0..=10.0).contains(&overall));
        // One decimal place
        prop_assert!((overall * 10.0 - (overall * 10.0).round()).abs() < 1e-9);
    }

    /// The iterate decision never fires at or past the iteration cap,
    /// regardless of scores and p-values.
    #[test]
    fn iteration_never_recommended_at_cap(
        overall in 0.0f64..=10.0,
        p_value in 0.0f64..=1.0,
        max_iterations in 1u32..=5,
        extra in 0u32..=3,
    ) {
        let at_cap = max_iterations + extra;
        prop_assert!(!critique::decide_iteration(overall, at_cap, max_iterations, p_value));
    }

    /// Normalization clamps any numeric methodology score into [0, 10].
    #[test]
    fn methodology_score_is_clamped(score in -1000.0f64..=1000.0) {
        let normalized =
            critique::normalize_methodology(Some(json!([{ "methodology_score": score }])));
        prop_assert!((0.0..=10.0).contains(&normalized.methodology_score));
    }

    /// Cleaning an already-clean numeric dataset changes nothing.
    #[test]
    fn clean_is_idempotent(values in proptest::collection::vec(-1e6f64..1e6, 1..50)) {
        let raw = {
            let mut map = serde_json::Map::new();
            map.insert("series".to_string(), json!(values));
            map
        };

        let first = analysis::clean(&raw);
        let reencoded = {
            let mut map = serde_json::Map::new();
            map.insert(
                "series".to_string(),
                json!(first["series"].as_numeric().unwrap()),
            );
            map
        };
        let second = analysis::clean(&reencoded);

        prop_assert_eq!(&first["series"], &second["series"]);
    }

    /// Descriptive statistics respect basic ordering invariants.
    #[test]
    fn describe_orders_min_mean_max(values in proptest::collection::vec(-1e6f64..1e6, 1..100)) {
        let stats = analysis::describe(&values).unwrap();
        prop_assert!(stats.min <= stats.mean + 1e-9);
        prop_assert!(stats.mean <= stats.max + 1e-9);
        prop_assert!(stats.min <= stats.median);
        prop_assert!(stats.median <= stats.max);
        prop_assert!(stats.std >= 0.0);
        prop_assert_eq!(stats.count, values.len());
    }

    /// The two-sample test always produces a p-value in [0, 1] and a
    /// non-negative effect size, whatever the inputs.
    #[test]
    fn two_sample_test_outputs_are_bounded(
        g1 in proptest::collection::vec(-1e3f64..1e3, 0..30),
        g2 in proptest::collection::vec(-1e3f64..1e3, 0..30),
    ) {
        let result = analysis::two_sample_test(&g1, &g2);
        prop_assert!((0.0..=1.0).contains(&result.p_value));
        prop_assert!(result.effect_size >= 0.0);
        prop_assert_eq!(result.significant, result.p_value < 0.05 && result.error.is_none());
    }

    /// Pearson correlations always land in [-1, 1].
    #[test]
    fn correlations_are_bounded(
        a in proptest::collection::vec(-1e3f64..1e3, 2..40),
        b in proptest::collection::vec(-1e3f64..1e3, 2..40),
    ) {
        let mut series = BTreeMap::new();
        series.insert("a".to_string(), a);
        series.insert("b".to_string(), b);

        let result = analysis::correlate(&series).unwrap();
        for row in &result.matrix {
            for cell in row.iter().flatten() {
                prop_assert!((-1.0..=1.0).contains(cell));
            }
        }
        for strong in &result.strong_correlations {
            prop_assert!(strong.correlation.abs() > 0.7);
        }
    }
}
