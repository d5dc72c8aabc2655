//! Weighted longest-common-subsequence alignment of action lists.
//!
//! Pairwise weights are non-binary: byte-identical actions score 1.0,
//! actions judged equivalent after normalization or navigation URL
//! comparison score 0.5, everything else 0. The backtrace yields an
//! index-mapped correspondence usable for visual diffing, not just a
//! scalar score.

use serde::{Deserialize, Serialize};

use crate::normalize::{DEFAULT_IGNORED_QUERY_PARAMS, compare_navigation_with, normalize_step};

/// Weight for a byte-identical pair.
const WEIGHT_IDENTICAL: f64 = 1.0;
/// Weight for a pair equivalent after normalization or URL comparison.
const WEIGHT_VERY_SIMILAR: f64 = 0.5;

/// Options for pairwise alignment.
#[derive(Debug, Clone)]
pub struct AlignConfig {
    /// Query parameters ignored when comparing navigation steps.
    pub ignored_query_params: Vec<String>,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            ignored_query_params: DEFAULT_IGNORED_QUERY_PARAMS
                .iter()
                .map(|param| (*param).to_string())
                .collect(),
        }
    }
}

/// Match counts per category for one aligned pair of tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCategories {
    /// Pairs with byte-identical steps.
    pub identical: usize,
    /// Pairs equivalent after normalization or URL comparison.
    pub very_similar: usize,
    /// Steps on either side with no counterpart.
    pub divergent: usize,
}

/// Result of aligning two action lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    /// Similarity percentage, rounded to two decimal places.
    pub similarity: f64,
    /// Matched `(index_a, index_b)` pairs, strictly increasing in both
    /// components. Indices refer to the action lists passed in, not raw
    /// trace lines.
    pub matched_steps: Vec<(usize, usize)>,
    /// Identical / very-similar / divergent breakdown.
    pub categories: MatchCategories,
}

/// Pairwise step weight: 1.0 exact, 0.5 very similar, 0.0 divergent.
fn step_weight(
    a: &str,
    b: &str,
    normalized_a: &str,
    normalized_b: &str,
    ignored: &[String],
) -> f64 {
    if a == b {
        return WEIGHT_IDENTICAL;
    }
    if compare_navigation_with(a, b, ignored) || normalized_a == normalized_b {
        return WEIGHT_VERY_SIMILAR;
    }
    0.0
}

/// Align two action lists with [`AlignConfig::default`].
#[must_use]
pub fn align(a: &[String], b: &[String]) -> AlignmentResult {
    align_with(a, b, &AlignConfig::default())
}

/// Align two action lists, producing the similarity score, the matched
/// index pairs, and the per-category breakdown.
///
/// Callers should pre-filter degenerate inputs: aligning two empty lists
/// yields 0.0 rather than a meaningful score.
#[must_use]
pub fn align_with(a: &[String], b: &[String], config: &AlignConfig) -> AlignmentResult {
    let (m, n) = (a.len(), b.len());
    if m == 0 && n == 0 {
        return AlignmentResult {
            similarity: 0.0,
            matched_steps: Vec::new(),
            categories: MatchCategories::default(),
        };
    }

    let ignored = &config.ignored_query_params;
    let normalized_a: Vec<String> = a.iter().map(|step| normalize_step(step)).collect();
    let normalized_b: Vec<String> = b.iter().map(|step| normalize_step(step)).collect();
    let weight_at = |i: usize, j: usize| {
        step_weight(&a[i], &b[j], &normalized_a[i], &normalized_b[j], ignored)
    };

    // Full-table DP: the backtrace below needs every cell.
    let mut dp = vec![vec![0.0_f64; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            let weight = weight_at(i - 1, j - 1);
            dp[i][j] = if weight > 0.0 {
                dp[i - 1][j - 1] + weight
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    let mut matched_steps = Vec::new();
    let mut categories = MatchCategories::default();
    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        let weight = weight_at(i - 1, j - 1);
        if weight > 0.0 {
            matched_steps.push((i - 1, j - 1));
            if weight >= WEIGHT_IDENTICAL {
                categories.identical += 1;
            } else {
                categories.very_similar += 1;
            }
            i -= 1;
            j -= 1;
        } else if dp[i - 1][j] >= dp[i][j - 1] {
            // Tie-break toward the first list for reproducible output.
            i -= 1;
        } else {
            j -= 1;
        }
    }
    matched_steps.reverse();

    let match_count = matched_steps.len();
    categories.divergent = m + n - 2 * match_count;
    let similarity = match_count as f64 / m.max(n) as f64 * 100.0;

    AlignmentResult {
        similarity: round2(similarity),
        matched_steps,
        categories,
    }
}

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(steps: &[&str]) -> Vec<String> {
        steps.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn common_suffix_is_matched() {
        // Scenario: a 3-step list against its 2-step suffix.
        let a = actions(&["Click A", "Click B", "Click C"]);
        let b = actions(&["Click B", "Click C"]);

        let result = align(&a, &b);
        assert_eq!(result.matched_steps, vec![(1, 0), (2, 1)]);
        assert!((result.similarity - 66.67).abs() < f64::EPSILON);
        assert_eq!(result.categories.identical, 2);
        assert_eq!(result.categories.very_similar, 0);
        assert_eq!(result.categories.divergent, 1);
    }

    #[test]
    fn self_alignment_is_full_and_identical() {
        let a = actions(&["Navigate to https://x.test/a", "Click element (#b)", "Fill element (#c)"]);
        let result = align(&a, &a);
        assert!((result.similarity - 100.0).abs() < f64::EPSILON);
        assert_eq!(result.matched_steps, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(result.categories.identical, 3);
        assert_eq!(result.categories.very_similar, 0);
        assert_eq!(result.categories.divergent, 0);
    }

    #[test]
    fn navigation_with_volatile_state_param_is_very_similar() {
        let a = actions(&["Navigate to https://x.test/a?state=123"]);
        let b = actions(&["Navigate to https://x.test/a?state=999"]);
        let result = align(&a, &b);
        assert_eq!(result.matched_steps, vec![(0, 0)]);
        assert_eq!(result.categories.very_similar, 1);
        assert_eq!(result.categories.identical, 0);
        assert!((result.similarity - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn normalized_equivalence_is_very_similar() {
        let a = actions(&["Fill element (#row5)"]);
        let b = actions(&["Fill element (#row8)"]);
        let result = align(&a, &b);
        assert_eq!(result.categories.very_similar, 1);
        assert!((result.similarity - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn disjoint_lists_share_nothing() {
        let a = actions(&["Click element (#a)"]);
        let b = actions(&["Fill element (#b)"]);
        let result = align(&a, &b);
        assert!(result.matched_steps.is_empty());
        assert!((result.similarity - 0.0).abs() < f64::EPSILON);
        assert_eq!(result.categories.divergent, 2);
    }

    #[test]
    fn similarity_uses_the_longer_list_as_denominator() {
        let a = actions(&["Click X"]);
        let b = actions(&["Click X", "Click Y", "Click Z", "Click W"]);
        let result = align(&a, &b);
        assert!((result.similarity - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_match_outweighs_very_similar_path() {
        // "Click element (#n1)" normalizes equal to both entries of `b`,
        // but the byte-identical pairing must win the weighted optimum.
        let a = actions(&["Click element (#n1)"]);
        let b = actions(&["Click element (#n2)", "Click element (#n1)"]);
        let result = align(&a, &b);
        assert_eq!(result.matched_steps, vec![(0, 1)]);
        assert_eq!(result.categories.identical, 1);
    }

    #[test]
    fn crossing_matches_resolve_deterministically() {
        let a = actions(&["Click P", "Click Q"]);
        let b = actions(&["Click Q", "Click P"]);
        let first = align(&a, &b);
        let second = align(&a, &b);
        assert_eq!(first, second);
        assert_eq!(first.matched_steps.len(), 1);
    }

    #[test]
    fn empty_against_empty_is_guarded() {
        let result = align(&[], &[]);
        assert!((result.similarity - 0.0).abs() < f64::EPSILON);
        assert!(result.matched_steps.is_empty());
        assert_eq!(result.categories.divergent, 0);
    }

    #[test]
    fn empty_against_nonempty_diverges_entirely() {
        let b = actions(&["Click A", "Click B"]);
        let result = align(&[], &b);
        assert!((result.similarity - 0.0).abs() < f64::EPSILON);
        assert_eq!(result.categories.divergent, 2);
    }

    #[test]
    fn similarity_is_rounded_to_two_decimals() {
        // 1/3 → 33.333... → 33.33
        let a = actions(&["Click A"]);
        let b = actions(&["Click A", "Click B", "Click C"]);
        let result = align(&a, &b);
        assert!((result.similarity - 33.33).abs() < f64::EPSILON);
    }

    #[test]
    fn custom_ignore_list_feeds_navigation_comparison() {
        let a = actions(&["Navigate to https://x.test/a?session=abc"]);
        let b = actions(&["Navigate to https://x.test/a?session=xyz"]);

        let default_result = align(&a, &b);
        assert!(default_result.matched_steps.is_empty());

        let config = AlignConfig {
            ignored_query_params: vec!["session".to_string()],
        };
        let custom = align_with(&a, &b, &config);
        assert_eq!(custom.matched_steps, vec![(0, 0)]);
        assert_eq!(custom.categories.very_similar, 1);
    }

    #[test]
    fn round2_behaves() {
        assert!((round2(66.666_666) - 66.67).abs() < f64::EPSILON);
        assert!((round2(100.0) - 100.0).abs() < f64::EPSILON);
        assert!((round2(0.004) - 0.0).abs() < f64::EPSILON);
    }
}
