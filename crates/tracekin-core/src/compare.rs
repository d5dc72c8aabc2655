//! Pairwise comparison pipeline.
//!
//! Wires the parser, grouper, and aligner together: filter out tests with
//! too few raw steps, group each survivor's steps once, then align every
//! unordered pair and emit one report record per pair for downstream
//! rendering or merge suggestion.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::actions::group_steps;
use crate::align::{AlignConfig, AlignmentResult, MatchCategories, align_with};
use crate::config::{AnalysisConfig, Config};
use crate::error::Result;
use crate::parser::{Test, parse_log_file};

/// One analyzed pair of tests.
///
/// `matched_steps` indices refer to positions in the grouped action lists
/// (`steps_a` / `steps_b`), not the raw trace lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    /// First test identifier.
    pub name_a: String,
    /// First test's grouped actions.
    pub steps_a: Vec<String>,
    /// Second test identifier.
    pub name_b: String,
    /// Second test's grouped actions.
    pub steps_b: Vec<String>,
    /// Similarity percentage (0-100, two decimals).
    pub similarity: f64,
    /// Matched `(index_a, index_b)` pairs into the grouped action lists.
    pub matched_steps: Vec<(usize, usize)>,
    /// Identical / very-similar / divergent breakdown.
    pub categories: MatchCategories,
    /// Whether the pair clears the configured merge-candidate threshold.
    pub merge_candidate: bool,
}

/// Drop tests with fewer than `min_steps` raw trace lines.
///
/// This is the guard that keeps degenerate (near-empty) action lists out
/// of the aligner.
#[must_use]
pub fn filter_tests(tests: Vec<Test>, min_steps: usize) -> Vec<Test> {
    let before = tests.len();
    let kept: Vec<Test> = tests
        .into_iter()
        .filter(|test| test.steps.len() >= min_steps)
        .collect();
    debug!(before, after = kept.len(), min_steps, "filtered short tests");
    kept
}

/// Compare every unordered pair of tests.
///
/// Tests should already have passed [`filter_tests`]. Grouping runs once
/// per test, not once per pair; each pairwise alignment is independent.
#[must_use]
pub fn compare_tests(tests: &[Test], config: &AnalysisConfig) -> Vec<PairReport> {
    let align_config = AlignConfig {
        ignored_query_params: config.ignored_query_params.clone(),
    };
    let grouped: Vec<Vec<String>> = tests.iter().map(|test| group_steps(&test.steps)).collect();

    let mut reports = Vec::new();
    for i in 0..tests.len() {
        for j in (i + 1)..tests.len() {
            let result = align_with(&grouped[i], &grouped[j], &align_config);
            info!(
                test_a = %tests[i].id,
                test_b = %tests[j].id,
                similarity = result.similarity,
                "aligned pair"
            );
            reports.push(pair_report(
                &tests[i],
                &grouped[i],
                &tests[j],
                &grouped[j],
                result,
                config.similarity_threshold,
            ));
        }
    }
    reports
}

fn pair_report(
    test_a: &Test,
    steps_a: &[String],
    test_b: &Test,
    steps_b: &[String],
    result: AlignmentResult,
    threshold: f64,
) -> PairReport {
    PairReport {
        name_a: test_a.id.clone(),
        steps_a: steps_a.to_vec(),
        name_b: test_b.id.clone(),
        steps_b: steps_b.to_vec(),
        merge_candidate: result.similarity >= threshold,
        similarity: result.similarity,
        matched_steps: result.matched_steps,
        categories: result.categories,
    }
}

/// Run the full pipeline on one log file: parse, filter, group, align.
pub fn analyze_log_file(path: &Path, config: &Config) -> Result<Vec<PairReport>> {
    let tests = parse_log_file(path)?;
    info!(tests = tests.len(), path = %path.display(), "parsed log file");
    let tests = filter_tests(tests, config.analysis.min_steps);
    Ok(compare_tests(&tests, &config.analysis))
}
