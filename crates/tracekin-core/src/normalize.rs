//! Step canonicalization and navigation comparison.
//!
//! Two trace steps that differ only in quoted literals, digit runs, or
//! volatile query parameters usually describe the same user action. This
//! module produces the canonical forms the aligner uses to judge
//! "very similar" steps.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

/// Prefix every grouped navigation action carries.
pub const NAVIGATION_PREFIX: &str = "Navigate to ";

/// Query parameters ignored by default when comparing navigation URLs.
/// These carry per-run session state and differ between otherwise
/// identical navigations.
pub const DEFAULT_IGNORED_QUERY_PARAMS: &[&str] = &["state"];

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"](.*?)['"]"#).expect("quoted literal regex"));
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("digit run regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Canonicalize a step string for equality comparison.
///
/// Quoted literals collapse to a placeholder, digit runs to another,
/// whitespace runs to a single space, and the result is lower-cased.
/// Deterministic and idempotent: normalizing an already-normalized step
/// is a no-op.
#[must_use]
pub fn normalize_step(step: &str) -> String {
    let step = QUOTED_RE.replace_all(step, "X");
    let step = DIGITS_RE.replace_all(&step, "N");
    let step = WHITESPACE_RE.replace_all(&step, " ");
    step.to_lowercase()
}

/// Compare two navigation steps by URL host, path, and stable query
/// parameters, skipping the parameter names in `ignored`.
///
/// Both steps must begin with [`NAVIGATION_PREFIX`]. Ignored parameters
/// are excluded from value comparison but still counted: two URLs with a
/// different number of parameters never match. A malformed URL makes the
/// pair compare as not-similar rather than failing the batch.
#[must_use]
pub fn compare_navigation_with<S: AsRef<str>>(a: &str, b: &str, ignored: &[S]) -> bool {
    let (Some(raw_a), Some(raw_b)) = (
        a.strip_prefix(NAVIGATION_PREFIX),
        b.strip_prefix(NAVIGATION_PREFIX),
    ) else {
        return false;
    };

    let (url_a, url_b) = match (Url::parse(raw_a.trim()), Url::parse(raw_b.trim())) {
        (Ok(url_a), Ok(url_b)) => (url_a, url_b),
        (Err(err), _) | (_, Err(err)) => {
            debug!(error = %err, "navigation comparison skipped: malformed URL");
            return false;
        }
    };

    if url_a.host_str() != url_b.host_str() || url_a.path() != url_b.path() {
        return false;
    }

    let params_a: Vec<(String, String)> = url_a
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let params_b: Vec<(String, String)> = url_b
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if params_a.len() != params_b.len() {
        return false;
    }

    for (key, value) in &params_a {
        if ignored.iter().any(|name| name.as_ref() == key) {
            continue;
        }
        let other = params_b
            .iter()
            .find(|(other_key, _)| other_key == key)
            .map(|(_, other_value)| other_value);
        if other != Some(value) {
            return false;
        }
    }

    true
}

/// [`compare_navigation_with`] using [`DEFAULT_IGNORED_QUERY_PARAMS`].
#[must_use]
pub fn compare_navigation(a: &str, b: &str) -> bool {
    compare_navigation_with(a, b, DEFAULT_IGNORED_QUERY_PARAMS)
}
