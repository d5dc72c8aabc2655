//! Collapses raw trace lines into grouped, human-meaningful actions.
//!
//! Raw protocol traces are far too granular for sequence comparison: a
//! single click produces locator resolution lines, retry attempts, and
//! request/response pairs. Grouping folds each test's raw steps into a
//! short list of action strings — navigations, interactions, retry
//! blocks, and API call summaries — before alignment.
//!
//! The fold threads an explicit [`GroupState`] through the steps; each
//! transition emits zero or one finalized action, plus a final flush at
//! end of stream.

use std::sync::LazyLock;

use aho_corasick::AhoCorasick;
use regex::Regex;

/// Number of retry attempts that collapses the pending action into a
/// `Retry:` entry.
const RETRY_THRESHOLD: u32 = 3;

/// Markers that identify an interaction trace line.
const INTERACTION_MARKERS: &[&str] = &["locator.", "page.", "getBy"];

/// Ordered `(needle, label)` table for interaction types. Specific
/// needles come before their substrings so `dblclick` is not labeled
/// `Click` and `selectOption` is not labeled `Select`.
const INTERACTION_TYPES: &[(&str, &str)] = &[
    ("setInputFiles", "Upload"),
    ("selectOption", "Select Option"),
    ("setViewportSize", "Set Viewport Size"),
    ("screenshot", "Take Screenshot"),
    ("dblclick", "Double Click"),
    ("uncheck", "Uncheck"),
    ("waitFor", "Wait for"),
    ("fill", "Fill"),
    ("click", "Click"),
    ("type", "Type"),
    ("press", "Press"),
    ("select", "Select"),
    ("check", "Check"),
    ("hover", "Hover"),
    ("focus", "Focus"),
    ("drag", "Drag"),
    ("drop", "Drop"),
    ("tap", "Tap"),
    ("expect", "Expect"),
    ("goto", "Navigate"),
];

static INTERACTION_MARKER_AC: LazyLock<AhoCorasick> =
    LazyLock::new(|| AhoCorasick::new(INTERACTION_MARKERS).expect("interaction marker automaton"));

static NAVIGATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Navigate to (\S+)").expect("navigation regex"));
static API_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"pw:api [=><]+ (\S+) (started|succeeded)").expect("api call regex")
});

/// `getByRole('button', { name: 'Save' })` style locators.
static ROLE_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"getByRole\(\s*['"]([^'"]+)['"](?:\s*,\s*\{\s*name:\s*['"]([^'"]+)['"])?"#)
        .expect("role target regex")
});
/// `locator('#submit')` / `locator.fill('#card')` / `getByText('Save')`
/// style locators with a quoted argument.
static LOCATOR_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:locator(?:\.\w+)?|getBy\w+|page\.\w+)\(\s*['"]([^'"]+)['"]"#)
        .expect("locator target regex")
});
/// Actionability log lines that name the resolved element.
static RESOLVED_TARGET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"resolved to (.+)").expect("resolved target regex"));

/// How a raw step participates in grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    Navigation,
    Interaction,
    Retry,
    ApiCall,
    Other,
}

/// Classify a raw step, in priority order: navigation, interaction,
/// retry, API call.
fn classify(step: &str) -> StepKind {
    if is_navigation(step) {
        StepKind::Navigation
    } else if is_interaction(step) {
        StepKind::Interaction
    } else if is_retry(step) {
        StepKind::Retry
    } else if is_api_call(step) {
        StepKind::ApiCall
    } else {
        StepKind::Other
    }
}

fn is_navigation(step: &str) -> bool {
    NAVIGATION_RE.is_match(step)
}

fn is_interaction(step: &str) -> bool {
    if INTERACTION_MARKER_AC.is_match(step) {
        return true;
    }
    // Bare protocol lines count as interactions only when they are not
    // retry or API status lines, which have their own grouping rules.
    step.contains("pw:api") && !is_retry(step) && !is_api_call(step)
}

fn is_retry(step: &str) -> bool {
    step.contains("retrying") && step.contains("attempt #")
}

fn is_api_call(step: &str) -> bool {
    API_CALL_RE.is_match(step)
}

/// The canonical `Navigate to <url>` action for a navigation trace line.
fn navigation_action(step: &str) -> String {
    NAVIGATION_RE.captures(step).map_or_else(
        || step.to_string(),
        |captures| format!("Navigate to {}", &captures[1]),
    )
}

/// Human label for an interaction trace line.
fn interaction_type(step: &str) -> &'static str {
    INTERACTION_TYPES
        .iter()
        .find(|(needle, _)| step.contains(needle))
        .map_or("Interact with", |(_, label)| label)
}

/// Target description for an interaction, tried in order: role/name
/// locator, quoted locator argument, resolved-element text, then the raw
/// step as a fallback.
fn interaction_target(step: &str) -> String {
    if let Some(captures) = ROLE_TARGET_RE.captures(step) {
        let role = &captures[1];
        return match captures.get(2) {
            Some(name) => format!("{role} \"{}\"", name.as_str()),
            None => role.to_string(),
        };
    }
    if let Some(captures) = LOCATOR_TARGET_RE.captures(step) {
        return format!("element ({})", &captures[1]);
    }
    if let Some(captures) = RESOLVED_TARGET_RE.captures(step) {
        return captures[1].trim_end().to_string();
    }
    format!("element ({step})")
}

fn interaction_action(step: &str) -> String {
    format!("{} {}", interaction_type(step), interaction_target(step))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiStatus {
    Started,
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ApiCall {
    name: String,
    status: ApiStatus,
}

fn parse_api_call(step: &str) -> Option<ApiCall> {
    let captures = API_CALL_RE.captures(step)?;
    let status = match &captures[2] {
        "started" => ApiStatus::Started,
        _ => ApiStatus::Succeeded,
    };
    Some(ApiCall {
        name: captures[1].to_string(),
        status,
    })
}

/// Aggregate buffered API calls into one summary string, preserving
/// first-seen call-name order. Zero-count clauses are omitted.
fn summarize_api_calls(calls: &[ApiCall]) -> Option<String> {
    if calls.is_empty() {
        return None;
    }

    let mut counts: Vec<(&str, u32, u32)> = Vec::new();
    for call in calls {
        let index = match counts.iter().position(|(name, _, _)| *name == call.name) {
            Some(index) => index,
            None => {
                counts.push((call.name.as_str(), 0, 0));
                counts.len() - 1
            }
        };
        match call.status {
            ApiStatus::Started => counts[index].1 += 1,
            ApiStatus::Succeeded => counts[index].2 += 1,
        }
    }

    let parts: Vec<String> = counts
        .iter()
        .map(|(name, started, succeeded)| {
            let mut clauses = Vec::new();
            if *started > 0 {
                clauses.push(format!("{started} started"));
            }
            if *succeeded > 0 {
                clauses.push(format!("{succeeded} succeeded"));
            }
            format!("{name}: {}", clauses.join(", "))
        })
        .collect();

    Some(parts.join(", "))
}

/// Accumulator threaded through the grouping fold.
#[derive(Debug, Default)]
struct GroupState {
    /// Action being built, not yet emitted.
    current: Option<String>,
    /// Consecutive retry markers seen toward [`RETRY_THRESHOLD`].
    retries: u32,
    /// Buffered API calls awaiting the next finalization.
    api_calls: Vec<ApiCall>,
}

impl GroupState {
    /// Apply one raw step, returning the action it finalizes, if any.
    fn step(&mut self, step: &str) -> Option<String> {
        match classify(step) {
            StepKind::Navigation => {
                let emitted = self.finalize();
                self.current = Some(navigation_action(step));
                emitted
            }
            StepKind::Interaction => {
                let emitted = self.finalize();
                self.current = Some(interaction_action(step));
                emitted
            }
            StepKind::Retry => {
                self.retries += 1;
                if self.retries < RETRY_THRESHOLD {
                    return None;
                }
                self.retries = 0;
                if let Some(action) = self.current.take() {
                    self.current = Some(format!("Retry: {action}"));
                    return self.finalize();
                }
                None
            }
            StepKind::ApiCall => {
                if let Some(call) = parse_api_call(step) {
                    self.api_calls.push(call);
                }
                None
            }
            StepKind::Other => None,
        }
    }

    /// Flush the pending action and any buffered API calls into zero or
    /// one output entry.
    fn finalize(&mut self) -> Option<String> {
        let summary = summarize_api_calls(&self.api_calls);
        self.api_calls.clear();
        match (self.current.take(), summary) {
            (Some(action), Some(summary)) => Some(format!("{action} ({summary})")),
            (Some(action), None) => Some(action),
            (None, Some(summary)) => Some(format!("API Calls: {summary}")),
            (None, None) => None,
        }
    }
}

/// Collapse a test's raw trace lines into grouped action strings.
///
/// Output order follows input order; one test's grouping is independent
/// of every other test.
#[must_use]
pub fn group_steps(steps: &[String]) -> Vec<String> {
    let mut state = GroupState::default();
    let mut actions = Vec::new();
    for step in steps {
        if let Some(action) = state.step(step) {
            actions.push(action);
        }
    }
    if let Some(action) = state.finalize() {
        actions.push(action);
    }
    actions
}
