//! Multi-dialect log parsing.
//!
//! A single run log may mix two line conventions:
//!
//! - **Cucumber dialect**: `Starting Scenario: <name>` opens a scenario
//!   block; protocol trace lines inside the block belong to it.
//! - **Playwright dialect**: `✓ <index> <file:line> › <title> (<ms>ms)`
//!   titles a finished test; trace lines with a timing suffix follow it.
//!
//! Parsing runs a small state machine over an ordered rule table
//! (boundary rules always win over trace rules). Lines are stripped of a
//! leading ISO-8601 timestamp and non-alphanumeric noise before matching;
//! a line matching no rule is dropped, never an error.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};

/// Protocol action marker shared by both dialects.
const ACTION_MARKER: &str = "pw:api";

/// The Playwright title checkmark. Exempt from noise stripping: it is a
/// boundary marker the title rule anchors on.
const PLAYWRIGHT_CHECKMARK: char = '✓';

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z\s+").expect("timestamp regex")
});
static CUCUMBER_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Starting Scenario: (.*)").expect("cucumber title regex"));
static PLAYWRIGHT_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^✓\s+\d+\s+[\w/.-]+:\d+:\d+\s+›\s+.*?(?:\s+\([\d.]+ms\))?$")
        .expect("playwright title regex")
});
static PLAYWRIGHT_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Marker, then the action text, then an ANSI-colored `+<elapsed>`
    // timing suffix.
    Regex::new(r"pw:api.*?=>\s*.*?\s*[\x1b\[\d;]+m\+").expect("playwright action regex")
});

static ACTION_FINDER: LazyLock<memchr::memmem::Finder<'static>> =
    LazyLock::new(|| memchr::memmem::Finder::new(ACTION_MARKER));

/// Which line convention the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// No boundary seen yet.
    #[default]
    None,
    /// Inside a `Starting Scenario:` block.
    Cucumber,
    /// After a Playwright test title.
    Playwright,
}

/// A single parsed test: identifier plus raw trace lines in encounter
/// order.
///
/// The identifier is the raw matched title line (Playwright) or the
/// captured scenario name (Cucumber). Uniqueness is not enforced:
/// duplicate titles are legal and stay distinct by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    /// Stable identifier.
    pub id: String,
    /// Raw trace lines in encounter order.
    pub steps: Vec<String>,
}

/// Outcome of matching one stripped line against the dialect rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineRule {
    /// `Starting Scenario: <name>` — opens a Cucumber block.
    CucumberTitle(String),
    /// Trace line inside a Cucumber block.
    CucumberAction,
    /// `✓ <index> <file:line> › <title>` — a finished Playwright test.
    PlaywrightTitle,
    /// Trace line with a Playwright timing suffix.
    PlaywrightAction,
    /// Anything else.
    Ignored,
}

/// Match a stripped line against the rule table. Order matters: boundary
/// rules are tried before trace rules, so a title always wins.
fn match_line(line: &str, dialect: Dialect) -> LineRule {
    if let Some(captures) = CUCUMBER_TITLE_RE.captures(line) {
        return LineRule::CucumberTitle(captures[1].to_string());
    }
    if dialect == Dialect::Cucumber && is_cucumber_action(line) {
        return LineRule::CucumberAction;
    }
    if PLAYWRIGHT_TITLE_RE.is_match(line) {
        return LineRule::PlaywrightTitle;
    }
    if dialect == Dialect::Playwright && is_playwright_action(line) {
        return LineRule::PlaywrightAction;
    }
    LineRule::Ignored
}

/// Cucumber trace lines carry the marker followed by a space.
fn is_cucumber_action(line: &str) -> bool {
    memchr::memmem::find_iter(line.as_bytes(), ACTION_MARKER.as_bytes())
        .any(|idx| line.as_bytes().get(idx + ACTION_MARKER.len()) == Some(&b' '))
}

fn is_playwright_action(line: &str) -> bool {
    // Cheap marker reject before the regex runs.
    ACTION_FINDER.find(line.as_bytes()).is_some() && PLAYWRIGHT_ACTION_RE.is_match(line)
}

/// Strip leading noise from a raw line before pattern matching: outer
/// whitespace, non-alphanumeric noise, and an ISO-8601 timestamp prefix.
fn strip_line(line: &str) -> &str {
    let line = strip_noise(line.trim());
    let line = match TIMESTAMP_RE.find(line) {
        Some(found) => &line[found.end()..],
        None => line,
    };
    strip_noise(line)
}

fn strip_noise(line: &str) -> &str {
    line.trim_start_matches(|c: char| !c.is_ascii_alphanumeric() && c != PLAYWRIGHT_CHECKMARK)
}

/// Streaming parser: feed lines, then [`finish`](LogParser::finish).
///
/// At most one Cucumber test is pending (unemitted) at a time; Playwright
/// tests are pushed eagerly on their title line, even with zero steps.
#[derive(Debug, Default)]
pub struct LogParser {
    dialect: Dialect,
    tests: Vec<Test>,
    /// Pending Cucumber test, not yet emitted.
    pending: Option<Test>,
    /// Index of the eagerly pushed Playwright test receiving steps.
    current_playwright: Option<usize>,
}

impl LogParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw line.
    pub fn push_line(&mut self, line: &str) {
        let stripped = strip_line(line);
        match match_line(stripped, self.dialect) {
            LineRule::CucumberTitle(name) => {
                self.flush_pending();
                self.pending = Some(Test {
                    id: name,
                    steps: Vec::new(),
                });
                self.current_playwright = None;
                self.dialect = Dialect::Cucumber;
            }
            LineRule::CucumberAction => {
                if let Some(test) = self.pending.as_mut() {
                    test.steps.push(stripped.to_string());
                }
            }
            LineRule::PlaywrightTitle => {
                self.flush_pending();
                self.tests.push(Test {
                    id: stripped.to_string(),
                    steps: Vec::new(),
                });
                self.current_playwright = Some(self.tests.len() - 1);
                self.dialect = Dialect::Playwright;
            }
            LineRule::PlaywrightAction => {
                if let Some(index) = self.current_playwright {
                    self.tests[index].steps.push(stripped.to_string());
                }
            }
            LineRule::Ignored => {}
        }
    }

    /// A Cucumber block with no qualifying trace lines is discarded.
    fn flush_pending(&mut self) {
        if let Some(test) = self.pending.take() {
            if !test.steps.is_empty() {
                self.tests.push(test);
            }
        }
    }

    /// Finish parsing and return the ordered test list.
    #[must_use]
    pub fn finish(mut self) -> Vec<Test> {
        self.flush_pending();
        self.tests
    }
}

/// Parse raw log text into an ordered list of tests.
#[must_use]
pub fn parse_log(content: &str) -> Vec<Test> {
    let mut parser = LogParser::new();
    for line in content.lines() {
        parser.push_line(line);
    }
    parser.finish()
}

/// Read and parse a log file.
///
/// An unreadable input is fatal and reported once with the path and the
/// underlying I/O error.
pub fn parse_log_file(path: &Path) -> Result<Vec<Test>> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_log(&content))
}
