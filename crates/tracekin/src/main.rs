//! TraceKin CLI - find near-duplicate end-to-end tests from run logs.
//!
//! Thin wrapper over `tracekin-core`: parses a run log, compares every
//! pair of tests, and emits the pair reports as JSON (machine contract)
//! or a plain text summary (no ANSI escapes).

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracekin_core::compare::{PairReport, analyze_log_file};
use tracekin_core::config::Config;
use tracekin_core::logging::init_logging;
use tracekin_core::parser::{Test, parse_log_file};

#[derive(Parser)]
#[command(name = "tk", version, about = "Test trace similarity analyzer")]
struct Cli {
    /// Path to a tracekin.toml (defaults to ./tracekin.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a run log and compare every pair of tests
    Analyze {
        /// Path to the run log
        #[arg(long)]
        log: PathBuf,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Merge-candidate similarity threshold override (percent)
        #[arg(long)]
        threshold: Option<f64>,

        /// Minimum raw step count override
        #[arg(long)]
        min_steps: Option<usize>,

        /// Only report pairs at or above this similarity (percent)
        #[arg(long)]
        min_similarity: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Parse a run log and dump the test list
    Parse {
        /// Path to the run log
        #[arg(long)]
        log: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// JSON on stdout (stable schema)
    Json,
    /// Human-readable summary, no ANSI escapes
    Plain,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    init_logging(&config.log).context("failed to initialize logging")?;

    match cli.command {
        Command::Analyze {
            log,
            output,
            threshold,
            min_steps,
            min_similarity,
            format,
        } => {
            if let Some(threshold) = threshold {
                config.analysis.similarity_threshold = threshold;
            }
            if let Some(min_steps) = min_steps {
                config.analysis.min_steps = min_steps;
            }
            config
                .validate()
                .context("invalid analysis settings")?;

            let mut reports = analyze_log_file(&log, &config)?;
            if let Some(floor) = min_similarity {
                reports.retain(|report| report.similarity >= floor);
            }

            let rendered = match format {
                OutputFormat::Json => render_reports_json(&reports)?,
                OutputFormat::Plain => render_reports_plain(&reports),
            };
            emit(output.as_deref(), &rendered)
        }
        Command::Parse { log, format } => {
            let tests = parse_log_file(&log)?;
            tracing::debug!(tests = tests.len(), "parsed log");
            let rendered = match format {
                OutputFormat::Json => render_tests_json(&tests)?,
                OutputFormat::Plain => render_tests_plain(&tests),
            };
            emit(None, &rendered)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Config::load().context("failed to load configuration"),
    }
}

fn emit(output: Option<&Path>, rendered: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("report written to {}", path.display());
            Ok(())
        }
        None => {
            print!("{rendered}");
            Ok(())
        }
    }
}

fn render_reports_json(reports: &[PairReport]) -> anyhow::Result<String> {
    let mut rendered =
        serde_json::to_string_pretty(reports).context("failed to serialize report")?;
    rendered.push('\n');
    Ok(rendered)
}

fn render_reports_plain(reports: &[PairReport]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} pair(s) compared", reports.len());
    for report in reports {
        let flag = if report.merge_candidate {
            "  [merge candidate]"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{:>6.2}%  {}  <->  {}{}",
            report.similarity, report.name_a, report.name_b, flag
        );
        let _ = writeln!(
            out,
            "        {} identical, {} very similar, {} divergent",
            report.categories.identical,
            report.categories.very_similar,
            report.categories.divergent
        );
    }
    out
}

fn render_tests_json(tests: &[Test]) -> anyhow::Result<String> {
    let mut rendered = serde_json::to_string_pretty(tests).context("failed to serialize tests")?;
    rendered.push('\n');
    Ok(rendered)
}

fn render_tests_plain(tests: &[Test]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} test(s) parsed", tests.len());
    for test in tests {
        let _ = writeln!(out, "  {} ({} steps)", test.id, test.steps.len());
    }
    out
}
