//! The tapsnap command-line interface.
//!
//! Parses arguments, builds a [`RunConfig`], runs every case and maps the
//! outcome to an exit status: `0` all passed, `1` a case failed, `2` the run
//! could not be configured.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, ValueEnum};
use termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{RulesFile, RunConfig, RunMode, DEFAULT_EXTENSION};
use crate::errors::{Result, SnapshotError};
use crate::normalize::{NormalizationRule, Normalizer};
use crate::report::{report_results, RunSummary};
use crate::runner::SnapshotRunner;

pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "tapsnap",
    version,
    about = "Compare normalized TAP test output against recorded snapshots."
)]
pub struct TapsnapArgs {
    /// Rewrite the snapshots from the current results instead of comparing.
    #[arg(long)]
    pub overwrite: bool,

    /// Directory containing `tap_output/`.
    #[arg(long, default_value = ".")]
    pub base: PathBuf,

    /// Actual-results root (default: <BASE>/tap_output/build/test/).
    #[arg(long)]
    pub actual: Option<PathBuf>,

    /// Snapshot root (default: <BASE>/tap_output/test/).
    #[arg(long)]
    pub expected: Option<PathBuf>,

    /// Extension of result files.
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    /// YAML rules file replacing the standard normalization rules.
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Literal runtime version text to replace with a placeholder. Repeatable.
    #[arg(long = "runtime-banner", value_name = "TEXT")]
    pub runtime_banners: Vec<String>,

    /// Worker threads (default: one per CPU).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// More logging (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn choice(self) -> ColorChoice {
        match self {
            Self::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            Self::Auto | Self::Never => ColorChoice::Never,
            Self::Always => ColorChoice::Always,
        }
    }
}

impl TapsnapArgs {
    /// Builds the run configuration, compiling the rule set.
    pub fn to_config(&self) -> Result<RunConfig> {
        let mut config = RunConfig::with_base(&self.base)
            .mode(RunMode::from_overwrite_flag(self.overwrite))
            .normalizer(self.normalizer()?);
        if let Some(actual) = &self.actual {
            config.actual_root = actual.clone();
        }
        if let Some(expected) = &self.expected {
            config.expected_root = expected.clone();
        }
        config.extension = self.extension.clone();
        config.jobs = self.jobs;
        Ok(config)
    }

    fn normalizer(&self) -> Result<Normalizer> {
        let mut normalizer = match &self.rules {
            Some(path) => RulesFile::load(path)?.into_normalizer()?,
            None => Normalizer::standard(),
        };
        // Literal banners run after the base rules so that stripping line
        // numbers or annotations cannot assemble a new banner occurrence.
        for banner in &self.runtime_banners {
            normalizer.push(NormalizationRule::runtime_version(banner)?);
        }
        Ok(normalizer)
    }
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = TapsnapArgs::parse();
    init_tracing(args.verbose);

    let code = match execute(&args) {
        Ok(summary) if summary.has_failures() => EXIT_FAILED,
        Ok(_) => 0,
        Err(e) => {
            let code = if e.is_config() { EXIT_CONFIG } else { EXIT_FAILED };
            eprintln!("{:?}", miette::Report::new(e));
            code
        }
    };
    process::exit(code);
}

/// Runs all cases and prints the report to stdout.
pub fn execute(args: &TapsnapArgs) -> Result<RunSummary> {
    let config = args.to_config()?;
    let choice = args.color.choice();
    let results = SnapshotRunner::new(config).run()?;

    let mut stdout = StandardStream::stdout(choice);
    let summary = report_results(&mut stdout, &results).map_err(|e| SnapshotError::io("<stdout>", e))?;
    tracing::info!(
        passed = summary.passed,
        updated = summary.updated,
        failed = summary.failed,
        "snapshot run finished"
    );
    Ok(summary)
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
