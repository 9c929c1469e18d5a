//! tapsnap: snapshot comparison for TAP test output.
//!
//! Result files under an actual-results root are normalized (timings, stack
//! line numbers and runtime banners removed) and compared byte for byte with
//! snapshots under a mirrored expected root, or written over them in
//! overwrite mode.
//!
//! ```rust,no_run
//! use tapsnap::{RunConfig, RunMode, SnapshotRunner};
//!
//! let config = RunConfig::with_base(".").mode(RunMode::Compare);
//! let results = SnapshotRunner::new(config).run()?;
//! assert!(results.iter().all(|r| r.passed()));
//! # Ok::<(), tapsnap::SnapshotError>(())
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod normalize;
pub mod paths;
pub mod report;
pub mod runner;
pub mod task;

pub use crate::config::{RunConfig, RunMode};
pub use crate::errors::SnapshotError;
pub use crate::normalize::{BuiltinRule, NormalizationRule, Normalizer};
pub use crate::report::{CaseResult, RunSummary};
pub use crate::runner::SnapshotRunner;
pub use crate::task::{SnapshotTask, TaskOutcome};
