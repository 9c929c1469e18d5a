//! tapsnap error handling.
//!
//! Every failure a case can hit is one variant of [`SnapshotError`]. Variants
//! carry a miette code and help text so the reporter can render them as rich
//! diagnostics, while `Display` stays a single readable line for logs.

use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = SnapshotError> = std::result::Result<T, E>;

#[derive(Error, Diagnostic, Debug)]
pub enum SnapshotError {
    #[error("I/O error on '{}': {source}", .path.display())]
    #[diagnostic(
        code(tapsnap::io),
        help("check that the file exists and is readable; a missing snapshot can be created with --overwrite")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk result directory: {source}")]
    #[diagnostic(code(tapsnap::walk))]
    Walk {
        #[source]
        source: walkdir::Error,
    },

    #[error("'{}' is not inside the actual-results root '{}'", .path.display(), .root.display())]
    #[diagnostic(code(tapsnap::outside_root))]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("snapshot mismatch for '{case}'")]
    #[diagnostic(
        code(tapsnap::mismatch),
        help("use --overwrite to update the snapshot")
    )]
    Mismatch {
        case: String,
        expected: String,
        actual: String,
    },

    #[error("failed to start worker pool: {source}")]
    #[diagnostic(code(tapsnap::config::jobs))]
    ThreadPool {
        #[from]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("invalid normalization rule '{pattern}': {source}")]
    #[diagnostic(code(tapsnap::config::rule))]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("runtime banner '{text}' cannot be masked: {reason}")]
    #[diagnostic(
        code(tapsnap::config::banner),
        help("pass the exact version text printed by the runtime, e.g. --runtime-banner v22.3.0")
    )]
    InvalidBanner { text: String, reason: &'static str },

    #[error("failed to load rules file '{}': {message}", .path.display())]
    #[diagnostic(
        code(tapsnap::config::rules_file),
        help("a rules file is YAML with a `rules` list of `builtin:` or `pattern:`/`replacement:` entries")
    )]
    RulesFile { path: PathBuf, message: String },
}

impl SnapshotError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True for compare-mode content mismatches, false for every other failure.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }

    /// True for errors caused by the run configuration rather than a single case.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidRule { .. }
                | Self::InvalidBanner { .. }
                | Self::RulesFile { .. }
                | Self::ThreadPool { .. }
        )
    }
}

impl From<walkdir::Error> for SnapshotError {
    fn from(source: walkdir::Error) -> Self {
        Self::Walk { source }
    }
}
