//! One snapshot case: normalize an actual result file and compare it with,
//! or write it over, its snapshot.
//!
//! Both file handles are owned locals of [`SnapshotTask::run`], so they are
//! closed on every exit path: success, `?` propagation, and unwinding.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::config::RunMode;
use crate::errors::{Result, SnapshotError};
use crate::normalize::Normalizer;
use crate::paths::ResolvedPaths;

/// How a successful case ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Compare mode: normalized output equals the snapshot.
    Matched,
    /// Overwrite mode: the snapshot was rewritten.
    Overwritten,
}

#[derive(Debug, Clone)]
pub struct SnapshotTask<'a> {
    paths: ResolvedPaths,
    mode: RunMode,
    normalizer: &'a Normalizer,
}

impl<'a> SnapshotTask<'a> {
    pub fn new(paths: ResolvedPaths, mode: RunMode, normalizer: &'a Normalizer) -> Self {
        Self {
            paths,
            mode,
            normalizer,
        }
    }

    pub fn name(&self) -> &str {
        &self.paths.case_name
    }

    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    pub fn run(&self) -> Result<TaskOutcome> {
        let paths = &self.paths;
        ensure_dir(&paths.expected_dir)?;

        debug!(case = %paths.case_name, actual = %paths.actual_path.display(), "opening result file");
        let mut actual = File::open(&paths.actual_path)
            .map_err(|e| SnapshotError::io(&paths.actual_path, e))?;

        match self.mode {
            RunMode::Overwrite => {
                // The snapshot is only truncated once the new content is known.
                let raw = read_text(&mut actual, &paths.actual_path)?;
                let normalized = self.normalizer.normalize(&raw);
                let mut expected = File::create(&paths.expected_path)
                    .map_err(|e| SnapshotError::io(&paths.expected_path, e))?;
                expected
                    .write_all(normalized.as_bytes())
                    .and_then(|()| expected.flush())
                    .map_err(|e| SnapshotError::io(&paths.expected_path, e))?;
                debug!(
                    case = %paths.case_name,
                    bytes = normalized.len(),
                    "snapshot written"
                );
                Ok(TaskOutcome::Overwritten)
            }
            RunMode::Compare => {
                let mut expected = File::open(&paths.expected_path)
                    .map_err(|e| SnapshotError::io(&paths.expected_path, e))?;
                let (raw, stored) = rayon::join(
                    || read_text(&mut actual, &paths.actual_path),
                    || read_text(&mut expected, &paths.expected_path),
                );
                let (raw, stored) = (raw?, stored?);
                let normalized = self.normalizer.normalize(&raw);
                if normalized == stored {
                    debug!(case = %paths.case_name, "snapshot matched");
                    Ok(TaskOutcome::Matched)
                } else {
                    Err(SnapshotError::Mismatch {
                        case: paths.case_name.clone(),
                        expected: stored,
                        actual: normalized,
                    })
                }
            }
        }
    }
}

/// `create_dir_all` that treats a directory created concurrently as success.
fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(SnapshotError::io(dir, e)),
    }
}

/// Reads the whole file. Invalid UTF-8 becomes U+FFFD instead of an error.
fn read_text(file: &mut File, path: &Path) -> Result<String> {
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| SnapshotError::io(path, e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
