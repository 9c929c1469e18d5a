//! Maps a file under the actual-results root to its snapshot location.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::errors::{Result, SnapshotError};

/// Resolved locations for one result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub actual_path: PathBuf,
    /// Parent directory relative to the actual root; empty at the root.
    pub subpath: PathBuf,
    pub expected_dir: PathBuf,
    pub expected_path: PathBuf,
    /// `subpath/stem` with `/` separators, used as the case name.
    pub case_name: String,
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    actual_root: PathBuf,
    expected_root: PathBuf,
}

impl PathResolver {
    pub fn new(actual_root: impl Into<PathBuf>, expected_root: impl Into<PathBuf>) -> Self {
        Self {
            actual_root: actual_root.into(),
            expected_root: expected_root.into(),
        }
    }

    pub fn actual_root(&self) -> &Path {
        &self.actual_root
    }

    pub fn expected_root(&self) -> &Path {
        &self.expected_root
    }

    /// Resolves the snapshot paths for `file_name` found in `parent`.
    ///
    /// The root prefix is removed component-wise, so a trailing separator on
    /// either root never leaks into the joined paths.
    pub fn resolve(&self, parent: &Path, file_name: &OsStr) -> Result<ResolvedPaths> {
        let subpath = parent
            .strip_prefix(&self.actual_root)
            .map_err(|_| SnapshotError::OutsideRoot {
                path: parent.join(file_name),
                root: self.actual_root.clone(),
            })?
            .to_path_buf();

        let expected_dir = if subpath.as_os_str().is_empty() {
            self.expected_root.clone()
        } else {
            self.expected_root.join(&subpath)
        };
        let expected_path = expected_dir.join(file_name);

        Ok(ResolvedPaths {
            actual_path: parent.join(file_name),
            case_name: case_name(&subpath, file_name),
            subpath,
            expected_dir,
            expected_path,
        })
    }
}

fn case_name(subpath: &Path, file_name: &OsStr) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .unwrap_or(file_name)
        .to_string_lossy();
    let mut parts: Vec<String> = subpath
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.push(stem.into_owned());
    parts.join("/")
}
