use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::errors::{Result, SnapshotError};

/// A result file found under the actual-results root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    /// Directory the file lives in.
    pub parent: PathBuf,
    pub file_name: OsString,
}

impl ResultEntry {
    pub fn path(&self) -> PathBuf {
        self.parent.join(&self.file_name)
    }
}

/// Discovers result files by extension.
#[derive(Debug, Clone)]
pub struct ResultDiscoverer {
    extension: String,
}

impl ResultDiscoverer {
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.').to_string();
        Self { extension }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns true if the file name ends with `.<extension>` and has a stem.
    pub fn is_result_file(&self, name: &OsStr) -> bool {
        let path = Path::new(name);
        path.extension().is_some_and(|ext| ext == self.extension.as_str())
            && path.file_stem().is_some_and(|stem| !stem.is_empty())
    }

    /// Lazily walks `root` and yields every matching regular file exactly once.
    ///
    /// Order follows the filesystem. Traversal errors (including a missing
    /// root) are yielded as items so that one unreadable directory does not
    /// hide the files in the others.
    pub fn walk<P: AsRef<Path>>(&self, root: P) -> impl Iterator<Item = Result<ResultEntry>> + Send {
        let this = self.clone();
        WalkDir::new(root.as_ref())
            .into_iter()
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(SnapshotError::from(e))),
                };
                if !this.is_result_file(entry.file_name()) || !is_file(&entry) {
                    return None;
                }
                let parent = entry.path().parent()?.to_path_buf();
                Some(Ok(ResultEntry {
                    parent,
                    file_name: entry.file_name().to_os_string(),
                }))
            })
    }
}

/// Regular files, and symlinks that resolve to one. Links are not followed
/// during the walk itself.
fn is_file(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

impl Default for ResultDiscoverer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;

    #[test]
    fn matches_extension_only() {
        let d = ResultDiscoverer::new(".tap");
        assert_eq!(d.extension(), "tap");
        assert!(d.is_result_file(OsStr::new("basic.tap")));
        assert!(!d.is_result_file(OsStr::new("basic.tap.bak")));
        assert!(!d.is_result_file(OsStr::new("basic.txt")));
        assert!(!d.is_result_file(OsStr::new("tap")));
    }

    #[test]
    fn walks_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::create_dir_all(root.join("skip.tap")).unwrap();
        fs::write(root.join("top.tap"), "").unwrap();
        fs::write(root.join("a/mid.tap"), "").unwrap();
        fs::write(root.join("a/b/deep.tap"), "").unwrap();
        fs::write(root.join("a/b/notes.md"), "").unwrap();

        let found: BTreeSet<PathBuf> = ResultDiscoverer::new("tap")
            .walk(root)
            .map(|e| e.unwrap().path())
            .collect();

        let expected: BTreeSet<PathBuf> = ["top.tap", "a/mid.tap", "a/b/deep.tap"]
            .iter()
            .map(|p| root.join(p))
            .collect();
        assert_eq!(found, expected);
    }

    #[cfg(unix)]
    #[test]
    fn includes_symlinked_result_files() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("linked_dir.tap")).unwrap();
        let target = dir.path().join("elsewhere.tap");
        fs::write(&target, "ok 1 - a\n").unwrap();
        symlink(&target, root.join("link.tap")).unwrap();
        symlink(dir.path().join("gone.tap"), root.join("dangling.tap")).unwrap();
        symlink(root.join("linked_dir.tap"), root.join("dir_link.tap")).unwrap();

        let found: Vec<PathBuf> = ResultDiscoverer::new("tap")
            .walk(&root)
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(found, vec![root.join("link.tap")]);
    }

    #[test]
    fn missing_root_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let results: Vec<_> = ResultDiscoverer::default()
            .walk(dir.path().join("nope"))
            .collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(SnapshotError::Walk { .. })));
    }
}
