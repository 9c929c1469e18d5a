//! Scratch `tap_output/` trees for snapshot tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tapsnap::{RunConfig, RunMode};
use tempfile::TempDir;

pub struct TapTree {
    dir: TempDir,
}

impl TapTree {
    pub fn new() -> Self {
        let tree = Self {
            dir: tempfile::tempdir().expect("tempdir"),
        };
        fs::create_dir_all(tree.actual_root()).expect("actual root");
        tree
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn actual_root(&self) -> PathBuf {
        self.base().join("tap_output/build/test")
    }

    pub fn expected_root(&self) -> PathBuf {
        self.base().join("tap_output/test")
    }

    /// Writes an actual result file at `rel` (relative to the actual root).
    pub fn actual(&self, rel: &str, content: &str) -> PathBuf {
        write_file(&self.actual_root().join(rel), content)
    }

    /// Writes a snapshot at `rel` (relative to the expected root).
    pub fn expected(&self, rel: &str, content: &str) -> PathBuf {
        write_file(&self.expected_root().join(rel), content)
    }

    pub fn read_expected(&self, rel: &str) -> String {
        fs::read_to_string(self.expected_root().join(rel)).expect("read snapshot")
    }

    pub fn config(&self, mode: RunMode) -> RunConfig {
        RunConfig::with_base(self.base()).mode(mode)
    }
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir");
    }
    fs::write(path, content).expect("write file");
    path.to_path_buf()
}
