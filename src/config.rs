//! Run configuration: mode, filesystem layout and the normalization rule set.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Result, SnapshotError};
use crate::normalize::{BuiltinRule, NormalizationRule, Normalizer};

/// Actual results, relative to the base directory.
pub const ACTUAL_ROOT: &str = "tap_output/build/test/";
/// Snapshots, relative to the base directory.
pub const EXPECTED_ROOT: &str = "tap_output/test/";
pub const DEFAULT_EXTENSION: &str = "tap";

/// Fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Normalize actual output and assert it equals the snapshot.
    #[default]
    Compare,
    /// Normalize actual output and write it as the new snapshot.
    Overwrite,
}

impl RunMode {
    pub fn from_overwrite_flag(overwrite: bool) -> Self {
        if overwrite {
            Self::Overwrite
        } else {
            Self::Compare
        }
    }
}

/// Everything a run needs, passed explicitly into every task.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub actual_root: PathBuf,
    pub expected_root: PathBuf,
    pub extension: String,
    pub mode: RunMode,
    pub normalizer: Normalizer,
    /// Worker threads; `None` uses the rayon default.
    pub jobs: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::with_base(".")
    }
}

impl RunConfig {
    /// Standard layout under `base`, compare mode, standard rules.
    pub fn with_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            actual_root: base.join(ACTUAL_ROOT),
            expected_root: base.join(EXPECTED_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            mode: RunMode::Compare,
            normalizer: Normalizer::standard(),
            jobs: None,
        }
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }
}

// ============================================================================
// RULES FILE
// ============================================================================

/// One entry of a rules file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RuleSpec {
    Builtin {
        builtin: BuiltinRule,
    },
    Pattern {
        #[serde(default)]
        name: Option<String>,
        pattern: String,
        #[serde(default)]
        replacement: String,
    },
}

/// YAML rules file replacing the standard pipeline.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    #[serde(default = "default_keep_result_lines")]
    pub keep_result_lines: bool,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

fn default_keep_result_lines() -> bool {
    true
}

impl RulesFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SnapshotError::RulesFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| match e {
            SnapshotError::RulesFile { message, .. } => SnapshotError::RulesFile {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| SnapshotError::RulesFile {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Compiles the rules in file order.
    pub fn into_normalizer(self) -> Result<Normalizer> {
        let mut normalizer = Normalizer::new().keep_result_lines(self.keep_result_lines);
        for (index, spec) in self.rules.into_iter().enumerate() {
            let rule = match spec {
                RuleSpec::Builtin { builtin } => NormalizationRule::builtin(builtin),
                RuleSpec::Pattern {
                    name,
                    pattern,
                    replacement,
                } => {
                    let name = name.unwrap_or_else(|| format!("rule-{}", index + 1));
                    NormalizationRule::new(name, &pattern, replacement)?
                }
            };
            normalizer.push(rule);
        }
        Ok(normalizer)
    }
}
