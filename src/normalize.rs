//! Text normalization for TAP output.
//!
//! A [`Normalizer`] is an ordered list of [`NormalizationRule`]s followed by a
//! line pass. Rules are regex replacements applied to the whole text in
//! sequence; the line pass strips trailing carriage returns and, when enabled,
//! keeps only `ok` / `not ok` result lines.
//!
//! The standard pipeline is idempotent: normalizing already-normalized text
//! returns it unchanged, which is what lets a snapshot written in overwrite
//! mode compare equal on the next run.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::Deserialize;

use crate::errors::{Result, SnapshotError};

/// Replacement for a whole runtime version banner line.
pub const RUNTIME_BANNER_PLACEHOLDER: &str = "# <runtime version>";

/// Replacement for a literal runtime version string.
pub const RUNTIME_VERSION_PLACEHOLDER: &str = "<runtime version>";

static TIME_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:[ \t]*# time=[\d.]+m?s)+\r*$").expect("time annotation regex")
});

static STACK_LINE_REFS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(node:internal/[^:\s)#]+)(?::\d+)+([\s)]|$)").expect("stack line reference regex")
});

static INTERNAL_STACK_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*at [^\n]*node:internal/[^\n]*(?:\n|\z)")
        .expect("internal stack block regex")
});

static RUNTIME_BANNER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^#[ \t]*(?:node|runtime)\b[^\n]*?\bv?\d+\.\d+\.\d+[^\n]*$")
        .expect("runtime banner regex")
});

static RESULT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(not )?ok \d+ - ").expect("result line regex"));

/// Rules shipped with tapsnap, addressable by name from a rules file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinRule {
    /// `ok 1 - foo # time=0.12s` becomes `ok 1 - foo`. Only a duration at
    /// the end of a line counts; `# time=` inside a description is kept.
    TimeAnnotation,
    /// `node:internal/foo:12:3` becomes `node:internal/foo`.
    StackLineRefs,
    /// Drops whole `at ... (node:internal/...)` frame lines.
    InternalStackBlock,
    /// `# node v22.3.0` becomes [`RUNTIME_BANNER_PLACEHOLDER`].
    RuntimeBanner,
}

impl BuiltinRule {
    pub fn name(self) -> &'static str {
        match self {
            Self::TimeAnnotation => "time-annotation",
            Self::StackLineRefs => "stack-line-refs",
            Self::InternalStackBlock => "internal-stack-block",
            Self::RuntimeBanner => "runtime-banner",
        }
    }
}

#[derive(Debug, Clone)]
enum Replacement {
    /// `$1`-style capture references are expanded.
    Template(String),
    /// Inserted verbatim.
    Literal(String),
}

/// One pattern/replacement step of a [`Normalizer`].
#[derive(Debug, Clone)]
pub struct NormalizationRule {
    name: String,
    pattern: Regex,
    replacement: Replacement,
}

impl NormalizationRule {
    /// Builds a rule from a regex. The replacement may reference capture groups.
    pub fn new(name: impl Into<String>, pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| SnapshotError::InvalidRule {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.into(),
            pattern: regex,
            replacement: Replacement::Template(replacement.into()),
        })
    }

    /// Builds a rule replacing every occurrence of `text` verbatim.
    pub fn literal(name: impl Into<String>, text: &str, replacement: impl Into<String>) -> Result<Self> {
        let escaped = regex::escape(text);
        let regex = Regex::new(&escaped).map_err(|source| SnapshotError::InvalidRule {
            pattern: escaped.clone(),
            source,
        })?;
        Ok(Self {
            name: name.into(),
            pattern: regex,
            replacement: Replacement::Literal(replacement.into()),
        })
    }

    /// Replaces the literal runtime version string (e.g. `v22.3.0`) with
    /// [`RUNTIME_VERSION_PLACEHOLDER`].
    ///
    /// Text that could reappear after replacement is rejected: anything that
    /// is part of the placeholder, contains `<` or `>`, or spans lines.
    pub fn runtime_version(version: &str) -> Result<Self> {
        let reason = if version.contains(&['\r', '\n'][..]) {
            Some("it spans more than one line")
        } else if version.contains(&['<', '>'][..]) || RUNTIME_VERSION_PLACEHOLDER.contains(version) {
            Some("it overlaps the placeholder it would be replaced with")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(SnapshotError::InvalidBanner {
                text: version.to_string(),
                reason,
            });
        }
        Self::literal("runtime-version", version, RUNTIME_VERSION_PLACEHOLDER)
    }

    pub fn builtin(rule: BuiltinRule) -> Self {
        let (pattern, replacement) = match rule {
            BuiltinRule::TimeAnnotation => (&*TIME_ANNOTATION, ""),
            BuiltinRule::StackLineRefs => (&*STACK_LINE_REFS, "${1}${2}"),
            BuiltinRule::InternalStackBlock => (&*INTERNAL_STACK_BLOCK, ""),
            BuiltinRule::RuntimeBanner => (&*RUNTIME_BANNER, RUNTIME_BANNER_PLACEHOLDER),
        };
        Self {
            name: rule.name().to_string(),
            pattern: pattern.clone(),
            replacement: Replacement::Template(replacement.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Applies the rule to `text`, borrowing when nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.replacement {
            Replacement::Template(rep) => self.pattern.replace_all(text, rep.as_str()),
            Replacement::Literal(rep) => self.pattern.replace_all(text, NoExpand(rep.as_str())),
        }
    }
}

/// Returns true for `ok <n> - ...` and `not ok <n> - ...` lines, indentation allowed.
pub fn is_result_line(line: &str) -> bool {
    RESULT_LINE.is_match(line)
}

/// Ordered normalization pipeline.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: Vec<NormalizationRule>,
    keep_result_lines: bool,
}

impl Normalizer {
    /// An empty pipeline: only line endings are normalized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Time annotations, stack line references and runtime banners are
    /// neutralized, then everything but result lines is dropped.
    ///
    /// Banner lines start with `#`, so the result-line filter drops them
    /// afterwards and the `runtime-banner` rule leaves no trace in the
    /// output. It only shows up in pipelines built with
    /// `keep_result_lines(false)`. A version mentioned inside a result line
    /// needs a literal rule ([`NormalizationRule::runtime_version`]).
    pub fn standard() -> Self {
        Self::new()
            .with_rule(NormalizationRule::builtin(BuiltinRule::TimeAnnotation))
            .with_rule(NormalizationRule::builtin(BuiltinRule::StackLineRefs))
            .with_rule(NormalizationRule::builtin(BuiltinRule::RuntimeBanner))
            .keep_result_lines(true)
    }

    pub fn with_rule(mut self, rule: NormalizationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn push(&mut self, rule: NormalizationRule) {
        self.rules.push(rule);
    }

    pub fn keep_result_lines(mut self, keep: bool) -> Self {
        self.keep_result_lines = keep;
        self
    }

    pub fn keeps_result_lines(&self) -> bool {
        self.keep_result_lines
    }

    pub fn rules(&self) -> &[NormalizationRule] {
        &self.rules
    }

    /// Normalizes raw TAP text.
    pub fn normalize(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for rule in &self.rules {
            let replaced = match rule.apply(&text) {
                Cow::Borrowed(_) => None,
                Cow::Owned(s) => Some(s),
            };
            if let Some(s) = replaced {
                text = s;
            }
        }

        let mut out = String::with_capacity(text.len());
        if self.keep_result_lines {
            for line in text.split('\n') {
                let line = line.trim_end_matches('\r');
                if is_result_line(line) {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        } else {
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(line.trim_end_matches('\r'));
            }
        }
        out
    }
}
