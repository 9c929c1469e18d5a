//! Handles all user-facing output for a run.
//!
//! Each case is printed as one PASS / FAIL / UPDATED line. Mismatches get a
//! colored line diff, every other failure is rendered as a miette report.

use std::io::{self, Write};

use difference::{Changeset, Difference};
use miette::{GraphicalReportHandler, GraphicalTheme};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::errors::SnapshotError;
use crate::task::TaskOutcome;

/// Result of one case.
#[derive(Debug)]
pub struct CaseResult {
    pub name: String,
    pub outcome: Result<TaskOutcome, SnapshotError>,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Counts for the summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub updated: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_results(results: &[CaseResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match &result.outcome {
                Ok(TaskOutcome::Matched) => summary.passed += 1,
                Ok(TaskOutcome::Overwritten) => summary.updated += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn total(&self) -> usize {
        self.passed + self.updated + self.failed
    }
}

/// Prints every case, then the summary, and returns the counts.
pub fn report_results<W: WriteColor>(out: &mut W, results: &[CaseResult]) -> io::Result<RunSummary> {
    let colored = out.supports_color();
    for result in results {
        match &result.outcome {
            Ok(TaskOutcome::Matched) => status_line(out, "PASS", Color::Green, &result.name)?,
            Ok(TaskOutcome::Overwritten) => status_line(out, "UPDATED", Color::Cyan, &result.name)?,
            Err(err) => {
                status_line(out, "FAIL", Color::Red, &result.name)?;
                print_failure(out, err, colored)?;
            }
        }
    }

    let summary = RunSummary::from_results(results);
    writeln!(out)?;
    out.set_color(ColorSpec::new().set_bold(true))?;
    write!(out, "Snapshot summary:")?;
    out.reset()?;
    writeln!(
        out,
        " total {}, passed {}, updated {}, failed {}",
        summary.total(),
        summary.passed,
        summary.updated,
        summary.failed
    )?;

    if summary.has_failures() {
        writeln!(out, "\nFailed cases:")?;
        for result in results.iter().filter(|r| !r.passed()) {
            writeln!(out, "  - {}", result.name)?;
        }
    }
    Ok(summary)
}

fn status_line<W: WriteColor>(out: &mut W, label: &str, color: Color, name: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{label}")?;
    out.reset()?;
    writeln!(out, ": {name}")
}

fn print_failure<W: WriteColor>(out: &mut W, err: &SnapshotError, colored: bool) -> io::Result<()> {
    if let SnapshotError::Mismatch {
        expected, actual, ..
    } = err
    {
        writeln!(out, "  snapshot differs (- expected, + actual):")?;
        let changeset = Changeset::new(expected, actual, "\n");
        print_diff(out, &changeset.diffs)?;
    }

    let theme = if colored {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let mut rendered = String::new();
    // Writing into a String cannot fail.
    let _ = GraphicalReportHandler::new_themed(theme).render_report(&mut rendered, err);
    for line in rendered.lines() {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}

fn print_diff<W: WriteColor>(out: &mut W, diffs: &[Difference]) -> io::Result<()> {
    for diff in diffs {
        let (prefix, color, text) = match diff {
            Difference::Same(x) => (' ', None, x),
            Difference::Add(x) => ('+', Some(Color::Green), x),
            Difference::Rem(x) => ('-', Some(Color::Red), x),
        };
        out.set_color(ColorSpec::new().set_fg(color))?;
        for line in text.split('\n') {
            writeln!(out, "  {prefix}{line}")?;
        }
        out.reset()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    fn render(results: &[CaseResult]) -> (String, RunSummary) {
        let mut buf = Buffer::no_color();
        let summary = report_results(&mut buf, results).unwrap();
        (String::from_utf8(buf.into_inner()).unwrap(), summary)
    }

    #[test]
    fn summarizes_mixed_results() {
        let results = vec![
            CaseResult {
                name: "a".into(),
                outcome: Ok(TaskOutcome::Matched),
            },
            CaseResult {
                name: "dir/b".into(),
                outcome: Err(SnapshotError::Mismatch {
                    case: "dir/b".into(),
                    expected: "ok 1 - x\n".into(),
                    actual: "not ok 1 - x\n".into(),
                }),
            },
        ];
        let (text, summary) = render(&results);
        assert_eq!(
            summary,
            RunSummary {
                passed: 1,
                updated: 0,
                failed: 1
            }
        );
        assert!(text.contains("PASS: a"));
        assert!(text.contains("FAIL: dir/b"));
        assert!(text.contains("-ok 1 - x"));
        assert!(text.contains("+not ok 1 - x"));
        assert!(text.contains("use --overwrite to update the snapshot"));
        assert!(text.contains("Failed cases:\n  - dir/b"));
    }

    #[test]
    fn overwrite_run_reports_updates() {
        let results = vec![CaseResult {
            name: "a".into(),
            outcome: Ok(TaskOutcome::Overwritten),
        }];
        let (text, summary) = render(&results);
        assert!(!summary.has_failures());
        assert_eq!(summary.updated, 1);
        assert!(text.contains("UPDATED: a"));
        assert!(!text.contains("Failed cases"));
    }
}
