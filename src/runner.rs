//! Discovers result files and runs one [`SnapshotTask`] per file.
//!
//! Tasks are independent and run on a rayon pool fed lazily from the
//! directory walk. A failing case is recorded and never stops its siblings.
//! Results are sorted by case name so reports are stable across runs.

use rayon::iter::{ParallelBridge, ParallelIterator};
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::discovery::{ResultDiscoverer, ResultEntry};
use crate::errors::{Result, SnapshotError};
use crate::paths::PathResolver;
use crate::report::CaseResult;
use crate::task::SnapshotTask;

#[derive(Debug)]
pub struct SnapshotRunner {
    config: RunConfig,
    resolver: PathResolver,
    discoverer: ResultDiscoverer,
}

impl SnapshotRunner {
    pub fn new(config: RunConfig) -> Self {
        let resolver = PathResolver::new(&config.actual_root, &config.expected_root);
        let discoverer = ResultDiscoverer::new(config.extension.clone());
        Self {
            config,
            resolver,
            discoverer,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs every case. Only pool construction can fail the run as a whole.
    pub fn run(&self) -> Result<Vec<CaseResult>> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.jobs.unwrap_or(0))
            .thread_name(|i| format!("tapsnap-{i}"))
            .build()?;

        info!(
            mode = ?self.config.mode,
            actual = %self.config.actual_root.display(),
            expected = %self.config.expected_root.display(),
            threads = pool.current_num_threads(),
            "starting snapshot run"
        );

        let mut results: Vec<CaseResult> = pool.install(|| {
            self.discoverer
                .walk(&self.config.actual_root)
                .par_bridge()
                .map(|entry| self.run_entry(entry))
                .collect()
        });
        results.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(results)
    }

    fn run_entry(&self, entry: Result<ResultEntry>) -> CaseResult {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => return failed(walk_error_name(&err), err),
        };
        let paths = match self.resolver.resolve(&entry.parent, &entry.file_name) {
            Ok(paths) => paths,
            Err(err) => return failed(entry.path().display().to_string(), err),
        };

        let task = SnapshotTask::new(paths, self.config.mode, &self.config.normalizer);
        let outcome = task.run();
        if let Err(err) = &outcome {
            warn!(case = task.name(), error = %err, "case failed");
        }
        CaseResult {
            name: task.name().to_string(),
            outcome,
        }
    }
}

/// Convenience wrapper around [`SnapshotRunner`].
pub fn run(config: RunConfig) -> Result<Vec<CaseResult>> {
    SnapshotRunner::new(config).run()
}

fn failed(name: String, err: SnapshotError) -> CaseResult {
    warn!(case = %name, error = %err, "case failed");
    CaseResult {
        name,
        outcome: Err(err),
    }
}

fn walk_error_name(err: &SnapshotError) -> String {
    match err {
        SnapshotError::Walk { source } => source
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<walk>".to_string()),
        other => other.to_string(),
    }
}
