//! Benchmark run configuration.

use std::path::PathBuf;

/// Default storage directory.
pub const DEFAULT_PATH: &str = "testdata";

/// Default number of entities per run.
pub const DEFAULT_COUNT: usize = 10_000;

/// Default number of iterations.
pub const DEFAULT_RUNS: usize = 10;

/// Parameters of one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Storage directory, wiped on init and removed on close.
    ///
    /// The executor never reads it; backends own their path, so callers build
    /// the backend from this value (as the `dbperf` binary does).
    pub path: PathBuf,

    /// Number of entities written and read per iteration.
    pub count: usize,

    /// Number of iterations.
    pub runs: usize,

    /// Reclaim allocator memory between iterations, outside timed sections.
    pub manual_gc: bool,

    /// Wrap the whole run in a sampling profiler.
    pub profile: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            count: DEFAULT_COUNT,
            runs: DEFAULT_RUNS,
            manual_gc: false,
            profile: false,
        }
    }
}

impl Options {
    /// Create options with the given storage path and default values otherwise.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the number of entities.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the number of iterations.
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    /// Enable or disable manual memory reclamation.
    pub fn with_manual_gc(mut self, manual_gc: bool) -> Self {
        self.manual_gc = manual_gc;
        self
    }

    /// Enable or disable profiling.
    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }
}
