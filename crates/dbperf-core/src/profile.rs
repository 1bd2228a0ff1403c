//! Sampling profiler wrapped around a whole benchmark run.
//!
//! Requires the `profiling` feature; without it [`Profiler::start`] fails so
//! a requested profile is never silently skipped.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Sampling frequency in Hz.
#[cfg(feature = "profiling")]
const SAMPLE_FREQUENCY: i32 = 1000;

/// A running profiler. Call [`Profiler::stop`] to write the flamegraph.
pub struct Profiler {
    #[cfg(feature = "profiling")]
    guard: pprof::ProfilerGuard<'static>,
    output: PathBuf,
}

impl Profiler {
    /// Default flamegraph location for this process.
    pub fn default_output() -> PathBuf {
        std::env::temp_dir().join(format!("dbperf-{}.svg", std::process::id()))
    }

    /// Start sampling the current process.
    pub fn start(output: impl Into<PathBuf>) -> Result<Self> {
        let output = output.into();

        #[cfg(feature = "profiling")]
        {
            let guard = pprof::ProfilerGuardBuilder::default()
                .frequency(SAMPLE_FREQUENCY)
                .blocklist(&["libc", "libgcc", "pthread", "vdso"])
                .build()
                .map_err(|e| Error::Profiler(e.to_string()))?;
            tracing::info!(output = %output.display(), "cpu profiling enabled");
            Ok(Self { guard, output })
        }

        #[cfg(not(feature = "profiling"))]
        {
            tracing::debug!(output = %output.display(), "profiler unavailable");
            Err(Error::Profiler(
                "built without the profiling feature".to_string(),
            ))
        }
    }

    /// Where the flamegraph is written.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Stop sampling and write the flamegraph.
    pub fn stop(self) -> Result<()> {
        #[cfg(feature = "profiling")]
        {
            let report = self
                .guard
                .report()
                .build()
                .map_err(|e| Error::Profiler(e.to_string()))?;
            let file = std::fs::File::create(&self.output)?;
            report
                .flamegraph(file)
                .map_err(|e| Error::Profiler(e.to_string()))?;
            tracing::info!(output = %self.output.display(), "cpu profiling disabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_is_per_process() {
        let output = Profiler::default_output();
        let name = output.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("dbperf-{}.svg", std::process::id()));
    }

    #[cfg(not(feature = "profiling"))]
    #[test]
    fn test_start_without_feature_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("profile.svg");
        let err = Profiler::start(&output).err().unwrap();
        assert!(matches!(err, Error::Profiler(_)));
        assert_eq!(
            err.to_string(),
            "profiler error: built without the profiling feature"
        );
        assert!(!output.exists());
    }
}
