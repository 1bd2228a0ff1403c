//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dbperf_core::options::{DEFAULT_COUNT, DEFAULT_PATH, DEFAULT_RUNS};
use dbperf_core::Options;

/// Storage backend to benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// sled object store
    Sled,
    /// Bundled SQLite
    Sqlite,
    /// redb embedded database
    Redb,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated table
    Table,
    /// JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Embedded storage benchmark runner.
#[derive(Parser, Debug)]
#[command(name = "dbperf")]
#[command(version, about = "Embedded storage benchmark runner", long_about = None)]
pub struct Args {
    /// Backend to benchmark
    #[arg(short, long, value_enum)]
    pub backend: Backend,

    /// Storage directory, wiped before and removed after the run
    #[arg(long, default_value = DEFAULT_PATH)]
    pub db: PathBuf,

    /// Number of objects per iteration
    #[arg(short, long, default_value_t = DEFAULT_COUNT)]
    pub count: usize,

    /// Number of iterations
    #[arg(short, long, default_value_t = DEFAULT_RUNS)]
    pub runs: usize,

    /// Write a CPU flamegraph of the run
    #[arg(long)]
    pub profile: bool,

    /// Return freed allocator memory between iterations
    #[arg(long)]
    pub manual_gc: bool,

    /// Report format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,
}

impl Args {
    /// Convert command-line arguments to executor options.
    pub fn into_options(self) -> Options {
        Options::new(self.db)
            .with_count(self.count)
            .with_runs(self.runs)
            .with_profile(self.profile)
            .with_manual_gc(self.manual_gc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["dbperf", "--backend", "sled"]).unwrap();
        assert_eq!(args.backend, Backend::Sled);
        assert_eq!(args.format, OutputFormat::Table);

        let options = args.into_options();
        assert_eq!(options, Options::default());
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "dbperf",
            "-b",
            "redb",
            "--db",
            "/tmp/bench",
            "--count",
            "500",
            "--runs",
            "3",
            "--profile",
            "--manual-gc",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.backend, Backend::Redb);
        assert_eq!(args.format, OutputFormat::Json);

        let options = args.into_options();
        assert_eq!(options.path, PathBuf::from("/tmp/bench"));
        assert_eq!(options.count, 500);
        assert_eq!(options.runs, 3);
        assert!(options.profile);
        assert!(options.manual_gc);
    }

    #[test]
    fn test_backend_required() {
        assert!(Args::try_parse_from(["dbperf"]).is_err());
    }

    #[test]
    fn test_unknown_backend() {
        assert!(Args::try_parse_from(["dbperf", "--backend", "postgres"]).is_err());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
