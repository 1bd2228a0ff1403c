//! dbperf - embedded storage benchmark runner.
//!
//! Runs the CRUD workload against one backend and prints the timing report.

mod args;

use std::error::Error;
use std::io;

use clap::Parser;
use dbperf_backends::{RedbBackend, SledBackend, SqliteBackend};
use dbperf_core::{Executable, Executor, Options};

use args::{Args, Backend, OutputFormat};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbperf=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!(error = %e, "benchmark failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let backend = args.backend;
    let format = args.format;
    let options = args.into_options();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?backend,
        path = %options.path.display(),
        format = %format,
        "starting benchmark"
    );

    match backend {
        Backend::Sled => run_with(SledBackend::new(&options.path), &options, format),
        Backend::Sqlite => run_with(SqliteBackend::new(&options.path), &options, format),
        Backend::Redb => run_with(RedbBackend::new(&options.path), &options, format),
    }
}

/// Run the workload on one backend. The executor is closed before any
/// error is returned.
fn run_with<E: Executable>(
    backend: E,
    options: &Options,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let mut executor = Executor::create(backend)?;

    let result = report(&mut executor, options, format);
    let closed = executor.close();

    result?;
    closed?;
    Ok(())
}

fn report<E: Executable>(
    executor: &mut Executor<E>,
    options: &Options,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Table => {
            executor.run(options)?;
        }
        OutputFormat::Json => {
            let report = executor.execute(options)?;
            report.write_json(&mut io::stdout().lock())?;
        }
    }
    Ok(())
}
