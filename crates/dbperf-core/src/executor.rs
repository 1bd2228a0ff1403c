//! Benchmark executor.
//!
//! Drives the fixed CRUD workload against an [`Executable`] backend. Every
//! public operation records its elapsed time under its own method name and
//! any backend error or wrong row count aborts the whole run.

use std::io::{self, Write};

use crate::entity::{self, Entity};
use crate::error::{Error, Result};
use crate::executable::{Executable, IdAllocation};
use crate::gc;
use crate::options::Options;
use crate::profile::Profiler;
use crate::report::Report;
use crate::timing::{operation_name, timed, Timings};

/// Prefix queried in every iteration.
pub const STRING_PREFIX: &str = "Entity no. 1";

/// Operations printed at the end of a run, in this order.
pub const REPORT_ORDER: [&str; 8] = [
    "Init",
    "PutBulk",
    "ReadAll",
    "UpdateBulk",
    "RemoveAll",
    "RemoveBulk",
    "Query100IdsBetween",
    "QueryStringPrefix",
];

/// Number of trailing ids covered by the id range query.
const ID_RANGE_SPAN: usize = 100;

/// Lifecycle of an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Constructed, backend not initialized yet.
    Created,
    /// Backend storage is ready.
    Initialized,
    /// At least one run completed and was reported.
    Reported,
    /// Backend closed and storage removed.
    Closed,
}

/// Runs the benchmark workload against one backend.
///
/// The backend is closed when [`Executor::close`] is called or, failing
/// that, when the executor is dropped.
pub struct Executor<E: Executable> {
    exec: E,
    times: Timings,
    stage: Stage,
}

impl<E: Executable> Executor<E> {
    /// Wrap a backend without initializing it.
    pub fn new(exec: E) -> Self {
        Self {
            exec,
            times: Timings::new(),
            stage: Stage::Created,
        }
    }

    /// Wrap a backend and initialize its storage.
    pub fn create(exec: E) -> Result<Self> {
        let mut executor = Self::new(exec);
        executor.init()?;
        Ok(executor)
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Recorded timing series.
    pub fn timings(&self) -> &Timings {
        &self.times
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &E {
        &self.exec
    }

    pub fn init(&mut self) -> Result<()> {
        let result = timed!(self.times, self.exec.init());
        result.map_err(|e| Error::backend(operation_name!(), e))?;
        self.stage = Stage::Initialized;
        tracing::debug!(backend = self.exec.name(), "backend initialized");
        Ok(())
    }

    /// Close the backend and remove its storage. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.stage == Stage::Closed {
            return Ok(());
        }
        self.stage = Stage::Closed;
        let result = timed!(self.times, self.exec.close());
        result.map_err(|e| Error::backend(operation_name!(), e))?;
        tracing::debug!(backend = self.exec.name(), "backend closed");
        Ok(())
    }

    /// Run the workload and print the table to stdout.
    pub fn run(&mut self, options: &Options) -> Result<Report> {
        let report = self.execute(options)?;
        let stdout = io::stdout();
        report.write_table(&mut stdout.lock())?;
        Ok(report)
    }

    /// Run the workload `options.runs` times and return the aggregated
    /// report without printing it.
    pub fn execute(&mut self, options: &Options) -> Result<Report> {
        if !matches!(self.stage, Stage::Initialized | Stage::Reported) {
            return Err(Error::NotInitialized);
        }

        let profiler = if options.profile {
            Some(Profiler::start(Profiler::default_output())?)
        } else {
            None
        };

        let result = self.iterate(options);
        let stopped = profiler.map(Profiler::stop).transpose();
        let size = result?;
        stopped?;

        self.stage = Stage::Reported;
        Ok(Report::new(&self.times, &REPORT_ORDER).with_db_size(size))
    }

    /// The iteration loop. Returns the database size measured after the
    /// update phase of the last iteration.
    fn iterate(&mut self, options: &Options) -> Result<u64> {
        tracing::info!(
            backend = self.exec.name(),
            runs = options.runs,
            count = options.count,
            "running the test {} times with {} objects",
            options.runs,
            options.count
        );

        let _manual = if options.manual_gc {
            tracing::info!("using manual GC management");
            Some(gc::disable_automatic())
        } else {
            None
        };

        let mut inserts = self.prepare_data(options.count);
        let mut size = 0;

        for i in 0..options.runs {
            self.put_bulk(&mut inserts)?;
            let mut items = self.read_all(options.count)?;
            self.update_bulk(&mut items)?;

            size = self.size()?;

            if items.len() >= ID_RANGE_SPAN {
                let min = items[items.len() - ID_RANGE_SPAN].id;
                let max = items[items.len() - 1].id;
                let expected = self.expected_id_range_count(&items, min, max);
                self.query_100_ids_between(min, max, expected)?;
            }

            let expected = items
                .iter()
                .filter(|item| item.text.starts_with(STRING_PREFIX))
                .count();
            tracing::info!("QueryStringPrefix must match {} items", expected);
            self.query_string_prefix(STRING_PREFIX, expected)?;

            self.remove_all()?;

            // insert again and delete by id
            entity::clear_ids(&mut inserts);
            self.put_bulk(&mut inserts)?;
            self.remove_bulk(&inserts)?;

            tracing::info!("{}/{} finished", i + 1, options.runs);

            if options.manual_gc {
                drop(items);
                gc::collect();
                tracing::info!("{}/{} garbage-collector executed", i + 1, options.runs);
            }
        }

        Ok(size)
    }

    /// Number of entities `query_100_ids_between(min, max)` must return.
    ///
    /// Dense backends must return the whole range; for sparse ones only the
    /// ids actually present in `items` are expected.
    pub fn expected_id_range_count(&self, items: &[Entity], min: u64, max: u64) -> usize {
        match self.exec.id_allocation() {
            IdAllocation::Dense => max.saturating_sub(min) as usize + 1,
            IdAllocation::Sparse => items
                .iter()
                .filter(|item| (min..=max).contains(&item.id))
                .count(),
        }
    }

    pub fn prepare_data(&mut self, count: usize) -> Vec<Entity> {
        timed!(
            self.times,
            (0..count).map(Entity::numbered).collect::<Vec<_>>()
        )
    }

    pub fn put_bulk(&mut self, items: &mut [Entity]) -> Result<()> {
        let result = timed!(self.times, self.exec.put_bulk(items));
        result.map_err(|e| Error::backend(operation_name!(), e))
    }

    /// Submit every item through the backend's non-blocking insert, then
    /// wait once for all of them to become durable.
    pub fn put_async(&mut self, items: &mut [Entity]) -> Result<()> {
        let exec = &mut self.exec;
        let result = timed!(
            self.times,
            items
                .iter_mut()
                .try_for_each(|item| exec.put_async(item))
                .and_then(|()| exec.await_async_completion())
        );
        result.map_err(|e| Error::backend(operation_name!(), e))
    }

    pub fn read_all(&mut self, expected_count: usize) -> Result<Vec<Entity>> {
        let result = timed!(self.times, self.exec.read_all());
        let items = result.map_err(|e| Error::backend(operation_name!(), e))?;
        check_count(operation_name!(), expected_count, items.len())?;
        Ok(items)
    }

    /// Double every item's `int64` in memory.
    pub fn change_values(&mut self, items: &mut [Entity]) {
        timed!(
            self.times,
            items.iter_mut().for_each(|item| item.int64 *= 2)
        )
    }

    /// Re-submit already stored items through the bulk put path.
    pub fn update_bulk(&mut self, items: &mut [Entity]) -> Result<()> {
        let result = timed!(self.times, self.exec.put_bulk(items));
        result.map_err(|e| Error::backend(operation_name!(), e))
    }

    pub fn remove_all(&mut self) -> Result<()> {
        let result = timed!(self.times, self.exec.remove_all());
        result.map_err(|e| Error::backend(operation_name!(), e))
    }

    pub fn remove_bulk(&mut self, items: &[Entity]) -> Result<()> {
        let result = timed!(self.times, self.exec.remove_bulk(items));
        result.map_err(|e| Error::backend(operation_name!(), e))
    }

    /// On-disk size of the backend storage. Not timed.
    pub fn size(&self) -> Result<u64> {
        self.exec
            .size()
            .map_err(|e| Error::backend(operation_name!(), e))
    }

    pub fn query_100_ids_between(&mut self, min: u64, max: u64, expected: usize) -> Result<()> {
        let result = timed!(self.times, self.exec.query_id_between(min, max));
        let items = result.map_err(|e| Error::backend(operation_name!(), e))?;
        if items.len() != expected {
            tracing::error!(min, max, expected, actual = items.len(), "id range query mismatch");
        }
        check_count(operation_name!(), expected, items.len())
    }

    pub fn query_string_prefix(&mut self, prefix: &str, expected_count: usize) -> Result<()> {
        let result = timed!(self.times, self.exec.query_string_prefix(prefix));
        let items = result.map_err(|e| Error::backend(operation_name!(), e))?;
        check_count(operation_name!(), expected_count, items.len())
    }

    /// Print the timing table for `functions`, or for every recorded
    /// operation when the list is empty.
    pub fn print_times<W: Write>(&self, functions: &[&str], out: &mut W) -> io::Result<()> {
        Report::new(&self.times, functions).write_table(out)
    }
}

impl<E: Executable> Drop for Executor<E> {
    fn drop(&mut self) {
        if self.stage != Stage::Closed {
            if let Err(e) = self.close() {
                tracing::error!(error = %e, "failed to close backend");
            }
        }
    }
}

fn check_count(operation: String, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::CountMismatch {
            operation,
            expected,
            actual,
        })
    }
}
