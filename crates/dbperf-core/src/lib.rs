//! dbperf Core - Benchmark executor for embedded storage backends.
//!
//! The executor drives a fixed CRUD workload against anything implementing
//! [`Executable`], times every phase, checks row counts between phases and
//! prints the aggregated timings.
//!
//! # Usage
//!
//! ```ignore
//! use dbperf_core::{Executor, Options};
//!
//! let options = Options::default().with_count(1000).with_runs(3);
//! let mut executor = Executor::create(backend)?;
//! let result = executor.run(&options);
//! executor.close()?;
//! result?;
//! ```

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod entity;
pub mod error;
pub mod executable;
pub mod executor;
pub mod gc;
pub mod options;
pub mod profile;
pub mod report;
pub mod timing;

pub use entity::Entity;
pub use error::{BoxError, Error};
pub use executable::{Executable, IdAllocation};
pub use executor::{Executor, Stage, REPORT_ORDER, STRING_PREFIX};
pub use options::Options;
pub use profile::Profiler;
pub use report::{OperationTimes, Report};
pub use timing::Timings;
