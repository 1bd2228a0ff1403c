//! Storage backends for the dbperf executor.
//!
//! Each backend is a thin pass-through to its library and implements
//! [`dbperf_core::Executable`]:
//!
//! - [`SledBackend`]: object-per-key store on sled
//! - [`SqliteBackend`]: relational table on bundled SQLite
//! - [`RedbBackend`]: native embedded B-tree database on redb

pub mod codec;
pub mod error;
pub mod redb_backend;
pub mod sled_backend;
pub mod sqlite_backend;
mod storage;

pub use error::Error;
pub use redb_backend::RedbBackend;
pub use sled_backend::SledBackend;
pub use sqlite_backend::SqliteBackend;

#[cfg(test)]
pub(crate) mod testing;
