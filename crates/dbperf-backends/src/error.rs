//! Backend error types.

use thiserror::Error;

/// Errors raised by the storage backends.
#[derive(Debug, Error)]
pub enum Error {
    /// sled storage error.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// redb could not open or create the database file.
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    /// redb transaction could not be started.
    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    /// redb table could not be opened or deleted.
    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    /// redb storage layer error.
    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    /// redb commit failed.
    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    /// Filesystem error while preparing or removing the storage directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Record encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// Stored key is not an 8-byte id.
    #[error("invalid key length: {0}")]
    InvalidKey(usize),

    /// Fewer entities were removed than requested.
    #[error("removed only {removed} out of {requested} objects")]
    RemovedCount { removed: usize, requested: usize },

    /// Operation called before `init` or after `close`.
    #[error("database is not open")]
    NotOpen,
}
