//! redb backend.
//!
//! Entities live in one table keyed by id. A second table holds the id
//! sequence so identifiers keep increasing across `remove_all`.

use std::path::{Path, PathBuf};

use dbperf_core::{Entity, Executable, IdAllocation};
use redb::{
    Database, Durability, ReadableTable, ReadableTableMetadata, TableDefinition, WriteTransaction,
};

use crate::codec;
use crate::error::Error;
use crate::storage;

const ENTITIES: TableDefinition<u64, &[u8]> = TableDefinition::new("entity");
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequence");

/// Sequence key for entity ids.
const ENTITY_SEQUENCE: &str = "entity";

/// Database file below the storage path.
const DB_FILE: &str = "data.redb";

/// redb backend for benchmarks.
pub struct RedbBackend {
    path: PathBuf,
    db: Option<Database>,
}

impl RedbBackend {
    /// Create a backend storing its database file below `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            db: None,
        }
    }

    /// Storage directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn db(&self) -> Result<&Database, Error> {
        self.db.as_ref().ok_or(Error::NotOpen)
    }

    /// Number of stored entities.
    pub fn count(&self) -> Result<u64, Error> {
        let txn = self.db()?.begin_read()?;
        let table = txn.open_table(ENTITIES)?;
        Ok(table.len()?)
    }

    fn collect<'a, I>(iter: I) -> Result<Vec<Entity>, Error>
    where
        I: Iterator<
            Item = Result<
                (redb::AccessGuard<'a, u64>, redb::AccessGuard<'a, &'static [u8]>),
                redb::StorageError,
            >,
        >,
    {
        iter.map(|entry| {
            let (key, value) = entry?;
            codec::decode(key.value(), value.value())
        })
        .collect()
    }
}

/// Write `items` within `txn`, assigning ids from the sequence to new ones.
fn write_items(txn: &WriteTransaction, items: &mut [Entity]) -> Result<(), Error> {
    let mut sequences = txn.open_table(SEQUENCES)?;
    let mut entities = txn.open_table(ENTITIES)?;

    let start = sequences
        .get(ENTITY_SEQUENCE)?
        .map(|guard| guard.value())
        .unwrap_or(0);
    let mut last = start;

    for item in items.iter_mut() {
        if item.id == 0 {
            last += 1;
            item.id = last;
        } else {
            last = last.max(item.id);
        }
        let bytes = codec::encode(item)?;
        entities.insert(item.id, bytes.as_slice())?;
    }

    if last != start {
        sequences.insert(ENTITY_SEQUENCE, last)?;
    }
    Ok(())
}

impl Executable for RedbBackend {
    type Error = Error;

    fn name(&self) -> &str {
        "redb"
    }

    fn id_allocation(&self) -> IdAllocation {
        IdAllocation::Dense
    }

    fn init(&mut self) -> Result<(), Error> {
        storage::reset_dir(&self.path)?;
        let db = Database::create(self.path.join(DB_FILE))?;

        // Create both tables so read transactions can open them.
        let txn = db.begin_write()?;
        {
            txn.open_table(ENTITIES)?;
            txn.open_table(SEQUENCES)?;
        }
        txn.commit()?;

        tracing::debug!(path = %self.path.display(), "redb database opened");
        self.db = Some(db);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        // dropping the database releases the file lock
        drop(self.db.take());
        storage::remove_dir(&self.path)?;
        Ok(())
    }

    fn size(&self) -> Result<u64, Error> {
        self.db()?;
        Ok(storage::file_size(&self.path.join(DB_FILE))?)
    }

    fn remove_all(&mut self) -> Result<(), Error> {
        let txn = self.db()?.begin_write()?;
        txn.delete_table(ENTITIES)?;
        txn.open_table(ENTITIES)?;
        txn.commit()?;
        Ok(())
    }

    fn remove_bulk(&mut self, items: &[Entity]) -> Result<(), Error> {
        let txn = self.db()?.begin_write()?;
        let removed = {
            let mut table = txn.open_table(ENTITIES)?;
            let mut removed = 0;
            for item in items {
                if table.remove(item.id)?.is_some() {
                    removed += 1;
                }
            }
            removed
        };

        if removed != items.len() {
            txn.abort()?;
            return Err(Error::RemovedCount {
                removed,
                requested: items.len(),
            });
        }
        txn.commit()?;
        Ok(())
    }

    /// Each put commits on its own without waiting for fsync.
    fn put_async(&mut self, item: &mut Entity) -> Result<(), Error> {
        let mut txn = self.db()?.begin_write()?;
        txn.set_durability(Durability::None);
        write_items(&txn, std::slice::from_mut(item))?;
        txn.commit()?;
        Ok(())
    }

    /// An immediate commit makes all earlier non-durable commits durable.
    fn await_async_completion(&mut self) -> Result<(), Error> {
        let mut txn = self.db()?.begin_write()?;
        txn.set_durability(Durability::Immediate);
        txn.commit()?;
        Ok(())
    }

    fn put_bulk(&mut self, items: &mut [Entity]) -> Result<(), Error> {
        let txn = self.db()?.begin_write()?;
        write_items(&txn, items)?;
        txn.commit()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Entity>, Error> {
        let txn = self.db()?.begin_read()?;
        let table = txn.open_table(ENTITIES)?;
        let items = Self::collect(table.iter()?)?;
        Ok(items)
    }

    fn query_id_between(&self, min: u64, max: u64) -> Result<Vec<Entity>, Error> {
        if min > max {
            return Ok(Vec::new());
        }
        let txn = self.db()?.begin_read()?;
        let table = txn.open_table(ENTITIES)?;
        let items = Self::collect(table.range(min..=max)?)?;
        Ok(items)
    }

    fn query_string_prefix(&self, prefix: &str) -> Result<Vec<Entity>, Error> {
        let mut items = self.read_all()?;
        items.retain(|item| item.text.starts_with(prefix));
        Ok(items)
    }
}
