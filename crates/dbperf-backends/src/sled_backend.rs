//! sled backend.
//!
//! One object per key in the default tree, keyed by big-endian id. Bulk
//! writes go through a single atomic [`sled::Batch`].

use std::path::{Path, PathBuf};

use dbperf_core::{Entity, Executable, IdAllocation};
use sled::{Batch, Db};

use crate::codec;
use crate::error::Error;
use crate::storage;

/// Database directory below the storage path.
const DB_DIR: &str = "test.db";

/// sled backend for benchmarks.
pub struct SledBackend {
    path: PathBuf,
    db: Option<Db>,
}

impl SledBackend {
    /// Create a backend storing its data below `path`.
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

    fn db(&self) -> Result<&Db, Error> {
        self.db.as_ref().ok_or(Error::NotOpen)
    }

    /// Assign an id unless the entity already has one.
    ///
    /// `generate_id` may hand out zero, which means "unassigned" here.
    fn assign_id(db: &Db, item: &mut Entity) -> Result<(), Error> {
        if item.id == 0 {
            item.id = db.generate_id()? + 1;
        }
        Ok(())
    }

    fn decode_all<I>(iter: I) -> Result<Vec<Entity>, Error>
    where
        I: Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
    {
        iter.map(|entry| {
            let (key, value) = entry?;
            codec::decode(codec::id_from_key(&key)?, &value)
        })
        .collect()
    }
}

impl Executable for SledBackend {
    type Error = Error;

    fn name(&self) -> &str {
        "sled"
    }

    /// `generate_id` is monotonic but not guaranteed to be contiguous.
    fn id_allocation(&self) -> IdAllocation {
        IdAllocation::Sparse
    }

    fn init(&mut self) -> Result<(), Error> {
        storage::reset_dir(&self.path)?;
        let db = sled::Config::new().path(self.path.join(DB_DIR)).open()?;
        tracing::debug!(path = %self.path.display(), "sled database opened");
        self.db = Some(db);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        if let Some(db) = self.db.take() {
            db.flush()?;
        }
        storage::remove_dir(&self.path)?;
        Ok(())
    }

    fn size(&self) -> Result<u64, Error> {
        Ok(self.db()?.size_on_disk()?)
    }

    fn remove_all(&mut self) -> Result<(), Error> {
        self.db()?.clear()?;
        Ok(())
    }

    fn remove_bulk(&mut self, items: &[Entity]) -> Result<(), Error> {
        let mut batch = Batch::default();
        for item in items {
            batch.remove(&codec::id_key(item.id)[..]);
        }
        self.db()?.apply_batch(batch)?;
        Ok(())
    }

    fn put_async(&mut self, item: &mut Entity) -> Result<(), Error> {
        // sled writes are buffered until the next flush
        let db = self.db()?;
        Self::assign_id(db, item)?;
        db.insert(&codec::id_key(item.id)[..], codec::encode(item)?)?;
        Ok(())
    }

    fn await_async_completion(&mut self) -> Result<(), Error> {
        self.db()?.flush()?;
        Ok(())
    }

    fn put_bulk(&mut self, items: &mut [Entity]) -> Result<(), Error> {
        let db = self.db()?;
        let mut batch = Batch::default();
        for item in items.iter_mut() {
            Self::assign_id(db, item)?;
            batch.insert(&codec::id_key(item.id)[..], codec::encode(item)?);
        }
        db.apply_batch(batch)?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Entity>, Error> {
        Self::decode_all(self.db()?.iter())
    }

    fn query_id_between(&self, min: u64, max: u64) -> Result<Vec<Entity>, Error> {
        Self::decode_all(self.db()?.range(codec::id_key(min)..=codec::id_key(max)))
    }

    fn query_string_prefix(&self, prefix: &str) -> Result<Vec<Entity>, Error> {
        let mut items = self.read_all()?;
        items.retain(|item| item.text.starts_with(prefix));
        Ok(items)
    }
}
