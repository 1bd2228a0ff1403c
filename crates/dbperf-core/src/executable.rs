//! The contract every benchmarked storage backend implements.

use crate::entity::Entity;

/// How a backend hands out identifiers to newly inserted entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdAllocation {
    /// A bulk insert receives a contiguous, increasing id range.
    Dense,
    /// Ids are unique but may have gaps or be recycled.
    Sparse,
}

/// A storage backend driven by the [`Executor`](crate::Executor).
///
/// Bulk operations must be atomic according to the backend's own
/// transaction semantics. Inserting an entity with `id == 0` assigns a new
/// identifier and writes it back into the item.
pub trait Executable {
    /// Backend error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Identifier assignment guarantees of this backend.
    fn id_allocation(&self) -> IdAllocation;

    /// Create or reset the backing storage and establish the schema.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Flush and release the storage, then remove it.
    fn close(&mut self) -> Result<(), Self::Error>;

    /// On-disk footprint in bytes.
    fn size(&self) -> Result<u64, Self::Error>;

    /// Delete every stored entity.
    fn remove_all(&mut self) -> Result<(), Self::Error>;

    /// Delete the given entities by identifier.
    fn remove_bulk(&mut self, items: &[Entity]) -> Result<(), Self::Error>;

    /// Submit one entity without waiting for it to become durable.
    fn put_async(&mut self, item: &mut Entity) -> Result<(), Self::Error>;

    /// Block until every previously submitted async put is durable.
    fn await_async_completion(&mut self) -> Result<(), Self::Error>;

    /// Insert or update all given entities as one unit.
    fn put_bulk(&mut self, items: &mut [Entity]) -> Result<(), Self::Error>;

    /// Every stored entity.
    fn read_all(&self) -> Result<Vec<Entity>, Self::Error>;

    /// Entities whose id lies in `[min, max]`.
    fn query_id_between(&self, min: u64, max: u64) -> Result<Vec<Entity>, Self::Error>;

    /// Entities whose text starts with `prefix` (case-sensitive).
    fn query_string_prefix(&self, prefix: &str) -> Result<Vec<Entity>, Self::Error>;
}
