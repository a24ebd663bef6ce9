//! Abstract store contract consumed by the pipeline.
//!
//! The pipeline never touches persistence directly. It reads two snapshots
//! at the start of a submission (references, SKU index) and hands the final
//! mutation list to [`InventoryStore::apply_batch`], which must apply the
//! whole ordered list or none of it. Serializing concurrent writers to the
//! same natural key is the store's responsibility, not this crate's.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::InventoryRecord;
use crate::reconcile::Mutation;
use crate::resolve::ReferenceSnapshot;

pub mod memory;

pub use memory::MemoryStore;

/// Contract between the pipeline and the persistent entity store.
pub trait InventoryStore: Send + Sync {
    /// Locations, categories, and suppliers — fetched once per submission.
    fn reference_snapshot(&self) -> StoreResult<ReferenceSnapshot>;

    /// Natural keys currently in the store, mapped to record identifiers.
    fn sku_index(&self) -> StoreResult<HashMap<String, Uuid>>;

    /// Apply the ordered mutation list atomically: all or nothing.
    fn apply_batch(&self, mutations: &[Mutation]) -> StoreResult<()>;

    /// Active records for export, optionally scoped to one location.
    fn active_items(&self, location: Option<Uuid>) -> StoreResult<Vec<InventoryRecord>>;
}
