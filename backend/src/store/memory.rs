//! In-memory store implementation.
//!
//! Backs the CLI and the demo server, and doubles as the test harness: the
//! commit fail switch lets tests exercise the all-or-nothing rollback path
//! without a real database.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Category, InventoryRecord, Location, Supplier};
use crate::reconcile::Mutation;
use crate::resolve::ReferenceSnapshot;
use crate::store::InventoryStore;

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<Uuid, InventoryRecord>,
    locations: Vec<Location>,
    categories: Vec<Category>,
    suppliers: Vec<Supplier>,
    fail_commits: bool,
}

/// Mutex-guarded in-memory store. Commits stage changes on a copy of the
/// item map and swap it in only when the whole batch applied cleanly.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_location(&self, name: &str) -> Uuid {
        let location = Location { id: Uuid::new_v4(), name: name.to_string() };
        let id = location.id;
        self.inner.lock().unwrap().locations.push(location);
        id
    }

    pub fn add_category(&self, name: &str) -> Uuid {
        let category = Category { id: Uuid::new_v4(), name: name.to_string() };
        let id = category.id;
        self.inner.lock().unwrap().categories.push(category);
        id
    }

    pub fn add_supplier(&self, name: &str) -> Uuid {
        let supplier = Supplier { id: Uuid::new_v4(), name: name.to_string() };
        let id = supplier.id;
        self.inner.lock().unwrap().suppliers.push(supplier);
        id
    }

    pub fn add_item(&self, record: InventoryRecord) {
        self.inner.lock().unwrap().items.insert(record.id, record);
    }

    /// Make every subsequent commit fail, for rollback tests.
    pub fn set_fail_commits(&self, fail: bool) {
        self.inner.lock().unwrap().fail_commits = fail;
    }

    pub fn item_count(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    pub fn find_by_sku(&self, sku: &str) -> Option<InventoryRecord> {
        self.inner
            .lock()
            .unwrap()
            .items
            .values()
            .find(|r| r.sku == sku)
            .cloned()
    }
}

impl InventoryStore for MemoryStore {
    fn reference_snapshot(&self) -> StoreResult<ReferenceSnapshot> {
        let inner = self.inner.lock().unwrap();
        Ok(ReferenceSnapshot::new(&inner.locations, &inner.categories, &inner.suppliers))
    }

    fn sku_index(&self) -> StoreResult<HashMap<String, Uuid>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .items
            .values()
            .map(|r| (r.sku.clone(), r.id))
            .collect())
    }

    fn apply_batch(&self, mutations: &[Mutation]) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_commits {
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }

        let mut staged = inner.items.clone();

        for mutation in mutations {
            match mutation {
                Mutation::Create(item) => {
                    if staged.values().any(|r| r.sku == item.sku) {
                        return Err(StoreError::Conflict(format!(
                            "SKU '{}' already exists",
                            item.sku
                        )));
                    }
                    let record = item.clone().into_record(Uuid::new_v4());
                    staged.insert(record.id, record);
                }
                Mutation::Update { id, sku, patch } => {
                    let record = staged.get_mut(id).ok_or_else(|| {
                        StoreError::Conflict(format!("No record for SKU '{}'", sku))
                    })?;
                    patch.clone().apply_to(record);
                }
            }
        }

        inner.items = staged;
        Ok(())
    }

    fn active_items(&self, location: Option<Uuid>) -> StoreResult<Vec<InventoryRecord>> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<InventoryRecord> = inner
            .items
            .values()
            .filter(|r| r.is_active)
            .filter(|r| location.map_or(true, |loc| r.location_id == loc))
            .cloned()
            .collect();
        // Deterministic export order
        items.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(items)
    }
}
