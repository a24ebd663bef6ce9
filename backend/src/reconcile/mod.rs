//! Reconciliation: classify resolved rows as creates or updates and collapse
//! within-batch duplicates.
//!
//! The natural key (SKU) is the sole identity predicate. Classification runs
//! against a SKU index snapshot taken once at the start of the batch; a key
//! present in the snapshot becomes an update, anything else a create. When a
//! submission repeats a key, the later row in file order wins silently —
//! last-value-wins reconciliation, not a conflict.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{InventoryRecord, Patch, DEFAULT_UNIT};
use crate::resolve::ResolvedRow;

// =============================================================================
// Mutations
// =============================================================================

/// Field values for a record that does not exist yet. All defaults resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    pub selling_price: f64,
    pub location_id: Uuid,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub stock: f64,
    pub min_stock: Option<f64>,
    pub cost_price: Option<f64>,
    pub unit: String,
}

impl NewItem {
    fn from_row(row: ResolvedRow) -> Self {
        Self {
            sku: row.sku,
            name: row.name,
            selling_price: row.selling_price,
            location_id: row.location_id,
            category_id: row.category_id.into_option(),
            supplier_id: row.supplier_id.into_option(),
            barcode: row.barcode.into_option(),
            description: row.description.into_option(),
            stock: row.stock.into_option().unwrap_or(0.0),
            min_stock: row.min_stock.into_option(),
            cost_price: row.cost_price.into_option(),
            unit: row.unit.into_option().unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        }
    }

    /// Materialize into a store record under a fresh identifier.
    pub fn into_record(self, id: Uuid) -> InventoryRecord {
        InventoryRecord {
            id,
            sku: self.sku,
            barcode: self.barcode,
            name: self.name,
            description: self.description,
            category_id: self.category_id,
            location_id: self.location_id,
            supplier_id: self.supplier_id,
            stock: self.stock,
            min_stock: self.min_stock,
            cost_price: self.cost_price,
            selling_price: self.selling_price,
            unit: self.unit,
            is_active: true,
        }
    }
}

/// Partial update for an existing record.
///
/// Required fields are always submitted and always overwrite; optional fields
/// merge per [`Patch`]: `Set` overwrites, `Clear` empties, `Keep` leaves the
/// stored value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPatch {
    pub name: String,
    pub selling_price: f64,
    pub location_id: Uuid,
    pub category_id: Patch<Uuid>,
    pub supplier_id: Patch<Uuid>,
    pub barcode: Patch<String>,
    pub description: Patch<String>,
    pub stock: Patch<f64>,
    pub min_stock: Patch<f64>,
    pub cost_price: Patch<f64>,
    pub unit: Patch<String>,
}

impl ItemPatch {
    fn from_row(row: ResolvedRow) -> Self {
        Self {
            name: row.name,
            selling_price: row.selling_price,
            location_id: row.location_id,
            category_id: row.category_id,
            supplier_id: row.supplier_id,
            barcode: row.barcode,
            description: row.description,
            stock: row.stock,
            min_stock: row.min_stock,
            cost_price: row.cost_price,
            unit: row.unit,
        }
    }

    /// Merge this patch onto a stored record in place.
    pub fn apply_to(self, record: &mut InventoryRecord) {
        record.name = self.name;
        record.selling_price = self.selling_price;
        record.location_id = self.location_id;
        record.category_id = self.category_id.apply(record.category_id);
        record.supplier_id = self.supplier_id.apply(record.supplier_id);
        record.barcode = self.barcode.apply(record.barcode.take());
        record.description = self.description.apply(record.description.take());
        // A cleared stock cell means "no stock", not "unknown".
        record.stock = match self.stock {
            Patch::Keep => record.stock,
            Patch::Clear => 0.0,
            Patch::Set(v) => v,
        };
        record.min_stock = self.min_stock.apply(record.min_stock);
        record.cost_price = self.cost_price.apply(record.cost_price);
        if let Patch::Set(unit) = self.unit {
            record.unit = unit;
        }
    }
}

/// One accepted mutation, ready for the atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(NewItem),
    Update {
        id: Uuid,
        sku: String,
        patch: ItemPatch,
    },
}

impl Mutation {
    pub fn sku(&self) -> &str {
        match self {
            Mutation::Create(item) => &item.sku,
            Mutation::Update { sku, .. } => sku,
        }
    }
}

// =============================================================================
// Plan
// =============================================================================

/// The effective per-key mutation list for one submission.
#[derive(Debug, Clone, Default)]
pub struct MutationPlan {
    /// At most one mutation per SKU, positioned at the key's first
    /// occurrence in file order.
    pub mutations: Vec<Mutation>,
    pub created: usize,
    pub updated: usize,
}

/// Build the mutation plan from resolved rows and the SKU index snapshot.
///
/// Duplicate keys collapse to the later row's mutation; the earlier one is
/// superseded silently.
pub fn plan(rows: Vec<ResolvedRow>, existing: &HashMap<String, Uuid>) -> MutationPlan {
    let mut mutations: Vec<Mutation> = Vec::new();
    let mut slot_by_sku: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let sku = row.sku.clone();
        let mutation = match existing.get(&sku) {
            Some(&id) => Mutation::Update {
                id,
                sku: sku.clone(),
                patch: ItemPatch::from_row(row),
            },
            None => Mutation::Create(NewItem::from_row(row)),
        };

        match slot_by_sku.get(&sku) {
            Some(&slot) => mutations[slot] = mutation,
            None => {
                slot_by_sku.insert(sku, mutations.len());
                mutations.push(mutation);
            }
        }
    }

    let created = mutations.iter().filter(|m| matches!(m, Mutation::Create(_))).count();
    let updated = mutations.len() - created;

    MutationPlan {
        mutations,
        created,
        updated,
    }
}
