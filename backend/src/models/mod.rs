//! Domain models for the stockload reconciliation pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`InventoryRecord`] - The persisted inventory entity
//! - [`Location`], [`Category`], [`Supplier`] - Reference entities
//! - [`CallerIdentity`] - Already-authorized caller context
//! - [`Patch`] - Column-presence aware optional value

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit label applied when the Unit column is blank or missing.
pub const DEFAULT_UNIT: &str = "pcs";

/// Permission required to import inventory.
pub const PERM_MANAGE_INVENTORY: &str = "manage_inventory";

/// Permission required to export inventory.
pub const PERM_VIEW_REPORTS: &str = "view_reports";

// =============================================================================
// Field Patch
// =============================================================================

/// A per-field value that remembers whether its column was present.
///
/// A flat table cannot distinguish "column omitted" from "column present but
/// empty" once cells collapse to strings, so the distinction is carried
/// explicitly from normalization all the way into the update merge:
///
/// - [`Patch::Keep`] - the column was absent; leave the stored value alone
/// - [`Patch::Clear`] - the column was present but blank; clear the stored value
/// - [`Patch::Set`] - the column carried a value; overwrite
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    /// Merge this patch onto the currently stored value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Keep => current,
            Patch::Clear => None,
            Patch::Set(v) => Some(v),
        }
    }

    /// Resolve to a concrete value for a newly created record.
    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Set(v) => Some(v),
            Patch::Keep | Patch::Clear => None,
        }
    }

    /// Transform the carried value, preserving Keep/Clear.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Patch<U> {
        match self {
            Patch::Keep => Patch::Keep,
            Patch::Clear => Patch::Clear,
            Patch::Set(v) => Patch::Set(f(v)),
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

// =============================================================================
// Reference Entities
// =============================================================================

/// A physical stock location (store, warehouse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// A supplier of inventory items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
}

// =============================================================================
// Inventory Record
// =============================================================================

/// A persisted inventory item.
///
/// Owned by the external store; the pipeline only reads these for export and
/// produces create/update mutations targeting them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Uuid,
    /// Natural business identifier, unique across the store.
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub location_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub stock: f64,
    pub min_stock: Option<f64>,
    pub cost_price: Option<f64>,
    pub selling_price: f64,
    pub unit: String,
    pub is_active: bool,
}

impl InventoryRecord {
    /// Create a minimal active record with defaults for optional fields.
    pub fn new(sku: impl Into<String>, name: impl Into<String>, selling_price: f64, location_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            sku: sku.into(),
            barcode: None,
            name: name.into(),
            description: None,
            category_id: None,
            location_id,
            supplier_id: None,
            stock: 0.0,
            min_stock: None,
            cost_price: None,
            selling_price,
            unit: DEFAULT_UNIT.to_string(),
            is_active: true,
        }
    }
}

// =============================================================================
// Caller Identity
// =============================================================================

/// The already-authorized caller on whose behalf an operation runs.
///
/// Authentication happens elsewhere; the pipeline only consumes the
/// permission set and the caller's default location (used as the fallback
/// when a row carries no Location value).
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub username: String,
    pub permissions: HashSet<String>,
    pub default_location: Option<Uuid>,
}

impl CallerIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            permissions: HashSet::new(),
            default_location: None,
        }
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permissions.insert(permission.to_string());
        self
    }

    pub fn with_default_location(mut self, location_id: Uuid) -> Self {
        self.default_location = Some(location_id);
        self
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_apply() {
        assert_eq!(Patch::<i32>::Keep.apply(Some(1)), Some(1));
        assert_eq!(Patch::<i32>::Clear.apply(Some(1)), None);
        assert_eq!(Patch::Set(2).apply(Some(1)), Some(2));
        assert_eq!(Patch::Set(2).apply(None), Some(2));
    }

    #[test]
    fn test_patch_into_option() {
        assert_eq!(Patch::Set("x").into_option(), Some("x"));
        assert_eq!(Patch::<&str>::Keep.into_option(), None);
        assert_eq!(Patch::<&str>::Clear.into_option(), None);
    }

    #[test]
    fn test_caller_permissions() {
        let caller = CallerIdentity::new("admin")
            .with_permission(PERM_MANAGE_INVENTORY);
        assert!(caller.has_permission(PERM_MANAGE_INVENTORY));
        assert!(!caller.has_permission(PERM_VIEW_REPORTS));
    }

    #[test]
    fn test_new_record_defaults() {
        let loc = Uuid::new_v4();
        let record = InventoryRecord::new("SKU-1", "Widget", 100.0, loc);
        assert_eq!(record.unit, DEFAULT_UNIT);
        assert_eq!(record.stock, 0.0);
        assert!(record.is_active);
        assert!(record.barcode.is_none());
    }
}
