//! Reference resolution: free-text entity names into identifiers.
//!
//! Resolution reads a [`ReferenceSnapshot`] fetched once per submission —
//! an explicit read-once cache, not an ambient lookup — so every row in a
//! batch sees the same view of locations, categories, and suppliers.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{CallerIdentity, Category, Location, Patch, Supplier};
use crate::normalize::{NormalizedRow, RowError};

// =============================================================================
// Reference Snapshot
// =============================================================================

/// Point-in-time view of the reference entities, indexed for case-insensitive
/// name lookup (import) and id-to-name lookup (export).
#[derive(Debug, Clone, Default)]
pub struct ReferenceSnapshot {
    locations_by_name: HashMap<String, Uuid>,
    categories_by_name: HashMap<String, Uuid>,
    suppliers_by_name: HashMap<String, Uuid>,
    names_by_id: HashMap<Uuid, String>,
}

impl ReferenceSnapshot {
    pub fn new(locations: &[Location], categories: &[Category], suppliers: &[Supplier]) -> Self {
        let mut snapshot = Self::default();
        for loc in locations {
            snapshot.locations_by_name.insert(loc.name.to_lowercase(), loc.id);
            snapshot.names_by_id.insert(loc.id, loc.name.clone());
        }
        for cat in categories {
            snapshot.categories_by_name.insert(cat.name.to_lowercase(), cat.id);
            snapshot.names_by_id.insert(cat.id, cat.name.clone());
        }
        for sup in suppliers {
            snapshot.suppliers_by_name.insert(sup.name.to_lowercase(), sup.id);
            snapshot.names_by_id.insert(sup.id, sup.name.clone());
        }
        snapshot
    }

    pub fn location_by_name(&self, name: &str) -> Option<Uuid> {
        self.locations_by_name.get(&name.to_lowercase()).copied()
    }

    pub fn category_by_name(&self, name: &str) -> Option<Uuid> {
        self.categories_by_name.get(&name.to_lowercase()).copied()
    }

    pub fn supplier_by_name(&self, name: &str) -> Option<Uuid> {
        self.suppliers_by_name.get(&name.to_lowercase()).copied()
    }

    /// Display name of any reference entity, for export.
    pub fn name_of(&self, id: Uuid) -> Option<&str> {
        self.names_by_id.get(&id).map(String::as_str)
    }
}

// =============================================================================
// Resolved Row
// =============================================================================

/// A [`NormalizedRow`] with reference names replaced by entity identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRow {
    pub sku: String,
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

/// Resolve an optional reference name. Keep/Clear pass through; a named
/// entity must exist.
fn resolve_ref(
    patch: Patch<String>,
    row: usize,
    field: &str,
    lookup: impl Fn(&str) -> Option<Uuid>,
) -> Result<Patch<Uuid>, RowError> {
    match patch {
        Patch::Keep => Ok(Patch::Keep),
        Patch::Clear => Ok(Patch::Clear),
        Patch::Set(name) => lookup(&name).map(Patch::Set).ok_or_else(|| {
            RowError::new(row, format!("{} '{}' not found", field, name)).with_column(field)
        }),
    }
}

/// Resolve one normalized row against the snapshot.
///
/// Location falls back to the caller's default location when the row gives
/// none; a caller without a default cannot import location-less rows.
pub fn resolve_row(
    row: usize,
    normalized: NormalizedRow,
    refs: &ReferenceSnapshot,
    caller: &CallerIdentity,
) -> Result<ResolvedRow, RowError> {
    let location_id = match normalized.location {
        Some(name) => refs.location_by_name(&name).ok_or_else(|| {
            RowError::new(row, format!("Location '{}' not found", name)).with_column("Location")
        })?,
        None => caller.default_location.ok_or_else(|| {
            RowError::new(row, "No location specified and no default location assigned")
                .with_column("Location")
        })?,
    };

    let category_id = resolve_ref(normalized.category, row, "Category", |n| {
        refs.category_by_name(n)
    })?;
    let supplier_id = resolve_ref(normalized.supplier, row, "Supplier", |n| {
        refs.supplier_by_name(n)
    })?;

    Ok(ResolvedRow {
        sku: normalized.sku,
        name: normalized.name,
        selling_price: normalized.selling_price,
        location_id,
        category_id,
        supplier_id,
        barcode: normalized.barcode,
        description: normalized.description,
        stock: normalized.stock,
        min_stock: normalized.min_stock,
        cost_price: normalized.cost_price,
        unit: normalized.unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PERM_MANAGE_INVENTORY;

    fn snapshot() -> (ReferenceSnapshot, Uuid, Uuid) {
        let main = Location { id: Uuid::new_v4(), name: "Main Store".into() };
        let general = Category { id: Uuid::new_v4(), name: "General".into() };
        let acme = Supplier { id: Uuid::new_v4(), name: "Acme Supplies".into() };
        let (main_id, general_id) = (main.id, general.id);
        (
            ReferenceSnapshot::new(&[main], &[general], &[acme]),
            main_id,
            general_id,
        )
    }

    fn base_row() -> NormalizedRow {
        NormalizedRow {
            sku: "A-1".into(),
            name: "Widget".into(),
            selling_price: 10.0,
            location: None,
            category: Patch::Keep,
            supplier: Patch::Keep,
            barcode: Patch::Keep,
            description: Patch::Keep,
            stock: Patch::Keep,
            min_stock: Patch::Keep,
            cost_price: Patch::Keep,
            unit: Patch::Keep,
        }
    }

    #[test]
    fn test_location_case_insensitive_match() {
        let (refs, main_id, _) = snapshot();
        let caller = CallerIdentity::new("clerk").with_permission(PERM_MANAGE_INVENTORY);
        let mut row = base_row();
        row.location = Some("MAIN store".into());

        let resolved = resolve_row(1, row, &refs, &caller).unwrap();
        assert_eq!(resolved.location_id, main_id);
    }

    #[test]
    fn test_location_not_found() {
        let (refs, _, _) = snapshot();
        let caller = CallerIdentity::new("clerk");
        let mut row = base_row();
        row.location = Some("Warehouse 9".into());

        let err = resolve_row(2, row, &refs, &caller).unwrap_err();
        assert_eq!(err.message, "Location 'Warehouse 9' not found");
        assert_eq!(err.row, 2);
    }

    #[test]
    fn test_location_falls_back_to_caller_default() {
        let (refs, main_id, _) = snapshot();
        let caller = CallerIdentity::new("clerk").with_default_location(main_id);

        let resolved = resolve_row(1, base_row(), &refs, &caller).unwrap();
        assert_eq!(resolved.location_id, main_id);
    }

    #[test]
    fn test_no_location_and_no_default() {
        let (refs, _, _) = snapshot();
        let caller = CallerIdentity::new("clerk");

        let err = resolve_row(1, base_row(), &refs, &caller).unwrap_err();
        assert!(err.message.contains("no default location"));
    }

    #[test]
    fn test_category_resolution() {
        let (refs, main_id, general_id) = snapshot();
        let caller = CallerIdentity::new("clerk").with_default_location(main_id);

        let mut row = base_row();
        row.category = Patch::Set("general".into());
        let resolved = resolve_row(1, row, &refs, &caller).unwrap();
        assert_eq!(resolved.category_id, Patch::Set(general_id));

        let mut row = base_row();
        row.category = Patch::Set("Nonexistent".into());
        let err = resolve_row(1, row, &refs, &caller).unwrap_err();
        assert_eq!(err.message, "Category 'Nonexistent' not found");
    }

    #[test]
    fn test_clear_and_keep_pass_through() {
        let (refs, main_id, _) = snapshot();
        let caller = CallerIdentity::new("clerk").with_default_location(main_id);

        let mut row = base_row();
        row.category = Patch::Clear;
        row.supplier = Patch::Keep;
        let resolved = resolve_row(1, row, &refs, &caller).unwrap();
        assert_eq!(resolved.category_id, Patch::Clear);
        assert_eq!(resolved.supplier_id, Patch::Keep);
    }

    #[test]
    fn test_name_of_for_export() {
        let (refs, main_id, general_id) = snapshot();
        assert_eq!(refs.name_of(main_id), Some("Main Store"));
        assert_eq!(refs.name_of(general_id), Some("General"));
        assert_eq!(refs.name_of(Uuid::new_v4()), None);
    }
}
