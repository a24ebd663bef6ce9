//! Column schema: recognized column names and header resolution.
//!
//! Matching is case- and whitespace-insensitive but exact otherwise — no
//! fuzzy matching. Unrecognized columns are ignored. Missing any REQUIRED
//! column is a whole-file failure raised before any row is processed.

use crate::error::SchemaError;

/// Canonical column order, used for export and the template.
pub const COLUMN_ORDER: [&str; 12] = [
    "SKU",
    "Barcode",
    "Name",
    "Description",
    "Category",
    "Location",
    "Supplier",
    "Stock",
    "Min Stock",
    "Cost Price",
    "Selling Price",
    "Unit",
];

/// Columns that must be present in every submission.
pub const REQUIRED_COLUMNS: [&str; 3] = ["SKU", "Name", "Selling Price"];

/// Resolved header positions for one submission.
///
/// Optional columns record `None` when absent, which is what lets the
/// normalizer distinguish "column omitted" from "present but blank".
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub sku: usize,
    pub name: usize,
    pub selling_price: usize,
    pub barcode: Option<usize>,
    pub description: Option<usize>,
    pub category: Option<usize>,
    pub location: Option<usize>,
    pub supplier: Option<usize>,
    pub stock: Option<usize>,
    pub min_stock: Option<usize>,
    pub cost_price: Option<usize>,
    pub unit: Option<usize>,
}

/// Canonical form used for header comparison: lowercase, trimmed, internal
/// whitespace collapsed to single spaces.
fn canon(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Position of a column in the header, matched canonically.
/// First occurrence wins when a header repeats a name.
fn find(header: &[String], column: &str) -> Option<usize> {
    let wanted = canon(column);
    header.iter().position(|h| canon(h) == wanted)
}

/// Resolve the header row into a [`ColumnMap`].
///
/// Fails with [`SchemaError::MissingColumns`] naming every absent required
/// column, so the caller sees the full defect in one pass.
pub fn resolve_columns(header: &[String]) -> Result<ColumnMap, SchemaError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| find(header, col).is_none())
        .map(|col| col.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }

    Ok(ColumnMap {
        sku: find(header, "SKU").expect("checked above"),
        name: find(header, "Name").expect("checked above"),
        selling_price: find(header, "Selling Price").expect("checked above"),
        barcode: find(header, "Barcode"),
        description: find(header, "Description"),
        category: find(header, "Category"),
        location: find(header, "Location"),
        supplier: find(header, "Supplier"),
        stock: find(header, "Stock"),
        min_stock: find(header, "Min Stock"),
        cost_price: find(header, "Cost Price"),
        unit: find(header, "Unit"),
    })
}
