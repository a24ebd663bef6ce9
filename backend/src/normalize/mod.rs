//! Per-row normalization: cells into typed, trimmed values.
//!
//! A row either becomes a [`NormalizedRow`] or a [`RowError`]; row errors are
//! collected by the pipeline, never propagated. Rows whose cells are all
//! blank are skipped silently — not counted, not errored.
//!
//! Numeric parsing is locale-fixed: comma is the thousands separator, point
//! is the decimal separator. No currency symbols, no letters, at most one
//! decimal point.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{Patch, DEFAULT_UNIT};
use crate::schema::ColumnMap;

/// Tolerant number grammar: optional minus, plain digits or properly
/// grouped thousands, optional single decimal part.
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d{1,3}(,\d{3})+|\d+)(\.\d+)?$").expect("valid regex"));

// =============================================================================
// Row Error
// =============================================================================

/// A diagnostic for one source row.
///
/// `row` is 1-based and excludes the header, matching what a user sees in
/// their spreadsheet minus the header line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

impl RowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

// =============================================================================
// Normalized Row
// =============================================================================

/// One data row after trimming and type coercion.
///
/// Reference fields (`location`, `category`, `supplier`) stay as free text
/// here; the resolver maps them to identifiers. Optional fields keep their
/// column-presence information via [`Patch`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub sku: String,
    pub name: String,
    pub selling_price: f64,
    /// Trimmed location text; `None` when the column is absent or blank
    /// (the resolver then falls back to the caller's default location).
    pub location: Option<String>,
    pub category: Patch<String>,
    pub supplier: Patch<String>,
    pub barcode: Patch<String>,
    pub description: Patch<String>,
    pub stock: Patch<f64>,
    pub min_stock: Patch<f64>,
    pub cost_price: Patch<f64>,
    pub unit: Patch<String>,
}

/// Parse a number in the tolerant grammar. `None` if it does not conform.
pub fn parse_number(raw: &str) -> Option<f64> {
    if !NUMBER_RE.is_match(raw) {
        return None;
    }
    raw.replace(',', "").parse().ok()
}

/// True when every cell trims to empty.
pub fn is_blank_row(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

/// Trimmed cell at `idx`, or empty when the row is short.
fn cell<'a>(cells: &'a [String], idx: usize) -> &'a str {
    cells.get(idx).map(|c| c.trim()).unwrap_or("")
}

/// Text patch for an optional column: Keep when absent, Clear when blank.
fn text_patch(cells: &[String], idx: Option<usize>) -> Patch<String> {
    match idx {
        None => Patch::Keep,
        Some(i) => {
            let raw = cell(cells, i);
            if raw.is_empty() {
                Patch::Clear
            } else {
                Patch::Set(raw.to_string())
            }
        }
    }
}

/// Numeric patch for an optional column. `allow_negative` is true for the
/// stock fields only.
fn number_patch(
    cells: &[String],
    idx: Option<usize>,
    row: usize,
    column: &str,
    allow_negative: bool,
) -> Result<Patch<f64>, RowError> {
    let Some(i) = idx else {
        return Ok(Patch::Keep);
    };
    let raw = cell(cells, i);
    if raw.is_empty() {
        return Ok(Patch::Clear);
    }
    match parse_number(raw) {
        Some(value) if allow_negative || value >= 0.0 => Ok(Patch::Set(value)),
        _ => Err(RowError::new(row, format!("Invalid {} '{}'", column, raw)).with_column(column)),
    }
}

/// Normalize one data row.
///
/// `row` is the 1-based ordinal of the row among the data rows. The caller
/// is expected to have skipped blank rows via [`is_blank_row`].
pub fn normalize_row(row: usize, cells: &[String], cols: &ColumnMap) -> Result<NormalizedRow, RowError> {
    let sku = cell(cells, cols.sku);
    if sku.is_empty() {
        return Err(RowError::new(row, "Missing or empty SKU").with_column("SKU"));
    }

    let name = cell(cells, cols.name);
    if name.is_empty() {
        return Err(RowError::new(row, "Missing or empty Name").with_column("Name"));
    }

    let raw_price = cell(cells, cols.selling_price);
    if raw_price.is_empty() {
        return Err(RowError::new(row, "Missing or empty Selling Price").with_column("Selling Price"));
    }
    let selling_price = match parse_number(raw_price) {
        Some(value) if value > 0.0 => value,
        _ => {
            return Err(
                RowError::new(row, format!("Invalid Selling Price '{}'", raw_price))
                    .with_column("Selling Price"),
            )
        }
    };

    let location = cols.location.and_then(|i| {
        let raw = cell(cells, i);
        (!raw.is_empty()).then(|| raw.to_string())
    });

    // Blank unit falls back to the fixed default rather than clearing.
    let unit = match text_patch(cells, cols.unit) {
        Patch::Clear => Patch::Set(DEFAULT_UNIT.to_string()),
        other => other,
    };

    Ok(NormalizedRow {
        sku: sku.to_string(),
        name: name.to_string(),
        selling_price,
        location,
        category: text_patch(cells, cols.category),
        supplier: text_patch(cells, cols.supplier),
        barcode: text_patch(cells, cols.barcode),
        description: text_patch(cells, cols.description),
        stock: number_patch(cells, cols.stock, row, "Stock", true)?,
        min_stock: number_patch(cells, cols.min_stock, row, "Min Stock", true)?,
        cost_price: number_patch(cells, cols.cost_price, row, "Cost Price", false)?,
        unit,
    })
}
