//! Export: inventory records back into the canonical tabular shape.
//!
//! The inverse of the import pipeline. Numbers are emitted without thousands
//! separators so an exported file re-imports under the same grammar
//! unchanged (round-trip idempotence: every exported row comes back as an
//! update, never a create, never an error).

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{ExportError, ExportResult};
use crate::models::{CallerIdentity, InventoryRecord, PERM_VIEW_REPORTS};
use crate::resolve::ReferenceSnapshot;
use crate::schema::COLUMN_ORDER;
use crate::store::InventoryStore;

/// A generated CSV file plus its conventional filename.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Conventional export filename embedding the given date.
pub fn export_filename(date: NaiveDate) -> String {
    format!("inventory_export_{}.csv", date.format("%Y-%m-%d"))
}

/// Round-trip stable number formatting: integral values print as integers,
/// everything else with a plain decimal point. Never a thousands separator.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn write_record<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    record: &InventoryRecord,
    refs: &ReferenceSnapshot,
) -> Result<(), csv::Error> {
    let name_of = |id: Option<Uuid>| {
        id.and_then(|id| refs.name_of(id))
            .unwrap_or_default()
            .to_string()
    };

    writer.write_record([
        record.sku.clone(),
        record.barcode.clone().unwrap_or_default(),
        record.name.clone(),
        record.description.clone().unwrap_or_default(),
        name_of(record.category_id),
        name_of(Some(record.location_id)),
        name_of(record.supplier_id),
        format_number(record.stock),
        record.min_stock.map(format_number).unwrap_or_default(),
        record.cost_price.map(format_number).unwrap_or_default(),
        format_number(record.selling_price),
        record.unit.clone(),
    ])
}

/// Serialize the active inventory to CSV in the canonical column order.
///
/// Scope: an explicit `location` filter wins; otherwise the caller's default
/// location when set; otherwise everything.
pub fn export(
    store: &dyn InventoryStore,
    caller: &CallerIdentity,
    location: Option<Uuid>,
) -> ExportResult<ExportFile> {
    if !caller.has_permission(PERM_VIEW_REPORTS) {
        return Err(ExportError::PermissionDenied(PERM_VIEW_REPORTS.into()));
    }

    let scope = location.or(caller.default_location);
    let items = store.active_items(scope)?;
    let refs = store.reference_snapshot()?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMN_ORDER)?;
    for record in &items {
        write_record(&mut writer, record, &refs)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;

    Ok(ExportFile {
        filename: export_filename(chrono::Local::now().date_naive()),
        bytes,
    })
}

/// Blank import template: the canonical header plus one illustrative row.
pub fn template() -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMN_ORDER).expect("write to Vec cannot fail");
    writer
        .write_record([
            "SKU-001",
            "4006381333931",
            "Sample Product",
            "Example description",
            "General",
            "Main Store",
            "Acme Supplies",
            "100",
            "10",
            "500",
            "1000",
            "pcs",
        ])
        .expect("write to Vec cannot fail");
    writer.into_inner().expect("write to Vec cannot fail")
}
