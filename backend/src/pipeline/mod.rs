//! Import orchestration: decode, validate, resolve, reconcile, commit.
//!
//! The pipeline is a strict sequential pass per submission. Row-level
//! problems are collected into the report and never stop the batch;
//! decode/schema/permission failures abort before any row is evaluated; a
//! store failure during the final commit discards every pending mutation
//! but still returns the collected row errors for diagnosis.

use serde::{Deserialize, Serialize};

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::decoder::decode_table;
use crate::error::{ImportError, ImportResult};
use crate::models::{CallerIdentity, PERM_MANAGE_INVENTORY};
use crate::normalize::{is_blank_row, normalize_row, RowError};
use crate::reconcile;
use crate::resolve::resolve_row;
use crate::schema::resolve_columns;
use crate::store::InventoryStore;

/// Default ceiling on data rows per submission.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Options for one import submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Maximum number of data rows accepted per file.
    pub max_rows: usize,

    /// Explicit cell delimiter; auto-detected when `None`.
    pub delimiter: Option<char>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            delimiter: None,
        }
    }
}

/// Outcome of one import submission.
///
/// `success` is false only when the submission failed as a whole (the commit
/// was rolled back); individual row errors do not clear it. The invariant
/// `total_processed == imported_count + updated_count` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub success: bool,
    pub imported_count: usize,
    pub updated_count: usize,
    pub total_processed: usize,
    pub errors: Vec<RowError>,
    pub encoding_used: String,
    pub message: String,
}

/// Run one import submission against the store.
///
/// Top-level aborts (permission, decode, schema, row ceiling, snapshot
/// reads) return `Err`. A commit failure returns `Ok` with
/// `success = false` so the caller still receives the row diagnostics.
pub fn import(
    store: &dyn InventoryStore,
    caller: &CallerIdentity,
    bytes: &[u8],
    options: &ImportOptions,
) -> ImportResult<ImportReport> {
    if !caller.has_permission(PERM_MANAGE_INVENTORY) {
        return Err(ImportError::PermissionDenied(PERM_MANAGE_INVENTORY.into()));
    }

    log_info(format!("Decoding upload ({} bytes)", bytes.len()));
    let table = decode_table(bytes, options.delimiter)?;
    log_success(format!(
        "Decoded as {}, delimiter '{}', {} data rows",
        table.encoding,
        if table.delimiter == '\t' { "\\t".to_string() } else { table.delimiter.to_string() },
        table.rows.len()
    ));

    if table.rows.len() > options.max_rows {
        return Err(ImportError::TooManyRows {
            limit: options.max_rows,
            actual: table.rows.len(),
        });
    }

    let columns = resolve_columns(&table.header)?;

    // Read-once snapshots: one consistent view for the whole batch.
    let refs = store.reference_snapshot()?;
    let existing_skus = store.sku_index()?;
    log_info(format!("Snapshot: {} existing SKUs", existing_skus.len()));

    let mut errors: Vec<RowError> = Vec::new();
    let mut resolved = Vec::new();

    for (idx, cells) in table.rows.iter().enumerate() {
        let ordinal = idx + 1;
        if is_blank_row(cells) {
            continue;
        }
        let normalized = match normalize_row(ordinal, cells, &columns) {
            Ok(row) => row,
            Err(err) => {
                errors.push(err);
                continue;
            }
        };
        match resolve_row(ordinal, normalized, &refs, caller) {
            Ok(row) => resolved.push(row),
            Err(err) => errors.push(err),
        }
    }

    let plan = reconcile::plan(resolved, &existing_skus);
    log_info(format!(
        "Reconciled: {} creates, {} updates, {} row errors",
        plan.created,
        plan.updated,
        errors.len()
    ));

    if !plan.mutations.is_empty() {
        if let Err(store_err) = store.apply_batch(&plan.mutations) {
            log_error(format!("Commit failed, batch discarded: {}", store_err));
            return Ok(ImportReport {
                success: false,
                imported_count: 0,
                updated_count: 0,
                total_processed: 0,
                errors,
                encoding_used: table.encoding.to_string(),
                message: format!("Import aborted: {}. No changes were applied.", store_err),
            });
        }
    }

    let message = if errors.is_empty() {
        format!("Imported {} items, updated {}", plan.created, plan.updated)
    } else {
        log_warning(format!("{} rows rejected", errors.len()));
        format!(
            "Imported {} items, updated {}, {} rows rejected",
            plan.created,
            plan.updated,
            errors.len()
        )
    };
    log_success(&message);

    Ok(ImportReport {
        success: true,
        imported_count: plan.created,
        updated_count: plan.updated,
        total_processed: plan.created + plan.updated,
        errors,
        encoding_used: table.encoding.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InventoryRecord, PERM_VIEW_REPORTS};
    use crate::store::MemoryStore;

    fn seeded_store() -> (MemoryStore, uuid::Uuid) {
        let store = MemoryStore::new();
        let main = store.add_location("Main Store");
        store.add_location("Warehouse");
        store.add_category("General");
        store.add_supplier("Acme Supplies");
        (store, main)
    }

    fn admin(location: uuid::Uuid) -> CallerIdentity {
        CallerIdentity::new("admin")
            .with_permission(PERM_MANAGE_INVENTORY)
            .with_permission(PERM_VIEW_REPORTS)
            .with_default_location(location)
    }

    #[test]
    fn test_clean_import() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        let csv = "SKU,Name,Selling Price,Location,Category,Stock\n\
                   A-1,Widget,1000,Main Store,General,100\n\
                   A-2,Gadget,\"1,500.50\",Main Store,,25\n";

        let report = import(&store, &caller, csv.as_bytes(), &ImportOptions::default()).unwrap();

        assert!(report.success);
        assert_eq!(report.imported_count, 2);
        assert_eq!(report.updated_count, 0);
        assert_eq!(report.total_processed, 2);
        assert!(report.errors.is_empty());
        assert_eq!(report.encoding_used, "utf-8");

        let gadget = store.find_by_sku("A-2").unwrap();
        assert_eq!(gadget.selling_price, 1500.5);
        assert_eq!(gadget.stock, 25.0);
        // Category column present but blank: no association
        assert!(gadget.category_id.is_none());
    }

    #[test]
    fn test_row_errors_do_not_stop_batch() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        let csv = "SKU,Name,Selling Price\n\
                   A-1,Widget,1000\n\
                   ,NoSku,10\n\
                   A-3,BadPrice,abc\n\
                   A-4,Fine,20\n";

        let report = import(&store, &caller, csv.as_bytes(), &ImportOptions::default()).unwrap();

        assert!(report.success);
        assert_eq!(report.imported_count, 2);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].row, 2);
        assert_eq!(report.errors[0].message, "Missing or empty SKU");
        assert_eq!(report.errors[1].row, 3);
        assert_eq!(report.errors[1].message, "Invalid Selling Price 'abc'");
        assert_eq!(report.total_processed, report.imported_count + report.updated_count);
    }

    #[test]
    fn test_blank_rows_skipped_silently() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        let csv = "SKU,Name,Selling Price\nA-1,Widget,1000\n,,\n   ,  ,\nA-2,Gadget,2000\n";

        let report = import(&store, &caller, csv.as_bytes(), &ImportOptions::default()).unwrap();

        assert_eq!(report.imported_count, 2);
        assert!(report.errors.is_empty());
        assert_eq!(report.total_processed, 2);
    }

    #[test]
    fn test_update_existing_sku() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        let mut record = InventoryRecord::new("A-1", "Old Name", 500.0, main);
        record.description = Some("keep this".into());
        store.add_item(record);

        // No Description column: the stored description must survive.
        let csv = "SKU,Name,Selling Price\nA-1,New Name,750\n";
        let report = import(&store, &caller, csv.as_bytes(), &ImportOptions::default()).unwrap();

        assert_eq!(report.imported_count, 0);
        assert_eq!(report.updated_count, 1);
        let updated = store.find_by_sku("A-1").unwrap();
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.selling_price, 750.0);
        assert_eq!(updated.description.as_deref(), Some("keep this"));
    }

    #[test]
    fn test_present_but_blank_clears_on_update() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        let mut record = InventoryRecord::new("A-1", "Widget", 500.0, main);
        record.description = Some("stale".into());
        store.add_item(record);

        let csv = "SKU,Name,Selling Price,Description\nA-1,Widget,500,\n";
        import(&store, &caller, csv.as_bytes(), &ImportOptions::default()).unwrap();

        assert!(store.find_by_sku("A-1").unwrap().description.is_none());
    }

    #[test]
    fn test_duplicate_sku_last_wins_single_mutation() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        let csv = "SKU,Name,Selling Price\nDUP-1,First,100\nDUP-1,Second,200\n";

        let report = import(&store, &caller, csv.as_bytes(), &ImportOptions::default()).unwrap();

        assert!(report.errors.is_empty());
        assert_eq!(report.imported_count, 1);
        assert_eq!(report.total_processed, 1);
        assert_eq!(store.find_by_sku("DUP-1").unwrap().name, "Second");
    }

    #[test]
    fn test_schema_failure_aborts_before_rows() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        let csv = "SKU,Name\nA-1,Widget\n";

        let err = import(&store, &caller, csv.as_bytes(), &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::Schema(_)));
        assert!(err.to_string().contains("Selling Price"));
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn test_permission_denied() {
        let (store, main) = seeded_store();
        let caller = CallerIdentity::new("viewer")
            .with_permission(PERM_VIEW_REPORTS)
            .with_default_location(main);

        let err = import(&store, &caller, b"SKU,Name,Selling Price\n", &ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::PermissionDenied(_)));
    }

    #[test]
    fn test_commit_failure_discards_all_but_keeps_row_errors() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        store.set_fail_commits(true);
        let csv = "SKU,Name,Selling Price\nA-1,Widget,1000\n,NoSku,10\nA-2,Gadget,2000\n";

        let report = import(&store, &caller, csv.as_bytes(), &ImportOptions::default()).unwrap();

        assert!(!report.success);
        assert_eq!(report.imported_count, 0);
        assert_eq!(report.updated_count, 0);
        assert_eq!(report.total_processed, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.message.contains("No changes were applied"));
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn test_row_ceiling() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        let mut csv = String::from("SKU,Name,Selling Price\n");
        for i in 0..5 {
            csv.push_str(&format!("A-{},Item,10\n", i));
        }
        let options = ImportOptions { max_rows: 3, delimiter: None };

        let err = import(&store, &caller, csv.as_bytes(), &options).unwrap_err();
        assert!(matches!(err, ImportError::TooManyRows { limit: 3, actual: 5 }));
    }

    #[test]
    fn test_latin1_bytes_import() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        // "Café,1500" with 0xE9: invalid UTF-8, decodes via the Latin-1 family.
        let mut bytes = b"SKU,Name,Selling Price\nL-1,Caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b",1500\n");

        let report = import(&store, &caller, &bytes, &ImportOptions::default()).unwrap();

        assert!(report.success);
        assert_eq!(report.encoding_used, "iso-8859-15");
        assert_eq!(report.imported_count, 1);
    }

    #[test]
    fn test_reference_resolution_errors_collected() {
        let (store, main) = seeded_store();
        let caller = admin(main);
        let csv = "SKU,Name,Selling Price,Location,Supplier\n\
                   A-1,Widget,10,Atlantis,\n\
                   A-2,Gadget,10,Main Store,Ghost Corp\n\
                   A-3,Doohickey,10,Main Store,Acme Supplies\n";

        let report = import(&store, &caller, csv.as_bytes(), &ImportOptions::default()).unwrap();

        assert_eq!(report.imported_count, 1);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].message, "Location 'Atlantis' not found");
        assert_eq!(report.errors[1].message, "Supplier 'Ghost Corp' not found");
    }
}
