//! # Stockload - bulk inventory CSV reconciliation
//!
//! Stockload ingests externally authored CSV files describing inventory
//! items, validates and normalizes each row, resolves references by name,
//! and reconciles the result against the store keyed on SKU: one atomic
//! batch of creates and updates, plus a per-row diagnostic report. The
//! inverse direction — export and blank template — emits the same canonical
//! column layout.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌─────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐
//! │ raw bytes │──▶│ Decoder │──▶│ Schema + │──▶│ Resolver │──▶│ Reconcile │
//! │ (any enc) │   │ (fixed  │   │ Normalize│   │ (names → │   │ + atomic  │
//! └───────────┘   │  list)  │   │ (typed)  │   │  ids)    │   │  commit   │
//!                 └─────────┘   └──────────┘   └──────────┘   └───────────┘
//! ```
//!
//! Row errors are collected, never fatal; decode and schema failures abort
//! before any row is evaluated; a store failure during commit discards the
//! whole batch.
//!
//! ## Quick Start
//!
//! ```rust
//! use stockload::{import, CallerIdentity, ImportOptions, MemoryStore, PERM_MANAGE_INVENTORY};
//!
//! let store = MemoryStore::new();
//! let main = store.add_location("Main Store");
//! let caller = CallerIdentity::new("admin")
//!     .with_permission(PERM_MANAGE_INVENTORY)
//!     .with_default_location(main);
//!
//! let csv = b"SKU,Name,Selling Price\nA-1,Widget,1000\n";
//! let report = import(&store, &caller, csv, &ImportOptions::default()).unwrap();
//! assert_eq!(report.imported_count, 1);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (records, references, caller, field patches)
//! - [`decoder`] - Byte decoding and cell parsing
//! - [`schema`] - Column schema and header resolution
//! - [`normalize`] - Typed row normalization
//! - [`resolve`] - Reference-name resolution
//! - [`reconcile`] - Create/update classification and merge
//! - [`store`] - Store contract and in-memory implementation
//! - [`pipeline`] - Import orchestration
//! - [`export`] - Export and template generation
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Import pipeline, leaves first
pub mod decoder;
pub mod schema;
pub mod normalize;
pub mod resolve;
pub mod reconcile;

// Persistence seam
pub mod store;

// Orchestration
pub mod pipeline;

// Inverse direction
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{DecodeError, ExportError, ImportError, SchemaError, StoreError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CallerIdentity, Category, InventoryRecord, Location, Patch, Supplier, DEFAULT_UNIT,
    PERM_MANAGE_INVENTORY, PERM_VIEW_REPORTS,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use decoder::{decode_table, detect_delimiter, DecodedTable};
pub use normalize::{parse_number, NormalizedRow, RowError};
pub use pipeline::{import, ImportOptions, ImportReport, DEFAULT_MAX_ROWS};
pub use reconcile::{ItemPatch, Mutation, MutationPlan, NewItem};
pub use resolve::{ReferenceSnapshot, ResolvedRow};
pub use schema::{resolve_columns, ColumnMap, COLUMN_ORDER, REQUIRED_COLUMNS};

// =============================================================================
// Re-exports - Store
// =============================================================================

pub use store::{InventoryStore, MemoryStore};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{export, export_filename, template, ExportFile};

// Server
pub mod server {
    pub use crate::api::server::{start_server, AppState};
}
