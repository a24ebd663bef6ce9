//! Error types for the stockload import/export pipeline.
//!
//! Two kinds of failure live in this crate and only one of them is an `Err`:
//!
//! - Top-level failures ([`DecodeError`], [`SchemaError`], [`ImportError`])
//!   abort the whole submission before any mutation is applied.
//! - Row-level diagnostics are plain data ([`crate::normalize::RowError`]),
//!   collected into the report and never propagated through `Result`.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors turning raw bytes into a table of text rows.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// None of the candidate encodings decoded every byte cleanly.
    #[error("Unable to decode file; tried encodings: {}", attempted.join(", "))]
    UnsupportedEncoding { attempted: Vec<String> },

    /// The file has no header row.
    #[error("CSV file is empty")]
    EmptyFile,

    /// The decoded text is not parseable as CSV.
    #[error("Malformed CSV: {0}")]
    Malformed(String),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Whole-file structural defects detected before any row is processed.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// One or more required columns are missing from the header.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// =============================================================================
// Store Errors
// =============================================================================

/// Failures reported by the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A constraint was violated while applying a batch.
    #[error("Store constraint violation: {0}")]
    Conflict(String),

    /// The store could not be reached or the transaction was rolled back.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Import Errors (top-level)
// =============================================================================

/// Top-level import failures.
///
/// Any of these aborts the submission with no report and no counts. A
/// store failure during the final commit is deliberately *not* here: the
/// pipeline converts it into a report with `success = false` so the caller
/// still sees the row errors collected before the commit was attempted.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Caller lacks the required permission.
    #[error("Access denied. Required permission: {0}")]
    PermissionDenied(String),

    /// Byte-level decoding failed.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Required columns missing.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Reading the reference or SKU snapshot failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The file exceeds the configured row ceiling.
    #[error("File has {actual} data rows, exceeding the limit of {limit}")]
    TooManyRows { limit: usize, actual: usize },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Failures serializing the current inventory back to CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Caller lacks the required permission.
    #[error("Access denied. Required permission: {0}")]
    PermissionDenied(String),

    /// Reading inventory from the store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
