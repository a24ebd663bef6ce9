//! Wire types and error mapping for the HTTP surface.
//!
//! The import report serializes as-is; this module only adds the error body
//! for top-level failures and the status-code mapping.

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::error::{ExportError, ImportError};

/// JSON body for a submission that failed as a whole. Mirrors the report
/// shape so clients can parse one structure for both outcomes.
pub fn error_report(message: &str) -> Value {
    json!({
        "success": false,
        "imported_count": 0,
        "updated_count": 0,
        "total_processed": 0,
        "errors": [],
        "encoding_used": "",
        "message": message,
    })
}

/// HTTP status for a top-level import failure.
pub fn import_status(err: &ImportError) -> StatusCode {
    match err {
        ImportError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ImportError::Decode(_) | ImportError::Schema(_) | ImportError::TooManyRows { .. } => {
            StatusCode::BAD_REQUEST
        }
        ImportError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTTP status for an export failure.
pub fn export_status(err: &ExportError) -> StatusCode {
    match err {
        ExportError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ExportError::Store(_) | ExportError::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, SchemaError};

    #[test]
    fn test_error_report_shape() {
        let body = error_report("Missing required columns: Selling Price");
        assert_eq!(body["success"], false);
        assert_eq!(body["imported_count"], 0);
        assert!(body["errors"].as_array().unwrap().is_empty());
        assert!(body["message"].as_str().unwrap().contains("Selling Price"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            import_status(&ImportError::PermissionDenied("manage_inventory".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            import_status(&ImportError::Decode(DecodeError::EmptyFile)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            import_status(&ImportError::Schema(SchemaError::MissingColumns(vec!["SKU".into()]))),
            StatusCode::BAD_REQUEST
        );
    }
}
