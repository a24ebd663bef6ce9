//! HTTP server for the stockload API.
//!
//! Authentication lives in front of this service; the server is configured
//! with the already-authorized caller identity it acts as.
//!
//! # API Endpoints
//!
//! | Method | Path                      | Description                        |
//! |--------|---------------------------|------------------------------------|
//! | GET    | `/health`                 | Health check                       |
//! | POST   | `/api/inventory/import`   | Upload CSV, returns import report  |
//! | GET    | `/api/inventory/export`   | Download current inventory as CSV  |
//! | GET    | `/api/inventory/template` | Download blank import template     |
//! | GET    | `/api/logs`               | SSE stream of pipeline progress    |

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::LOG_BROADCASTER;
use super::types::{error_report, export_status, import_status};
use crate::export::{export, template};
use crate::models::CallerIdentity;
use crate::pipeline::{import, ImportOptions, ImportReport};
use crate::store::InventoryStore;

/// Shared server state: the store and the caller the server acts as.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
    pub caller: CallerIdentity,
    pub options: ImportOptions,
}

/// Start the HTTP server.
pub async fn start_server(port: u16, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/inventory/import", post(import_csv))
        .route("/api/inventory/export", get(export_csv))
        .route("/api/inventory/template", get(download_template))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("stockload server running on http://localhost:{}", port);
    println!("   POST /api/inventory/import   - Upload inventory CSV");
    println!("   GET  /api/inventory/export   - Download inventory CSV");
    println!("   GET  /api/inventory/template - Download import template");
    println!("   GET  /api/logs               - SSE progress stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "stockload",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint streaming pipeline progress.
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Import endpoint: multipart upload with a `file` field.
async fn import_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportReport>, (StatusCode, Json<Value>)> {
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, Json(error_report(&format!("Multipart error: {}", e))))
    })? {
        if field.name() == Some("file") {
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| {
                        (StatusCode::BAD_REQUEST, Json(error_report(&format!("Read error: {}", e))))
                    })?
                    .to_vec(),
            );
        }
    }

    let bytes = file_data
        .ok_or_else(|| (StatusCode::BAD_REQUEST, Json(error_report("No file provided"))))?;

    let report = import(state.store.as_ref(), &state.caller, &bytes, &state.options)
        .map_err(|e| (import_status(&e), Json(error_report(&e.to_string()))))?;

    Ok(Json(report))
}

/// Query parameters for the export endpoint.
#[derive(Debug, Deserialize)]
struct ExportQuery {
    location: Option<Uuid>,
}

/// Export endpoint: CSV body with a dated attachment filename.
async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let file = export(state.store.as_ref(), &state.caller, query.location)
        .map_err(|e| (export_status(&e), Json(error_report(&e.to_string()))))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.bytes,
    )
        .into_response())
}

/// Template endpoint: header row plus one example row.
async fn download_template() -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inventory_template.csv\"".to_string(),
            ),
        ],
        template(),
    )
        .into_response()
}
