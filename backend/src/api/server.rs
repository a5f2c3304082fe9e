//! HTTP server for the Shelflife API.
//!
//! Provides REST endpoints for spreadsheet upload and import.
//! Committing records is left to the client.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/import`     | Upload a CSV file for import         |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, failure_response, ImportResponse};
use crate::config::{AliasTable, ImportOptions};
use crate::error::{ServerError, ServerResult};
use crate::models::SourceLabel;
use crate::transform::pipeline::import_bytes;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared, read-only import configuration.
#[derive(Debug, Clone)]
pub struct AppState {
    pub aliases: Arc<AliasTable>,
    pub options: Arc<ImportOptions>,
}

impl AppState {
    pub fn new(aliases: AliasTable, options: ImportOptions) -> Self {
        Self {
            aliases: Arc::new(aliases),
            options: Arc::new(options),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Import(failure) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(failure_response(&failure))).into_response()
            }
            ServerError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(error_response(&message))).into_response()
            }
            ServerError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&message))).into_response()
            }
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/import", post(import_upload))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Shelflife server running on http://localhost:{}", port);
    println!("   POST /api/import - Upload a spreadsheet (CSV)");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "shelflife",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "import": "POST /api/import",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers just drop the missed entries.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: multipart field `file`.
async fn import_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<ImportResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    let name = file_name.unwrap_or_else(|| "upload".to_string());
    let source = SourceLabel::new(name).with_size(bytes.len() as u64);
    log_info(format!("New upload: {}", source));

    let success = tokio::task::spawn_blocking(move || {
        import_bytes(&bytes, source, &state.aliases, &state.options)
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(ImportResponse::from(success)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ImportDiagnostics;
    use crate::error::{ImportError, ImportFailure};

    #[test]
    fn test_error_status_codes() {
        let failure = ImportFailure::new(ImportError::EmptySource, ImportDiagnostics::default());
        assert_eq!(
            ServerError::Import(failure).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServerError::BadRequest("No file provided".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_router_builds() {
        let _app = router(AppState::new(AliasTable::default(), ImportOptions::default()));
    }
}
