//! Northstar Web Server
//!
//! Axum-based REST API over the Northstar KPI pipeline.
//!
//! - Template listing and mapping suggestions
//! - Imports, latest calculation, import history and stored import detail
//! - CSV / XLSX export downloads
//! - Demo seeding and reset hooks
//!
//! Errors are returned as `{success: false, error}`; internal failures are
//! logged and answered with a generic message.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info};

use northstar_core::{Database, PipelineConfig};

mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Environment variable listing allowed CORS origins (comma-separated, `*` for any)
pub const ALLOWED_ORIGINS_ENV: &str = "NORTHSTAR_ALLOWED_ORIGINS";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only, `*` = any origin)
    pub allowed_origins: Vec<String>,
    /// Limits applied to every import
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    /// Parse a comma-separated origin list
    pub fn parse_origins(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    // Bodies larger than the pipeline ceiling must still reach the import
    // handler so the caller gets the pipeline's own size error.
    let body_limit = config.pipeline.max_payload_bytes.saturating_mul(2);

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Templates and mapping
        .route("/templates", get(handlers::list_templates))
        .route("/mappings/suggest", post(handlers::suggest_mappings))
        // Imports
        .route("/import", post(handlers::create_import))
        .route("/import/latest", get(handlers::get_latest_import))
        .route("/imports", get(handlers::list_imports))
        .route("/imports/:id", get(handlers::get_import))
        // Exports
        .route("/exports", get(handlers::export_latest))
        // Demo support
        .route("/demo/seed", post(handlers::seed_demo))
        .route("/demo/reset", post(handlers::reset_demo));

    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.allowed_origins.iter().any(|o| o == "*") {
        // Local development: any origin
        CorsLayer::permissive()
    } else if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    };

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    // Serve the dashboard bundle if a directory is provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    match db.count_imports() {
        Ok(count) => info!("Import store ready at {} ({} imports)", db.path(), count),
        Err(e) => error!("Failed to read import store: {}", e),
    }

    let app = create_router(db, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

/// Status and client message for pipeline errors the caller can act on
fn client_error(err: &northstar_core::Error) -> Option<(StatusCode, String)> {
    use northstar_core::Error;

    let status = match err {
        Error::UnknownTemplate(_) | Error::ValidationFailed(_) | Error::InvalidData(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        Error::NothingToExport => StatusCode::NOT_FOUND,
        _ => return None,
    };
    Some((status, err.to_string()))
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        if let Some((status, message)) = err
            .downcast_ref::<northstar_core::Error>()
            .and_then(client_error)
        {
            return Self {
                status,
                message,
                internal: None,
            };
        }

        let message = match err.downcast_ref::<northstar_core::Error>() {
            Some(northstar_core::Error::ExportGenerationFailed(_)) => "Export generation failed",
            // Return generic message to client
            _ => "An internal error occurred",
        };

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
