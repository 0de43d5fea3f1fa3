//! Export download handler

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Response, StatusCode},
};
use serde::Deserialize;

use crate::{AppError, AppState};
use northstar_core::{build_export, ExportFormat};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// `csv` or `excel` (default: csv)
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "csv".to_string()
}

/// GET /api/exports - Download the latest calculation as CSV or XLSX
pub async fn export_latest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportQuery>,
) -> Result<Response<Body>, AppError> {
    let format: ExportFormat = params
        .format
        .parse()
        .map_err(|_| AppError::bad_request("Invalid format. Use 'csv' or 'excel'"))?;

    let file = build_export(&state.db, format)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        )
        .body(Body::from(file.bytes))
        .map_err(|e| AppError::internal(&e.to_string()))
}
