//! Import handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, MAX_PAGE_LIMIT};
use northstar_core::{
    import::{latest_import, process_import},
    ImportOutcome, ImportPayload, ImportRecord, ImportSummary, LatestImport,
};

/// Successful import, with the outcome fields inlined
#[derive(Serialize)]
pub struct ImportResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: ImportOutcome,
}

impl From<ImportOutcome> for ImportResponse {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            success: true,
            outcome,
        }
    }
}

/// POST /api/import - Validate, calculate and store an import
pub async fn create_import(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportPayload>,
) -> Result<Json<ImportResponse>, AppError> {
    let outcome = process_import(&state.db, &payload, &state.config.pipeline)?;
    Ok(Json(outcome.into()))
}

#[derive(Serialize)]
pub struct LatestResponse {
    pub success: bool,
    #[serde(flatten)]
    pub latest: LatestImport,
}

/// GET /api/import/latest - Calculation of the most recent import
pub async fn get_latest_import(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LatestResponse>, AppError> {
    let latest = latest_import(&state.db)?.ok_or_else(|| AppError::not_found("No import found"))?;
    Ok(Json(LatestResponse {
        success: true,
        latest,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub imports: Vec<ImportSummary>,
    pub total: i64,
}

/// GET /api/imports - Import history, newest first
pub async fn list_imports(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let imports = state.db.list_imports(limit, offset)?;
    let total = state.db.count_imports()?;
    Ok(Json(HistoryResponse { imports, total }))
}

#[derive(Serialize)]
pub struct ImportDetailResponse {
    pub success: bool,
    #[serde(flatten)]
    pub import: ImportRecord,
}

/// GET /api/imports/:id - One stored import with its datasets and mappings
pub async fn get_import(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ImportDetailResponse>, AppError> {
    let import = state
        .db
        .get_import(id)?
        .ok_or_else(|| AppError::not_found("Import not found"))?;
    Ok(Json(ImportDetailResponse {
        success: true,
        import,
    }))
}
