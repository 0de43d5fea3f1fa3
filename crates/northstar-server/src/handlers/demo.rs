//! Demo seeding and reset handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::imports::ImportResponse;
use crate::{AppError, AppState};
use northstar_core::{import::seed_sample_import, DEFAULT_TEMPLATE_ID};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRequest {
    pub template_id: Option<String>,
}

/// POST /api/demo/seed - Import a template's sample data
pub async fn seed_demo(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SeedRequest>>,
) -> Result<Json<ImportResponse>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let template_id = req.template_id.as_deref().unwrap_or(DEFAULT_TEMPLATE_ID);

    let outcome = seed_sample_import(&state.db, template_id, &state.config.pipeline)?;
    Ok(Json(outcome.into()))
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub deleted: usize,
}

/// POST /api/demo/reset - Clear every stored import
pub async fn reset_demo(State(state): State<Arc<AppState>>) -> Result<Json<ResetResponse>, AppError> {
    let deleted = state.db.reset_imports()?;
    info!(deleted, "Demo data reset");
    Ok(Json(ResetResponse {
        success: true,
        deleted,
    }))
}
