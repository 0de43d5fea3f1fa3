//! Health, template catalog and mapping suggestion handlers

use std::collections::BTreeMap;

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::AppError;
use northstar_core::{
    suggest_template_mappings, template_by_id, template_listings, DatasetKind, TemplateListing,
    TemplateMappings,
};

/// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "app": "northstar",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<TemplateListing>,
}

/// GET /api/templates - Template catalog
pub async fn list_templates() -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        templates: template_listings(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub template_id: String,
    /// Parsed headers per dataset
    #[serde(default)]
    pub headers: BTreeMap<DatasetKind, Vec<String>>,
    /// Mappings already chosen by the user; never overwritten
    #[serde(default)]
    pub existing: TemplateMappings,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub mappings: TemplateMappings,
}

/// POST /api/mappings/suggest - Auto-map headers onto template fields
pub async fn suggest_mappings(
    Json(req): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, AppError> {
    let template = template_by_id(&req.template_id)?;
    let mappings = suggest_template_mappings(template, &req.headers, &req.existing);
    Ok(Json(SuggestResponse { mappings }))
}
