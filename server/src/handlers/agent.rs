// Desktop agent endpoints
//
// The installed agent posts inventory audits with per-org credentials in
// headers. Auth is checked before the body is touched, so a bad payload
// with bad credentials still answers 401.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use upkeep_shared::AuditEnvelope;
use uuid::Uuid;

use crate::error::{ApiResult, AppError};
use crate::services::{AuditIngestService, IngestError};
use crate::AppState;

pub fn agent_routes() -> Router<Arc<AppState>> {
    Router::new().route("/audit", post(receive_audit))
}

async fn receive_audit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    let api_key = required_header(&headers, "x-api-key")?;
    let org_id = required_header(&headers, "x-org-id")?;
    let org_id = Uuid::parse_str(&org_id)
        .map_err(|_| AppError::Unauthorized("x-org-id must be a UUID".to_string()))?;

    match state.store.agent_api_key(org_id).await? {
        Some(expected) if expected == api_key => {}
        _ => {
            tracing::warn!("Rejected agent audit for org {}", org_id);
            return Err(AppError::Forbidden("Agent key rejected".to_string()));
        }
    }

    let envelope: AuditEnvelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed audit payload: {}", e)))?;
    let report = envelope
        .data
        .ok_or_else(|| AppError::BadRequest("Missing data field".to_string()))?;

    let ingest = AuditIngestService::new(state.store.clone());
    // Store failures here are always internal; the upsert has no caller-visible
    // not-found case.
    let outcome = ingest.ingest(org_id, report).await.map_err(|e| match e {
        IngestError::Invalid(msg) => AppError::BadRequest(msg),
        IngestError::Store(e) => AppError::InternalError(e.to_string()),
    })?;

    tracing::debug!(
        "Audit accepted for org {}: asset {} ({}, {} flagged packages)",
        org_id,
        outcome.asset_id,
        if outcome.created { "registered" } else { "updated" },
        outcome.flagged.len()
    );

    Ok(Json(json!({
        "status": "success",
        "assetId": outcome.asset_id,
    })))
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", name)))
}
