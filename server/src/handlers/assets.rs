use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use std::sync::Arc;
use upkeep_shared::{Asset, SoftwareRecord, ASSET_STATUSES};
use uuid::Uuid;

use crate::error::{ApiResult, AppError};
use crate::validation::{one_of, string};
use crate::AppState;

#[derive(Serialize, Deserialize)]
pub struct AssetCreate {
    pub org_id: Uuid,
    pub name: Option<String>,
    pub asset_type: Option<String>,
    pub status: Option<String>,
    pub model: Option<String>,
    pub os: Option<String>,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub softwares: Vec<SoftwareRecord>,
}

#[derive(Serialize, Deserialize)]
pub struct AssetQuery {
    pub org_id: Uuid,
}

pub fn asset_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/:id", get(get_asset))
}

async fn list_assets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AssetQuery>,
) -> ApiResult<Json<Vec<Asset>>> {
    let assets = sqlx::query_as::<_, Asset>(
        "SELECT * FROM assets WHERE org_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.org_id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(assets))
}

async fn create_asset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AssetCreate>,
) -> ApiResult<(StatusCode, Json<Asset>)> {
    let name = string::required(&payload.name, "name")?;
    let asset_type = string::required(&payload.asset_type, "asset_type")?;
    let status = match &payload.status {
        Some(status) => one_of(status, "status", &ASSET_STATUSES)?,
        None => "active".to_string(),
    };
    let model = string::max_length(&payload.model, "model", 200)?;
    let location = string::max_length(&payload.location, "location", 200)?;

    let asset = sqlx::query_as::<_, Asset>(
        "INSERT INTO assets (id, org_id, name, asset_type, status, model, os, serial_number,
                             location, softwares, last_audit, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NULL, $11)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.org_id)
    .bind(&name)
    .bind(&asset_type)
    .bind(&status)
    .bind(&model)
    .bind(&payload.os)
    .bind(&payload.serial_number)
    .bind(&location)
    .bind(SqlJson(&payload.softwares))
    .bind(Utc::now())
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}

async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Asset>> {
    let asset = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset".to_string()))?;

    Ok(Json(asset))
}
