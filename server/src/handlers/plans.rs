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
use upkeep_shared::{MaintenancePlan, TaskTemplate, PLAN_STATUSES};
use uuid::Uuid;

use crate::error::{ApiResult, AppError};
use crate::validation::{one_of, string};
use crate::AppState;

#[derive(Serialize, Deserialize)]
pub struct PlanCreate {
    pub org_id: Uuid,
    pub name: Option<String>,
    pub status: Option<String>,
    pub target_asset_type: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskTemplate>,
}

#[derive(Serialize, Deserialize)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub status: Option<String>,
    pub target_asset_type: Option<String>,
    pub tasks: Option<Vec<TaskTemplate>>,
}

#[derive(Serialize, Deserialize)]
pub struct PlanQuery {
    pub org_id: Uuid,
}

pub fn plan_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/:id", get(get_plan).put(update_plan))
}

async fn list_plans(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlanQuery>,
) -> ApiResult<Json<Vec<MaintenancePlan>>> {
    let plans = sqlx::query_as::<_, MaintenancePlan>(
        "SELECT * FROM maintenance_plans WHERE org_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.org_id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(plans))
}

async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlanCreate>,
) -> ApiResult<(StatusCode, Json<MaintenancePlan>)> {
    let name = string::required(&payload.name, "name")?;
    let status = match &payload.status {
        Some(status) => one_of(status, "status", &PLAN_STATUSES)?,
        None => "active".to_string(),
    };

    let plan = sqlx::query_as::<_, MaintenancePlan>(
        "INSERT INTO maintenance_plans (id, org_id, name, status, target_asset_type, tasks, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.org_id)
    .bind(&name)
    .bind(&status)
    .bind(&payload.target_asset_type)
    .bind(SqlJson(&payload.tasks))
    .bind(Utc::now())
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MaintenancePlan>> {
    let plan = fetch_plan(&state, id).await?;
    Ok(Json(plan))
}

async fn update_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PlanUpdate>,
) -> ApiResult<Json<MaintenancePlan>> {
    let name = match &payload.name {
        Some(_) => Some(string::required(&payload.name, "name")?),
        None => None,
    };
    let status = match &payload.status {
        Some(status) => Some(one_of(status, "status", &PLAN_STATUSES)?),
        None => None,
    };

    // Unspecified fields merge against the live row, as in update_ticket.
    let plan = sqlx::query_as::<_, MaintenancePlan>(
        "UPDATE maintenance_plans
         SET name = COALESCE($2, name),
             status = COALESCE($3, status),
             target_asset_type = COALESCE($4, target_asset_type),
             tasks = COALESCE($5, tasks),
             updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&name)
    .bind(&status)
    .bind(&payload.target_asset_type)
    .bind(payload.tasks.as_ref().map(SqlJson))
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Maintenance plan".to_string()))?;

    Ok(Json(plan))
}

async fn fetch_plan(state: &AppState, id: Uuid) -> ApiResult<MaintenancePlan> {
    sqlx::query_as::<_, MaintenancePlan>("SELECT * FROM maintenance_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Maintenance plan".to_string()))
}
