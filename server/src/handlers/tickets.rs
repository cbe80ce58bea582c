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
use upkeep_shared::{TaskTemplate, Ticket, TICKET_PRIORITIES, TICKET_STATUSES};
use uuid::Uuid;

use crate::error::{ApiResult, AppError};
use crate::triggers::TicketChangeHandler;
use crate::validation::{one_of, string};
use crate::AppState;

#[derive(Serialize, Deserialize)]
pub struct TicketCreate {
    pub org_id: Uuid,
    pub asset_id: Option<Uuid>,
    pub requester_name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TicketUpdate {
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub checklist: Option<Vec<TaskTemplate>>,
}

#[derive(Serialize, Deserialize)]
pub struct TicketQuery {
    pub org_id: Uuid,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub fn ticket_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/:id", get(get_ticket).put(update_ticket))
}

async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TicketQuery>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);

    let tickets = match &params.status {
        Some(status) => {
            let status = one_of(status, "status", &TICKET_STATUSES)?;
            sqlx::query_as::<_, Ticket>(
                "SELECT * FROM tickets WHERE org_id = $1 AND status = $2
                 ORDER BY created_at DESC LIMIT $3",
            )
            .bind(params.org_id)
            .bind(status)
            .bind(limit)
            .fetch_all(&state.db_pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Ticket>(
                "SELECT * FROM tickets WHERE org_id = $1 ORDER BY created_at DESC LIMIT $2",
            )
            .bind(params.org_id)
            .bind(limit)
            .fetch_all(&state.db_pool)
            .await?
        }
    };

    Ok(Json(tickets))
}

async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TicketCreate>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let requester_name = string::required(&payload.requester_name, "requester_name")?;
    let description = string::required(&payload.description, "description")?;
    let priority = match &payload.priority {
        Some(priority) => one_of(priority, "priority", &TICKET_PRIORITIES)?,
        None => "medium".to_string(),
    };

    // Denormalized onto the ticket so lists render without a join.
    let asset_name = match payload.asset_id {
        Some(asset_id) => Some(
            sqlx::query_scalar::<_, String>(
                "SELECT name FROM assets WHERE id = $1 AND org_id = $2",
            )
            .bind(asset_id)
            .bind(payload.org_id)
            .fetch_optional(&state.db_pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Asset".to_string()))?,
        ),
        None => None,
    };

    let ticket = sqlx::query_as::<_, Ticket>(
        "INSERT INTO tickets (id, org_id, asset_id, asset_name, requester_name, description,
                              status, priority, ticket_type, checklist, dedup_key, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, 'open', $7, 'support', $8, NULL, $9)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.org_id)
    .bind(payload.asset_id)
    .bind(&asset_name)
    .bind(&requester_name)
    .bind(&description)
    .bind(&priority)
    .bind(SqlJson(Vec::<TaskTemplate>::new()))
    .bind(Utc::now())
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Ticket>> {
    let ticket = fetch_ticket(&state, id).await?;
    Ok(Json(ticket))
}

async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TicketUpdate>,
) -> ApiResult<Json<Ticket>> {
    let patch = validate_patch(&payload)?;
    let before = fetch_ticket(&state, id).await?;

    // NULL binds leave a column as-is. Merging in the statement keeps a
    // concurrent update from being overwritten with this handler's earlier
    // read.
    let after = sqlx::query_as::<_, Ticket>(
        "UPDATE tickets
         SET description = COALESCE($2, description),
             status = COALESCE($3, status),
             priority = COALESCE($4, priority),
             checklist = COALESCE($5, checklist),
             updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&patch.description)
    .bind(&patch.status)
    .bind(&patch.priority)
    .bind(payload.checklist.as_ref().map(SqlJson))
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Ticket".to_string()))?;

    // Counter update runs after the commit; a failed bump is logged and the
    // updated ticket is still returned.
    let kpi = TicketChangeHandler::new(state.store.clone());
    if let Err(e) = kpi.on_ticket_updated(&before, &after).await {
        tracing::error!("Closed counter update failed for ticket {}: {}", after.id, e);
    }

    Ok(Json(after))
}

struct TicketPatch {
    description: Option<String>,
    status: Option<String>,
    priority: Option<String>,
}

fn validate_patch(payload: &TicketUpdate) -> ApiResult<TicketPatch> {
    let description = match &payload.description {
        Some(_) => Some(string::required(&payload.description, "description")?),
        None => None,
    };
    let status = match &payload.status {
        Some(status) => Some(one_of(status, "status", &TICKET_STATUSES)?),
        None => None,
    };
    let priority = match &payload.priority {
        Some(priority) => Some(one_of(priority, "priority", &TICKET_PRIORITIES)?),
        None => None,
    };

    Ok(TicketPatch {
        description,
        status,
        priority,
    })
}

async fn fetch_ticket(state: &AppState, id: Uuid) -> ApiResult<Ticket> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket".to_string()))
}
