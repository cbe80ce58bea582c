use axum::{extract::{Query, State}, http::StatusCode, response::Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::{database, AppState};

pub mod agent;
pub mod assets;
pub mod jobs;
pub mod orgs;
pub mod plans;
pub mod tickets;

pub use agent::agent_routes;
pub use assets::asset_routes;
pub use jobs::job_routes;
pub use orgs::org_routes;
pub use plans::plan_routes;
pub use tickets::ticket_routes;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/agent", agent_routes())
        .nest("/assets", asset_routes())
        .nest("/jobs", job_routes())
        .nest("/orgs", org_routes())
        .nest("/plans", plan_routes())
        .nest("/tickets", ticket_routes())
}

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let db_up = database::health_check(&state.db_pool).await;
    let pool = database::get_pool_stats(&state.db_pool);

    let status = if db_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if db_up { "healthy" } else { "degraded" },
            "service": "upkeep-api",
            "database": if db_up { "up" } else { "down" },
            "pool": pool,
        })),
    )
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub org_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_tickets: i64,
    /// open or in_progress
    pub open_tickets: i64,
    /// resolved or closed
    pub resolved_tickets: i64,
    /// still open after 48 hours
    pub late_tickets: i64,
    pub tickets_by_month: Vec<MonthCount>,
}

#[derive(Debug, Serialize)]
pub struct MonthCount {
    pub month: String, // YYYY-MM
    pub count: i64,
}

#[derive(sqlx::FromRow)]
struct TicketCountsRow {
    total: i64,
    open: i64,
    resolved: i64,
    late: i64,
}

#[derive(sqlx::FromRow)]
struct MonthCountRow {
    month: String,
    count: i64,
}

pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardStats>> {
    let counts = sqlx::query_as::<_, TicketCountsRow>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status IN ('open', 'in_progress')) AS open,
            COUNT(*) FILTER (WHERE status IN ('resolved', 'closed')) AS resolved,
            COUNT(*) FILTER (
                WHERE status IN ('open', 'in_progress')
                AND created_at < NOW() - INTERVAL '48 hours'
            ) AS late
        FROM tickets
        WHERE org_id = $1
        "#,
    )
    .bind(params.org_id)
    .fetch_one(&state.db_pool)
    .await?;

    let months = sqlx::query_as::<_, MonthCountRow>(
        r#"
        SELECT to_char(date_trunc('month', created_at), 'YYYY-MM') AS month, COUNT(*) AS count
        FROM tickets
        WHERE org_id = $1 AND created_at >= date_trunc('month', NOW()) - INTERVAL '5 months'
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(params.org_id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(DashboardStats {
        total_tickets: counts.total,
        open_tickets: counts.open,
        resolved_tickets: counts.resolved,
        late_tickets: counts.late,
        tickets_by_month: months
            .into_iter()
            .map(|row| MonthCount {
                month: row.month,
                count: row.count,
            })
            .collect(),
    }))
}
