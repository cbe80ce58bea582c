use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use upkeep_shared::Organization;
use uuid::Uuid;

use crate::error::{ApiResult, AppError};
use crate::validation::string;
use crate::AppState;

#[derive(Serialize, Deserialize)]
pub struct OrgCreate {
    pub name: Option<String>,
}

/// Provisioning response. The agent key is shown here and never again;
/// `Organization` itself refuses to serialize it.
#[derive(Serialize)]
pub struct ProvisionedOrg {
    #[serde(flatten)]
    pub organization: Organization,
    pub agent_api_key: String,
}

pub fn org_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_org))
        .route("/:id", get(get_org))
}

async fn create_org(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OrgCreate>,
) -> ApiResult<(StatusCode, Json<ProvisionedOrg>)> {
    let name = string::required(&payload.name, "name")?;
    let agent_api_key = generate_agent_key();

    let organization = sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations (id, name, agent_api_key, tickets_closed_total, created_at)
         VALUES ($1, $2, $3, 0, $4)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(&agent_api_key)
    .bind(Utc::now())
    .fetch_one(&state.db_pool)
    .await?;

    tracing::info!("Provisioned organization '{}' ({})", name, organization.id);

    Ok((
        StatusCode::CREATED,
        Json(ProvisionedOrg {
            organization,
            agent_api_key,
        }),
    ))
}

async fn get_org(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Organization>> {
    let organization = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization".to_string()))?;

    Ok(Json(organization))
}

fn generate_agent_key() -> String {
    let mut secret = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut secret);
    format!("upk_{}", hex::encode(secret))
}
