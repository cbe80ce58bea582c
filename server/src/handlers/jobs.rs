use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::error::{ApiResult, AppError};
use crate::jobs::{JobError, JobExecutionLog};
use crate::AppState;

pub fn job_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:name/run", post(run_job))
        .route("/runs", get(list_job_runs))
}

async fn run_job(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    match state.scheduler.run_job_now(&name).await {
        Ok(report) => Ok(Json(json!({
            "status": "completed",
            "job": name,
            "report": report,
        }))),
        Err(JobError::ConfigError(_)) => Err(AppError::NotFound(format!("Job '{}'", name))),
        Err(JobError::StoreError(e)) => Err(e.into()),
        Err(JobError::SchedulerError(e)) => Err(AppError::InternalError(e.to_string())),
    }
}

async fn list_job_runs(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<JobExecutionLog>>> {
    Ok(Json(state.scheduler.get_execution_logs().await))
}
