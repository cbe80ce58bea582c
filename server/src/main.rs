use axum::{http::Method, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod database;
mod error;
mod handlers;
mod jobs;
mod services;
mod store;
mod triggers;
mod validation;

pub use error::{ApiError, ApiResult, AppError};

#[cfg(test)]
mod tests;

use jobs::{JobConfig, JobScheduler};
use store::{PgStore, Store};

pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub store: Arc<dyn Store>,
    pub scheduler: Arc<JobScheduler>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    let db_pool = database::create_pool(&config.database_url).await?;

    database::migrate(&db_pool).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(db_pool.clone()));

    let scheduler = JobScheduler::new(
        store.clone(),
        JobConfig {
            preventive_cron: config.preventive_cron.clone(),
        },
    )
    .await?;
    scheduler.start().await?;

    let app_state = Arc::new(AppState {
        db_pool,
        store,
        scheduler: Arc::new(scheduler),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "Upkeep Helpdesk API v1.0.0" }))
        .route("/health", get(handlers::health_check))
        .route("/api/v1/dashboard", get(handlers::dashboard_stats))
        .nest("/api/v1", handlers::api_routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!("Server running on {}", config.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
