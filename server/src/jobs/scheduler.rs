// Job Scheduler - Central scheduler for all background jobs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler as TokioScheduler, JobSchedulerError};
use tracing::{error, info};
use uuid::Uuid;

use super::{GenerationResult, PreventiveMaintenanceJob};
use crate::store::{Store, StoreError};

const MAX_EXECUTION_LOGS: usize = 100;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Scheduler error: {0}")]
    SchedulerError(#[from] JobSchedulerError),
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Six-field cron expression for the preventive generator.
    pub preventive_cron: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            // 1st of every month, midnight UTC
            preventive_cron: "0 0 0 1 * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecutionLog {
    pub id: Uuid,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub items_processed: i32,
    pub errors: Vec<String>,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum JobStatus {
    Completed,
    Failed,
}

pub struct JobScheduler {
    scheduler: TokioScheduler,
    store: Arc<dyn Store>,
    config: JobConfig,
    execution_logs: Arc<RwLock<Vec<JobExecutionLog>>>,
}

impl JobScheduler {
    pub async fn new(store: Arc<dyn Store>, config: JobConfig) -> JobResult<Self> {
        let scheduler = TokioScheduler::new().await?;

        Ok(Self {
            scheduler,
            store,
            config,
            execution_logs: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub async fn start(&self) -> JobResult<()> {
        info!("Starting background job scheduler");

        self.schedule_preventive_generator().await?;
        self.scheduler.start().await?;

        info!("Background job scheduler started");
        Ok(())
    }

    async fn schedule_preventive_generator(&self) -> JobResult<()> {
        let cron_expr = self.config.preventive_cron.clone();
        let store = self.store.clone();
        let logs = self.execution_logs.clone();

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
            let store = store.clone();
            let logs = logs.clone();

            Box::pin(async move {
                let started_at = Utc::now();
                info!("Running preventive maintenance generator");

                let generator = PreventiveMaintenanceJob::new(store);
                match generator.run().await {
                    Ok(result) => {
                        push_log(
                            &logs,
                            execution_log(started_at, JobStatus::Completed, result.tickets_created, vec![]),
                        )
                        .await;
                        info!(
                            "Preventive generator completed: {} tickets created for cycle {}",
                            result.tickets_created, result.cycle
                        );
                    }
                    Err(e) => {
                        push_log(
                            &logs,
                            execution_log(started_at, JobStatus::Failed, 0, vec![e.to_string()]),
                        )
                        .await;
                        error!("Preventive generator failed: {}", e);
                    }
                }
            })
        })?;

        self.scheduler.add(job).await?;
        info!(
            "Scheduled preventive maintenance generator with cron '{}'",
            self.config.preventive_cron
        );

        Ok(())
    }

    pub async fn get_execution_logs(&self) -> Vec<JobExecutionLog> {
        self.execution_logs.read().await.clone()
    }

    /// Run a scheduled job immediately, outside its cron window.
    pub async fn run_job_now(&self, job_name: &str) -> JobResult<GenerationResult> {
        match job_name {
            "preventive_generator" => {
                let started_at = Utc::now();
                let generator = PreventiveMaintenanceJob::new(self.store.clone());

                match generator.run().await {
                    Ok(result) => {
                        push_log(
                            &self.execution_logs,
                            execution_log(started_at, JobStatus::Completed, result.tickets_created, vec![]),
                        )
                        .await;
                        Ok(result)
                    }
                    Err(e) => {
                        push_log(
                            &self.execution_logs,
                            execution_log(started_at, JobStatus::Failed, 0, vec![e.to_string()]),
                        )
                        .await;
                        Err(e.into())
                    }
                }
            }
            _ => Err(JobError::ConfigError(format!("Unknown job: {}", job_name))),
        }
    }
}

fn execution_log(
    started_at: DateTime<Utc>,
    status: JobStatus,
    items_processed: i32,
    errors: Vec<String>,
) -> JobExecutionLog {
    let completed_at = Utc::now();
    JobExecutionLog {
        id: Uuid::new_v4(),
        job_name: "Preventive Maintenance Generator".to_string(),
        started_at,
        completed_at: Some(completed_at),
        status,
        items_processed,
        errors,
        duration_ms: Some((completed_at - started_at).num_milliseconds()),
    }
}

async fn push_log(logs: &Arc<RwLock<Vec<JobExecutionLog>>>, log: JobExecutionLog) {
    let mut logs = logs.write().await;
    logs.push(log);
    if logs.len() > MAX_EXECUTION_LOGS {
        logs.remove(0);
    }
}
