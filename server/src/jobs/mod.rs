// Background Jobs Service
//
// Scheduled work that runs independently of the request path. The
// preventive maintenance generator is the only recurring job; the
// scheduler wraps tokio-cron-scheduler and keeps a bounded in-memory
// log of recent runs for the jobs API.

pub mod preventive;
pub mod scheduler;

pub use preventive::{GenerationResult, PreventiveMaintenanceJob};
pub use scheduler::{JobConfig, JobError, JobExecutionLog, JobResult, JobScheduler, JobStatus};
