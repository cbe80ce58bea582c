// Storage seam for the core components
//
// The generator, the KPI trigger, and the audit ingest service reach storage
// only through this trait. One handle is built at startup and passed down
// explicitly; handlers outside the core talk to the pool directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use upkeep_shared::{Asset, MaintenancePlan, SoftwareRecord, TaskTemplate};
use uuid::Uuid;

mod postgres;
pub use postgres::PgStore;


pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
}

/// A ticket staged for the atomic batch commit.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub org_id: Uuid,
    pub asset_id: Option<Uuid>,
    pub asset_name: Option<String>,
    pub requester_name: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub ticket_type: String,
    pub checklist: Vec<TaskTemplate>,
    pub dedup_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An asset registered by a first-time agent audit.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub org_id: Uuid,
    pub name: String,
    pub asset_type: String,
    pub status: String,
    pub model: Option<String>,
    pub os: Option<String>,
    pub serial_number: Option<String>,
    pub softwares: Vec<SoftwareRecord>,
    pub last_audit: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Inventory fields refreshed on an existing asset by an agent audit.
#[derive(Debug, Clone)]
pub struct AssetAudit {
    pub softwares: Vec<SoftwareRecord>,
    pub model: Option<String>,
    pub os: Option<String>,
    pub serial_number: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// All maintenance plans with `status = "active"`.
    async fn active_maintenance_plans(&self) -> StoreResult<Vec<MaintenancePlan>>;

    /// Active assets of the given type within one organization.
    async fn eligible_assets(&self, org_id: Uuid, asset_type: &str) -> StoreResult<Vec<Asset>>;

    /// Commit a batch of tickets atomically. Staged tickets whose dedup key
    /// already exists are skipped; the return value counts rows actually
    /// inserted.
    async fn commit_tickets(&self, tickets: &[NewTicket]) -> StoreResult<u32>;

    /// Atomically add 1 to the organization's closed-tickets counter.
    async fn increment_tickets_closed(&self, org_id: Uuid) -> StoreResult<()>;

    /// The organization's agent credential, if one is provisioned. `None`
    /// covers both an unknown org and an org without agent access.
    async fn agent_api_key(&self, org_id: Uuid) -> StoreResult<Option<String>>;

    /// Asset lookup by `(org_id, name = hostname)`, first match.
    async fn asset_by_hostname(&self, org_id: Uuid, hostname: &str) -> StoreResult<Option<Asset>>;

    /// Overwrite an asset's inventory fields from an audit.
    async fn record_audit(&self, asset_id: Uuid, audit: &AssetAudit) -> StoreResult<()>;

    /// Create an asset from a first-time audit; returns the new id.
    async fn register_asset(&self, asset: NewAsset) -> StoreResult<Uuid>;
}
