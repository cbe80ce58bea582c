use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TICKET_STATUSES: [&str; 4] = ["open", "in_progress", "resolved", "closed"];
pub const TICKET_PRIORITIES: [&str; 4] = ["low", "medium", "high", "critical"];
pub const TICKET_TYPES: [&str; 2] = ["preventive", "support"];
pub const PLAN_STATUSES: [&str; 2] = ["active", "inactive"];
pub const ASSET_STATUSES: [&str; 3] = ["active", "inactive", "retired"];

/// A ticket in `resolved` or `closed` counts against the org KPI.
pub fn is_terminal_status(status: &str) -> bool {
    matches!(status, "resolved" | "closed")
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    /// Shared secret for the desktop agent; issued once at provisioning.
    #[serde(skip_serializing)]
    pub agent_api_key: Option<String>,
    pub tickets_closed_total: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenancePlan {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub status: String, // active, inactive
    /// Asset type this plan fans out over; a plan without one matches nothing.
    pub target_asset_type: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    #[serde(default)]
    pub tasks: Vec<TaskTemplate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub asset_type: String, // desktop, notebook, server, printer, ...
    pub status: String,     // active, inactive, retired
    pub model: Option<String>,
    pub os: Option<String>,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    #[serde(default)]
    pub softwares: Vec<SoftwareRecord>,
    pub last_audit: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub org_id: Uuid,
    pub asset_id: Option<Uuid>,
    pub asset_name: Option<String>,
    pub requester_name: String,
    pub description: String,
    pub status: String,   // open, in_progress, resolved, closed
    pub priority: String, // low, medium, high, critical
    #[serde(rename = "type")]
    pub ticket_type: String, // preventive, support
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    #[serde(default)]
    pub checklist: Vec<TaskTemplate>,
    /// Cycle idempotency key for generated tickets; NULL for user-submitted ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One step of a plan's task list, copied verbatim onto generated tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub title: String,
    pub note: Option<String>,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareRecord {
    pub name: String,
    pub version: String,
}

// Agent wire contract. The desktop agent posts `{data: {...}}` with camelCase
// field names and PascalCase software entries; keep the renames in sync with
// the agent installer.

#[derive(Debug, Clone, Deserialize)]
pub struct AuditEnvelope {
    pub data: Option<AuditReport>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub hostname: Option<String>,
    #[serde(default)]
    pub softwares: Vec<AuditSoftware>,
    pub model: Option<String>,
    pub os: Option<String>,
    pub serial_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditSoftware {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Version")]
    pub version: String,
}

impl From<&AuditSoftware> for SoftwareRecord {
    fn from(sw: &AuditSoftware) -> Self {
        SoftwareRecord {
            name: sw.name.clone(),
            version: sw.version.clone(),
        }
    }
}
