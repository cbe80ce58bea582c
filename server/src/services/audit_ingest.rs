// Agent audit ingest
//
// Takes one inventory report from the desktop agent and folds it into the
// asset registry: update the matching asset by hostname, or register a new
// one. Authentication happens in the handler; this service assumes the org
// is already verified.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use upkeep_shared::{AuditReport, SoftwareRecord};
use uuid::Uuid;

use crate::store::{AssetAudit, NewAsset, Store, StoreError};

/// Chrome releases below this major version are flagged in the logs.
const CHROME_MIN_MAJOR: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug)]
pub struct IngestOutcome {
    pub asset_id: Uuid,
    /// True when the report registered a previously unknown asset.
    pub created: bool,
    pub flagged: Vec<String>,
}

pub struct AuditIngestService {
    store: Arc<dyn Store>,
}

impl AuditIngestService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn ingest(&self, org_id: Uuid, report: AuditReport) -> IngestResult<IngestOutcome> {
        let hostname = report
            .hostname
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| IngestError::Invalid("hostname is required".to_string()))?;

        let softwares: Vec<SoftwareRecord> = report.softwares.iter().map(SoftwareRecord::from).collect();
        let flagged = outdated_software(&softwares);
        for item in &flagged {
            warn!("Outdated software on {}: {}", hostname, item);
        }

        let recorded_at = Utc::now();
        let audit = AssetAudit {
            softwares,
            model: report.model.clone(),
            os: report.os.clone(),
            serial_number: report.serial_number.clone(),
            recorded_at,
        };

        match self.store.asset_by_hostname(org_id, hostname).await? {
            Some(asset) => {
                self.store.record_audit(asset.id, &audit).await?;
                debug!("Recorded audit for asset '{}' ({})", hostname, asset.id);
                Ok(IngestOutcome {
                    asset_id: asset.id,
                    created: false,
                    flagged,
                })
            }
            None => {
                let asset_id = self
                    .store
                    .register_asset(NewAsset {
                        org_id,
                        name: hostname.to_string(),
                        asset_type: "desktop".to_string(),
                        status: "active".to_string(),
                        model: audit.model,
                        os: audit.os,
                        serial_number: audit.serial_number,
                        softwares: audit.softwares,
                        last_audit: Some(recorded_at),
                        created_at: recorded_at,
                    })
                    .await?;
                info!(
                    "Registered asset '{}' for org {} from agent audit",
                    hostname, org_id
                );
                Ok(IngestOutcome {
                    asset_id,
                    created: true,
                    flagged,
                })
            }
        }
    }
}

/// Names of installed software entries considered outdated. Log-only; no
/// alerts or tickets are raised from these.
pub fn outdated_software(softwares: &[SoftwareRecord]) -> Vec<String> {
    softwares
        .iter()
        .filter(|sw| sw.name.contains("Chrome"))
        .filter(|sw| {
            sw.version
                .split('.')
                .next()
                .and_then(|major| major.parse::<u32>().ok())
                .is_some_and(|major| major < CHROME_MIN_MAJOR)
        })
        .map(|sw| format!("{} {}", sw.name, sw.version))
        .collect()
}
