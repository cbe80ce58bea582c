// Preventive Maintenance Generator - Monthly fan-out from active plans to eligible assets

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{NewTicket, Store, StoreResult};

/// Requester recorded on every generated ticket.
pub const SYSTEM_REQUESTER: &str = "System (Preventive)";
/// Ticket type distinguishing generated tickets from user-submitted ones.
pub const PREVENTIVE_TICKET_TYPE: &str = "preventive";

pub struct PreventiveMaintenanceJob {
    store: Arc<dyn Store>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct GenerationResult {
    pub cycle: String,
    pub plans_processed: i32,
    pub assets_matched: i32,
    pub tickets_created: i32,
    pub tickets_skipped: i32,
}

impl PreventiveMaintenanceJob {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Run one generation pass stamped with the current calendar month.
    pub async fn run(&self) -> StoreResult<GenerationResult> {
        self.run_cycle(&cycle_stamp(Utc::now())).await
    }

    /// Run one generation pass for an explicit cycle stamp.
    ///
    /// Plans and assets are read sequentially, every matching pair is staged,
    /// and the whole batch is committed once. Pairs already issued for this
    /// cycle are skipped by the commit via their dedup key.
    pub async fn run_cycle(&self, cycle: &str) -> StoreResult<GenerationResult> {
        let mut result = GenerationResult {
            cycle: cycle.to_string(),
            ..Default::default()
        };

        let plans = self.store.active_maintenance_plans().await?;
        if plans.is_empty() {
            info!("No active maintenance plans found");
            return Ok(result);
        }
        result.plans_processed = plans.len() as i32;

        let now = Utc::now();
        let mut staged: Vec<NewTicket> = Vec::new();

        for plan in &plans {
            let Some(target_type) = plan.target_asset_type.as_deref() else {
                debug!("Plan {} has no target asset type, matches nothing", plan.id);
                continue;
            };

            let assets = self.store.eligible_assets(plan.org_id, target_type).await?;
            for asset in assets {
                staged.push(NewTicket {
                    org_id: plan.org_id,
                    asset_id: Some(asset.id),
                    asset_name: Some(asset.name.clone()),
                    requester_name: SYSTEM_REQUESTER.to_string(),
                    description: format!("Monthly preventive maintenance: {}", plan.name),
                    status: "open".to_string(),
                    priority: "medium".to_string(),
                    ticket_type: PREVENTIVE_TICKET_TYPE.to_string(),
                    // Structural copy; later plan edits must not reach issued tickets
                    checklist: plan.tasks.clone(),
                    dedup_key: Some(dedup_key(plan.id, asset.id, cycle)),
                    created_at: now,
                });
            }
        }

        result.assets_matched = staged.len() as i32;
        if !staged.is_empty() {
            let created = self.store.commit_tickets(&staged).await?;
            result.tickets_created = created as i32;
            result.tickets_skipped = result.assets_matched - result.tickets_created;
        }

        info!(
            "Preventive generation for cycle {}: {} plans, {} assets matched, {} tickets created, {} already issued",
            result.cycle,
            result.plans_processed,
            result.assets_matched,
            result.tickets_created,
            result.tickets_skipped
        );

        Ok(result)
    }
}

/// Calendar month stamp identifying one generation cycle.
pub fn cycle_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

fn dedup_key(plan_id: Uuid, asset_id: Uuid, cycle: &str) -> String {
    format!("{}:{}:{}", plan_id, asset_id, cycle)
}
