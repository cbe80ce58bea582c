// Postgres-backed store

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use upkeep_shared::{Asset, MaintenancePlan};
use uuid::Uuid;

use super::{AssetAudit, NewAsset, NewTicket, Store, StoreError, StoreResult};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn active_maintenance_plans(&self) -> StoreResult<Vec<MaintenancePlan>> {
        let plans = sqlx::query_as::<_, MaintenancePlan>(
            "SELECT * FROM maintenance_plans WHERE status = 'active' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }

    async fn eligible_assets(&self, org_id: Uuid, asset_type: &str) -> StoreResult<Vec<Asset>> {
        let assets = sqlx::query_as::<_, Asset>(
            r#"
            SELECT * FROM assets
            WHERE org_id = $1 AND asset_type = $2 AND status = 'active'
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .bind(asset_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    async fn commit_tickets(&self, tickets: &[NewTicket]) -> StoreResult<u32> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0u32;

        for ticket in tickets {
            let result = sqlx::query(
                r#"
                INSERT INTO tickets (
                    id, org_id, asset_id, asset_name, requester_name, description,
                    status, priority, ticket_type, checklist, dedup_key, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (dedup_key) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(ticket.org_id)
            .bind(ticket.asset_id)
            .bind(&ticket.asset_name)
            .bind(&ticket.requester_name)
            .bind(&ticket.description)
            .bind(&ticket.status)
            .bind(&ticket.priority)
            .bind(&ticket.ticket_type)
            .bind(Json(&ticket.checklist))
            .bind(&ticket.dedup_key)
            .bind(ticket.created_at)
            .execute(&mut *tx)
            .await?;

            created += result.rows_affected() as u32;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn increment_tickets_closed(&self, org_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE organizations SET tickets_closed_total = tickets_closed_total + 1 WHERE id = $1",
        )
        .bind(org_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Organization"));
        }
        Ok(())
    }

    async fn agent_api_key(&self, org_id: Uuid) -> StoreResult<Option<String>> {
        let key = sqlx::query_scalar::<_, Option<String>>(
            "SELECT agent_api_key FROM organizations WHERE id = $1",
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(key.flatten())
    }

    async fn asset_by_hostname(&self, org_id: Uuid, hostname: &str) -> StoreResult<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>(
            "SELECT * FROM assets WHERE org_id = $1 AND name = $2 LIMIT 1",
        )
        .bind(org_id)
        .bind(hostname)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }

    async fn record_audit(&self, asset_id: Uuid, audit: &AssetAudit) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE assets
            SET softwares = $2, model = $3, os = $4, serial_number = $5,
                last_audit = $6, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(asset_id)
        .bind(Json(&audit.softwares))
        .bind(&audit.model)
        .bind(&audit.os)
        .bind(&audit.serial_number)
        .bind(audit.recorded_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Asset"));
        }
        Ok(())
    }

    async fn register_asset(&self, asset: NewAsset) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO assets (
                id, org_id, name, asset_type, status, model, os, serial_number,
                softwares, last_audit, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id)
        .bind(asset.org_id)
        .bind(&asset.name)
        .bind(&asset.asset_type)
        .bind(&asset.status)
        .bind(&asset.model)
        .bind(&asset.os)
        .bind(&asset.serial_number)
        .bind(Json(&asset.softwares))
        .bind(asset.last_audit)
        .bind(asset.created_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}
