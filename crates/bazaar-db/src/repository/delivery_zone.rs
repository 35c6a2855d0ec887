//! # Delivery Zone Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use bazaar_core::DeliveryZone;

/// Repository for delivery zone database operations.
#[derive(Debug, Clone)]
pub struct DeliveryZoneRepository {
    pool: SqlitePool,
}

impl DeliveryZoneRepository {
    /// Creates a new DeliveryZoneRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DeliveryZoneRepository { pool }
    }

    pub async fn insert(&self, zone: &DeliveryZone) -> DbResult<()> {
        debug!(id = %zone.id, name = %zone.name, charge_cents = zone.charge_cents, "Inserting delivery zone");

        sqlx::query(
            r#"
            INSERT INTO delivery_zones (id, name, charge_cents, free_delivery_min_cents, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&zone.id)
        .bind(&zone.name)
        .bind(zone.charge_cents)
        .bind(zone.free_delivery_min_cents)
        .bind(zone.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a zone by ID, active or not.
    pub async fn get(&self, id: &str) -> DbResult<Option<DeliveryZone>> {
        let zone = sqlx::query_as::<_, DeliveryZone>(
            r#"
            SELECT id, name, charge_cents, free_delivery_min_cents, is_active
            FROM delivery_zones
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(zone)
    }

    /// Lists the zones customers can pick, by name.
    pub async fn list_active(&self) -> DbResult<Vec<DeliveryZone>> {
        let zones = sqlx::query_as::<_, DeliveryZone>(
            r#"
            SELECT id, name, charge_cents, free_delivery_min_cents, is_active
            FROM delivery_zones
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(zones)
    }
}
