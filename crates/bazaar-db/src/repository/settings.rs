//! # Settings Repository
//!
//! The store settings live in a single row (`id = 1`) seeded by the initial
//! migration, so `get()` always has something to return.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use bazaar_core::Settings;

/// Repository for the store settings row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the current settings.
    pub async fn get(&self) -> DbResult<Settings> {
        let settings = sqlx::query_as::<_, Settings>(
            r#"
            SELECT store_name, currency, tax_kind, tax_value, vat_kind, vat_value, updated_at
            FROM settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Settings", "1"))?;

        Ok(settings)
    }

    /// Replaces the settings and returns the stored row.
    pub async fn update(&self, settings: &Settings) -> DbResult<Settings> {
        debug!(
            tax_kind = ?settings.tax_kind,
            tax_value = settings.tax_value,
            vat_kind = ?settings.vat_kind,
            vat_value = settings.vat_value,
            "Updating settings"
        );

        let result = sqlx::query(
            r#"
            UPDATE settings
            SET store_name = ?1, currency = ?2,
                tax_kind = ?3, tax_value = ?4,
                vat_kind = ?5, vat_value = ?6,
                updated_at = ?7
            WHERE id = 1
            "#,
        )
        .bind(&settings.store_name)
        .bind(&settings.currency)
        .bind(settings.tax_kind)
        .bind(settings.tax_value)
        .bind(settings.vat_kind)
        .bind(settings.vat_value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Settings", "1"));
        }

        info!(store_name = %settings.store_name, "Settings updated");
        self.get().await
    }
}
