//! # Coupon Repository
//!
//! Coupon rows keyed by their upper-cased code. Usage counters are only
//! bumped by order placement; see `OrderRepository::place_order`.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{normalize_code, Coupon};

const COUPON_SELECT: &str = r#"
    SELECT
        id, code, kind, amount, starts_at, expires_at,
        min_purchase_cents, max_redeemable_cents,
        usage_count, usage_limit, is_active,
        created_at, updated_at
    FROM coupons
"#;

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Inserts a coupon. The code is stored normalised.
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        let code = normalize_code(&coupon.code);
        debug!(id = %coupon.id, code = %code, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, kind, amount, starts_at, expires_at,
                min_purchase_cents, max_redeemable_cents,
                usage_count, usage_limit, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&coupon.id)
        .bind(&code)
        .bind(coupon.kind)
        .bind(coupon.amount)
        .bind(coupon.starts_at)
        .bind(coupon.expires_at)
        .bind(coupon.min_purchase_cents)
        .bind(coupon.max_redeemable_cents)
        .bind(coupon.usage_count)
        .bind(coupon.usage_limit)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("coupon code", &code),
            other => other,
        })?;

        Ok(())
    }

    /// Looks a coupon up by code, case-insensitively.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let code = normalize_code(code);
        let sql = format!("{COUPON_SELECT} WHERE code = ?1");

        let coupon = sqlx::query_as::<_, Coupon>(&sql)
            .bind(&code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(coupon)
    }

    /// Gets a coupon by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let sql = format!("{COUPON_SELECT} WHERE id = ?1");

        let coupon = sqlx::query_as::<_, Coupon>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(coupon)
    }

    /// Lists all coupons, newest first.
    pub async fn list(&self) -> DbResult<Vec<Coupon>> {
        let sql = format!("{COUPON_SELECT} ORDER BY created_at DESC");

        let coupons = sqlx::query_as::<_, Coupon>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(coupons)
    }
}
