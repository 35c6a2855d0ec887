//! # Product Repository
//!
//! Products, their variations and on-hand stock.
//!
//! ## Stock Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products (name, slug)                                                 │
//! │     └── variations (sku, cost, sale, quantity, discount rule)          │
//! │                                                                         │
//! │  Reads here are plain lookups. Stock only goes down inside            │
//! │  OrderRepository::place_order, in the same transaction as the order.  │
//! │  restock() and cancellation are the only ways it goes back up.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{Product, Variation};

/// Column list for variation reads, joined with the parent product.
///
/// A variation only counts as active while its product is active.
const VARIATION_SELECT: &str = r#"
    SELECT
        v.id,
        v.product_id,
        p.name AS product_name,
        v.sku,
        v.name,
        v.cost_price_cents,
        v.sale_price_cents,
        v.quantity,
        v.discount_kind,
        v.discount_value,
        CASE WHEN v.is_active = 1 AND p.is_active = 1 THEN 1 ELSE 0 END AS is_active,
        v.created_at,
        v.updated_at
    FROM variations v
    JOIN products p ON p.id = v.product_id
"#;

/// Repository for product and variation database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Inserts a new product.
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, slug = %product.slug, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, category_id, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.category_id)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.slug),
            other => other,
        })?;

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, slug, category_id, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Counts all products, active or not.
    pub async fn count_products(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Variations
    // =========================================================================

    /// Inserts a new variation. The parent product must exist.
    pub async fn insert_variation(&self, variation: &Variation) -> DbResult<()> {
        debug!(
            id = %variation.id,
            sku = %variation.sku,
            quantity = variation.quantity,
            "Inserting variation"
        );

        sqlx::query(
            r#"
            INSERT INTO variations (
                id, product_id, sku, name,
                cost_price_cents, sale_price_cents, quantity,
                discount_kind, discount_value, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&variation.id)
        .bind(&variation.product_id)
        .bind(&variation.sku)
        .bind(&variation.name)
        .bind(variation.cost_price_cents)
        .bind(variation.sale_price_cents)
        .bind(variation.quantity)
        .bind(variation.discount_kind)
        .bind(variation.discount_value)
        .bind(variation.is_active)
        .bind(variation.created_at)
        .bind(variation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &variation.sku),
            other => other,
        })?;

        Ok(())
    }

    /// Gets a variation by ID, with its product name.
    pub async fn get_variation(&self, id: &str) -> DbResult<Option<Variation>> {
        let sql = format!("{VARIATION_SELECT} WHERE v.id = ?1");

        let variation = sqlx::query_as::<_, Variation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(variation)
    }

    /// Gets a variation by SKU.
    pub async fn get_variation_by_sku(&self, sku: &str) -> DbResult<Option<Variation>> {
        let sql = format!("{VARIATION_SELECT} WHERE v.sku = ?1");

        let variation = sqlx::query_as::<_, Variation>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(variation)
    }

    /// Loads several variations at once.
    ///
    /// Unknown IDs are simply absent from the result; callers compare
    /// lengths to report the missing ones.
    pub async fn find_variations(&self, ids: &[String]) -> DbResult<Vec<Variation>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{VARIATION_SELECT} WHERE v.id IN ({placeholders})");

        let mut query = sqlx::query_as::<_, Variation>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let variations = query.fetch_all(&self.pool).await?;

        debug!(
            requested = ids.len(),
            found = variations.len(),
            "Loaded variations"
        );

        Ok(variations)
    }

    /// Lists the variations of a product, SKU order.
    pub async fn list_variations(&self, product_id: &str) -> DbResult<Vec<Variation>> {
        let sql = format!("{VARIATION_SELECT} WHERE v.product_id = ?1 ORDER BY v.sku");

        let variations = sqlx::query_as::<_, Variation>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(variations)
    }

    /// Adds `delta` units to a variation's stock.
    ///
    /// Negative deltas are allowed for corrections but can never take the
    /// quantity below zero.
    pub async fn restock(&self, variation_id: &str, delta: i64) -> DbResult<Variation> {
        debug!(variation_id = %variation_id, delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE variations
            SET quantity = quantity + ?1, updated_at = ?2
            WHERE id = ?3 AND quantity + ?1 >= 0
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(variation_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self
                .get_variation(variation_id)
                .await?
                .ok_or_else(|| DbError::not_found("Variation", variation_id))?;

            return Err(DbError::InsufficientStock {
                sku: current.sku,
                available: current.quantity,
                requested: -delta,
            });
        }

        self.get_variation(variation_id)
            .await?
            .ok_or_else(|| DbError::not_found("Variation", variation_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_variation_joins_product_name() {
        let db = fixtures::database().await;
        let v = fixtures::stocked_variation(&db, "TEE-RED-M", 600, 1_000, 5).await;

        let loaded = db.products().get_variation(&v.id).await.unwrap().unwrap();
        assert_eq!(loaded.product_name, "Product TEE-RED-M");
        assert_eq!(loaded.sale_price_cents, 1_000);
        assert!(loaded.is_active);

        let by_sku = db
            .products()
            .get_variation_by_sku("TEE-RED-M")
            .await
            .unwrap();
        assert_eq!(by_sku.map(|v| v.id), Some(v.id));
    }

    #[tokio::test]
    async fn test_inactive_product_deactivates_variation() {
        let db = fixtures::database().await;
        let mut product = fixtures::product("Retired Mug");
        product.is_active = false;
        db.products().insert_product(&product).await.unwrap();
        let v = fixtures::variation(&product, "MUG-1", 200, 500, 3);
        db.products().insert_variation(&v).await.unwrap();

        let loaded = db.products().get_variation(&v.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);
    }

    #[tokio::test]
    async fn test_find_variations_skips_unknown_ids() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 100, 200, 1).await;
        let b = fixtures::stocked_variation(&db, "B-1", 100, 200, 1).await;

        let found = db
            .products()
            .find_variations(&[a.id.clone(), "missing".to_string(), b.id.clone()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        assert!(db.products().find_variations(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = fixtures::database().await;
        let v = fixtures::stocked_variation(&db, "DUP-1", 100, 200, 1).await;

        let product = db.products().get_product(&v.product_id).await.unwrap().unwrap();
        let again = fixtures::variation(&product, "DUP-1", 100, 200, 1);
        let err = db.products().insert_variation(&again).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_restock_never_goes_negative() {
        let db = fixtures::database().await;
        let v = fixtures::stocked_variation(&db, "R-1", 100, 200, 2).await;

        let after = db.products().restock(&v.id, 5).await.unwrap();
        assert_eq!(after.quantity, 7);

        let err = db.products().restock(&v.id, -10).await.unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { available: 7, .. }));

        let err = db.products().restock("missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
