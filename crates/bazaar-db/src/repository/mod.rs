//! # Repository Module
//!
//! Database repository implementations for Bazaar.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CheckoutService (bazaar-api)                                          │
//! │       │                                                                 │
//! │       │  db.products().find_variations(&ids)                           │
//! │       │  db.coupons().get_by_code("EID10")                             │
//! │       │  db.orders().place_order(&placement)                           │
//! │       ▼                                                                 │
//! │  XxxRepository { pool: SqlitePool }                                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Products, variations and stock
//! - [`coupon::CouponRepository`] - Coupon lookup by code
//! - [`settings::SettingsRepository`] - Single-row store settings
//! - [`delivery_zone::DeliveryZoneRepository`] - Delivery charges
//! - [`order::OrderRepository`] - Atomic order placement, payments, cancellation

pub mod coupon;
pub mod delivery_zone;
pub mod order;
pub mod product;
pub mod settings;

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared rows for repository tests.

    use bazaar_core::{AmountKind, Coupon, DeliveryZone, Product, Variation};
    use chrono::Utc;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn product(name: &str) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            category_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn variation(product: &Product, sku: &str, cost: i64, sale: i64, qty: i64) -> Variation {
        let now = Utc::now();
        Variation {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            sku: sku.to_string(),
            name: "Default".to_string(),
            cost_price_cents: cost,
            sale_price_cents: sale,
            quantity: qty,
            discount_kind: None,
            discount_value: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn coupon(code: &str, kind: AmountKind, amount: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            kind,
            amount,
            starts_at: None,
            expires_at: None,
            min_purchase_cents: 0,
            max_redeemable_cents: None,
            usage_count: 0,
            usage_limit: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn zone(name: &str, charge: i64) -> DeliveryZone {
        DeliveryZone {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            charge_cents: charge,
            free_delivery_min_cents: None,
            is_active: true,
        }
    }

    /// Inserts a product with one variation and returns the variation.
    pub async fn stocked_variation(
        db: &Database,
        sku: &str,
        cost: i64,
        sale: i64,
        qty: i64,
    ) -> Variation {
        let product = product(&format!("Product {}", sku));
        db.products().insert_product(&product).await.unwrap();
        let v = variation(&product, sku, cost, sale, qty);
        db.products().insert_variation(&v).await.unwrap();
        v
    }
}
