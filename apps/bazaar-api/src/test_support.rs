//! In-memory store shared by service and handler tests.

use bazaar_core::{AmountKind, Coupon, DeliveryZone, Product, Variation};
use bazaar_db::{Database, DbConfig};
use chrono::Utc;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::state::AppState;

/// A small catalog: two shirts, two coupons and one delivery zone.
///
/// Settings carry 7.5% VAT and no tax.
pub struct Catalog {
    pub db: Database,
    /// Cost 600, sale 1_000, 10 on hand.
    pub tee: Variation,
    /// Cost 2_500, sale 4_000, 5 on hand.
    pub hoodie: Variation,
    /// Charge 600.
    pub zone: DeliveryZone,
}

impl Catalog {
    pub fn state(&self) -> AppState {
        let config = ApiConfig::from_lookup(|_| None).unwrap();
        AppState::new(self.db.clone(), config)
    }
}

pub async fn catalog() -> Catalog {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let mut settings = db.settings().get().await.unwrap();
    settings.vat_kind = AmountKind::Percentage;
    settings.vat_value = 750;
    db.settings().update(&settings).await.unwrap();

    let tee = stocked(&db, "Cotton Tee", "TEE-M", 600, 1_000, 10).await;
    let hoodie = stocked(&db, "Zip Hoodie", "HOOD-L", 2_500, 4_000, 5).await;

    db.coupons()
        .insert(&coupon("SAVE10", AmountKind::Percentage, 1_000, 0))
        .await
        .unwrap();
    db.coupons()
        .insert(&coupon("BIGSPEND", AmountKind::Fixed, 500, 50_000))
        .await
        .unwrap();

    let zone = DeliveryZone {
        id: Uuid::new_v4().to_string(),
        name: "Inside City".to_string(),
        charge_cents: 600,
        free_delivery_min_cents: None,
        is_active: true,
    };
    db.delivery_zones().insert(&zone).await.unwrap();

    Catalog {
        db,
        tee,
        hoodie,
        zone,
    }
}

async fn stocked(db: &Database, name: &str, sku: &str, cost: i64, sale: i64, qty: i64) -> Variation {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        category_id: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert_product(&product).await.unwrap();

    let variation = Variation {
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
    };
    db.products().insert_variation(&variation).await.unwrap();
    variation
}

fn coupon(code: &str, kind: AmountKind, amount: i64, min_purchase: i64) -> Coupon {
    let now = Utc::now();
    Coupon {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        kind,
        amount,
        starts_at: None,
        expires_at: None,
        min_purchase_cents: min_purchase,
        max_redeemable_cents: None,
        usage_count: 0,
        usage_limit: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
