//! # Seed Data Generator
//!
//! Populates the database with a small apparel catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p bazaar-db --bin seed
//!
//! # Specify database path
//! cargo run -p bazaar-db --bin seed -- --db ./data/bazaar.db
//!
//! # Also set 5% tax and 7.5% VAT
//! cargo run -p bazaar-db --bin seed -- --tax 500 --vat 750
//! ```
//!
//! ## Generated Data
//! - Products with size variations: SKU `{CODE}-{SIZE}`, random stock 0-40
//! - Every third variation carries an item discount
//! - Coupons: `WELCOME10` (10%, capped), `FLAT5` ($5 over $30), `ONCE` (single use)
//! - Delivery zones: inside city, outside city (free over $100)

use bazaar_core::{AmountKind, Coupon, DeliveryZone, Product, Variation};
use bazaar_db::{Database, DbConfig};
use chrono::{Duration, Utc};
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// (code, name, cost cents, sale cents)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("TEE", "Cotton Tee", 450, 1_200),
    ("POLO", "Pique Polo", 900, 2_200),
    ("HOOD", "Fleece Hoodie", 1_800, 4_500),
    ("JEAN", "Slim Jeans", 2_000, 5_500),
    ("CHINO", "Stretch Chinos", 1_600, 3_900),
    ("SOCK", "Crew Socks", 150, 500),
    ("CAP", "Canvas Cap", 400, 1_500),
    ("SCRF", "Wool Scarf", 1_100, 2_800),
];

/// (label, price add-on cents)
const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 0), ("L", 100), ("XL", 250)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn,bazaar_db=info"))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bazaar_dev.db");
    let mut tax_bps: Option<i64> = None;
    let mut vat_bps: Option<i64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--tax" => {
                if i + 1 < args.len() {
                    tax_bps = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--vat" => {
                if i + 1 < args.len() {
                    vat_bps = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bazaar_dev.db)");
                println!("      --tax <BPS>    Percentage tax in basis points");
                println!("      --vat <BPS>    Percentage VAT in basis points");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bazaar Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if tax_bps.is_some() || vat_bps.is_some() {
        let mut settings = db.settings().get().await?;
        if let Some(bps) = tax_bps {
            settings.tax_kind = AmountKind::Percentage;
            settings.tax_value = bps;
        }
        if let Some(bps) = vat_bps {
            settings.vat_kind = AmountKind::Percentage;
            settings.vat_value = bps;
        }
        db.settings().update(&settings).await?;
        println!("✓ Settings updated (tax {:?}, vat {:?})", tax_bps, vat_bps);
    }

    let existing = db.products().count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalog seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let mut variations = 0;
    for (idx, (code, name, cost, sale)) in PRODUCTS.iter().enumerate() {
        let product = generate_product(name);
        db.products().insert_product(&product).await?;

        for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
            let seed = idx * SIZES.len() + size_idx;
            let variation = generate_variation(&product, code, size, *cost, *sale + addon, seed);

            if let Err(e) = db.products().insert_variation(&variation).await {
                eprintln!("Failed to insert {}: {}", variation.sku, e);
                continue;
            }
            variations += 1;
        }
    }

    println!(
        "✓ Generated {} products, {} variations",
        PRODUCTS.len(),
        variations
    );

    let coupons = generate_coupons();
    for coupon in &coupons {
        db.coupons().insert(coupon).await?;
    }
    println!("✓ Generated {} coupons", coupons.len());
    println!("{}", serde_json::to_string_pretty(&coupons)?);

    let zones = [
        DeliveryZone {
            id: Uuid::new_v4().to_string(),
            name: "Inside City".to_string(),
            charge_cents: 600,
            free_delivery_min_cents: None,
            is_active: true,
        },
        DeliveryZone {
            id: Uuid::new_v4().to_string(),
            name: "Outside City".to_string(),
            charge_cents: 1_200,
            free_delivery_min_cents: Some(10_000),
            is_active: true,
        },
    ];
    for zone in &zones {
        db.delivery_zones().insert(zone).await?;
        println!("✓ Delivery zone {} ({})", zone.name, zone.id);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn generate_product(name: &str) -> Product {
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

fn generate_variation(
    product: &Product,
    code: &str,
    size: &str,
    cost: i64,
    sale: i64,
    seed: usize,
) -> Variation {
    let now = Utc::now();

    // Every third variation is on sale
    let (discount_kind, discount_value) = match seed % 6 {
        0 => (Some(AmountKind::Percentage), Some(1_500)),
        3 => (Some(AmountKind::Fixed), Some(200)),
        _ => (None, None),
    };

    Variation {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        sku: format!("{}-{}", code, size),
        name: size.to_string(),
        cost_price_cents: cost,
        sale_price_cents: sale,
        quantity: ((seed * 13) % 41) as i64,
        discount_kind,
        discount_value,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn generate_coupons() -> Vec<Coupon> {
    let now = Utc::now();
    let coupon = |code: &str, kind: AmountKind, amount: i64| Coupon {
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
    };

    let mut welcome = coupon("WELCOME10", AmountKind::Percentage, 1_000);
    welcome.max_redeemable_cents = Some(1_000);
    welcome.expires_at = Some(now + Duration::days(30));

    let mut flat = coupon("FLAT5", AmountKind::Fixed, 500);
    flat.min_purchase_cents = 3_000;

    let mut once = coupon("ONCE", AmountKind::Fixed, 300);
    once.usage_limit = Some(1);

    vec![welcome, flat, once]
}
