//! # bazaar-db: Database Layer for Bazaar
//!
//! SQLite persistence for the checkout pipeline, through `sqlx`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /api/checkout)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bazaar-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ ProductRepo    │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ CouponRepo     │   │ 001_init.sql │   │   │
//! │  │   │               │    │ SettingsRepo   │   │              │   │   │
//! │  │   │               │    │ DeliveryZoneRepo│  │              │   │   │
//! │  │   │               │    │ OrderRepo      │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/bazaar.db")).await?;
//! let settings = db.settings().get().await?;
//! let variation = db.products().get_variation("uuid").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::coupon::CouponRepository;
pub use repository::delivery_zone::DeliveryZoneRepository;
pub use repository::order::{OrderDraft, OrderPlacement, OrderRepository};
pub use repository::product::ProductRepository;
pub use repository::settings::SettingsRepository;
