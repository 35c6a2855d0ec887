//! # bazaar-core: Pure Business Logic for Bazaar
//!
//! This crate holds the order pricing and checkout arithmetic shared by the
//! storefront checkout, the point-of-sale quick order and coupon validation.
//! Everything here is a pure function over plain data: the database and HTTP
//! layers load inputs, call into this crate, and persist what it returns.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 HTTP handlers (bazaar-api)                      │   │
//! │  │     checkout ──► pos order ──► coupon validate ──► payments     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────────────────┐  │   │
//! │  │   │  types  │  │  money  │  │ pricing │  │ coupon/delivery  │  │   │
//! │  │   │ Order   │  │ Money   │  │ quote   │  │ redeem / resolve │  │   │
//! │  │   │Variation│  │ Rate    │  │ settle  │  │   validation     │  │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bazaar-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, atomic order placement       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Variation, Coupon, Order, Settings, ...)
//! - [`money`] - Money and Rate with integer arithmetic (no floating point!)
//! - [`pricing`] - The checkout pipeline: line prices, quote, settlement
//! - [`coupon`] - Coupon eligibility and redemption caps
//! - [`delivery`] - Delivery charge resolution
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::money::{Money, Rate};
//!
//! let price = Money::from_cents(1099); // $10.99
//! let vat = price.percent_of(Rate::from_bps(825)); // 8.25%
//! assert_eq!(vat.cents(), 91);
//! ```

pub mod coupon;
pub mod delivery;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use coupon::{normalize_code, Redemption};
pub use error::{CoreError, CouponError, ValidationError};
pub use money::{Money, Rate};
pub use pricing::{OrderQuote, QuoteInput, QuoteLine, Settlement, StockDeduction};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single variation in one order.
///
/// Guards against typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest single amount accepted anywhere: prices, fixed charges, payments.
///
/// One billion in major units. With the line and quantity limits above,
/// every order total stays far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Basis points in 100%.
pub const FULL_RATE_BPS: u32 = 10_000;
