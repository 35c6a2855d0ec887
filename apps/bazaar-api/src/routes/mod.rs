//! # HTTP Routes
//!
//! ```text
//! GET  /health
//! POST /api/checkout                 storefront order
//! POST /api/pos/orders               counter quick order
//! POST /api/coupons/validate         coupon preview
//! GET  /api/orders/{code}
//! POST /api/orders/{code}/payments
//! POST /api/orders/{code}/cancel
//! GET  /api/settings
//! PUT  /api/settings
//! GET  /api/delivery-zones
//! ```

mod checkout;
mod coupons;
mod delivery_zones;
mod health;
mod orders;
mod pos;
mod settings;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(checkout::router())
        .merge(pos::router())
        .merge(coupons::router())
        .merge(orders::router())
        .merge(settings::router())
        .merge(delivery_zones::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handler Tests
// =============================================================================
