//! # Bazaar API
//!
//! HTTP surface of the Bazaar storefront / point-of-sale backend.
//!
//! ## Module Organization
//! ```text
//! bazaar_api/
//! ├── config    - Environment configuration
//! ├── dto       - Request/response shapes (exported to TypeScript)
//! ├── error     - ApiError and status mapping
//! ├── routes    - axum handlers
//! ├── service   - Checkout orchestration (core pricing + db placement)
//! └── state     - Shared handler state
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod service;
pub mod state;

#[cfg(test)]
mod test_support;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::build_router;
pub use state::AppState;
