//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Bazaar                                 │
//! │                                                                         │
//! │  Handler                                                               │
//! │  Result<Json<T>, ApiError>                                             │
//! │       │                                                                 │
//! │       ├── CoreError   (pricing, coupon, validation) ──┐                │
//! │       ├── DbError     (sqlx, races, constraints) ─────┤                │
//! │       │                                               ▼                │
//! │       │                                     ApiError { code, message } │
//! │       │                                               │                │
//! │       ▼                                               ▼                │
//! │  200 + JSON body                      IntoResponse: status + JSON body │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Clients receive:
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for TEE-M: ..." }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use ts_rs::TS;

use bazaar_core::{CoreError, CouponError, ValidationError};
use bazaar_db::DbError;

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,

    /// Business rule violated (422)
    BusinessLogic,

    /// Internal server error (500)
    Internal,

    /// Not enough stock to allocate a line (409)
    InsufficientStock,

    /// Coupon cannot be applied to this order (422)
    CouponRejected,

    /// Payment amount or state is wrong (422)
    PaymentError,

    /// Lost a race against a concurrent update (409)
    Conflict,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::BusinessLogic | ErrorCode::CouponRejected | ErrorCode::PaymentError => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Result type for handlers and services.
pub type ApiResult<T> = Result<T, ApiError>;

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::InsufficientStock {
                sku,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for {}: {} available, {} requested",
                    sku, available, requested
                ),
            ),
            DbError::CouponExhausted { code } => ApiError::new(
                ErrorCode::CouponRejected,
                format!("coupon {} has reached its usage limit", code),
            ),
            DbError::Conflict { entity, id } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} {} was changed by another request, retry", entity, id),
            ),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint failed: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Value out of range")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyOrder => ApiError::validation(err.to_string()),
            CoreError::VariationNotFound(id) => ApiError::not_found("Variation", &id),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::OrderTooLarge { .. } | CoreError::QuantityTooLarge { .. } => {
                ApiError::validation(err.to_string())
            }
            CoreError::AmountTooLarge { .. } => ApiError::validation(err.to_string()),
            CoreError::InvalidPaymentAmount { .. } => {
                ApiError::new(ErrorCode::PaymentError, err.to_string())
            }
            CoreError::InvalidOrderStatus { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::Coupon(e) => ApiError::from(e),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<CouponError> for ApiError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::NotFound { code } => ApiError::not_found("Coupon", &code),
            other => ApiError::new(ErrorCode::CouponRejected, other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "Request failed");
        } else {
            tracing::debug!(code = ?self.code, message = %self.message, "Request rejected");
        }
        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InsufficientStock.status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::CouponRejected.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::DatabaseError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_core_errors_map_to_codes() {
        let err = ApiError::from(CoreError::InsufficientStock {
            sku: "TEE-M".to_string(),
            available: 1,
            requested: 3,
        });
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("TEE-M"));

        let err = ApiError::from(CoreError::Coupon(CouponError::Expired {
            code: "OLD".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::CouponRejected);

        let err = ApiError::from(CoreError::Coupon(CouponError::NotFound {
            code: "NOPE".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_oversized_amount_is_bad_request() {
        let err = ApiError::from(CoreError::AmountTooLarge {
            field: "payment amount".to_string(),
            max: 100,
        });
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_db_race_errors_map_to_codes() {
        let err = ApiError::from(DbError::CouponExhausted {
            code: "ONCE".to_string(),
        });
        assert_eq!(err.code, ErrorCode::CouponRejected);

        let err = ApiError::from(DbError::conflict("Order", "ORD-1"));
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::validation("bad")).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "bad");
    }
}
