//! # Error Types
//!
//! Domain-specific error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── CoreError        - Pricing / checkout rule violations             │
//! │  ├── CouponError      - Why a coupon cannot be redeemed                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  bazaar-api errors (in app)                                            │
//! │  └── ApiError         - What the storefront sees (JSON + status)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while pricing or settling an order.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order has no lines.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// Variation referenced by a line is unknown or inactive.
    #[error("Variation not found: {0}")]
    VariationNotFound(String),

    /// Not enough stock on hand to allocate the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Stock plan: on hand = 3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "TEE-RED-M", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Storefront shows: "Only 3 TEE-RED-M left"
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Order has exceeded the maximum number of distinct lines.
    #[error("Order cannot have more than {max} items")]
    OrderTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// An amount is above `MAX_AMOUNT_CENTS` or a total left the `i64` range.
    #[error("{field} exceeds the maximum amount of {max} cents")]
    AmountTooLarge { field: String, max: i64 },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Order is not in a state that allows the requested operation.
    #[error("Order {code} is {status}, cannot perform operation")]
    InvalidOrderStatus { code: String, status: String },

    /// Coupon could not be applied.
    #[error("Coupon rejected: {0}")]
    Coupon(#[from] CouponError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Coupon Error
// =============================================================================

/// Reasons a coupon cannot be redeemed against an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("coupon {code} does not exist")]
    NotFound { code: String },

    #[error("coupon {code} is inactive")]
    Inactive { code: String },

    #[error("coupon {code} is not valid yet")]
    NotStarted { code: String },

    #[error("coupon {code} has expired")]
    Expired { code: String },

    /// Subtotal below the coupon's minimum purchase, amounts in cents.
    #[error("coupon {code} requires a minimum purchase of {minimum} (subtotal {subtotal})")]
    MinimumPurchaseNotMet {
        code: String,
        minimum: i64,
        subtotal: i64,
    },

    #[error("coupon {code} has reached its usage limit of {limit}")]
    UsageLimitReached { code: String, limit: i64 },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when request input doesn't meet requirements and are raised
/// before any pricing runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "TEE-RED-M".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for TEE-RED-M: available 3, requested 5"
        );
    }

    #[test]
    fn test_coupon_error_messages() {
        let err = CouponError::UsageLimitReached {
            code: "EID10".to_string(),
            limit: 50,
        };
        assert_eq!(err.to_string(), "coupon EID10 has reached its usage limit of 50");

        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Coupon(CouponError::UsageLimitReached { .. })));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "phone".to_string(),
        };
        assert_eq!(validation_err.to_string(), "phone is required");
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
