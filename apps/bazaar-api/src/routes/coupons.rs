//! Coupon preview.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::dto::{CouponValidation, CouponValidationRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/coupons/validate", post(validate))
}

/// POST /api/coupons/validate - price a cart with a coupon, nothing is saved
async fn validate(
    State(state): State<AppState>,
    Json(req): Json<CouponValidationRequest>,
) -> ApiResult<Json<CouponValidation>> {
    Ok(Json(state.checkout().validate_coupon(req).await?))
}
