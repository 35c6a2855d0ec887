//! Storefront checkout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::dto::{CheckoutRequest, OrderDetail};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/checkout", post(checkout))
}

/// POST /api/checkout - price and place a storefront order
async fn checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<OrderDetail>)> {
    let detail = state.checkout().checkout(req).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}
