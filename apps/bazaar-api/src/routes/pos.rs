//! Point-of-sale quick orders.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::dto::{OrderDetail, PosOrderRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/pos/orders", post(quick_order))
}

/// POST /api/pos/orders - ring up a counter sale
async fn quick_order(
    State(state): State<AppState>,
    Json(req): Json<PosOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderDetail>)> {
    let detail = state.checkout().quick_order(req).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}
