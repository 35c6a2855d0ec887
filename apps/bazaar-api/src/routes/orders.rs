//! Order lookup, follow-up payments and cancellation.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::dto::{OrderDetail, PaymentReceipt, PaymentRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/{code}", get(get_by_code))
        .route("/{code}/payments", post(record_payment))
        .route("/{code}/cancel", post(cancel))
}

/// GET /api/orders/{code}
async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<OrderDetail>> {
    Ok(Json(state.checkout().order_detail(&code).await?))
}

/// POST /api/orders/{code}/payments - pay down the due amount
async fn record_payment(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> ApiResult<Json<PaymentReceipt>> {
    Ok(Json(state.checkout().record_payment(&code, req).await?))
}

/// POST /api/orders/{code}/cancel - cancel and restock
async fn cancel(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<OrderDetail>> {
    Ok(Json(state.checkout().cancel(&code).await?))
}
