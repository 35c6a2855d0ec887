//! Delivery zones offered at checkout.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::dto::DeliveryZoneDto;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/delivery-zones", get(list))
}

/// GET /api/delivery-zones - active zones, by name
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<DeliveryZoneDto>>> {
    let zones = state.db.delivery_zones().list_active().await?;
    Ok(Json(zones.into_iter().map(DeliveryZoneDto::from).collect()))
}
