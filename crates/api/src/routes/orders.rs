//! Order intake endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use common::OrderId;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
    pub total_price: u64,
}

/// POST /orders: validates and stores a new order, then starts its saga.
///
/// The raw body is decoded by the intake service so that malformed JSON is
/// reported the same way as a failed field check.
pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OrderCreatedResponse>, ApiError> {
    let message = state.intake.create_order_from_body(&body).await?;
    Ok(Json(OrderCreatedResponse {
        order_id: message.order_id,
        total_price: message.total_price,
    }))
}
