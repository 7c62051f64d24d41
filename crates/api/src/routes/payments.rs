//! Synchronous payment endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use common::OrderId;
use domain::PaymentStatus;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub order_id: OrderId,
    pub status: PaymentStatus,
}

/// POST /payments: settles the payment of an order awaiting it.
pub async fn process(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PaymentResponse>, ApiError> {
    let message = state.payments.handle_request(&body).await?;
    Ok(Json(PaymentResponse {
        order_id: message.order_id,
        status: message.status,
    }))
}
