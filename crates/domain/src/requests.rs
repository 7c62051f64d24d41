//! Inbound requests and their validation.

use serde::{Deserialize, Serialize};

use crate::OrderId;
use crate::error::ValidationError;
use crate::status::PaymentStatus;

/// Body of an order-creation request.
///
/// Missing fields decode to their zero value and are then rejected by
/// [`validate`](Self::validate), so a caller always learns which field is
/// wrong rather than getting a decoder error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub total_price: i64,
}

/// A creation request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: String,
    pub item: String,
    pub quantity: u32,
    pub total_price: u64,
}

impl CreateOrderRequest {
    /// Decodes and validates a raw request body.
    ///
    /// A JSON `null` body reads as an empty request and fails on the first field.
    pub fn parse(body: &[u8]) -> Result<NewOrder, ValidationError> {
        let request: Option<CreateOrderRequest> = serde_json::from_slice(body)?;
        request.unwrap_or_default().validate()
    }

    /// Validates the request, reporting the first offending field.
    ///
    /// Fields are checked in a fixed order: `user_id`, `item`, `quantity`,
    /// `total_price`.
    pub fn validate(self) -> Result<NewOrder, ValidationError> {
        if self.user_id.is_empty() {
            return Err(ValidationError::UserId);
        }
        if self.item.is_empty() {
            return Err(ValidationError::Item);
        }
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(ValidationError::Quantity)?;
        let total_price = u64::try_from(self.total_price)
            .ok()
            .filter(|p| *p > 0)
            .ok_or(ValidationError::TotalPrice)?;

        Ok(NewOrder {
            user_id: self.user_id,
            item: self.item,
            quantity,
            total_price,
        })
    }
}

/// Body of a direct payment request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
}

/// A validated instruction to settle the payment of one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessPayment {
    pub order_id: OrderId,
}

impl ProcessPayment {
    /// Creates a new payment instruction.
    pub fn new(order_id: impl Into<OrderId>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }
}

impl PaymentRequest {
    /// Decodes and validates a raw request body.
    pub fn parse(body: &[u8]) -> Result<ProcessPayment, ValidationError> {
        let request: Option<PaymentRequest> = serde_json::from_slice(body)?;
        request.unwrap_or_default().validate()
    }

    /// Validates the request. Only a `pending` payment can be processed.
    pub fn validate(self) -> Result<ProcessPayment, ValidationError> {
        if self.order_id.is_empty() {
            return Err(ValidationError::OrderId);
        }
        if self.status != PaymentStatus::Pending.as_str() {
            return Err(ValidationError::Status);
        }
        Ok(ProcessPayment::new(self.order_id))
    }
}
