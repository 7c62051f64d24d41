//! Records stored in the order and payment tables.

use chrono::{DateTime, Utc};
use record_store::Record;
use serde::{Deserialize, Serialize};

use crate::OrderId;
use crate::error::TransitionError;
use crate::requests::NewOrder;
use crate::status::{OrderStatus, PaymentStatus};

/// An order as stored in the orders table.
///
/// Created by order intake with status `incomplete`; afterwards only the
/// status reconciler writes it, and only to move the status forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub user_id: String,
    pub item: String,
    pub quantity: u32,
    pub total_price: u64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Creates a fresh `incomplete` order from a validated request.
    pub fn new(order_id: OrderId, order: NewOrder) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            user_id: order.user_id,
            item: order.item,
            quantity: order.quantity,
            total_price: order.total_price,
            status: OrderStatus::Incomplete,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the order forward to `target`, passing through any intermediate
    /// statuses. All other fields are preserved.
    pub fn advance_to(&mut self, target: OrderStatus) -> Result<(), TransitionError> {
        self.status = self.status.advance_to(target)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Returns true if the order is waiting for its payment.
    pub fn is_awaiting_payment(&self) -> bool {
        self.status.is_awaiting_payment()
    }
}

impl Record for OrderRecord {
    fn key(&self) -> &OrderId {
        &self.order_id
    }
}

/// A payment as stored in the payments table, keyed by the order it settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: OrderId,
    pub status: PaymentStatus,
    /// Amount settled, in the smallest currency unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Creates a completed payment for an order.
    pub fn completed(order_id: OrderId, amount: u64) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            status: PaymentStatus::Completed,
            amount: Some(amount),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true once the payment has reached an outcome.
    pub fn is_settled(&self) -> bool {
        self.status.is_settled()
    }
}

impl Record for PaymentRecord {
    fn key(&self) -> &OrderId {
        &self.order_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_order() -> NewOrder {
        NewOrder {
            user_id: "u1".to_string(),
            item: "widget".to_string(),
            quantity: 2,
            total_price: 500,
        }
    }

    #[test]
    fn test_new_order_is_incomplete() {
        let order = OrderRecord::new(OrderId::new("o-1"), new_order());
        assert_eq!(order.status, OrderStatus::Incomplete);
        assert!(order.is_awaiting_payment());
        assert_eq!(order.key().as_str(), "o-1");
        assert_eq!(order.created_at, order.updated_at);
    }

    #[test]
    fn test_advance_preserves_other_fields() {
        let mut order = OrderRecord::new(OrderId::new("o-1"), new_order());
        let before = order.clone();

        order.advance_to(OrderStatus::ReadyForShipping).unwrap();

        assert_eq!(order.status, OrderStatus::ReadyForShipping);
        assert_eq!(order.order_id, before.order_id);
        assert_eq!(order.user_id, before.user_id);
        assert_eq!(order.item, before.item);
        assert_eq!(order.quantity, before.quantity);
        assert_eq!(order.total_price, before.total_price);
        assert_eq!(order.created_at, before.created_at);
        assert!(order.updated_at >= before.updated_at);
    }

    #[test]
    fn test_advance_backward_is_rejected_and_leaves_record_untouched() {
        let mut order = OrderRecord::new(OrderId::new("o-1"), new_order());
        order.advance_to(OrderStatus::Completed).unwrap();
        let before = order.clone();

        assert!(order.advance_to(OrderStatus::Incomplete).is_err());
        assert_eq!(order, before);
    }

    #[test]
    fn test_completed_payment() {
        let payment = PaymentRecord::completed(OrderId::new("o-1"), 500);
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.amount, Some(500));
        assert!(payment.is_settled());
    }

    #[test]
    fn test_payment_without_amount_decodes() {
        let json = serde_json::json!({
            "order_id": "o-1",
            "status": "pending",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let payment: PaymentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(payment.amount, None);
        assert!(!payment.is_settled());
    }
}
