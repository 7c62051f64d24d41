//! Order status state machine and payment status vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// The fulfillment stage of an order.
///
/// State transitions:
/// ```text
/// Incomplete ──► Completed ──► ReadyForShipping
/// ```
///
/// Status only ever moves forward along this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order has been created and is awaiting payment.
    #[default]
    Incomplete,

    /// Payment has been accepted for the order.
    Completed,

    /// Order has been reconciled for shipment (terminal state).
    ReadyForShipping,
}

impl OrderStatus {
    /// Every permitted transition, as `(from, to)` pairs.
    pub const TRANSITIONS: [(OrderStatus, OrderStatus); 2] = [
        (OrderStatus::Incomplete, OrderStatus::Completed),
        (OrderStatus::Completed, OrderStatus::ReadyForShipping),
    ];

    /// Returns true if the transition table contains `self -> next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        Self::TRANSITIONS.contains(&(*self, next))
    }

    /// Performs a single transition, rejecting anything outside the table.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns the status directly after this one, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        Self::TRANSITIONS
            .iter()
            .find(|(from, _)| from == self)
            .map(|(_, to)| *to)
    }

    /// Walks forward through the transition table until `target` is reached.
    ///
    /// Fails if `target` is not strictly ahead of the current status.
    pub fn advance_to(self, target: OrderStatus) -> Result<OrderStatus, TransitionError> {
        let mut current = self;
        while current != target {
            let next = current.next().ok_or(TransitionError::InvalidTransition {
                from: self,
                to: target,
            })?;
            current = current.transition_to(next)?;
        }

        if current == self {
            return Err(TransitionError::InvalidTransition {
                from: self,
                to: target,
            });
        }
        Ok(current)
    }

    /// Returns true if the order is waiting for its payment.
    pub fn is_awaiting_payment(&self) -> bool {
        matches!(self, OrderStatus::Incomplete)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Incomplete => "incomplete",
            OrderStatus::Completed => "completed",
            OrderStatus::ReadyForShipping => "ready_for_shipping",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The settlement outcome of one payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Returns true once the payment has reached an outcome.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 3] = [
        OrderStatus::Incomplete,
        OrderStatus::Completed,
        OrderStatus::ReadyForShipping,
    ];

    #[test]
    fn test_default_status_is_incomplete() {
        assert_eq!(OrderStatus::default(), OrderStatus::Incomplete);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_only_table_transitions_are_allowed() {
        for from in ALL {
            for to in ALL {
                let expected = matches!(
                    (from, to),
                    (OrderStatus::Incomplete, OrderStatus::Completed)
                        | (OrderStatus::Completed, OrderStatus::ReadyForShipping)
                );
                assert_eq!(from.can_transition_to(to), expected, "{from} -> {to}");
                assert_eq!(from.transition_to(to).is_ok(), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_rejected_transition_names_both_states() {
        let err = OrderStatus::ReadyForShipping
            .transition_to(OrderStatus::Incomplete)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid order status transition: ready_for_shipping -> incomplete"
        );
    }

    #[test]
    fn test_advance_walks_through_intermediate_states() {
        assert_eq!(
            OrderStatus::Incomplete.advance_to(OrderStatus::ReadyForShipping),
            Ok(OrderStatus::ReadyForShipping)
        );
        assert_eq!(
            OrderStatus::Completed.advance_to(OrderStatus::ReadyForShipping),
            Ok(OrderStatus::ReadyForShipping)
        );
    }

    #[test]
    fn test_advance_never_moves_backward_or_stays() {
        assert!(
            OrderStatus::ReadyForShipping
                .advance_to(OrderStatus::Completed)
                .is_err()
        );
        assert!(
            OrderStatus::Completed
                .advance_to(OrderStatus::Incomplete)
                .is_err()
        );
        assert!(
            OrderStatus::ReadyForShipping
                .advance_to(OrderStatus::ReadyForShipping)
                .is_err()
        );
    }

    #[test]
    fn test_awaiting_payment() {
        assert!(OrderStatus::Incomplete.is_awaiting_payment());
        assert!(!OrderStatus::Completed.is_awaiting_payment());
        assert!(!OrderStatus::ReadyForShipping.is_awaiting_payment());
    }

    #[test]
    fn test_payment_settlement() {
        assert!(!PaymentStatus::Pending.is_settled());
        assert!(PaymentStatus::Completed.is_settled());
        assert!(PaymentStatus::Failed.is_settled());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::ReadyForShipping).unwrap(),
            r#""ready_for_shipping""#
        );
        for status in ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        let pending: PaymentStatus = serde_json::from_str(r#""pending""#).unwrap();
        assert_eq!(pending, PaymentStatus::Pending);
        assert!(serde_json::from_str::<PaymentStatus>(r#""Pending""#).is_err());
    }
}
