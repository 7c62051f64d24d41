//! Queue message schema.
//!
//! Every message carries a `schema_version`. Messages without one are read as
//! version 1; messages from a newer schema are rejected instead of being
//! half-understood.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::OrderId;
use crate::error::{MessageError, ValidationError};
use crate::requests::ProcessPayment;
use crate::status::PaymentStatus;

/// Current version of the message schema.
pub const SCHEMA_VERSION: u32 = 1;

fn current_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A message exchanged between services over a queue.
pub trait Message: Serialize + DeserializeOwned {
    /// Human-readable message kind, used in errors and logs.
    const KIND: &'static str;

    /// Returns the schema version the message was written with.
    fn schema_version(&self) -> u32;

    /// Decodes a message body, rejecting unknown schema versions.
    fn decode(body: &str) -> Result<Self, MessageError> {
        let message: Self = serde_json::from_str(body).map_err(|source| MessageError::Malformed {
            kind: Self::KIND,
            source,
        })?;

        let version = message.schema_version();
        if version > SCHEMA_VERSION {
            return Err(MessageError::UnsupportedVersion {
                kind: Self::KIND,
                version,
            });
        }
        Ok(message)
    }

    /// Encodes the message as a JSON body.
    fn encode(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Published by order intake onto the payment-request queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedMessage {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    pub order_id: OrderId,
    pub total_price: u64,
    /// Payment status of the order; absent means `pending`.
    ///
    /// Publishers that copy the order's own status send `incomplete`, which
    /// is read as `pending`.
    #[serde(
        default,
        deserialize_with = "deserialize_order_payment_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<PaymentStatus>,
}

/// Status values accepted on an order-created message.
#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum OrderCreatedStatus {
    Pending,
    Incomplete,
    Completed,
    Failed,
}

fn deserialize_order_payment_status<'de, D>(
    deserializer: D,
) -> Result<Option<PaymentStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let status = Option::<OrderCreatedStatus>::deserialize(deserializer)?;
    Ok(status.map(|status| match status {
        OrderCreatedStatus::Pending | OrderCreatedStatus::Incomplete => PaymentStatus::Pending,
        OrderCreatedStatus::Completed => PaymentStatus::Completed,
        OrderCreatedStatus::Failed => PaymentStatus::Failed,
    }))
}

impl OrderCreatedMessage {
    /// Creates the message for a freshly created order.
    pub fn new(order_id: OrderId, total_price: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            order_id,
            total_price,
            status: None,
        }
    }

    /// Returns the payment status, defaulting a missing one to `pending`.
    pub fn payment_status(&self) -> PaymentStatus {
        self.status.unwrap_or_default()
    }

    /// Turns the message into a payment instruction.
    ///
    /// Applies the same rules as a direct payment request.
    pub fn into_command(self) -> Result<ProcessPayment, ValidationError> {
        if self.order_id.is_empty() {
            return Err(ValidationError::OrderId);
        }
        if self.payment_status() != PaymentStatus::Pending {
            return Err(ValidationError::Status);
        }
        Ok(ProcessPayment::new(self.order_id))
    }
}

impl Message for OrderCreatedMessage {
    const KIND: &'static str = "order-created";

    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

/// Published by payment processing onto the order-status queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCompletedMessage {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    pub order_id: OrderId,
    pub status: PaymentStatus,
}

impl PaymentCompletedMessage {
    /// Creates the message announcing a completed payment.
    pub fn completed(order_id: OrderId) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            order_id,
            status: PaymentStatus::Completed,
        }
    }

    /// Returns true if the message should drive the order forward.
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}

impl Message for PaymentCompletedMessage {
    const KIND: &'static str = "payment-completed";

    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_created_wire_format() {
        let message = OrderCreatedMessage::new(OrderId::new("o-1"), 500);
        let body = message.encode().unwrap();
        assert_eq!(
            body,
            r#"{"schema_version":1,"order_id":"o-1","total_price":500}"#
        );
    }

    #[test]
    fn test_order_created_accepts_both_shapes() {
        let without_status = OrderCreatedMessage::decode(r#"{"order_id":"o-1","total_price":500}"#)
            .unwrap();
        assert_eq!(without_status.schema_version, SCHEMA_VERSION);
        assert_eq!(without_status.payment_status(), PaymentStatus::Pending);

        let with_status = OrderCreatedMessage::decode(
            r#"{"order_id":"o-1","total_price":500,"status":"pending"}"#,
        )
        .unwrap();
        assert_eq!(with_status.status, Some(PaymentStatus::Pending));
    }

    #[test]
    fn test_order_created_reads_incomplete_as_pending() {
        let message = OrderCreatedMessage::decode(
            r#"{"order_id":"o-1","total_price":500,"status":"incomplete"}"#,
        )
        .unwrap();
        assert_eq!(message.payment_status(), PaymentStatus::Pending);
        assert_eq!(message.into_command().unwrap().order_id.as_str(), "o-1");

        let settled = OrderCreatedMessage::decode(
            r#"{"order_id":"o-1","total_price":500,"status":"completed"}"#,
        )
        .unwrap();
        assert_eq!(settled.into_command().unwrap_err(), ValidationError::Status);

        let explicit_null =
            OrderCreatedMessage::decode(r#"{"order_id":"o-1","total_price":500,"status":null}"#)
                .unwrap();
        assert_eq!(explicit_null.status, None);

        let err = OrderCreatedMessage::decode(
            r#"{"order_id":"o-1","total_price":500,"status":"shipped"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MessageError::Malformed { .. }));
    }

    #[test]
    fn test_order_created_into_command() {
        let cmd = OrderCreatedMessage::new(OrderId::new("o-1"), 500)
            .into_command()
            .unwrap();
        assert_eq!(cmd.order_id.as_str(), "o-1");

        let mut settled = OrderCreatedMessage::new(OrderId::new("o-1"), 500);
        settled.status = Some(PaymentStatus::Completed);
        assert_eq!(settled.into_command().unwrap_err(), ValidationError::Status);

        let anonymous = OrderCreatedMessage::new(OrderId::new(""), 500);
        assert_eq!(anonymous.into_command().unwrap_err(), ValidationError::OrderId);
    }

    #[test]
    fn test_payment_completed_wire_format() {
        let message = PaymentCompletedMessage::completed(OrderId::new("o-1"));
        assert!(message.is_completed());
        assert_eq!(
            message.encode().unwrap(),
            r#"{"schema_version":1,"order_id":"o-1","status":"completed"}"#
        );

        let failed =
            PaymentCompletedMessage::decode(r#"{"order_id":"o-1","status":"failed"}"#).unwrap();
        assert!(!failed.is_completed());
    }

    #[test]
    fn test_malformed_message() {
        let err = PaymentCompletedMessage::decode("{{garbage").unwrap_err();
        assert!(matches!(
            err,
            MessageError::Malformed {
                kind: "payment-completed",
                ..
            }
        ));

        let err = PaymentCompletedMessage::decode(r#"{"order_id":"o-1","status":"lost"}"#)
            .unwrap_err();
        assert!(matches!(err, MessageError::Malformed { .. }));
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let err = OrderCreatedMessage::decode(
            r#"{"schema_version":2,"order_id":"o-1","total_price":500}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MessageError::UnsupportedVersion {
                kind: "order-created",
                version: 2
            }
        ));
    }
}
