//! Domain error types.

use thiserror::Error;

use crate::status::OrderStatus;

/// Caller-supplied data is malformed or out of range.
///
/// The display text of the field variants is part of the external contract:
/// it is what the intake and payment endpoints report after
/// `Invalid request body: `.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid user_id")]
    UserId,

    #[error("invalid item")]
    Item,

    #[error("invalid quantity")]
    Quantity,

    #[error("invalid total_price")]
    TotalPrice,

    #[error("invalid order_id")]
    OrderId,

    #[error("invalid status")]
    Status,

    /// The body could not be decoded at all.
    #[error("{0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::Malformed(err.to_string())
    }
}

/// An order status change outside the transition table was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Invalid order status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

/// A queue message could not be decoded.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The body is not a valid message of the expected kind.
    #[error("Malformed {kind} message: {source}")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The message was written with a newer schema than this build understands.
    #[error("Unsupported {kind} message schema version {version}")]
    UnsupportedVersion { kind: &'static str, version: u32 },

    /// The message could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
