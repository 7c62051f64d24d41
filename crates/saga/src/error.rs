//! Saga error types.

use common::OrderId;
use domain::{MessageError, TransitionError, ValidationError};
use message_queue::QueueError;
use record_store::StoreError;
use thiserror::Error;

/// Coarse classification of a [`SagaError`].
///
/// The kind decides what happens at a component boundary: synchronous callers
/// get a client or server fault, queue consumers acknowledge or redeliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-supplied data is malformed or out of range. Never retried.
    Validation,
    /// The operation does not apply to the current persisted state. Dropped.
    InvalidState,
    /// A store or queue call failed. Left to the caller or the transport.
    Infrastructure,
}

impl ErrorKind {
    /// Returns the kind name, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while a service handles a request or message.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Request or message content failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A queue message could not be decoded or encoded.
    #[error("{0}")]
    Message(#[from] MessageError),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order exists but is not waiting for a payment.
    #[error("Order {order_id} is not awaiting payment: {reason}")]
    NotAwaitingPayment { order_id: OrderId, reason: String },

    /// An order status change outside the transition table was attempted.
    #[error("{0}")]
    Transition(#[from] TransitionError),

    /// Record store error.
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// Queue error.
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl SagaError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SagaError::Validation(_) => ErrorKind::Validation,
            SagaError::Message(MessageError::Serialization(_)) => ErrorKind::Infrastructure,
            SagaError::Message(_) => ErrorKind::Validation,
            SagaError::OrderNotFound(_)
            | SagaError::NotAwaitingPayment { .. }
            | SagaError::Transition(_) => ErrorKind::InvalidState,
            SagaError::Store(_) | SagaError::Queue(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
