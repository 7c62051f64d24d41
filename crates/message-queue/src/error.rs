use thiserror::Error;

use crate::MessageId;

/// Errors that can occur when interacting with a message queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue could not be reached.
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    /// The message is no longer held under the given receipt. Either it was
    /// already acknowledged, or its visibility timeout expired and it was
    /// handed to another consumer.
    #[error("Unknown receipt for message {message_id} on queue {queue}")]
    UnknownReceipt { queue: String, message_id: MessageId },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
