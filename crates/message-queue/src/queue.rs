use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{MessageId, ReceivedMessage, Result};

/// Visibility timeout used when none is configured.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Core trait for queue implementations.
///
/// Every call is a single bounded request against the transport; nothing is
/// retried here. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Returns the name of the queue.
    fn queue_name(&self) -> &str;

    /// Sends a message body, returning its queue-assigned ID.
    async fn send(&self, body: String) -> Result<MessageId>;

    /// Receives up to `max_messages` visible messages.
    ///
    /// Returns an empty vector when nothing is visible. Received messages are
    /// hidden from other consumers until acked, released, or until the
    /// visibility timeout expires.
    async fn receive(&self, max_messages: usize) -> Result<Vec<ReceivedMessage>>;

    /// Acknowledges a message, removing it from the queue.
    async fn ack(&self, message: &ReceivedMessage) -> Result<()>;

    /// Makes a received message visible again immediately, for redelivery.
    async fn release(&self, message: &ReceivedMessage) -> Result<()>;
}

#[async_trait]
impl<T: MessageQueue + ?Sized> MessageQueue for Arc<T> {
    fn queue_name(&self) -> &str {
        (**self).queue_name()
    }

    async fn send(&self, body: String) -> Result<MessageId> {
        (**self).send(body).await
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<ReceivedMessage>> {
        (**self).receive(max_messages).await
    }

    async fn ack(&self, message: &ReceivedMessage) -> Result<()> {
        (**self).ack(message).await
    }

    async fn release(&self, message: &ReceivedMessage) -> Result<()> {
        (**self).release(message).await
    }
}
