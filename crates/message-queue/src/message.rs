use serde::{Deserialize, Serialize};

/// Identifier assigned to a message by the queue when it is sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a message ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the message ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message handed to a consumer by [`MessageQueue::receive`](crate::MessageQueue::receive).
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// The queue-assigned message ID. Stable across redeliveries.
    pub message_id: MessageId,

    /// Receipt for this particular delivery, used to ack or release it.
    pub receipt: String,

    /// The raw message body.
    pub body: String,

    /// How many times the message has been received, including this time.
    pub receive_count: u32,
}
