use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    DEFAULT_VISIBILITY_TIMEOUT, MessageId, MessageQueue, QueueError, ReceivedMessage, Result,
};

#[derive(Debug)]
struct StoredMessage {
    id: MessageId,
    body: String,
    receive_count: u32,
    in_flight: Option<InFlight>,
}

#[derive(Debug)]
struct InFlight {
    receipt: String,
    visible_at: Instant,
}

#[derive(Debug, Default)]
struct InMemoryQueueState {
    messages: Vec<StoredMessage>,
    next_id: u64,
    fail_on_send: bool,
    fail_on_receive: bool,
}

/// In-memory queue for testing and single-process deployments.
///
/// Clones share the same underlying queue, so a producer and a consumer can
/// hold separate handles. Visibility deadlines use tokio's clock, which lets
/// tests drive redelivery with a paused runtime.
#[derive(Debug, Clone)]
pub struct InMemoryQueue {
    name: Arc<str>,
    visibility_timeout: Duration,
    state: Arc<Mutex<InMemoryQueueState>>,
}

impl InMemoryQueue {
    /// Creates a new empty queue with the default visibility timeout.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            state: Arc::default(),
        }
    }

    /// Sets the visibility timeout applied to received messages.
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Returns the number of messages not yet acknowledged, in flight or not.
    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    /// Returns true if every message has been acknowledged.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.messages.is_empty()
    }

    /// Returns the bodies of all unacknowledged messages in send order.
    pub async fn bodies(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .messages
            .iter()
            .map(|m| m.body.clone())
            .collect()
    }

    /// Makes every subsequent `send` fail as if the queue were unreachable.
    pub async fn set_fail_on_send(&self, fail: bool) {
        self.state.lock().await.fail_on_send = fail;
    }

    /// Makes every subsequent `receive` fail as if the queue were unreachable.
    pub async fn set_fail_on_receive(&self, fail: bool) {
        self.state.lock().await.fail_on_receive = fail;
    }

    fn unknown_receipt(&self, message: &ReceivedMessage) -> QueueError {
        QueueError::UnknownReceipt {
            queue: self.name.to_string(),
            message_id: message.message_id.clone(),
        }
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    fn queue_name(&self) -> &str {
        &self.name
    }

    async fn send(&self, body: String) -> Result<MessageId> {
        let mut state = self.state.lock().await;

        if state.fail_on_send {
            return Err(QueueError::Unavailable(format!(
                "send to {} failed",
                self.name
            )));
        }

        state.next_id += 1;
        let id = MessageId::new(format!("msg-{:06}", state.next_id));
        state.messages.push(StoredMessage {
            id: id.clone(),
            body,
            receive_count: 0,
            in_flight: None,
        });

        metrics::counter!("queue_messages_sent_total", "queue" => self.name.to_string())
            .increment(1);
        Ok(id)
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<ReceivedMessage>> {
        let mut state = self.state.lock().await;

        if state.fail_on_receive {
            return Err(QueueError::Unavailable(format!(
                "receive from {} failed",
                self.name
            )));
        }

        let now = Instant::now();
        let visible_at = now + self.visibility_timeout;
        let mut received = Vec::new();

        for message in state.messages.iter_mut() {
            if received.len() >= max_messages {
                break;
            }
            let visible = message
                .in_flight
                .as_ref()
                .is_none_or(|flight| flight.visible_at <= now);
            if !visible {
                continue;
            }

            let receipt = Uuid::new_v4().to_string();
            message.receive_count += 1;
            message.in_flight = Some(InFlight {
                receipt: receipt.clone(),
                visible_at,
            });
            received.push(ReceivedMessage {
                message_id: message.id.clone(),
                receipt,
                body: message.body.clone(),
                receive_count: message.receive_count,
            });
        }

        Ok(received)
    }

    async fn ack(&self, message: &ReceivedMessage) -> Result<()> {
        let mut state = self.state.lock().await;
        let position = state.messages.iter().position(|m| {
            m.id == message.message_id
                && m.in_flight
                    .as_ref()
                    .is_some_and(|f| f.receipt == message.receipt)
        });

        match position {
            Some(index) => {
                state.messages.remove(index);
                Ok(())
            }
            None => Err(self.unknown_receipt(message)),
        }
    }

    async fn release(&self, message: &ReceivedMessage) -> Result<()> {
        let mut state = self.state.lock().await;
        let stored = state.messages.iter_mut().find(|m| {
            m.id == message.message_id
                && m.in_flight
                    .as_ref()
                    .is_some_and(|f| f.receipt == message.receipt)
        });

        match stored {
            Some(stored) => {
                stored.in_flight = None;
                Ok(())
            }
            None => Err(self.unknown_receipt(message)),
        }
    }
}
