//! Queue consumers driving the asynchronous saga steps.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use domain::{OrderRecord, PaymentRecord};
use futures_util::future::join_all;
use message_queue::{MessageId, MessageQueue, ReceivedMessage};
use record_store::RecordTable;
use tokio::sync::watch;

use crate::error::{ErrorKind, Result, SagaError};
use crate::payment::PaymentProcessor;
use crate::reconciler::StatusReconciler;

/// What to do with a message once its handler has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Remove the message from the queue.
    Ack,
    /// Leave the message for another delivery.
    Redeliver,
}

/// Result of handling one batch of messages.
///
/// Only failures are listed; every other message in the batch counts as
/// processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: Vec<MessageId>,
}

impl BatchReport {
    /// Builds a report from per-message dispositions, in batch order.
    pub fn from_dispositions(messages: &[ReceivedMessage], dispositions: &[Disposition]) -> Self {
        let mut report = BatchReport::default();
        for (message, disposition) in messages.iter().zip(dispositions) {
            match disposition {
                Disposition::Ack => report.processed += 1,
                Disposition::Redeliver => report.failed.push(message.message_id.clone()),
            }
        }
        report
    }
}

/// Handles batches of messages taken from one queue.
///
/// Messages in a batch are independent: one failure never affects the others.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    /// Handler name, used in logs and as a metrics label.
    fn name(&self) -> &'static str;

    /// Handles a single message.
    async fn handle(&self, message: &ReceivedMessage) -> Disposition;

    /// Handles a batch concurrently and reports the messages to redeliver.
    async fn handle_batch(&self, messages: &[ReceivedMessage]) -> BatchReport {
        let dispositions = join_all(messages.iter().map(|m| self.handle(m))).await;
        BatchReport::from_dispositions(messages, &dispositions)
    }
}

#[async_trait]
impl<T: BatchHandler + ?Sized> BatchHandler for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn handle(&self, message: &ReceivedMessage) -> Disposition {
        (**self).handle(message).await
    }

    async fn handle_batch(&self, messages: &[ReceivedMessage]) -> BatchReport {
        (**self).handle_batch(messages).await
    }
}

#[async_trait]
impl<O, P, Q> BatchHandler for PaymentProcessor<O, P, Q>
where
    O: RecordTable<OrderRecord>,
    P: RecordTable<PaymentRecord>,
    Q: MessageQueue,
{
    fn name(&self) -> &'static str {
        "payment_processor"
    }

    async fn handle(&self, message: &ReceivedMessage) -> Disposition {
        match self.handle_order_created(&message.body).await {
            Ok(_) => Disposition::Ack,
            Err(e) => payment_disposition(message, &e),
        }
    }
}

fn payment_disposition(message: &ReceivedMessage, err: &SagaError) -> Disposition {
    match (err, err.kind()) {
        // Unreadable bodies use up their receive budget before being dropped.
        (SagaError::Message(_), _) | (_, ErrorKind::Infrastructure) => {
            tracing::warn!(
                message_id = %message.message_id,
                error = %err,
                "order-created message failed, leaving for redelivery"
            );
            Disposition::Redeliver
        }
        (_, kind) => {
            tracing::warn!(
                message_id = %message.message_id,
                error = %err,
                %kind,
                "order-created message dropped"
            );
            Disposition::Ack
        }
    }
}

#[async_trait]
impl<O> BatchHandler for StatusReconciler<O>
where
    O: RecordTable<OrderRecord>,
{
    fn name(&self) -> &'static str {
        "status_reconciler"
    }

    async fn handle(&self, message: &ReceivedMessage) -> Disposition {
        match self.handle_message(&message.body).await {
            Ok(_) => Disposition::Ack,
            Err(e) => {
                tracing::warn!(
                    message_id = %message.message_id,
                    error = %e,
                    "payment-completed message failed, leaving for redelivery"
                );
                Disposition::Redeliver
            }
        }
    }
}

/// Polling settings for a [`QueueConsumer`].
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Maximum messages taken per receive.
    pub batch_size: usize,
    /// Pause between polls that found the queue empty.
    pub poll_interval: Duration,
    /// Deliveries after which a failing message is dropped.
    pub max_receives: u32,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            poll_interval: Duration::from_millis(500),
            max_receives: 5,
        }
    }
}

/// Feeds messages from a queue to a [`BatchHandler`].
///
/// Processed messages are acknowledged. Failed ones are released for
/// redelivery until they have been received `max_receives` times, after which
/// they are acknowledged and logged at `error` level.
pub struct QueueConsumer<Q, H> {
    queue: Q,
    handler: H,
    config: ConsumerConfig,
}

impl<Q, H> QueueConsumer<Q, H>
where
    Q: MessageQueue,
    H: BatchHandler,
{
    pub fn new(queue: Q, handler: H, config: ConsumerConfig) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    /// Receives and handles one batch. Returns the number of messages received.
    pub async fn poll_once(&self) -> Result<usize> {
        let messages = self.queue.receive(self.config.batch_size).await?;
        if messages.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        let report = self.handler.handle_batch(&messages).await;
        let failed: HashSet<&MessageId> = report.failed.iter().collect();

        for message in &messages {
            if !failed.contains(&message.message_id) {
                self.ack(message, "acked").await;
            } else if message.receive_count >= self.config.max_receives {
                tracing::error!(
                    handler = self.handler.name(),
                    queue = self.queue.queue_name(),
                    message_id = %message.message_id,
                    receive_count = message.receive_count,
                    body = %message.body,
                    "message exceeded max receives, dropping"
                );
                self.ack(message, "dropped").await;
            } else {
                self.release(message).await;
            }
        }

        metrics::histogram!("consumer_batch_duration_seconds", "handler" => self.handler.name())
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(
            handler = self.handler.name(),
            received = messages.len(),
            processed = report.processed,
            failed = report.failed.len(),
            "batch handled"
        );
        Ok(messages.len())
    }

    /// Polls until `shutdown` turns true or its sender is dropped.
    ///
    /// A full batch is followed immediately by another poll; an empty one
    /// waits `poll_interval`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            handler = self.handler.name(),
            queue = self.queue.queue_name(),
            batch_size = self.config.batch_size,
            "consumer started"
        );

        loop {
            let stopping = *shutdown.borrow();
            if stopping {
                break;
            }

            let received = match self.poll_once().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!(
                        handler = self.handler.name(),
                        error = %e,
                        "failed to poll queue"
                    );
                    0
                }
            };

            if received >= self.config.batch_size {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(handler = self.handler.name(), "consumer stopped");
    }

    async fn ack(&self, message: &ReceivedMessage, outcome: &'static str) {
        match self.queue.ack(message).await {
            Ok(()) => {
                metrics::counter!(
                    "queue_messages_acked_total",
                    "handler" => self.handler.name(),
                    "outcome" => outcome
                )
                .increment(1);
            }
            Err(e) => {
                // The message reappears after its visibility timeout.
                tracing::error!(
                    handler = self.handler.name(),
                    message_id = %message.message_id,
                    error = %e,
                    "failed to acknowledge message"
                );
            }
        }
    }

    async fn release(&self, message: &ReceivedMessage) {
        metrics::counter!(
            "queue_messages_redelivered_total",
            "handler" => self.handler.name()
        )
        .increment(1);
        if let Err(e) = self.queue.release(message).await {
            tracing::warn!(
                handler = self.handler.name(),
                message_id = %message.message_id,
                error = %e,
                "failed to release message, waiting for visibility timeout"
            );
        }
    }
}
