use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    DEFAULT_VISIBILITY_TIMEOUT, MessageId, MessageQueue, QueueError, ReceivedMessage, Result,
};

/// PostgreSQL-backed queue.
///
/// All queues share the `queue_messages` table and are told apart by
/// `queue_name`. Receiving claims rows with `FOR UPDATE SKIP LOCKED`, so any
/// number of consumers can poll the same queue concurrently without handing
/// out the same message twice within one visibility window.
#[derive(Clone)]
pub struct PostgresQueue {
    pool: PgPool,
    name: String,
    visibility_timeout: Duration,
}

impl PostgresQueue {
    /// Creates a queue handle over an existing connection pool.
    pub fn new(pool: PgPool, name: impl Into<String>) -> Self {
        Self {
            pool,
            name: name.into(),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }

    /// Sets the visibility timeout applied to received messages.
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns the number of unacknowledged messages on this queue.
    pub async fn depth(&self) -> Result<i64> {
        let depth: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM queue_messages WHERE queue_name = $1")
                .bind(&self.name)
                .fetch_one(&self.pool)
                .await?;
        Ok(depth)
    }

    fn row_to_message(row: PgRow) -> Result<ReceivedMessage> {
        let id: i64 = row.try_get("id")?;
        let receipt: Uuid = row.try_get("receipt")?;
        let receive_count: i32 = row.try_get("receive_count")?;

        Ok(ReceivedMessage {
            message_id: MessageId::new(id.to_string()),
            receipt: receipt.to_string(),
            body: row.try_get("body")?,
            receive_count: u32::try_from(receive_count).unwrap_or(0),
        })
    }

    fn delivery_key(&self, message: &ReceivedMessage) -> Result<(i64, Uuid)> {
        let id = message.message_id.as_str().parse::<i64>().ok();
        let receipt = Uuid::parse_str(&message.receipt).ok();
        id.zip(receipt).ok_or_else(|| QueueError::UnknownReceipt {
            queue: self.name.clone(),
            message_id: message.message_id.clone(),
        })
    }
}

#[async_trait]
impl MessageQueue for PostgresQueue {
    fn queue_name(&self) -> &str {
        &self.name
    }

    async fn send(&self, body: String) -> Result<MessageId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO queue_messages (queue_name, body) VALUES ($1, $2) RETURNING id",
        )
        .bind(&self.name)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;

        metrics::counter!("queue_messages_sent_total", "queue" => self.name.clone()).increment(1);
        Ok(MessageId::new(id.to_string()))
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<ReceivedMessage>> {
        let limit = i64::try_from(max_messages).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            UPDATE queue_messages
            SET receive_count = receive_count + 1,
                receipt = gen_random_uuid(),
                visible_at = NOW() + make_interval(secs => $3)
            WHERE id IN (
                SELECT id FROM queue_messages
                WHERE queue_name = $1 AND visible_at <= NOW()
                ORDER BY id
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, body, receive_count, receipt
            "#,
        )
        .bind(&self.name)
        .bind(limit)
        .bind(self.visibility_timeout.as_secs_f64())
        .fetch_all(&self.pool)
        .await?;

        let mut messages = rows
            .into_iter()
            .map(Self::row_to_message)
            .collect::<Result<Vec<_>>>()?;
        messages.sort_by_key(|m| m.message_id.as_str().parse::<i64>().unwrap_or(i64::MAX));
        if !messages.is_empty() {
            tracing::debug!(queue = %self.name, count = messages.len(), "claimed messages");
        }
        Ok(messages)
    }

    async fn ack(&self, message: &ReceivedMessage) -> Result<()> {
        let (id, receipt) = self.delivery_key(message)?;
        let result = sqlx::query("DELETE FROM queue_messages WHERE id = $1 AND receipt = $2")
            .bind(id)
            .bind(receipt)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::UnknownReceipt {
                queue: self.name.clone(),
                message_id: message.message_id.clone(),
            });
        }
        tracing::debug!(queue = %self.name, message_id = %message.message_id, "message acknowledged");
        Ok(())
    }

    async fn release(&self, message: &ReceivedMessage) -> Result<()> {
        let (id, receipt) = self.delivery_key(message)?;
        let result = sqlx::query(
            "UPDATE queue_messages SET visible_at = NOW(), receipt = NULL WHERE id = $1 AND receipt = $2",
        )
        .bind(id)
        .bind(receipt)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::UnknownReceipt {
                queue: self.name.clone(),
                message_id: message.message_id.clone(),
            });
        }
        tracing::debug!(
            queue = %self.name,
            message_id = %message.message_id,
            receive_count = message.receive_count,
            "message released for redelivery"
        );
        Ok(())
    }
}
