//! Order intake: validates creation requests and starts the saga.

use common::OrderId;
use domain::{CreateOrderRequest, Message, NewOrder, OrderCreatedMessage, OrderRecord};
use message_queue::MessageQueue;
use record_store::RecordTable;

use crate::error::{Result, SagaError};

/// Accepts order-creation requests.
///
/// A valid request becomes an `incomplete` order record plus an order-created
/// message on the payment-request queue. The record write and the publish are
/// two independent calls: if the publish fails after the write succeeded, the
/// order stays `incomplete` with no payment request in flight. That window is
/// logged and reported as an infrastructure fault, but not repaired here.
pub struct OrderIntake<T, Q> {
    orders: T,
    payment_requests: Q,
}

impl<T, Q> OrderIntake<T, Q>
where
    T: RecordTable<OrderRecord>,
    Q: MessageQueue,
{
    /// Creates the intake service over the orders table and the queue it
    /// publishes payment requests to.
    pub fn new(orders: T, payment_requests: Q) -> Self {
        Self {
            orders,
            payment_requests,
        }
    }

    /// Decodes and handles a raw request body.
    pub async fn create_order_from_body(&self, body: &[u8]) -> Result<OrderCreatedMessage> {
        let order = CreateOrderRequest::parse(body).inspect_err(reject)?;
        self.place(order).await
    }

    /// Validates and handles a creation request.
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderCreatedMessage> {
        let order = request.validate().inspect_err(reject)?;
        self.place(order).await
    }

    #[tracing::instrument(skip(self, order), fields(order_id = tracing::field::Empty))]
    async fn place(&self, order: NewOrder) -> Result<OrderCreatedMessage> {
        let order_id = OrderId::generate();
        tracing::Span::current().record("order_id", order_id.as_str());

        let record = OrderRecord::new(order_id.clone(), order);
        let message = OrderCreatedMessage::new(order_id, record.total_price);
        let body = message.encode()?;

        self.orders.put(&record).await.inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist order");
        })?;

        if let Err(e) = self.payment_requests.send(body).await {
            metrics::counter!("orders_unpublished_total").increment(1);
            tracing::error!(
                error = %e,
                queue = self.payment_requests.queue_name(),
                "order persisted but order-created message was not published"
            );
            return Err(SagaError::Queue(e));
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            total_price = record.total_price,
            quantity = record.quantity,
            "order created"
        );
        Ok(message)
    }
}

fn reject(err: &domain::ValidationError) {
    metrics::counter!("orders_rejected_total").increment(1);
    tracing::info!(reason = %err, "order request rejected");
}
