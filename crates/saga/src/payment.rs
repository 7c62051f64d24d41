//! Payment processing: settles payments for orders awaiting them.

use domain::{
    Message, OrderCreatedMessage, OrderRecord, PaymentCompletedMessage, PaymentRecord,
    PaymentRequest, ProcessPayment,
};
use message_queue::MessageQueue;
use record_store::RecordTable;

use crate::error::{Result, SagaError};

/// Settles payments and announces them on the order-status queue.
///
/// An order is awaiting payment when its record is `incomplete` and no
/// settled payment record exists for it. The payment record is the
/// authority on "already paid": it is written before the order status ever
/// changes, so it is what catches a redelivered order-created message.
///
/// This service reads the orders table but never writes it.
pub struct PaymentProcessor<O, P, Q> {
    orders: O,
    payments: P,
    order_status: Q,
}

impl<O, P, Q> PaymentProcessor<O, P, Q>
where
    O: RecordTable<OrderRecord>,
    P: RecordTable<PaymentRecord>,
    Q: MessageQueue,
{
    /// Creates the processor over the orders and payments tables and the
    /// queue it publishes payment-completed messages to.
    pub fn new(orders: O, payments: P, order_status: Q) -> Self {
        Self {
            orders,
            payments,
            order_status,
        }
    }

    /// Handles a direct payment request body (`{order_id, status}`).
    pub async fn handle_request(&self, body: &[u8]) -> Result<PaymentCompletedMessage> {
        let cmd = PaymentRequest::parse(body).inspect_err(|e| {
            metrics::counter!("payments_rejected_total", "kind" => "validation").increment(1);
            tracing::info!(reason = %e, "payment request rejected");
        })?;
        self.process_payment(cmd).await
    }

    /// Handles an order-created message body taken from a queue.
    pub async fn handle_order_created(&self, body: &str) -> Result<PaymentCompletedMessage> {
        let message = OrderCreatedMessage::decode(body)?;
        let cmd = message.into_command()?;
        self.process_payment(cmd).await
    }

    /// Settles the payment for an order awaiting it.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn process_payment(&self, cmd: ProcessPayment) -> Result<PaymentCompletedMessage> {
        let order_id = cmd.order_id;

        let order = self
            .orders
            .get(&order_id)
            .await?
            .ok_or_else(|| SagaError::OrderNotFound(order_id.clone()))
            .inspect_err(reject_state)?;

        if !order.is_awaiting_payment() {
            let err = SagaError::NotAwaitingPayment {
                order_id,
                reason: format!("order status is {}", order.status),
            };
            reject_state(&err);
            return Err(err);
        }

        if let Some(existing) = self.payments.get(&order_id).await?
            && existing.is_settled()
        {
            let err = SagaError::NotAwaitingPayment {
                order_id,
                reason: format!("payment already {}", existing.status),
            };
            reject_state(&err);
            return Err(err);
        }

        let payment = PaymentRecord::completed(order_id.clone(), order.total_price);
        let message = PaymentCompletedMessage::completed(order_id);
        let body = message.encode()?;

        self.payments.put(&payment).await.inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist payment");
        })?;

        // The payment is already settled, so a redelivery of this request is
        // rejected by the settled-payment gate and acked. The message is never
        // republished; `payments_unpublished_total` marks orders that need a
        // manual payment-completed message.
        if let Err(e) = self.order_status.send(body).await {
            metrics::counter!("payments_unpublished_total").increment(1);
            tracing::error!(
                error = %e,
                queue = self.order_status.queue_name(),
                "payment persisted but payment-completed message was not published"
            );
            return Err(SagaError::Queue(e));
        }

        metrics::counter!("payments_completed_total").increment(1);
        tracing::info!(amount = order.total_price, "payment completed");
        Ok(message)
    }
}

fn reject_state(err: &SagaError) {
    metrics::counter!("payments_rejected_total", "kind" => "invalid_state").increment(1);
    tracing::warn!(reason = %err, "payment request dropped");
}
