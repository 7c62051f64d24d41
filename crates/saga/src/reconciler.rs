//! Status reconciliation: moves paid orders to `ready_for_shipping`.

use domain::{Message, OrderRecord, OrderStatus, PaymentCompletedMessage};
use record_store::{RecordTable, RecordTableExt};

use crate::error::Result;

/// What reconciling one payment-completed message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The order was moved to `ready_for_shipping` from the given status.
    Advanced { from: OrderStatus },
    /// The order was already `ready_for_shipping`; nothing was written.
    AlreadyReconciled,
    /// The message did not report a completed payment; nothing was read.
    Skipped,
}

impl ReconcileOutcome {
    /// Returns the outcome name, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Advanced { .. } => "advanced",
            ReconcileOutcome::AlreadyReconciled => "already_reconciled",
            ReconcileOutcome::Skipped => "skipped",
        }
    }
}

/// Applies payment outcomes to order records.
///
/// The update is a read-modify-write of the whole record: concurrent writers
/// to the same order are not coordinated, and the last write wins. Every other
/// field of the order is carried over unchanged.
pub struct StatusReconciler<O> {
    orders: O,
}

impl<O> StatusReconciler<O>
where
    O: RecordTable<OrderRecord>,
{
    /// Creates the reconciler over the orders table.
    pub fn new(orders: O) -> Self {
        Self { orders }
    }

    /// Decodes a message body and reconciles it.
    pub async fn handle_message(&self, body: &str) -> Result<ReconcileOutcome> {
        let message = PaymentCompletedMessage::decode(body)?;
        self.reconcile(message).await
    }

    /// Moves the order named by a completed payment to `ready_for_shipping`.
    ///
    /// A missing order is an error so the message is retried: the order write
    /// may simply not be visible yet.
    #[tracing::instrument(skip(self, message), fields(order_id = %message.order_id))]
    pub async fn reconcile(&self, message: PaymentCompletedMessage) -> Result<ReconcileOutcome> {
        let outcome = self.apply(message).await;
        let label = match &outcome {
            Ok(outcome) => outcome.as_str(),
            Err(_) => "failed",
        };
        metrics::counter!("reconciler_messages_total", "outcome" => label).increment(1);
        outcome
    }

    async fn apply(&self, message: PaymentCompletedMessage) -> Result<ReconcileOutcome> {
        if !message.is_completed() {
            tracing::debug!(status = %message.status, "ignoring payment that did not complete");
            return Ok(ReconcileOutcome::Skipped);
        }

        let mut order = self.orders.get_required(&message.order_id).await?;
        if order.status == OrderStatus::ReadyForShipping {
            tracing::debug!("order already ready for shipping");
            return Ok(ReconcileOutcome::AlreadyReconciled);
        }

        let from = order.status;
        order.advance_to(OrderStatus::ReadyForShipping)?;
        self.orders.put(&order).await?;

        tracing::info!(%from, "order ready for shipping");
        Ok(ReconcileOutcome::Advanced { from })
    }
}
