//! Integration tests for the order-fulfillment saga over in-memory backends.

use common::OrderId;
use domain::{
    CreateOrderRequest, Message, OrderCreatedMessage, OrderRecord, OrderStatus,
    PaymentCompletedMessage, PaymentRecord, PaymentStatus,
};
use message_queue::{InMemoryQueue, MessageQueue};
use record_store::{InMemoryTable, RecordTable, RecordTableExt};
use saga::{
    BatchHandler, ConsumerConfig, ErrorKind, OrderIntake, PaymentProcessor, QueueConsumer,
    ReconcileOutcome, SagaError, StatusReconciler,
};
use std::sync::Arc;
use std::time::Duration;

type Orders = InMemoryTable<OrderRecord>;
type Payments = InMemoryTable<PaymentRecord>;

struct TestHarness {
    intake: OrderIntake<Orders, InMemoryQueue>,
    payments: Arc<PaymentProcessor<Orders, Payments, InMemoryQueue>>,
    reconciler: Arc<StatusReconciler<Orders>>,
    orders_table: Orders,
    payments_table: Payments,
    payment_requests: InMemoryQueue,
    order_status: InMemoryQueue,
}

impl TestHarness {
    fn new() -> Self {
        let orders_table = InMemoryTable::new("orders");
        let payments_table = InMemoryTable::new("payments");
        let payment_requests = InMemoryQueue::new("payment-requests");
        let order_status = InMemoryQueue::new("order-status");

        let intake = OrderIntake::new(orders_table.clone(), payment_requests.clone());
        let payments = Arc::new(PaymentProcessor::new(
            orders_table.clone(),
            payments_table.clone(),
            order_status.clone(),
        ));
        let reconciler = Arc::new(StatusReconciler::new(orders_table.clone()));

        Self {
            intake,
            payments,
            reconciler,
            orders_table,
            payments_table,
            payment_requests,
            order_status,
        }
    }

    fn config() -> ConsumerConfig {
        ConsumerConfig {
            batch_size: 10,
            poll_interval: Duration::from_millis(10),
            max_receives: 3,
        }
    }

    fn payment_consumer(
        &self,
    ) -> QueueConsumer<InMemoryQueue, Arc<PaymentProcessor<Orders, Payments, InMemoryQueue>>> {
        QueueConsumer::new(
            self.payment_requests.clone(),
            Arc::clone(&self.payments),
            Self::config(),
        )
    }

    fn reconcile_consumer(&self) -> QueueConsumer<InMemoryQueue, Arc<StatusReconciler<Orders>>> {
        QueueConsumer::new(
            self.order_status.clone(),
            Arc::clone(&self.reconciler),
            Self::config(),
        )
    }

    async fn place_order(&self) -> OrderId {
        self.intake
            .create_order(CreateOrderRequest {
                user_id: "u1".to_string(),
                item: "widget".to_string(),
                quantity: 2,
                total_price: 500,
            })
            .await
            .unwrap()
            .order_id
    }

    async fn status_of(&self, order_id: &OrderId) -> OrderStatus {
        self.orders_table
            .get_required(order_id)
            .await
            .unwrap()
            .status
    }
}

#[tokio::test]
async fn test_order_reaches_ready_for_shipping() {
    let h = TestHarness::new();
    let order_id = h.place_order().await;
    assert_eq!(h.status_of(&order_id).await, OrderStatus::Incomplete);

    let intake_message = OrderCreatedMessage::decode(&h.payment_requests.bodies().await[0]).unwrap();
    assert_eq!(intake_message.order_id, order_id);
    assert_eq!(intake_message.total_price, 500);

    assert_eq!(h.payment_consumer().poll_once().await.unwrap(), 1);
    assert!(h.payment_requests.is_empty().await);

    let payment = h.payments_table.get_required(&order_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, Some(500));
    assert_eq!(h.status_of(&order_id).await, OrderStatus::Incomplete);

    assert_eq!(h.reconcile_consumer().poll_once().await.unwrap(), 1);
    assert!(h.order_status.is_empty().await);

    let order = h.orders_table.get_required(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::ReadyForShipping);
    assert_eq!(order.user_id, "u1");
    assert_eq!(order.item, "widget");
    assert_eq!(order.quantity, 2);
    assert_eq!(order.total_price, 500);
}

#[tokio::test]
async fn test_order_created_with_order_status_is_paid() {
    let h = TestHarness::new();
    let order_id = h.place_order().await;
    for message in h.payment_requests.receive(10).await.unwrap() {
        h.payment_requests.ack(&message).await.unwrap();
    }

    let body = format!(r#"{{"order_id":"{order_id}","total_price":500,"status":"incomplete"}}"#);
    h.payment_requests.send(body).await.unwrap();

    assert_eq!(h.payment_consumer().poll_once().await.unwrap(), 1);
    assert!(h.payment_requests.is_empty().await);
    let payment = h.payments_table.get_required(&order_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(h.order_status.len().await, 1);
}

#[tokio::test]
async fn test_double_delivery_is_a_no_op() {
    let h = TestHarness::new();
    let order_id = h.place_order().await;
    let order_created = h.payment_requests.bodies().await.remove(0);

    h.payment_consumer().poll_once().await.unwrap();
    let payment = h.payments_table.get_required(&order_id).await.unwrap();

    // Same order-created message delivered again.
    h.payment_requests.send(order_created).await.unwrap();
    h.payment_consumer().poll_once().await.unwrap();

    assert!(h.payment_requests.is_empty().await);
    assert_eq!(h.payments_table.get_required(&order_id).await.unwrap(), payment);
    assert_eq!(h.order_status.len().await, 1);

    let payment_completed = h.order_status.bodies().await.remove(0);
    h.reconcile_consumer().poll_once().await.unwrap();
    let reconciled = h.orders_table.get_required(&order_id).await.unwrap();

    // Same payment-completed message delivered again.
    h.order_status.send(payment_completed).await.unwrap();
    h.reconcile_consumer().poll_once().await.unwrap();

    assert!(h.order_status.is_empty().await);
    assert_eq!(h.orders_table.get_required(&order_id).await.unwrap(), reconciled);
}

#[tokio::test]
async fn test_payment_after_reconciliation_is_rejected() {
    let h = TestHarness::new();
    let order_id = h.place_order().await;
    h.payment_consumer().poll_once().await.unwrap();
    h.reconcile_consumer().poll_once().await.unwrap();

    let body = format!(r#"{{"order_id":"{order_id}","status":"pending"}}"#);
    let err = h.payments.handle_request(body.as_bytes()).await.unwrap_err();

    assert!(matches!(err, SagaError::NotAwaitingPayment { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(h.order_status.is_empty().await);
    assert_eq!(h.status_of(&order_id).await, OrderStatus::ReadyForShipping);
}

#[tokio::test]
async fn test_reconciled_order_without_payment_record_is_guarded() {
    let h = TestHarness::new();
    let order_id = h.place_order().await;

    let mut order = h.orders_table.get_required(&order_id).await.unwrap();
    order.advance_to(OrderStatus::ReadyForShipping).unwrap();
    h.orders_table.put(&order).await.unwrap();

    h.payment_consumer().poll_once().await.unwrap();

    // Dropped as invalid state: acked, nothing written, nothing published.
    assert!(h.payment_requests.is_empty().await);
    assert!(h.payments_table.is_empty().await);
    assert!(h.order_status.is_empty().await);
}

#[tokio::test]
async fn test_reconciler_batch_isolates_failures() {
    let h = TestHarness::new();
    let first = h.place_order().await;
    let third = h.place_order().await;

    let body = |id: &OrderId| PaymentCompletedMessage::completed(id.clone()).encode().unwrap();
    h.order_status.send(body(&first)).await.unwrap();
    h.order_status.send("{not json".to_string()).await.unwrap();
    h.order_status.send(body(&third)).await.unwrap();

    let messages = h.order_status.receive(10).await.unwrap();
    assert_eq!(messages.len(), 3);

    let report = h.reconciler.handle_batch(&messages).await;
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, vec![messages[1].message_id.clone()]);

    assert_eq!(h.status_of(&first).await, OrderStatus::ReadyForShipping);
    assert_eq!(h.status_of(&third).await, OrderStatus::ReadyForShipping);
}

#[tokio::test]
async fn test_unparsable_message_is_dropped_after_max_receives() {
    let h = TestHarness::new();
    h.order_status.send("{not json".to_string()).await.unwrap();

    let consumer = h.reconcile_consumer();
    for _ in 0..2 {
        consumer.poll_once().await.unwrap();
        assert_eq!(h.order_status.len().await, 1);
    }
    consumer.poll_once().await.unwrap();
    assert!(h.order_status.is_empty().await);
}

#[tokio::test]
async fn test_missing_order_is_redelivered() {
    let h = TestHarness::new();
    let ghost = OrderId::new("ghost");
    h.order_status
        .send(PaymentCompletedMessage::completed(ghost.clone()).encode().unwrap())
        .await
        .unwrap();

    h.reconcile_consumer().poll_once().await.unwrap();
    assert_eq!(h.order_status.len().await, 1);

    let err = h
        .reconciler
        .reconcile(PaymentCompletedMessage::completed(ghost))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
}

#[tokio::test]
async fn test_store_outage_redelivers_order_created() {
    let h = TestHarness::new();
    let order_id = h.place_order().await;

    h.payments_table.set_fail_on_put(true);
    h.payment_consumer().poll_once().await.unwrap();
    assert_eq!(h.payment_requests.len().await, 1);
    assert!(h.order_status.is_empty().await);

    h.payments_table.set_fail_on_put(false);
    h.payment_consumer().poll_once().await.unwrap();
    assert!(h.payment_requests.is_empty().await);
    assert!(h.payments_table.exists(&order_id).await.unwrap());
}

#[tokio::test]
async fn test_failed_payment_message_leaves_order_alone() {
    let h = TestHarness::new();
    let order_id = h.place_order().await;

    let mut message = PaymentCompletedMessage::completed(order_id.clone());
    message.status = PaymentStatus::Failed;
    let outcome = h.reconciler.reconcile(message).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Skipped);
    assert_eq!(h.status_of(&order_id).await, OrderStatus::Incomplete);
}

#[tokio::test]
async fn test_consumers_run_until_shutdown() {
    let h = TestHarness::new();
    let order_id = h.place_order().await;

    let (tx, rx) = tokio::sync::watch::channel(false);
    let payment_task = tokio::spawn(h.payment_consumer().run(rx.clone()));
    let reconcile_task = tokio::spawn(h.reconcile_consumer().run(rx));

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.status_of(&order_id).await != OrderStatus::ReadyForShipping {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    tx.send(true).unwrap();
    payment_task.await.unwrap();
    reconcile_task.await.unwrap();
}
