//! HTTP entry points and process wiring for the order-fulfillment saga.
//!
//! Exposes order intake and direct payment processing over HTTP, with
//! structured logging (tracing) and Prometheus metrics. The same services
//! also back the queue consumers started by the binary.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{OrderRecord, PaymentRecord};
use message_queue::{InMemoryQueue, MessageQueue, PostgresQueue};
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::{InMemoryTable, PostgresTable, RecordTable, TableName, run_migrations};
use saga::{OrderIntake, PaymentProcessor, StatusReconciler};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

pub type OrderTable = Arc<dyn RecordTable<OrderRecord>>;
pub type PaymentTable = Arc<dyn RecordTable<PaymentRecord>>;
pub type Queue = Arc<dyn MessageQueue>;

pub type Intake = OrderIntake<OrderTable, Queue>;
pub type Payments = PaymentProcessor<OrderTable, PaymentTable, Queue>;
pub type Reconciler = StatusReconciler<OrderTable>;

/// Store and queue clients, constructed once at start-up.
#[derive(Clone)]
pub struct Backends {
    pub orders: OrderTable,
    pub payments: PaymentTable,
    /// Queue order intake publishes order-created messages to.
    pub payment_requests: Queue,
    /// Queue payment processing publishes payment-completed messages to.
    pub order_status: Queue,
}

impl Backends {
    /// Creates process-local backends. Nothing survives a restart.
    pub fn in_memory(config: &Config) -> Self {
        Self {
            orders: Arc::new(InMemoryTable::<OrderRecord>::new(&config.orders_table)),
            payments: Arc::new(InMemoryTable::<PaymentRecord>::new(&config.payments_table)),
            payment_requests: Arc::new(
                InMemoryQueue::new(&config.orders_queue)
                    .with_visibility_timeout(config.visibility_timeout),
            ),
            order_status: Arc::new(
                InMemoryQueue::new(&config.payments_queue)
                    .with_visibility_timeout(config.visibility_timeout),
            ),
        }
    }

    /// Creates PostgreSQL-backed backends, running migrations and creating
    /// the configured tables if needed.
    pub async fn postgres(pool: PgPool, config: &Config) -> record_store::Result<Self> {
        run_migrations(&pool).await?;

        let orders = PostgresTable::<OrderRecord>::new(
            pool.clone(),
            TableName::new(&config.orders_table)?,
        );
        orders.ensure_table().await?;
        let payments = PostgresTable::<PaymentRecord>::new(
            pool.clone(),
            TableName::new(&config.payments_table)?,
        );
        payments.ensure_table().await?;

        Ok(Self {
            orders: Arc::new(orders),
            payments: Arc::new(payments),
            payment_requests: Arc::new(
                PostgresQueue::new(pool.clone(), &config.orders_queue)
                    .with_visibility_timeout(config.visibility_timeout),
            ),
            order_status: Arc::new(
                PostgresQueue::new(pool, &config.payments_queue)
                    .with_visibility_timeout(config.visibility_timeout),
            ),
        })
    }
}

/// Shared application state: the services, each wired to its backends.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<Intake>,
    pub payments: Arc<Payments>,
    pub reconciler: Arc<Reconciler>,
}

impl AppState {
    /// Wires the services to the given backends.
    pub fn new(backends: &Backends) -> Self {
        Self {
            intake: Arc::new(OrderIntake::new(
                Arc::clone(&backends.orders),
                Arc::clone(&backends.payment_requests),
            )),
            payments: Arc::new(PaymentProcessor::new(
                Arc::clone(&backends.orders),
                Arc::clone(&backends.payments),
                Arc::clone(&backends.order_status),
            )),
            reconciler: Arc::new(StatusReconciler::new(Arc::clone(&backends.orders))),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/payments", post(routes::payments::process))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
