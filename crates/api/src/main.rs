//! API server entry point.

use api::config::{Config, LogFormat};
use api::{AppState, Backends};
use saga::QueueConsumer;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Connect backends and wire the services
    let backends = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            Backends::postgres(pool, &config)
                .await
                .expect("failed to prepare database")
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory backends");
            Backends::in_memory(&config)
        }
    };
    let state = AppState::new(&backends);

    // 4. Start queue consumers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let payment_consumer = tokio::spawn(
        QueueConsumer::new(
            backends.payment_requests.clone(),
            state.payments.clone(),
            config.consumer.clone(),
        )
        .run(shutdown_rx.clone()),
    );
    let reconcile_consumer = tokio::spawn(
        QueueConsumer::new(
            backends.order_status.clone(),
            state.reconciler.clone(),
            config.consumer.clone(),
        )
        .run(shutdown_rx),
    );

    // 5. Build the application
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(
        %addr,
        orders_queue = %config.orders_queue,
        payments_queue = %config.payments_queue,
        "starting API server"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 7. Stop consumers after the in-flight batch
    let _ = shutdown_tx.send(true);
    for consumer in [payment_consumer, reconcile_consumer] {
        if let Err(e) = consumer.await {
            tracing::error!(error = %e, "consumer task failed");
        }
    }

    tracing::info!("server shut down gracefully");
}
