//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use saga::ConsumerConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory backends if unset
/// - `ORDERS_TABLE_NAME` / `PAYMENTS_TABLE_NAME`: record tables
///   (default: `orders` / `payments`)
/// - `ORDERS_QUEUE_URL`: queue order intake publishes to
///   (default: `payment-requests`)
/// - `PAYMENTS_QUEUE_URL`: queue payment processing publishes to
///   (default: `order-status`)
/// - `CONSUMER_BATCH_SIZE` (default: `10`), `CONSUMER_POLL_INTERVAL_MS`
///   (default: `500`), `CONSUMER_MAX_RECEIVES` (default: `5`)
/// - `QUEUE_VISIBILITY_TIMEOUT_SECS` (default: `30`)
///
/// Unparsable numbers fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub orders_table: String,
    pub payments_table: String,
    pub orders_queue: String,
    pub payments_queue: String,
    pub consumer: ConsumerConfig,
    pub visibility_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            orders_table: lookup("ORDERS_TABLE_NAME").unwrap_or(defaults.orders_table),
            payments_table: lookup("PAYMENTS_TABLE_NAME").unwrap_or(defaults.payments_table),
            orders_queue: lookup("ORDERS_QUEUE_URL").unwrap_or(defaults.orders_queue),
            payments_queue: lookup("PAYMENTS_QUEUE_URL").unwrap_or(defaults.payments_queue),
            consumer: ConsumerConfig {
                batch_size: parse_var(&lookup, "CONSUMER_BATCH_SIZE")
                    .filter(|n: &usize| *n > 0)
                    .unwrap_or(defaults.consumer.batch_size),
                poll_interval: parse_var(&lookup, "CONSUMER_POLL_INTERVAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.consumer.poll_interval),
                max_receives: parse_var(&lookup, "CONSUMER_MAX_RECEIVES")
                    .filter(|n: &u32| *n > 0)
                    .unwrap_or(defaults.consumer.max_receives),
            },
            visibility_timeout: parse_var(&lookup, "QUEUE_VISIBILITY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.visibility_timeout),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            orders_table: "orders".to_string(),
            payments_table: "payments".to_string(),
            orders_queue: "payment-requests".to_string(),
            payments_queue: "order-status".to_string(),
            consumer: ConsumerConfig::default(),
            visibility_timeout: message_queue::DEFAULT_VISIBILITY_TIMEOUT,
        }
    }
}
