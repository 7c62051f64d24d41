//! Durable message queues with at-least-once delivery.
//!
//! A received message stays invisible to other consumers until it is either
//! acknowledged (deleted) or released. If neither happens before the
//! visibility timeout expires, the message is delivered again. Consumers must
//! therefore tolerate duplicates, and must not assume any ordering between
//! messages.

pub mod error;
pub mod memory;
pub mod message;
pub mod postgres;
pub mod queue;

pub use error::{QueueError, Result};
pub use memory::InMemoryQueue;
pub use message::{MessageId, ReceivedMessage};
pub use postgres::PostgresQueue;
pub use queue::{DEFAULT_VISIBILITY_TIMEOUT, MessageQueue};
