//! Shared types for the order-fulfillment services.

mod types;

pub use types::OrderId;
