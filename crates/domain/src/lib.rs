//! Domain layer for the order-fulfillment saga.
//!
//! This crate provides:
//! - The order status state machine and the payment status vocabulary
//! - Order and payment records as stored in the record tables
//! - Creation and payment request validation
//! - The versioned schema of the messages exchanged between services

pub mod error;
pub mod messages;
pub mod records;
pub mod requests;
pub mod status;

pub use common::OrderId;
pub use error::{MessageError, TransitionError, ValidationError};
pub use messages::{Message, OrderCreatedMessage, PaymentCompletedMessage, SCHEMA_VERSION};
pub use records::{OrderRecord, PaymentRecord};
pub use requests::{CreateOrderRequest, NewOrder, PaymentRequest, ProcessPayment};
pub use status::{OrderStatus, PaymentStatus};
