//! Choreographed order-fulfillment saga.
//!
//! Three services cooperate through two queues and never call each other:
//!
//! 1. [`OrderIntake`] stores a new `incomplete` order and publishes an
//!    order-created message.
//! 2. [`PaymentProcessor`] consumes order-created messages (or direct payment
//!    requests), records a completed payment and publishes a
//!    payment-completed message.
//! 3. [`StatusReconciler`] consumes payment-completed messages and moves the
//!    order to `ready_for_shipping`.
//!
//! Delivery is at-least-once. Every step checks persisted state before writing,
//! so a redelivered message is a no-op. [`QueueConsumer`] drives the two
//! asynchronous steps.

pub mod consumer;
pub mod error;
pub mod intake;
pub mod payment;
pub mod reconciler;

pub use consumer::{BatchHandler, BatchReport, ConsumerConfig, Disposition, QueueConsumer};
pub use error::{ErrorKind, Result, SagaError};
pub use intake::OrderIntake;
pub use payment::PaymentProcessor;
pub use reconciler::{ReconcileOutcome, StatusReconciler};
