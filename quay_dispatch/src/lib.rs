//! `quay_dispatch` holds the weighted configuration a dispatcher uses to
//! decide which queues and workers get work.
//!
//! The record itself is plain data ([`DispatcherConfig`]); [`Dispatch`]
//! persists it next to the per-queue [`QueueConfig`] hash and applies the
//! bootstrap policy.

mod config;
mod dispatch;

pub use config::{DEFAULT_QUEUE_WEIGHT, DispatcherConfig, QueueConfig};
pub use dispatch::{DEFAULT_NAMESPACE, Dispatch};

pub mod prelude {
    pub use crate::{Dispatch, DispatcherConfig, QueueConfig};
}
