//! Quay turns a shared Redis into typed collections that many producer and
//! consumer processes can use at once.
//!
//! This is an _umbrella crate_ re-exporting the components according to the
//! features enabled, like `collections` for the queues, hashes and sets of
//! the `quay_collections` crate.
//!
//! Backend resolution and codecs from `core` are always available,
//! regardless of the features enabled.
//!
//! Read documentation for each sub-crate for more information.

pub use quay_core as core;

#[cfg(feature = "collections")]
pub use quay_collections as collections;

#[cfg(feature = "dispatch")]
pub use quay_dispatch as dispatch;

pub mod prelude {
    pub use crate::core::prelude::*;

    #[cfg(feature = "collections")]
    pub use crate::collections::prelude::*;

    #[cfg(feature = "dispatch")]
    pub use crate::dispatch::prelude::*;
}
