//! `quay_core` provides shared utilities for the Quay collections.
//!
//! This crate maps logical system names to live Redis backends (direct or
//! sentinel-monitored), defines the value codecs, and holds the error types
//! used across the other Quay crates.

mod codec;
mod connection;
mod context;
mod error;
mod forum;
mod settings;
mod util;

pub use codec::{Binary, Codec, Encoding, Json, Raw};
pub use connection::Connection;
pub use context::Context;
pub use error::{QuayError, Result};
pub use forum::{DEFAULT_SYSTEM, Forum, Mode};
pub use settings::{BackendSettings, DEFAULT_SENTINEL_TIMEOUT, ServerEntry};
pub use util::{FALLBACK_REDIS_URL, escape_glob, get_redis_url};

pub mod prelude {
    pub use crate::{Binary, Codec, Context, Forum, Json, Mode, QuayError, Raw};
}
