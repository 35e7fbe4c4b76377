//! Redis-backed collections shared between processes.
//!
//! Every collection is a thin handle: a [`quay_core::Context`] naming the
//! backend system, a key name, and a codec fixed at construction. Nothing is
//! cached locally, so two processes holding handles to the same name see
//! the same data.
//!
//! ```no_run
//! use quay_collections::{Queue, Wait};
//! use quay_core::Forum;
//!
//! # async fn run() -> quay_core::Result<()> {
//! let forum = Forum::with_url("redis://localhost:6379")?;
//! let queue: Queue<String> = Queue::with_context(forum.system("default"), "jobs");
//! queue.push(&"resize".to_string()).await?;
//! assert_eq!(queue.pop(Wait::NonBlocking).await?, Some("resize".to_string()));
//! # Ok(())
//! # }
//! ```

mod dict;
mod handle;
mod hash;
mod limit_queue;
mod list;
mod queue;
mod set;
mod slot;

pub use dict::Dict;
pub use hash::Hash;
pub use limit_queue::LimitQueue;
pub use list::{List, PAGE_SIZE};
pub use queue::{End, Queue, Wait};
pub use set::Set;
pub use slot::Slot;

pub mod prelude {
    pub use crate::{Dict, End, Hash, LimitQueue, List, Queue, Set, Slot, Wait};
}
