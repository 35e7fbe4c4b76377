use async_stream::try_stream;
use futures::Stream;
use quay_core::{Codec, Context, Json, Result};
use redis::AsyncCommands;
use std::ops::Deref;
use std::time::Duration;

use crate::List;

/// Which end of the underlying list an operation touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum End {
    /// The left end, where [`List::append`] pushes
    #[default]
    Head,
    /// The right end, where the oldest items sit
    Tail,
}

/// How long a pop may wait for an item to show up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Return `None` at once when the queue is empty
    NonBlocking,
    /// Block for at most this long
    Timeout(Duration),
    /// Block until an item arrives
    Indefinite,
}

impl Wait {
    /// Read the legacy seconds convention: negative means non-blocking,
    /// zero means block forever, positive is the timeout.
    pub fn from_secs(secs: i64) -> Self {
        match secs {
            s if s < 0 => Wait::NonBlocking,
            0 => Wait::Indefinite,
            s => Wait::Timeout(Duration::from_secs(s as u64)),
        }
    }

    /// Seconds argument for a blocking pop, `None` when not blocking.
    ///
    /// A zero timeout is treated as non-blocking since Redis reads 0 as forever.
    fn blocking_secs(self) -> Option<f64> {
        match self {
            Wait::NonBlocking => None,
            Wait::Timeout(d) if d.is_zero() => None,
            Wait::Timeout(d) => Some(d.as_secs_f64()),
            Wait::Indefinite => Some(0.0),
        }
    }
}

/// FIFO queue over a Redis list.
///
/// [`Queue::push`] feeds the head and [`Queue::pop`] drains the tail, so
/// items come out in the order they went in. Everything [`List`] offers is
/// reachable through deref.
pub struct Queue<V, C = Json> {
    pub(crate) list: List<V, C>,
}

impl<V, C: Clone> Clone for Queue<V, C> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
        }
    }
}

impl<V, C> Deref for Queue<V, C> {
    type Target = List<V, C>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

impl<V> Queue<V> {
    pub fn with_context(context: Context, name: impl ToString) -> Self {
        Self {
            list: List::with_context(context, name),
        }
    }
}

impl<V, C: Codec<V>> Queue<V, C> {
    pub fn with_codec<C2: Codec<V>>(self, codec: C2) -> Queue<V, C2> {
        Queue {
            list: self.list.with_codec(codec),
        }
    }

    /// Push to the head
    pub async fn push(&self, item: &V) -> Result<()> {
        self.push_to(item, End::Head).await
    }

    pub async fn push_to(&self, item: &V, end: End) -> Result<()> {
        let handle = &self.list.handle;
        let bytes = handle.encode(item)?;
        let mut conn = handle.connection().await?;
        let _: () = match end {
            End::Head => conn.lpush(handle.name(), bytes).await?,
            End::Tail => conn.rpush(handle.name(), bytes).await?,
        };
        Ok(())
    }

    /// Pop the oldest item from the tail.
    ///
    /// `None` means no work is available right now, not an error.
    pub async fn pop(&self, wait: Wait) -> Result<Option<V>> {
        self.pop_from(wait, End::Tail).await
    }

    pub async fn pop_from(&self, wait: Wait, end: End) -> Result<Option<V>> {
        let handle = &self.list.handle;
        let mut conn = handle.connection().await?;
        let bytes: Option<Vec<u8>> = match (wait.blocking_secs(), end) {
            (None, End::Tail) => conn.rpop(handle.name(), None).await?,
            (None, End::Head) => conn.lpop(handle.name(), None).await?,
            (Some(secs), End::Tail) => {
                let popped: Option<(String, Vec<u8>)> = conn.brpop(handle.name(), secs).await?;
                popped.map(|(_, payload)| payload)
            }
            (Some(secs), End::Head) => {
                let popped: Option<(String, Vec<u8>)> = conn.blpop(handle.name(), secs).await?;
                popped.map(|(_, payload)| payload)
            }
        };
        Ok(handle.decode_optional(bytes))
    }

    /// Walk the queue tail to head without consuming it.
    ///
    /// One round trip per element; items popped meanwhile are skipped.
    pub fn reverse(&self) -> impl Stream<Item = Result<V>> + '_ {
        try_stream! {
            let handle = &self.list.handle;
            let mut conn = handle.connection().await?;
            let len: isize = conn.llen(handle.name()).await?;
            for index in (0..len).rev() {
                let bytes: Option<Vec<u8>> = conn.lindex(handle.name(), index).await?;
                if let Some(item) = handle.decode_optional(bytes) {
                    yield item;
                }
            }
        }
    }
}
