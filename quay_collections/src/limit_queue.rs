use futures::Stream;
use quay_core::{Codec, Context, Encoding, Json, QuayError, Result};

use crate::{End, Queue, Wait};

/// A queue that keeps only its `length` most recent items, for rolling logs.
///
/// Each push inserts at the head and trims the tail in one transaction, so
/// no reader ever sees more than `length` items. Only [`LimitQueue::push`]
/// adds items; the rest of the queue surface is read, pop or clear.
pub struct LimitQueue<V, C = Json> {
    queue: Queue<V, C>,
    length: usize,
}

impl<V, C: Clone> Clone for LimitQueue<V, C> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            length: self.length,
        }
    }
}

impl<V> LimitQueue<V> {
    pub fn with_context(context: Context, name: impl ToString, length: usize) -> Result<Self> {
        if length == 0 {
            return Err(QuayError::Configuration(
                "limit queue length must be positive".to_string(),
            ));
        }
        Ok(Self {
            queue: Queue::with_context(context, name),
            length,
        })
    }
}

impl<V, C: Codec<V>> LimitQueue<V, C> {
    pub fn with_codec<C2: Codec<V>>(self, codec: C2) -> LimitQueue<V, C2> {
        LimitQueue {
            queue: self.queue.with_codec(codec),
            length: self.length,
        }
    }

    pub fn name(&self) -> &str {
        self.queue.name()
    }

    pub fn encoding(&self) -> Encoding {
        self.queue.encoding()
    }

    /// Maximum number of retained items
    pub fn capacity(&self) -> usize {
        self.length
    }

    /// Push to the head and drop everything past the capacity, atomically
    pub async fn push(&self, item: &V) -> Result<()> {
        let handle = &self.queue.list.handle;
        let bytes = handle.encode(item)?;
        let boundary = self.length as isize - 1;
        let mut conn = handle.connection().await?;

        #[rustfmt::skip]
        let _: () = redis::pipe()
            .atomic()
            .lpush(handle.name(), bytes).ignore()
            .ltrim(handle.name(), 0, boundary).ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    /// Pop the oldest retained item
    pub async fn pop(&self, wait: Wait) -> Result<Option<V>> {
        self.queue.pop(wait).await
    }

    pub async fn pop_from(&self, wait: Wait, end: End) -> Result<Option<V>> {
        self.queue.pop_from(wait, end).await
    }

    pub async fn get(&self, index: isize) -> Result<Option<V>> {
        self.queue.get(index).await
    }

    pub async fn len(&self) -> Result<usize> {
        self.queue.len().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        self.queue.is_empty().await
    }

    /// Newest first
    pub fn iter(&self) -> impl Stream<Item = Result<V>> + '_ {
        self.queue.iter()
    }

    /// Oldest first
    pub fn reverse(&self) -> impl Stream<Item = Result<V>> + '_ {
        self.queue.reverse()
    }

    pub async fn clear(&self) -> Result<()> {
        self.queue.clear().await
    }
}
