use async_stream::try_stream;
use futures::Stream;
use quay_core::{Codec, Context, Encoding, Json, QuayError, Result};
use redis::AsyncCommands;

use crate::handle::Handle;

/// How many elements one page of list iteration fetches
pub const PAGE_SIZE: isize = 30;

/// A Redis list where new items go to the head and the oldest sit at the tail.
///
/// Iteration pages through the list lazily and is not a snapshot: other
/// processes pushing or popping meanwhile shift what later pages return.
pub struct List<V, C = Json> {
    pub(crate) handle: Handle<V, C>,
}

impl<V, C: Clone> Clone for List<V, C> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<V> List<V> {
    /// Handle to the list `name` on the context's system, JSON encoded
    pub fn with_context(context: Context, name: impl ToString) -> Self {
        Self {
            handle: Handle::new(context, name, Json),
        }
    }
}

impl<V, C: Codec<V>> List<V, C> {
    /// Switch the codec; only meaningful before any data is written
    pub fn with_codec<C2: Codec<V>>(self, codec: C2) -> List<V, C2> {
        List {
            handle: self.handle.with_codec(codec),
        }
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn encoding(&self) -> Encoding {
        self.handle.encoding()
    }

    /// Push to the head
    pub async fn append(&self, item: &V) -> Result<()> {
        let bytes = self.handle.encode(item)?;
        let mut conn = self.handle.connection().await?;
        let _: () = conn.lpush(self.handle.name(), bytes).await?;
        Ok(())
    }

    /// Append every item in order, so the last one ends up at the head
    pub async fn extend<'a, I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a V>,
        V: 'a,
    {
        for item in items {
            self.append(item).await?;
        }
        Ok(())
    }

    /// Remove the first occurrence of `value`; true if something was removed
    pub async fn remove(&self, value: &V) -> Result<bool> {
        let bytes = self.handle.encode(value)?;
        let mut conn = self.handle.connection().await?;
        let removed: usize = conn.lrem(self.handle.name(), 1, bytes).await?;
        Ok(removed > 0)
    }

    /// Remove and return the oldest element (the tail)
    pub async fn pop(&self) -> Result<Option<V>> {
        let mut conn = self.handle.connection().await?;
        let bytes: Option<Vec<u8>> = conn.rpop(self.handle.name(), None).await?;
        Ok(self.handle.decode_optional(bytes))
    }

    /// Lists only pop from their tail
    pub async fn pop_at(&self, _index: isize) -> Result<Option<V>> {
        Err(QuayError::Unsupported("pop by index"))
    }

    pub async fn len(&self) -> Result<usize> {
        let mut conn = self.handle.connection().await?;
        let len: usize = conn.llen(self.handle.name()).await?;
        Ok(len)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Element at `index` (negative counts from the tail)
    pub async fn get(&self, index: isize) -> Result<Option<V>> {
        let mut conn = self.handle.connection().await?;
        let bytes: Option<Vec<u8>> = conn.lindex(self.handle.name(), index).await?;
        Ok(self.handle.decode_optional(bytes))
    }

    /// Elements from `start` to `stop` inclusive, decoded as they are consumed
    pub async fn range(&self, start: isize, stop: isize) -> Result<impl Iterator<Item = V> + '_> {
        let mut conn = self.handle.connection().await?;
        let page: Vec<Vec<u8>> = conn.lrange(self.handle.name(), start, stop).await?;
        Ok(page
            .into_iter()
            .filter_map(move |bytes| self.handle.decode_or_skip(&bytes)))
    }

    /// Walk the list head to tail, [`PAGE_SIZE`] elements per round trip
    pub fn iter(&self) -> impl Stream<Item = Result<V>> + '_ {
        try_stream! {
            let mut conn = self.handle.connection().await?;
            let mut start: isize = 0;
            loop {
                let page: Vec<Vec<u8>> = conn
                    .lrange(self.handle.name(), start, start + PAGE_SIZE - 1)
                    .await?;
                if page.is_empty() {
                    break;
                }
                for bytes in page {
                    if let Some(item) = self.handle.decode_or_skip(&bytes) {
                        yield item;
                    }
                }
                start += PAGE_SIZE;
            }
        }
    }

    /// Delete the whole list
    pub async fn clear(&self) -> Result<()> {
        let mut conn = self.handle.connection().await?;
        let _: () = conn.del(self.handle.name()).await?;
        Ok(())
    }
}
