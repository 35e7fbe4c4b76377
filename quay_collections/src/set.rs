use async_stream::try_stream;
use futures::Stream;
use quay_core::{Codec, Context, Encoding, Json, Result};
use redis::AsyncCommands;

use crate::handle::Handle;

/// Unordered collection of unique members in a Redis set
pub struct Set<V, C = Json> {
    handle: Handle<V, C>,
}

impl<V, C: Clone> Clone for Set<V, C> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<V> Set<V> {
    pub fn with_context(context: Context, name: impl ToString) -> Self {
        Self {
            handle: Handle::new(context, name, Json),
        }
    }
}

impl<V, C: Codec<V>> Set<V, C> {
    pub fn with_codec<C2: Codec<V>>(self, codec: C2) -> Set<V, C2> {
        Set {
            handle: self.handle.with_codec(codec),
        }
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn encoding(&self) -> Encoding {
        self.handle.encoding()
    }

    /// Add `item`; true if it was not a member yet
    pub async fn add(&self, item: &V) -> Result<bool> {
        let bytes = self.handle.encode(item)?;
        let mut conn = self.handle.connection().await?;
        let added: usize = conn.sadd(self.handle.name(), bytes).await?;
        Ok(added > 0)
    }

    /// Remove `item`; true if it was a member
    pub async fn remove(&self, item: &V) -> Result<bool> {
        let bytes = self.handle.encode(item)?;
        let mut conn = self.handle.connection().await?;
        let removed: usize = conn.srem(self.handle.name(), bytes).await?;
        Ok(removed > 0)
    }

    /// Remove the named `item` and hand back its stored form.
    ///
    /// This is not an arbitrary-member pop: the caller names what to take,
    /// and gets `None` when it was not a member.
    pub async fn pop(&self, item: &V) -> Result<Option<V>> {
        let bytes = self.handle.encode(item)?;
        let mut conn = self.handle.connection().await?;
        let removed: usize = conn.srem(self.handle.name(), &bytes).await?;
        if removed == 0 {
            return Ok(None);
        }
        Ok(self.handle.decode_or_skip(&bytes))
    }

    pub async fn contains(&self, item: &V) -> Result<bool> {
        let bytes = self.handle.encode(item)?;
        let mut conn = self.handle.connection().await?;
        let is_member: bool = conn.sismember(self.handle.name(), bytes).await?;
        Ok(is_member)
    }

    /// Every member that decodes, in no particular order
    pub fn members(&self) -> impl Stream<Item = Result<V>> + '_ {
        try_stream! {
            let mut conn = self.handle.connection().await?;
            let members: Vec<Vec<u8>> = conn.smembers(self.handle.name()).await?;
            for bytes in members {
                if let Some(item) = self.handle.decode_or_skip(&bytes) {
                    yield item;
                }
            }
        }
    }

    pub async fn len(&self) -> Result<usize> {
        let mut conn = self.handle.connection().await?;
        let len: usize = conn.scard(self.handle.name()).await?;
        Ok(len)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Delete the whole set
    pub async fn clear(&self) -> Result<()> {
        let mut conn = self.handle.connection().await?;
        let _: () = conn.del(self.handle.name()).await?;
        Ok(())
    }
}
