use quay_core::{Codec, Context, Encoding, Json, Result};
use redis::AsyncCommands;

use crate::handle::Handle;

/// A single encoded value at one key
pub struct Slot<V, C = Json> {
    handle: Handle<V, C>,
}

impl<V, C: Clone> Clone for Slot<V, C> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<V> Slot<V> {
    pub fn with_context(context: Context, name: impl ToString) -> Self {
        Self {
            handle: Handle::new(context, name, Json),
        }
    }
}

impl<V, C: Codec<V>> Slot<V, C> {
    pub fn with_codec<C2: Codec<V>>(self, codec: C2) -> Slot<V, C2> {
        Slot {
            handle: self.handle.with_codec(codec),
        }
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn encoding(&self) -> Encoding {
        self.handle.encoding()
    }

    /// Stored value, `None` when absent or undecodable
    pub async fn get(&self) -> Result<Option<V>> {
        let mut conn = self.handle.connection().await?;
        let bytes: Option<Vec<u8>> = conn.get(self.handle.name()).await?;
        Ok(self.handle.decode_optional(bytes))
    }

    /// Stored value, `None` when absent; a value that does not decode is an
    /// error instead of being read as absent
    pub async fn fetch(&self) -> Result<Option<V>> {
        let mut conn = self.handle.connection().await?;
        let bytes: Option<Vec<u8>> = conn.get(self.handle.name()).await?;
        bytes.map(|b| self.handle.decode(&b)).transpose()
    }

    pub async fn get_or(&self, default: V) -> Result<V> {
        Ok(self.get().await?.unwrap_or(default))
    }

    pub async fn set(&self, value: &V) -> Result<()> {
        let bytes = self.handle.encode(value)?;
        let mut conn = self.handle.connection().await?;
        let _: () = conn.set(self.handle.name(), bytes).await?;
        Ok(())
    }

    /// Delete the value; true if one was stored
    pub async fn delete(&self) -> Result<bool> {
        let mut conn = self.handle.connection().await?;
        let removed: usize = conn.del(self.handle.name()).await?;
        Ok(removed > 0)
    }

    pub async fn exists(&self) -> Result<bool> {
        let mut conn = self.handle.connection().await?;
        let exists: bool = conn.exists(self.handle.name()).await?;
        Ok(exists)
    }
}
