use async_stream::try_stream;
use futures::Stream;
use quay_core::{Codec, Context, Encoding, Json, QuayError, Result};
use redis::AsyncCommands;
use tracing::warn;

use crate::handle::Handle;

/// Field/value map stored in a single Redis hash.
///
/// Enumeration is best effort: other processes may remove fields while
/// [`Hash::items`] runs, and those fields are simply left out.
pub struct Hash<V, C = Json> {
    handle: Handle<V, C>,
}

impl<V, C: Clone> Clone for Hash<V, C> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<V> Hash<V> {
    pub fn with_context(context: Context, name: impl ToString) -> Self {
        Self {
            handle: Handle::new(context, name, Json),
        }
    }
}

impl<V, C: Codec<V>> Hash<V, C> {
    pub fn with_codec<C2: Codec<V>>(self, codec: C2) -> Hash<V, C2> {
        Hash {
            handle: self.handle.with_codec(codec),
        }
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn encoding(&self) -> Encoding {
        self.handle.encoding()
    }

    /// Value of `field`, or `None` when it is missing or does not decode
    pub async fn get(&self, field: &str) -> Result<Option<V>> {
        let mut conn = self.handle.connection().await?;
        let bytes: Option<Vec<u8>> = conn.hget(self.handle.name(), field).await?;
        Ok(self.handle.decode_optional(bytes))
    }

    pub async fn get_or(&self, field: &str, default: V) -> Result<V> {
        Ok(self.get(field).await?.unwrap_or(default))
    }

    /// Value of `field`; missing or undecodable fields are [`QuayError::NotFound`]
    pub async fn get_item(&self, field: &str) -> Result<V> {
        let mut conn = self.handle.connection().await?;
        let bytes: Option<Vec<u8>> = conn.hget(self.handle.name(), field).await?;
        let not_found = || QuayError::NotFound(format!("{}[{}]", self.handle.name(), field));
        let bytes = bytes.ok_or_else(not_found)?;
        self.handle.decode(&bytes).map_err(|_| not_found())
    }

    pub async fn set(&self, field: &str, value: &V) -> Result<()> {
        let bytes = self.handle.encode(value)?;
        let mut conn = self.handle.connection().await?;
        let _: () = conn.hset(self.handle.name(), field, bytes).await?;
        Ok(())
    }

    /// Delete `field`; true if it existed
    pub async fn remove(&self, field: &str) -> Result<bool> {
        let mut conn = self.handle.connection().await?;
        let removed: usize = conn.hdel(self.handle.name(), field).await?;
        Ok(removed > 0)
    }

    pub async fn contains(&self, field: &str) -> Result<bool> {
        let mut conn = self.handle.connection().await?;
        let exists: bool = conn.hexists(self.handle.name(), field).await?;
        Ok(exists)
    }

    /// Field names; names that are not UTF-8 are skipped
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut conn = self.handle.connection().await?;
        let raw: Vec<Vec<u8>> = conn.hkeys(self.handle.name()).await?;
        Ok(raw
            .into_iter()
            .filter_map(|bytes| self.handle.field_name(bytes))
            .collect())
    }

    /// All values that decode; the rest are skipped
    pub async fn values(&self) -> Result<Vec<V>> {
        let mut conn = self.handle.connection().await?;
        let raw: Vec<Vec<u8>> = conn.hvals(self.handle.name()).await?;
        Ok(raw
            .iter()
            .filter_map(|bytes| self.handle.decode_or_skip(bytes))
            .collect())
    }

    /// Field/value pairs, each value fetched on its own.
    ///
    /// Fields deleted after the key listing, or holding undecodable values,
    /// are skipped rather than failing the walk.
    pub fn items(&self) -> impl Stream<Item = Result<(String, V)>> + '_ {
        try_stream! {
            for field in self.keys().await? {
                if let Some(value) = self.get(&field).await? {
                    yield (field, value);
                }
            }
        }
    }

    /// Read and delete `field` in one transaction.
    ///
    /// A missing field is logged and reported as `None`.
    pub async fn pop(&self, field: &str) -> Result<Option<V>> {
        let mut conn = self.handle.connection().await?;

        #[rustfmt::skip]
        let (bytes, removed): (Option<Vec<u8>>, usize) = redis::pipe()
            .atomic()
            .hget(self.handle.name(), field)
            .hdel(self.handle.name(), field)
            .query_async(&mut conn)
            .await?;

        if removed == 0 {
            warn!(hash = %self.handle.name(), field = %field, "Popped field does not exist");
            return Ok(None);
        }
        Ok(self.handle.decode_optional(bytes))
    }

    /// Set many fields in one command; every value is encoded first
    pub async fn update<I, K>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
    {
        let encoded: Vec<(String, Vec<u8>)> = entries
            .into_iter()
            .map(|(field, value)| -> Result<(String, Vec<u8>)> {
                Ok((field.to_string(), self.handle.encode(&value)?))
            })
            .collect::<Result<_>>()?;
        if encoded.is_empty() {
            return Ok(());
        }

        let mut conn = self.handle.connection().await?;
        let _: () = conn.hset_multiple(self.handle.name(), encoded.as_slice()).await?;
        Ok(())
    }

    pub async fn len(&self) -> Result<usize> {
        let mut conn = self.handle.connection().await?;
        let len: usize = conn.hlen(self.handle.name()).await?;
        Ok(len)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Delete the whole hash
    pub async fn clear(&self) -> Result<()> {
        let mut conn = self.handle.connection().await?;
        let _: () = conn.del(self.handle.name()).await?;
        Ok(())
    }
}
