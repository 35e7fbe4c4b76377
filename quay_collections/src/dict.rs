use async_stream::try_stream;
use futures::Stream;
use quay_core::{Codec, Context, Encoding, Json, QuayError, Result};
use redis::AsyncCommands;

use crate::handle::Handle;

/// A mapping spread over top-level keys: field `f` of dictionary `d` is the
/// Redis string at key `d` + `f`.
///
/// Unlike [`crate::Hash`], each entry can carry its own expiry. Listing keys
/// walks the keyspace, so it costs more than a hash does.
pub struct Dict<V, C = Json> {
    handle: Handle<V, C>,
}

impl<V, C: Clone> Clone for Dict<V, C> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<V> Dict<V> {
    /// `prefix` is used verbatim, so include any separator, like `"job:"`
    pub fn with_context(context: Context, prefix: impl ToString) -> Self {
        Self {
            handle: Handle::new(context, prefix, Json),
        }
    }
}

impl<V, C> Dict<V, C> {
    fn key(&self, field: &str) -> String {
        format!("{}{}", self.handle.name(), field)
    }
}

impl<V, C: Codec<V>> Dict<V, C> {
    pub fn with_codec<C2: Codec<V>>(self, codec: C2) -> Dict<V, C2> {
        Dict {
            handle: self.handle.with_codec(codec),
        }
    }

    /// The key prefix
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn encoding(&self) -> Encoding {
        self.handle.encoding()
    }

    pub async fn get(&self, field: &str) -> Result<Option<V>> {
        let mut conn = self.handle.connection().await?;
        let bytes: Option<Vec<u8>> = conn.get(self.key(field)).await?;
        Ok(self.handle.decode_optional(bytes))
    }

    pub async fn get_or(&self, field: &str, default: V) -> Result<V> {
        Ok(self.get(field).await?.unwrap_or(default))
    }

    /// Like [`Dict::get`], but absence is [`QuayError::NotFound`]
    pub async fn get_item(&self, field: &str) -> Result<V> {
        let key = self.key(field);
        let mut conn = self.handle.connection().await?;
        let bytes: Option<Vec<u8>> = conn.get(&key).await?;
        let bytes = bytes.ok_or_else(|| QuayError::NotFound(key.clone()))?;
        self.handle
            .decode(&bytes)
            .map_err(|_| QuayError::NotFound(key))
    }

    pub async fn set(&self, field: &str, value: &V) -> Result<()> {
        let bytes = self.handle.encode(value)?;
        let mut conn = self.handle.connection().await?;
        let _: () = conn.set(self.key(field), bytes).await?;
        Ok(())
    }

    /// Store `value` under `field`, expiring after `seconds`
    pub async fn set_with_ttl(&self, field: &str, value: &V, seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(QuayError::Configuration(
                "dictionary entry ttl must be positive".to_string(),
            ));
        }
        let bytes = self.handle.encode(value)?;
        let mut conn = self.handle.connection().await?;
        let _: () = conn.set_ex(self.key(field), bytes, seconds).await?;
        Ok(())
    }

    /// Delete `field`; true if it existed
    pub async fn remove(&self, field: &str) -> Result<bool> {
        let mut conn = self.handle.connection().await?;
        let removed: usize = conn.del(self.key(field)).await?;
        Ok(removed > 0)
    }

    pub async fn contains(&self, field: &str) -> Result<bool> {
        let mut conn = self.handle.connection().await?;
        let exists: bool = conn.exists(self.key(field)).await?;
        Ok(exists)
    }

    /// Field names currently present, sorted
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.handle.context().scan_prefix(self.handle.name()).await
    }

    /// Field/value pairs; entries that expire or vanish mid-walk are skipped
    pub fn items(&self) -> impl Stream<Item = Result<(String, V)>> + '_ {
        try_stream! {
            for field in self.keys().await? {
                if let Some(value) = self.get(&field).await? {
                    yield (field, value);
                }
            }
        }
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.keys().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Delete every key under the prefix
    pub async fn clear(&self) -> Result<()> {
        let keys: Vec<String> = self
            .keys()
            .await?
            .iter()
            .map(|field| self.key(field))
            .collect();
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.handle.connection().await?;
        let _: () = conn.del(keys).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quay_core::Forum;

    fn offline_dict() -> Dict<u32> {
        Dict::with_context(Forum::new().system("nowhere"), "job:")
    }

    #[test]
    fn fields_are_appended_to_the_prefix() {
        let dict = offline_dict();
        assert_eq!(dict.key("42"), "job:42");
        assert_eq!(dict.key(""), "job:");
        assert_eq!(dict.name(), "job:");
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected_before_any_io() {
        let dict = offline_dict();
        assert!(matches!(
            dict.set_with_ttl("a", &1, 0).await,
            Err(QuayError::Configuration(_))
        ));
    }
}
