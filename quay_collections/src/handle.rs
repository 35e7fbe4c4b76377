use quay_core::{Codec, Connection, Context, Encoding, Result};
use std::marker::PhantomData;
use tracing::warn;

/// What every collection is made of: a system context, a key name and a codec.
///
/// Holds no data of its own; every read goes to the backend.
pub(crate) struct Handle<V, C> {
    context: Context,
    name: String,
    codec: C,
    _value: PhantomData<fn() -> V>,
}

impl<V, C: Clone> Clone for Handle<V, C> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            name: self.name.clone(),
            codec: self.codec.clone(),
            _value: PhantomData,
        }
    }
}

impl<V, C> Handle<V, C> {
    pub(crate) fn new(context: Context, name: impl ToString, codec: C) -> Self {
        Self {
            context,
            name: name.to_string(),
            codec,
            _value: PhantomData,
        }
    }

    pub(crate) fn with_codec<C2>(self, codec: C2) -> Handle<V, C2> {
        Handle {
            context: self.context,
            name: self.name,
            codec,
            _value: PhantomData,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }

    pub(crate) async fn connection(&self) -> Result<Connection> {
        self.context.get_connection().await
    }

    /// Field names that are not UTF-8 are logged and left out
    pub(crate) fn field_name(&self, bytes: Vec<u8>) -> Option<String> {
        match String::from_utf8(bytes) {
            Ok(name) => Some(name),
            Err(err) => {
                warn!(
                    collection = %self.name,
                    field = ?err.as_bytes(),
                    "Skipping field name that is not UTF-8"
                );
                None
            }
        }
    }
}

impl<V, C: Codec<V>> Handle<V, C> {
    pub(crate) fn encoding(&self) -> Encoding {
        self.codec.encoding()
    }

    pub(crate) fn encode(&self, value: &V) -> Result<Vec<u8>> {
        self.codec.encode(value)
    }

    pub(crate) fn decode(&self, bytes: &[u8]) -> Result<V> {
        self.codec.decode(bytes)
    }

    /// Decode a stored value, logging and dropping it when it does not decode
    pub(crate) fn decode_or_skip(&self, bytes: &[u8]) -> Option<V> {
        match self.codec.decode(bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    collection = %self.name,
                    encoding = %self.codec.encoding(),
                    error = %err,
                    "Skipping undecodable value"
                );
                None
            }
        }
    }

    pub(crate) fn decode_optional(&self, bytes: Option<Vec<u8>>) -> Option<V> {
        bytes.and_then(|b| self.decode_or_skip(&b))
    }
}
