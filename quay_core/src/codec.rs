//! Encoding strategies for values stored in collections.
//!
//! A codec is chosen once when a collection handle is built and stays
//! fixed for the handle's lifetime. Three strategies exist:
//!
//! - [`Json`]: structured text with map keys sorted, so structurally
//!   equal values always produce identical bytes
//! - [`Binary`]: opaque, self-describing binary (MessagePack) for any
//!   serde type, including flattened structs and untagged enums
//! - [`Raw`]: strings passed through untouched

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;

use crate::{QuayError, Result};

/// The encoding tag that travels with every stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    StructuredText,
    OpaqueBinary,
    RawString,
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Encoding::StructuredText => "json",
            Encoding::OpaqueBinary => "binary",
            Encoding::RawString => "string",
        };
        write!(f, "{}", str)
    }
}

/// Encode/decode capability for values of type `V`
pub trait Codec<V>: Clone + Send + Sync + 'static {
    fn encoding(&self) -> Encoding;

    fn encode(&self, value: &V) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<V>;
}

/// Structured text; maps, sequences and sets go through their serde
/// impls, sets land on the wire as sequences
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl<V> Codec<V> for Json
where
    V: Serialize + DeserializeOwned,
{
    fn encoding(&self) -> Encoding {
        Encoding::StructuredText
    }

    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        // serde_json::Value keeps objects in a BTreeMap, which sorts the keys
        let normalized = serde_json::to_value(value).map_err(encode_error)?;
        serde_json::to_vec(&normalized).map_err(encode_error)
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes).map_err(decode_error)
    }
}

/// MessagePack with struct fields written as named map entries
#[derive(Debug, Clone, Copy, Default)]
pub struct Binary;

impl<V> Codec<V> for Binary
where
    V: Serialize + DeserializeOwned,
{
    fn encoding(&self) -> Encoding {
        Encoding::OpaqueBinary
    }

    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(value).map_err(encode_error)
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        rmp_serde::from_slice(bytes).map_err(decode_error)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl Codec<String> for Raw {
    fn encoding(&self) -> Encoding {
        Encoding::RawString
    }

    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(decode_error)
    }
}

fn encode_error(err: impl Display) -> QuayError {
    QuayError::Encode(err.to_string())
}

fn decode_error(err: impl Display) -> QuayError {
    QuayError::Decode(err.to_string())
}
