use serde::{de::DeserializeOwned, Serialize};
use std::io;

/// Serializes `value` to MessagePack bytes (named-field encoding, so wire
/// dumps stay debuggable). Mirrors `distant_net::common::utils::serialize_to_vec`.
pub fn serialize_to_vec<T: Serialize>(value: &T) -> io::Result<Vec<u8>> {
    rmp_serde::encode::to_vec_named(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("encode failed: {e}")))
}

/// Deserializes MessagePack bytes produced by [`serialize_to_vec`].
pub fn deserialize_from_slice<T: DeserializeOwned>(slice: &[u8]) -> io::Result<T> {
    rmp_serde::decode::from_slice(slice)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("decode failed: {e}")))
}
