//! Codec trait and the JSON-lines implementation.
//!
//! A codec turns one message into one frame and back. Framing on the wire
//! is newline-delimited, so an encoded frame always ends with exactly one
//! `\n` and a decoded frame may still carry its terminator.
//!
//! A frame that fails to decode falls into one of these cases:
//!
//! - a frame that isn't JSON fails as `malformed json`
//! - an object whose `type` isn't known fails as `unknown message type`
//! - a known `type` with a missing or mistyped field fails as
//!   `missing or invalid field`
//!
//! Those short reasons come from [`ProtocolError::reason`] and are what a
//! client sees in the `invalid` reply.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values into frames and decodes frames back into values.
pub trait Codec: Send + Sync + Clone + 'static {
    /// Serializes a value into one newline-terminated frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed or
    /// doesn't match the expected schema.
    fn decode<T: DeserializeOwned>(
        &self,
        frame: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that writes one compact JSON object per line.
///
/// ```rust
/// use pairplay_protocol::{Codec, JsonCodec, ClientMessage};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&ClientMessage::Move { pos: 4 }).unwrap();
/// assert_eq!(bytes, b"{\"type\":\"move\",\"pos\":4}\n");
///
/// let decoded: ClientMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, ClientMessage::Move { pos: 4 });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        // Compact output never contains a raw newline, so the terminator
        // appended here is the only one in the frame.
        let mut bytes =
            serde_json::to_vec(value).map_err(ProtocolError::Encode)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        frame: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(frame).map_err(ProtocolError::Decode)
    }
}
