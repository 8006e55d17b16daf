//! Engine buffer decoding.
//!
//! Buffers are MessagePack. Three shapes exist on the wire:
//! - `{ event, window_id?, ... }` for app and window events
//! - `[channel, payload]` for a single IPC message
//! - `[[channel, payload], ...]` for an IPC batch
//!
//! IPC batches are packed by the renderer and forwarded untouched, so
//! payloads may carry `bin` and `ext` values. Those are unpacked into a
//! MessagePack value tree first and converted per entry (see [`wire`]).

use std::cell::Cell;

use lotus_common::DecodeError;
use tracing::warn;

use crate::events::DecodedMessage;

#[cfg(feature = "msgpack")]
pub mod wire;

/// Decoder for engine buffers.
///
/// Built without the `msgpack` feature (or via [`MessageCodec::unavailable`])
/// it warns once and rejects every buffer with
/// [`DecodeError::CodecUnavailable`] until the process restarts.
#[derive(Debug)]
pub struct MessageCodec {
    available: bool,
    warned: Cell<bool>,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self {
            available: cfg!(feature = "msgpack"),
            warned: Cell::new(false),
        }
    }

    /// A codec with no binary support.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            warned: Cell::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Log the missing-codec warning if it has not been logged yet.
    /// Returns whether this call logged it.
    pub fn warn_if_unavailable(&self) -> bool {
        if self.available || self.warned.replace(true) {
            return false;
        }
        warn!("binary codec unavailable, engine messages will be ignored until restart");
        true
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedMessage, DecodeError> {
        if !self.available {
            self.warn_if_unavailable();
            return Err(DecodeError::CodecUnavailable);
        }
        unpack(bytes)
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "msgpack")]
fn unpack(bytes: &[u8]) -> Result<DecodedMessage, DecodeError> {
    let mut reader = bytes;
    let value = rmpv::decode::read_value(&mut reader)
        .map_err(|e| DecodeError::Unpack(e.to_string()))?;
    wire::classify(value)
}

#[cfg(not(feature = "msgpack"))]
fn unpack(_bytes: &[u8]) -> Result<DecodedMessage, DecodeError> {
    Err(DecodeError::CodecUnavailable)
}
