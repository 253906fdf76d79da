//! The `Payload` trait and its caching wrapper [`Cached`]
//!
//! Every concrete or abstract packet class implements [`Payload`], giving it
//! a one-byte wire tag, a transport, and an event name. [`Cached`] supplies
//! the serialize/deserialize/feed/refresh behavior described for the codec
//! core: a packet instance remembers the bytes it last produced or consumed
//! and invalidates that memory whenever its value changes.

use crate::error::CodecError;
use crate::packet::{DecodeContext, Transport};
use bytes::{Bytes, BytesMut};
use std::cell::RefCell;

/// A packet class: a fixed one-byte tag, a transport, and a body codec.
pub trait Payload: Sized + Clone {
    /// One-byte wire tag, unique among top-level packet classes.
    const TAG: u8;
    /// Which transport carries this packet class.
    const TRANSPORT: Transport;
    /// Short event name used by upstream dispatch.
    const EVENT: &'static str;

    /// Encode this packet's body (without the outer tag byte).
    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Decode this packet's body (without the outer tag byte) given the
    /// current decode context.
    fn decode_body(buf: &mut &[u8], ctx: &DecodeContext) -> Result<Self, CodecError>;
}

/// Caches a packet's last-serialized bytes and last-deserialized source.
///
/// Replaces the dynamic `_data` dict of the original implementation: rather
/// than tracking which individual fields changed, [`feed`](Cached::feed)
/// replaces the whole value and invalidates the serialization cache, which
/// is equivalent for a short-lived, non-shared packet instance.
pub struct Cached<T: Payload> {
    value: T,
    serialized: RefCell<Option<Bytes>>,
    deserialized_from: Option<Bytes>,
}

impl<T: Payload> Cached<T> {
    /// Wrap a freshly constructed value with no cached serialization.
    pub fn new(value: T) -> Self {
        Cached { value, serialized: RefCell::new(None), deserialized_from: None }
    }

    /// The current value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Encode the full frame (tag byte + body), returning cached bytes when
    /// available.
    pub fn serialize(&self) -> Result<Bytes, CodecError> {
        if let Some(cached) = self.serialized.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[T::TAG]);
        self.value.encode_body(&mut buf)?;
        let bytes = buf.freeze();
        *self.serialized.borrow_mut() = Some(bytes.clone());
        Ok(bytes)
    }

    /// Decode a frame body (tag already stripped by the transport layer),
    /// retaining the source bytes for later [`refresh`](Cached::refresh).
    pub fn deserialize(body: &[u8], ctx: &DecodeContext) -> Result<Self, CodecError> {
        let mut cursor = body;
        let value = T::decode_body(&mut cursor, ctx)?;
        Ok(Cached { value, serialized: RefCell::new(None), deserialized_from: Some(Bytes::copy_from_slice(body)) })
    }

    /// Replace the value outright, invalidating any cached serialization.
    pub fn feed(&mut self, value: T) {
        self.value = value;
        *self.serialized.borrow_mut() = None;
    }

    /// Re-decode from the retained source bytes under a new context.
    ///
    /// Used when an abstract class's discriminant (e.g. `is_downloading`)
    /// changes after the packet was first decoded. No-op if this instance
    /// was never deserialized from the wire.
    pub fn refresh(&mut self, ctx: &DecodeContext) -> Result<(), CodecError> {
        if let Some(source) = self.deserialized_from.clone() {
            let mut cursor = &source[..];
            self.value = T::decode_body(&mut cursor, ctx)?;
            *self.serialized.borrow_mut() = None;
        }
        Ok(())
    }
}

impl<T: Payload + std::fmt::Debug> std::fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cached").field("value", &self.value).finish()
    }
}
