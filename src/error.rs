//! Error types for the codec and dispatch layers
//!
//! Grounded on `examples/biandratti-huginn-proxy/huginn-proxy-lib/src/error.rs`'s
//! use of `thiserror`, generalized to the error families named in §7 of the
//! specification: codec errors are fatal to the current packet only, while
//! protocol errors are dispatch-level and never escape `Dispatcher::handle`.

use thiserror::Error;

/// A primitive-level encode or decode failure.
///
/// Fatal to the packet currently being processed, not to the connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error while handling {event:?}: {message}")]
pub struct CodecError {
    pub kind: CodecErrorKind,
    pub event: &'static str,
    pub message: String,
}

/// Whether a [`CodecError`] occurred while encoding or decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    Encode,
    Decode,
}

impl std::fmt::Display for CodecErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecErrorKind::Encode => write!(f, "encode"),
            CodecErrorKind::Decode => write!(f, "decode"),
        }
    }
}

impl CodecError {
    pub fn encode(event: &'static str, message: impl Into<String>) -> Self {
        CodecError { kind: CodecErrorKind::Encode, event, message: message.into() }
    }

    pub fn decode(event: &'static str, message: impl Into<String>) -> Self {
        CodecError { kind: CodecErrorKind::Decode, event, message: message.into() }
    }
}

/// Errors surfaced above the codec, at the transport and dispatch layers.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A primitive encode/decode failure at the outer frame.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Underlying transport I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A registrar marked `ALL_PAYLOADS` failed its gate; the protocol
    /// silently drops every subsequent packet.
    #[error("protocol aborted: {0}")]
    Aborted(&'static str),

    /// The connection's completion signal was cancelled.
    #[error("connection lost")]
    ConnectionLost,
}
