//! Wire codec: byte primitives, text encoding, checksums, and the
//! packet-level caching wrapper.

pub mod checksum;
pub mod cp1250;
pub mod payload;
pub mod primitives;
