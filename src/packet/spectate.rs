//! Spectator packets: the abstract `Spectate` notification and the
//! client's `SpectateRequest`.

use crate::codec::primitives;
use crate::error::CodecError;
use bytes::{Buf, BufMut};
use derive_new::new;
use getset::{CopyGetters, Getters};

/// `packet_type = 0`: a bitset of which client ids are currently
/// spectating, packed as four 64-bit words (client ids 0..255).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectatorBitset {
    pub words: [u64; 4],
}

impl SpectatorBitset {
    const EVENT: &'static str = "spectate";

    fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        if buf.remaining() < 32 {
            return Err(CodecError::decode(Self::EVENT, "unexpected end of frame"));
        }
        let mut words = [0u64; 4];
        for word in words.iter_mut() {
            *word = buf.get_u64_le();
        }
        Ok(SpectatorBitset { words })
    }

    fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        for word in &self.words {
            buf.put_u64_le(*word);
        }
        Ok(())
    }

    /// Whether `client_id` is marked as spectating.
    pub fn contains(&self, client_id: u8) -> bool {
        let word = self.words[(client_id / 64) as usize];
        (word >> (client_id % 64)) & 1 != 0
    }
}

/// `packet_type = 1`: one spectator's status, as it appears in the
/// per-spectator record list.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct SpectatorRecord {
    #[getset(get_copy = "pub")]
    is_out: u8,
    #[getset(get_copy = "pub")]
    client_id: u8,
    #[getset(get_copy = "pub")]
    spectate_target: i8,
}

/// Abstract packet tag `0x41`: dispatches on the leading `packet_type`
/// byte rather than any context flag.
#[derive(Debug, Clone, PartialEq)]
pub enum Spectate {
    Bitset(SpectatorBitset),
    Records(Vec<SpectatorRecord>),
}

impl Spectate {
    pub const EVENT: &'static str = "spectate";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let packet_type = primitives::read_u8(buf, Self::EVENT)?;
        match packet_type {
            0 => Ok(Spectate::Bitset(SpectatorBitset::decode(buf)?)),
            1 => {
                let mut records = Vec::new();
                while buf.has_remaining() {
                    if buf.remaining() < 3 {
                        return Err(CodecError::decode(Self::EVENT, "unexpected end of frame"));
                    }
                    let is_out = buf.get_u8();
                    let client_id = buf.get_u8();
                    let spectate_target = buf.get_i8();
                    records.push(SpectatorRecord { is_out, client_id, spectate_target });
                }
                Ok(Spectate::Records(records))
            }
            other => Err(CodecError::decode(Self::EVENT, format!("unknown spectate packet_type {other}"))),
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        match self {
            Spectate::Bitset(bitset) => {
                buf.put_u8(0);
                bitset.encode(buf)
            }
            Spectate::Records(records) => {
                buf.put_u8(1);
                for record in records {
                    buf.put_u8(record.is_out);
                    buf.put_u8(record.client_id);
                    buf.put_i8(record.spectate_target);
                }
                Ok(())
            }
        }
    }
}

/// Client request to start or stop spectating.
///
/// `spectating` is normalized to `20 + (value mod 2)` on construction, per
/// §9: "when caller sets `spectating`, normalize to `20 + (value mod 2)`."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, CopyGetters)]
pub struct SpectateRequest {
    spectating: u8,
}

impl SpectateRequest {
    pub const EVENT: &'static str = "spectate_request";

    pub fn new(spectating: u8) -> Self {
        SpectateRequest { spectating: 20 + (spectating % 2) }
    }

    pub fn spectating(&self) -> u8 {
        self.spectating
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let wire = primitives::read_u8(buf, Self::EVENT)?;
        if wire != 20 && wire != 21 {
            return Err(CodecError::decode(Self::EVENT, format!("invalid spectate_request byte {wire}")));
        }
        Ok(SpectateRequest { spectating: wire })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.spectating);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn spectate_records_round_trip() {
        let packet = Spectate::Records(vec![
            SpectatorRecord::new(0, 3, -4),
            SpectatorRecord::new(1, 4, -3),
        ]);
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, Spectate::decode(&mut cursor).unwrap());
    }

    #[test]
    fn spectate_bitset_round_trips() {
        let packet = Spectate::Bitset(SpectatorBitset { words: [1, 0, 0, 0] });
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, Spectate::decode(&mut cursor).unwrap());
    }

    #[test]
    fn spectate_request_normalizes_odd_value_to_21() {
        let request = SpectateRequest::new(7);
        assert_eq!(request.spectating(), 21);
    }

    #[test]
    fn spectate_request_normalizes_even_value_to_20() {
        let request = SpectateRequest::new(2);
        assert_eq!(request.spectating(), 20);
    }
}
