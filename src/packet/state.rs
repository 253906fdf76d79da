//! Game clock/state and per-player latency reporting.

use crate::codec::primitives::{self, BitReader, BitWriter};
use crate::error::CodecError;
use bytes::{Buf, BufMut};
use derive_new::new;
use getset::CopyGetters;

/// Overtime phase packed into the top bits of [`GameState::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overtime {
    None,
    Sudden,
    Extended,
}

impl Overtime {
    fn from_bits(bits: u32) -> Self {
        match bits {
            1 => Overtime::Sudden,
            2 => Overtime::Extended,
            _ => Overtime::None,
        }
    }

    fn to_bits(self) -> u32 {
        match self {
            Overtime::None => 0,
            Overtime::Sudden => 1,
            Overtime::Extended => 2,
        }
    }
}

/// Server's game clock broadcast: `state` is a one-byte bitstruct of
/// `{pad: 5, in_overtime: 2, game_started: 1}`, followed by `time_left`.
#[derive(new, Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct GameState {
    #[getset(get_copy = "pub")]
    in_overtime: Overtime,
    #[getset(get_copy = "pub")]
    game_started: bool,
    #[getset(get_copy = "pub")]
    time_left: u32,
}

impl GameState {
    pub const EVENT: &'static str = "game_state";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let byte = primitives::read_u8(buf, Self::EVENT)?;
        let mut reader = BitReader::new(std::slice::from_ref(&byte));
        let _pad = reader.take(5);
        let in_overtime = Overtime::from_bits(reader.take(2));
        let game_started = reader.take(1) != 0;
        if buf.remaining() < 4 {
            return Err(CodecError::decode(Self::EVENT, "unexpected end of frame"));
        }
        let time_left = buf.get_u32_le();
        Ok(GameState { in_overtime, game_started, time_left })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        let mut writer = BitWriter::new(1);
        writer.put(0, 5);
        writer.put(self.in_overtime.to_bits(), 2);
        writer.put(self.game_started as u32, 1);
        buf.put_slice(&writer.into_bytes());
        buf.put_u32_le(self.time_left);
        Ok(())
    }
}

/// One player's reported network latency.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct LatencyEntry {
    #[getset(get_copy = "pub")]
    player_id: u8,
    #[getset(get_copy = "pub")]
    latency: u16,
}

/// Per-player latency report. The server sends `latency` in the high byte
/// of the wire field; decode shifts it down, encode shifts it back up
/// (§9 Open Questions: encode treated as decode's inverse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Latency {
    pub entries: Vec<LatencyEntry>,
}

impl Latency {
    pub const EVENT: &'static str = "latency";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let mut entries = Vec::new();
        while buf.has_remaining() {
            if buf.remaining() < 3 {
                return Err(CodecError::decode(Self::EVENT, "unexpected end of frame"));
            }
            let player_id = buf.get_u8();
            let wire_latency = buf.get_u16_le();
            entries.push(LatencyEntry { player_id, latency: wire_latency >> 8 });
        }
        Ok(Latency { entries })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        for entry in &self.entries {
            buf.put_u8(entry.player_id);
            buf.put_u16_le(entry.latency << 8);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn game_state_round_trips() {
        let packet = GameState::new(Overtime::Sudden, true, 12_000);
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, GameState::decode(&mut cursor).unwrap());
    }

    #[test]
    fn latency_shifts_high_byte_on_decode() {
        let mut buf = BytesMut::new();
        buf.put_u8(3);
        buf.put_u16_le(5 << 8);
        let mut cursor = &buf[..];
        let decoded = Latency::decode(&mut cursor).unwrap();
        assert_eq!(decoded.entries, vec![LatencyEntry::new(3, 5)]);
    }

    #[test]
    fn latency_round_trips_through_encode() {
        let packet = Latency { entries: vec![LatencyEntry::new(1, 40), LatencyEntry::new(2, 55)] };
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, Latency::decode(&mut cursor).unwrap());
    }
}
