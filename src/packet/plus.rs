//! JJ2+ acknowledgement handshake: an abstract packet whose concrete shape
//! depends on which side sent it rather than on any byte in its own body.

use crate::codec::primitives::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::packet::DecodeContext;
use bitflags::bitflags;
use bytes::{Buf, BufMut};
use derive_new::new;
use getset::{CopyGetters, Getters};

bitflags! {
    /// Server rule flags packed into [`PlusDetails::plus_data`].
    pub struct PlusRules: u8 {
        const NO_BLINK = 0b0001;
        const NO_MOVEMENT = 0b0010;
        const FRIENDLY_FIRE = 0b0100;
        const PLUS_ONLY = 0b1000;
    }
}

/// Client-side request: "is the server running JJ2+?"
#[derive(new, Debug, Clone, Copy, PartialEq, Getters)]
pub struct PlusRequest {
    #[getset(get = "pub")]
    timestamp: [u8; 6],
}

impl PlusRequest {
    pub const EVENT: &'static str = "plus_ack";

    /// A request carrying no particular timestamp, used when joining.
    pub fn latest() -> Self {
        PlusRequest { timestamp: [0; 6] }
    }

    fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(PlusRequest { timestamp: crate::codec::primitives::read_array::<6>(buf, Self::EVENT)? })
    }

    fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_slice(&self.timestamp);
        Ok(())
    }
}

/// Server-side reply: confirms JJ2+ support and announces its rule set.
#[derive(new, Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct PlusDetails {
    #[getset(get_copy = "pub")]
    unknown: u8,
    #[getset(get_copy = "pub")]
    health_info: u8,
    #[getset(get_copy = "pub")]
    plus_data: PlusRules,
}

impl PlusDetails {
    pub const EVENT: &'static str = "plus_ack";

    fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let unknown = crate::codec::primitives::read_u8(buf, Self::EVENT)?;
        let health_info = crate::codec::primitives::read_u8(buf, Self::EVENT)?;
        let byte = crate::codec::primitives::read_u8(buf, Self::EVENT)?;
        let mut reader = BitReader::new(std::slice::from_ref(&byte));
        let _pad = reader.take(4);
        let no_blink = reader.take(1);
        let no_movement = reader.take(1);
        let friendly_fire = reader.take(1);
        let plus_only = reader.take(1);
        let mut plus_data = PlusRules::empty();
        plus_data.set(PlusRules::NO_BLINK, no_blink != 0);
        plus_data.set(PlusRules::NO_MOVEMENT, no_movement != 0);
        plus_data.set(PlusRules::FRIENDLY_FIRE, friendly_fire != 0);
        plus_data.set(PlusRules::PLUS_ONLY, plus_only != 0);
        Ok(PlusDetails { unknown, health_info, plus_data })
    }

    fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.unknown);
        buf.put_u8(self.health_info);
        let mut writer = BitWriter::new(1);
        writer.put(0, 4);
        writer.put(self.plus_data.contains(PlusRules::NO_BLINK) as u32, 1);
        writer.put(self.plus_data.contains(PlusRules::NO_MOVEMENT) as u32, 1);
        writer.put(self.plus_data.contains(PlusRules::FRIENDLY_FIRE) as u32, 1);
        writer.put(self.plus_data.contains(PlusRules::PLUS_ONLY) as u32, 1);
        buf.put_slice(&writer.into_bytes());
        Ok(())
    }
}

/// Abstract packet tag shared by [`PlusRequest`] (client to server) and
/// [`PlusDetails`] (server to client); picked on `ctx.from_server` rather
/// than on any field of the packet's own body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlusAcknowledgement {
    Request(PlusRequest),
    Details(PlusDetails),
}

impl PlusAcknowledgement {
    pub const EVENT: &'static str = "plus_ack";

    pub fn pick(ctx: &DecodeContext) -> bool {
        ctx.from_server
    }

    pub fn decode(buf: &mut impl Buf, ctx: &DecodeContext) -> Result<Self, CodecError> {
        if Self::pick(ctx) {
            Ok(PlusAcknowledgement::Details(PlusDetails::decode(buf)?))
        } else {
            Ok(PlusAcknowledgement::Request(PlusRequest::decode(buf)?))
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        match self {
            PlusAcknowledgement::Request(request) => request.encode(buf),
            PlusAcknowledgement::Details(details) => details.encode(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn plus_request_round_trips() {
        let packet = PlusRequest::latest();
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let ctx = DecodeContext { is_downloading: false, from_server: false };
        assert_eq!(PlusAcknowledgement::Request(packet), PlusAcknowledgement::decode(&mut cursor, &ctx).unwrap());
    }

    #[test]
    fn plus_details_round_trips_rule_flags() {
        let packet = PlusDetails::new(0, 100, PlusRules::FRIENDLY_FIRE | PlusRules::PLUS_ONLY);
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let ctx = DecodeContext { is_downloading: false, from_server: true };
        let decoded = PlusAcknowledgement::decode(&mut cursor, &ctx).unwrap();
        assert_eq!(PlusAcknowledgement::Details(packet), decoded);
    }
}
