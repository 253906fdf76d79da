//! The packet schema registry: one Rust type per wire packet class, a
//! [`Payload`](crate::codec::payload::Payload) implementation per type
//! giving it a tag/transport/event name, and the [`Packet`] enum that
//! aggregates every class so the transport and dispatch layers can work
//! with a single type.

pub mod chat;
pub mod enums;
pub mod level;
pub mod lifecycle;
pub mod player;
pub mod plus;
pub mod session_packets;
pub mod spectate;
pub mod state;
pub mod udp;

pub use chat::{ChatMessage, ConsoleMessage};
pub use enums::{Character, ChatType, GameMode, MajorVersionString, Team};
pub use level::{EndOfLevel, LevelLoad, ResourceList, ScriptEntry, UpdateEvents, UpdateRequest};
pub use lifecycle::{DownloadRequest, DownloadingFile, DownloadingFileChunk, DownloadingFileInit, GameInit, Ready, ServerStopped};
pub use player::{LocalPlayer, PlayerFields, ToPayloadData};
pub use plus::{PlusAcknowledgement, PlusDetails, PlusRequest, PlusRules};
pub use session_packets::{ClientDetails, ClientDisconnect, JoinRequest, PlayerList, ScriptsSwitch, ServerDetails, ServerDetailsExtras};
pub use spectate::{Spectate, SpectateRequest, SpectatorBitset, SpectatorRecord};
pub use state::{GameState, Latency, LatencyEntry, Overtime};
pub use udp::{GameEvent, Heartbeat, Password, PasswordCheck, Ping, Pong, Query, QueryReply};

use crate::codec::payload::Payload;
use crate::error::CodecError;
use bytes::BytesMut;

/// Which transport carries a packet class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Tcp,
    Udp,
}

/// Decode-time context threaded through abstract packet classes so they can
/// pick a sub-variant (§3 `AbstractPacket`). `is_downloading` selects
/// [`DownloadingFile`]'s variant, `from_server` selects
/// [`PlusAcknowledgement`]'s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeContext {
    pub is_downloading: bool,
    pub from_server: bool,
}

macro_rules! impl_payload {
    ($ty:ty, $tag:expr, $transport:expr, $event:expr) => {
        impl Payload for $ty {
            const TAG: u8 = $tag;
            const TRANSPORT: Transport = $transport;
            const EVENT: &'static str = $event;

            fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
                self.encode(buf)
            }

            fn decode_body(buf: &mut &[u8], _ctx: &DecodeContext) -> Result<Self, CodecError> {
                Self::decode(buf)
            }
        }
    };
}

impl_payload!(ClientDisconnect, 0x0D, Transport::Tcp, ClientDisconnect::EVENT);
impl_payload!(ClientDetails, 0x0E, Transport::Tcp, ClientDetails::EVENT);
impl_payload!(JoinRequest, 0x0F, Transport::Tcp, JoinRequest::EVENT);
impl_payload!(ServerDetails, 0x10, Transport::Tcp, ServerDetails::EVENT);
impl_payload!(PlayerList, 0x12, Transport::Tcp, PlayerList::EVENT);
impl_payload!(GameInit, 0x13, Transport::Tcp, GameInit::EVENT);
impl_payload!(DownloadRequest, 0x15, Transport::Tcp, DownloadRequest::EVENT);
impl_payload!(LevelLoad, 0x16, Transport::Tcp, LevelLoad::EVENT);
impl_payload!(EndOfLevel, 0x17, Transport::Tcp, EndOfLevel::EVENT);
impl_payload!(UpdateEvents, 0x18, Transport::Tcp, UpdateEvents::EVENT);
impl_payload!(ServerStopped, 0x19, Transport::Tcp, ServerStopped::EVENT);
impl_payload!(UpdateRequest, 0x1A, Transport::Tcp, UpdateRequest::EVENT);
impl_payload!(ChatMessage, 0x1B, Transport::Tcp, ChatMessage::EVENT);
impl_payload!(ConsoleMessage, 0x40, Transport::Tcp, ConsoleMessage::EVENT);
impl_payload!(SpectateRequest, 0x42, Transport::Tcp, SpectateRequest::EVENT);
impl_payload!(GameState, 0x45, Transport::Tcp, GameState::EVENT);
impl_payload!(Latency, 0x49, Transport::Tcp, Latency::EVENT);
impl_payload!(Ready, 0x51, Transport::Tcp, Ready::EVENT);
impl_payload!(ResourceList, 0x5A, Transport::Tcp, ResourceList::EVENT);

impl_payload!(Ping, 0x03, Transport::Udp, Ping::EVENT);
impl_payload!(Pong, 0x04, Transport::Udp, Pong::EVENT);
impl_payload!(Query, 0x05, Transport::Udp, Query::EVENT);
impl_payload!(QueryReply, 0x06, Transport::Udp, QueryReply::EVENT);
impl_payload!(GameEvent, 0x07, Transport::Udp, GameEvent::EVENT);
impl_payload!(Heartbeat, 0x09, Transport::Udp, Heartbeat::EVENT);
impl_payload!(Password, 0x0A, Transport::Udp, Password::EVENT);
impl_payload!(PasswordCheck, 0x0B, Transport::Udp, PasswordCheck::EVENT);

impl Payload for DownloadingFile {
    const TAG: u8 = 0x14;
    const TRANSPORT: Transport = Transport::Tcp;
    const EVENT: &'static str = DownloadingFile::EVENT;

    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.encode(buf)
    }

    fn decode_body(buf: &mut &[u8], ctx: &DecodeContext) -> Result<Self, CodecError> {
        Self::decode(buf, ctx)
    }
}

impl Payload for PlusAcknowledgement {
    const TAG: u8 = 0x3F;
    const TRANSPORT: Transport = Transport::Tcp;
    const EVENT: &'static str = PlusAcknowledgement::EVENT;

    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.encode(buf)
    }

    fn decode_body(buf: &mut &[u8], ctx: &DecodeContext) -> Result<Self, CodecError> {
        Self::decode(buf, ctx)
    }
}

impl Payload for Spectate {
    const TAG: u8 = 0x41;
    const TRANSPORT: Transport = Transport::Tcp;
    const EVENT: &'static str = Spectate::EVENT;

    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.encode(buf)
    }

    fn decode_body(buf: &mut &[u8], _ctx: &DecodeContext) -> Result<Self, CodecError> {
        Self::decode(buf)
    }
}

/// The full packet catalog: one variant per wire class (§4.2).
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    ClientDisconnect(ClientDisconnect),
    ClientDetails(ClientDetails),
    JoinRequest(JoinRequest),
    ServerDetails(ServerDetails),
    PlayerList(PlayerList),
    GameInit(GameInit),
    DownloadingFile(DownloadingFile),
    DownloadRequest(DownloadRequest),
    LevelLoad(LevelLoad),
    EndOfLevel(EndOfLevel),
    UpdateEvents(UpdateEvents),
    ServerStopped(ServerStopped),
    UpdateRequest(UpdateRequest),
    ChatMessage(ChatMessage),
    PlusAcknowledgement(PlusAcknowledgement),
    ConsoleMessage(ConsoleMessage),
    Spectate(Spectate),
    SpectateRequest(SpectateRequest),
    GameState(GameState),
    Latency(Latency),
    Ready(Ready),
    ResourceList(ResourceList),
    Ping(Ping),
    Pong(Pong),
    Query(Query),
    QueryReply(QueryReply),
    GameEvent(GameEvent),
    Heartbeat(Heartbeat),
    Password(Password),
    PasswordCheck(PasswordCheck),
}

macro_rules! for_each_variant {
    ($self:expr, $pkt:ident => $body:expr) => {
        match $self {
            Packet::ClientDisconnect($pkt) => $body,
            Packet::ClientDetails($pkt) => $body,
            Packet::JoinRequest($pkt) => $body,
            Packet::ServerDetails($pkt) => $body,
            Packet::PlayerList($pkt) => $body,
            Packet::GameInit($pkt) => $body,
            Packet::DownloadingFile($pkt) => $body,
            Packet::DownloadRequest($pkt) => $body,
            Packet::LevelLoad($pkt) => $body,
            Packet::EndOfLevel($pkt) => $body,
            Packet::UpdateEvents($pkt) => $body,
            Packet::ServerStopped($pkt) => $body,
            Packet::UpdateRequest($pkt) => $body,
            Packet::ChatMessage($pkt) => $body,
            Packet::PlusAcknowledgement($pkt) => $body,
            Packet::ConsoleMessage($pkt) => $body,
            Packet::Spectate($pkt) => $body,
            Packet::SpectateRequest($pkt) => $body,
            Packet::GameState($pkt) => $body,
            Packet::Latency($pkt) => $body,
            Packet::Ready($pkt) => $body,
            Packet::ResourceList($pkt) => $body,
            Packet::Ping($pkt) => $body,
            Packet::Pong($pkt) => $body,
            Packet::Query($pkt) => $body,
            Packet::QueryReply($pkt) => $body,
            Packet::GameEvent($pkt) => $body,
            Packet::Heartbeat($pkt) => $body,
            Packet::Password($pkt) => $body,
            Packet::PasswordCheck($pkt) => $body,
        }
    };
}

impl Packet {
    /// This packet's one-byte wire tag.
    pub fn tag(&self) -> u8 {
        for_each_variant!(self, p => <_ as TaggedVariant>::tag(p))
    }

    /// This packet's transport.
    pub fn transport(&self) -> Transport {
        for_each_variant!(self, p => <_ as TaggedVariant>::transport(p))
    }

    /// This packet's event name, used by the dispatcher's `lookup` table.
    pub fn event(&self) -> &'static str {
        for_each_variant!(self, p => <_ as TaggedVariant>::event(p))
    }

    /// Encode the full frame: tag byte followed by the body.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.extend_from_slice(&[self.tag()]);
        for_each_variant!(self, p => <_ as TaggedVariant>::encode_into(p, buf))
    }

    /// Decode a frame body (tag already consumed by the transport layer)
    /// given its tag, transport, and the current decode context.
    pub fn decode(tag: u8, transport: Transport, body: &[u8], ctx: &DecodeContext) -> Result<Self, CodecError> {
        let mut cursor = body;
        match (tag, transport) {
            (0x0D, Transport::Tcp) => Ok(Packet::ClientDisconnect(ClientDisconnect::decode_body(&mut cursor, ctx)?)),
            (0x0E, Transport::Tcp) => Ok(Packet::ClientDetails(ClientDetails::decode_body(&mut cursor, ctx)?)),
            (0x0F, Transport::Tcp) => Ok(Packet::JoinRequest(JoinRequest::decode_body(&mut cursor, ctx)?)),
            (0x10, Transport::Tcp) => Ok(Packet::ServerDetails(ServerDetails::decode_body(&mut cursor, ctx)?)),
            (0x12, Transport::Tcp) => Ok(Packet::PlayerList(PlayerList::decode_body(&mut cursor, ctx)?)),
            (0x13, Transport::Tcp) => Ok(Packet::GameInit(GameInit::decode_body(&mut cursor, ctx)?)),
            (0x14, Transport::Tcp) => Ok(Packet::DownloadingFile(DownloadingFile::decode_body(&mut cursor, ctx)?)),
            (0x15, Transport::Tcp) => Ok(Packet::DownloadRequest(DownloadRequest::decode_body(&mut cursor, ctx)?)),
            (0x16, Transport::Tcp) => Ok(Packet::LevelLoad(LevelLoad::decode_body(&mut cursor, ctx)?)),
            (0x17, Transport::Tcp) => Ok(Packet::EndOfLevel(EndOfLevel::decode_body(&mut cursor, ctx)?)),
            (0x18, Transport::Tcp) => Ok(Packet::UpdateEvents(UpdateEvents::decode_body(&mut cursor, ctx)?)),
            (0x19, Transport::Tcp) => Ok(Packet::ServerStopped(ServerStopped::decode_body(&mut cursor, ctx)?)),
            (0x1A, Transport::Tcp) => Ok(Packet::UpdateRequest(UpdateRequest::decode_body(&mut cursor, ctx)?)),
            (0x1B, Transport::Tcp) => Ok(Packet::ChatMessage(ChatMessage::decode_body(&mut cursor, ctx)?)),
            (0x3F, Transport::Tcp) => Ok(Packet::PlusAcknowledgement(PlusAcknowledgement::decode_body(&mut cursor, ctx)?)),
            (0x40, Transport::Tcp) => Ok(Packet::ConsoleMessage(ConsoleMessage::decode_body(&mut cursor, ctx)?)),
            (0x41, Transport::Tcp) => Ok(Packet::Spectate(Spectate::decode_body(&mut cursor, ctx)?)),
            (0x42, Transport::Tcp) => Ok(Packet::SpectateRequest(SpectateRequest::decode_body(&mut cursor, ctx)?)),
            (0x45, Transport::Tcp) => Ok(Packet::GameState(GameState::decode_body(&mut cursor, ctx)?)),
            (0x49, Transport::Tcp) => Ok(Packet::Latency(Latency::decode_body(&mut cursor, ctx)?)),
            (0x51, Transport::Tcp) => Ok(Packet::Ready(Ready::decode_body(&mut cursor, ctx)?)),
            (0x5A, Transport::Tcp) => Ok(Packet::ResourceList(ResourceList::decode_body(&mut cursor, ctx)?)),
            (0x03, Transport::Udp) => Ok(Packet::Ping(Ping::decode_body(&mut cursor, ctx)?)),
            (0x04, Transport::Udp) => Ok(Packet::Pong(Pong::decode_body(&mut cursor, ctx)?)),
            (0x05, Transport::Udp) => Ok(Packet::Query(Query::decode_body(&mut cursor, ctx)?)),
            (0x06, Transport::Udp) => Ok(Packet::QueryReply(QueryReply::decode_body(&mut cursor, ctx)?)),
            (0x07, Transport::Udp) => Ok(Packet::GameEvent(GameEvent::decode_body(&mut cursor, ctx)?)),
            (0x09, Transport::Udp) => Ok(Packet::Heartbeat(Heartbeat::decode_body(&mut cursor, ctx)?)),
            (0x0A, Transport::Udp) => Ok(Packet::Password(Password::decode_body(&mut cursor, ctx)?)),
            (0x0B, Transport::Udp) => Ok(Packet::PasswordCheck(PasswordCheck::decode_body(&mut cursor, ctx)?)),
            (other, _) => Err(CodecError::decode("dispatch", format!("unregistered packet tag {other:#04x}"))),
        }
    }
}

/// Implemented by every packet class via [`Payload`]; lets [`Packet`]
/// forward to the active variant without a per-variant match for each
/// operation.
trait TaggedVariant {
    fn tag(&self) -> u8;
    fn transport(&self) -> Transport;
    fn event(&self) -> &'static str;
    fn encode_into(&self, buf: &mut BytesMut) -> Result<(), CodecError>;
}

impl<T: Payload> TaggedVariant for T {
    fn tag(&self) -> u8 {
        T::TAG
    }

    fn transport(&self) -> Transport {
        T::TRANSPORT
    }

    fn event(&self) -> &'static str {
        T::EVENT
    }

    fn encode_into(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.encode_body(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_round_trips_through_tag_dispatch() {
        let packet = Packet::Ping(Ping::new(1, [0; 4], MajorVersionString::V124));
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(buf[0], 0x03);
        let ctx = DecodeContext::default();
        let decoded = Packet::decode(buf[0], Transport::Udp, &buf[1..], &ctx).unwrap();
        assert_eq!(packet, decoded);
    }

    #[test]
    fn downloading_file_decode_honors_context() {
        let packet = Packet::DownloadingFile(DownloadingFile::Chunk(DownloadingFileChunk {
            packet_count: 1,
            file_content: vec![1, 2, 3],
        }));
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let ctx = DecodeContext { is_downloading: false, from_server: true };
        let decoded = Packet::decode(buf[0], Transport::Tcp, &buf[1..], &ctx).unwrap();
        assert_eq!(packet, decoded);
    }

    #[test]
    fn unregistered_tag_is_a_decode_error() {
        let ctx = DecodeContext::default();
        assert!(Packet::decode(0xFF, Transport::Tcp, &[], &ctx).is_err());
    }
}
