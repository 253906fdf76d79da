//! The default bot sub-protocol: the minimum packet traffic required to
//! remain connected as a spectator-style participant (§2.7, §4.6).
//!
//! Reacts to `ServerDetails`, `Heartbeat`/`ResourceList`, `PlusDetails`,
//! and the level-ready trio `LevelLoad`/`Ready`/`GameInit`, each with a
//! canned reply built from the current session. Registered as a child of
//! the top-level dispatcher, gated on [`SessionConfig::bot`].

use crate::config::SessionConfig;
use crate::dispatch::{Condition, Dispatcher, DispatcherBuilder, Handler, HandlerValue, Priority};
use crate::error::ProtocolError;
use crate::packet::{ClientDetails, Heartbeat, Packet, PlusAcknowledgement, PlusRequest, ServerDetails, ToPayloadData, UpdateRequest};
use crate::session::Session;

fn bot_enabled(config: &SessionConfig) -> bool {
    config.bot
}

fn reply_to_server_details_with_heartbeat(session: &mut Session, packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    if !matches!(packet, Packet::ServerDetails(_)) {
        unreachable!("registered only for ServerDetails");
    }
    Ok(HandlerValue::Outbound(Packet::Heartbeat(Heartbeat::new(0, session.heartbeat_cookie.to_vec()))))
}

fn reply_to_server_details_with_plus_request(_session: &mut Session, _packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    Ok(HandlerValue::Outbound(Packet::PlusAcknowledgement(PlusAcknowledgement::Request(PlusRequest::latest()))))
}

fn echo_heartbeat(session: &mut Session, packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    if !matches!(packet, Packet::Heartbeat(_) | Packet::ResourceList(_)) {
        unreachable!("registered only for Heartbeat/ResourceList");
    }
    Ok(HandlerValue::Outbound(Packet::Heartbeat(Heartbeat::new(session.heartbeat_latency, session.heartbeat_cookie.to_vec()))))
}

fn introduce_players_on_plus_details(session: &mut Session, packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    if session.introduced {
        return Ok(HandlerValue::None);
    }
    if !matches!(packet, Packet::PlusAcknowledgement(PlusAcknowledgement::Details(_))) {
        unreachable!("registered only for PlusAcknowledgement");
    }
    let client_id = session.client_id;
    let players = session
        .local_players
        .iter()
        .enumerate()
        .map(|(index, player)| {
            let with_id = if index == 0 { client_id } else { None };
            player.to_payload_data(with_id)
        })
        .collect();
    session.introduced = true;
    Ok(HandlerValue::Outbound(Packet::ClientDetails(ClientDetails::new(client_id.unwrap_or(0), players))))
}

fn request_update_on_level_ready(session: &mut Session, _packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    Ok(HandlerValue::Outbound(Packet::UpdateRequest(UpdateRequest::new(session.level_challenge))))
}

const TAG_SERVER_DETAILS: u8 = 0x10;
const TAG_HEARTBEAT: u8 = 0x09;
const TAG_RESOURCE_LIST: u8 = 0x5A;
const TAG_PLUS_ACK: u8 = 0x3F;
const TAG_LEVEL_LOAD: u8 = 0x16;
const TAG_READY: u8 = 0x51;
const TAG_GAME_INIT: u8 = 0x13;

/// Build the bot's handler registrations. Added as a child of the
/// top-level dispatcher via [`crate::dispatch::DispatcherBuilder::child`].
pub fn build() -> DispatcherBuilder<Session> {
    fn gate() -> Option<Condition<Session>> {
        Some(Condition::configured(bot_enabled))
    }

    DispatcherBuilder::new()
        .handles(TAG_SERVER_DETAILS, gate())
        .handles(TAG_HEARTBEAT, gate())
        .handles(TAG_RESOURCE_LIST, gate())
        .handles(TAG_PLUS_ACK, gate())
        .handles(TAG_LEVEL_LOAD, gate())
        .handles(TAG_READY, gate())
        .handles(TAG_GAME_INIT, gate())
        .on(
            TAG_SERVER_DETAILS,
            Handler::new(Priority::Important, gate(), false, Some(TAG_HEARTBEAT), Box::new(reply_to_server_details_with_heartbeat)),
        )
        .on(
            TAG_SERVER_DETAILS,
            Handler::new(Priority::Important, gate(), false, Some(TAG_PLUS_ACK), Box::new(reply_to_server_details_with_plus_request)),
        )
        .on(TAG_HEARTBEAT, Handler::new(Priority::Important, gate(), false, Some(TAG_HEARTBEAT), Box::new(echo_heartbeat)))
        .on(TAG_RESOURCE_LIST, Handler::new(Priority::Important, gate(), false, Some(TAG_HEARTBEAT), Box::new(echo_heartbeat)))
        .on(
            TAG_PLUS_ACK,
            Handler::new(Priority::Important, gate(), false, Some(0x0E), Box::new(introduce_players_on_plus_details)),
        )
        .on(
            TAG_LEVEL_LOAD,
            Handler::new(Priority::Important, gate(), false, Some(TAG_LEVEL_LOAD), Box::new(request_update_on_level_ready)),
        )
        .on(
            TAG_READY,
            Handler::new(Priority::Important, gate(), false, Some(TAG_LEVEL_LOAD), Box::new(request_update_on_level_ready)),
        )
        .on(
            TAG_GAME_INIT,
            Handler::new(Priority::Important, gate(), false, Some(TAG_LEVEL_LOAD), Box::new(request_update_on_level_ready)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{Character, GameMode, Team};

    fn configured(bot: bool) -> Dispatcher<Session> {
        let config = SessionConfig { bot, ..SessionConfig::default() };
        build().configure(&config)
    }

    #[test]
    fn server_details_produces_heartbeat_and_plus_request() {
        let dispatcher = configured(true);
        let mut session = Session::new(Vec::new());
        let packet = Packet::ServerDetails(ServerDetails::new_for_test());
        let results = dispatcher.handle(&mut session, &packet);
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|v| matches!(v, HandlerValue::Outbound(Packet::Heartbeat(_)))));
        assert!(results.iter().any(|v| matches!(v, HandlerValue::Outbound(Packet::PlusAcknowledgement(_)))));
    }

    #[test]
    fn disabled_bot_produces_nothing() {
        let dispatcher = configured(false);
        let mut session = Session::new(Vec::new());
        let packet = Packet::ServerDetails(ServerDetails::new_for_test());
        let results = dispatcher.handle(&mut session, &packet);
        assert!(results.is_empty());
    }

    #[test]
    fn plus_details_introduces_players_once() {
        let dispatcher = configured(true);
        let local = crate::packet::LocalPlayer::new(0, Team::Blue, Character::Jazz, [0; 4], "Jazz".to_string());
        let mut session = Session::new(vec![local]);
        session.client_id = Some(4);
        let packet = Packet::PlusAcknowledgement(PlusAcknowledgement::Details(crate::packet::PlusDetails::new(0, 100, crate::packet::PlusRules::empty())));
        let first = dispatcher.handle(&mut session, &packet);
        assert_eq!(first.len(), 1);
        assert!(matches!(first[0], HandlerValue::Outbound(Packet::ClientDetails(_))));

        let second = dispatcher.handle(&mut session, &packet);
        assert_eq!(second, vec![HandlerValue::None]);
    }

    impl ServerDetails {
        fn new_for_test() -> Self {
            use bytes::{BufMut, BytesMut};
            let mut buf = BytesMut::new();
            buf.put_u8(1); // client_id
            buf.put_u8(0); // player_id
            crate::codec::primitives::write_pstring(&mut buf, "castle1.j2l", "test").unwrap();
            buf.put_u32_le(1);
            buf.put_u32_le(2);
            buf.put_u8(GameMode::Ctf.to_byte());
            buf.put_u8(5);
            let mut cursor = &buf[..];
            ServerDetails::decode(&mut cursor).unwrap()
        }
    }
}
