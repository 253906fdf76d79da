//! Root-level session mirroring (§4.6): URGENT-priority handlers that copy
//! server-reported state into [`Session`] ahead of every other dispatcher,
//! so the bot sub-protocol (and any caller-registered child) always sees an
//! up-to-date session by the time its own handlers run.

use crate::config::SessionConfig;
use crate::dispatch::{Condition, Dispatcher, DispatcherBuilder, Handler, HandlerValue, Priority};
use crate::error::ProtocolError;
use crate::packet::Packet;
use crate::session::{Session, SessionValue};
use rand::Rng;

const TAG_CLIENT_DISCONNECT: u8 = 0x0D;
const TAG_SERVER_DETAILS: u8 = 0x10;
const TAG_LEVEL_LOAD: u8 = 0x16;
const TAG_HEARTBEAT: u8 = 0x09;
const TAG_RESOURCE_LIST: u8 = 0x5A;
const TAG_PASSWORD: u8 = 0x0A;
const TAG_PASSWORD_CHECK: u8 = 0x0B;

fn notice_players(config: &SessionConfig) -> bool {
    config.notice_players
}

fn passwords(config: &SessionConfig) -> bool {
    config.passwords
}

fn mirror_server_details(session: &mut Session, packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    let details = match packet {
        Packet::ServerDetails(details) => details,
        _ => unreachable!("registered only for ServerDetails"),
    };
    session.client_id = Some(details.client_id());
    session.server.level_file_name = details.level_file_name().clone();
    session.server.level_crc = details.level_crc();
    session.server.tileset_crc = details.tileset_crc();
    session.server.game_mode = Some(details.game_mode());
    session.server.max_score = details.max_score();
    if let Some(extras) = details.extras() {
        session.level_challenge = *extras.level_challenge();
        session.heartbeat_cookie = *extras.keep_alive_data();
    }
    Ok(HandlerValue::None)
}

fn mirror_level_load(session: &mut Session, packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    let level_load = match packet {
        Packet::LevelLoad(level_load) => level_load,
        _ => unreachable!("registered only for LevelLoad"),
    };
    session.level_file_name = level_load.level_file_name().clone();
    session.level_challenge = *level_load.level_challenge();
    Ok(HandlerValue::None)
}

fn mirror_resource_list(session: &mut Session, packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    let resources = match packet {
        Packet::ResourceList(resources) => resources,
        _ => unreachable!("registered only for ResourceList"),
    };
    session.level_challenge = resources.level_challenge;
    Ok(HandlerValue::None)
}

fn mirror_heartbeat(session: &mut Session, packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    let heartbeat = match packet {
        Packet::Heartbeat(heartbeat) => heartbeat,
        _ => unreachable!("registered only for Heartbeat"),
    };
    session.set_extra("last_heartbeat_count", SessionValue::Int(heartbeat.udp_count() as i64));

    let current = session.heartbeat_latency as u32;
    let randomized = rand::thread_rng().gen_range(current + 1..=current + 20);
    session.heartbeat_latency = randomized.min(255) as u8;

    let send_back = heartbeat.send_back();
    let mut cookie = [0u8; 4];
    let copy_len = send_back.len().min(4);
    cookie[..copy_len].copy_from_slice(&send_back[..copy_len]);
    session.heartbeat_cookie = cookie;

    Ok(HandlerValue::None)
}

fn mirror_client_disconnect(session: &mut Session, packet: &Packet, _previous: Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> {
    let disconnect = match packet {
        Packet::ClientDisconnect(disconnect) => disconnect,
        _ => unreachable!("registered only for ClientDisconnect"),
    };
    if disconnect.is_connection_drop() {
        session.introduced = false;
    }
    Ok(HandlerValue::None)
}

/// Build the root dispatcher's session-mirroring registrations. Attach any
/// caller-defined or bot children via [`crate::dispatch::DispatcherBuilder::child`]
/// before calling [`crate::dispatch::DispatcherBuilder::configure`].
pub fn build() -> DispatcherBuilder<Session> {
    DispatcherBuilder::new()
        .handles(TAG_SERVER_DETAILS, None)
        .handles(TAG_LEVEL_LOAD, None)
        .handles(TAG_HEARTBEAT, None)
        .handles(TAG_RESOURCE_LIST, None)
        .handles(TAG_CLIENT_DISCONNECT, Some(Condition::configured(notice_players)))
        .handles(TAG_PASSWORD, Some(Condition::configured(passwords)))
        .handles(TAG_PASSWORD_CHECK, Some(Condition::configured(passwords)))
        .on(TAG_SERVER_DETAILS, Handler::new(Priority::Urgent, None, false, None, Box::new(mirror_server_details)))
        .on(TAG_LEVEL_LOAD, Handler::new(Priority::Urgent, None, false, None, Box::new(mirror_level_load)))
        .on(TAG_RESOURCE_LIST, Handler::new(Priority::Urgent, None, false, None, Box::new(mirror_resource_list)))
        .on(TAG_HEARTBEAT, Handler::new(Priority::Urgent, None, false, None, Box::new(mirror_heartbeat)))
        .on(
            TAG_CLIENT_DISCONNECT,
            Handler::new(Priority::Urgent, Some(Condition::configured(notice_players)), false, None, Box::new(mirror_client_disconnect)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{ClientDisconnect, GameMode, LevelLoad, MajorVersionString, ServerDetails};

    fn configured() -> Dispatcher<Session> {
        build().configure(&SessionConfig::default())
    }

    fn sample_server_details() -> ServerDetails {
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

    fn sample_server_details_with_extras() -> ServerDetails {
        use bytes::{BufMut, BytesMut};
        let mut buf = BytesMut::new();
        buf.put_u8(1); // client_id
        buf.put_u8(0); // player_id
        crate::codec::primitives::write_pstring(&mut buf, "castle1.j2l", "test").unwrap();
        buf.put_u32_le(1);
        buf.put_u32_le(2);
        buf.put_u8(GameMode::Ctf.to_byte());
        buf.put_u8(5);
        buf.put_slice(&[1, 2, 3, 4]); // level_challenge
        buf.put_slice(&[5, 6, 7, 8]); // keep_alive_data (heartbeat cookie)
        buf.put_u16_le(509);
        buf.put_u16_le(0);
        buf.put_u8(0); // no music crc
        buf.put_u8(0); // no scripts switch
        let mut cursor = &buf[..];
        ServerDetails::decode(&mut cursor).unwrap()
    }

    #[test]
    fn server_details_mirrors_into_session() {
        let dispatcher = configured();
        let mut session = Session::new(Vec::new());
        let packet = Packet::ServerDetails(sample_server_details());
        let results = dispatcher.handle(&mut session, &packet);
        assert_eq!(results, vec![HandlerValue::None]);
        assert_eq!(session.client_id, Some(1));
        assert_eq!(session.server.game_mode, Some(GameMode::Ctf));
    }

    #[test]
    fn server_details_extras_mirror_level_challenge_and_heartbeat_cookie() {
        let dispatcher = configured();
        let mut session = Session::new(Vec::new());
        let packet = Packet::ServerDetails(sample_server_details_with_extras());
        dispatcher.handle(&mut session, &packet);
        assert_eq!(session.level_challenge, [1, 2, 3, 4]);
        assert_eq!(session.heartbeat_cookie, [5, 6, 7, 8]);
    }

    #[test]
    fn heartbeat_randomizes_latency_within_expected_range_and_stores_cookie() {
        let dispatcher = configured();
        let mut session = Session::new(Vec::new());
        session.heartbeat_latency = 10;
        let packet = Packet::Heartbeat(crate::packet::Heartbeat::new(3, vec![9, 9, 9, 9]));
        dispatcher.handle(&mut session, &packet);
        assert!((11..=30).contains(&session.heartbeat_latency));
        assert_eq!(session.heartbeat_cookie, [9, 9, 9, 9]);
    }

    #[test]
    fn heartbeat_randomized_latency_never_exceeds_255() {
        let dispatcher = configured();
        let mut session = Session::new(Vec::new());
        session.heartbeat_latency = 250;
        let packet = Packet::Heartbeat(crate::packet::Heartbeat::new(0, vec![]));
        dispatcher.handle(&mut session, &packet);
        assert!(session.heartbeat_latency <= 255);
    }

    #[test]
    fn password_tags_are_unregistered_by_default() {
        let dispatcher = configured();
        assert!(!dispatcher.is_registered(TAG_PASSWORD));
        assert!(!dispatcher.is_registered(TAG_PASSWORD_CHECK));
    }

    #[test]
    fn password_tags_are_registered_when_enabled() {
        let config = SessionConfig { passwords: true, ..SessionConfig::default() };
        let dispatcher = build().configure(&config);
        assert!(dispatcher.is_registered(TAG_PASSWORD));
        assert!(dispatcher.is_registered(TAG_PASSWORD_CHECK));
    }

    #[test]
    fn level_load_mirrors_level_challenge() {
        let dispatcher = configured();
        let mut session = Session::new(Vec::new());
        let packet = Packet::LevelLoad(LevelLoad::new(1, 2, "castle1.j2l".to_string(), [9, 9, 9, 9], 0, 0, [0; 4], None));
        dispatcher.handle(&mut session, &packet);
        assert_eq!(session.level_challenge, [9, 9, 9, 9]);
        assert_eq!(session.level_file_name, "castle1.j2l");
    }

    #[test]
    fn connection_drop_resets_introduced_flag() {
        let dispatcher = configured();
        let mut session = Session::new(Vec::new());
        session.introduced = true;
        let packet = Packet::ClientDisconnect(ClientDisconnect::new(0, -1, MajorVersionString::V124, None));
        dispatcher.handle(&mut session, &packet);
        assert!(!session.introduced);
    }

    #[test]
    fn client_disconnect_is_not_mirrored_when_notice_players_disabled() {
        let config = SessionConfig { notice_players: false, ..SessionConfig::default() };
        let dispatcher = build().configure(&config);
        let mut session = Session::new(Vec::new());
        session.introduced = true;
        let packet = Packet::ClientDisconnect(ClientDisconnect::new(0, -1, MajorVersionString::V124, None));
        dispatcher.handle(&mut session, &packet);
        assert!(session.introduced);
    }
}
