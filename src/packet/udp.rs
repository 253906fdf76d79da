//! UDP-only packets: pings, queries, the heartbeat, and the (disabled by
//! default) password exchange.

use crate::codec::primitives;
use crate::error::CodecError;
use crate::packet::enums::{GameMode, MajorVersionString};
use bytes::{Buf, BufMut};
use derive_new::new;
use getset::{CopyGetters, Getters};

/// Client-to-server liveness probe.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct Ping {
    #[getset(get_copy = "pub")]
    number_in_list: u8,
    #[getset(get = "pub")]
    unknown_data: [u8; 4],
    #[getset(get_copy = "pub")]
    client_version: MajorVersionString,
}

impl Ping {
    pub const EVENT: &'static str = "ping";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Ping {
            number_in_list: primitives::read_u8(buf, Self::EVENT)?,
            unknown_data: primitives::read_array::<4>(buf, Self::EVENT)?,
            client_version: MajorVersionString::decode(buf, Self::EVENT)?,
        })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.number_in_list);
        buf.put_slice(&self.unknown_data);
        self.client_version.encode(buf, Self::EVENT)
    }
}

/// Server-to-client reply to [`Ping`].
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct Pong {
    #[getset(get_copy = "pub")]
    number_in_list_from_ping: u8,
    #[getset(get = "pub")]
    unknown_data: [u8; 4],
    #[getset(get_copy = "pub")]
    game_mode_etc: u8,
}

impl Pong {
    pub const EVENT: &'static str = "pong";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Pong {
            number_in_list_from_ping: primitives::read_u8(buf, Self::EVENT)?,
            unknown_data: primitives::read_array::<4>(buf, Self::EVENT)?,
            game_mode_etc: primitives::read_u8(buf, Self::EVENT)?,
        })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.number_in_list_from_ping);
        buf.put_slice(&self.unknown_data);
        buf.put_u8(self.game_mode_etc);
        Ok(())
    }
}

/// Server-list broadcast query.
#[derive(new, Debug, Clone, PartialEq, CopyGetters)]
pub struct Query {
    #[getset(get_copy = "pub")]
    number_in_list: u8,
}

impl Query {
    pub const EVENT: &'static str = "query";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Query { number_in_list: primitives::read_u8(buf, Self::EVENT)? })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.number_in_list);
        Ok(())
    }
}

/// Reply to [`Query`] carrying server-list details.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct QueryReply {
    #[getset(get_copy = "pub")]
    number_in_list: u8,
    #[getset(get_copy = "pub")]
    timer_sync: u8,
    #[getset(get_copy = "pub")]
    laps_on_timer_sync: u8,
    #[getset(get = "pub")]
    unknown_data_1: [u8; 2],
    #[getset(get_copy = "pub")]
    client_version: MajorVersionString,
    #[getset(get_copy = "pub")]
    player_count: u8,
    #[getset(get_copy = "pub")]
    unknown_data_2: u8,
    #[getset(get_copy = "pub")]
    game_mode: GameMode,
    #[getset(get_copy = "pub")]
    player_limit: u8,
    #[getset(get = "pub")]
    server_name: String,
    #[getset(get_copy = "pub")]
    unknown_data_3: u8,
}

impl QueryReply {
    pub const EVENT: &'static str = "query_reply";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(QueryReply {
            number_in_list: primitives::read_u8(buf, Self::EVENT)?,
            timer_sync: primitives::read_u8(buf, Self::EVENT)?,
            laps_on_timer_sync: primitives::read_u8(buf, Self::EVENT)?,
            unknown_data_1: primitives::read_array::<2>(buf, Self::EVENT)?,
            client_version: MajorVersionString::decode(buf, Self::EVENT)?,
            player_count: primitives::read_u8(buf, Self::EVENT)?,
            unknown_data_2: primitives::read_u8(buf, Self::EVENT)?,
            game_mode: GameMode::from_byte(primitives::read_u8(buf, Self::EVENT)?)
                .map_err(|b| CodecError::decode(Self::EVENT, format!("unknown game mode {b}")))?,
            player_limit: primitives::read_u8(buf, Self::EVENT)?,
            server_name: primitives::read_pstring(buf, Self::EVENT)?,
            unknown_data_3: primitives::read_u8(buf, Self::EVENT)?,
        })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.number_in_list);
        buf.put_u8(self.timer_sync);
        buf.put_u8(self.laps_on_timer_sync);
        buf.put_slice(&self.unknown_data_1);
        self.client_version.encode(buf, Self::EVENT)?;
        buf.put_u8(self.player_count);
        buf.put_u8(self.unknown_data_2);
        buf.put_u8(self.game_mode.to_byte());
        buf.put_u8(self.player_limit);
        primitives::write_pstring(buf, &self.server_name, Self::EVENT)?;
        buf.put_u8(self.unknown_data_3);
        Ok(())
    }
}

/// An in-game event notification (e.g. a kill, a pickup).
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct GameEvent {
    #[getset(get_copy = "pub")]
    udp_count: u8,
    #[getset(get_copy = "pub")]
    event_id: u8,
    #[getset(get = "pub")]
    event_data: Vec<u8>,
}

impl GameEvent {
    pub const EVENT: &'static str = "game_event";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(GameEvent {
            udp_count: primitives::read_u8(buf, Self::EVENT)?,
            event_id: primitives::read_u8(buf, Self::EVENT)?,
            event_data: primitives::read_greedy(buf),
        })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.udp_count);
        buf.put_u8(self.event_id);
        buf.put_slice(&self.event_data);
        Ok(())
    }
}

/// Periodic keep-alive exchanged over UDP.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct Heartbeat {
    #[getset(get_copy = "pub")]
    udp_count: u8,
    #[getset(get = "pub")]
    send_back: Vec<u8>,
}

impl Heartbeat {
    pub const EVENT: &'static str = "heartbeat";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Heartbeat {
            udp_count: primitives::read_u8(buf, Self::EVENT)?,
            send_back: primitives::read_greedy(buf),
        })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.udp_count);
        buf.put_slice(&self.send_back);
        Ok(())
    }
}

/// Password offered by a client joining a protected server.
///
/// Registered only when [`crate::config::SessionConfig::passwords`] is set;
/// see §1 Non-goals ("no password flow (gated off by default)").
#[derive(new, Debug, Clone, PartialEq, Getters)]
pub struct Password {
    #[getset(get = "pub")]
    password: String,
}

impl Password {
    pub const EVENT: &'static str = "password";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Password { password: primitives::read_pstring(buf, Self::EVENT)? })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        primitives::write_pstring(buf, &self.password, Self::EVENT)
    }
}

/// Server's verdict on a submitted [`Password`].
#[derive(new, Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct PasswordCheck {
    #[getset(get_copy = "pub")]
    password_ok: u8,
}

impl PasswordCheck {
    pub const EVENT: &'static str = "password_check";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(PasswordCheck { password_ok: primitives::read_u8(buf, Self::EVENT)? })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.password_ok);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn ping_round_trips() {
        let ping = Ping::new(1, [0, 0, 0, 0], MajorVersionString::V124);
        let mut buf = BytesMut::new();
        ping.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(ping, Ping::decode(&mut cursor).unwrap());
    }

    #[test]
    fn query_reply_round_trips() {
        let reply = QueryReply::new(
            1, 0, 0, [0, 0], MajorVersionString::V124, 4, 0, GameMode::Ctf, 16,
            "Deathpit".to_string(), 0,
        );
        let mut buf = BytesMut::new();
        reply.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(reply, QueryReply::decode(&mut cursor).unwrap());
    }

    #[test]
    fn heartbeat_round_trips() {
        let heartbeat = Heartbeat::new(1, vec![0, 0, 0]);
        let mut buf = BytesMut::new();
        heartbeat.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(heartbeat, Heartbeat::decode(&mut cursor).unwrap());
    }
}
