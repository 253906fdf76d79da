//! Packets that carry session handshake and roster information:
//! `ClientDisconnect`, `ClientDetails`, `JoinRequest`, `ServerDetails`,
//! `PlayerList`.

use crate::codec::primitives;
use crate::error::CodecError;
use crate::packet::enums::{GameMode, MajorVersionString};
use crate::packet::player::PlayerFields;
use bytes::{Buf, BufMut};
use derive_new::new;
use getset::{CopyGetters, Getters};

/// Sent by either side to close the connection, optionally with a reason.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct ClientDisconnect {
    #[getset(get_copy = "pub")]
    disconnect_message: u8,
    /// `-1` (`0xFF` as `i8`) when the server drops the whole connection.
    #[getset(get_copy = "pub")]
    client_id: i8,
    #[getset(get_copy = "pub")]
    client_version: MajorVersionString,
    #[getset(get = "pub")]
    reason: Option<String>,
}

impl ClientDisconnect {
    pub const EVENT: &'static str = "disconnect";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let disconnect_message = primitives::read_u8(buf, Self::EVENT)?;
        let client_id = primitives::read_u8(buf, Self::EVENT)? as i8;
        let client_version = MajorVersionString::decode(buf, Self::EVENT)?;
        let include_reason = if buf.has_remaining() { Some(primitives::read_u8(buf, Self::EVENT)?) } else { None };
        let reason = match include_reason {
            Some(flag) if flag != 0 => Some(primitives::read_pstring(buf, Self::EVENT)?),
            _ => None,
        };
        Ok(ClientDisconnect { disconnect_message, client_id, client_version, reason })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.disconnect_message);
        buf.put_i8(self.client_id);
        self.client_version.encode(buf, Self::EVENT)?;
        buf.put_u8(self.reason.is_some() as u8);
        if let Some(reason) = &self.reason {
            primitives::write_pstring(buf, reason, Self::EVENT)?;
        }
        Ok(())
    }

    /// Whether this disconnect tears down the whole connection rather than
    /// dropping a single remote player (§4.6).
    pub fn is_connection_drop(&self) -> bool {
        self.client_id == -1
    }
}

/// Sent by the client to announce its local players.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct ClientDetails {
    #[getset(get_copy = "pub")]
    client_id: u8,
    #[getset(get = "pub")]
    players: Vec<PlayerFields>,
}

impl ClientDetails {
    pub const EVENT: &'static str = "client_details";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let client_id = primitives::read_u8(buf, Self::EVENT)?;
        let count = primitives::read_u8(buf, Self::EVENT)? as usize;
        let mut players = Vec::with_capacity(count);
        for _ in 0..count {
            players.push(PlayerFields::decode(buf, false, Self::EVENT)?);
        }
        Ok(ClientDetails { client_id, players })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.client_id);
        if self.players.len() > u8::MAX as usize {
            return Err(CodecError::encode(Self::EVENT, "too many players for a one-byte count"));
        }
        buf.put_u8(self.players.len() as u8);
        for player in &self.players {
            player.encode(buf, false, Self::EVENT)?;
        }
        Ok(())
    }
}

/// First packet a client sends to request joining a server.
#[derive(new, Debug, Clone, PartialEq, CopyGetters)]
pub struct JoinRequest {
    #[getset(get_copy = "pub")]
    udp_bind: u16,
    #[getset(get_copy = "pub")]
    client_version: MajorVersionString,
    #[getset(get_copy = "pub")]
    number_of_players_from_client: u8,
}

impl Default for JoinRequest {
    fn default() -> Self {
        JoinRequest { udp_bind: 10052, client_version: MajorVersionString::V124, number_of_players_from_client: 1 }
    }
}

impl JoinRequest {
    pub const EVENT: &'static str = "join_request";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(JoinRequest {
            udp_bind: buf_get_u16_le(buf, Self::EVENT)?,
            client_version: MajorVersionString::decode(buf, Self::EVENT)?,
            number_of_players_from_client: primitives::read_u8(buf, Self::EVENT)?,
        })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u16_le(self.udp_bind);
        self.client_version.encode(buf, Self::EVENT)?;
        buf.put_u8(self.number_of_players_from_client);
        Ok(())
    }
}

/// Optional JJ2+-only suffix of [`ServerDetails`].
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct ServerDetailsExtras {
    #[getset(get = "pub")]
    level_challenge: [u8; 4],
    #[getset(get = "pub")]
    keep_alive_data: [u8; 4],
    #[getset(get = "pub")]
    plus_version: [u16; 2],
    #[getset(get = "pub")]
    music_crc: Option<Vec<u8>>,
    #[getset(get = "pub")]
    scripts: Option<ScriptsSwitch>,
}

/// The `scripts` switch inside [`ServerDetailsExtras`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptsSwitch {
    ScriptCrc([u8; 4]),
    FileCounts { total: u8, required: u8, optional: u8 },
}

impl ServerDetailsExtras {
    fn decode(buf: &mut impl Buf, event: &'static str) -> Result<Self, CodecError> {
        let level_challenge = primitives::read_array::<4>(buf, event)?;
        let keep_alive_data = primitives::read_array::<4>(buf, event)?;
        let plus_version = [buf_get_u16_le(buf, event)?, buf_get_u16_le(buf, event)?];
        let music_selector = primitives::read_u8(buf, event)?;
        let music_crc = match music_selector {
            0 => None,
            1 => {
                let count = primitives::read_u8(buf, event)? as usize;
                Some(primitives::read_n(buf, count, event)?)
            }
            other => return Err(CodecError::decode(event, format!("unknown music switch {other}"))),
        };
        let scripts_selector = primitives::read_u8(buf, event)?;
        let scripts = match scripts_selector {
            0 => None,
            1 => Some(ScriptsSwitch::ScriptCrc(primitives::read_array::<4>(buf, event)?)),
            2 => Some(ScriptsSwitch::FileCounts {
                total: primitives::read_u8(buf, event)?,
                required: primitives::read_u8(buf, event)?,
                optional: primitives::read_u8(buf, event)?,
            }),
            other => return Err(CodecError::decode(event, format!("unknown scripts switch {other}"))),
        };
        Ok(ServerDetailsExtras { level_challenge, keep_alive_data, plus_version, music_crc, scripts })
    }

    fn encode(&self, buf: &mut impl BufMut, event: &'static str) -> Result<(), CodecError> {
        buf.put_slice(&self.level_challenge);
        buf.put_slice(&self.keep_alive_data);
        buf.put_u16_le(self.plus_version[0]);
        buf.put_u16_le(self.plus_version[1]);
        match &self.music_crc {
            None => buf.put_u8(0),
            Some(bytes) => {
                buf.put_u8(1);
                if bytes.len() > u8::MAX as usize {
                    return Err(CodecError::encode(event, "music crc too long"));
                }
                buf.put_u8(bytes.len() as u8);
                buf.put_slice(bytes);
            }
        }
        match &self.scripts {
            None => buf.put_u8(0),
            Some(ScriptsSwitch::ScriptCrc(crc)) => {
                buf.put_u8(1);
                buf.put_slice(crc);
            }
            Some(ScriptsSwitch::FileCounts { total, required, optional }) => {
                buf.put_u8(2);
                buf.put_u8(*total);
                buf.put_u8(*required);
                buf.put_u8(*optional);
            }
        }
        Ok(())
    }
}

/// Sent by the server once a client has joined, describing the session.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct ServerDetails {
    #[getset(get_copy = "pub")]
    client_id: u8,
    #[getset(get_copy = "pub")]
    player_id: u8,
    #[getset(get = "pub")]
    level_file_name: String,
    #[getset(get_copy = "pub")]
    level_crc: u32,
    #[getset(get_copy = "pub")]
    tileset_crc: u32,
    #[getset(get_copy = "pub")]
    game_mode: GameMode,
    #[getset(get_copy = "pub")]
    max_score: u8,
    #[getset(get = "pub")]
    extras: Option<ServerDetailsExtras>,
}

impl ServerDetails {
    pub const EVENT: &'static str = "server_details";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let client_id = primitives::read_u8(buf, Self::EVENT)?;
        let player_id = primitives::read_u8(buf, Self::EVENT)?;
        let level_file_name = primitives::read_pstring(buf, Self::EVENT)?;
        let level_crc = buf_get_u32_le(buf, Self::EVENT)?;
        let tileset_crc = buf_get_u32_le(buf, Self::EVENT)?;
        let game_mode = GameMode::from_byte(primitives::read_u8(buf, Self::EVENT)?)
            .map_err(|b| CodecError::decode(Self::EVENT, format!("unknown game mode {b}")))?;
        let max_score = primitives::read_u8(buf, Self::EVENT)?;
        let extras = if buf.has_remaining() {
            Some(ServerDetailsExtras::decode(buf, Self::EVENT)?)
        } else {
            None
        };
        Ok(ServerDetails { client_id, player_id, level_file_name, level_crc, tileset_crc, game_mode, max_score, extras })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.client_id);
        buf.put_u8(self.player_id);
        primitives::write_pstring(buf, &self.level_file_name, Self::EVENT)?;
        buf.put_u32_le(self.level_crc);
        buf.put_u32_le(self.tileset_crc);
        buf.put_u8(self.game_mode.to_byte());
        buf.put_u8(self.max_score);
        if let Some(extras) = &self.extras {
            extras.encode(buf, Self::EVENT)?;
        }
        Ok(())
    }
}

/// Server broadcast of the current full player roster.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct PlayerList {
    #[getset(get_copy = "pub")]
    junk: u8,
    #[getset(get = "pub")]
    players: Vec<PlayerFields>,
}

impl PlayerList {
    pub const EVENT: &'static str = "players";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let junk = primitives::read_u8(buf, Self::EVENT)?;
        let mut players = Vec::new();
        while buf.has_remaining() {
            players.push(PlayerFields::decode(buf, true, Self::EVENT)?);
        }
        Ok(PlayerList { junk, players })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.junk);
        for player in &self.players {
            player.encode(buf, true, Self::EVENT)?;
        }
        Ok(())
    }
}

fn buf_get_u16_le(buf: &mut impl Buf, event: &'static str) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::decode(event, "unexpected end of frame"));
    }
    Ok(buf.get_u16_le())
}

fn buf_get_u32_le(buf: &mut impl Buf, event: &'static str) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::decode(event, "unexpected end of frame"));
    }
    Ok(buf.get_u32_le())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn client_disconnect_without_reason_round_trips() {
        let packet = ClientDisconnect::new(7, 3, MajorVersionString::V124, None);
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, ClientDisconnect::decode(&mut cursor).unwrap());
    }

    #[test]
    fn client_disconnect_with_reason_round_trips() {
        let packet = ClientDisconnect::new(1, -1, MajorVersionString::V124, Some("banned".to_string()));
        assert!(packet.is_connection_drop());
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, ClientDisconnect::decode(&mut cursor).unwrap());
    }

    #[test]
    fn server_details_without_extras_round_trips() {
        let packet = ServerDetails {
            client_id: 1,
            player_id: 0,
            level_file_name: "castle1.j2l".to_string(),
            level_crc: 0xDEADBEEF,
            tileset_crc: 0xC0FFEE,
            game_mode: GameMode::Ctf,
            max_score: 5,
            extras: None,
        };
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, ServerDetails::decode(&mut cursor).unwrap());
    }

    #[test]
    fn server_details_with_extras_round_trips() {
        let packet = ServerDetails {
            client_id: 1,
            player_id: 0,
            level_file_name: "castle1.j2l".to_string(),
            level_crc: 1,
            tileset_crc: 2,
            game_mode: GameMode::Battle,
            max_score: 10,
            extras: Some(ServerDetailsExtras {
                level_challenge: [1, 2, 3, 4],
                keep_alive_data: [5, 6, 7, 8],
                plus_version: [509, 0],
                music_crc: Some(vec![9, 9, 9, 9]),
                scripts: Some(ScriptsSwitch::FileCounts { total: 2, required: 1, optional: 1 }),
            }),
        };
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, ServerDetails::decode(&mut cursor).unwrap());
    }
}
