//! The player record schema shared by `ClientDetails` and `PlayerList`
//!
//! Mirrors `player_array(with_client_id)` from the reference implementation:
//! the same record shape is used with and without a leading `client_id`
//! byte, so it is modeled once and the two packets each pick the variant
//! they need.

use crate::codec::primitives;
use crate::error::CodecError;
use crate::packet::enums::{Character, Team};
use bytes::{Buf, BufMut};
use derive_new::new;
use getset::{CopyGetters, Getters};

/// One player's record as it appears on the wire.
#[derive(new, Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct PlayerFields {
    /// Present only in `PlayerList`, absent in `ClientDetails`.
    #[getset(get_copy = "pub")]
    client_id: Option<u8>,

    #[getset(get_copy = "pub")]
    player_id: u8,

    #[getset(get_copy = "pub")]
    team: Team,

    #[getset(get_copy = "pub")]
    character: Character,

    #[getset(get = "pub")]
    fur_color: [u8; 4],

    #[getset(get_copy = "pub")]
    sprite_mode: u8,

    #[getset(get_copy = "pub")]
    sprite_mode_param: u8,

    #[getset(get_copy = "pub")]
    light_type: u8,

    #[getset(get_copy = "pub")]
    light_size: u8,

    #[getset(get_copy = "pub")]
    antigrav_and_nofire: u8,

    #[getset(get_copy = "pub")]
    unused: u8,

    #[getset(get = "pub")]
    rabbit_name: String,
}

impl PlayerFields {
    pub fn decode(buf: &mut impl Buf, with_client_id: bool, event: &'static str) -> Result<Self, CodecError> {
        let client_id = if with_client_id { Some(primitives::read_u8(buf, event)?) } else { None };
        let player_id = primitives::read_u8(buf, event)?;
        let team = Team::from_byte(primitives::read_u8(buf, event)?);
        let character = Character::from_byte(primitives::read_u8(buf, event)?);
        let fur_color = primitives::read_array::<4>(buf, event)?;
        let sprite_mode = primitives::read_u8(buf, event)?;
        let sprite_mode_param = primitives::read_u8(buf, event)?;
        let light_type = primitives::read_u8(buf, event)?;
        let light_size = primitives::read_u8(buf, event)?;
        let antigrav_and_nofire = primitives::read_u8(buf, event)?;
        let unused = primitives::read_u8(buf, event)?;
        let rabbit_name = primitives::read_cstring(buf, event)?;
        Ok(PlayerFields {
            client_id,
            player_id,
            team,
            character,
            fur_color,
            sprite_mode,
            sprite_mode_param,
            light_type,
            light_size,
            antigrav_and_nofire,
            unused,
            rabbit_name,
        })
    }

    pub fn encode(&self, buf: &mut impl BufMut, with_client_id: bool, event: &'static str) -> Result<(), CodecError> {
        if with_client_id {
            buf.put_u8(self.client_id.ok_or_else(|| {
                CodecError::encode(event, "client_id required when with_client_id is set")
            })?);
        }
        buf.put_u8(self.player_id);
        buf.put_u8(self.team.to_byte());
        buf.put_u8(self.character.to_byte());
        buf.put_slice(&self.fur_color);
        buf.put_u8(self.sprite_mode);
        buf.put_u8(self.sprite_mode_param);
        buf.put_u8(self.light_type);
        buf.put_u8(self.light_size);
        buf.put_u8(self.antigrav_and_nofire);
        buf.put_u8(self.unused);
        primitives::write_cstring(buf, &self.rabbit_name);
        Ok(())
    }
}

/// A locally controlled player the caller wants this client to present.
///
/// This is the domain-level type a caller constructs; [`ToPayloadData`]
/// projects it onto the wire schema of a specific packet class.
#[derive(new, Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct LocalPlayer {
    #[getset(get_copy = "pub")]
    player_id: u8,

    #[getset(get_copy = "pub")]
    team: Team,

    #[getset(get_copy = "pub")]
    character: Character,

    #[getset(get = "pub")]
    fur_color: [u8; 4],

    #[getset(get = "pub")]
    rabbit_name: String,
}

/// Projects a domain object onto the primitive-typed fields of a packet
/// class's schema (§6, "Domain collaborator interface").
pub trait ToPayloadData<Target> {
    fn to_payload_data(&self, client_id: Option<u8>) -> Target;
}

impl ToPayloadData<PlayerFields> for LocalPlayer {
    fn to_payload_data(&self, client_id: Option<u8>) -> PlayerFields {
        PlayerFields {
            client_id,
            player_id: self.player_id,
            team: self.team,
            character: self.character,
            fur_color: self.fur_color,
            sprite_mode: 17,
            sprite_mode_param: self.player_id,
            light_type: 10,
            light_size: 13,
            antigrav_and_nofire: 0,
            unused: 0,
            rabbit_name: self.rabbit_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn sample(with_client_id: bool) -> PlayerFields {
        PlayerFields::new(
            if with_client_id { Some(3) } else { None },
            1,
            Team::Red,
            Character::Spaz,
            [1, 2, 3, 4],
            17,
            1,
            10,
            13,
            0,
            0,
            "Spaz".to_string(),
        )
    }

    #[test]
    fn player_fields_round_trip_without_client_id() {
        let fields = sample(false);
        let mut buf = BytesMut::new();
        fields.encode(&mut buf, false, "test").unwrap();
        let mut cursor = &buf[..];
        let decoded = PlayerFields::decode(&mut cursor, false, "test").unwrap();
        assert_eq!(fields, decoded);
    }

    #[test]
    fn player_fields_round_trip_with_client_id() {
        let fields = sample(true);
        let mut buf = BytesMut::new();
        fields.encode(&mut buf, true, "test").unwrap();
        let mut cursor = &buf[..];
        let decoded = PlayerFields::decode(&mut cursor, true, "test").unwrap();
        assert_eq!(fields, decoded);
    }

    #[test]
    fn local_player_projects_to_player_fields() {
        let player = LocalPlayer::new(2, Team::Blue, Character::Jazz, [0; 4], "Jazz".to_string());
        let fields = player.to_payload_data(Some(9));
        assert_eq!(fields.client_id(), Some(9));
        assert_eq!(fields.sprite_mode_param(), 2);
    }
}
