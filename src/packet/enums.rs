//! Domain enums shared across packet schemas
//!
//! These are single-byte (or small fixed-width) tagged integers on the
//! wire; the codec treats them as such and the enum merely gives the value
//! a name, per §1 ("OUT OF SCOPE ... the catalog of game-domain enum values
//! (the spec requires only that the codec treat them as single-byte tagged
//! integers)").

use crate::codec::primitives;
use crate::error::CodecError;
use bytes::{Buf, BufMut};

/// Version string a client reports itself as, space-padded to 4 ASCII bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MajorVersionString {
    V123,
    V124,
}

impl MajorVersionString {
    pub fn as_str(self) -> &'static str {
        match self {
            MajorVersionString::V123 => "21  ",
            MajorVersionString::V124 => "24  ",
        }
    }

    pub fn decode(buf: &mut impl Buf, event: &'static str) -> Result<Self, CodecError> {
        let text = primitives::read_padded_string::<4>(buf, event)?;
        match text.as_str() {
            "21" => Ok(MajorVersionString::V123),
            "24" => Ok(MajorVersionString::V124),
            other => Err(CodecError::decode(event, format!("unknown client version {other:?}"))),
        }
    }

    pub fn encode(self, buf: &mut impl BufMut, event: &'static str) -> Result<(), CodecError> {
        primitives::write_padded_string::<4>(buf, self.as_str().trim_end(), event)
    }
}

impl Default for MajorVersionString {
    fn default() -> Self {
        MajorVersionString::V124
    }
}

/// A playable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Character {
    Jazz,
    Spaz,
    Bird,
    Lori,
}

impl Character {
    pub fn from_byte(byte: u8) -> Character {
        match byte {
            0 => Character::Jazz,
            1 => Character::Spaz,
            2 => Character::Bird,
            _ => Character::Lori,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Character::Jazz => 0,
            Character::Spaz => 1,
            Character::Bird => 2,
            Character::Lori => 3,
        }
    }
}

/// A team in team-based game modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    pub fn from_byte(byte: u8) -> Team {
        if byte == 0 { Team::Blue } else { Team::Red }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Team::Blue => 0,
            Team::Red => 1,
        }
    }
}

/// The core game mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    SinglePlayer,
    Coop,
    Battle,
    Race,
    TreasureHunt,
    Ctf,
}

impl GameMode {
    pub fn from_byte(byte: u8) -> Result<GameMode, u8> {
        Ok(match byte {
            0 => GameMode::SinglePlayer,
            1 => GameMode::Coop,
            2 => GameMode::Battle,
            3 => GameMode::Race,
            4 => GameMode::TreasureHunt,
            5 => GameMode::Ctf,
            other => return Err(other),
        })
    }

    pub fn to_byte(self) -> u8 {
        match self {
            GameMode::SinglePlayer => 0,
            GameMode::Coop => 1,
            GameMode::Battle => 2,
            GameMode::Race => 3,
            GameMode::TreasureHunt => 4,
            GameMode::Ctf => 5,
        }
    }
}

/// The kind of text a `ChatMessage` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatType {
    Normal,
    TeamChat,
    Whisper,
    Me,
}

impl ChatType {
    pub fn from_byte(byte: u8) -> ChatType {
        match byte {
            1 => ChatType::TeamChat,
            2 => ChatType::Whisper,
            3 => ChatType::Me,
            _ => ChatType::Normal,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ChatType::Normal => 0,
            ChatType::TeamChat => 1,
            ChatType::Whisper => 2,
            ChatType::Me => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn major_version_round_trips() {
        let mut buf = BytesMut::new();
        MajorVersionString::V124.encode(&mut buf, "test").unwrap();
        let mut cursor = &buf[..];
        assert_eq!(MajorVersionString::V124, MajorVersionString::decode(&mut cursor, "test").unwrap());
    }

    #[test]
    fn game_mode_round_trips_every_variant() {
        for byte in 0..=5u8 {
            let mode = GameMode::from_byte(byte).unwrap();
            assert_eq!(byte, mode.to_byte());
        }
    }
}
