//! Level lifecycle and script/resource manifest packets: `LevelLoad`,
//! `EndOfLevel`, `UpdateEvents`, `UpdateRequest`, `ResourceList`.

use crate::codec::primitives;
use crate::error::CodecError;
use bytes::{Buf, BufMut};
use derive_new::new;
use getset::{CopyGetters, Getters};

/// Sent by the server when a new level is about to load.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct LevelLoad {
    #[getset(get_copy = "pub")]
    level_crc: u32,
    #[getset(get_copy = "pub")]
    tileset_crc: u32,
    #[getset(get = "pub")]
    level_file_name: String,
    #[getset(get = "pub")]
    level_challenge: [u8; 4],
    #[getset(get_copy = "pub")]
    is_different: u8,
    #[getset(get_copy = "pub")]
    music: u8,
    #[getset(get = "pub")]
    music_crc: [u8; 4],
    #[getset(get = "pub")]
    script_data: Option<[u8; 5]>,
}

impl LevelLoad {
    pub const EVENT: &'static str = "level_load";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        if buf.remaining() < 8 {
            return Err(CodecError::decode(Self::EVENT, "unexpected end of frame"));
        }
        let level_crc = buf.get_u32_le();
        let tileset_crc = buf.get_u32_le();
        let level_file_name = primitives::read_pstring(buf, Self::EVENT)?;
        let level_challenge = primitives::read_array::<4>(buf, Self::EVENT)?;
        let is_different = primitives::read_u8(buf, Self::EVENT)?;
        let music = primitives::read_u8(buf, Self::EVENT)?;
        let music_crc = primitives::read_array::<4>(buf, Self::EVENT)?;
        let script_data = if buf.remaining() >= 5 { Some(primitives::read_array::<5>(buf, Self::EVENT)?) } else { None };
        Ok(LevelLoad { level_crc, tileset_crc, level_file_name, level_challenge, is_different, music, music_crc, script_data })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u32_le(self.level_crc);
        buf.put_u32_le(self.tileset_crc);
        primitives::write_pstring(buf, &self.level_file_name, Self::EVENT)?;
        buf.put_slice(&self.level_challenge);
        buf.put_u8(self.is_different);
        buf.put_u8(self.music);
        buf.put_slice(&self.music_crc);
        if let Some(data) = &self.script_data {
            buf.put_slice(data);
        }
        Ok(())
    }
}

/// Marks the end of the current level; carries no interpreted payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EndOfLevel {
    pub unknown_data: Vec<u8>,
}

impl EndOfLevel {
    pub const EVENT: &'static str = "end_of_level";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(EndOfLevel { unknown_data: primitives::read_greedy(buf) })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_slice(&self.unknown_data);
        Ok(())
    }
}

/// Gameplay event-log checksum/counter update; all fields are optional
/// because the server only fills in as many as it has room for.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct UpdateEvents {
    #[getset(get_copy = "pub")]
    checksum: Option<u16>,
    #[getset(get_copy = "pub")]
    counter: Option<u16>,
    #[getset(get = "pub")]
    unknown_data: Option<String>,
}

impl UpdateEvents {
    pub const EVENT: &'static str = "update_events";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let checksum = if buf.remaining() >= 2 { Some(buf.get_u16_le()) } else { None };
        let counter = if buf.remaining() >= 2 { Some(buf.get_u16_le()) } else { None };
        let unknown_data = if buf.has_remaining() {
            Some(crate::codec::cp1250::decode(&primitives::read_greedy(buf)))
        } else {
            None
        };
        Ok(UpdateEvents { checksum, counter, unknown_data })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        if let Some(checksum) = self.checksum {
            buf.put_u16_le(checksum);
        }
        if let Some(counter) = self.counter {
            buf.put_u16_le(counter);
        }
        if let Some(text) = &self.unknown_data {
            buf.put_slice(&crate::codec::cp1250::encode(text));
        }
        Ok(())
    }
}

/// Client request for the server to resend the current level's update state.
#[derive(new, Debug, Clone, Copy, PartialEq, Getters)]
pub struct UpdateRequest {
    #[getset(get = "pub")]
    level_challenge: [u8; 4],
}

impl UpdateRequest {
    pub const EVENT: &'static str = "update_request";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(UpdateRequest { level_challenge: primitives::read_array::<4>(buf, Self::EVENT)? })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_slice(&self.level_challenge);
        Ok(())
    }
}

/// One JJ2+ script manifest entry inside a [`ResourceList`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    pub script_data: [u8; 5],
    pub name: String,
}

/// JJ2+ manifest of scripts required for the current level.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceList {
    pub level_challenge: [u8; 4],
    pub script_data: [u8; 5],
    pub scripts: Vec<ScriptEntry>,
}

impl ResourceList {
    pub const EVENT: &'static str = "scripts";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let level_challenge = primitives::read_array::<4>(buf, Self::EVENT)?;
        let script_data = primitives::read_array::<5>(buf, Self::EVENT)?;
        let mut scripts = Vec::new();
        while buf.has_remaining() {
            let entry_data = primitives::read_array::<5>(buf, Self::EVENT)?;
            let name = primitives::read_pstring(buf, Self::EVENT)?;
            scripts.push(ScriptEntry { script_data: entry_data, name });
        }
        Ok(ResourceList { level_challenge, script_data, scripts })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_slice(&self.level_challenge);
        buf.put_slice(&self.script_data);
        for entry in &self.scripts {
            buf.put_slice(&entry.script_data);
            primitives::write_pstring(buf, &entry.name, Self::EVENT)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn level_load_round_trips_without_script_data() {
        let packet = LevelLoad::new(1, 2, "castle1.j2l".to_string(), [0; 4], 0, 1, [0; 4], None);
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, LevelLoad::decode(&mut cursor).unwrap());
    }

    #[test]
    fn level_load_round_trips_with_script_data() {
        let packet = LevelLoad::new(1, 2, "castle1.j2l".to_string(), [0; 4], 0, 1, [0; 4], Some([9; 5]));
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, LevelLoad::decode(&mut cursor).unwrap());
    }

    #[test]
    fn update_events_handles_all_fields_absent() {
        let buf = BytesMut::new();
        let decoded = UpdateEvents::decode(&mut &buf[..]).unwrap();
        assert_eq!(decoded, UpdateEvents::new(None, None, None));
    }

    #[test]
    fn update_events_round_trips_with_all_fields_present() {
        let packet = UpdateEvents::new(Some(42), Some(7), Some("ok".to_string()));
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, UpdateEvents::decode(&mut cursor).unwrap());
    }

    #[test]
    fn resource_list_round_trips() {
        let packet = ResourceList {
            level_challenge: [1, 2, 3, 4],
            script_data: [0; 5],
            scripts: vec![ScriptEntry { script_data: [1; 5], name: "main.js".to_string() }],
        };
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, ResourceList::decode(&mut cursor).unwrap());
    }
}
