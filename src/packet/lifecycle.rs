//! Connection lifecycle packets with no payload, plus the abstract
//! `DownloadingFile` packet and its request counterpart.

use crate::error::CodecError;
use crate::packet::DecodeContext;
use crate::codec::primitives;
use bytes::{Buf, BufMut};

macro_rules! empty_packet {
    ($name:ident, $event:literal) => {
        #[doc = concat!("`", stringify!($name), "` carries no payload.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name;

        impl $name {
            pub const EVENT: &'static str = $event;

            pub fn decode(_buf: &mut impl Buf) -> Result<Self, CodecError> {
                Ok($name)
            }

            pub fn encode(&self, _buf: &mut impl BufMut) -> Result<(), CodecError> {
                Ok(())
            }
        }
    };
}

empty_packet!(GameInit, "game_init");
empty_packet!(ServerStopped, "stopped");
empty_packet!(Ready, "ready");

/// First chunk of a `DownloadingFile` exchange: carries the file name and
/// the total packet count to expect.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadingFileInit {
    pub packet_count: u32,
    pub unknown_data: [u8; 4],
    pub file_name: String,
}

impl DownloadingFileInit {
    pub const EVENT: &'static str = "downloading_file";

    fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            return Err(CodecError::decode(Self::EVENT, "unexpected end of frame"));
        }
        let packet_count = buf.get_u32_le();
        let unknown_data = primitives::read_array::<4>(buf, Self::EVENT)?;
        let file_name = primitives::read_pstring(buf, Self::EVENT)?;
        Ok(DownloadingFileInit { packet_count, unknown_data, file_name })
    }

    fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u32_le(self.packet_count);
        buf.put_slice(&self.unknown_data);
        primitives::write_pstring(buf, &self.file_name, Self::EVENT)
    }
}

/// Subsequent chunks of a `DownloadingFile` exchange: raw file content.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadingFileChunk {
    pub packet_count: u32,
    pub file_content: Vec<u8>,
}

impl DownloadingFileChunk {
    pub const EVENT: &'static str = "downloading_file";

    fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            return Err(CodecError::decode(Self::EVENT, "unexpected end of frame"));
        }
        let packet_count = buf.get_u32_le();
        let file_content = primitives::read_greedy(buf);
        Ok(DownloadingFileChunk { packet_count, file_content })
    }

    fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u32_le(self.packet_count);
        buf.put_slice(&self.file_content);
        Ok(())
    }
}

/// Abstract packet tag `0x14`: the first chunk of a download carries the
/// file name, every later chunk carries raw content.
///
/// Discriminant convention (§9 Open Questions): the later revision of the
/// reference implementation registers `is_downloading = true` for the
/// init-with-filename chunk and `false` for data chunks; this crate follows
/// that.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadingFile {
    Init(DownloadingFileInit),
    Chunk(DownloadingFileChunk),
}

impl DownloadingFile {
    pub const EVENT: &'static str = "downloading_file";

    pub fn pick(ctx: &DecodeContext) -> bool {
        ctx.is_downloading
    }

    pub fn decode(buf: &mut impl Buf, ctx: &DecodeContext) -> Result<Self, CodecError> {
        if Self::pick(ctx) {
            Ok(DownloadingFile::Init(DownloadingFileInit::decode(buf)?))
        } else {
            Ok(DownloadingFile::Chunk(DownloadingFileChunk::decode(buf)?))
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        match self {
            DownloadingFile::Init(init) => init.encode(buf),
            DownloadingFile::Chunk(chunk) => chunk.encode(buf),
        }
    }

    /// The context flag that would select this variant on decode.
    pub fn is_downloading(&self) -> bool {
        matches!(self, DownloadingFile::Init(_))
    }
}

/// Client request to begin downloading a named file.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub file_name: String,
}

impl DownloadRequest {
    pub const EVENT: &'static str = "download_request";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(DownloadRequest { file_name: primitives::read_pstring(buf, Self::EVENT)? })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        primitives::write_pstring(buf, &self.file_name, Self::EVENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn empty_packets_round_trip() {
        let mut buf = BytesMut::new();
        GameInit.encode(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(GameInit, GameInit::decode(&mut &buf[..]).unwrap());
    }

    #[test]
    fn downloading_file_dispatches_on_context_flag() {
        let init = DownloadingFile::Init(DownloadingFileInit {
            packet_count: 3,
            unknown_data: [0; 4],
            file_name: "castle1.j2l".to_string(),
        });
        let mut buf = BytesMut::new();
        init.encode(&mut buf).unwrap();
        let ctx = DecodeContext { is_downloading: true, from_server: true };
        let decoded = DownloadingFile::decode(&mut &buf[..], &ctx).unwrap();
        assert_eq!(init, decoded);

        let chunk = DownloadingFile::Chunk(DownloadingFileChunk { packet_count: 1, file_content: vec![1, 2, 3] });
        let mut buf = BytesMut::new();
        chunk.encode(&mut buf).unwrap();
        let ctx = DecodeContext { is_downloading: false, from_server: true };
        let decoded = DownloadingFile::decode(&mut &buf[..], &ctx).unwrap();
        assert_eq!(chunk, decoded);
    }
}
