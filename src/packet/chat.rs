//! Chat and console message packets.

use crate::codec::primitives;
use crate::codec::cp1250;
use crate::error::CodecError;
use crate::packet::enums::ChatType;
use bytes::{Buf, BufMut};
use derive_new::new;
use getset::{CopyGetters, Getters};

/// A chat line sent by a player, relayed by the server to the rest.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct ChatMessage {
    #[getset(get_copy = "pub")]
    client_id: u8,
    #[getset(get_copy = "pub")]
    chat_type: ChatType,
    #[getset(get = "pub")]
    text: String,
}

impl ChatMessage {
    pub const EVENT: &'static str = "chat_message";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let client_id = primitives::read_u8(buf, Self::EVENT)?;
        let chat_type = ChatType::from_byte(primitives::read_u8(buf, Self::EVENT)?);
        let text = cp1250::decode(&primitives::read_greedy(buf));
        Ok(ChatMessage { client_id, chat_type, text })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.client_id);
        buf.put_u8(self.chat_type.to_byte());
        buf.put_slice(&cp1250::encode(&self.text));
        Ok(())
    }
}

/// A server-originated informational message (join/leave notices, admin
/// broadcasts) rendered in the client's console rather than the chat log.
#[derive(new, Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct ConsoleMessage {
    #[getset(get_copy = "pub")]
    message_type: u8,
    #[getset(get = "pub")]
    text: String,
}

impl ConsoleMessage {
    pub const EVENT: &'static str = "console_message";

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let message_type = primitives::read_u8(buf, Self::EVENT)?;
        let text = cp1250::decode(&primitives::read_greedy(buf));
        Ok(ConsoleMessage { message_type, text })
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), CodecError> {
        buf.put_u8(self.message_type);
        buf.put_slice(&cp1250::encode(&self.text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn chat_message_round_trips() {
        let packet = ChatMessage::new(1, ChatType::TeamChat, "on my way".to_string());
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, ChatMessage::decode(&mut cursor).unwrap());
    }

    #[test]
    fn console_message_round_trips() {
        let packet = ConsoleMessage::new(0, "Player joined the game".to_string());
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = &buf[..];
        assert_eq!(packet, ConsoleMessage::decode(&mut cursor).unwrap());
    }
}
