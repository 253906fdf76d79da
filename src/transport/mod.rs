//! The dual-transport protocol driver: TCP length-prefix reassembly, UDP
//! checksum framing, and the `Connection` event loop that ties both
//! transports to the dispatcher and session model.

use crate::codec::checksum;
use crate::config::SessionConfig;
use crate::dispatch::{Dispatcher, HandlerValue};
use crate::error::ProtocolError;
use crate::packet::{DecodeContext, Packet, Transport};
use crate::session::Session;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::oneshot;
use tokio_util::codec::{Decoder, Encoder, Framed};
use tokio_util::udp::UdpFramed;
use tracing::{debug, trace, warn};

/// TCP length-prefix reassembler (§4.5, §4.2 "TCP length framing").
///
/// Frames are `1-byte-length | tag | schema`, or, when the frame would not
/// fit a one-byte length, the escape form `0x00 | u16-le(length) | tag |
/// schema`, where `length` is the body length alone and the frame total is
/// `length + 3`. `Item`/encoder input is the body (tag byte plus schema),
/// matching what [`crate::codec::payload::Cached::serialize`] produces
/// without the outer TCP length header.
#[derive(Debug, Default)]
pub struct TcpFrameCodec;

impl Decoder for TcpFrameCodec {
    type Item = BytesMut;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let first = src[0];
        if first == 0 {
            if src.len() < 3 {
                return Ok(None);
            }
            let total = u16::from_le_bytes([src[1], src[2]]) as usize + 3;
            if src.len() < total {
                return Ok(None);
            }
            let mut frame = src.split_to(total);
            frame.advance(3);
            Ok(Some(frame))
        } else {
            let total = first as usize;
            if src.len() < total {
                return Ok(None);
            }
            let mut frame = src.split_to(total);
            frame.advance(1);
            Ok(Some(frame))
        }
    }
}

impl Encoder<Bytes> for TcpFrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, body: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = body.len();
        if len + 1 <= u8::MAX as usize {
            dst.put_u8((len + 1) as u8);
        } else {
            dst.put_u8(0);
            dst.put_u16_le(len as u16);
        }
        dst.extend_from_slice(&body);
        Ok(())
    }
}

/// UDP checksum framing (§4.2 "UDP framing"). A datagram whose recomputed
/// checksum prefix disagrees with the one it carries is dropped silently,
/// matching the protocol's invariant that the checksum is a pure function
/// of the body.
#[derive(Debug, Default)]
pub struct UdpFrameCodec;

impl Decoder for UdpFrameCodec {
    type Item = BytesMut;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 2 {
            src.clear();
            return Ok(None);
        }
        let prefix = [src[0], src[1]];
        if !checksum::verify(prefix, &src[2..]) {
            trace!("dropping udp datagram with invalid checksum");
            src.clear();
            return Ok(None);
        }
        let mut frame = std::mem::take(src);
        frame.advance(2);
        Ok(Some(frame))
    }
}

impl Encoder<Bytes> for UdpFrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, body: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let prefix = checksum::compute(&body);
        dst.put_slice(&prefix);
        dst.extend_from_slice(&body);
        Ok(())
    }
}

/// Owns both transports, the session, and the configured dispatcher for one
/// connection to a server. The single owner of the session and the
/// per-direction reassembly buffers (§3 "Ownership").
pub struct Connection {
    session: Session,
    config: SessionConfig,
    dispatcher: Dispatcher<Session>,
    tcp: Framed<TcpStream, TcpFrameCodec>,
    udp: UdpFramed<UdpFrameCodec>,
    udp_peer: std::net::SocketAddr,
    shutdown: oneshot::Receiver<()>,
}

impl Connection {
    /// Wrap already-connected TCP/UDP sockets into a driven connection.
    pub fn new(
        tcp_stream: TcpStream,
        udp_socket: UdpSocket,
        udp_peer: std::net::SocketAddr,
        session: Session,
        config: SessionConfig,
        dispatcher: Dispatcher<Session>,
        shutdown: oneshot::Receiver<()>,
    ) -> Self {
        Connection {
            session,
            config,
            dispatcher,
            tcp: Framed::new(tcp_stream, TcpFrameCodec),
            udp: UdpFramed::new(udp_socket, UdpFrameCodec),
            udp_peer,
            shutdown,
        }
    }

    /// The session this connection is driving.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The session this connection is driving, mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The feature flags this connection was configured with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Encode and send a packet over the transport its class is assigned to
    /// (§4.5 `submit()`).
    pub async fn submit(&mut self, packet: Packet) -> Result<(), ProtocolError> {
        use futures::SinkExt;

        let mut buf = BytesMut::new();
        packet.encode(&mut buf)?;
        let body = buf.freeze();
        debug!(event = packet.event(), tag = packet.tag(), "submitting packet");
        match packet.transport() {
            Transport::Tcp => self.tcp.send(body).await,
            Transport::Udp => self.udp.send((body, self.udp_peer)).await,
        }
    }

    /// Drive the connection until the shutdown signal fires or a transport
    /// closes. Decodes inbound frames, dispatches them, and re-submits any
    /// outbound packets handlers produced.
    pub async fn run(&mut self) -> Result<(), ProtocolError> {
        use futures::StreamExt;

        loop {
            tokio::select! {
                _ = &mut self.shutdown => {
                    debug!("shutdown signal received, stopping connection");
                    return Ok(());
                }
                frame = self.tcp.next() => {
                    match frame {
                        Some(Ok(body)) => self.dispatch_frame(Transport::Tcp, body).await?,
                        Some(Err(error)) => return Err(error),
                        None => return Err(ProtocolError::ConnectionLost),
                    }
                }
                datagram = self.udp.next() => {
                    match datagram {
                        Some(Ok((body, _addr))) => self.dispatch_frame(Transport::Udp, body).await?,
                        Some(Err(error)) => return Err(error),
                        None => return Err(ProtocolError::ConnectionLost),
                    }
                }
            }
        }
    }

    async fn dispatch_frame(&mut self, transport: Transport, mut body: BytesMut) -> Result<(), ProtocolError> {
        if body.is_empty() {
            return Ok(());
        }
        let tag = body.get_u8();
        let ctx = DecodeContext {
            is_downloading: self.session.is_downloading(),
            from_server: true,
        };
        let packet = match Packet::decode(tag, transport, &body, &ctx) {
            Ok(packet) => packet,
            Err(error) => {
                warn!(%error, tag, "failed to decode inbound packet, dropping");
                return Ok(());
            }
        };

        let outbound: Vec<Packet> = self
            .dispatcher
            .handle(&mut self.session, &packet)
            .into_iter()
            .filter_map(|value| match value {
                HandlerValue::Outbound(packet) => Some(packet),
                _ => None,
            })
            .collect();

        for packet in outbound {
            self.submit(packet).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_short_frame_decodes_in_one_pass() {
        let mut codec = TcpFrameCodec;
        let mut buf = BytesMut::from(&[0x05_u8, 0x19][..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], &[0x19]);
        assert!(buf.is_empty());
    }

    #[test]
    fn tcp_escaped_length_frame_round_trips() {
        let mut codec = TcpFrameCodec;
        let body = Bytes::from(vec![0x13_u8; 272]);
        let mut encoded = BytesMut::new();
        codec.encode(body.clone(), &mut encoded).unwrap();

        assert_eq!(encoded[0], 0x00);
        assert_eq!(u16::from_le_bytes([encoded[1], encoded[2]]), 272);
        assert_eq!(encoded.len(), 272 + 3);

        let frame = codec.decode(&mut encoded).unwrap().unwrap();
        assert_eq!(&frame[..], &body[..]);
        assert!(encoded.is_empty());
    }

    #[test]
    fn tcp_frame_reassembles_across_arbitrary_chunk_splits() {
        let mut codec = TcpFrameCodec;
        let body = Bytes::from(vec![0x13_u8; 272]);
        let mut whole = BytesMut::new();
        codec.encode(body.clone(), &mut whole).unwrap();

        let mut buf = BytesMut::new();
        let mut decoded = None;
        for byte in whole.iter() {
            buf.put_u8(*byte);
            if let Some(frame) = codec.decode(&mut buf).unwrap() {
                decoded = Some(frame);
            }
        }
        assert_eq!(&decoded.unwrap()[..], &body[..]);
    }

    #[test]
    fn tcp_decoder_waits_for_more_bytes_on_incomplete_escape_header() {
        let mut codec = TcpFrameCodec;
        let mut buf = BytesMut::from(&[0x00_u8, 0x10][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn udp_valid_checksum_decodes_to_body() {
        let mut codec = UdpFrameCodec;
        let body = Bytes::from_static(b"\x03\x01\x00\x00\x00\x00\x32\x34\x20\x20");
        let mut encoded = BytesMut::new();
        codec.encode(body.clone(), &mut encoded).unwrap();

        let frame = codec.decode(&mut encoded).unwrap().unwrap();
        assert_eq!(&frame[..], &body[..]);
    }

    #[test]
    fn udp_flipped_prefix_byte_is_silently_dropped() {
        let mut codec = UdpFrameCodec;
        let body = Bytes::from_static(b"\x03\x01\x00\x00\x00\x00\x32\x34\x20\x20");
        let mut encoded = BytesMut::new();
        codec.encode(body, &mut encoded).unwrap();
        encoded[0] ^= 0x01;

        assert!(codec.decode(&mut encoded).unwrap().is_none());
        assert!(encoded.is_empty());
    }
}
