//! Embedding API (§6): [`Jj2Client`] holds configuration and the caller's
//! local player roster; `connect` dials both transports and wires up the
//! default dispatcher (root session mirroring plus the bot child) before
//! handing back a driven [`Connection`].

use crate::bot;
use crate::config::SessionConfig;
use crate::packet::{JoinRequest, LocalPlayer, Packet, PlusAcknowledgement, PlusRequest};
use crate::error::ProtocolError;
use crate::root;
use crate::session::Session;
use crate::transport::Connection;
use std::net::SocketAddr;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::oneshot;
use tracing::debug;

/// A configured, not-yet-connected JJ2 client (§6).
#[derive(Debug, Clone)]
pub struct Jj2Client {
    config: SessionConfig,
    local_players: Vec<LocalPlayer>,
}

impl Jj2Client {
    /// A client that will present `local_players` and honor `config`'s
    /// feature flags once connected.
    pub fn new(config: SessionConfig, local_players: Vec<LocalPlayer>) -> Self {
        Jj2Client { config, local_players }
    }

    /// Dial `host:port` over both TCP and UDP (the reference client binds
    /// its UDP endpoint to the same remote address as the TCP stream) and
    /// build the default dispatcher: root session mirroring at `Urgent`
    /// priority with the bot sub-protocol attached as a child (§4.6).
    ///
    /// Returns the driven [`Connection`] and the [`oneshot::Sender`] the
    /// caller holds onto to request a clean shutdown of `Connection::run`.
    pub async fn connect(&self, host: &str, port: u16) -> std::io::Result<(Connection, oneshot::Sender<()>)> {
        let tcp_stream = TcpStream::connect((host, port)).await?;
        let udp_peer: SocketAddr = tcp_stream.peer_addr()?;
        let bind_addr: SocketAddr = if udp_peer.is_ipv6() { "[::]:0".parse().unwrap() } else { "0.0.0.0:0".parse().unwrap() };
        let udp_socket = UdpSocket::bind(bind_addr).await?;

        debug!(%udp_peer, local_udp_port = udp_socket.local_addr()?.port(), "connected to server");

        let mut session = Session::new(self.local_players.clone());
        session.udp_source_port = udp_socket.local_addr()?.port();

        let dispatcher = root::build().child(bot::build()).configure(&self.config);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let connection = Connection::new(tcp_stream, udp_socket, udp_peer, session, self.config.clone(), dispatcher, shutdown_rx);
        Ok((connection, shutdown_tx))
    }
}

impl Connection {
    /// Submit the initial `JoinRequest` + `PlusRequest` pair used to join a
    /// server, gated on [`SessionConfig::join_servers`] (§4.6, grounded on
    /// `original_source/jj2/protocols/game.py`'s `GameClient.join`).
    pub async fn join(&mut self) -> Result<(), ProtocolError> {
        if !self.config().join_servers {
            return Ok(());
        }
        self.submit(Packet::JoinRequest(JoinRequest::default())).await?;
        self.submit(Packet::PlusAcknowledgement(PlusAcknowledgement::Request(PlusRequest::latest()))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{Character, Team};

    #[test]
    fn client_holds_configured_roster() {
        let local = LocalPlayer::new(0, Team::Blue, Character::Jazz, [0; 4], "Jazz".to_string());
        let client = Jj2Client::new(SessionConfig::default(), vec![local.clone()]);
        assert_eq!(client.local_players, vec![local]);
    }
}
