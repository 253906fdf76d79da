//! A client-side implementation of the Jazz Jackrabbit 2 multiplayer wire
//! protocol.
//!
//! [`Jj2Client`] dials a server over parallel TCP and UDP transports, frames
//! and decodes the typed [`packet`] catalog, and routes decoded packets
//! through a configurable, priority-ordered [`dispatch::Dispatcher`]. A
//! per-connection [`session::Session`] tracks server- and client-reported
//! state, and a default bot policy (`bot` module) keeps the connection alive
//! as a spectator-style participant unless disabled in [`config::SessionConfig`].
//!
//! ```no_run
//! use jj2_client::client::Jj2Client;
//! use jj2_client::config::SessionConfig;
//! use jj2_client::packet::LocalPlayer;
//!
//! # async fn run() -> std::io::Result<()> {
//! let client = Jj2Client::new(SessionConfig::default(), Vec::<LocalPlayer>::new());
//! let (mut connection, _shutdown) = client.connect("127.0.0.1", 10052).await?;
//! connection.join().await.ok();
//! connection.run().await.ok();
//! # Ok(())
//! # }
//! ```

// Unlike the teacher's small telemetry surface, this crate's catalog and
// dispatch machinery are large enough that requiring every item to be
// documented would fight the corpus's own density conventions; warn instead
// of denying, see DESIGN.md.
#![warn(missing_docs)]

pub mod bot;
pub mod client;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod packet;
pub mod root;
pub mod session;
pub mod transport;

pub use client::Jj2Client;
