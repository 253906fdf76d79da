//! Per-connection session state.
//!
//! Mirrors the `Session` mapping of §3: a fixed set of well-known fields
//! (client id, local roster, level/heartbeat bookkeeping) plus a generic
//! key-value bag for the long tail of gameplay-state fields the original
//! tracked as ad-hoc mapping entries (§9: "map to a typed record... or to a
//! generic key-value store plus typed views").

use crate::packet::{GameMode, LocalPlayer};
use std::collections::HashMap;

/// Server-reported properties of the session (level, mode, score cap).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerProperties {
    pub level_file_name: String,
    pub level_crc: u32,
    pub tileset_crc: u32,
    pub game_mode: Option<GameMode>,
    pub max_score: u8,
    pub player_limit: u8,
    pub server_name: String,
}

/// A loosely typed value held in [`Session::extras`], for gameplay-state
/// fields that have no dedicated field of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

/// Per-connection state, owned exclusively by the connection driving it and
/// mutated only from the single-threaded dispatch loop (§3 "Ownership").
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub client_id: Option<u8>,
    pub udp_source_port: u16,
    pub local_players: Vec<LocalPlayer>,
    pub level_file_name: String,
    pub level_challenge: [u8; 4],
    pub heartbeat_cookie: [u8; 4],
    pub heartbeat_latency: u8,
    pub introduced: bool,
    pub server: ServerProperties,
    downloading: bool,
    extras: HashMap<String, SessionValue>,
}

impl Session {
    /// A fresh session for a client that has not yet joined anything.
    pub fn new(local_players: Vec<LocalPlayer>) -> Self {
        Session { local_players, ..Default::default() }
    }

    /// Whether a `DownloadingFile` exchange is in progress, used to pick
    /// that abstract packet's decode variant (§4.2).
    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    /// Mark a `DownloadingFile` exchange as started or finished.
    pub fn set_downloading(&mut self, downloading: bool) {
        self.downloading = downloading;
    }

    /// Read a gameplay-state value stashed in the generic extras bag.
    pub fn extra(&self, key: &str) -> Option<&SessionValue> {
        self.extras.get(key)
    }

    /// Write a gameplay-state value into the generic extras bag.
    pub fn set_extra(&mut self, key: impl Into<String>, value: SessionValue) {
        self.extras.insert(key.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_not_introduced_and_not_downloading() {
        let session = Session::new(Vec::new());
        assert!(!session.introduced);
        assert!(!session.is_downloading());
    }

    #[test]
    fn extras_round_trip() {
        let mut session = Session::new(Vec::new());
        session.set_extra("warmup", SessionValue::Bool(true));
        assert_eq!(session.extra("warmup"), Some(&SessionValue::Bool(true)));
        assert_eq!(session.extra("missing"), None);
    }
}
