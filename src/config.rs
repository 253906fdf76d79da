//! Session configuration
//!
//! A plain builder over feature flags, the Rust counterpart of the mapping
//! described in §3 of the specification. Presence of a flag's `true` value
//! enables the corresponding feature; unlike the original's free-form
//! mapping, unknown keys are a compile error rather than a silently ignored
//! typo.

/// Feature flags that gate packet registration and parametrize handlers.
///
/// See §3 ("Session config") and §4.4 ("Condition") of the specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Register and handle `ChatMessage`/`ConsoleMessage`.
    pub chat: bool,
    /// Register `ClientDetails`/`ClientDisconnect`/`PlayerList`.
    pub notice_players: bool,
    /// Register `DownloadingFile`/`DownloadRequest`.
    pub download_files: bool,
    /// Register `Spectate`/`SpectateRequest`.
    pub spectating: bool,
    /// Register `Latency`.
    pub update_latencies: bool,
    /// Register `PlusAcknowledgement`.
    pub latest_plus: bool,
    /// Instantiate the bot sub-protocol.
    pub bot: bool,
    /// Register `Password`/`PasswordCheck` (off by default, see §1 Non-goals).
    pub passwords: bool,
    /// Submit `JoinRequest`/`PlusRequest` once both transports connect.
    pub join_servers: bool,
    /// Have the bot respond to spectate-related packets automatically.
    pub autospectate: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            chat: true,
            notice_players: true,
            download_files: true,
            spectating: true,
            update_latencies: true,
            latest_plus: true,
            bot: true,
            passwords: false,
            join_servers: true,
            autospectate: true,
        }
    }
}

impl SessionConfig {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwords_are_disabled_by_default() {
        assert!(!SessionConfig::default().passwords);
    }

    #[test]
    fn bot_is_enabled_by_default() {
        assert!(SessionConfig::default().bot);
    }
}
