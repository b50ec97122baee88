//! Configuration validation for the server.
//!
//! Reads and checks every key the server needs before anything binds.

use std::net::SocketAddr;

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_SESSION_LIFETIME: i64 = 86_400;
pub const DEFAULT_LOG_FILTER: &str = "tradejournal=info,tower_http=info";
/// Signed session cookies need at least 64 bytes of key material.
const MIN_SESSION_KEY_BYTES: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub key: Vec<u8>,
    /// Inactivity timeout in seconds.
    pub lifetime: i64,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub listen: SocketAddr,
    pub session: SessionSettings,
}

pub fn validate_server_config(config: &dyn ConfigPort) -> Result<ServerSettings, JournalError> {
    validate_database(config)?;
    let listen = validate_listen(config)?;
    let session = validate_session_config(config)?;
    Ok(ServerSettings { listen, session })
}

pub fn validate_session_config(config: &dyn ConfigPort) -> Result<SessionSettings, JournalError> {
    Ok(SessionSettings {
        key: validate_session_secret(config)?,
        lifetime: validate_session_lifetime(config)?,
        secure_cookies: config.get_bool("auth", "secure_cookies", false),
    })
}

pub fn log_filter(config: &dyn ConfigPort) -> String {
    config
        .get_string("log", "filter")
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn validate_database(config: &dyn ConfigPort) -> Result<(), JournalError> {
    config.require_string("database", "path")?;
    let pool_size = config.get_int("database", "pool_size", 4);
    if pool_size < 1 {
        return Err(JournalError::ConfigInvalid {
            section: "database".to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_listen(config: &dyn ConfigPort) -> Result<SocketAddr, JournalError> {
    let raw = config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    raw.parse().map_err(|_| JournalError::ConfigInvalid {
        section: "web".to_string(),
        key: "listen".to_string(),
        reason: format!("not a socket address: {raw}"),
    })
}

fn validate_session_secret(config: &dyn ConfigPort) -> Result<Vec<u8>, JournalError> {
    let secret = config.require_string("auth", "session_secret")?;
    let bytes = hex::decode(secret.trim()).map_err(|e| JournalError::ConfigInvalid {
        section: "auth".to_string(),
        key: "session_secret".to_string(),
        reason: format!("not valid hex: {e}"),
    })?;
    if bytes.len() < MIN_SESSION_KEY_BYTES {
        return Err(JournalError::ConfigInvalid {
            section: "auth".to_string(),
            key: "session_secret".to_string(),
            reason: format!(
                "need at least {MIN_SESSION_KEY_BYTES} bytes, got {}",
                bytes.len()
            ),
        });
    }
    Ok(bytes)
}

fn validate_session_lifetime(config: &dyn ConfigPort) -> Result<i64, JournalError> {
    let value = config.get_int("auth", "session_lifetime", DEFAULT_SESSION_LIFETIME);
    if value <= 0 {
        return Err(JournalError::ConfigInvalid {
            section: "auth".to_string(),
            key: "session_lifetime".to_string(),
            reason: "session_lifetime must be positive".to_string(),
        });
    }
    Ok(value)
}
