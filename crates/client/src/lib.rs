//! WebSocket gateway client.
//!
//! Implements the `fastpush-uploader` capability traits over plain
//! WebSocket connections to an upload gateway: a control session for
//! target resolution and the send call, and a part transport that fans
//! one file's parts out across several parallel connections.

mod dial;
mod envelope;
mod frame;
mod session;
mod transport;

pub use frame::{decode_part_frame, encode_frame, FrameError, PartHeader};
pub use session::GatewaySession;
pub use transport::WsPartTransport;

use std::time::Duration;

use tokio_tungstenite::tungstenite;

/// How long to wait for a control response or a commit ack.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the gateway client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SOCKS proxy error: {0}")]
    Socks(#[from] tokio_socks::Error),

    #[error("invalid gateway URL: {0}")]
    BadUrl(String),

    #[error("unsupported proxy scheme: {0}")]
    UnsupportedProxy(String),

    #[error("request timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,

    #[error("gateway rejected request: {0}")]
    Rejected(String),
}

/// Connection settings for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// WebSocket URL of the gateway (`ws://` or `wss://`).
    pub url: String,
    /// Pre-issued session token.
    pub token: String,
    /// Optional proxy every connection is dialed through.
    pub proxy: Option<ProxyConfig>,
}

/// Proxy scheme allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    Socks5,
    Socks5h,
    Socks4,
    Http,
    Https,
}

impl std::str::FromStr for ProxyScheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "socks5" => Ok(Self::Socks5),
            "socks5h" => Ok(Self::Socks5h),
            "socks4" => Ok(Self::Socks4),
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Socks5 => "socks5",
            Self::Socks5h => "socks5h",
            Self::Socks4 => "socks4",
            Self::Http => "http",
            Self::Https => "https",
        };
        f.write_str(s)
    }
}

/// A resolved proxy endpoint. Credentials are present only when a
/// username was configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub scheme: ProxyScheme,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}
