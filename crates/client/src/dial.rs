//! Connection dialing, directly or through a SOCKS5 proxy.

use tokio::net::TcpStream;
use tokio_socks::tcp::Socks5Stream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::{ClientError, ProxyConfig, ProxyScheme};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens one WebSocket connection to `url`, tunneling through the proxy
/// when one is configured.
pub(crate) async fn connect_ws(
    url: &str,
    proxy: Option<&ProxyConfig>,
) -> Result<WsStream, ClientError> {
    match proxy {
        None => {
            let (ws, _) = tokio_tungstenite::connect_async(url).await?;
            Ok(ws)
        }
        Some(p) => {
            let (host, port) = target_of(url)?;
            debug!(proxy = %p.host, scheme = %p.scheme, "dialing through proxy");
            let tcp = socks_tunnel(p, &host, port).await?;
            let (ws, _) = tokio_tungstenite::client_async_tls(url, tcp).await?;
            Ok(ws)
        }
    }
}

async fn socks_tunnel(
    p: &ProxyConfig,
    host: &str,
    port: u16,
) -> Result<TcpStream, ClientError> {
    match p.scheme {
        ProxyScheme::Socks5 | ProxyScheme::Socks5h => {
            let proxy = (p.host.as_str(), p.port);
            let stream = match auth_of(p) {
                Some((user, pass)) => {
                    Socks5Stream::connect_with_password(proxy, (host, port), user, pass).await?
                }
                None => Socks5Stream::connect(proxy, (host, port)).await?,
            };
            Ok(stream.into_inner())
        }
        other => Err(ClientError::UnsupportedProxy(other.to_string())),
    }
}

/// SOCKS5 username/password auth needs both values non-empty; anything
/// less falls back to the credential-less handshake.
fn auth_of(p: &ProxyConfig) -> Option<(&str, &str)> {
    match (p.username.as_deref(), p.password.as_deref()) {
        (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
        _ => None,
    }
}

/// Extracts the TCP target (host, port) of a WebSocket URL.
fn target_of(url: &str) -> Result<(String, u16), ClientError> {
    let request = url.into_client_request()?;
    let uri = request.uri();
    let host = uri
        .host()
        .ok_or_else(|| ClientError::BadUrl(url.to_string()))?
        .to_string();
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("wss") => 443,
        _ => 80,
    });
    Ok((host, port))
}
