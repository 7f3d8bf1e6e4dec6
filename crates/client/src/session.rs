//! Control session: auth on connect, target resolution, the send call,
//! and graceful release.

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use fastpush_transfer::UploadDescriptor;
use fastpush_uploader::{BoxFuture, GatewayApi, Peer, UploadError};

use crate::dial::{self, WsStream};
use crate::envelope::Envelope;
use crate::{ClientError, GatewayConfig, REQUEST_TIMEOUT};

#[derive(Serialize)]
struct AuthRequest {
    token: String,
}

#[derive(Serialize)]
struct ResolveRequest {
    identifier: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveResponse {
    peer_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMediaRequest {
    target: Peer,
    media: UploadDescriptor,
    streaming: bool,
}

/// Authenticated control connection to the gateway.
///
/// One session is shared across the whole batch and released exactly
/// once; the caller wraps the batch so release happens on error paths
/// too.
pub struct GatewaySession {
    stream: Mutex<WsStream>,
}

impl GatewaySession {
    /// Dials the gateway and authenticates with the configured token.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, ClientError> {
        let ws = dial::connect_ws(&config.url, config.proxy.as_ref()).await?;
        let session = Self {
            stream: Mutex::new(ws),
        };
        session
            .request(
                "auth",
                Some(&AuthRequest {
                    token: config.token.clone(),
                }),
            )
            .await?;
        info!(url = %config.url, "gateway session established");
        Ok(session)
    }

    async fn request<T: Serialize>(
        &self,
        msg_type: &str,
        payload: Option<&T>,
    ) -> Result<Envelope, ClientError> {
        let mut stream = self.stream.lock().await;
        request_on(&mut stream, msg_type, payload).await
    }
}

/// Sends one request envelope on `stream` and waits for the reply with
/// the matching id, with a timeout. Shared with the part transport for
/// its open/commit handshakes.
pub(crate) async fn request_on<T: Serialize>(
    stream: &mut WsStream,
    msg_type: &str,
    payload: Option<&T>,
) -> Result<Envelope, ClientError> {
    let id = uuid::Uuid::new_v4().to_string();
    let env = Envelope::new(&id, msg_type, payload)?;
    let text = serde_json::to_string(&env)?;
    stream.send(Message::Text(text.into())).await?;

    let reply = tokio::time::timeout(REQUEST_TIMEOUT, wait_reply(stream, &id))
        .await
        .map_err(|_| ClientError::Timeout)??;
    if let Some(err) = reply.error {
        return Err(ClientError::Rejected(err));
    }
    Ok(reply)
}

async fn wait_reply(stream: &mut WsStream, id: &str) -> Result<Envelope, ClientError> {
    while let Some(msg) = stream.next().await {
        match msg? {
            Message::Text(text) => {
                let env: Envelope = serde_json::from_str(text.as_str())?;
                if env.id == id {
                    return Ok(env);
                }
                debug!(id = %env.id, msg_type = %env.msg_type, "ignoring unrelated message");
            }
            Message::Close(_) => return Err(ClientError::Closed),
            _ => {}
        }
    }
    Err(ClientError::Closed)
}

fn gw(e: ClientError) -> UploadError {
    UploadError::Gateway(e.to_string())
}

impl GatewayApi for GatewaySession {
    fn resolve_target(&self, identifier: &str) -> BoxFuture<'_, Result<Peer, UploadError>> {
        let ident = identifier.trim().to_string();
        Box::pin(async move {
            // A numeric identifier is already a peer id.
            if let Peer::Id(id) = Peer::parse(&ident) {
                return Ok(Peer::Id(id));
            }
            let reply = self
                .request(
                    "resolve",
                    Some(&ResolveRequest {
                        identifier: ident.clone(),
                    }),
                )
                .await
                .map_err(gw)?;
            let resolved: ResolveResponse = reply
                .parse_payload()
                .map_err(|e| UploadError::Gateway(e.to_string()))?
                .ok_or_else(|| UploadError::Gateway(format!("empty resolve reply for {ident}")))?;
            Ok(Peer::Id(resolved.peer_id))
        })
    }

    fn send_media(
        &self,
        target: &Peer,
        media: &UploadDescriptor,
        streaming: bool,
    ) -> BoxFuture<'_, Result<(), UploadError>> {
        let req = SendMediaRequest {
            target: target.clone(),
            media: media.clone(),
            streaming,
        };
        Box::pin(async move {
            self.request("send_media", Some(&req)).await.map_err(gw)?;
            debug!(file = %req.media.name(), "media handed to target");
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), UploadError>> {
        Box::pin(async move {
            let mut stream = self.stream.lock().await;
            // Best effort: the session is going away either way.
            let _ = stream.send(Message::Close(None)).await;
            info!("gateway session released");
            Ok(())
        })
    }
}
