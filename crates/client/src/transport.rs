//! Multi-connection part transport over WebSockets.
//!
//! `open` dials N connections and announces the transfer on each; `push`
//! hands parts to the connections round-robin, relying on send
//! backpressure as the suspension point; `finalize` commits on every
//! connection and closes them. Part scheduling across the sockets beyond
//! round-robin order is the gateway's concern.

use futures_util::SinkExt;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use fastpush_transfer::LARGE_FILE_THRESHOLD;
use fastpush_uploader::{BoxFuture, PartTransport, UploadError};

use crate::dial::{self, WsStream};
use crate::frame::{encode_frame, PartHeader};
use crate::{session, ClientError, GatewayConfig};

/// Hard bounds on the size-derived connection count.
const MIN_CONNECTIONS: u64 = 2;
const MAX_CONNECTIONS: u64 = 8;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenTransferRequest {
    token: String,
    file_id: u64,
    part_count: u32,
    large: bool,
    connection_index: u32,
    connection_count: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitRequest {
    file_id: u64,
    parts_sent: u32,
}

struct TransferState {
    conns: Vec<WsStream>,
    next: usize,
    file_id: u64,
    part_count: u32,
    part_index: u32,
}

/// WebSocket implementation of the part transport capability.
///
/// Holds at most one open transfer at a time, matching the pipeline's
/// one-file-at-a-time control flow.
pub struct WsPartTransport {
    config: GatewayConfig,
    state: Mutex<Option<TransferState>>,
}

impl WsPartTransport {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
        }
    }
}

fn tr(e: ClientError) -> UploadError {
    UploadError::Transport(e.to_string())
}

impl PartTransport for WsPartTransport {
    fn open(
        &self,
        connections: u32,
        file_id: u64,
        part_count: u32,
        large: bool,
    ) -> BoxFuture<'_, Result<(), UploadError>> {
        Box::pin(async move {
            // Round-robin dispatch needs at least one socket; a zero
            // count would open an empty transfer and break every push.
            if connections == 0 {
                return Err(UploadError::Transport(
                    "connection count must be at least 1".into(),
                ));
            }
            let mut conns = Vec::with_capacity(connections as usize);
            for index in 0..connections {
                let mut ws = dial::connect_ws(&self.config.url, self.config.proxy.as_ref())
                    .await
                    .map_err(tr)?;
                session::request_on(
                    &mut ws,
                    "open_transfer",
                    Some(&OpenTransferRequest {
                        token: self.config.token.clone(),
                        file_id,
                        part_count,
                        large,
                        connection_index: index,
                        connection_count: connections,
                    }),
                )
                .await
                .map_err(tr)?;
                conns.push(ws);
            }
            debug!(file_id, connections, part_count, large, "transfer opened");
            *self.state.lock().await = Some(TransferState {
                conns,
                next: 0,
                file_id,
                part_count,
                part_index: 0,
            });
            Ok(())
        })
    }

    fn push(&self, part: Vec<u8>) -> BoxFuture<'_, Result<(), UploadError>> {
        Box::pin(async move {
            let mut guard = self.state.lock().await;
            let state = guard
                .as_mut()
                .ok_or_else(|| UploadError::Transport("no open transfer".into()))?;

            let header = PartHeader {
                file_id: state.file_id,
                part_index: state.part_index,
                part_count: state.part_count,
            };
            let frame =
                encode_frame(&header, &part).map_err(|e| UploadError::Transport(e.to_string()))?;

            let idx = state.next;
            // Suspends until the socket accepts the frame.
            state.conns[idx]
                .send(Message::Binary(frame.into()))
                .await
                .map_err(|e| UploadError::Transport(e.to_string()))?;

            state.next = (idx + 1) % state.conns.len();
            state.part_index += 1;
            Ok(())
        })
    }

    fn finalize(&self) -> BoxFuture<'_, Result<(), UploadError>> {
        Box::pin(async move {
            let state = self
                .state
                .lock()
                .await
                .take()
                .ok_or_else(|| UploadError::Transport("no open transfer".into()))?;
            let TransferState {
                mut conns,
                file_id,
                part_index,
                ..
            } = state;

            for ws in conns.iter_mut() {
                session::request_on(
                    ws,
                    "commit",
                    Some(&CommitRequest {
                        file_id,
                        parts_sent: part_index,
                    }),
                )
                .await
                .map_err(tr)?;
            }
            for mut ws in conns {
                let _ = ws.send(Message::Close(None)).await;
            }
            debug!(file_id, parts = part_index, "transfer committed");
            Ok(())
        })
    }

    /// Scales with size: one connection per started 10 MiB, clamped to
    /// 2..=8. Small files avoid wasted connection setup; large files get
    /// the full fan-out.
    fn default_connection_count(&self, file_size: u64) -> u32 {
        file_size
            .div_ceil(LARGE_FILE_THRESHOLD)
            .clamp(MIN_CONNECTIONS, MAX_CONNECTIONS) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> WsPartTransport {
        WsPartTransport::new(GatewayConfig {
            url: "ws://localhost:1/upload".into(),
            token: "t".into(),
            proxy: None,
        })
    }

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn connection_count_scales_with_size() {
        let t = transport();
        assert_eq!(t.default_connection_count(0), 2);
        assert_eq!(t.default_connection_count(MIB), 2);
        assert_eq!(t.default_connection_count(15 * MIB), 2);
        assert_eq!(t.default_connection_count(25 * MIB), 3);
        assert_eq!(t.default_connection_count(75 * MIB), 8);
        assert_eq!(t.default_connection_count(500 * MIB), 8);
    }

    #[tokio::test]
    async fn open_with_zero_connections_is_rejected() {
        let t = transport();
        let result = t.open(0, 1, 1, false).await;
        assert!(matches!(result, Err(UploadError::Transport(_))));
        // No transfer was left open, so push keeps failing cleanly.
        assert!(matches!(
            t.push(vec![0u8; 16]).await,
            Err(UploadError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn push_without_open_is_rejected() {
        let t = transport();
        let result = t.push(vec![0u8; 16]).await;
        assert!(matches!(result, Err(UploadError::Transport(_))));
    }

    #[tokio::test]
    async fn finalize_without_open_is_rejected() {
        let t = transport();
        assert!(matches!(
            t.finalize().await,
            Err(UploadError::Transport(_))
        ));
    }
}
