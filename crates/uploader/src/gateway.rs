//! Capability traits at the network seam.
//!
//! The parallel-connection transport and the authenticated messaging
//! session are external collaborators. Traits keep the pipeline decoupled
//! from the wire and testable with mocks; methods are object-safe via
//! boxed futures, and implementations clone borrowed arguments into the
//! returned future.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use fastpush_transfer::UploadDescriptor;

/// Boxed future used by the object-safe capability traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The facility that carries ordered parts to the remote service,
/// potentially over multiple concurrent connections. How it schedules
/// parts across connections is entirely its own concern; the pipeline
/// only promises to push parts in file-offset order, one at a time.
pub trait PartTransport: Send + Sync {
    /// Opens a transfer session for one file.
    fn open(
        &self,
        connections: u32,
        file_id: u64,
        part_count: u32,
        large: bool,
    ) -> BoxFuture<'_, Result<(), UploadError>>;

    /// Pushes one part. Suspends until the transport accepts it, so no
    /// part is read from disk until the previous one has been handed
    /// over.
    fn push(&self, part: Vec<u8>) -> BoxFuture<'_, Result<(), UploadError>>;

    /// Finalizes the open transfer session.
    fn finalize(&self) -> BoxFuture<'_, Result<(), UploadError>>;

    /// Size-appropriate connection count when the caller gives no
    /// override. Too many connections waste setup on small files; too few
    /// under-utilize bandwidth on large ones.
    fn default_connection_count(&self, file_size: u64) -> u32;
}

/// The authenticated session: target resolution, the send call that
/// attaches an uploaded file to an outgoing message, and disconnect.
pub trait GatewayApi: Send + Sync {
    /// Resolves a target identifier to a concrete peer.
    fn resolve_target(&self, identifier: &str) -> BoxFuture<'_, Result<Peer, UploadError>>;

    /// Requests that the uploaded object be sent to `target`.
    fn send_media(
        &self,
        target: &Peer,
        media: &UploadDescriptor,
        streaming: bool,
    ) -> BoxFuture<'_, Result<(), UploadError>>;

    /// Releases the session. Must be called exactly once, on every exit
    /// path.
    fn close(&self) -> BoxFuture<'_, Result<(), UploadError>>;
}

/// A messaging target: a numeric peer id or a symbolic name still to be
/// resolved by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Peer {
    Id(i64),
    Name(String),
}

impl Peer {
    /// Parses a raw identifier: anything that reads as a signed integer
    /// is a peer id, everything else is a name.
    pub fn parse(raw: &str) -> Peer {
        let s = raw.trim();
        match s.parse::<i64>() {
            Ok(id) => Peer::Id(id),
            Err(_) => Peer::Name(s.to_string()),
        }
    }
}
