//! Upload descriptor produced by a completed transfer session.

use serde::{Deserialize, Serialize};

/// The finalized reference to an uploaded file, handed to the send
/// capability so the remote service attaches the content to a message.
///
/// The variant encodes the size class: only non-large files carry a
/// content hash, so "hash present iff not large" cannot be violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UploadDescriptor {
    /// A file at or below the large threshold, with a hex SHA-256 of its
    /// content for receiver-side integrity verification.
    #[serde(rename_all = "camelCase")]
    Plain {
        file_id: u64,
        part_count: u32,
        name: String,
        checksum: String,
    },
    /// A file above the large threshold. Hashing the full content would
    /// be wasted cost; the transport's own integrity mechanism applies.
    #[serde(rename_all = "camelCase")]
    Big {
        file_id: u64,
        part_count: u32,
        name: String,
    },
}

impl UploadDescriptor {
    /// Identifier correlating this upload's parts on the transport.
    pub fn file_id(&self) -> u64 {
        match self {
            Self::Plain { file_id, .. } | Self::Big { file_id, .. } => *file_id,
        }
    }

    /// Number of parts the file was split into.
    pub fn part_count(&self) -> u32 {
        match self {
            Self::Plain { part_count, .. } | Self::Big { part_count, .. } => *part_count,
        }
    }

    /// Display name of the uploaded file.
    pub fn name(&self) -> &str {
        match self {
            Self::Plain { name, .. } | Self::Big { name, .. } => name,
        }
    }

    /// Content hash, present only for the non-large size class.
    pub fn checksum(&self) -> Option<&str> {
        match self {
            Self::Plain { checksum, .. } => Some(checksum),
            Self::Big { .. } => None,
        }
    }
}
