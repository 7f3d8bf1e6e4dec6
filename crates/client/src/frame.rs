//! Binary part frames: 4-byte big-endian header length + JSON header +
//! raw part payload.

use serde::{Deserialize, Serialize};

/// Header carried with every uploaded part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartHeader {
    /// Per-file upload identifier, correlating parts with their transfer.
    pub file_id: u64,
    /// Zero-based index of this part within the file.
    pub part_index: u32,
    /// Total number of parts announced for the file.
    pub part_count: u32,
}

/// Errors from parsing a binary frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame too short for header length prefix")]
    TooShort,

    #[error("header truncated: expected {expected} bytes, got {got}")]
    HeaderTruncated { expected: usize, got: usize },

    #[error("invalid header JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes `header` and `payload` into one wire frame.
pub fn encode_frame(header: &PartHeader, payload: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
    let json = serde_json::to_vec(header)?;
    let mut out = Vec::with_capacity(4 + json.len() + payload.len());
    out.extend_from_slice(&(json.len() as u32).to_be_bytes());
    out.extend_from_slice(&json);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Parses a wire frame back into its header and payload.
pub fn decode_part_frame(data: &[u8]) -> Result<(PartHeader, &[u8]), FrameError> {
    if data.len() < 4 {
        return Err(FrameError::TooShort);
    }
    let header_len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < 4 + header_len {
        return Err(FrameError::HeaderTruncated {
            expected: header_len,
            got: data.len() - 4,
        });
    }
    let header: PartHeader = serde_json::from_slice(&data[4..4 + header_len])?;
    Ok((header, &data[4 + header_len..]))
}
