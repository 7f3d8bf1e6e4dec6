//! Local transfer mechanics: fixed-size part reading, size classing,
//! content hashing and throughput metering.
//!
//! The network side of an upload lives behind the transport capability in
//! `fastpush-uploader`; this crate only knows how to slice a file into
//! parts, decide which descriptor shape the file gets, and report progress
//! without letting console I/O dominate wall-clock time.

mod meter;
mod parts;
mod types;

pub use meter::{DEFAULT_REPORT_INTERVAL, ProgressSink, ThroughputMeter};
pub use parts::{ContentHasher, PartReader, part_count};
pub use types::UploadDescriptor;

/// Size of one locally read part: 512 KiB.
///
/// Deliberately much larger than the transport's own network-chunk
/// granularity, so local reads and per-call overhead never throttle the
/// parallel connections downstream.
pub const PART_SIZE: usize = 512 * 1024;

/// Files strictly larger than this (10 MiB) use the big-file descriptor
/// and skip the content hash.
pub const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// One mebibyte, as used in all rate and progress arithmetic.
pub const MB: f64 = (1024 * 1024) as f64;

/// Returns `true` for the large size class. Exactly 10 MiB is not large.
pub fn is_large(size: u64) -> bool {
    size > LARGE_FILE_THRESHOLD
}

/// Errors produced by local transfer mechanics.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
