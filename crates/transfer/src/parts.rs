//! Fixed-size part reading and incremental content hashing.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::{PART_SIZE, TransferError};

/// Number of parts a file of `size` bytes splits into at [`PART_SIZE`].
pub fn part_count(size: u64) -> u32 {
    size.div_ceil(PART_SIZE as u64) as u32
}

// ---------------------------------------------------------------------------
// PartReader
// ---------------------------------------------------------------------------

/// Reads a file in fixed-size parts, in offset order.
///
/// Every part except possibly the last is exactly `part_size` bytes; a
/// zero-length read terminates the sequence. Only one part buffer exists
/// at a time, which bounds the pipeline's memory use.
pub struct PartReader {
    file: std::fs::File,
    part_size: usize,
    offset: u64,
    file_size: u64,
}

impl PartReader {
    /// Opens `path` for part-wise reading.
    ///
    /// If `part_size` is 0, [`PART_SIZE`] (512 KiB) is used.
    pub fn new(path: &Path, part_size: usize) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        let part_size = if part_size == 0 { PART_SIZE } else { part_size };
        Ok(Self {
            file,
            part_size,
            offset: 0,
            file_size,
        })
    }

    /// Reads the next part. Returns `None` at EOF.
    pub fn next_part(&mut self) -> Result<Option<Vec<u8>>, TransferError> {
        let remaining = self.file_size.saturating_sub(self.offset);
        if remaining == 0 {
            return Ok(None);
        }

        let want = std::cmp::min(remaining, self.part_size as u64) as usize;
        let mut buf = vec![0u8; want];
        let mut filled = 0;
        // A plain read may come back short; fill the part so every part
        // except the last has exactly part_size bytes.
        while filled < want {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        self.offset += filled as u64;
        Ok(Some(buf))
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

// ---------------------------------------------------------------------------
// ContentHasher
// ---------------------------------------------------------------------------

/// Incremental SHA-256 over the parts of a small file.
///
/// Large files skip hashing entirely; the transport's own integrity
/// mechanism covers them.
pub struct ContentHasher {
    hasher: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Folds one part into the hash.
    pub fn update(&mut self, part: &[u8]) {
        self.hasher.update(part);
    }

    /// Finishes and returns the hex-encoded digest.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
