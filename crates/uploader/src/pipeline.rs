//! The chunked, rate-instrumented upload pipeline for a single file.

use rand::Rng;
use tracing::debug;

use fastpush_catalog::FileEntry;
use fastpush_transfer::{
    is_large, part_count, ContentHasher, PartReader, ProgressSink, UploadDescriptor,
};

use crate::error::UploadError;
use crate::gateway::PartTransport;

/// Source of per-file 64-bit identifiers.
///
/// Injected so tests can supply deterministic ids; production uses
/// [`RandomFileIds`].
pub trait FileIdSource {
    fn next_file_id(&mut self) -> u64;
}

/// Draws a fresh random id per file.
pub struct RandomFileIds;

impl FileIdSource for RandomFileIds {
    fn next_file_id(&mut self) -> u64 {
        rand::rng().random()
    }
}

/// Uploads one file through the transport and returns its descriptor.
///
/// The file is read in fixed 512 KiB parts, in offset order, one buffer
/// in flight at a time. Non-large files fold every part into a content
/// hash; large files skip it. Transport failures propagate and abort the
/// file; progress-sink failures are swallowed.
pub async fn upload_file(
    transport: &dyn PartTransport,
    entry: &FileEntry,
    connections: Option<u32>,
    ids: &mut dyn FileIdSource,
    progress: &mut dyn ProgressSink,
) -> Result<UploadDescriptor, UploadError> {
    let size = entry.size;
    let parts = part_count(size);
    let large = is_large(size);
    let file_id = ids.next_file_id();
    let connections = connections.unwrap_or_else(|| transport.default_connection_count(size));

    debug!(
        file = %entry.name,
        size,
        parts,
        connections,
        large,
        "opening transfer session"
    );
    transport.open(connections, file_id, parts, large).await?;

    let mut reader = PartReader::new(&entry.path, 0)?;
    let mut hasher = (!large).then(ContentHasher::new);
    let mut sent: u64 = 0;

    while let Some(part) = reader.next_part()? {
        sent += part.len() as u64;
        if let Some(h) = hasher.as_mut() {
            h.update(&part);
        }
        transport.push(part).await?;
        // A reporting bug must never abort the transfer.
        if let Err(e) = progress.observe(sent, size) {
            debug!(error = %e, "progress sink failure ignored");
        }
    }

    transport.finalize().await?;
    debug!(file = %entry.name, bytes = sent, "transfer finalized");

    Ok(match hasher {
        Some(h) => UploadDescriptor::Plain {
            file_id,
            part_count: parts,
            name: entry.name.clone(),
            checksum: h.finish(),
        },
        None => UploadDescriptor::Big {
            file_id,
            part_count: parts,
            name: entry.name.clone(),
        },
    })
}
