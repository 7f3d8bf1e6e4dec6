//! Batch orchestration: catalog order in, summary line out.

use std::io::Write;
use std::time::Instant;

use tracing::info;

use fastpush_catalog::FileEntry;
use fastpush_transfer::{ThroughputMeter, MB};

use crate::error::UploadError;
use crate::gateway::{GatewayApi, PartTransport, Peer};
use crate::pipeline::{self, FileIdSource, RandomFileIds};

/// Running totals across a batch, folded once per completed file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchReport {
    pub files: usize,
    pub bytes: u64,
    pub seconds: f64,
}

impl BatchReport {
    /// Overall average rate in MB/s.
    pub fn average_rate(&self) -> f64 {
        if self.seconds > 0.0 {
            self.bytes as f64 / MB / self.seconds
        } else {
            0.0
        }
    }
}

/// Drives the whole batch: for each file, upload through the transport,
/// send the descriptor to the target, and fold totals. Files run strictly
/// sequentially; parallelism exists only inside one file's transfer.
pub struct BatchRunner<'a> {
    transport: &'a dyn PartTransport,
    gateway: &'a dyn GatewayApi,
    connections: Option<u32>,
    ids: Box<dyn FileIdSource + Send>,
    out: Box<dyn Write + Send>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(transport: &'a dyn PartTransport, gateway: &'a dyn GatewayApi) -> Self {
        Self {
            transport,
            gateway,
            connections: None,
            ids: Box::new(RandomFileIds),
            out: Box::new(std::io::stdout()),
        }
    }

    /// Forces the per-file connection count instead of asking the
    /// transport for a size-appropriate default.
    pub fn connections(mut self, connections: Option<u32>) -> Self {
        self.connections = connections;
        self
    }

    /// Replaces the file-id source (deterministic ids in tests).
    pub fn file_ids(mut self, ids: Box<dyn FileIdSource + Send>) -> Self {
        self.ids = ids;
        self
    }

    /// Redirects the per-file and summary lines away from stdout.
    pub fn output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = out;
        self
    }

    /// Uploads `files` to `target` in order and prints the batch summary.
    ///
    /// An empty list reports "no files" and succeeds without touching the
    /// transport or the gateway. The first transfer or send failure aborts
    /// the remaining files.
    pub async fn run(
        &mut self,
        target: &Peer,
        files: &[FileEntry],
    ) -> Result<BatchReport, UploadError> {
        if files.is_empty() {
            writeln!(self.out, "no video files found")?;
            info!("batch empty, nothing to upload");
            return Ok(BatchReport::default());
        }

        let total = files.len();
        let mut report = BatchReport::default();

        for (idx, entry) in files.iter().enumerate() {
            writeln!(
                self.out,
                "\n[{}/{}] {} ({:.2} MB)",
                idx + 1,
                total,
                entry.name,
                entry.size as f64 / MB
            )?;

            let mut meter = ThroughputMeter::new(entry.label());
            let started = Instant::now();

            let descriptor = pipeline::upload_file(
                self.transport,
                entry,
                self.connections,
                self.ids.as_mut(),
                &mut meter,
            )
            .await?;
            self.gateway.send_media(target, &descriptor, true).await?;

            let seconds = started.elapsed().as_secs_f64();
            let avg = if seconds > 0.0 {
                entry.size as f64 / MB / seconds
            } else {
                0.0
            };
            writeln!(
                self.out,
                "done: {} in {seconds:.2}s avg {avg:.2} MB/s",
                entry.name
            )?;
            info!(file = %entry.name, bytes = entry.size, seconds, "file uploaded");

            report.files += 1;
            report.bytes += entry.size;
            report.seconds += seconds;
        }

        writeln!(
            self.out,
            "\ntotal: {:.2} MB / {:.2}s = {:.2} MB/s",
            report.bytes as f64 / MB,
            report.seconds,
            report.average_rate()
        )?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;

    use crate::gateway::BoxFuture;
    use crate::pipeline::tests::{write_file, MockTransport, SeqIds};
    use fastpush_transfer::UploadDescriptor;

    /// Gateway mock recording sent descriptors.
    #[derive(Default)]
    struct MockGateway {
        sent: Mutex<Vec<(Peer, UploadDescriptor, bool)>>,
        resolved: Mutex<Vec<String>>,
        closed: Mutex<u32>,
    }

    impl GatewayApi for MockGateway {
        fn resolve_target(&self, identifier: &str) -> BoxFuture<'_, Result<Peer, UploadError>> {
            let ident = identifier.to_string();
            Box::pin(async move {
                self.resolved.lock().unwrap().push(ident.clone());
                Ok(Peer::parse(&ident))
            })
        }

        fn send_media(
            &self,
            target: &Peer,
            media: &UploadDescriptor,
            streaming: bool,
        ) -> BoxFuture<'_, Result<(), UploadError>> {
            let target = target.clone();
            let media = media.clone();
            Box::pin(async move {
                self.sent.lock().unwrap().push((target, media, streaming));
                Ok(())
            })
        }

        fn close(&self) -> BoxFuture<'_, Result<(), UploadError>> {
            Box::pin(async move {
                *self.closed.lock().unwrap() += 1;
                Ok(())
            })
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    const MIB: usize = 1024 * 1024;

    #[tokio::test]
    async fn empty_batch_reports_and_touches_nothing() {
        let transport = MockTransport::default();
        let gateway = MockGateway::default();
        let buf = SharedBuf::default();

        let report = BatchRunner::new(&transport, &gateway)
            .output(Box::new(buf.clone()))
            .run(&Peer::Id(1), &[])
            .await
            .unwrap();

        assert_eq!(report, BatchReport::default());
        assert!(buf.contents().contains("no video files found"));
        assert!(transport.opens.lock().unwrap().is_empty());
        assert!(gateway.sent.lock().unwrap().is_empty());
        assert_eq!(*gateway.closed.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn three_file_scenario_matches_the_expected_accounting() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write_file(dir.path(), "a.mp4", MIB),
            write_file(dir.path(), "b.mp4", 9 * MIB + MIB / 2),
            write_file(dir.path(), "c.mp4", 15 * MIB),
        ];

        let transport = MockTransport::default();
        let gateway = MockGateway::default();
        let buf = SharedBuf::default();

        let report = BatchRunner::new(&transport, &gateway)
            .file_ids(Box::new(SeqIds(100)))
            .output(Box::new(buf.clone()))
            .run(&Peer::Name("@bench".into()), &files)
            .await
            .unwrap();

        // Part counts with 512 KiB parts: 2, 19, 30.
        let opens = transport.opens.lock().unwrap().clone();
        let parts: Vec<u32> = opens.iter().map(|o| o.2).collect();
        assert_eq!(parts, vec![2, 19, 30]);

        // Hash present for the first two, absent for the 15 MiB file.
        let sent = gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(sent[0].1.checksum().is_some());
        assert!(sent[1].1.checksum().is_some());
        assert!(sent[2].1.checksum().is_none());
        assert!(sent.iter().all(|(_, _, streaming)| *streaming));
        assert!(sent.iter().all(|(peer, _, _)| *peer == Peer::Name("@bench".into())));

        // Totals: sum of sizes, and the average is bytes over seconds.
        assert_eq!(report.files, 3);
        assert_eq!(report.bytes, (25 * MIB + MIB / 2) as u64);
        assert!(report.seconds > 0.0);
        let expected_avg = report.bytes as f64 / MB / report.seconds;
        assert!((report.average_rate() - expected_avg).abs() < 1e-9);

        // Deterministic ids flow through to the descriptors in order.
        let ids: Vec<u64> = sent.iter().map(|(_, d, _)| d.file_id()).collect();
        assert_eq!(ids, vec![101, 102, 103]);

        let console = buf.contents();
        assert!(console.contains("[1/3] a.mp4 (1.00 MB)"));
        assert!(console.contains("[3/3] c.mp4 (15.00 MB)"));
        assert!(console.contains("total: 25.50 MB"));
    }

    #[tokio::test]
    async fn transfer_failure_stops_the_batch() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write_file(dir.path(), "a.mp4", 1000),
            write_file(dir.path(), "b.mp4", 1000),
            write_file(dir.path(), "c.mp4", 1000),
        ];

        // Second open refused: first file succeeds, batch dies on file two.
        let transport = MockTransport {
            fail_open_at: Some(1),
            ..Default::default()
        };
        let gateway = MockGateway::default();

        let result = BatchRunner::new(&transport, &gateway)
            .output(Box::new(SharedBuf::default()))
            .run(&Peer::Id(5), &files)
            .await;

        assert!(matches!(result, Err(UploadError::Transport(_))));
        assert_eq!(gateway.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn connection_override_reaches_every_open() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write_file(dir.path(), "a.mp4", 1000),
            write_file(dir.path(), "b.mp4", 1000),
        ];

        let transport = MockTransport::default();
        let gateway = MockGateway::default();

        BatchRunner::new(&transport, &gateway)
            .connections(Some(9))
            .output(Box::new(SharedBuf::default()))
            .run(&Peer::Id(5), &files)
            .await
            .unwrap();

        let opens = transport.opens.lock().unwrap().clone();
        assert!(opens.iter().all(|o| o.0 == 9));
    }
}
