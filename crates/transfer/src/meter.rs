//! Rate-limited throughput reporting.
//!
//! A per-part progress callback can fire hundreds of times per file;
//! printing on every call would make console I/O the bottleneck and fold
//! print overhead into the rate measurements. The meter therefore emits
//! at most one overwriting status line per interval, with the terminal
//! sample always emitted so every file ends on a complete line.

use std::io::Write;
use std::time::{Duration, Instant};

use crate::MB;

/// Minimum delay between emitted status lines.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(500);

/// Observer fed with cumulative progress samples.
///
/// `current` is monotonically non-decreasing within one upload session;
/// the terminal sample has `current == total`. Implementations may fail,
/// and the pipeline deliberately ignores those failures: a reporting bug
/// must never abort an otherwise-successful transfer.
pub trait ProgressSink {
    fn observe(&mut self, current: u64, total: u64) -> std::io::Result<()>;
}

/// Writes a single carriage-return status line per emission: absolute
/// progress in MB, percent complete, instantaneous rate since the last
/// emission, and cumulative average rate since construction.
pub struct ThroughputMeter {
    label: String,
    min_interval: Duration,
    start: Instant,
    /// Timestamp and byte count of the last emission; `None` until the
    /// first sample is emitted.
    last_emit: Option<(Instant, u64)>,
    out: Box<dyn Write + Send>,
}

impl ThroughputMeter {
    /// Meter printing to stdout with the default interval.
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_sink(label, DEFAULT_REPORT_INTERVAL, Box::new(std::io::stdout()))
    }

    /// Meter with an explicit interval and output sink.
    pub fn with_sink(
        label: impl Into<String>,
        min_interval: Duration,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            label: label.into(),
            min_interval,
            start: Instant::now(),
            last_emit: None,
            out,
        }
    }

    fn emit(&mut self, now: Instant, current: u64, total: u64) -> std::io::Result<()> {
        let (since_last, last_bytes) = match self.last_emit {
            Some((t, b)) => (now.duration_since(t).as_secs_f64(), b),
            None => (now.duration_since(self.start).as_secs_f64(), 0),
        };
        let inst = if since_last > 0.0 {
            (current.saturating_sub(last_bytes)) as f64 / MB / since_last
        } else {
            0.0
        };
        let elapsed = now.duration_since(self.start).as_secs_f64();
        let avg = if elapsed > 0.0 {
            current as f64 / MB / elapsed
        } else {
            0.0
        };
        let percent = if total > 0 {
            current as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        write!(
            self.out,
            "\r{} {:8.2}/{:8.2} MB {:6.2}% inst {:6.2} MB/s avg {:6.2} MB/s",
            self.label,
            current as f64 / MB,
            total as f64 / MB,
            percent,
            inst,
            avg,
        )?;
        if current == total {
            writeln!(self.out)?;
        }
        self.out.flush()?;

        self.last_emit = Some((now, current));
        Ok(())
    }
}

impl ProgressSink for ThroughputMeter {
    fn observe(&mut self, current: u64, total: u64) -> std::io::Result<()> {
        let now = Instant::now();
        let throttled = match self.last_emit {
            Some((t, _)) => now.duration_since(t) < self.min_interval,
            // The first sample always emits.
            None => false,
        };
        if throttled && current != total {
            return Ok(());
        }
        self.emit(now, current, total)
    }
}
