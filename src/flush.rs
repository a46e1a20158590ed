//! Drain, rotate, write.
//!
//! [`FlushCoordinator`] owns every piece of mutable writer state: the pending
//! records, the open file and the open/closed phase. It does no locking of
//! its own; the façade keeps it behind a single mutex so a batch is atomic
//! with respect to submissions and other batches.

use std::path::PathBuf;

use log::{debug, warn};

use crate::bucket::Bucket;
use crate::buffer::OrderedBuffer;
use crate::record::Record;
use crate::sink::FileSink;
use crate::{Error, Result};

const LINE_TERMINATOR: &str = "\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Closing,
    Closed,
}

/// What a single successful batch wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub records: usize,
    /// Bucket files touched by the batch.
    pub files: usize,
}

/// Lifetime counters for one writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub submitted: u64,
    /// Submissions ignored because the writer was closing or closed.
    pub dropped_after_close: u64,
    /// Submissions ignored because their timestamp has no bucket.
    pub rejected: u64,
    pub written: u64,
    /// Records abandoned when their batch failed.
    pub lost: u64,
    pub failed_batches: u64,
    /// Files opened, including the first.
    pub rotations: u64,
    /// Files reopened for a bucket older than the newest one already opened.
    pub late_reopens: u64,
}

pub struct FlushCoordinator {
    base_dir: PathBuf,
    prefix: String,
    buffer: OrderedBuffer,
    sink: FileSink,
    phase: Phase,
    newest_bucket: Option<Bucket>,
    stats: WriterStats,
}

impl FlushCoordinator {
    pub fn new(base_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            prefix: prefix.into(),
            buffer: OrderedBuffer::new(),
            sink: FileSink::new(),
            phase: Phase::Running,
            newest_bucket: None,
            stats: WriterStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn current_file(&self) -> Option<&str> {
        self.sink.current_name()
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    pub fn submit(&mut self, record: Record) {
        if self.phase != Phase::Running {
            self.stats.dropped_after_close += 1;
            return;
        }
        if Bucket::of(record.timestamp()).is_none() {
            self.stats.rejected += 1;
            warn!(
                "dropping record with out-of-range timestamp {}",
                record.timestamp()
            );
            return;
        }
        self.buffer.enqueue(record);
        self.stats.submitted += 1;
    }

    /// Timer entry point. Does nothing once closing has started.
    pub fn tick(&mut self) -> Result<BatchReport> {
        if self.phase != Phase::Running {
            return Ok(BatchReport::default());
        }
        self.run_batch()
    }

    pub fn flush_now(&mut self) -> Result<BatchReport> {
        if self.phase != Phase::Running {
            return Err(Error::WriterClosed);
        }
        self.run_batch()
    }

    /// Final drain, then release the file. The sink is closed even if the
    /// drain fails; the first error wins.
    pub fn close(&mut self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Ok(());
        }
        self.phase = Phase::Closing;
        let drained = self.run_batch().map(|_| ());
        let released = self.sink.close();
        self.phase = Phase::Closed;
        drained.and(released)
    }

    fn run_batch(&mut self) -> Result<BatchReport> {
        let records = self.buffer.drain_all();
        if records.is_empty() {
            return Ok(BatchReport::default());
        }

        let mut report = BatchReport::default();
        let outcome = self
            .write_groups(&records, &mut report)
            .and_then(|()| self.sink.flush());
        self.stats.written += report.records as u64;

        if let Err(err) = outcome {
            let lost = records.len() - report.records;
            self.stats.failed_batches += 1;
            self.stats.lost += lost as u64;
            if lost > 0 {
                warn!(
                    "abandoning {lost} of {} records after write failure: {err}",
                    records.len()
                );
            }
            // Keep what did make it into the buffer of the open file.
            if self.sink.is_open() {
                if let Err(flush_err) = self.sink.flush() {
                    warn!("flush after failed batch also failed: {flush_err}");
                }
            }
            return Err(err);
        }

        debug!(
            "flushed {} records into {} files",
            report.records, report.files
        );
        Ok(report)
    }

    /// Records arrive sorted, so each bucket is one contiguous run and each
    /// bucket file is opened at most once per batch.
    fn write_groups(&mut self, records: &[Record], report: &mut BatchReport) -> Result<()> {
        // `submit` only buffers records that have a bucket.
        let bucketed: Vec<(Bucket, &Record)> = records
            .iter()
            .filter_map(|record| Bucket::of(record.timestamp()).map(|bucket| (bucket, record)))
            .collect();
        for group in bucketed.chunk_by(|a, b| a.0 == b.0) {
            self.rotate_to(group[0].0)?;
            report.files += 1;
            for (_, record) in group {
                self.sink.write(record.content())?;
                self.sink.write(LINE_TERMINATOR)?;
                report.records += 1;
            }
        }
        Ok(())
    }

    fn rotate_to(&mut self, bucket: Bucket) -> Result<()> {
        let name = bucket.name(&self.prefix);
        if self.sink.current_name() == Some(name.as_str()) {
            return Ok(());
        }

        let late = self.newest_bucket.is_some_and(|newest| bucket < newest);
        let previous = self.sink.current_name().map(str::to_owned);
        self.sink.open_or_append(&self.base_dir.join(&name))?;
        self.stats.rotations += 1;

        if late {
            self.stats.late_reopens += 1;
            warn!(
                "reopened superseded bucket {name}; newest is {}",
                self.newest_bucket.map(|b| b.to_string()).unwrap_or_default()
            );
        } else {
            self.newest_bucket = Some(bucket);
        }
        debug!(
            "rotated {} -> {name}",
            previous.as_deref().unwrap_or("<none>")
        );
        Ok(())
    }
}
