//! The public writer.
//!
//! [`RotatingWriter`] guards a [`FlushCoordinator`] with one mutex shared by
//! producers, the background flush worker and explicit `flush_now`/`close`
//! calls. Whoever holds the lock runs its whole operation; there is no
//! finer-grained locking, so nobody ever observes a half-finished rotation.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};
use time::OffsetDateTime;

use crate::clock::{Clock, SystemClock};
use crate::config::WriterConfig;
use crate::fault::{FaultReporter, LogFaultReporter};
use crate::flush::{BatchReport, FlushCoordinator, Phase, WriterStats};
use crate::record::Record;
use crate::{Error, Result};

const WORKER_THREAD_NAME: &str = "hourlog-flush";

type Shared = Arc<Mutex<FlushCoordinator>>;

fn lock(shared: &Shared) -> MutexGuard<'_, FlushCoordinator> {
    // Every coordinator method leaves its state consistent on early return,
    // so a panic elsewhere does not invalidate it.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Periodic flush thread. Stopped by sending on (or dropping) `stop`.
struct FlushWorker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FlushWorker {
    fn spawn(
        shared: Shared,
        interval: Duration,
        reporter: Arc<dyn FaultReporter>,
    ) -> Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let outcome = lock(&shared).tick();
                        if let Err(err) = outcome {
                            reporter.report(&err);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("flush worker panicked");
            }
        }
    }
}

impl Drop for FlushWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct WriterBuilder {
    config: WriterConfig,
    reporter: Arc<dyn FaultReporter>,
    clock: Arc<dyn Clock>,
}

impl WriterBuilder {
    fn new(config: WriterConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(LogFaultReporter),
            clock: Arc::new(SystemClock),
        }
    }

    /// Where errors from background flushes go. Defaults to [`LogFaultReporter`].
    pub fn fault_reporter(mut self, reporter: impl FaultReporter) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Timestamp source for [`RotatingWriter::submit_now`]. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Create the base directory and start the flush worker.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidConfig`: zero flush interval or a path-like prefix
    /// - `Error::DirectoryUnavailable`: base directory could not be created
    /// - `Error::Io`: the worker thread could not be spawned
    pub fn open(self) -> Result<RotatingWriter> {
        let config = self.config;
        config.validate()?;

        let base_dir = &config.base_dir;
        if let Err(source) = std::fs::create_dir_all(base_dir) {
            return Err(Error::DirectoryUnavailable {
                path: base_dir.clone(),
                source,
            });
        }

        let shared = Arc::new(Mutex::new(FlushCoordinator::new(
            base_dir,
            config.prefix.clone(),
        )));
        let worker = FlushWorker::spawn(Arc::clone(&shared), config.flush_interval, self.reporter)?;

        info!(
            "hourlog writer open: dir={} prefix={:?} interval={:?}",
            base_dir.display(),
            config.prefix,
            config.flush_interval
        );
        Ok(RotatingWriter {
            shared,
            worker: Mutex::new(Some(worker)),
            clock: self.clock,
            config,
        })
    }
}

/// Buffers timestamped messages and writes them, in order, to hourly files.
///
/// Share it between producer threads with an `Arc`. Dropping the writer
/// closes it.
///
/// # Example
///
/// ```no_run
/// use hourlog::{RotatingWriter, WriterConfig};
///
/// let writer = RotatingWriter::open(WriterConfig::new("./logs", "app-"))?;
/// writer.submit_now("service started");
/// writer.close()?;
/// # Ok::<(), hourlog::Error>(())
/// ```
pub struct RotatingWriter {
    shared: Shared,
    worker: Mutex<Option<FlushWorker>>,
    clock: Arc<dyn Clock>,
    config: WriterConfig,
}

impl RotatingWriter {
    pub fn open(config: WriterConfig) -> Result<Self> {
        Self::builder(config).open()
    }

    pub fn builder(config: WriterConfig) -> WriterBuilder {
        WriterBuilder::new(config)
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Queue a message. Never touches disk and never fails; messages
    /// submitted after close, or stamped outside UTC years 0 through 9999,
    /// are dropped and counted in [`WriterStats`].
    pub fn submit(&self, content: impl Into<String>, timestamp: OffsetDateTime) {
        lock(&self.shared).submit(Record::new(content, timestamp));
    }

    pub fn submit_now(&self, content: impl Into<String>) {
        let timestamp = self.clock.now();
        self.submit(content, timestamp);
    }

    /// Write everything buffered right now, on the calling thread.
    ///
    /// # Errors
    ///
    /// - `Error::WriterClosed`: the writer has been closed
    /// - `Error::Io`: a bucket file could not be opened or written; the rest
    ///   of the batch is dropped
    pub fn flush_now(&self) -> Result<BatchReport> {
        lock(&self.shared).flush_now()
    }

    /// Stop the worker, write what is still buffered and release the file.
    ///
    /// Idempotent: later calls return `Ok(())` without writing anything. The
    /// file is released even when the final write fails.
    pub fn close(&self) -> Result<()> {
        // The worker may be waiting on the coordinator lock, so join it first.
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut worker) = worker {
            worker.stop();
        }

        let mut coordinator = lock(&self.shared);
        if coordinator.phase() == Phase::Closed {
            return Ok(());
        }
        let result = coordinator.close();
        info!(
            "hourlog writer closed: dir={} stats={:?}",
            self.config.base_dir.display(),
            coordinator.stats()
        );
        result
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared).phase() != Phase::Running
    }

    /// Records buffered and not yet written.
    pub fn pending(&self) -> usize {
        lock(&self.shared).pending()
    }

    pub fn current_file(&self) -> Option<String> {
        lock(&self.shared).current_file().map(str::to_owned)
    }

    pub fn stats(&self) -> WriterStats {
        lock(&self.shared).stats()
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("closing writer on drop failed: {err}");
        }
    }
}
