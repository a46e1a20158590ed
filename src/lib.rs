//! Time-ordered log writer with hourly file rotation.
//!
//! Producers submit timestamped messages from any number of threads. The
//! writer buffers them, orders them by `(timestamp, content)` and flushes
//! them from a background thread into one append-only file per UTC hour,
//! named `<prefix><YYYY>-<MM>-<DD>T<HH>00.log`.

pub mod bucket;
pub mod buffer;
pub mod clock;
pub mod config;
pub mod error;
pub mod fault;
pub mod flush;
pub mod record;
pub mod sink;
pub mod writer;

pub use bucket::{bucket_name, Bucket};
pub use clock::{Clock, SystemClock, TscClock};
pub use config::WriterConfig;
pub use error::{Error, Result};
pub use fault::{FaultReporter, LogFaultReporter};
pub use flush::{BatchReport, WriterStats};
pub use record::Record;
pub use writer::{RotatingWriter, WriterBuilder};
