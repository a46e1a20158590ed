use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use hourlog::{RotatingWriter, SystemClock, TscClock, WriterConfig};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClockKind {
    System,
    Tsc,
}

#[derive(Parser, Debug)]
#[command(name = "hourlog")]
#[command(about = "Write stdin lines into hourly rotated, time-ordered log files")]
struct Cli {
    /// Directory to create log files in
    #[arg(long)]
    base_dir: PathBuf,

    /// Prefix for every log file name
    #[arg(long, default_value = "")]
    prefix: String,

    /// Milliseconds between background flushes
    #[arg(long, default_value_t = 1000)]
    flush_ms: u64,

    /// Treat a leading RFC 3339 token on each line as its timestamp
    #[arg(long)]
    timestamps: bool,

    /// Clock used for lines without a timestamp
    #[arg(long, value_enum, default_value_t = ClockKind::System)]
    clock: ClockKind,
}

fn split_timestamp(line: &str) -> Option<(OffsetDateTime, &str)> {
    let (token, rest) = line.split_once(' ')?;
    let timestamp = OffsetDateTime::parse(token, &Rfc3339).ok()?;
    Some((timestamp, rest))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = WriterConfig::new(&cli.base_dir, cli.prefix);
    config.flush_interval = Duration::from_millis(cli.flush_ms);

    let builder = RotatingWriter::builder(config);
    let builder = match cli.clock {
        ClockKind::System => builder.clock(SystemClock),
        ClockKind::Tsc => builder.clock(TscClock::new()),
    };
    let writer = builder
        .open()
        .with_context(|| format!("failed to open writer in {}", cli.base_dir.display()))?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let parsed = if cli.timestamps {
            split_timestamp(&line)
        } else {
            None
        };
        if let Some((timestamp, content)) = parsed {
            writer.submit(content, timestamp);
            continue;
        }
        writer.submit_now(line);
    }

    writer.close().context("failed to close writer")?;
    info!("done: {:?}", writer.stats());
    Ok(())
}
