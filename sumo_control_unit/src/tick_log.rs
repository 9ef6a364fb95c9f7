//! Per-tick telemetry sinks.
//!
//! The cycle runner hands every [`TickEvent`] to a [`TickLogger`]. Sink
//! failures never stop the robot; the runner counts and reports them.
//!
//! CSV columns:
//!
//! ```text
//! timestamp,state,us_left_cm,us_right_cm,cs_left,cs_right,error,pid_out,left_speed,right_speed
//! ```
//!
//! Absent distances are empty cells. Floats use `f64`'s `Display`, which is
//! the shortest representation that parses back to the same value.
//!
//! The timestamp is seconds since the start of the run, or an RFC 3339 UTC
//! time once the logger knows when the run started. File loggers from
//! [`CsvTickLogger::create`] always do, so runs appended to one file stay
//! apart.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use sumo_common::control_unit::config::{TickLogConfig, TickLogFormat};
use sumo_common::control_unit::state::TickEvent;
use thiserror::Error;
use tracing::{info, warn};

/// CSV header line (without the newline).
pub const CSV_HEADER: &str =
    "timestamp,state,us_left_cm,us_right_cm,cs_left,cs_right,error,pid_out,left_speed,right_speed";

/// Tick sink failure.
#[derive(Debug, Error)]
pub enum TickLogError {
    /// Write or open failed.
    #[error("tick log I/O error: {source}")]
    Io {
        /// Underlying error.
        #[from]
        source: io::Error,
    },
    /// Event could not be serialized.
    #[error("tick log serialization error: {source}")]
    Json {
        /// Underlying error.
        #[from]
        source: serde_json::Error,
    },
}

/// Destination for tick events.
pub trait TickLogger {
    /// Record one tick.
    fn record(&mut self, event: &TickEvent) -> Result<(), TickLogError>;

    /// Push buffered rows to the underlying sink.
    fn flush(&mut self) -> Result<(), TickLogError> {
        Ok(())
    }
}

impl<T: TickLogger + ?Sized> TickLogger for Box<T> {
    fn record(&mut self, event: &TickEvent) -> Result<(), TickLogError> {
        (**self).record(event)
    }

    fn flush(&mut self) -> Result<(), TickLogError> {
        (**self).flush()
    }
}

// ─── CSV ────────────────────────────────────────────────────────────

/// One CSV row per tick.
#[derive(Debug)]
pub struct CsvTickLogger<W: Write> {
    out: W,
    header_pending: bool,
    run_start: Option<DateTime<Utc>>,
}

impl<W: Write> CsvTickLogger<W> {
    /// Write to a fresh sink; the header goes out with the first row.
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_pending: true,
            run_start: None,
        }
    }

    /// Continue a sink that already holds a header.
    pub fn appending(out: W) -> Self {
        Self {
            out,
            header_pending: false,
            run_start: None,
        }
    }

    /// Write wall-clock timestamps, taking tick time zero as `start`.
    pub fn with_run_start(mut self, start: DateTime<Utc>) -> Self {
        self.run_start = Some(start);
        self
    }

    fn timestamp_cell(&self, event: &TickEvent) -> String {
        let Some(start) = self.run_start else {
            return event.timestamp.as_secs_f64().to_string();
        };
        let at = TimeDelta::from_std(event.timestamp)
            .ok()
            .and_then(|offset| start.checked_add_signed(offset))
            .unwrap_or(start);
        at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl CsvTickLogger<BufWriter<File>> {
    /// Append to `path`, creating it and its parent directories as needed.
    ///
    /// The header is only written when the file is empty. Timestamps are
    /// UTC, starting from now.
    pub fn create(path: &Path) -> Result<Self, TickLogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let empty = file.metadata()?.len() == 0;
        let out = BufWriter::new(file);
        let logger = if empty {
            Self::new(out)
        } else {
            Self::appending(out)
        };
        Ok(logger.with_run_start(Utc::now()))
    }
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl<W: Write> TickLogger for CsvTickLogger<W> {
    fn record(&mut self, event: &TickEvent) -> Result<(), TickLogError> {
        if self.header_pending {
            writeln!(self.out, "{CSV_HEADER}")?;
            self.header_pending = false;
        }
        let snap = &event.snapshot;
        let timestamp = self.timestamp_cell(event);
        writeln!(
            self.out,
            "{},{},{},{},{},{},{},{},{},{}",
            timestamp,
            event.state,
            opt_cell(snap.left_distance),
            opt_cell(snap.right_distance),
            snap.left_reflectance,
            snap.right_reflectance,
            event.error,
            event.pid_output,
            event.command.left,
            event.command.right,
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TickLogError> {
        self.out.flush()?;
        Ok(())
    }
}

// ─── JSON Lines ─────────────────────────────────────────────────────

/// One JSON object per line carrying every [`TickEvent`] field.
#[derive(Debug)]
pub struct JsonLinesTickLogger<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesTickLogger<W> {
    /// Write to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonLinesTickLogger<BufWriter<File>> {
    /// Append to `path`, creating parent directories as needed.
    pub fn create(path: &Path) -> Result<Self, TickLogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TickLogger for JsonLinesTickLogger<W> {
    fn record(&mut self, event: &TickEvent) -> Result<(), TickLogError> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TickLogError> {
        self.out.flush()?;
        Ok(())
    }
}

// ─── Null ───────────────────────────────────────────────────────────

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTickLogger;

impl TickLogger for NullTickLogger {
    fn record(&mut self, _event: &TickEvent) -> Result<(), TickLogError> {
        Ok(())
    }
}

/// Open the sink described by `config`.
///
/// A sink that cannot be opened degrades to [`NullTickLogger`]; the robot
/// runs without telemetry rather than not at all.
pub fn open_tick_logger(config: &TickLogConfig) -> Box<dyn TickLogger> {
    let path = Path::new(&config.path);
    let opened = match config.format {
        TickLogFormat::None => return Box::new(NullTickLogger),
        TickLogFormat::Csv => {
            CsvTickLogger::create(path).map(|l| Box::new(l) as Box<dyn TickLogger>)
        }
        TickLogFormat::Jsonl => {
            JsonLinesTickLogger::create(path).map(|l| Box::new(l) as Box<dyn TickLogger>)
        }
    };
    match opened {
        Ok(logger) => {
            info!("Tick log: {} ({:?})", path.display(), config.format);
            logger
        }
        Err(e) => {
            warn!("Cannot open tick log {}: {e}; tick logging disabled", path.display());
            Box::new(NullTickLogger)
        }
    }
}
