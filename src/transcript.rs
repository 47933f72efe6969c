//! Append-only conversation transcript.
//!
//! ```text
//! --- New Conversation Started: 2025-01-01 09:30:00.000000 ---
//!
//! [Turn 1 - 2025-01-01 09:30:00]
//! Driver -> BotB: Hello, BotB!
//! BotB -> Driver: Hi there.
//! Driver -> BotA: Hi there.
//! BotA -> Driver: Hello.
//! ```

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, TimeZone};

use crate::error::Result;

const MARKER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TURN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which way a transcript line flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction<'a> {
    ToAgent(&'a str),
    FromAgent(&'a str),
}

impl fmt::Display for Direction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToAgent(label) => write!(f, "Driver -> {label}"),
            Self::FromAgent(label) => write!(f, "{label} -> Driver"),
        }
    }
}

/// Writes transcript records; every write is flushed before returning.
pub struct TranscriptLogger<W: Write = BufWriter<File>> {
    writer: W,
}

impl TranscriptLogger {
    /// Open (or create) the transcript file in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> TranscriptLogger<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Mark the start of a run. Written once per conversation.
    pub fn write_run_marker<Tz>(&mut self, started_at: DateTime<Tz>) -> Result<()>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        writeln!(
            self.writer,
            "\n--- New Conversation Started: {} ---",
            started_at.format(MARKER_TIMESTAMP_FORMAT)
        )?;
        self.flush()
    }

    pub fn write_turn_header<Tz>(&mut self, turn: u32, at: DateTime<Tz>) -> Result<()>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        writeln!(
            self.writer,
            "\n[Turn {turn} - {}]",
            at.format(TURN_TIMESTAMP_FORMAT)
        )?;
        self.flush()
    }

    pub fn write_exchange(&mut self, direction: Direction<'_>, text: &str) -> Result<()> {
        writeln!(self.writer, "{direction}: {text}")?;
        self.flush()
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
