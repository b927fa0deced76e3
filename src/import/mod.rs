//! Spreadsheet reconciliation import
//!
//! Two phases per chamber, run by the `import` subcommand: committee-key
//! resolution first, then hearing reconciliation. Every recoverable problem
//! becomes one line in the run log; only the post-chamber row-count check
//! is fatal.

mod categories;
mod committees;
mod hearings;

pub use categories::import_category_file;
pub use committees::{import_committee_keys, CommitteeResolver};
pub use hearings::{import_hearings, ImportCounters};

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Everything that can go wrong with a single row. All variants except
/// `ConsistencyViolation` degrade to run-log diagnostics.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no committee matched key {lugar_id} ({lugar_name})")]
    UnresolvedCommittee { lugar_id: String, lugar_name: String },

    #[error("multiple committees matched key {lugar_id} ({lugar_name})")]
    AmbiguousCommittee { lugar_id: String, lugar_name: String },

    #[error("unrecognized category {0:?}")]
    RejectedCategory(String),

    #[error("multiple scraped hearings matched, candidates: {0:?}")]
    AmbiguousHearingMatch(Vec<String>),

    #[error("hearing number {0:?} has no NN-N token")]
    MalformedHearingNumber(String),

    #[error("{chamber} import shortfall of {shortfall} rows exceeds tolerance {tolerance}")]
    ConsistencyViolation {
        chamber: &'static str,
        shortfall: i64,
        tolerance: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chamber {
    House,
    Senate,
}

impl Chamber {
    pub fn name(&self) -> &'static str {
        match self {
            Chamber::House => "House",
            Chamber::Senate => "Senate",
        }
    }

    /// Canonical name of the chamber's root organization
    pub fn organization_name(&self) -> &'static str {
        match self {
            Chamber::House => "United States House of Representatives",
            Chamber::Senate => "United States Senate",
        }
    }
}

/// Append-only diagnostics file. One line per issue, grouped by phase with
/// a blank-line separator, every line carrying the originating row number.
pub struct RunLog {
    writer: BufWriter<std::fs::File>,
    lines: usize,
}

impl RunLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open run log {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    pub fn phase(&mut self, name: &str) -> Result<()> {
        if self.lines > 0 {
            writeln!(self.writer)?;
        }
        writeln!(self.writer, "== {} ==", name)?;
        self.lines += 1;
        Ok(())
    }

    pub fn row(&mut self, row_number: usize, message: impl std::fmt::Display) -> Result<()> {
        writeln!(self.writer, "row {}: {}", row_number, message)?;
        self.lines += 1;
        Ok(())
    }

    pub fn note(&mut self, message: impl std::fmt::Display) -> Result<()> {
        writeln!(self.writer, "{}", message)?;
        self.lines += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Repair the mojibake the legacy spreadsheets carry (UTF-8 punctuation
/// read back as Windows-1252).
pub fn clean_encoding(text: &str) -> String {
    text.replace("â€“", "–")
        .replace("â€™", "’")
        .replace("â€\u{9d}", "”")
        .replace("â€œ", "“")
        .replace("â€˜", "‘")
        .replace("â€”", "—")
}

/// Legacy dates sometimes carry a time suffix; keep only the date part.
pub fn clean_date(raw: &str) -> String {
    match raw.split_once('T') {
        Some((date, _)) => date.trim().to_string(),
        None => raw.trim().to_string(),
    }
}
