// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Normalized domain types shared by every spooler backend.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SpoolError;

/// Spooler-assigned job identifier, unique per printer per spooler session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u32);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for JobId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Which spooler vocabulary a backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpoolerFamily {
    /// CUPS / IPP (Linux, macOS, BSD).
    Cups,
    /// Windows print spooler (winspool).
    Win32,
}

/// Live printer status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterStatus {
    Idle,
    Printing,
    Stopped,
    /// A platform status code with no normalized meaning, kept verbatim.
    Unrecognized(String),
}

impl PrinterStatus {
    /// Normalized name (`IDLE`, `PRINTING`, `STOPPED`) or the raw code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "IDLE",
            Self::Printing => "PRINTING",
            Self::Stopped => "STOPPED",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl std::fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of an open, platform-defined printer option.
///
/// Options whose key ends in `time` and whose raw value is an epoch-seconds
/// integer are surfaced as [`OptionValue::Time`]; everything else stays text.
/// Serialized externally tagged (`{"time": ...}` / `{"text": ...}`) so text
/// that happens to look like a timestamp survives a JSON round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionValue {
    Time(DateTime<Utc>),
    Text(String),
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Time(_) => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(t) => Some(*t),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Open option mapping carried by a [`Printer`].
///
/// Well-known keys: `printer-state` (raw status code), and any key ending in
/// `time` (absolute timestamps). Consumers must tolerate unknown keys.
pub type PrinterOptions = BTreeMap<String, OptionValue>;

/// A printer as seen by the host spooler, materialized fresh on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printer {
    /// Unique within the host.
    pub name: String,
    pub driver: Option<String>,
    pub location: Option<String>,
    pub comment: Option<String>,
    pub is_default: bool,
    pub status: PrinterStatus,
    pub options: PrinterOptions,
}

/// One configurable driver attribute (e.g. page size) and its choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    /// Supported values in the order the driver reports them.
    pub choices: Vec<String>,
    /// Currently selected value, if the driver marks one.
    pub selected: Option<String>,
}

impl OptionGroup {
    pub fn supports(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c == value)
    }
}

/// Per-printer driver option schema: group name → choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverOptions {
    groups: BTreeMap<String, OptionGroup>,
}

impl DriverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, group: OptionGroup) {
        self.groups.insert(name.into(), group);
    }

    pub fn get(&self, name: &str) -> Option<&OptionGroup> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &OptionGroup)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Normalized job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Waiting in the spooler queue.
    Queued,
    /// Being processed or sent to the device.
    Printing,
    /// Held by a user or stopped by the spooler.
    Paused,
    Completed,
    Canceled,
    /// Aborted by the system or blocked on an error condition.
    Error,
    /// The platform reported a state with no normalized meaning; see
    /// [`Job::raw_state`].
    Unknown,
}

impl JobState {
    /// Whether the spooler will do no further work on the job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Error)
    }
}

/// A print job tracked by the spooler until completion or purge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub printer: String,
    pub document_name: String,
    pub state: JobState,
    /// State as reported by the platform before normalization.
    pub raw_state: String,
    pub user: Option<String>,
    pub size_bytes: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub processing_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Job lifecycle commands across both spooler families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobCommand {
    Cancel,
    Pause,
    Resume,
    Restart,
    Delete,
    Retain,
    Release,
    SentToPrinter,
    LastPageEjected,
}

impl JobCommand {
    pub const ALL: [JobCommand; 9] = [
        Self::Cancel,
        Self::Pause,
        Self::Resume,
        Self::Restart,
        Self::Delete,
        Self::Retain,
        Self::Release,
        Self::SentToPrinter,
        Self::LastPageEjected,
    ];

    /// Canonical upper-case verb used by the spoolers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancel => "CANCEL",
            Self::Pause => "PAUSE",
            Self::Resume => "RESUME",
            Self::Restart => "RESTART",
            Self::Delete => "DELETE",
            Self::Retain => "RETAIN",
            Self::Release => "RELEASE",
            Self::SentToPrinter => "SENT_TO_PRINTER",
            Self::LastPageEjected => "LAST_PAGE_EJECTED",
        }
    }
}

impl std::fmt::Display for JobCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobCommand {
    type Err = SpoolError;

    /// Case-insensitive; `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| SpoolError::UnsupportedCommand(s.to_string()))
    }
}
