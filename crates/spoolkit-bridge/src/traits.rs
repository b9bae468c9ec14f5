// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The native spooler contract.
//
// Everything Spoolkit knows about the host's printing subsystem comes through
// `NativeSpooler`. Records crossing this boundary are deliberately raw: the
// print crate owns every translation into the normalized model.

use std::collections::BTreeMap;

use spoolkit_core::error::{Result, SpoolError};
use spoolkit_core::types::SpoolerFamily;

/// Open option mapping as reported by the platform.
pub type RawOptions = BTreeMap<String, String>;

/// Driver option schema: group name → choices in driver order.
pub type RawOptionSchema = BTreeMap<String, Vec<RawChoice>>;

/// One supported value of a driver option group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChoice {
    pub value: String,
    /// Whether the driver reports this value as the current selection.
    pub selected: bool,
}

impl RawChoice {
    pub fn new(value: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            selected,
        }
    }
}

/// A printer record before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPrinter {
    pub name: String,
    /// `None` when the platform does not flag defaults on records.
    pub is_default: Option<bool>,
    /// Status the platform already expressed in words (Windows). When
    /// absent, the `printer-state` option is used instead.
    pub status: Option<String>,
    pub driver: Option<String>,
    pub location: Option<String>,
    pub comment: Option<String>,
    /// Includes `printer-state` and epoch-second `*time` values on CUPS.
    pub options: RawOptions,
}

/// A job record before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawJob {
    pub id: u32,
    /// IPP `job-state` (number or keyword) on CUPS; status flag names or a
    /// numeric bitmask on Win32.
    pub state: String,
    pub printer: Option<String>,
    pub document_name: Option<String>,
    pub user: Option<String>,
    pub size_bytes: Option<u64>,
    pub creation_time: Option<i64>,
    pub processing_time: Option<i64>,
    pub completed_time: Option<i64>,
}

/// Synchronous access to the host print spooler.
///
/// Every call blocks until the spooler answers. Implementations must be safe
/// to share across threads; Spoolkit adds no locking of its own.
pub trait NativeSpooler: Send + Sync {
    /// Vocabulary used for raw states and commands.
    fn family(&self) -> SpoolerFamily;

    fn list_printers(&self) -> Result<Vec<RawPrinter>>;

    /// Fails with `PrinterNotFound` for an unknown name.
    fn get_printer(&self, name: &str) -> Result<RawPrinter>;

    /// The user-configured default, if the platform has one.
    fn default_printer_name(&self) -> Result<Option<String>>;

    fn driver_options(&self, printer: &str) -> Result<RawOptionSchema>;

    /// Data formats accepted by [`NativeSpooler::submit_buffer`].
    fn supported_formats(&self) -> Result<Vec<String>>;

    /// Job command verbs accepted by [`NativeSpooler::set_job`].
    fn supported_job_commands(&self) -> Result<Vec<String>>;

    /// Fails with `JobNotFound` once the spooler has purged the job.
    fn get_job(&self, printer: &str, job_id: u32) -> Result<RawJob>;

    /// Returns whether the spooler accepted the command.
    fn set_job(&self, printer: &str, job_id: u32, command: &str) -> Result<bool>;

    /// Submit an in-memory payload. Returns the job id, or 0 when the
    /// spooler accepted the call but produced no job.
    fn submit_buffer(
        &self,
        _data: &[u8],
        _printer: &str,
        _docname: &str,
        _format: &str,
        _options: &RawOptions,
    ) -> Result<u32> {
        Err(SpoolError::UnsupportedOperation("submit_buffer".into()))
    }

    /// Submit a file by path. Returns either a numeric job id or the
    /// spooler's error text.
    fn submit_file(
        &self,
        _filename: &str,
        _docname: &str,
        _printer: &str,
        _options: &RawOptions,
    ) -> Result<String> {
        Err(SpoolError::UnsupportedOperation("submit_file".into()))
    }
}

// ---------------------------------------------------------------------------
// Platform vocabularies
// ---------------------------------------------------------------------------

/// Data formats CUPS accepts for direct submission.
pub const CUPS_FORMATS: &[&str] = &["RAW", "TEXT", "PDF", "JPEG", "POSTSCRIPT", "COMMAND", "AUTO"];

/// Job commands CUPS honours (Cancel-Job, Hold-Job, Release-Job, Restart-Job).
pub const CUPS_JOB_COMMANDS: &[&str] = &["CANCEL", "PAUSE", "RESUME", "RESTART"];

/// Data types the winspool `StartDocPrinter` path accepts.
pub const WIN32_FORMATS: &[&str] = &["RAW", "TEXT"];

/// `SetJob` control codes (`JOB_CONTROL_*`).
pub const WIN32_JOB_COMMANDS: &[&str] = &[
    "PAUSE",
    "RESUME",
    "CANCEL",
    "RESTART",
    "DELETE",
    "SENT_TO_PRINTER",
    "LAST_PAGE_EJECTED",
    "RETAIN",
    "RELEASE",
];
