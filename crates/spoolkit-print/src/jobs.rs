// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job control and status.
//
// Jobs are looked up by (printer, id) on every call; nothing is tracked here.
// Raw spooler states are mapped onto `JobState` per spooler family: IPP
// `job-state` enums/keywords for CUPS, job status flags for Windows.

use tracing::{debug, info, instrument};

use spoolkit_bridge::RawJob;
use spoolkit_core::error::{Result, SpoolError};
use spoolkit_core::types::{Job, JobCommand, JobId, JobState, SpoolerFamily};

use crate::service::PrintService;

impl PrintService {
    /// Current record of a job; `JobNotFound` once the spooler has
    /// forgotten it (or never knew it).
    #[instrument(skip(self))]
    pub fn get_job(&self, printer: &str, job_id: JobId) -> Result<Job> {
        require_printer(printer)?;
        let raw = self.spooler().get_job(printer, job_id.0)?;
        let job = normalize_job(self.family(), raw, printer);
        debug!(state = ?job.state, raw_state = %job.raw_state, "job fetched");
        Ok(job)
    }

    /// Send a control command (`CANCEL`, `PAUSE`, ...) to a job.
    ///
    /// The command is matched case-insensitively against the spooler's
    /// supported set. Returns whether the spooler accepted it.
    #[instrument(skip(self))]
    pub fn set_job(&self, printer: &str, job_id: JobId, command: &str) -> Result<bool> {
        require_printer(printer)?;
        let wanted = command.trim().to_ascii_uppercase().replace('-', "_");
        if wanted.is_empty() || !self.supported_job_commands()?.contains(&wanted) {
            return Err(SpoolError::UnsupportedCommand(command.to_string()));
        }
        let accepted = self.spooler().set_job(printer, job_id.0, &wanted)?;
        info!(printer = %printer, command = %wanted, accepted, "job command sent");
        Ok(accepted)
    }

    /// Typed form of [`PrintService::set_job`].
    pub fn control_job(&self, printer: &str, job_id: JobId, command: JobCommand) -> Result<bool> {
        self.set_job(printer, job_id, command.as_str())
    }
}

fn require_printer(printer: &str) -> Result<()> {
    if printer.is_empty() {
        return Err(SpoolError::InvalidArgument(
            "job operations require a printer name".into(),
        ));
    }
    Ok(())
}

/// Normalize a raw job record; `printer` fills in a missing printer name.
pub fn normalize_job(family: SpoolerFamily, raw: RawJob, printer: &str) -> Job {
    let timestamp = |secs: Option<i64>| secs.and_then(|s| chrono::DateTime::from_timestamp(s, 0));
    Job {
        id: JobId(raw.id),
        printer: raw.printer.unwrap_or_else(|| printer.to_string()),
        document_name: raw.document_name.unwrap_or_default(),
        state: normalize_job_state(family, &raw.state),
        user: raw.user,
        size_bytes: raw.size_bytes,
        created_at: timestamp(raw.creation_time),
        processing_at: timestamp(raw.processing_time),
        completed_at: timestamp(raw.completed_time),
        raw_state: raw.state,
    }
}

/// Map a raw job state onto [`JobState`] using the family's vocabulary.
pub fn normalize_job_state(family: SpoolerFamily, raw: &str) -> JobState {
    match family {
        SpoolerFamily::Cups => cups_job_state(raw),
        SpoolerFamily::Win32 => win32_job_state(raw),
    }
}

/// IPP `job-state` (RFC 8011 §5.3.7), as enum number or keyword.
fn cups_job_state(raw: &str) -> JobState {
    match raw.trim().to_ascii_lowercase().as_str() {
        "3" | "pending" => JobState::Queued,
        "4" | "pending-held" => JobState::Paused,
        "5" | "processing" => JobState::Printing,
        "6" | "processing-stopped" => JobState::Paused,
        "7" | "canceled" | "cancelled" => JobState::Canceled,
        "8" | "aborted" => JobState::Error,
        "9" | "completed" => JobState::Completed,
        _ => JobState::Unknown,
    }
}

/// winspool `JOB_STATUS_*` bits.
const WIN32_STATUS_FLAGS: [(u32, &str); 15] = [
    (0x0001, "PAUSED"),
    (0x0002, "ERROR"),
    (0x0004, "DELETING"),
    (0x0008, "SPOOLING"),
    (0x0010, "PRINTING"),
    (0x0020, "OFFLINE"),
    (0x0040, "PAPEROUT"),
    (0x0080, "PRINTED"),
    (0x0100, "DELETED"),
    (0x0200, "BLOCKED_DEVQ"),
    (0x0400, "USER_INTERVENTION"),
    (0x0800, "RESTART"),
    (0x1000, "COMPLETE"),
    (0x2000, "RETAINED"),
    (0x4000, "RENDERING_LOCALLY"),
];

const WIN32_ERROR_FLAGS: [&str; 6] = [
    "ERROR",
    "OFFLINE",
    "PAPEROUT",
    "BLOCKED",
    "BLOCKED_DEVQ",
    "USER_INTERVENTION",
];

/// Windows job status: flag names separated by `,`, `|` or whitespace, or
/// the numeric bitmask (decimal or `0x` hex). Several flags may be set at
/// once; the most significant condition wins.
fn win32_job_state(raw: &str) -> JobState {
    let Some(flags) = win32_flags(raw) else {
        return JobState::Unknown;
    };
    let has = |names: &[&str]| flags.iter().any(|f| names.contains(&f.as_str()));

    if has(&WIN32_ERROR_FLAGS) {
        JobState::Error
    } else if has(&["COMPLETE", "PRINTED"]) {
        JobState::Completed
    } else if has(&["DELETING", "DELETED"]) {
        JobState::Canceled
    } else if has(&["PAUSED"]) {
        JobState::Paused
    } else if has(&["PRINTING", "SPOOLING", "RENDERING_LOCALLY"]) {
        JobState::Printing
    } else if flags.is_empty() || has(&["RESTART", "RETAINED"]) {
        JobState::Queued
    } else {
        JobState::Unknown
    }
}

/// Flag names in `raw`, or `None` if any token is not a known flag.
fn win32_flags(raw: &str) -> Option<Vec<String>> {
    let raw = raw.trim();
    if let Some(mask) = parse_mask(raw) {
        return Some(
            WIN32_STATUS_FLAGS
                .iter()
                .filter(|(bit, _)| mask & bit != 0)
                .map(|(_, name)| name.to_string())
                .collect(),
        );
    }
    raw.split(|c: char| c == ',' || c == '|' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|token| {
            let token = token.to_ascii_uppercase();
            let name = token.strip_prefix("JOB_STATUS_").unwrap_or(&token);
            let known = name == "BLOCKED" || WIN32_STATUS_FLAGS.iter().any(|(_, f)| *f == name);
            known.then(|| name.to_string())
        })
        .collect()
}

fn parse_mask(raw: &str) -> Option<u32> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::DirectPrint;
    use crate::testing::*;
    use spoolkit_bridge::{MemorySpooler, SpoolerCall};
    use spoolkit_core::error::ErrorKind;
    use std::sync::Arc;

    fn win32_spooler() -> Arc<MemorySpooler> {
        Arc::new(MemorySpooler::new(SpoolerFamily::Win32).with_printer(raw_printer("HP", "3")))
    }

    #[test]
    fn cups_states() {
        let cases = [
            ("3", JobState::Queued),
            ("4", JobState::Paused),
            ("5", JobState::Printing),
            ("6", JobState::Paused),
            ("7", JobState::Canceled),
            ("8", JobState::Error),
            ("9", JobState::Completed),
            ("pending-held", JobState::Paused),
            ("Completed", JobState::Completed),
            ("12", JobState::Unknown),
        ];
        for (raw, state) in cases {
            assert_eq!(normalize_job_state(SpoolerFamily::Cups, raw), state, "raw {raw}");
        }
    }

    #[test]
    fn win32_flag_names() {
        let cases = [
            ("", JobState::Queued),
            ("SPOOLING", JobState::Printing),
            ("PRINTING|PAPEROUT", JobState::Error),
            ("JOB_STATUS_PAUSED", JobState::Paused),
            ("DELETING, PRINTING", JobState::Canceled),
            ("DELETING PRINTED", JobState::Completed),
            ("RETAINED", JobState::Queued),
            ("BLOCKED", JobState::Error),
            ("SHREDDING", JobState::Unknown),
        ];
        for (raw, state) in cases {
            assert_eq!(normalize_job_state(SpoolerFamily::Win32, raw), state, "raw {raw:?}");
        }
    }

    #[test]
    fn win32_bitmask() {
        assert_eq!(normalize_job_state(SpoolerFamily::Win32, "0"), JobState::Queued);
        assert_eq!(normalize_job_state(SpoolerFamily::Win32, "16"), JobState::Printing);
        assert_eq!(normalize_job_state(SpoolerFamily::Win32, "0x1000"), JobState::Completed);
        // PRINTING | OFFLINE
        assert_eq!(normalize_job_state(SpoolerFamily::Win32, "48"), JobState::Error);
    }

    #[test]
    fn submitted_job_is_queued() {
        let spooler = lab_spooler();
        let service = service(&spooler);
        let id = service
            .print_direct(DirectPrint::new("x").printer("lab").docname("memo"))
            .expect("print");
        let job = service.get_job("lab", id).expect("job");
        assert_eq!(job.id, id);
        assert_eq!(job.printer, "lab");
        assert_eq!(job.document_name, "memo");
        assert_eq!(job.state, JobState::Queued);
        assert_eq!(job.raw_state, "3");
        assert!(job.created_at.is_some());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn purged_and_unknown_jobs_are_not_found() {
        let spooler = lab_spooler();
        let service = service(&spooler);
        let id = service
            .print_direct(DirectPrint::new("x").printer("lab"))
            .expect("print");
        spooler.purge_job("lab", id.0);
        assert_eq!(service.get_job("lab", id).unwrap_err().kind(), ErrorKind::JobNotFound);
        assert_eq!(
            service.get_job("lab", JobId(999)).unwrap_err().kind(),
            ErrorKind::JobNotFound
        );
    }

    #[test]
    fn bogus_command_is_unsupported() {
        let spooler = lab_spooler();
        let service = service(&spooler);
        let id = service
            .print_direct(DirectPrint::new("x").printer("lab"))
            .expect("print");
        let err = service.set_job("lab", id, "BOGUS").unwrap_err();
        assert!(matches!(err, SpoolError::UnsupportedCommand(ref c) if c == "BOGUS"));
        // CUPS has no RETAIN
        assert_eq!(
            service.set_job("lab", id, "retain").unwrap_err().kind(),
            ErrorKind::UnsupportedCommand
        );
        assert!(!spooler.calls().iter().any(|c| matches!(c, SpoolerCall::SetJob { .. })));
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let spooler = lab_spooler();
        let service = service(&spooler);
        let id = service
            .print_direct(DirectPrint::new("x").printer("lab"))
            .expect("print");

        assert!(service.set_job("lab", id, "pause").expect("pause"));
        assert_eq!(service.get_job("lab", id).expect("job").state, JobState::Paused);
        assert!(service.control_job("lab", id, JobCommand::Resume).expect("resume"));
        assert_eq!(service.get_job("lab", id).expect("job").state, JobState::Queued);
        assert!(service.set_job("lab", id, "Cancel").expect("cancel"));
        assert_eq!(service.get_job("lab", id).expect("job").state, JobState::Canceled);
    }

    #[test]
    fn finished_job_rejects_commands() {
        let spooler = lab_spooler();
        let service = service(&spooler);
        let id = service
            .print_direct(DirectPrint::new("x").printer("lab"))
            .expect("print");
        spooler.set_job_state("lab", id.0, "9");
        assert!(!service.set_job("lab", id, "CANCEL").expect("answer"));
    }

    #[test]
    fn win32_job_lifecycle() {
        let spooler = win32_spooler();
        let service = service(&spooler);
        let id = service
            .print_direct(DirectPrint::new("x").printer("HP"))
            .expect("print");
        assert_eq!(service.get_job("HP", id).expect("job").state, JobState::Printing);

        assert!(service.set_job("HP", id, "sent-to-printer").expect("sent"));
        assert_eq!(service.get_job("HP", id).expect("job").state, JobState::Completed);

        assert!(service.set_job("HP", id, "DELETE").expect("delete"));
        assert_eq!(service.get_job("HP", id).unwrap_err().kind(), ErrorKind::JobNotFound);
    }

    #[test]
    fn empty_printer_name_is_rejected() {
        let spooler = lab_spooler();
        let err = service(&spooler).get_job("", JobId(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(spooler.calls().is_empty());
    }

    #[test]
    fn missing_printer_falls_back_to_argument() {
        let raw = RawJob {
            id: 5,
            state: "5".into(),
            creation_time: Some(1_700_000_000),
            completed_time: Some(0),
            ..RawJob::default()
        };
        let job = normalize_job(SpoolerFamily::Cups, raw, "lab");
        assert_eq!(job.printer, "lab");
        assert_eq!(job.state, JobState::Printing);
        assert_eq!(job.created_at, chrono::DateTime::from_timestamp(1_700_000_000, 0));
    }
}
