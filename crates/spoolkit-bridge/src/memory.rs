// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory spooler.
//
// A complete `NativeSpooler` that keeps printers, driver schemas and jobs in
// process memory and records every call it receives. Used by the print crate's
// tests and by embedders who need a deterministic spooler in CI.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use spoolkit_core::error::{Result, SpoolError};
use spoolkit_core::types::{JobId, SpoolerFamily};

use crate::traits::*;

/// One call received by a [`MemorySpooler`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpoolerCall {
    ListPrinters,
    GetPrinter(String),
    DefaultPrinterName,
    DriverOptions(String),
    SupportedFormats,
    SupportedJobCommands,
    GetJob {
        printer: String,
        job_id: u32,
    },
    SetJob {
        printer: String,
        job_id: u32,
        command: String,
    },
    SubmitBuffer {
        printer: String,
        docname: String,
        format: String,
        options: RawOptions,
        len: usize,
    },
    SubmitFile {
        filename: String,
        docname: String,
        printer: String,
        options: RawOptions,
    },
}

#[derive(Debug, Default)]
struct MemoryState {
    printers: Vec<RawPrinter>,
    default_name: Option<String>,
    schemas: BTreeMap<String, RawOptionSchema>,
    jobs: BTreeMap<(String, u32), RawJob>,
    next_job_id: u32,
    calls: Vec<SpoolerCall>,
    offline: bool,
    buffer_reply: Option<u32>,
    file_reply: Option<String>,
}

/// Deterministic in-process spooler.
pub struct MemorySpooler {
    family: SpoolerFamily,
    formats: Vec<String>,
    commands: Vec<String>,
    buffer_submission: bool,
    file_submission: bool,
    state: Mutex<MemoryState>,
}

impl MemorySpooler {
    /// Empty spooler speaking the given family's vocabulary.
    pub fn new(family: SpoolerFamily) -> Self {
        let (formats, commands) = match family {
            SpoolerFamily::Cups => (CUPS_FORMATS, CUPS_JOB_COMMANDS),
            SpoolerFamily::Win32 => (WIN32_FORMATS, WIN32_JOB_COMMANDS),
        };
        Self {
            family,
            formats: formats.iter().map(|s| s.to_string()).collect(),
            commands: commands.iter().map(|s| s.to_string()).collect(),
            buffer_submission: true,
            file_submission: true,
            state: Mutex::new(MemoryState {
                next_job_id: 1,
                ..MemoryState::default()
            }),
        }
    }

    pub fn with_printer(self, printer: RawPrinter) -> Self {
        self.lock().printers.push(printer);
        self
    }

    /// Platform-level default (what `cupsGetDefault` / `GetDefaultPrinter`
    /// would answer).
    pub fn with_default(self, name: impl Into<String>) -> Self {
        self.lock().default_name = Some(name.into());
        self
    }

    pub fn with_driver_options(self, printer: impl Into<String>, schema: RawOptionSchema) -> Self {
        self.lock().schemas.insert(printer.into(), schema);
        self
    }

    pub fn with_formats(mut self, formats: &[&str]) -> Self {
        self.formats = formats.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_job_commands(mut self, commands: &[&str]) -> Self {
        self.commands = commands.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_job(self, printer: impl Into<String>, job: RawJob) -> Self {
        {
            let mut state = self.lock();
            state.next_job_id = state.next_job_id.max(job.id.saturating_add(1));
            state.jobs.insert((printer.into(), job.id), job);
        }
        self
    }

    /// Behave like a host whose spooler does not implement buffer submission.
    pub fn without_buffer_submission(mut self) -> Self {
        self.buffer_submission = false;
        self
    }

    /// Behave like a host whose spooler does not implement file submission.
    pub fn without_file_submission(mut self) -> Self {
        self.file_submission = false;
        self
    }

    /// Answer every `submit_buffer` with this id instead of creating a job.
    pub fn reply_to_buffer(self, job_id: u32) -> Self {
        self.lock().buffer_reply = Some(job_id);
        self
    }

    /// Answer every `submit_file` with this text instead of creating a job.
    pub fn reply_to_file(self, reply: impl Into<String>) -> Self {
        self.lock().file_reply = Some(reply.into());
        self
    }

    /// Simulate the printing subsystem going away (or coming back).
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Drop a job as the spooler's retention policy would.
    pub fn purge_job(&self, printer: &str, job_id: u32) {
        self.lock().jobs.remove(&(printer.to_string(), job_id));
    }

    /// Overwrite a job's raw state.
    pub fn set_job_state(&self, printer: &str, job_id: u32, state: &str) {
        if let Some(job) = self.lock().jobs.get_mut(&(printer.to_string(), job_id)) {
            job.state = state.to_string();
        }
    }

    pub fn calls(&self) -> Vec<SpoolerCall> {
        self.lock().calls.clone()
    }

    pub fn jobs(&self) -> Vec<RawJob> {
        self.lock().jobs.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and fail if the spooler is offline.
    fn enter(&self, call: SpoolerCall) -> Result<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        debug!(call = ?call, "memory spooler call");
        state.calls.push(call);
        if state.offline {
            return Err(SpoolError::SpoolerUnavailable(
                "memory spooler is offline".into(),
            ));
        }
        Ok(state)
    }

    fn queued_state(&self) -> &'static str {
        match self.family {
            SpoolerFamily::Cups => "3",
            SpoolerFamily::Win32 => "SPOOLING",
        }
    }

    /// Raw state a successful command leaves behind, or `None` for commands
    /// that remove the job.
    fn state_after(&self, command: &str) -> Option<&'static str> {
        match (self.family, command) {
            (_, "DELETE") => None,
            (SpoolerFamily::Cups, "CANCEL") => Some("7"),
            (SpoolerFamily::Cups, "PAUSE") => Some("4"),
            (SpoolerFamily::Cups, "RESUME" | "RESTART") => Some("3"),
            (SpoolerFamily::Win32, "CANCEL") => Some("DELETING"),
            (SpoolerFamily::Win32, "PAUSE") => Some("PAUSED"),
            (SpoolerFamily::Win32, "RESUME" | "RELEASE") => Some(""),
            (SpoolerFamily::Win32, "RESTART") => Some("RESTART"),
            (SpoolerFamily::Win32, "RETAIN") => Some("RETAINED"),
            (SpoolerFamily::Win32, "SENT_TO_PRINTER" | "LAST_PAGE_EJECTED") => Some("PRINTED"),
            (_, _) => Some(self.queued_state()),
        }
    }

    fn create_job(state: &mut MemoryState, printer: &str, docname: &str, queued: &str, size: u64) -> u32 {
        let id = state.next_job_id;
        state.next_job_id = id.saturating_add(1);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        state.jobs.insert(
            (printer.to_string(), id),
            RawJob {
                id,
                state: queued.to_string(),
                printer: Some(printer.to_string()),
                document_name: Some(docname.to_string()),
                user: None,
                size_bytes: Some(size),
                creation_time: Some(now),
                processing_time: None,
                completed_time: None,
            },
        );
        id
    }
}

impl NativeSpooler for MemorySpooler {
    fn family(&self) -> SpoolerFamily {
        self.family
    }

    fn list_printers(&self) -> Result<Vec<RawPrinter>> {
        let state = self.enter(SpoolerCall::ListPrinters)?;
        Ok(state.printers.clone())
    }

    fn get_printer(&self, name: &str) -> Result<RawPrinter> {
        let state = self.enter(SpoolerCall::GetPrinter(name.to_string()))?;
        state
            .printers
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| SpoolError::PrinterNotFound(name.to_string()))
    }

    fn default_printer_name(&self) -> Result<Option<String>> {
        let state = self.enter(SpoolerCall::DefaultPrinterName)?;
        Ok(state.default_name.clone())
    }

    fn driver_options(&self, printer: &str) -> Result<RawOptionSchema> {
        let state = self.enter(SpoolerCall::DriverOptions(printer.to_string()))?;
        if !state.printers.iter().any(|p| p.name == printer) {
            return Err(SpoolError::PrinterNotFound(printer.to_string()));
        }
        Ok(state.schemas.get(printer).cloned().unwrap_or_default())
    }

    fn supported_formats(&self) -> Result<Vec<String>> {
        self.enter(SpoolerCall::SupportedFormats)?;
        Ok(self.formats.clone())
    }

    fn supported_job_commands(&self) -> Result<Vec<String>> {
        self.enter(SpoolerCall::SupportedJobCommands)?;
        Ok(self.commands.clone())
    }

    fn get_job(&self, printer: &str, job_id: u32) -> Result<RawJob> {
        let state = self.enter(SpoolerCall::GetJob {
            printer: printer.to_string(),
            job_id,
        })?;
        state
            .jobs
            .get(&(printer.to_string(), job_id))
            .cloned()
            .ok_or_else(|| SpoolError::JobNotFound {
                printer: printer.to_string(),
                job_id: JobId(job_id),
            })
    }

    fn set_job(&self, printer: &str, job_id: u32, command: &str) -> Result<bool> {
        let mut state = self.enter(SpoolerCall::SetJob {
            printer: printer.to_string(),
            job_id,
            command: command.to_string(),
        })?;
        let key = (printer.to_string(), job_id);
        let Some(job) = state.jobs.get(&key) else {
            return Err(SpoolError::JobNotFound {
                printer: printer.to_string(),
                job_id: JobId(job_id),
            });
        };
        if !self.commands.iter().any(|c| c == command) {
            return Ok(false);
        }
        // Finished jobs only accept removal.
        let finished = matches!(job.state.as_str(), "7" | "8" | "9" | "DELETED" | "PRINTED" | "COMPLETE");
        if finished && command != "DELETE" {
            return Ok(false);
        }
        match self.state_after(command) {
            Some(next) => {
                if let Some(job) = state.jobs.get_mut(&key) {
                    job.state = next.to_string();
                }
            }
            None => {
                state.jobs.remove(&key);
            }
        }
        Ok(true)
    }

    fn submit_buffer(
        &self,
        data: &[u8],
        printer: &str,
        docname: &str,
        format: &str,
        options: &RawOptions,
    ) -> Result<u32> {
        if !self.buffer_submission {
            return Err(SpoolError::UnsupportedOperation("submit_buffer".into()));
        }
        let mut state = self.enter(SpoolerCall::SubmitBuffer {
            printer: printer.to_string(),
            docname: docname.to_string(),
            format: format.to_string(),
            options: options.clone(),
            len: data.len(),
        })?;
        if let Some(reply) = state.buffer_reply {
            return Ok(reply);
        }
        if !state.printers.iter().any(|p| p.name == printer) {
            return Err(SpoolError::PrinterNotFound(printer.to_string()));
        }
        if !self.formats.iter().any(|f| f == format) {
            return Err(SpoolError::Native(format!("unsupported data type {format}")));
        }
        let queued = self.queued_state();
        Ok(Self::create_job(&mut state, printer, docname, queued, data.len() as u64))
    }

    fn submit_file(
        &self,
        filename: &str,
        docname: &str,
        printer: &str,
        options: &RawOptions,
    ) -> Result<String> {
        if !self.file_submission {
            return Err(SpoolError::UnsupportedOperation("submit_file".into()));
        }
        let mut state = self.enter(SpoolerCall::SubmitFile {
            filename: filename.to_string(),
            docname: docname.to_string(),
            printer: printer.to_string(),
            options: options.clone(),
        })?;
        if let Some(reply) = &state.file_reply {
            return Ok(reply.clone());
        }
        if !state.printers.iter().any(|p| p.name == printer) {
            return Ok(format!("The printer or class does not exist: {printer}"));
        }
        let size = std::fs::metadata(filename).map(|m| m.len()).unwrap_or(0);
        let queued = self.queued_state();
        let id = Self::create_job(&mut state, printer, docname, queued, size);
        Ok(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printer(name: &str) -> RawPrinter {
        RawPrinter {
            name: name.into(),
            ..RawPrinter::default()
        }
    }

    #[test]
    fn submitted_jobs_get_increasing_ids() {
        let spooler = MemorySpooler::new(SpoolerFamily::Cups).with_printer(printer("lab"));
        let a = spooler
            .submit_buffer(b"one", "lab", "a", "RAW", &RawOptions::new())
            .expect("submit a");
        let b = spooler
            .submit_buffer(b"two", "lab", "b", "RAW", &RawOptions::new())
            .expect("submit b");
        assert_eq!((a, b), (1, 2));
        assert_eq!(spooler.get_job("lab", 2).expect("job").document_name.as_deref(), Some("b"));
    }

    #[test]
    fn seeded_jobs_are_visible_and_bump_ids() {
        let seeded = RawJob {
            id: 41,
            state: "5".into(),
            document_name: Some("seeded".into()),
            ..RawJob::default()
        };
        let spooler = MemorySpooler::new(SpoolerFamily::Cups)
            .with_printer(printer("lab"))
            .with_job("lab", seeded.clone());
        assert_eq!(spooler.get_job("lab", 41).expect("seeded job"), seeded);
        let next = spooler
            .submit_buffer(b"x", "lab", "x", "RAW", &RawOptions::new())
            .expect("submit");
        assert_eq!(next, 42);
    }

    #[test]
    fn seeding_the_largest_job_id_does_not_overflow() {
        let spooler = MemorySpooler::new(SpoolerFamily::Win32).with_job(
            "HP",
            RawJob {
                id: u32::MAX,
                ..RawJob::default()
            },
        );
        assert_eq!(spooler.jobs().len(), 1);
        assert!(spooler.get_job("HP", u32::MAX).is_ok());
    }

    #[test]
    fn purged_job_is_not_found() {
        let spooler = MemorySpooler::new(SpoolerFamily::Cups).with_printer(printer("lab"));
        let id = spooler
            .submit_buffer(b"x", "lab", "x", "RAW", &RawOptions::new())
            .expect("submit");
        spooler.purge_job("lab", id);
        assert!(matches!(
            spooler.get_job("lab", id),
            Err(SpoolError::JobNotFound { .. })
        ));
    }

    #[test]
    fn pause_and_resume_move_cups_state() {
        let spooler = MemorySpooler::new(SpoolerFamily::Cups).with_printer(printer("lab"));
        let id = spooler
            .submit_buffer(b"x", "lab", "x", "RAW", &RawOptions::new())
            .expect("submit");

        assert!(spooler.set_job("lab", id, "PAUSE").expect("pause"));
        assert_eq!(spooler.get_job("lab", id).unwrap().state, "4");
        assert!(spooler.set_job("lab", id, "RESUME").expect("resume"));
        assert_eq!(spooler.get_job("lab", id).unwrap().state, "3");
    }

    #[test]
    fn completed_job_rejects_pause() {
        let spooler = MemorySpooler::new(SpoolerFamily::Cups).with_printer(printer("lab"));
        let id = spooler
            .submit_buffer(b"x", "lab", "x", "RAW", &RawOptions::new())
            .expect("submit");
        spooler.set_job_state("lab", id, "9");
        assert!(!spooler.set_job("lab", id, "PAUSE").expect("answer"));
    }

    #[test]
    fn win32_delete_removes_job() {
        let spooler = MemorySpooler::new(SpoolerFamily::Win32).with_printer(printer("HP"));
        let id = spooler
            .submit_buffer(b"x", "HP", "x", "RAW", &RawOptions::new())
            .expect("submit");
        assert!(spooler.set_job("HP", id, "DELETE").expect("delete"));
        assert!(spooler.jobs().is_empty());
    }

    #[test]
    fn offline_spooler_records_then_fails() {
        let spooler = MemorySpooler::new(SpoolerFamily::Cups);
        spooler.set_offline(true);
        assert!(matches!(
            spooler.list_printers(),
            Err(SpoolError::SpoolerUnavailable(_))
        ));
        assert_eq!(spooler.calls(), vec![SpoolerCall::ListPrinters]);
    }

    #[test]
    fn file_submission_to_unknown_printer_returns_text() {
        let spooler = MemorySpooler::new(SpoolerFamily::Cups);
        let reply = spooler
            .submit_file("/tmp/x.pdf", "x", "ghost", &RawOptions::new())
            .expect("reply");
        assert!(reply.contains("does not exist"));
    }
}
