// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job submission.
//
// Each attempt moves Building → Dispatched → Succeeded | Failed exactly once.
// Defaults and validation are applied while building, so argument errors are
// reported before the spooler is touched. There are no retries: a failed
// dispatch is reported to the caller as-is.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument, warn};

use spoolkit_core::error::{Result, SpoolError};
use spoolkit_core::types::JobId;

use crate::service::{PrintService, given};

/// Where a submission attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// Arguments defaulted and validated; nothing sent yet.
    Building,
    /// Handed to the spooler; waiting for its answer.
    Dispatched,
    Succeeded,
    Failed,
}

impl std::fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Building => "building",
            Self::Dispatched => "dispatched",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// An in-memory document to print.
#[derive(Debug, Clone, Default)]
pub struct DirectPrint {
    pub data: Vec<u8>,
    /// `None` (or `""`) prints to the default printer.
    pub printer: Option<String>,
    pub docname: Option<String>,
    /// Spooler data type (`RAW`, `TEXT`, `PDF`, ...), any case.
    pub format: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl DirectPrint {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn printer(mut self, name: impl Into<String>) -> Self {
        self.printer = Some(name.into());
        self
    }

    pub fn docname(mut self, name: impl Into<String>) -> Self {
        self.docname = Some(name.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// A document on disk, printed by the spooler reading the file itself.
#[derive(Debug, Clone, Default)]
pub struct FilePrint {
    pub filename: String,
    pub printer: Option<String>,
    /// Defaults to the filename.
    pub docname: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl FilePrint {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn printer(mut self, name: impl Into<String>) -> Self {
        self.printer = Some(name.into());
        self
    }

    pub fn docname(mut self, name: impl Into<String>) -> Self {
        self.docname = Some(name.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl PrintService {
    /// Submit an in-memory buffer as one print job.
    #[instrument(skip(self, request), fields(bytes = request.data.len()))]
    pub fn print_direct(&self, request: DirectPrint) -> Result<JobId> {
        debug!(phase = %SubmissionPhase::Building, "print_direct");
        let format = given(request.format.as_deref().map(str::trim))
            .unwrap_or(self.config().default_format.trim())
            .to_ascii_uppercase();
        let docname = given(request.docname.as_deref())
            .unwrap_or(&self.config().default_docname)
            .to_string();
        let printer = self.resolve_printer(request.printer.as_deref())?;

        debug!(
            phase = %SubmissionPhase::Dispatched,
            printer = %printer,
            format = %format,
            docname = %docname,
            "print_direct"
        );
        let outcome = self
            .spooler()
            .submit_buffer(&request.data, &printer, &docname, &format, &request.options)
            .and_then(|id| match id {
                0 => Err(SpoolError::SubmissionFailed(format!(
                    "spooler returned no job id for '{docname}' on {printer}"
                ))),
                id => Ok(JobId(id)),
            });
        finish(&printer, outcome)
    }

    /// Submit a file by path as one print job.
    #[instrument(skip(self, request), fields(file = %request.filename))]
    pub fn print_file(&self, request: FilePrint) -> Result<JobId> {
        debug!(phase = %SubmissionPhase::Building, "print_file");
        if request.filename.is_empty() {
            return Err(SpoolError::InvalidArgument(
                "print_file requires a filename".into(),
            ));
        }
        let printer = self.resolve_printer(request.printer.as_deref())?;
        let docname = given(request.docname.as_deref())
            .unwrap_or(&request.filename)
            .to_string();

        debug!(
            phase = %SubmissionPhase::Dispatched,
            printer = %printer,
            docname = %docname,
            "print_file"
        );
        let outcome = self
            .spooler()
            .submit_file(&request.filename, &docname, &printer, &request.options)
            .and_then(|reply| parse_job_id(&reply).ok_or(SpoolError::SubmissionFailed(reply)));
        finish(&printer, outcome)
    }
}

/// A spooler reply is a job id only when it is a non-negative integer;
/// anything else is the spooler's error text.
pub fn parse_job_id(reply: &str) -> Option<JobId> {
    reply.trim().parse::<u32>().ok().map(JobId)
}

fn finish(printer: &str, outcome: Result<JobId>) -> Result<JobId> {
    match &outcome {
        Ok(job_id) => info!(
            phase = %SubmissionPhase::Succeeded,
            printer = %printer,
            job_id = %job_id,
            "job submitted"
        ),
        Err(e) => warn!(
            phase = %SubmissionPhase::Failed,
            printer = %printer,
            error = %e,
            "job submission failed"
        ),
    }
    outcome
}
