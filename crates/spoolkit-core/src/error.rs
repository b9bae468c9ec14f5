// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spoolkit.

use thiserror::Error;

use crate::types::JobId;

/// Top-level error type for all Spoolkit operations.
#[derive(Debug, Error)]
pub enum SpoolError {
    // -- Registry errors --
    #[error("printing subsystem unavailable: {0}")]
    SpoolerUnavailable(String),

    #[error("printer not found: {0}")]
    PrinterNotFound(String),

    #[error("no printer given and no default printer configured")]
    NoPrinterAvailable,

    // -- Caller errors --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation not supported by the native spooler: {0}")]
    UnsupportedOperation(String),

    #[error("job command not supported on this platform: {0}")]
    UnsupportedCommand(String),

    // -- Job errors --
    #[error("print submission failed: {0}")]
    SubmissionFailed(String),

    #[error("job {job_id} not found on printer {printer}")]
    JobNotFound { printer: String, job_id: JobId },

    // -- Native spooler --
    #[error("native spooler error: {0}")]
    Native(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fieldless category of a [`SpoolError`], for callers that only branch on
/// what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SpoolerUnavailable,
    PrinterNotFound,
    NoPrinterAvailable,
    InvalidArgument,
    UnsupportedOperation,
    UnsupportedCommand,
    SubmissionFailed,
    JobNotFound,
    Native,
    Io,
    Serialization,
}

impl SpoolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SpoolerUnavailable(_) => ErrorKind::SpoolerUnavailable,
            Self::PrinterNotFound(_) => ErrorKind::PrinterNotFound,
            Self::NoPrinterAvailable => ErrorKind::NoPrinterAvailable,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Self::UnsupportedCommand(_) => ErrorKind::UnsupportedCommand,
            Self::SubmissionFailed(_) => ErrorKind::SubmissionFailed,
            Self::JobNotFound { .. } => ErrorKind::JobNotFound,
            Self::Native(_) => ErrorKind::Native,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolError>;
