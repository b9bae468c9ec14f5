// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub spooler for hosts without a native backend.
//
// Every call fails with `SpoolerUnavailable`. Embedders that ship their own
// binding (e.g. a winspool implementation) plug it in through
// `NativeSpooler` instead.

use spoolkit_core::error::{Result, SpoolError};
use spoolkit_core::types::SpoolerFamily;

use crate::traits::*;

/// Spooler returned when no backend exists for the target platform.
pub struct StubSpooler;

impl StubSpooler {
    fn unavailable<T>(operation: &str) -> Result<T> {
        tracing::warn!(operation, "NativeSpooler called on stub spooler");
        Err(SpoolError::SpoolerUnavailable(format!(
            "no native spooler backend on this platform ({operation})"
        )))
    }
}

impl NativeSpooler for StubSpooler {
    fn family(&self) -> SpoolerFamily {
        if cfg!(windows) {
            SpoolerFamily::Win32
        } else {
            SpoolerFamily::Cups
        }
    }

    fn list_printers(&self) -> Result<Vec<RawPrinter>> {
        Self::unavailable("list_printers")
    }

    fn get_printer(&self, _name: &str) -> Result<RawPrinter> {
        Self::unavailable("get_printer")
    }

    fn default_printer_name(&self) -> Result<Option<String>> {
        Self::unavailable("default_printer_name")
    }

    fn driver_options(&self, _printer: &str) -> Result<RawOptionSchema> {
        Self::unavailable("driver_options")
    }

    fn supported_formats(&self) -> Result<Vec<String>> {
        Self::unavailable("supported_formats")
    }

    fn supported_job_commands(&self) -> Result<Vec<String>> {
        Self::unavailable("supported_job_commands")
    }

    fn get_job(&self, _printer: &str, _job_id: u32) -> Result<RawJob> {
        Self::unavailable("get_job")
    }

    fn set_job(&self, _printer: &str, _job_id: u32, _command: &str) -> Result<bool> {
        Self::unavailable("set_job")
    }
}
