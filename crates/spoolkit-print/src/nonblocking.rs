// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async embedding of the print service.
//
// Native spooler calls block, so every operation is moved onto tokio's
// blocking pool with `spawn_blocking`. Semantics are identical to the
// synchronous `PrintService`; only the calling convention differs.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::error;

use spoolkit_core::error::{Result, SpoolError};
use spoolkit_core::types::{DriverOptions, Job, JobId, Printer};

use crate::capabilities::PrinterCapabilities;
use crate::service::PrintService;
use crate::submit::{DirectPrint, FilePrint};

/// Cloneable async handle to a [`PrintService`].
#[derive(Debug, Clone)]
pub struct AsyncPrintService {
    inner: Arc<PrintService>,
}

impl AsyncPrintService {
    pub fn new(service: PrintService) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }

    /// The synchronous service underneath.
    pub fn blocking(&self) -> &PrintService {
        &self.inner
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&PrintService) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| {
                error!(op, error = %e, "blocking spooler task failed");
                SpoolError::Native(format!("{op}: blocking task failed: {e}"))
            })?
    }

    pub async fn list_printers(&self) -> Result<Vec<Printer>> {
        self.run("list_printers", |s| s.list_printers()).await
    }

    pub async fn get_printer(&self, name: Option<String>) -> Result<Printer> {
        self.run("get_printer", move |s| s.get_printer(name.as_deref()))
            .await
    }

    pub async fn default_printer_name(&self) -> Result<Option<String>> {
        self.run("default_printer_name", |s| s.default_printer_name())
            .await
    }

    pub async fn driver_options(&self, printer: Option<String>) -> Result<DriverOptions> {
        self.run("driver_options", move |s| s.driver_options(printer.as_deref()))
            .await
    }

    pub async fn selected_paper_size(&self, printer: Option<String>) -> Result<String> {
        self.run("selected_paper_size", move |s| {
            s.selected_paper_size(printer.as_deref())
        })
        .await
    }

    pub async fn supported_print_formats(&self) -> Result<BTreeSet<String>> {
        self.run("supported_print_formats", |s| s.supported_print_formats())
            .await
    }

    pub async fn supported_job_commands(&self) -> Result<BTreeSet<String>> {
        self.run("supported_job_commands", |s| s.supported_job_commands())
            .await
    }

    pub async fn capabilities(&self, printer: Option<String>) -> Result<PrinterCapabilities> {
        self.run("capabilities", move |s| s.capabilities(printer.as_deref()))
            .await
    }

    pub async fn print_direct(&self, request: DirectPrint) -> Result<JobId> {
        self.run("print_direct", move |s| s.print_direct(request))
            .await
    }

    pub async fn print_file(&self, request: FilePrint) -> Result<JobId> {
        self.run("print_file", move |s| s.print_file(request)).await
    }

    pub async fn get_job(&self, printer: String, job_id: JobId) -> Result<Job> {
        self.run("get_job", move |s| s.get_job(&printer, job_id))
            .await
    }

    pub async fn set_job(&self, printer: String, job_id: JobId, command: String) -> Result<bool> {
        self.run("set_job", move |s| s.set_job(&printer, job_id, &command))
            .await
    }
}

impl From<PrintService> for AsyncPrintService {
    fn from(service: PrintService) -> Self {
        Self::new(service)
    }
}
