// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolkit Print. The print service: printer registry, capability
// translation, job submission and job control on top of a `NativeSpooler`.
// Every operation is a single blocking round trip to the spooler; the
// `nonblocking` module offers the same surface for async callers.

pub mod capabilities;
pub mod jobs;
pub mod nonblocking;
pub mod registry;
pub mod service;
pub mod submit;

#[cfg(test)]
mod testing;

pub use capabilities::PrinterCapabilities;
pub use nonblocking::AsyncPrintService;
pub use service::PrintService;
pub use submit::{DirectPrint, FilePrint, SubmissionPhase};
