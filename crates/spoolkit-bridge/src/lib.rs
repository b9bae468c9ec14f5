// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolkit: native spooler collaborator.
//
// Defines the `NativeSpooler` contract the print service depends on and
// selects the backend for the host platform once, at startup: CUPS over IPP
// on desktop Unix, the stub everywhere else. Hosts with their own binding
// (winspool, a test double) implement the trait directly.

pub mod memory;
pub mod stub;
pub mod traits;

#[cfg(all(unix, not(any(target_os = "ios", target_os = "android"))))]
pub mod cups;

use std::sync::Arc;

use spoolkit_core::config::ServiceConfig;
use spoolkit_core::error::Result;

pub use memory::{MemorySpooler, SpoolerCall};
pub use stub::StubSpooler;
pub use traits::{NativeSpooler, RawChoice, RawJob, RawOptionSchema, RawOptions, RawPrinter};

/// Build the spooler backend for the target operating system.
pub fn platform_spooler(config: &ServiceConfig) -> Result<Arc<dyn NativeSpooler>> {
    #[cfg(all(unix, not(any(target_os = "ios", target_os = "android"))))]
    {
        // CUPS scheduler, reached over IPP.
        Ok(Arc::new(cups::CupsSpooler::new(&config.cups)?))
    }
    #[cfg(not(all(unix, not(any(target_os = "ios", target_os = "android")))))]
    {
        let _ = config;
        tracing::warn!("no native spooler backend for this platform, using stub");
        Ok(Arc::new(stub::StubSpooler))
    }
}
