// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for the service tests.

use std::sync::Arc;

use spoolkit_bridge::{MemorySpooler, RawChoice, RawOptionSchema, RawOptions, RawPrinter};
use spoolkit_core::types::SpoolerFamily;

use crate::PrintService;

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

pub fn raw_printer(name: &str, state: &str) -> RawPrinter {
    let mut options = RawOptions::new();
    options.insert("printer-state".into(), state.into());
    RawPrinter {
        name: name.into(),
        options,
        ..RawPrinter::default()
    }
}

pub fn page_sizes(selected: Option<&str>) -> RawOptionSchema {
    let choices = ["Letter", "A4", "Legal"]
        .into_iter()
        .map(|v| RawChoice::new(v, Some(v) == selected))
        .collect();
    let mut schema = RawOptionSchema::new();
    schema.insert("PageSize".into(), choices);
    schema
}

/// Two CUPS printers: `lab` (idle, platform default) and `office` (printing).
pub fn lab_spooler() -> Arc<MemorySpooler> {
    Arc::new(
        MemorySpooler::new(SpoolerFamily::Cups)
            .with_printer(raw_printer("lab", "3"))
            .with_printer(raw_printer("office", "4"))
            .with_default("lab")
            .with_driver_options("lab", page_sizes(Some("A4"))),
    )
}

pub fn service(spooler: &Arc<MemorySpooler>) -> PrintService {
    init_tracing();
    PrintService::new(spooler.clone())
}
