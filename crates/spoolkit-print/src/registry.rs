// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer registry: enumeration, lookup and default resolution.
//
// Raw spooler records are normalized on the way out: the platform status
// code becomes a `PrinterStatus` and epoch-second `*time` options become
// absolute timestamps. Both normalizations are pure and idempotent.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use spoolkit_bridge::RawPrinter;
use spoolkit_core::error::{Result, SpoolError};
use spoolkit_core::types::{OptionValue, Printer, PrinterOptions, PrinterStatus};

use crate::service::{PrintService, given};

/// Option key carrying the raw status code on CUPS-style records.
pub const PRINTER_STATE_KEY: &str = "printer-state";

impl PrintService {
    /// Every printer the spooler knows, in the spooler's order.
    #[instrument(skip(self))]
    pub fn list_printers(&self) -> Result<Vec<Printer>> {
        let printers: Vec<Printer> = self
            .spooler()
            .list_printers()?
            .into_iter()
            .map(normalize_printer)
            .collect();
        debug!(count = printers.len(), "printers listed");
        Ok(printers)
    }

    /// One printer by name; `None` (or `""`) means the default printer.
    #[instrument(skip(self))]
    pub fn get_printer(&self, name: Option<&str>) -> Result<Printer> {
        let name = self.resolve_printer(name)?;
        let printer = normalize_printer(self.spooler().get_printer(&name)?);
        debug!(printer = %printer.name, status = %printer.status, "printer fetched");
        Ok(printer)
    }

    /// Name of the default printer, if the host has one.
    ///
    /// The platform's user-configured default wins when it names a printer
    /// the spooler actually lists; otherwise the first printer flagged as
    /// default. No default is not an error.
    #[instrument(skip(self))]
    pub fn default_printer_name(&self) -> Result<Option<String>> {
        let configured = self.spooler().default_printer_name()?;
        let printers = self.spooler().list_printers()?;

        if let Some(name) = configured.filter(|n| !n.is_empty()) {
            if printers.iter().any(|p| p.name == name) {
                debug!(printer = %name, "platform default printer");
                return Ok(Some(name));
            }
            warn!(printer = %name, "configured default printer is not installed, ignoring");
        }

        let flagged = printers
            .into_iter()
            .find(|p| p.is_default == Some(true))
            .map(|p| p.name);
        match &flagged {
            Some(name) => debug!(printer = %name, "default printer from printer flags"),
            None => debug!("no default printer"),
        }
        Ok(flagged)
    }

    /// Explicit printer name, or the default; `NoPrinterAvailable` when
    /// neither exists.
    pub(crate) fn resolve_printer(&self, name: Option<&str>) -> Result<String> {
        match given(name) {
            Some(name) => Ok(name.to_string()),
            None => self
                .default_printer_name()?
                .ok_or(SpoolError::NoPrinterAvailable),
        }
    }
}

/// Normalize one raw spooler record.
pub fn normalize_printer(raw: RawPrinter) -> Printer {
    let mut options: PrinterOptions = raw
        .options
        .into_iter()
        .map(|(k, v)| (k, OptionValue::Text(v)))
        .collect();
    normalize_time_options(&mut options);

    // A status the spooler already worded (Windows) beats the CUPS code.
    let status = match raw.status.as_deref().filter(|s| !s.is_empty()) {
        Some(status) => normalize_status(status),
        None => match options.get(PRINTER_STATE_KEY).and_then(OptionValue::as_text) {
            Some(code) => normalize_status(code),
            None => PrinterStatus::Unrecognized(String::new()),
        },
    };

    Printer {
        name: raw.name,
        driver: raw.driver,
        location: raw.location,
        comment: raw.comment,
        is_default: raw.is_default.unwrap_or(false),
        status,
        options,
    }
}

/// `3` → IDLE, `4` → PRINTING, `5` → STOPPED; normalized names map to
/// themselves; any other code is kept verbatim.
pub fn normalize_status(raw: &str) -> PrinterStatus {
    let code = raw.trim();
    match code {
        "3" => PrinterStatus::Idle,
        "4" => PrinterStatus::Printing,
        "5" => PrinterStatus::Stopped,
        _ if code.eq_ignore_ascii_case("IDLE") => PrinterStatus::Idle,
        _ if code.eq_ignore_ascii_case("PRINTING") => PrinterStatus::Printing,
        _ if code.eq_ignore_ascii_case("STOPPED") => PrinterStatus::Stopped,
        _ => PrinterStatus::Unrecognized(raw.to_string()),
    }
}

/// Convert every `*time` option holding epoch seconds into an absolute time.
/// Values that are already times, or not integers, are left alone.
pub fn normalize_time_options(options: &mut PrinterOptions) {
    for (key, value) in options.iter_mut() {
        if !key.ends_with("time") {
            continue;
        }
        if let Some(time) = value.as_text().and_then(epoch_seconds) {
            *value = OptionValue::Time(time);
        }
    }
}

pub(crate) fn epoch_seconds(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use spoolkit_bridge::{MemorySpooler, SpoolerCall};
    use spoolkit_core::error::ErrorKind;
    use spoolkit_core::types::SpoolerFamily;
    use std::sync::Arc;

    #[test]
    fn status_codes_normalize() {
        assert_eq!(normalize_status("3"), PrinterStatus::Idle);
        assert_eq!(normalize_status("4"), PrinterStatus::Printing);
        assert_eq!(normalize_status("5"), PrinterStatus::Stopped);
        assert_eq!(
            normalize_status("7"),
            PrinterStatus::Unrecognized("7".into())
        );
    }

    #[test]
    fn status_normalization_is_idempotent() {
        for raw in ["3", "4", "5", "7", "PAUSED"] {
            let once = normalize_status(raw);
            assert_eq!(normalize_status(once.as_str()), once, "raw {raw}");
        }
    }

    #[test]
    fn time_options_become_absolute_once() {
        let mut options = PrinterOptions::new();
        options.insert("printer-state-change-time".into(), "1700000000".into());
        options.insert("printer-info".into(), "1700000000".into());
        options.insert("job-time".into(), "soon".into());

        normalize_time_options(&mut options);
        let converted = options.clone();
        normalize_time_options(&mut options);
        assert_eq!(options, converted);

        assert_eq!(
            options["printer-state-change-time"].as_time(),
            DateTime::from_timestamp(1_700_000_000, 0)
        );
        assert_eq!(options["printer-info"].as_text(), Some("1700000000"));
        assert_eq!(options["job-time"].as_text(), Some("soon"));
    }

    #[test]
    fn windows_status_beats_printer_state() {
        let mut raw = raw_printer("HP", "3");
        raw.status = Some("PAUSED".into());
        let printer = normalize_printer(raw);
        assert_eq!(printer.status, PrinterStatus::Unrecognized("PAUSED".into()));

        let mut raw = raw_printer("HP", "3");
        raw.status = Some("STOPPED".into());
        assert_eq!(normalize_printer(raw).status, PrinterStatus::Stopped);
    }

    #[test]
    fn missing_status_is_unrecognized() {
        let printer = normalize_printer(RawPrinter {
            name: "bare".into(),
            ..RawPrinter::default()
        });
        assert_eq!(printer.status, PrinterStatus::Unrecognized(String::new()));
        assert!(!printer.is_default);
    }

    #[test]
    fn listed_printers_can_be_fetched_by_name() {
        let spooler = lab_spooler();
        let service = service(&spooler);
        let listed = service.list_printers().expect("list");
        assert_eq!(listed.len(), 2);
        for printer in listed {
            let fetched = service.get_printer(Some(&printer.name)).expect("get");
            assert_eq!(fetched.name, printer.name);
            assert_eq!(fetched.status, printer.status);
        }
    }

    #[test]
    fn omitted_name_uses_default_printer() {
        let spooler = lab_spooler();
        let service = service(&spooler);
        assert_eq!(service.get_printer(None).expect("get").name, "lab");
        assert_eq!(service.get_printer(Some("")).expect("get").name, "lab");
    }

    #[test]
    fn unknown_printer_is_not_found() {
        let spooler = lab_spooler();
        let err = service(&spooler).get_printer(Some("ghost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrinterNotFound);
    }

    #[test]
    fn no_default_means_no_printer_available() {
        let spooler = Arc::new(MemorySpooler::new(SpoolerFamily::Cups).with_printer(raw_printer("lab", "3")));
        let service = service(&spooler);
        assert_eq!(service.default_printer_name().expect("default"), None);
        assert!(matches!(
            service.get_printer(None),
            Err(SpoolError::NoPrinterAvailable)
        ));
    }

    #[test]
    fn flagged_printer_is_the_fallback_default() {
        let mut flagged = raw_printer("office", "3");
        flagged.is_default = Some(true);
        let spooler = Arc::new(
            MemorySpooler::new(SpoolerFamily::Win32)
                .with_printer(raw_printer("lab", "3"))
                .with_printer(flagged),
        );
        let service = service(&spooler);
        assert_eq!(
            service.default_printer_name().expect("default").as_deref(),
            Some("office")
        );
    }

    #[test]
    fn stale_platform_default_is_ignored() {
        let spooler = Arc::new(
            MemorySpooler::new(SpoolerFamily::Cups)
                .with_printer(raw_printer("lab", "3"))
                .with_default("removed-last-week"),
        );
        let service = service(&spooler);
        let default = service.default_printer_name().expect("default");
        assert_eq!(default, None);
    }

    #[test]
    fn default_is_always_a_listed_printer() {
        let spooler = lab_spooler();
        let service = service(&spooler);
        let default = service.default_printer_name().expect("default");
        let names: Vec<String> = service
            .list_printers()
            .expect("list")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert!(default.is_none_or(|d| names.contains(&d)));
    }

    #[test]
    fn unreachable_spooler_fails_listing() {
        let spooler = lab_spooler();
        spooler.set_offline(true);
        let err = service(&spooler).list_printers().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SpoolerUnavailable);
        assert_eq!(spooler.calls(), vec![SpoolerCall::ListPrinters]);
    }
}
