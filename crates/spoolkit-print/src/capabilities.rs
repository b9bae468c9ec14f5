// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability translation.
//
// Turns the spooler's raw driver option schema into `DriverOptions`, answers
// "which paper size is selected", and reports the document formats and job
// commands the spooler accepts. `PrinterCapabilities` folds all of it into a
// single summary value.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, instrument};

use spoolkit_bridge::RawOptionSchema;
use spoolkit_core::error::Result;
use spoolkit_core::types::{DriverOptions, OptionGroup};

use crate::service::PrintService;

/// Group holding duplex choices in PPD-style schemas.
pub const DUPLEX_GROUP: &str = "Duplex";
/// Group holding colour model choices in PPD-style schemas.
pub const COLOR_GROUP: &str = "ColorModel";

const SIMPLEX_CHOICES: [&str; 5] = ["none", "one-sided", "simplex", "off", "false"];
const COLOR_MARKERS: [&str; 4] = ["color", "colour", "rgb", "cmy"];

impl PrintService {
    /// Driver option schema of a printer (`None` = default printer).
    #[instrument(skip(self))]
    pub fn driver_options(&self, printer: Option<&str>) -> Result<DriverOptions> {
        let name = self.resolve_printer(printer)?;
        let options = normalize_schema(self.spooler().driver_options(&name)?);
        debug!(printer = %name, groups = options.len(), "driver options fetched");
        Ok(options)
    }

    /// Currently selected paper size, or `""` when the driver marks none.
    #[instrument(skip(self))]
    pub fn selected_paper_size(&self, printer: Option<&str>) -> Result<String> {
        let options = self.driver_options(printer)?;
        Ok(selected_paper_size(&options, &self.config().paper_size_groups))
    }

    /// Document formats the spooler accepts, upper-cased.
    #[instrument(skip(self))]
    pub fn supported_print_formats(&self) -> Result<BTreeSet<String>> {
        Ok(upper_set(self.spooler().supported_formats()?))
    }

    /// Job commands the spooler accepts, upper-cased.
    #[instrument(skip(self))]
    pub fn supported_job_commands(&self) -> Result<BTreeSet<String>> {
        Ok(upper_set(self.spooler().supported_job_commands()?))
    }

    /// Whether `format` (any case) is an accepted document format.
    pub fn supports_format(&self, format: &str) -> Result<bool> {
        let wanted = format.trim().to_ascii_uppercase();
        Ok(self.supported_print_formats()?.contains(&wanted))
    }

    /// Everything known about what a printer can do, in one value.
    #[instrument(skip(self))]
    pub fn capabilities(&self, printer: Option<&str>) -> Result<PrinterCapabilities> {
        let name = self.resolve_printer(printer)?;
        let options = normalize_schema(self.spooler().driver_options(&name)?);
        let caps = PrinterCapabilities::from_driver_options(
            name,
            &options,
            &self.config().paper_size_groups,
            self.supported_print_formats()?,
            self.supported_job_commands()?,
        );
        debug!(
            printer = %caps.printer,
            paper_sizes = caps.paper_sizes.len(),
            duplex = caps.duplex_supported,
            color = caps.color_supported,
            "capabilities resolved"
        );
        Ok(caps)
    }
}

/// Summary of a printer's driver options and the spooler's vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrinterCapabilities {
    pub printer: String,
    /// Paper sizes offered by the driver, in driver order.
    pub paper_sizes: Vec<String>,
    /// `""` when the driver marks no paper size.
    pub selected_paper_size: String,
    /// Whether a two-sided choice exists (assumed when the driver is silent).
    pub duplex_supported: bool,
    /// Whether a colour model exists (assumed when the driver is silent).
    pub color_supported: bool,
    pub formats: BTreeSet<String>,
    pub job_commands: BTreeSet<String>,
}

impl PrinterCapabilities {
    pub fn from_driver_options(
        printer: impl Into<String>,
        options: &DriverOptions,
        paper_size_groups: &[String],
        formats: BTreeSet<String>,
        job_commands: BTreeSet<String>,
    ) -> Self {
        let paper_sizes = paper_size_group(options, paper_size_groups)
            .map(|g| g.choices.clone())
            .unwrap_or_default();

        let duplex_supported = options
            .get(DUPLEX_GROUP)
            .map(|g| {
                g.choices
                    .iter()
                    .any(|c| !SIMPLEX_CHOICES.contains(&c.to_ascii_lowercase().as_str()))
            })
            .unwrap_or(true);

        let color_supported = options
            .get(COLOR_GROUP)
            .map(|g| {
                g.choices.iter().any(|c| {
                    let c = c.to_ascii_lowercase();
                    COLOR_MARKERS.iter().any(|m| c.contains(m))
                })
            })
            .unwrap_or(true);

        Self {
            printer: printer.into(),
            paper_sizes,
            selected_paper_size: selected_paper_size(options, paper_size_groups),
            duplex_supported,
            color_supported,
            formats,
            job_commands,
        }
    }

    /// Whether the driver offers `paper`; an empty list means unknown, which
    /// counts as supported.
    pub fn supports_paper_size(&self, paper: &str) -> bool {
        self.paper_sizes.is_empty() || self.paper_sizes.iter().any(|p| p == paper)
    }

    pub fn supports_format(&self, format: &str) -> bool {
        self.formats.contains(&format.trim().to_ascii_uppercase())
    }

    pub fn supports_job_command(&self, command: &str) -> bool {
        self.job_commands
            .contains(&command.trim().to_ascii_uppercase().replace('-', "_"))
    }
}

/// Normalize a raw schema: empty groups are dropped, duplicate choices keep
/// their first position, and the last choice marked selected wins.
pub fn normalize_schema(raw: RawOptionSchema) -> DriverOptions {
    let mut options = DriverOptions::new();
    for (name, raw_choices) in raw {
        let mut group = OptionGroup::default();
        for choice in raw_choices {
            let value = choice.value.trim();
            if value.is_empty() {
                continue;
            }
            if !group.supports(value) {
                group.choices.push(value.to_string());
            }
            if choice.selected {
                group.selected = Some(value.to_string());
            }
        }
        if group.choices.is_empty() {
            debug!(group = %name, "dropping empty option group");
            continue;
        }
        options.insert(name, group);
    }
    options
}

/// Selected entry of the first page-size group present, or `""`.
pub fn selected_paper_size(options: &DriverOptions, paper_size_groups: &[String]) -> String {
    paper_size_group(options, paper_size_groups)
        .and_then(|g| g.selected.clone())
        .unwrap_or_default()
}

fn paper_size_group<'a>(options: &'a DriverOptions, names: &[String]) -> Option<&'a OptionGroup> {
    names.iter().find_map(|name| options.get(name))
}

fn upper_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_ascii_uppercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use spoolkit_bridge::{MemorySpooler, RawChoice};
    use spoolkit_core::config::ServiceConfig;
    use spoolkit_core::error::{ErrorKind, SpoolError};
    use spoolkit_core::types::SpoolerFamily;
    use std::sync::Arc;

    fn groups() -> Vec<String> {
        ServiceConfig::default().paper_size_groups
    }

    #[test]
    fn selected_paper_size_is_the_marked_entry() {
        let spooler = lab_spooler();
        let service = service(&spooler);
        assert_eq!(service.selected_paper_size(Some("lab")).expect("size"), "A4");
        assert_eq!(service.selected_paper_size(None).expect("size"), "A4");
    }

    #[test]
    fn no_selection_means_empty_paper_size() {
        let spooler = Arc::new(
            MemorySpooler::new(SpoolerFamily::Cups)
                .with_printer(raw_printer("lab", "3"))
                .with_driver_options("lab", page_sizes(None)),
        );
        let service = service(&spooler);
        assert_eq!(service.selected_paper_size(Some("lab")).expect("size"), "");
    }

    #[test]
    fn no_page_size_group_means_empty_paper_size() {
        let spooler = lab_spooler();
        // office has no schema at all
        assert_eq!(service(&spooler).selected_paper_size(Some("office")).expect("size"), "");
    }

    #[test]
    fn last_selected_choice_wins() {
        let mut raw = RawOptionSchema::new();
        raw.insert(
            "PageSize".into(),
            vec![
                RawChoice::new("Letter", true),
                RawChoice::new("A4", false),
                RawChoice::new("Legal", true),
            ],
        );
        assert_eq!(selected_paper_size(&normalize_schema(raw), &groups()), "Legal");
    }

    #[test]
    fn later_group_names_are_fallbacks() {
        let mut raw = RawOptionSchema::new();
        raw.insert("media".into(), vec![RawChoice::new("iso_a4_210x297mm", true)]);
        assert_eq!(
            selected_paper_size(&normalize_schema(raw), &groups()),
            "iso_a4_210x297mm"
        );
    }

    #[test]
    fn schema_normalization_drops_empty_groups_and_duplicates() {
        let mut raw = RawOptionSchema::new();
        raw.insert("InputSlot".into(), vec![]);
        raw.insert(
            "Duplex".into(),
            vec![
                RawChoice::new("None", false),
                RawChoice::new("DuplexNoTumble", false),
                RawChoice::new("None", true),
                RawChoice::new(" ", true),
            ],
        );
        let options = normalize_schema(raw);
        assert_eq!(options.len(), 1);
        let duplex = options.get("Duplex").expect("duplex group");
        assert_eq!(duplex.choices, vec!["None", "DuplexNoTumble"]);
        assert_eq!(duplex.selected.as_deref(), Some("None"));
    }

    #[test]
    fn driver_options_for_unknown_printer() {
        let spooler = lab_spooler();
        let err = service(&spooler).driver_options(Some("ghost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrinterNotFound);
    }

    #[test]
    fn driver_options_without_any_printer() {
        let spooler = Arc::new(MemorySpooler::new(SpoolerFamily::Cups));
        assert!(matches!(
            service(&spooler).driver_options(None),
            Err(SpoolError::NoPrinterAvailable)
        ));
    }

    #[test]
    fn formats_and_commands_are_upper_cased() {
        let spooler = Arc::new(
            MemorySpooler::new(SpoolerFamily::Win32)
                .with_formats(&["raw", "Text", "RAW"])
                .with_job_commands(&["pause", "cancel"]),
        );
        let service = service(&spooler);
        let formats: Vec<String> = service.supported_print_formats().expect("formats").into_iter().collect();
        assert_eq!(formats, vec!["RAW", "TEXT"]);
        let commands: Vec<String> = service.supported_job_commands().expect("commands").into_iter().collect();
        assert_eq!(commands, vec!["CANCEL", "PAUSE"]);
        assert!(service.supports_format("text").expect("supports"));
        assert!(!service.supports_format("pdf").expect("supports"));
    }

    #[test]
    fn capabilities_summary() {
        let mut schema = page_sizes(Some("Letter"));
        schema.insert(
            "Duplex".into(),
            vec![RawChoice::new("None", true), RawChoice::new("DuplexTumble", false)],
        );
        schema.insert("ColorModel".into(), vec![RawChoice::new("Gray", true)]);
        let spooler = Arc::new(
            MemorySpooler::new(SpoolerFamily::Cups)
                .with_printer(raw_printer("lab", "3"))
                .with_default("lab")
                .with_driver_options("lab", schema),
        );
        let caps = service(&spooler).capabilities(None).expect("caps");

        assert_eq!(caps.printer, "lab");
        assert_eq!(caps.paper_sizes, vec!["Letter", "A4", "Legal"]);
        assert_eq!(caps.selected_paper_size, "Letter");
        assert!(caps.duplex_supported);
        assert!(!caps.color_supported);
        assert!(caps.supports_format("pdf"));
        assert!(caps.supports_job_command("restart"));
        assert!(!caps.supports_job_command("retain"));
        assert!(caps.supports_paper_size("A4"));
        assert!(!caps.supports_paper_size("A3"));
    }

    #[test]
    fn silent_driver_assumes_support() {
        let caps = PrinterCapabilities::from_driver_options(
            "bare",
            &DriverOptions::new(),
            &groups(),
            BTreeSet::new(),
            BTreeSet::new(),
        );
        assert!(caps.duplex_supported);
        assert!(caps.color_supported);
        assert!(caps.supports_paper_size("A3"));
        assert_eq!(caps.selected_paper_size, "");
    }
}
