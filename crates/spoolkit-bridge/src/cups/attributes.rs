// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Translation between IPP attribute groups and the raw spooler records.
//
// Responses are flattened one group at a time into name → display-string
// maps (multi-valued attributes joined with ", "), which keeps the mapping
// rules below testable without a running scheduler.

use std::collections::HashMap;

use ipp::prelude::*;

use crate::traits::{RawChoice, RawJob, RawOptionSchema, RawOptions, RawPrinter};

/// One flattened IPP attribute group.
pub type AttributeMap = HashMap<String, String>;

/// `printer-type` bit CUPS sets on the server default destination.
const CUPS_PRINTER_DEFAULT: u32 = 0x0002_0000;

/// Driver option groups derived from `<attr>-supported` / `<attr>-default`
/// pairs, named the way PPD-based drivers name them.
const OPTION_GROUPS: &[(&str, &str)] = &[
    ("PageSize", "media"),
    ("Duplex", "sides"),
    ("ColorModel", "print-color-mode"),
    ("InputSlot", "media-source"),
    ("MediaType", "media-type"),
    ("OutputBin", "output-bin"),
    ("Resolution", "printer-resolution"),
    ("Quality", "print-quality"),
];

/// Flatten every group carrying `tag`, one map per group.
pub fn group_maps(attrs: &IppAttributes, tag: DelimiterTag) -> Vec<AttributeMap> {
    attrs
        .groups_of(tag)
        .map(|group| {
            group
                .attributes()
                .iter()
                .map(|(name, attr)| (name.clone(), display_value(attr.value())))
                .collect()
        })
        .collect()
}

/// Display form of a value; `1setOf` arrays are joined with `", "` without
/// the brackets `IppValue`'s own `Display` adds.
pub fn display_value(value: &IppValue) -> String {
    match value {
        IppValue::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Build a raw printer record from a Printer Attributes group.
pub fn printer_from_attributes(attrs: &AttributeMap) -> Option<RawPrinter> {
    let name = attrs.get("printer-name").filter(|n| !n.is_empty())?.clone();

    let is_default = attrs
        .get("printer-type")
        .and_then(|t| t.trim().parse::<u32>().ok())
        .map(|t| t & CUPS_PRINTER_DEFAULT != 0);

    let options: RawOptions = attrs
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Some(RawPrinter {
        name,
        is_default,
        status: None,
        driver: non_empty(attrs.get("printer-make-and-model")),
        location: non_empty(attrs.get("printer-location")),
        comment: non_empty(attrs.get("printer-info")),
        options,
    })
}

/// Build a raw job record from a Job Attributes group.
///
/// `fallback_printer` is used when the response omits `job-printer-uri`.
pub fn job_from_attributes(attrs: &AttributeMap, fallback_printer: &str) -> Option<RawJob> {
    let id = attrs.get("job-id")?.trim().parse::<u32>().ok()?;

    let printer = attrs
        .get("job-printer-uri")
        .and_then(|uri| printer_name_from_uri(uri))
        .unwrap_or(fallback_printer)
        .to_string();

    Some(RawJob {
        id,
        state: attrs
            .get("job-state")
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        printer: Some(printer),
        document_name: non_empty(attrs.get("job-name")),
        user: non_empty(attrs.get("job-originating-user-name")),
        size_bytes: parse_int(attrs.get("job-k-octets")).map(|k| (k.max(0) as u64) * 1024),
        creation_time: parse_epoch(attrs.get("time-at-creation")),
        processing_time: parse_epoch(attrs.get("time-at-processing")),
        completed_time: parse_epoch(attrs.get("time-at-completed")),
    })
}

/// Derive the driver option schema from a printer's attributes.
///
/// Groups the printer does not advertise are left out; a `-default` value
/// that is not among the supported values is still listed so the selection
/// is never lost.
pub fn schema_from_attributes(attrs: &AttributeMap) -> RawOptionSchema {
    let mut schema = RawOptionSchema::new();

    for (group, attr) in OPTION_GROUPS {
        let Some(supported) = attrs.get(&format!("{attr}-supported")) else {
            continue;
        };
        let default = attrs.get(&format!("{attr}-default")).map(|d| d.trim());

        let mut choices: Vec<RawChoice> = split_values(supported)
            .map(|value| RawChoice::new(value, Some(value) == default))
            .collect();

        if let Some(d) = default.filter(|d| !d.is_empty()) {
            if !choices.iter().any(|c| c.value == d) {
                choices.push(RawChoice::new(d, true));
            }
        }

        if !choices.is_empty() {
            schema.insert(group.to_string(), choices);
        }
    }

    schema
}

/// `document-format` MIME type for a Spoolkit data format.
pub fn mime_for_format(format: &str) -> &'static str {
    match format {
        "RAW" => "application/vnd.cups-raw",
        "TEXT" => "text/plain",
        "PDF" => "application/pdf",
        "JPEG" => "image/jpeg",
        "POSTSCRIPT" => "application/postscript",
        "COMMAND" => "application/vnd.cups-command",
        // AUTO and anything else: let the scheduler type the data.
        _ => "application/octet-stream",
    }
}

/// Typed IPP job attribute for a CUPS-style `name=value` option.
pub fn option_attribute(name: &str, value: &str) -> IppAttribute {
    IppAttribute::new(name, option_value(name, value))
}

fn option_value(name: &str, value: &str) -> IppValue {
    let trimmed = value.trim();
    if name == "page-ranges" {
        if let Some((lo, hi)) = trimmed.split_once('-') {
            if let (Ok(min), Ok(max)) = (lo.trim().parse::<i32>(), hi.trim().parse::<i32>()) {
                return IppValue::RangeOfInteger { min, max };
            }
        }
    }
    if let Ok(n) = trimmed.parse::<i32>() {
        return IppValue::Integer(n);
    }
    match trimmed {
        "true" => IppValue::Boolean(true),
        "false" => IppValue::Boolean(false),
        _ => IppValue::Keyword(trimmed.into()),
    }
}

/// IPP operation implementing a job command, if CUPS has one.
pub fn operation_for_command(command: &str) -> Option<Operation> {
    match command {
        "CANCEL" => Some(Operation::CancelJob),
        "PAUSE" => Some(Operation::HoldJob),
        "RESUME" => Some(Operation::ReleaseJob),
        "RESTART" => Some(Operation::RestartJob),
        _ => None,
    }
}

/// Queue name from `ipp://host/printers/<name>` or `.../classes/<name>`.
pub fn printer_name_from_uri(uri: &str) -> Option<&str> {
    let (_, rest) = uri
        .split_once("/printers/")
        .or_else(|| uri.split_once("/classes/"))?;
    let name = rest.split(['/', '?']).next()?;
    (!name.is_empty()).then_some(name)
}

fn split_values(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(", ").map(str::trim).filter(|s| !s.is_empty())
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_int(value: Option<&String>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}

/// CUPS reports job times as epoch seconds; 0 means "not yet".
fn parse_epoch(value: Option<&String>) -> Option<i64> {
    parse_int(value).filter(|t| *t > 0)
}
