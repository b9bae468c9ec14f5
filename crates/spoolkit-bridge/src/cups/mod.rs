// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS backend over IPP.
//
// Talks to the local (or `CUPS_SERVER`) scheduler with the `ipp` crate:
//   - CUPS-Get-Printers / Get-Printer-Attributes   (registry, driver options)
//   - CUPS-Get-Default                              (server default)
//   - Print-Job                                     (buffer and file submission)
//   - Get-Job-Attributes                            (job status)
//   - Cancel-Job / Hold-Job / Release-Job / Restart-Job (job commands)
//
// The IPP client is async; each call drives it to completion on its own
// current-thread runtime so the `NativeSpooler` surface stays blocking and no
// connection outlives the call. Async callers should still prefer
// `spawn_blocking` (the print crate's async service does); a direct call from
// inside a runtime falls back to a short-lived worker thread.

pub mod attributes;
pub mod defaults;

use std::io::Cursor;
use std::path::PathBuf;

use ipp::prelude::*;
use tracing::{debug, error, info, instrument, warn};

use spoolkit_core::config::CupsConfig;
use spoolkit_core::error::{Result, SpoolError};
use spoolkit_core::types::{JobId, SpoolerFamily};

use crate::traits::*;
use attributes::AttributeMap;

/// Native spooler backed by a CUPS scheduler.
pub struct CupsSpooler {
    /// Scheduler base URI without trailing slash, e.g. `ipp://localhost:631`.
    server: String,
    user_name: String,
    honor_environment: bool,
    lpoptions: Vec<PathBuf>,
}

impl CupsSpooler {
    pub fn new(config: &CupsConfig) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        let server = if config.honor_environment {
            env("CUPS_SERVER")
                .and_then(|s| server_uri_from_env(&s))
                .unwrap_or_else(|| config.server_uri.clone())
        } else {
            config.server_uri.clone()
        };
        let server = server.trim_end_matches('/').to_string();
        server
            .parse::<Uri>()
            .map_err(|e| SpoolError::InvalidArgument(format!("invalid CUPS server URI '{server}': {e}")))?;

        let user_name = config
            .user_name
            .clone()
            .or_else(|| env("USER"))
            .unwrap_or_else(|| "anonymous".into());

        let home = env("HOME").map(PathBuf::from);
        let lpoptions = defaults::lpoptions_paths(home.as_deref());

        info!(server = %server, user = %user_name, "CUPS spooler configured");
        Ok(Self {
            server,
            user_name,
            honor_environment: config.honor_environment,
            lpoptions,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn server_uri(&self) -> Result<Uri> {
        parse_uri(&format!("{}/", self.server))
    }

    fn printer_uri(&self, printer: &str) -> Result<Uri> {
        parse_uri(&format!("{}/printers/{}", self.server, printer))
    }

    /// Start a request with the operation attributes every call carries.
    fn request(&self, operation: Operation, uri: Option<Uri>) -> IppRequestResponse {
        let mut req = IppRequestResponse::new(IppVersion::v1_1(), operation, uri);
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                "requesting-user-name",
                IppValue::NameWithoutLanguage(self.user_name.as_str().into()),
            ),
        );
        req
    }

    fn job_request(&self, operation: Operation, printer: &str, job_id: u32) -> Result<IppRequestResponse> {
        let mut req = self.request(operation, Some(self.printer_uri(printer)?));
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("job-id", IppValue::Integer(to_ipp_id(job_id)?)),
        );
        Ok(req)
    }

    /// Send one request and wait for the response.
    ///
    /// Transport failures mean the scheduler cannot be reached. Called from a
    /// thread that already drives a Tokio runtime, the exchange runs on a
    /// scoped worker thread instead.
    fn send<R>(&self, label: &str, uri: Uri, request: R) -> Result<IppRequestResponse>
    where
        R: Into<IppRequestResponse>,
    {
        let request = request.into();
        if tokio::runtime::Handle::try_current().is_err() {
            return self.exchange(label, uri, request);
        }

        debug!(operation = label, "inside a runtime, sending from worker thread");
        std::thread::scope(|scope| {
            scope
                .spawn(move || self.exchange(label, uri, request))
                .join()
        })
        .unwrap_or_else(|_| {
            error!(operation = label, "IPP worker thread panicked");
            Err(SpoolError::Native(format!("{label}: IPP worker thread panicked")))
        })
    }

    /// Drive one request to completion on a private current-thread runtime.
    fn exchange(&self, label: &str, uri: Uri, request: IppRequestResponse) -> Result<IppRequestResponse> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = AsyncIppClient::new(uri);

        debug!(operation = label, "sending IPP request");
        runtime
            .block_on(client.send(request))
            .map_err(|e| {
                error!(operation = label, error = %e, "CUPS scheduler unreachable");
                SpoolError::SpoolerUnavailable(format!("{label}: {e}"))
            })
    }

    fn fetch_printer_attributes(&self, name: &str) -> Result<AttributeMap> {
        let uri = self.printer_uri(name)?;
        let req = self.request(Operation::GetPrinterAttributes, Some(uri.clone()));
        let response = self.send("Get-Printer-Attributes", uri, req)?;

        let code = response.header().status_code();
        if code == StatusCode::ClientErrorNotFound {
            return Err(SpoolError::PrinterNotFound(name.to_string()));
        }
        if !code.is_success() {
            return Err(SpoolError::Native(format!(
                "Get-Printer-Attributes({name}): {}",
                status_message(&response)
            )));
        }

        attributes::group_maps(response.attributes(), DelimiterTag::PrinterAttributes)
            .into_iter()
            .next()
            .ok_or_else(|| SpoolError::PrinterNotFound(name.to_string()))
    }

    /// Print-Job with the given payload; returns the IPP response.
    fn print_job(
        &self,
        payload: Vec<u8>,
        printer: &str,
        docname: &str,
        mime: &str,
        options: &RawOptions,
    ) -> Result<IppRequestResponse> {
        let uri = self.printer_uri(printer)?;
        let mut builder = IppOperationBuilder::print_job(uri.clone(), IppPayload::new(Cursor::new(payload)))
            .job_title(docname)
            .document_format(mime)
            .user_name(&self.user_name);
        for (name, value) in options {
            builder = builder.attribute(attributes::option_attribute(name, value));
        }
        self.send("Print-Job", uri, builder.build())
    }
}

impl NativeSpooler for CupsSpooler {
    fn family(&self) -> SpoolerFamily {
        SpoolerFamily::Cups
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn list_printers(&self) -> Result<Vec<RawPrinter>> {
        let uri = self.server_uri()?;
        let req = self.request(Operation::CupsGetPrinters, None);
        let response = self.send("CUPS-Get-Printers", uri, req)?;

        let code = response.header().status_code();
        // An empty scheduler answers not-found rather than an empty list.
        if code == StatusCode::ClientErrorNotFound {
            return Ok(Vec::new());
        }
        if !code.is_success() {
            return Err(SpoolError::Native(format!(
                "CUPS-Get-Printers: {}",
                status_message(&response)
            )));
        }

        let printers: Vec<RawPrinter> =
            attributes::group_maps(response.attributes(), DelimiterTag::PrinterAttributes)
                .iter()
                .filter_map(attributes::printer_from_attributes)
                .collect();
        debug!(count = printers.len(), "received printer list");
        Ok(printers)
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn get_printer(&self, name: &str) -> Result<RawPrinter> {
        let attrs = self.fetch_printer_attributes(name)?;
        attributes::printer_from_attributes(&attrs)
            .ok_or_else(|| SpoolError::PrinterNotFound(name.to_string()))
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn default_printer_name(&self) -> Result<Option<String>> {
        if self.honor_environment {
            let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
            if let Some(name) = defaults::user_default(env, &self.lpoptions) {
                return Ok(Some(name));
            }
        }

        let uri = self.server_uri()?;
        let req = self.request(Operation::CupsGetDefault, None);
        let response = self.send("CUPS-Get-Default", uri, req)?;

        let code = response.header().status_code();
        if code == StatusCode::ClientErrorNotFound {
            debug!("scheduler has no default destination");
            return Ok(None);
        }
        if !code.is_success() {
            return Err(SpoolError::Native(format!(
                "CUPS-Get-Default: {}",
                status_message(&response)
            )));
        }

        Ok(
            attributes::group_maps(response.attributes(), DelimiterTag::PrinterAttributes)
                .into_iter()
                .find_map(|attrs| attrs.get("printer-name").cloned())
                .filter(|n| !n.is_empty()),
        )
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn driver_options(&self, printer: &str) -> Result<RawOptionSchema> {
        let attrs = self.fetch_printer_attributes(printer)?;
        let schema = attributes::schema_from_attributes(&attrs);
        debug!(groups = schema.len(), "derived driver options");
        Ok(schema)
    }

    fn supported_formats(&self) -> Result<Vec<String>> {
        Ok(CUPS_FORMATS.iter().map(|s| s.to_string()).collect())
    }

    fn supported_job_commands(&self) -> Result<Vec<String>> {
        Ok(CUPS_JOB_COMMANDS.iter().map(|s| s.to_string()).collect())
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn get_job(&self, printer: &str, job_id: u32) -> Result<RawJob> {
        let uri = self.printer_uri(printer)?;
        let req = self.job_request(Operation::GetJobAttributes, printer, job_id)?;
        let response = self.send("Get-Job-Attributes", uri, req)?;

        let not_found = || SpoolError::JobNotFound {
            printer: printer.to_string(),
            job_id: JobId(job_id),
        };

        let code = response.header().status_code();
        if code == StatusCode::ClientErrorNotFound {
            return Err(not_found());
        }
        if !code.is_success() {
            return Err(SpoolError::Native(format!(
                "Get-Job-Attributes({job_id}): {}",
                status_message(&response)
            )));
        }

        attributes::group_maps(response.attributes(), DelimiterTag::JobAttributes)
            .iter()
            .find_map(|attrs| attributes::job_from_attributes(attrs, printer))
            .ok_or_else(not_found)
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn set_job(&self, printer: &str, job_id: u32, command: &str) -> Result<bool> {
        let operation = attributes::operation_for_command(command)
            .ok_or_else(|| SpoolError::UnsupportedCommand(command.to_string()))?;
        let uri = self.printer_uri(printer)?;
        let req = self.job_request(operation, printer, job_id)?;
        let response = self.send(command, uri, req)?;

        let code = response.header().status_code();
        if code == StatusCode::ClientErrorNotFound {
            return Err(SpoolError::JobNotFound {
                printer: printer.to_string(),
                job_id: JobId(job_id),
            });
        }
        if !code.is_success() {
            warn!(command, job_id, status = ?code, "scheduler rejected job command");
            return Ok(false);
        }

        info!(command, job_id, "job command accepted");
        Ok(true)
    }

    #[instrument(skip(self, data, options), fields(server = %self.server, bytes = data.len()))]
    fn submit_buffer(
        &self,
        data: &[u8],
        printer: &str,
        docname: &str,
        format: &str,
        options: &RawOptions,
    ) -> Result<u32> {
        let mime = attributes::mime_for_format(format);
        let response = self.print_job(data.to_vec(), printer, docname, mime, options)?;

        let code = response.header().status_code();
        if code == StatusCode::ClientErrorNotFound {
            return Err(SpoolError::PrinterNotFound(printer.to_string()));
        }
        if !code.is_success() {
            error!(status = ?code, "Print-Job failed");
            return Err(SpoolError::SubmissionFailed(status_message(&response)));
        }

        // 0 when the scheduler omitted job-id; the caller treats that as failure.
        let job_id = extract_job_id(response.attributes()).unwrap_or(0);
        info!(job_id, mime, "print job accepted by scheduler");
        Ok(job_id)
    }

    #[instrument(skip(self, options), fields(server = %self.server))]
    fn submit_file(
        &self,
        filename: &str,
        docname: &str,
        printer: &str,
        options: &RawOptions,
    ) -> Result<String> {
        let payload = match std::fs::read(filename) {
            Ok(bytes) => bytes,
            Err(e) => return Ok(format!("unable to read {filename}: {e}")),
        };

        // The scheduler auto-types file content.
        let response = self.print_job(payload, printer, docname, "application/octet-stream", options)?;

        let code = response.header().status_code();
        if !code.is_success() {
            error!(status = ?code, "Print-Job failed");
            return Ok(status_message(&response));
        }

        match extract_job_id(response.attributes()) {
            Some(job_id) => {
                info!(job_id, "file job accepted by scheduler");
                Ok(job_id.to_string())
            }
            None => Ok("Print-Job response missing job-id attribute".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uri(uri: &str) -> Result<Uri> {
    uri.parse()
        .map_err(|e| SpoolError::InvalidArgument(format!("invalid URI '{uri}': {e}")))
}

fn to_ipp_id(job_id: u32) -> Result<i32> {
    i32::try_from(job_id)
        .map_err(|_| SpoolError::InvalidArgument(format!("job id {job_id} out of IPP range")))
}

/// Turn a `CUPS_SERVER` value into a scheduler URI.
///
/// Domain sockets are not reachable over the IPP client, so they fall back to
/// the configured URI.
fn server_uri_from_env(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('/') {
        return None;
    }
    if value.contains("://") {
        return Some(value.to_string());
    }
    // Bracketed IPv6 literal without port, or a host with an explicit port.
    let has_port = match value.rfind(']') {
        Some(close) => value[close..].contains(':'),
        None => value.contains(':'),
    };
    if has_port {
        Some(format!("ipp://{value}"))
    } else {
        Some(format!("ipp://{value}:631"))
    }
}

/// `status-message` from the operation attributes, or the status code.
fn status_message(response: &IppRequestResponse) -> String {
    attributes::group_maps(response.attributes(), DelimiterTag::OperationAttributes)
        .into_iter()
        .find_map(|attrs| attrs.get("status-message").cloned())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("{:?}", response.header().status_code()))
}

/// Extract the `job-id` integer from a response's Job Attributes group.
fn extract_job_id(attrs: &IppAttributes) -> Option<u32> {
    attrs
        .groups_of(DelimiterTag::JobAttributes)
        .find_map(|group| match group.attributes().get("job-id")?.value() {
            IppValue::Integer(id) => u32::try_from(*id).ok(),
            _ => None,
        })
}
