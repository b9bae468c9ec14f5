// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpoolError};

/// Settings for the print service and its native backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Document name used when a direct print omits one.
    pub default_docname: String,
    /// Data format used when a direct print omits one.
    pub default_format: String,
    /// Driver option groups that carry the paper size, searched in order.
    pub paper_size_groups: Vec<String>,
    /// CUPS backend settings (ignored on other platforms).
    pub cups: CupsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_docname: "spoolkit print job".into(),
            default_format: "RAW".into(),
            paper_size_groups: vec!["PageSize".into(), "media".into(), "PaperSize".into()],
            cups: CupsConfig::default(),
        }
    }
}

/// How the CUPS backend reaches the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CupsConfig {
    /// Scheduler base URI (overridden by `CUPS_SERVER` when environment
    /// lookup is enabled).
    pub server_uri: String,
    /// `requesting-user-name` sent with every request.
    pub user_name: Option<String>,
    /// Honour `CUPS_SERVER`, `LPDEST`, `PRINTER` and `~/.cups/lpoptions`.
    pub honor_environment: bool,
}

impl Default for CupsConfig {
    fn default() -> Self {
        Self {
            server_uri: "ipp://localhost:631".into(),
            user_name: None,
            honor_environment: true,
        }
    }
}

impl ServiceConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_format.trim().is_empty() {
            return Err(SpoolError::InvalidArgument(
                "default_format must not be empty".into(),
            ));
        }
        if self.default_docname.is_empty() {
            return Err(SpoolError::InvalidArgument(
                "default_docname must not be empty".into(),
            ));
        }
        if self.paper_size_groups.is_empty() {
            return Err(SpoolError::InvalidArgument(
                "paper_size_groups must name at least one group".into(),
            ));
        }
        if !self.cups.server_uri.contains("://") {
            return Err(SpoolError::InvalidArgument(format!(
                "cups.server_uri '{}' is not a URI",
                self.cups.server_uri
            )));
        }
        Ok(())
    }
}
