// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The print service facade.
//
// `PrintService` owns the native spooler collaborator and the service
// configuration. Its operations live in the component modules (`registry`,
// `capabilities`, `submit`, `jobs`); this module only wires them together.

use std::sync::Arc;

use tracing::info;

use spoolkit_bridge::{NativeSpooler, platform_spooler};
use spoolkit_core::config::ServiceConfig;
use spoolkit_core::error::Result;
use spoolkit_core::types::SpoolerFamily;

/// Stateless facade over one native spooler.
///
/// Every operation is a single synchronous round trip; nothing is cached
/// between calls, so results always reflect the spooler's current view.
pub struct PrintService {
    spooler: Arc<dyn NativeSpooler>,
    config: ServiceConfig,
}

impl PrintService {
    /// Service over the given spooler with the default configuration.
    pub fn new(spooler: Arc<dyn NativeSpooler>) -> Self {
        Self::with_config(spooler, ServiceConfig::default())
    }

    pub fn with_config(spooler: Arc<dyn NativeSpooler>, config: ServiceConfig) -> Self {
        Self { spooler, config }
    }

    /// Service over the host platform's spooler.
    pub fn for_host(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let spooler = platform_spooler(&config)?;
        info!(family = ?spooler.family(), "print service ready");
        Ok(Self::with_config(spooler, config))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn family(&self) -> SpoolerFamily {
        self.spooler.family()
    }

    pub(crate) fn spooler(&self) -> &dyn NativeSpooler {
        self.spooler.as_ref()
    }
}

impl std::fmt::Debug for PrintService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintService")
            .field("family", &self.spooler.family())
            .field("config", &self.config)
            .finish()
    }
}

/// Treat an empty string the same as an omitted argument.
pub(crate) fn given(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
