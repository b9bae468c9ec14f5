// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolkit: normalized data model, error kinds and configuration shared by
// the bridge and print crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CupsConfig, ServiceConfig};
pub use error::{ErrorKind, SpoolError};
pub use types::*;
