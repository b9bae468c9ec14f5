// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-configured default destination.
//
// CUPS-Get-Default only knows the server-wide default. Users override it with
// the `LPDEST` / `PRINTER` environment variables and with `Default` lines in
// lpoptions files, the same sources `cupsGetDests` consults.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Resolve the user's default destination, if one is configured.
///
/// `env` looks up environment variables; `lpoptions` lists files in priority
/// order (user file first).
pub fn user_default(env: impl Fn(&str) -> Option<String>, lpoptions: &[PathBuf]) -> Option<String> {
    if let Some(name) = env("LPDEST").and_then(|v| queue_name(&v)) {
        debug!(printer = %name, "default printer from LPDEST");
        return Some(name);
    }
    // `PRINTER=lp` is the historical placeholder and means "no preference".
    if let Some(name) = env("PRINTER")
        .and_then(|v| queue_name(&v))
        .filter(|n| n != "lp")
    {
        debug!(printer = %name, "default printer from PRINTER");
        return Some(name);
    }
    for path in lpoptions {
        if let Some(name) = lpoptions_default(path) {
            debug!(printer = %name, file = %path.display(), "default printer from lpoptions");
            return Some(name);
        }
    }
    None
}

/// lpoptions files for the current user: `~/.cups/lpoptions`, then the
/// system-wide file.
pub fn lpoptions_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = home {
        paths.push(home.join(".cups").join("lpoptions"));
    }
    paths.push(PathBuf::from("/etc/cups/lpoptions"));
    paths
}

/// `Default <name>[/<instance>] [options…]` from an lpoptions file.
fn lpoptions_default(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    parse_lpoptions_default(&contents)
}

fn parse_lpoptions_default(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("Default ")?;
        queue_name(rest.split_whitespace().next()?)
    })
}

/// Strip an `/instance` suffix; instances share their queue's name.
fn queue_name(dest: &str) -> Option<String> {
    let name = dest.trim().split('/').next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}
