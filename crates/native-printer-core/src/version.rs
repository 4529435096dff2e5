// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Build identification.  Commit and build time are injected by the release
// pipeline through environment variables at compile time.

/// Package version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit the binary was built from.
pub const COMMIT_HASH: &str = match option_env!("NATIVE_PRINTER_COMMIT") {
    Some(hash) => hash,
    None => "none",
};

/// Build timestamp.
pub const BUILD_TIME: &str = match option_env!("NATIVE_PRINTER_BUILD_TIME") {
    Some(time) => time,
    None => "unknown",
};

pub fn app_name() -> String {
    format!("Native Printer {VERSION}")
}

/// Multi-line version block printed at startup.
pub fn version_info() -> String {
    format!("\nVersion: {VERSION}\nCommit: {COMMIT_HASH}\nBuildTime: {BUILD_TIME}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_carries_version() {
        assert!(app_name().ends_with(VERSION));
    }

    #[test]
    fn version_info_lists_all_fields() {
        let info = version_info();
        assert!(info.contains("Version: "));
        assert!(info.contains("Commit: "));
        assert!(info.contains("BuildTime: "));
    }
}
