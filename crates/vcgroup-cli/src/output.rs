//! Formatting and parsing helpers for CLI commands.

use vcgroup_common::types::{Controller, ControllerMask};

/// Renders an optional value, using `-` when absent.
#[must_use]
pub fn display_or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

/// Parses a comma-separated controller list such as `cpu,memory`.
///
/// # Errors
///
/// Returns an error naming the first unknown controller.
pub fn parse_controllers(list: &str) -> anyhow::Result<ControllerMask> {
    list.split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim().parse::<Controller>().map_err(anyhow::Error::from))
        .collect()
}
