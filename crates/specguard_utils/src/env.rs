//! Environment access and the on/off vocabulary used by configuration flags.

use std::collections::HashMap;

/// Source of environment variables. Implemented for the real process
/// environment and for in-memory maps.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// `"0"` and `"OFF"` turn a flag off; any other value turns it on.
pub fn parse_enable(value: &str) -> bool {
    !matches!(value, "0" | "OFF")
}

/// Only `"1"` and `"ON"` turn a flag on.
pub fn parse_strict_on(value: &str) -> bool {
    matches!(value, "1" | "ON")
}

/// Parses a boolean setting, accepting the usual spellings.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}
