//! Runtime configuration for the fuser.

use serde::{Deserialize, Serialize};
use specguard_utils::env::{EnvSource, ProcessEnv, parse_bool};
use tracing::warn;

pub const SINGLETON_FUSION_ENV_VAR: &str = "SPECGUARD_SINGLETON_FUSION";
pub const HORIZONTAL_FUSION_ENV_VAR: &str = "SPECGUARD_HORIZONTAL_FUSION";
pub const GUARD_MODE_ENV_VAR: &str = "SPECGUARD_GUARD_MODE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuserConfig {
    pub singleton_fusion: bool,
    pub horizontal_fusion: bool,
    /// When false, every guard reports success without checking.
    pub guard_mode: bool,
}

impl Default for FuserConfig {
    fn default() -> Self {
        Self {
            singleton_fusion: false,
            horizontal_fusion: true,
            guard_mode: true,
        }
    }
}

impl FuserConfig {
    pub fn from_env() -> Self {
        Self::default().overlay_env(&ProcessEnv)
    }

    /// Replaces each setting whose environment variable holds a valid
    /// boolean.
    #[must_use]
    pub fn overlay_env(mut self, env: &dyn EnvSource) -> Self {
        for (name, slot) in [
            (SINGLETON_FUSION_ENV_VAR, &mut self.singleton_fusion),
            (HORIZONTAL_FUSION_ENV_VAR, &mut self.horizontal_fusion),
            (GUARD_MODE_ENV_VAR, &mut self.guard_mode),
        ] {
            let Some(raw) = env.var(name) else {
                continue;
            };
            match parse_bool(&raw) {
                Some(value) => *slot = value,
                None => warn!(var = name, value = %raw, "ignoring unrecognised boolean"),
            }
        }
        self
    }

    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(source)?)
    }

    #[cfg(feature = "toml-config")]
    pub fn from_toml_file(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fuser config {}", path.display()))?;
        Self::from_toml_str(&source)
            .with_context(|| format!("invalid fuser config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn env_overrides_defaults() {
        let env = env(&[(SINGLETON_FUSION_ENV_VAR, "on"), (GUARD_MODE_ENV_VAR, "0")]);
        let config = FuserConfig::default().overlay_env(&env);
        assert!(config.singleton_fusion);
        assert!(config.horizontal_fusion);
        assert!(!config.guard_mode);
    }

    #[test]
    fn unrecognised_values_are_ignored() {
        let env = env(&[(HORIZONTAL_FUSION_ENV_VAR, "sideways")]);
        let config = FuserConfig::default().overlay_env(&env);
        assert_eq!(config, FuserConfig::default());
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn loads_partial_toml() -> anyhow::Result<()> {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "guard_mode = false")?;
        let config = FuserConfig::from_toml_file(file.path())?;
        assert!(!config.guard_mode);
        assert!(config.horizontal_fusion);
        Ok(())
    }
}
