//! Reconciliation settings, read from `morpheus_config.yaml`.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use yaml_peg::serde as yaml;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "morpheus_config.yaml";

/// How permission documents are decoded before they are compared.
#[derive(Clone, Copy, Deserialize, Serialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Decode into [`RolePermissions`](crate::permissions::RolePermissions):
    /// unset struct fields are ignored.
    #[default]
    Typed,
    /// Decode into generic JSON maps: every key present must match.
    Generic,
}

impl FromStr for DecodeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "typed" => Ok(DecodeMode::Typed),
            "generic" => Ok(DecodeMode::Generic),
            other => Err(format!(
                "unknown decode mode `{other}` (expected `typed` or `generic`)"
            )),
        }
    }
}

impl Display for DecodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeMode::Typed => write!(f, "typed"),
            DecodeMode::Generic => write!(f, "generic"),
        }
    }
}

/// Struct representing the morpheus_config.yaml file.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Decoding used for both documents.
    pub mode: DecodeMode,
    /// Struct fields that are never compared (typed mode only).
    pub hidden_fields: Vec<String>,
}

impl ReconcileConfig {
    /// Parse a yaml config document.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let mut config = yaml::from_str::<ReconcileConfig>(raw).context("Deserializing config")?;
        config
            .pop()
            .ok_or_else(|| anyhow!("config file contains no document"))
    }

    /// Read the config from `path`.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Reading {}", path.as_ref().display()))?;
        Self::from_yaml(&raw)
    }

    /// Read `morpheus_config.yaml` from `dir` if it exists, defaults otherwise.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILENAME);
        if path.exists() {
            Self::read_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Hidden field names in the form the serializer takes.
    pub fn hidden_field_names(&self) -> Vec<&str> {
        self.hidden_fields.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    #[test]
    fn parses_full_config() -> Result<()> {
        let config = ReconcileConfig::from_yaml("mode: generic\nhidden_fields:\n  - id\n  - name\n")?;
        assert_eq!(config.mode, DecodeMode::Generic);
        assert_eq!(config.hidden_field_names(), ["id", "name"]);
        Ok(())
    }

    #[test]
    fn missing_keys_use_defaults() -> Result<()> {
        let config = ReconcileConfig::from_yaml("hidden_fields:\n  - id\n")?;
        assert_eq!(config.mode, DecodeMode::Typed);
        assert_eq!(config.hidden_fields, vec!["id".to_owned()]);
        Ok(())
    }

    #[test]
    fn unknown_mode_is_an_error() {
        assert!(ReconcileConfig::from_yaml("mode: fuzzy\n").is_err());
        assert!("fuzzy".parse::<DecodeMode>().is_err());
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Generic".parse::<DecodeMode>(), Ok(DecodeMode::Generic));
        assert_eq!(DecodeMode::Typed.to_string(), "typed");
    }

    #[test]
    fn discover_falls_back_to_defaults() -> Result<()> {
        let config = ReconcileConfig::discover("/nonexistent/morpheus/project")?;
        assert_eq!(config, ReconcileConfig::default());
        Ok(())
    }
}
