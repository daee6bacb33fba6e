//! Probe configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use shoutwire_core::protocol_constants::{
    DEFAULT_USER_AGENT, HANDSHAKE_TIMEOUT_SECS, MAX_HEADER_BLOCK_SIZE,
};
use shoutwire_core::ConnectionSettings;

/// Probe configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// User agent sent with the handshake request.
    /// Override: `SHOUTWIRE_USER_AGENT`
    pub user_agent: String,

    /// Suffix appended to the URL path (e.g. `;` for SHOUTcast v1 servers).
    /// Override: `SHOUTWIRE_RELATIVE_PATH`
    pub relative_path: String,

    /// Maximum response header block size in bytes.
    /// Override: `SHOUTWIRE_MAX_HEADER_BYTES`
    pub max_header_bytes: usize,

    /// Handshake deadline in seconds. 0 disables the deadline.
    /// Override: `SHOUTWIRE_HANDSHAKE_TIMEOUT`
    pub handshake_timeout_secs: u64,

    /// Number of payload bytes to capture after the handshake.
    pub capture_bytes: usize,

    /// Accept streams whose content type is not a known audio format.
    pub allow_unknown_format: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            relative_path: String::new(),
            max_header_bytes: MAX_HEADER_BLOCK_SIZE,
            handshake_timeout_secs: HANDSHAKE_TIMEOUT_SECS,
            capture_bytes: 0,
            allow_unknown_format: false,
        }
    }
}

impl ProbeConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides looked up by variable name.
    ///
    /// Unparseable numeric values are ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SHOUTWIRE_USER_AGENT") {
            self.user_agent = val;
        }

        if let Some(val) = lookup("SHOUTWIRE_RELATIVE_PATH") {
            self.relative_path = val;
        }

        if let Some(val) = lookup("SHOUTWIRE_MAX_HEADER_BYTES") {
            if let Ok(bytes) = val.parse() {
                self.max_header_bytes = bytes;
            }
        }

        if let Some(val) = lookup("SHOUTWIRE_HANDSHAKE_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.handshake_timeout_secs = secs;
            }
        }
    }

    /// Converts to shoutwire-core's connection settings.
    pub fn to_settings(&self) -> ConnectionSettings {
        let timeout = (self.handshake_timeout_secs > 0)
            .then(|| Duration::from_secs(self.handshake_timeout_secs));

        ConnectionSettings::default()
            .with_user_agent(self.user_agent.clone())
            .with_relative_path(self.relative_path.clone())
            .with_max_header_bytes(self.max_header_bytes)
            .with_handshake_timeout(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_match_core_settings() {
        let settings = ProbeConfig::default().to_settings();
        assert_eq!(settings, ConnectionSettings::default());
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user_agent: Probe/2.0").unwrap();
        writeln!(file, "relative_path: \";\"").unwrap();
        writeln!(file, "handshake_timeout_secs: 0").unwrap();

        let settings = ProbeConfig::load(Some(file.path())).unwrap().to_settings();

        assert_eq!(settings.user_agent, "Probe/2.0");
        assert_eq!(settings.relative_path, ";");
        assert_eq!(settings.handshake_timeout, None);
        assert_eq!(settings.max_header_bytes, MAX_HEADER_BLOCK_SIZE);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProbeConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            ("SHOUTWIRE_USER_AGENT", "EnvAgent"),
            ("SHOUTWIRE_MAX_HEADER_BYTES", "not-a-number"),
            ("SHOUTWIRE_HANDSHAKE_TIMEOUT", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = ProbeConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.user_agent, "EnvAgent");
        assert_eq!(config.max_header_bytes, MAX_HEADER_BLOCK_SIZE);
        assert_eq!(
            config.to_settings().handshake_timeout,
            Some(Duration::from_secs(3))
        );
    }
}
