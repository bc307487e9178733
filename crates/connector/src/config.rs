//! Connector settings not covered by the command line

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional connector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    /// Public URL AM-Vision delivers hooks to, when the connector sits
    /// behind a proxy or NAT
    #[serde(default)]
    pub callback_url: Option<String>,

    /// Seconds before the first synchronization
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
}

fn default_initial_delay() -> u64 {
    60
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            callback_url: None,
            initial_delay_secs: default_initial_delay(),
        }
    }
}

impl ConnectorConfig {
    /// Load configuration from an optional file and `AMV_` environment
    /// variables; the environment wins.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file));
        }
        let config = builder
            .add_source(config::Environment::with_prefix("AMV").try_parsing(true))
            .build()
            .context("failed to read connector configuration")?;

        config
            .try_deserialize()
            .context("invalid connector configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.callback_url, None);
        assert_eq!(config.initial_delay_secs, 60);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "callback_url: https://connector.example.com/hook/").unwrap();
        writeln!(file, "initial_delay_secs: 5").unwrap();

        let config = ConnectorConfig::load(Some(file.path())).unwrap();

        assert_eq!(
            config.callback_url.as_deref(),
            Some("https://connector.example.com/hook/")
        );
        assert_eq!(config.initial_delay_secs, 5);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = ConnectorConfig::load(Some(Path::new("/nonexistent/connector.yaml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read connector configuration"));
    }
}
