//! Configuration management for block event decoding

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecoderConfig {
    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,
    #[serde(default = "default_max_envelope_size")]
    pub max_envelope_size: usize,
    #[serde(default = "default_verify_data_hash")]
    pub verify_data_hash: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_block_size: default_max_block_size(),
            max_envelope_size: default_max_envelope_size(),
            verify_data_hash: default_verify_data_hash(),
        }
    }
}

/// What the dispatcher does when one envelope of a block fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the envelope, count it, and keep walking the block
    #[default]
    Skip,
    /// Stop at the first malformed envelope and report it
    Abort,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(config_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decoder.max_block_size == 0 {
            return Err(ConfigError::Invalid(
                "decoder.max_block_size must be greater than zero".to_string(),
            ));
        }

        if self.decoder.max_envelope_size == 0 {
            return Err(ConfigError::Invalid(
                "decoder.max_envelope_size must be greater than zero".to_string(),
            ));
        }

        if self.decoder.max_envelope_size > self.decoder.max_block_size {
            return Err(ConfigError::Invalid(format!(
                "decoder.max_envelope_size ({}) exceeds decoder.max_block_size ({})",
                self.decoder.max_envelope_size, self.decoder.max_block_size
            )));
        }

        if self.dispatch.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.channel_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load config from `path`. An absent file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(path)?;
    Config::from_toml_str(&config_str)
}

fn default_max_block_size() -> usize {
    100 * 1024 * 1024
}

fn default_max_envelope_size() -> usize {
    10 * 1024 * 1024
}

fn default_verify_data_hash() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.decoder, DecoderConfig::default());
        assert_eq!(config.dispatch.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.dispatch.channel_capacity, 64);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [decoder]
            max_envelope_size = 2048
            verify_data_hash = false

            [dispatch]
            failure_policy = "abort"
            "#,
        )
        .unwrap();

        assert_eq!(config.decoder.max_envelope_size, 2048);
        assert_eq!(config.decoder.max_block_size, default_max_block_size());
        assert!(!config.decoder.verify_data_hash);
        assert_eq!(config.dispatch.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let result = Config::from_toml_str("[decoder]\nmax_block_size = 0\nmax_envelope_size = 0\n");
        match result {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("max_block_size")),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_envelope_size_rejected() {
        let result = Config::from_toml_str("[decoder]\nmax_envelope_size = 0\n");
        match result {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("max_envelope_size")),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_channel_capacity_rejected() {
        let result = Config::from_toml_str("[dispatch]\nchannel_capacity = 0\n");
        match result {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("channel_capacity")),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_limit_above_block_limit_rejected() {
        let result = Config::from_toml_str(
            r#"
            [decoder]
            max_block_size = 100
            max_envelope_size = 200
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = Config::from_toml_str("[dispatch]\nfailure_policy = \"retry\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert!(config.decoder.verify_data_hash);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatch]\nchannel_capacity = 8").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.dispatch.channel_capacity, 8);
    }
}
