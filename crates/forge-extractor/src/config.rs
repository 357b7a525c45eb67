//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for per-chunk extraction calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Model identifier passed to the LLM client
    pub model_id: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Optional completion length cap
    pub max_tokens: Option<u32>,

    /// Maximum time for a single extraction call (seconds)
    pub extraction_timeout_secs: u64,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature {} out of range [0.0, 2.0]",
                self.temperature
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            model_id: "llama3".to_string(),
            temperature: 0.2,
            max_tokens: None,
            extraction_timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ExtractorConfig::default();
        config.extraction_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_range() {
        let mut config = ExtractorConfig::default();
        config.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.model_id, parsed.model_id);
        assert_eq!(config.extraction_timeout_secs, parsed.extraction_timeout_secs);
    }
}
