//! Pipeline configuration
//!
//! Loaded once before a run and read-only while it executes; the
//! orchestrator never mutates configuration mid-run.

use forge_extractor::{ChunkerConfig, ExtractorConfig};
use forge_sentinel::SentinelConfig;
use forge_validator::ValidatorConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Chunking parameters
    pub chunker: ChunkerConfig,

    /// Per-chunk extraction parameters
    pub extractor: ExtractorConfig,

    /// Reconciliation thresholds
    pub sentinel: SentinelConfig,

    /// Validation rules
    pub validator: ValidatorConfig,

    /// Upper bound on concurrent extraction calls
    ///
    /// Each call spends LLM rate-limit budget, so this stays small.
    pub max_concurrent_extractions: usize,

    /// Retries per chunk for rate-limited or timed-out calls
    pub max_chunk_retries: u32,

    /// RETRY decisions honored per review checkpoint before aborting
    pub max_review_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            extractor: ExtractorConfig::default(),
            sentinel: SentinelConfig::default(),
            validator: ValidatorConfig::default(),
            max_concurrent_extractions: 4,
            max_chunk_retries: 2,
            max_review_retries: 3,
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration and everything nested in it
    pub fn validate(&self) -> Result<(), String> {
        self.chunker.validate()?;
        self.extractor.validate()?;
        self.sentinel.validate()?;
        if self.max_concurrent_extractions == 0 {
            return Err("max_concurrent_extractions must be greater than 0".to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = PipelineConfig::default();
        config.max_concurrent_extractions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nested_config_errors_surface() {
        let mut config = PipelineConfig::default();
        config.sentinel.review_threshold = 0.99;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::default();
        let parsed = PipelineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(
            config.max_concurrent_extractions,
            parsed.max_concurrent_extractions
        );
        assert_eq!(config.chunker.max_chunk_chars, parsed.chunker.max_chunk_chars);
    }
}
