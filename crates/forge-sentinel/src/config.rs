//! Sentinel configuration

use serde::{Deserialize, Serialize};

/// Thresholds for the reconciliation bands
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Similarity at or above which candidates merge automatically
    pub auto_merge_threshold: f64,

    /// Similarity at or above which candidates are deferred to review
    pub review_threshold: f64,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            auto_merge_threshold: 0.85,
            review_threshold: 0.60,
        }
    }
}

impl SentinelConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.auto_merge_threshold) {
            return Err(format!(
                "auto_merge_threshold {} out of range [0.0, 1.0]",
                self.auto_merge_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.review_threshold) {
            return Err(format!(
                "review_threshold {} out of range [0.0, 1.0]",
                self.review_threshold
            ));
        }
        if self.review_threshold >= self.auto_merge_threshold {
            return Err(format!(
                "review_threshold {} must be below auto_merge_threshold {}",
                self.review_threshold, self.auto_merge_threshold
            ));
        }
        Ok(())
    }

    /// Merge more aggressively: wider auto-merge band, narrower review band
    pub fn aggressive() -> Self {
        Self {
            auto_merge_threshold: 0.75,
            review_threshold: 0.55,
        }
    }

    /// Merge conservatively: only near-exact matches merge automatically
    pub fn conservative() -> Self {
        Self {
            auto_merge_threshold: 0.95,
            review_threshold: 0.70,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SentinelConfig::default().validate().is_ok());
        assert!(SentinelConfig::aggressive().validate().is_ok());
        assert!(SentinelConfig::conservative().validate().is_ok());
    }

    #[test]
    fn test_inverted_bands_rejected() {
        let config = SentinelConfig {
            auto_merge_threshold: 0.5,
            review_threshold: 0.8,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let config = SentinelConfig {
            auto_merge_threshold: 1.5,
            review_threshold: 0.5,
        };
        assert!(config.validate().is_err());
    }
}
