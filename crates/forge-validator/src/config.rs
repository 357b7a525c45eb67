//! Validator configuration

use serde::{Deserialize, Serialize};

/// Configuration for validation rules
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Descriptions shorter than this raise an INFO issue
    pub min_description_chars: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_description_chars: 40,
        }
    }
}
