//! Collection engine configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::collection::DEFAULT_MAX_BATCH_SIZE;
use crate::domain::extraction::CONFIDENCE_THRESHOLD;

/// Collection engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// How many simple fields one question may bundle
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Confidence bar extracted values must strictly clear
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

impl EngineConfig {
    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize);
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ValidationError::InvalidConfidenceThreshold);
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

fn default_confidence_threshold() -> f64 {
    CONFIDENCE_THRESHOLD
}
