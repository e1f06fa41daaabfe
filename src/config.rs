//! Tunable knobs for alignment, inference and clustering.
//!
//! One `CoreConfig` value is threaded through every call that needs it.
//! All sections deserialize with defaults, so a partial JSON document only
//! overrides what it names.

use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::cluster::Linkage;
use crate::error::{CoreError, Result};

/// How raw alignment scores are combined into a distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreNormalization {
    /// `1 - 2S / (SS1 + SS2)` on the accumulated scores
    #[default]
    Raw,
    /// Divide `S` by alignment length and `SS1`, `SS2` by string lengths first
    LengthNormalized,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub normalization: ScoreNormalization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InformationConfig {
    /// Share of the observed trigram mass spread over all pattern types
    pub smoothing_mass_ratio: f64,
}

impl Default for InformationConfig {
    fn default() -> Self {
        Self {
            smoothing_mass_ratio: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Normalized edit distance at or below which a seed candidate is accepted
    pub seed_threshold: f64,
    /// Weighted distance threshold during re-estimation of the global model
    pub reestimation_threshold: f64,
    /// Weighted distance threshold for local and self models
    pub local_threshold: f64,
    pub iterations: usize,
    pub monte_carlo_samples: usize,
    /// Laplace smoothing mass for symbol-pair distributions, relative to observed mass
    pub pair_smoothing_ratio: f64,
    /// Number of independently seeded partitions for noise sampling
    pub sampling_chunks: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            seed_threshold: 0.35,
            reestimation_threshold: 0.7,
            local_threshold: 0.6,
            iterations: 3,
            monte_carlo_samples: 100_000,
            pair_smoothing_ratio: 0.2,
            sampling_chunks: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub linkage: Linkage,
    pub threshold: f64,
    /// Distances are capped here and then rescaled into [0, 1]
    pub max_distance: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            linkage: Linkage::Average,
            threshold: 0.75,
            max_distance: 1.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub alignment: AlignmentConfig,
    pub information: InformationConfig,
    pub inference: InferenceConfig,
    pub clustering: ClusteringConfig,
}

impl CoreConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let config: CoreConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.information.smoothing_mass_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(CoreError::InvalidParameter(format!(
                "smoothing_mass_ratio must be finite and > 0, got {}",
                ratio
            )));
        }

        let inference = &self.inference;
        for (name, value) in [
            ("seed_threshold", inference.seed_threshold),
            ("reestimation_threshold", inference.reestimation_threshold),
            ("local_threshold", inference.local_threshold),
        ] {
            if value.is_nan() {
                return Err(CoreError::InvalidParameter(format!("{} is NaN", name)));
            }
        }
        if !(inference.pair_smoothing_ratio > 0.0) || !inference.pair_smoothing_ratio.is_finite() {
            return Err(CoreError::InvalidParameter(format!(
                "pair_smoothing_ratio must be finite and > 0, got {}",
                inference.pair_smoothing_ratio
            )));
        }
        if inference.sampling_chunks == 0 {
            return Err(CoreError::InvalidParameter(
                "sampling_chunks must be at least 1".to_string(),
            ));
        }

        let clustering = &self.clustering;
        if clustering.threshold.is_nan() {
            return Err(CoreError::InvalidParameter(
                "clustering threshold is NaN".to_string(),
            ));
        }
        if !(clustering.max_distance > 0.0) || !clustering.max_distance.is_finite() {
            return Err(CoreError::InvalidParameter(format!(
                "max_distance must be finite and > 0, got {}",
                clustering.max_distance
            )));
        }
        Ok(())
    }
}
