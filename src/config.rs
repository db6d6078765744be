use serde::{Deserialize, Serialize};

use crate::error::{LodaError, Result};

/// Hyperparameters of a [`Loda`](crate::Loda) detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodaConfig {
    /// Number of random projections (and histograms per bank).
    pub n_estimators: usize,
    /// Fraction of each window's scores that falls below the threshold.
    pub quantile: f64,
    /// 0 picks a fresh OS seed; any other value makes projections reproducible.
    pub seed: u64,
    /// Treat a calibrated threshold of exactly 0.0 as "not fitted", matching the
    /// legacy sentinel check. Only useful for output comparisons.
    pub zero_threshold_is_unfitted: bool,
}

impl Default for LodaConfig {
    fn default() -> Self {
        Self {
            n_estimators: 140,
            quantile: 0.05,
            seed: 0,
            zero_threshold_is_unfitted: false,
        }
    }
}

impl LodaConfig {
    pub fn new(n_estimators: usize, quantile: f64, seed: u64) -> Self {
        Self {
            n_estimators,
            quantile,
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(LodaError::InvalidConfiguration(
                "n_estimators must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.quantile) {
            return Err(LodaError::InvalidConfiguration(format!(
                "quantile must be in [0, 1], got {}",
                self.quantile
            )));
        }
        Ok(())
    }
}

/// Settings for a [`Monitor`](crate::Monitor): the detector plus the size of
/// the window it is fitted on and rotates over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub detector: LodaConfig,
    pub window_size: usize,
    /// Optional names for the sample features, in sample order.
    pub feature_names: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            detector: LodaConfig::default(),
            window_size: 256,
            feature_names: Vec::new(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        if self.window_size < 2 {
            return Err(LodaError::InvalidConfiguration(format!(
                "window_size must be at least 2, got {}",
                self.window_size
            )));
        }
        Ok(())
    }
}
