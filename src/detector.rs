use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::FeatureVector;
use crate::attribution::Attribution;
use crate::binning::BinWidths;
use crate::config::LodaConfig;
use crate::error::{LodaError, Result};
use crate::histogram::Histogram;
use crate::projection::ProjectionEnsemble;
use crate::stats;

/// Binary outcome of [`Loda::predict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Normal,
    Anomalous,
}

impl Classification {
    pub fn is_anomalous(self) -> bool {
        self == Classification::Anomalous
    }
}

/// Decision boundary state. Stays `Uncalibrated` until the first rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Uncalibrated,
    Calibrated(f64),
}

impl Threshold {
    pub fn value(self) -> Option<f64> {
        match self {
            Threshold::Uncalibrated => None,
            Threshold::Calibrated(t) => Some(t),
        }
    }
}

/// Lightweight online detector of anomalies.
///
/// Samples are projected onto a fixed sparse random ensemble and each
/// projection is scored by its own histogram. Two histogram banks alternate:
/// the training bank absorbs every `update`, and once a full window has been
/// seen it becomes the estimator bank used by `score_sample`/`predict`, while
/// the threshold is recalibrated as the `quantile` of that window's scores.
#[derive(Debug, Clone)]
pub struct Loda {
    config: LodaConfig,
    projections: ProjectionEnsemble,
    bin_widths: BinWidths,
    training: Vec<Option<Histogram>>,
    estimators: Option<Vec<Histogram>>,
    scores: Vec<f64>,
    window_size: usize,
    threshold: Threshold,
    rotations: u64,
}

impl Loda {
    /// Fit a detector with `n_estimators` projections on `initial_window`.
    ///
    /// The window size of every later rotation is the length of
    /// `initial_window`. The window is fed through [`Loda::update`], so the
    /// returned detector has completed its first rotation.
    pub fn new<S: AsRef<[f64]>>(
        n_estimators: usize,
        quantile: f64,
        seed: u64,
        initial_window: &[S],
    ) -> Result<Self> {
        Self::with_config(LodaConfig::new(n_estimators, quantile, seed), initial_window)
    }

    pub fn with_config<S: AsRef<[f64]>>(config: LodaConfig, initial_window: &[S]) -> Result<Self> {
        let mut detector = Self::prepare(config, initial_window)?;
        detector.feed(initial_window)?;
        Ok(detector)
    }

    /// Fit on a caller-built ensemble. `config.n_estimators` is replaced by
    /// the ensemble's size and `config.seed` is ignored.
    pub fn with_projections<S: AsRef<[f64]>>(
        mut config: LodaConfig,
        projections: ProjectionEnsemble,
        initial_window: &[S],
    ) -> Result<Self> {
        config.n_estimators = projections.len();
        config.validate()?;
        let n_features = check_window(initial_window)?;
        if n_features != projections.n_features() {
            return Err(LodaError::DimensionMismatch {
                expected: projections.n_features(),
                got: n_features,
            });
        }
        let mut detector = Self::build(config, projections, initial_window)?;
        detector.feed(initial_window)?;
        Ok(detector)
    }

    /// Draw the projections and search the bin widths on `initial_window`
    /// without updating any histogram.
    ///
    /// The detector starts in warmup: nothing can be scored until
    /// `initial_window.len()` samples have gone through [`Loda::update`].
    pub fn prepare<S: AsRef<[f64]>>(config: LodaConfig, initial_window: &[S]) -> Result<Self> {
        config.validate()?;
        let n_features = check_window(initial_window)?;
        let projections = ProjectionEnsemble::new(config.n_estimators, n_features, config.seed);
        Self::build(config, projections, initial_window)
    }

    fn build<S: AsRef<[f64]>>(
        config: LodaConfig,
        projections: ProjectionEnsemble,
        initial_window: &[S],
    ) -> Result<Self> {
        let projected = initial_window
            .iter()
            .map(|s| projections.project(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let bin_widths = BinWidths::optimize(&projected, projections.len());

        let n_estimators = projections.len();
        let window_size = initial_window.len();
        info!(
            "fitting loda: {} projections over {} features, window {}, bins {}..={}",
            n_estimators,
            projections.n_features(),
            window_size,
            bin_widths.bins().iter().min().copied().unwrap_or(0),
            bin_widths.bins().iter().max().copied().unwrap_or(0),
        );

        Ok(Self {
            config,
            projections,
            bin_widths,
            training: vec![None; n_estimators],
            estimators: None,
            scores: Vec::with_capacity(window_size),
            window_size,
            threshold: Threshold::Uncalibrated,
            rotations: 0,
        })
    }

    fn feed<S: AsRef<[f64]>>(&mut self, samples: &[S]) -> Result<()> {
        for sample in samples {
            self.update(sample.as_ref())?;
        }
        Ok(())
    }

    /// Feed a sample into the training histograms and return its score under
    /// them. Completing a window rotates the banks and recalibrates the
    /// threshold.
    pub fn update(&mut self, x: &FeatureVector) -> Result<f64> {
        let projected = self.projections.project(x)?;

        let mut log_sum = 0.0;
        for (i, (slot, &wx)) in self.training.iter_mut().zip(&projected).enumerate() {
            let hist = slot.get_or_insert_with(|| self.bin_widths.histogram(i));
            hist.update(wx);
            log_sum += hist.predict_prob(wx).ln();
        }
        let score = log_sum / projected.len() as f64;

        self.scores.push(score);
        trace!(
            "loda update: score {score:.4}, window position {}/{}",
            self.scores.len(),
            self.window_size
        );
        if self.scores.len() == self.window_size {
            self.rotate();
        }
        Ok(score)
    }

    fn rotate(&mut self) {
        let training = std::mem::replace(&mut self.training, vec![None; self.projections.len()]);
        let estimators = training
            .into_iter()
            .enumerate()
            .map(|(i, h)| h.unwrap_or_else(|| self.bin_widths.histogram(i)))
            .collect();
        self.estimators = Some(estimators);

        if let Some(t) = stats::quantile(&self.scores, self.config.quantile) {
            self.threshold = Threshold::Calibrated(t);
        }
        self.scores.clear();
        self.rotations += 1;
        debug!(
            "loda rotation {}: threshold {:?}",
            self.rotations, self.threshold
        );
    }

    /// Per-projection `ln(p)` of `x` under the estimator bank.
    pub fn log_likelihoods(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        let estimators = self.estimators.as_ref().ok_or(LodaError::NotFitted)?;
        let projected = self.projections.project(x)?;
        Ok(estimators
            .iter()
            .zip(&projected)
            .map(|(h, &wx)| h.predict_prob(wx).ln())
            .collect())
    }

    /// Mean log-likelihood of `x`; lower is more anomalous.
    pub fn score_sample(&self, x: &FeatureVector) -> Result<f64> {
        Ok(stats::mean(&self.log_likelihoods(x)?))
    }

    pub fn predict(&self, x: &FeatureVector) -> Result<Classification> {
        self.calibrated_threshold()?;
        self.classify_score(self.score_sample(x)?)
    }

    /// Compare an already computed score against the current threshold.
    pub fn classify_score(&self, score: f64) -> Result<Classification> {
        let threshold = self.calibrated_threshold()?;
        Ok(if score < threshold {
            Classification::Anomalous
        } else {
            Classification::Normal
        })
    }

    fn calibrated_threshold(&self) -> Result<f64> {
        match self.threshold {
            Threshold::Uncalibrated => Err(LodaError::NotFitted),
            Threshold::Calibrated(t) if t == 0.0 && self.config.zero_threshold_is_unfitted => {
                Err(LodaError::NotFitted)
            }
            Threshold::Calibrated(t) => Ok(t),
        }
    }

    /// Raw Welch statistic per feature. Entries may be NaN or infinite; see
    /// [`Loda::score_features`] for the checked form.
    pub fn feature_statistics(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        let neg_log: Vec<f64> = self.log_likelihoods(x)?.iter().map(|l| -l).collect();
        Ok((0..self.projections.n_features())
            .map(|j| self.welch(&neg_log, j))
            .collect())
    }

    /// Attribute the anomaly score of `x` to its features.
    pub fn score_features(&self, x: &FeatureVector) -> Result<Attribution> {
        Ok(Attribution::from_raw(self.feature_statistics(x)?))
    }

    /// Statistic for a single feature, or `DegenerateAttribution` if it is not finite.
    ///
    /// # Panics
    /// If `feature` is not below the number of features.
    pub fn feature_score(&self, x: &FeatureVector, feature: usize) -> Result<f64> {
        assert!(
            feature < self.projections.n_features(),
            "feature index {feature} out of range"
        );
        let neg_log: Vec<f64> = self.log_likelihoods(x)?.iter().map(|l| -l).collect();
        let score = self.welch(&neg_log, feature);
        if score.is_finite() {
            Ok(score)
        } else {
            Err(LodaError::DegenerateAttribution { feature })
        }
    }

    fn welch(&self, neg_log: &[f64], feature: usize) -> f64 {
        let mut with = Vec::new();
        let mut without = Vec::new();
        for (i, &v) in neg_log.iter().enumerate() {
            if self.projections.uses_feature(i, feature) {
                with.push(v);
            } else {
                without.push(v);
            }
        }
        let diff = stats::mean(&with) - stats::mean(&without);
        let spread = stats::variance(&with) / with.len() as f64
            + stats::variance(&without) / without.len() as f64;
        diff / spread.sqrt()
    }

    pub fn config(&self) -> &LodaConfig {
        &self.config
    }

    pub fn projections(&self) -> &ProjectionEnsemble {
        &self.projections
    }

    pub fn bin_widths(&self) -> &BinWidths {
        &self.bin_widths
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn is_fitted(&self) -> bool {
        self.estimators.is_some()
    }

    /// Number of completed window rotations.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Samples seen in the current, unfinished window.
    pub fn window_position(&self) -> usize {
        self.scores.len()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn n_features(&self) -> usize {
        self.projections.n_features()
    }

    pub fn training_histograms(&self) -> &[Option<Histogram>] {
        &self.training
    }

    pub fn estimators(&self) -> Option<&[Histogram]> {
        self.estimators.as_deref()
    }
}

/// Validate the shape of an initial window and return its feature count.
fn check_window<S: AsRef<[f64]>>(window: &[S]) -> Result<usize> {
    if window.len() < 2 {
        return Err(LodaError::InvalidConfiguration(format!(
            "initial window needs at least 2 samples, got {}",
            window.len()
        )));
    }
    let n_features = window[0].as_ref().len();
    if n_features == 0 {
        return Err(LodaError::InvalidConfiguration(
            "samples must have at least one feature".into(),
        ));
    }
    if let Some(bad) = window.iter().find(|s| s.as_ref().len() != n_features) {
        return Err(LodaError::DimensionMismatch {
            expected: n_features,
            got: bad.as_ref().len(),
        });
    }
    Ok(n_features)
}
