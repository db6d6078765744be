use log::{debug, info, warn};

use crate::FeatureVector;
use crate::attribution::Attribution;
use crate::config::MonitorConfig;
use crate::detector::{Classification, Loda};
use crate::error::{LodaError, Result};

/// Outcome for one observed sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Report<M> {
    /// Caller metadata, passed through untouched.
    pub meta: M,
    pub classification: Classification,
    pub score: f64,
    /// Present only for anomalous samples.
    pub attribution: Option<Attribution>,
}

/// Drives a [`Loda`] detector from a stream of samples.
///
/// The first `window_size` samples are buffered; when the window is full the
/// detector is fitted on it and every buffered sample is classified in
/// arrival order. After that each sample is classified, then used to update
/// the detector.
#[derive(Debug)]
pub struct Monitor<M> {
    config: MonitorConfig,
    detector: Option<Loda>,
    pending: Vec<(Vec<f64>, M)>,
}

impl<M> Monitor<M> {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pending: Vec::with_capacity(config.window_size),
            config,
            detector: None,
        })
    }

    /// Observe one sample. Returns no reports while the first window is
    /// still filling, the whole window's reports when it completes, and one
    /// report per sample afterwards.
    pub fn observe(&mut self, sample: Vec<f64>, meta: M) -> Result<Vec<Report<M>>> {
        if let Some(detector) = self.detector.as_mut() {
            let report = assess(detector, &sample, meta, &self.config.feature_names)?;
            detector.update(&sample)?;
            return Ok(vec![report]);
        }

        if let Some((first, _)) = self.pending.first() {
            if first.len() != sample.len() {
                return Err(LodaError::DimensionMismatch {
                    expected: first.len(),
                    got: sample.len(),
                });
            }
        }
        self.pending.push((sample, meta));
        if self.pending.len() < self.config.window_size {
            return Ok(Vec::new());
        }

        let pending = std::mem::take(&mut self.pending);
        let (samples, metas): (Vec<Vec<f64>>, Vec<M>) = pending.into_iter().unzip();
        let mut detector = Loda::with_config(self.config.detector.clone(), &samples)?;
        info!(
            "monitor ready after {} samples, threshold {:?}",
            samples.len(),
            detector.threshold()
        );

        let mut reports = Vec::with_capacity(samples.len());
        for (sample, meta) in samples.iter().zip(metas) {
            reports.push(assess(&detector, sample, meta, &self.config.feature_names)?);
            detector.update(sample)?;
        }
        self.detector = Some(detector);
        Ok(reports)
    }

    pub fn is_ready(&self) -> bool {
        self.detector.is_some()
    }

    pub fn detector(&self) -> Option<&Loda> {
        self.detector.as_ref()
    }

    /// Samples buffered while waiting for the first window.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

fn assess<M>(detector: &Loda, x: &FeatureVector, meta: M, names: &[String]) -> Result<Report<M>> {
    let score = detector.score_sample(x)?;
    let classification = detector.classify_score(score)?;

    let attribution = if classification.is_anomalous() {
        let attribution = detector.score_features(x)?;
        let degenerate = attribution.degenerate_features();
        if !degenerate.is_empty() {
            warn!("anomaly attribution is degenerate for features {degenerate:?}");
        }
        if let Some((top, value)) = attribution.ranked().first().copied() {
            let name = names.get(top).cloned().unwrap_or_else(|| format!("f{top}"));
            debug!("anomalous sample: score {score:.4}, top feature {name} ({value:.3})");
        }
        Some(attribution)
    } else {
        None
    };

    Ok(Report {
        meta,
        classification,
        score,
        attribution,
    })
}
