//! LODA (Lightweight Online Detector of Anomalies) for streaming telemetry
//! ----------------------------------------------------------------------------
//! Unsupervised, windowed anomaly detection over fixed-length numeric samples.
//! It implements:
//!   * A sparse random projection ensemble (`round(sqrt(n))` normal weights per row)
//!   * One fixed-width histogram per projection, with the bin width picked once by
//!     a penalized-likelihood search over the initial window
//!   * Double-buffered histogram banks: training histograms become the scoring
//!     estimators every `W` updates, and the threshold is recalibrated as a
//!     quantile of that window's scores
//!   * Per-feature attribution of anomalous samples via a Welch statistic
//!   * A [`Monitor`] that buffers the first window and turns a sample stream into reports
//!
//! # Design notes
//! The detector is plain synchronous code driven by one producer. `update`
//! takes `&mut self`; share a detector across threads behind a single lock.
//! Nothing can be scored before the first rotation: `score_sample` and
//! `predict` return [`LodaError::NotFitted`] until then. Constructing a
//! [`Loda`] feeds the initial window through `update`, so a freshly built
//! detector is already fitted.
//!
//! A `seed` of 0 draws the projections from an OS-seeded generator. Any other
//! seed reproduces the same projections and bin widths.
//!
//! # Example
//! ```
//! use loda::{Classification, Loda};
//!
//! // 3 features: two periodic signals and a slow sawtooth
//! let window: Vec<Vec<f64>> = (0..128)
//!     .map(|i| {
//!         let t = i as f64 * 0.1;
//!         vec![t.sin(), t.cos(), (i % 16) as f64 / 16.0]
//!     })
//!     .collect();
//! let mut detector = Loda::new(50, 0.05, 42, &window).unwrap();
//!
//! // Keep streaming normal points
//! for i in 128..256 {
//!     let t = i as f64 * 0.1;
//!     detector.update(&[t.sin(), t.cos(), (i % 16) as f64 / 16.0]).unwrap();
//! }
//!
//! // Classify a far away point and see which features drove it
//! let suspicious = [25.0, -25.0, 40.0];
//! assert_eq!(detector.predict(&suspicious).unwrap(), Classification::Anomalous);
//! let attribution = detector.score_features(&suspicious).unwrap();
//! println!("ranked features = {:?}", attribution.ranked());
//! ```

pub mod attribution;
pub mod binning;
pub mod config;
pub mod detector;
pub mod error;
pub mod histogram;
pub mod monitor;
pub mod projection;
pub mod stats;

pub use attribution::Attribution;
pub use binning::BinWidths;
pub use config::{LodaConfig, MonitorConfig};
pub use detector::{Classification, Loda, Threshold};
pub use error::{LodaError, Result};
pub use histogram::Histogram;
pub use monitor::{Monitor, Report};
pub use projection::ProjectionEnsemble;

pub type FeatureVector = [f64];
