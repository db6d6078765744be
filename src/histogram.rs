use std::collections::HashMap;

/// Likelihood reported for empty bins: twice the smallest subnormal double,
/// so `ln()` of it is still finite.
pub const PROB_FLOOR: f64 = f64::from_bits(2);

/// Fixed-width 1-D density estimator over one projected coordinate.
///
/// Bins are indexed relative to `origin` and only populated bins are stored.
/// The density normalizer grows by `bin_width` per update, so
/// `Σ pdf[k] * bin_width == 1` holds after every update.
#[derive(Debug, Clone)]
pub struct Histogram {
    bin_width: f64,
    origin: f64,
    total_mass: f64,
    counts: HashMap<i64, u64>,
    pdf: HashMap<i64, f64>,
}

impl Histogram {
    pub fn new(bin_width: f64, origin: f64) -> Self {
        assert!(
            bin_width > 0.0 && bin_width.is_finite(),
            "bin width must be positive and finite, got {bin_width}"
        );
        Self {
            bin_width,
            origin,
            total_mass: 0.0,
            counts: HashMap::new(),
            pdf: HashMap::new(),
        }
    }

    /// Resolve the bin index of `x` for a grid of `bin_width` anchored at `origin`.
    pub fn locate(x: f64, bin_width: f64, origin: f64) -> i64 {
        let mut k = ((x - origin) / bin_width).floor() as i64;
        // Floating point edge correction: make sure x really is inside bin k.
        let left = k as f64 * bin_width + origin;
        let right = (k as f64 + 1.0) * bin_width + origin;
        if x > right {
            k = k.saturating_add(1);
        } else if x < left {
            k = k.saturating_sub(1);
        }
        k
    }

    pub fn bin_of(&self, x: f64) -> i64 {
        Self::locate(x, self.bin_width, self.origin)
    }

    pub fn update(&mut self, x: f64) {
        let k = self.bin_of(x);
        *self.counts.entry(k).or_insert(0) += 1;
        self.total_mass += self.bin_width;

        for (&bin, &count) in &self.counts {
            self.pdf.insert(bin, count as f64 / self.total_mass);
        }
    }

    /// Density of the bin `x` falls into, or [`PROB_FLOOR`] for an empty bin.
    pub fn predict_prob(&self, x: f64) -> f64 {
        self.pdf.get(&self.bin_of(x)).copied().unwrap_or(PROB_FLOOR)
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn counts(&self) -> &HashMap<i64, u64> {
        &self.counts
    }

    pub fn pdf(&self) -> &HashMap<i64, f64> {
        &self.pdf
    }

    /// Number of updates applied so far.
    pub fn total_count(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
