use std::collections::HashMap;

use crate::histogram::Histogram;

/// Per-projection histogram geometry chosen from the initial window.
#[derive(Debug, Clone, PartialEq)]
pub struct BinWidths {
    widths: Vec<f64>,
    mins: Vec<f64>,
    bins: Vec<usize>,
}

impl BinWidths {
    /// Search, for every projection, the bin count maximizing the penalized
    /// log-likelihood of the projected window.
    ///
    /// `projected[t][i]` is the value of projection `i` for window sample `t`.
    /// Bin counts `1..=max(1, ceil(W / log10(W)))` are tried, and a tie keeps
    /// the smaller count. Projections with an empty or non-finite range get a
    /// unit width anchored at their minimum.
    pub fn optimize(projected: &[Vec<f64>], n_projections: usize) -> Self {
        let window = projected.len();
        let max_bins = max_bin_count(window);

        let mut widths = Vec::with_capacity(n_projections);
        let mut mins = Vec::with_capacity(n_projections);
        let mut bins = Vec::with_capacity(n_projections);

        let mut column = Vec::with_capacity(window);
        for i in 0..n_projections {
            column.clear();
            column.extend(projected.iter().map(|row| row[i]));

            let min = column.iter().copied().fold(f64::INFINITY, f64::min);
            let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = max - min;

            mins.push(min);
            if !(range > 0.0 && range.is_finite()) {
                widths.push(1.0);
                bins.push(1);
                continue;
            }

            let mut best_l = -(f64::MAX / 2.0);
            let mut best_b = 1;
            let mut best_width = range;
            for b in 1..=max_bins {
                let width = range / b as f64;
                let l = penalized_likelihood(&column, width, min, b);
                if l > best_l && width > 0.0 {
                    best_l = l;
                    best_b = b;
                    best_width = width;
                }
            }
            widths.push(best_width);
            bins.push(best_b);
        }

        Self { widths, mins, bins }
    }

    pub fn width(&self, projection: usize) -> f64 {
        self.widths[projection]
    }

    pub fn min(&self, projection: usize) -> f64 {
        self.mins[projection]
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn mins(&self) -> &[f64] {
        &self.mins
    }

    /// Chosen bin count per projection.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// A fresh, empty histogram for `projection`.
    pub fn histogram(&self, projection: usize) -> Histogram {
        Histogram::new(self.widths[projection], self.mins[projection])
    }
}

/// Largest bin count tried for a window of `window` samples.
pub fn max_bin_count(window: usize) -> usize {
    let w = window as f64;
    let bound = (w / w.log10()).ceil();
    if bound.is_finite() && bound >= 1.0 {
        bound as usize
    } else {
        1
    }
}

/// `Σ count * log10(b * count / W) - (b - 1 + log10(b)^2.5)` over populated bins.
pub fn penalized_likelihood(values: &[f64], width: f64, origin: f64, b: usize) -> f64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &v in values {
        *counts.entry(Histogram::locate(v, width, origin)).or_insert(0) += 1;
    }

    let n = values.len() as f64;
    let b = b as f64;
    let fit: f64 = counts
        .values()
        .map(|&c| {
            let c = c as f64;
            c * (b * c / n).log10()
        })
        .sum();
    let penalty = b - 1.0 + b.log10().powf(2.5);
    fit - penalty
}
