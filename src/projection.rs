use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::FeatureVector;
use crate::error::{LodaError, Result};

/// Fixed set of sparse random projection vectors.
///
/// Every row carries exactly `round(sqrt(n))` nonzero standard-normal weights;
/// all other weights are zero. The ensemble never changes after construction.
#[derive(Debug, Clone)]
pub struct ProjectionEnsemble {
    weights: Vec<Vec<f64>>,
    n_features: usize,
}

impl ProjectionEnsemble {
    /// Build `n_projections` rows over `n_features` columns.
    ///
    /// A `seed` of 0 draws from an OS-seeded generator and is not reproducible;
    /// any other seed always yields the same ensemble.
    pub fn new(n_projections: usize, n_features: usize, seed: u64) -> Self {
        if seed == 0 {
            Self::from_rng(n_projections, n_features, &mut StdRng::from_os_rng())
        } else {
            Self::from_rng(n_projections, n_features, &mut StdRng::seed_from_u64(seed))
        }
    }

    pub fn from_rng<R: Rng + ?Sized>(n_projections: usize, n_features: usize, rng: &mut R) -> Self {
        let nonzero = nonzero_per_row(n_features);

        // All uniform draws come first, then the normal weights row by row.
        let mut draws: Vec<Vec<f64>> = (0..n_projections)
            .map(|_| (0..n_features).map(|_| rng.random::<f64>()).collect())
            .collect();

        let mut weights = vec![vec![0.0; n_features]; n_projections];
        for (row, uniforms) in weights.iter_mut().zip(draws.iter_mut()) {
            for _ in 0..nonzero {
                let Some(col) = argmin(uniforms) else { break };
                // Draws live in [0, 1), so 1.0 retires the column.
                uniforms[col] = 1.0;
                row[col] = rng.sample(StandardNormal);
            }
        }

        Self {
            weights,
            n_features,
        }
    }

    /// Wrap an explicit weight matrix. All rows must have the same length.
    pub fn from_weights(weights: Vec<Vec<f64>>) -> Result<Self> {
        let n_features = weights.first().map_or(0, Vec::len);
        if let Some(bad) = weights.iter().find(|row| row.len() != n_features) {
            return Err(LodaError::DimensionMismatch {
                expected: n_features,
                got: bad.len(),
            });
        }
        Ok(Self {
            weights,
            n_features,
        })
    }

    /// Map a sample to one scalar per projection.
    pub fn project(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        if x.len() != self.n_features {
            return Err(LodaError::DimensionMismatch {
                expected: self.n_features,
                got: x.len(),
            });
        }
        Ok(self
            .weights
            .iter()
            .map(|row| row.iter().zip(x).map(|(w, v)| w * v).sum())
            .collect())
    }

    pub fn uses_feature(&self, projection: usize, feature: usize) -> bool {
        self.weights[projection][feature] != 0.0
    }

    pub fn row(&self, projection: usize) -> &[f64] {
        &self.weights[projection]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Number of nonzero weights per projection row.
pub fn nonzero_per_row(n_features: usize) -> usize {
    (n_features as f64).sqrt().round() as usize
}

fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}
