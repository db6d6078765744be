/// Per-feature contribution to a sample's anomaly score.
///
/// Each entry is the Welch statistic contrasting projections that use the
/// feature with those that do not, or `None` when that statistic is not finite
/// (the feature is used by all or none of the projections, or both groups
/// have zero spread).
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    scores: Vec<Option<f64>>,
}

impl Attribution {
    pub(crate) fn from_raw(raw: Vec<f64>) -> Self {
        let scores = raw
            .into_iter()
            .map(|s| s.is_finite().then_some(s))
            .collect();
        Self { scores }
    }

    pub fn get(&self, feature: usize) -> Option<f64> {
        self.scores.get(feature).copied().flatten()
    }

    pub fn scores(&self) -> &[Option<f64>] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Features whose statistic could not be computed.
    pub fn degenerate_features(&self) -> Vec<usize> {
        self.scores
            .iter()
            .enumerate()
            .filter_map(|(j, s)| s.is_none().then_some(j))
            .collect()
    }

    /// Finite `(feature, score)` pairs, largest contribution first.
    pub fn ranked(&self) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self
            .scores
            .iter()
            .enumerate()
            .filter_map(|(j, s)| s.map(|s| (j, s)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Pair scores with feature names. Missing names render as `f{index}`.
    pub fn named<'a>(&'a self, names: &'a [String]) -> impl Iterator<Item = (String, Option<f64>)> + 'a {
        self.scores.iter().enumerate().map(move |(j, s)| {
            let name = names.get(j).cloned().unwrap_or_else(|| format!("f{j}"));
            (name, *s)
        })
    }
}
