use thiserror::Error;

/// Errors returned by the detector and the monitor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LodaError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No window rotation has happened yet, so there are no estimators.
    #[error("detector is not fitted yet")]
    NotFitted,

    #[error("attribution for feature {feature} is not finite")]
    DegenerateAttribution { feature: usize },

    #[error("sample has {got} features, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, LodaError>;
