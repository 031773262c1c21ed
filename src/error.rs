//! Error types for estimator runs.

use crate::distributions::DistributionError;

/// Errors surfaced by the estimator and the scenario functions.
///
/// Configuration problems are reported before any trial runs. A zero
/// included-trial count is not an error: probabilities come back as
/// `None` instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimatorError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// A bounded-retry trial used up its attempt cap without succeeding.
    #[error("trial exceeded its cap of {attempts} attempts")]
    TrialAttemptExceeded { attempts: u32 },
}

impl EstimatorError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EstimatorError::InvalidConfiguration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = EstimatorError::invalid("sample size 5 exceeds population size 4");
        assert_eq!(
            e.to_string(),
            "invalid configuration: sample size 5 exceeds population size 4"
        );

        let e = EstimatorError::TrialAttemptExceeded { attempts: 60 };
        assert_eq!(e.to_string(), "trial exceeded its cap of 60 attempts");
    }

    #[test]
    fn test_distribution_error_converts() {
        let d = DistributionError::InvalidParameters("rate must be > 0".into());
        let e: EstimatorError = d.clone().into();
        assert_eq!(e, EstimatorError::Distribution(d));
    }
}
