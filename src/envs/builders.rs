//! Environment builder traits
use super::Environment;
use crate::Prng;
use thiserror::Error;

/// Build an [`Environment`].
///
/// Environment is an associated type rather than a generic parameter so that a given
/// configuration constructs exactly one kind of environment.
pub trait BuildEnv {
    /// Type of environment to build
    type Environment: Environment;

    /// Build an environment instance.
    ///
    /// # Args
    /// * `rng` - Random number generator for randomness in the environment structure.
    fn build_env(&self, rng: &mut Prng) -> Result<Self::Environment, BuildEnvError>;
}

/// Error building an environment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildEnvError {
    #[error("min_lines ({min}) must be at least 1 and at most max_lines ({max})")]
    LineRange { min: usize, max: usize },
    #[error("evaluation requires eval_lines to be set")]
    MissingEvalLines,
    #[error("eval_lines ({eval}) must exceed max_lines ({max}) to measure condition size")]
    ConditionSizeRange { eval: usize, max: usize },
    #[error("{name} must be at least {min}, got {value}")]
    TooSmall {
        name: &'static str,
        min: usize,
        value: usize,
    },
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
}
