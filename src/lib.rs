//! Control-flow program environments for reinforcement learning.
#![warn(clippy::cast_lossless)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)]
pub mod agents;
pub mod envs;
pub mod logging;
pub mod simulation;
pub mod spaces;
pub mod utils;

pub use agents::{Actor, RandomActor};
pub use envs::{BuildEnv, EnvStructure, Environment, Successor};
pub use simulation::{run_actor, Step, StepsSummary};

/// Pseudo-random number generator used throughout the crate.
///
/// All randomness is drawn from explicitly passed instances so that runs are reproducible
/// given a seed.
pub type Prng = rand_chacha::ChaCha8Rng;
