//! Converting an `Environment` into a stateful environment with `reset` and `step`.
use super::{EnvStructure, Environment, Successor};
use crate::logging::StatsLogger;
use crate::Prng;
use rand::SeedableRng;

/// Wraps an [`Environment`] together with its current episode state.
///
/// Provides the conventional `reset()` / `step(action)` interface.
#[derive(Debug, Clone)]
pub struct EnvWithState<E: Environment> {
    pub env: E,
    state: Option<E::State>,
    rng: Prng,
}

impl<E: Environment> EnvWithState<E> {
    pub fn new(env: E, seed: u64) -> Self {
        Self {
            env,
            state: None,
            rng: Prng::seed_from_u64(seed),
        }
    }

    /// Reset the environment to an initial state.
    ///
    /// Must be called before each new episode.
    pub fn reset(&mut self) -> E::Observation {
        let state = self.env.initial_state(&mut self.rng);
        let observation = self.env.observe(&state, &mut self.rng);
        self.state = Some(state);
        observation
    }

    /// Take a step in the environment.
    ///
    /// # Panics
    /// If the environment has not been reset since creation or since the last episode ended.
    ///
    /// # Returns
    /// * `successor`: An observation of the successor state, if any.
    ///     Once the episode is done, [`EnvWithState::reset`] must be called.
    /// * `reward`: The reward value for this transition.
    pub fn step(
        &mut self,
        action: &E::Action,
        logger: &mut dyn StatsLogger,
    ) -> (Successor<E::Observation>, f64) {
        let state = self
            .state
            .take()
            .expect("Must call reset() before the start of each episode");
        let (successor, reward) = self.env.step(state, action, &mut self.rng, logger);
        let observed = match successor {
            Successor::Continue(state) => {
                let observation = self.env.observe(&state, &mut self.rng);
                self.state = Some(state);
                Successor::Continue(observation)
            }
            Successor::Terminate => Successor::Terminate,
            Successor::Interrupt(state) => {
                Successor::Interrupt(self.env.observe(&state, &mut self.rng))
            }
        };
        (observed, reward)
    }

    /// The current episode state, if an episode is in progress.
    pub const fn state(&self) -> Option<&E::State> {
        self.state.as_ref()
    }
}

impl<E: Environment + EnvStructure> EnvStructure for EnvWithState<E> {
    type ObservationSpace = E::ObservationSpace;
    type ActionSpace = E::ActionSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        self.env.observation_space()
    }
    fn action_space(&self) -> Self::ActionSpace {
        self.env.action_space()
    }
    fn reward_range(&self) -> (f64, f64) {
        self.env.reward_range()
    }
    fn discount_factor(&self) -> f64 {
        self.env.discount_factor()
    }
}

/// Supports conversion to a stateful environment
pub trait IntoStateful: Environment + Sized {
    /// Convert into a stateful environment.
    fn into_stateful(self, seed: u64) -> EnvWithState<Self> {
        EnvWithState::new(self, seed)
    }
}

impl<E: Environment> IntoStateful for E {}
