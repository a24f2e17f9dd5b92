//! Reinforcement learning environments
mod builders;
pub mod control_flow;
mod stateful;
#[cfg(test)]
pub mod testing;
mod wrappers;

pub use builders::{BuildEnv, BuildEnvError};
pub use control_flow::{
    ControlFlowAction, ControlFlowConfig, ControlFlowEnv, ControlFlowObs, GridworldConfig,
    GridworldEnv, GridworldObs,
};
pub use stateful::{EnvWithState, IntoStateful};
pub use wrappers::{LatentStepLimit, Wrap, WithLatentStepLimit, Wrapped};

use crate::logging::StatsLogger;
use crate::spaces::Space;
use crate::Prng;
use serde::{Deserialize, Serialize};

/// The external structure of a reinforcement learning environment.
pub trait EnvStructure {
    type ObservationSpace: Space;
    type ActionSpace: Space;

    /// Space containing all possible observations.
    ///
    /// This is not required to be tight:
    /// the space may contain elements that can never be produced as a state observation.
    fn observation_space(&self) -> Self::ObservationSpace;

    /// The space of all possible actions.
    ///
    /// Every element in this space must be a valid action.
    fn action_space(&self) -> Self::ActionSpace;

    /// A lower and upper bound on possible reward values.
    ///
    /// These bounds are not required to be tight but ideally will be as tight as possible.
    fn reward_range(&self) -> (f64, f64);

    /// A discount factor applied to future rewards.
    ///
    /// A value between `0` and `1`, inclusive.
    fn discount_factor(&self) -> f64;
}

/// A reinforcement learning environment.
///
/// Defines the environment dynamics. Episode state is owned by the caller and passed by value
/// through [`Environment::step`]; the environment itself is immutable.
pub trait Environment {
    /// Environment state type. Not necessarily observable by the agent.
    type State;
    /// Observation of the state provided to the agent.
    type Observation;
    /// Action selected by the agent.
    type Action;

    /// Sample a new initial state.
    fn initial_state(&self, rng: &mut Prng) -> Self::State;

    /// Generate an observation for a given state.
    fn observe(&self, state: &Self::State, rng: &mut Prng) -> Self::Observation;

    /// Perform a state transition in reponse to an action.
    ///
    /// # Args
    /// * `state`  - The initial state.
    /// * `action` - The action to take at this state.
    /// * `rng`    - Random number generator for any stochasticity in the transition.
    /// * `logger` - Logger for any auxiliary information about the episode.
    ///
    /// # Returns
    /// * `successor`: The resulting state or outcome.
    /// * `reward`: The reward for this transition.
    fn step(
        &self,
        state: Self::State,
        action: &Self::Action,
        rng: &mut Prng,
        logger: &mut dyn StatsLogger,
    ) -> (Successor<Self::State>, f64);
}

/// An environment with consistent type information.
pub trait StructuredEnvironment:
    EnvStructure
    + Environment<
        Observation = <Self::ObservationSpace as Space>::Element,
        Action = <Self::ActionSpace as Space>::Element,
    >
{
}

impl<T> StructuredEnvironment for T where
    T: EnvStructure
        + Environment<
            Observation = <Self::ObservationSpace as Space>::Element,
            Action = <Self::ActionSpace as Space>::Element,
        > + ?Sized
{
}

/// The successor state or outcome of an episode step.
///
/// The purpose of the second generic parameter `U` is to allow the continuing state to be
/// omitted (`U = ()`) when it is stored elsewhere.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Successor<T, U = T> {
    /// The episode continues with the given state.
    Continue(U),
    /// The episode ends by entering a terminal state.
    ///
    /// A terminal state is one from which all possible trajectories would have 0 reward.
    Terminate,
    /// The episode ends despite entering the given non-terminal state.
    ///
    /// Used for time limits: the future value of the state is not zero.
    Interrupt(T),
}

impl<T, U> Successor<T, U> {
    /// Whether this successor marks the end of an episode
    #[inline]
    pub const fn episode_done(&self) -> bool {
        !matches!(self, Self::Continue(_))
    }

    /// Whether this successor is a terminal state.
    #[inline]
    pub const fn is_terminate(&self) -> bool {
        matches!(self, Self::Terminate)
    }

    /// Whether this successor interrupts the episode.
    #[inline]
    pub const fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupt(_))
    }

    /// Drop any stored continuing state.
    #[inline]
    pub fn into_partial(self) -> Successor<T, ()> {
        match self {
            Self::Continue(_) => Successor::Continue(()),
            Self::Terminate => Successor::Terminate,
            Self::Interrupt(s) => Successor::Interrupt(s),
        }
    }
}

impl<T> Successor<T> {
    /// Apply a transformation to the inner state when present.
    #[inline]
    pub fn map<F, V>(self, f: F) -> Successor<V>
    where
        F: FnOnce(T) -> V,
    {
        match self {
            Self::Continue(state) => Successor::Continue(f(state)),
            Self::Terminate => Successor::Terminate,
            Self::Interrupt(state) => Successor::Interrupt(f(state)),
        }
    }

    /// Get the inner state, if any.
    #[inline]
    #[allow(clippy::missing_const_for_fn)]
    pub fn into_state(self) -> Option<T> {
        match self {
            Self::Continue(state) | Self::Interrupt(state) => Some(state),
            Self::Terminate => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_episode_done() {
        assert!(!Successor::<u8>::Continue(1).episode_done());
        assert!(Successor::<u8>::Terminate.episode_done());
        assert!(Successor::<u8>::Interrupt(1).episode_done());
    }

    #[test]
    fn successor_map_keeps_variant() {
        assert_eq!(Successor::Interrupt(2).map(|x| x * 2), Successor::Interrupt(4));
        assert_eq!(Successor::<u8>::Terminate.map(|x| x * 2), Successor::Terminate);
    }

    #[test]
    fn successor_into_partial() {
        assert_eq!(
            Successor::<u8>::Continue(3).into_partial(),
            Successor::Continue(())
        );
    }
}
