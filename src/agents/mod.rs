//! Actors that select actions in an environment
mod expert;
mod random;

pub use expert::{ControlFlowExpert, GridworldExpert};
pub use random::RandomActor;

use crate::Prng;

/// Selects actions in response to observations.
pub trait Actor<O: ?Sized, A> {
    /// Choose an action in the environment.
    ///
    /// # Args
    /// * `observation` - The current observation of the environment state.
    /// * `rng` - Random number generator for any stochasticity in the action choice.
    fn act(&mut self, observation: &O, rng: &mut Prng) -> A;

    /// Reset any per-episode state. Called at the start of every episode.
    fn reset(&mut self) {}
}

impl<O, A, T> Actor<O, A> for &'_ mut T
where
    O: ?Sized,
    T: Actor<O, A> + ?Sized,
{
    fn act(&mut self, observation: &O, rng: &mut Prng) -> A {
        T::act(self, observation, rng)
    }
    fn reset(&mut self) {
        T::reset(self)
    }
}

impl<O, A, T> Actor<O, A> for Box<T>
where
    O: ?Sized,
    T: Actor<O, A> + ?Sized,
{
    fn act(&mut self, observation: &O, rng: &mut Prng) -> A {
        T::act(self, observation, rng)
    }
    fn reset(&mut self) {
        T::reset(self)
    }
}
