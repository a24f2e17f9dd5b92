//! Simulating actors in environments
mod summary;

pub use summary::StepsSummary;

use crate::agents::Actor;
use crate::envs::{Environment, Successor};
use crate::logging::StatsLogger;
use crate::Prng;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

/// Description of an environment step.
///
/// There are a few different forms that this structure can take in terms of describing the
/// next observation when `next` is [`Successor::Continue`].
/// These are determined by the value of the third generic parameter `U`:
/// * `Step<O, A>` - `U = O` - The continuing successor observation is owned.
/// * [`PartialStep<O, A>`] - `U = ()` - The continuing successor observation is omitted.
///
/// If `next` is [`Successor::Interrupt`] then the observation is owned in all cases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step<O, A, U = O> {
    /// The initial observation.
    pub observation: O,
    /// The action taken from the initial state given the initial observation.
    pub action: A,
    /// The resulting reward.
    pub reward: f64,
    /// The next observation or outcome; how the episode progresses.
    pub next: Successor<O, U>,
}

/// Description of an environment step where the continuing successor observation is omitted.
pub type PartialStep<O, A> = Step<O, A, ()>;

/// Simulate an actor in an environment.
///
/// Returns an infinite iterator of steps. Episodes are started as needed.
pub fn run_actor<'a, E, X>(
    env: &'a E,
    actor: X,
    rng: Prng,
    logger: &'a mut dyn StatsLogger,
) -> ActorSteps<'a, E, X>
where
    E: Environment + ?Sized,
    X: Actor<E::Observation, E::Action>,
{
    ActorSteps {
        env,
        actor,
        rng,
        logger,
        state: None,
    }
}

/// Iterator of actor-environment simulation steps.
pub struct ActorSteps<'a, E: Environment + ?Sized, X> {
    env: &'a E,
    actor: X,
    rng: Prng,
    logger: &'a mut dyn StatsLogger,
    state: Option<E::State>,
}

impl<E, X> Iterator for ActorSteps<'_, E, X>
where
    E: Environment + ?Sized,
    X: Actor<E::Observation, E::Action>,
{
    type Item = PartialStep<E::Observation, E::Action>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = match self.state.take() {
            Some(state) => state,
            None => {
                self.actor.reset();
                self.env.initial_state(&mut self.rng)
            }
        };
        let observation = self.env.observe(&state, &mut self.rng);
        let action = self.actor.act(&observation, &mut self.rng);
        let (successor, reward) = self.env.step(state, &action, &mut self.rng, self.logger);
        let next = match successor {
            Successor::Continue(state) => {
                self.state = Some(state);
                Successor::Continue(())
            }
            Successor::Terminate => Successor::Terminate,
            Successor::Interrupt(state) => {
                Successor::Interrupt(self.env.observe(&state, &mut self.rng))
            }
        };
        Some(Step {
            observation,
            action,
            reward,
            next,
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        // infinite
        (usize::MAX, None)
    }
}

impl<E, X> FusedIterator for ActorSteps<'_, E, X>
where
    E: Environment + ?Sized,
    X: Actor<E::Observation, E::Action>,
{
}
