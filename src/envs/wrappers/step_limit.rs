use super::{StructurePreservingWrapper, Wrapped};
use crate::envs::{Environment, Successor};
use crate::logging::StatsLogger;
use crate::Prng;
use serde::{Deserialize, Serialize};

/// Environment wrapper that interrupts episodes after a set number of steps.
///
/// The step limit is not included in the observation,
/// so from the agent's perspective the episode length is latent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LatentStepLimit {
    /// Maximum number of steps per episode
    pub max_steps_per_episode: u64,
}

impl LatentStepLimit {
    pub const fn new(max_steps_per_episode: u64) -> Self {
        Self {
            max_steps_per_episode,
        }
    }
}

impl Default for LatentStepLimit {
    fn default() -> Self {
        Self {
            max_steps_per_episode: 100,
        }
    }
}

impl StructurePreservingWrapper for LatentStepLimit {}

/// Wrap an environment with a per-episode step limit.
pub type WithLatentStepLimit<E> = Wrapped<E, LatentStepLimit>;

impl<E: Environment> Environment for Wrapped<E, LatentStepLimit> {
    /// `(inner_state, current_steps)`
    type State = (E::State, u64);
    type Observation = E::Observation;
    type Action = E::Action;

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        (self.inner.initial_state(rng), 0)
    }

    fn observe(&self, state: &Self::State, rng: &mut Prng) -> Self::Observation {
        self.inner.observe(&state.0, rng)
    }

    fn step(
        &self,
        state: Self::State,
        action: &Self::Action,
        rng: &mut Prng,
        logger: &mut dyn StatsLogger,
    ) -> (Successor<Self::State>, f64) {
        let (inner_state, mut current_steps) = state;
        let (inner_successor, reward) = self.inner.step(inner_state, action, rng, logger);
        current_steps += 1;

        let successor = match inner_successor {
            Successor::Continue(s) if current_steps >= self.wrapper.max_steps_per_episode => {
                Successor::Interrupt((s, current_steps))
            }
            other => other.map(|s| (s, current_steps)),
        };
        (successor, reward)
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::{testing, BuildEnv, ControlFlowAction, ControlFlowConfig, ControlFlowEnv};
    use super::super::Wrap;
    use super::*;
    use rand::SeedableRng;

    fn config() -> ControlFlowConfig {
        ControlFlowConfig {
            min_lines: 4,
            max_lines: 8,
            time_limit: 1000,
            ..ControlFlowConfig::default()
        }
    }

    #[test]
    fn run_random() {
        let mut rng = Prng::seed_from_u64(3);
        let env = config()
            .build_env(&mut rng)
            .unwrap()
            .wrap(LatentStepLimit::new(5));
        testing::check_structured_env(&env, 500, 119);
    }

    #[test]
    fn interrupts_at_limit() {
        let mut rng = Prng::seed_from_u64(110);
        let env = config()
            .build_env(&mut rng)
            .unwrap()
            .wrap(LatentStepLimit::new(2));
        let no_op = ControlFlowAction::Subtask(env.inner.num_subtasks());
        let state = env.initial_state(&mut rng);

        let (successor, _) = env.step(state, &no_op, &mut rng, &mut ());
        let state = match successor {
            Successor::Continue(state) => state,
            other => panic!("expected the episode to continue, got {:?}", other.into_partial()),
        };

        let (successor, _) = env.step(state, &no_op, &mut rng, &mut ());
        assert!(successor.is_interrupt());
    }

    #[test]
    fn wrapped_config_builds_wrapped_env() {
        let mut rng = Prng::seed_from_u64(0);
        let env: WithLatentStepLimit<ControlFlowEnv> = config()
            .wrap(LatentStepLimit::new(7))
            .build_env(&mut rng)
            .unwrap();
        assert_eq!(env.wrapper.max_steps_per_episode, 7);
    }
}
