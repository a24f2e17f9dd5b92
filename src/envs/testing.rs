//! Environment testing utilities
use super::{StructuredEnvironment, Successor};
use crate::agents::RandomActor;
use crate::simulation::run_actor;
use crate::spaces::{SampleSpace, Space};
use crate::Prng;
use rand::SeedableRng;

/// Run an environment with a random actor and check that invariants are satisfied.
pub fn check_structured_env<E>(env: &E, num_steps: usize, seed: u64)
where
    E: StructuredEnvironment,
    E::ActionSpace: SampleSpace,
{
    let observation_space = env.observation_space();
    let (min_reward, max_reward) = env.reward_range();
    let discount_factor = env.discount_factor();
    assert!(discount_factor >= 0.0);
    assert!(discount_factor <= 1.0);

    let mut actor = RandomActor::new(env.action_space());
    for step in run_actor(env, &mut actor, Prng::seed_from_u64(seed), &mut ()).take(num_steps) {
        assert!(observation_space.contains(&step.observation));
        assert!(step.reward >= min_reward);
        assert!(step.reward <= max_reward);
        if let Successor::Interrupt(obs) = &step.next {
            assert!(observation_space.contains(obs));
        }
    }
}
