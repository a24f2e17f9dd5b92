use super::Actor;
use crate::spaces::SampleSpace;
use crate::Prng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An actor that always acts randomly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomActor<AS> {
    action_space: AS,
}

impl<AS> RandomActor<AS> {
    pub const fn new(action_space: AS) -> Self {
        Self { action_space }
    }
}

impl<O: ?Sized, AS: SampleSpace> Actor<O, AS::Element> for RandomActor<AS> {
    fn act(&mut self, _: &O, rng: &mut Prng) -> AS::Element {
        self.action_space.sample(rng)
    }
}

impl<AS: fmt::Display> fmt::Display for RandomActor<AS> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RandomActor({})", self.action_space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::{IndexSpace, Space};
    use rand::SeedableRng;

    #[test]
    fn acts_within_action_space() {
        let space = IndexSpace::new(5);
        let mut actor = RandomActor::new(space);
        let mut rng = Prng::seed_from_u64(1);
        for _ in 0..100 {
            let action = Actor::<(), _>::act(&mut actor, &(), &mut rng);
            assert!(space.contains(&action));
        }
    }
}
