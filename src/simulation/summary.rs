use super::PartialStep;
use std::fmt;
use std::iter::FromIterator;

/// Basic summary statistics of simulation steps.
///
/// An episode counts as a success if it terminates with a positive final reward.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct StepsSummary {
    pub num_steps: u64,
    pub num_episodes: u64,
    pub num_successes: u64,
    pub num_interrupted: u64,
    pub total_reward: f64,
}

impl fmt::Display for StepsSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "num_steps: {}", self.num_steps)?;
        writeln!(f, "num_episodes: {}", self.num_episodes)?;
        writeln!(f, "success_rate:     {}", self.success_rate())?;
        writeln!(
            f,
            "step_reward_mean: {}",
            self.total_reward / self.num_steps as f64
        )?;
        writeln!(
            f,
            "ep_reward_mean:   {}",
            self.total_reward / self.num_episodes as f64
        )?;
        writeln!(
            f,
            "ep_length_mean:   {}",
            self.num_steps as f64 / self.num_episodes as f64
        )?;
        Ok(())
    }
}

impl StepsSummary {
    pub fn update<O, A>(&mut self, step: &PartialStep<O, A>) {
        self.num_steps += 1;
        self.total_reward += step.reward;
        if step.next.episode_done() {
            self.num_episodes += 1;
            if step.next.is_interrupt() {
                self.num_interrupted += 1;
            } else if step.reward > 0.0 {
                self.num_successes += 1;
            }
        }
    }

    /// Fraction of completed episodes that were successful. `NaN` if there are none.
    pub fn success_rate(&self) -> f64 {
        self.num_successes as f64 / self.num_episodes as f64
    }
}

impl<O, A> FromIterator<PartialStep<O, A>> for StepsSummary {
    fn from_iter<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = PartialStep<O, A>>,
    {
        steps.into_iter().fold(Self::default(), |mut s, step| {
            s.update(&step);
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::Successor;

    fn step(reward: f64, next: Successor<(), ()>) -> PartialStep<(), ()> {
        PartialStep {
            observation: (),
            action: (),
            reward,
            next,
        }
    }

    #[test]
    fn counts_successes() {
        let summary: StepsSummary = vec![
            step(0.0, Successor::Continue(())),
            step(1.0, Successor::Terminate),
            step(0.0, Successor::Terminate),
            step(0.0, Successor::Continue(())),
            step(0.0, Successor::Interrupt(())),
        ]
        .into_iter()
        .collect();
        assert_eq!(summary.num_steps, 5);
        assert_eq!(summary.num_episodes, 3);
        assert_eq!(summary.num_successes, 1);
        assert_eq!(summary.num_interrupted, 1);
        assert!((summary.success_rate() - 1.0 / 3.0).abs() < 1e-12);
    }
}
