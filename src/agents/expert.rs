//! Actors that follow the program exactly
use super::Actor;
use crate::envs::control_flow::gridworld::{Interaction, Item, Subtask};
use crate::envs::control_flow::{ControlFlowAction, ControlFlowEnv, EncodedLines, GridworldObs};
use crate::envs::ControlFlowObs;
use crate::Prng;

/// Always chooses the subtask of the active line of a [`ControlFlowEnv`].
///
/// Never moves the selection cursor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ControlFlowExpert {
    num_subtasks: usize,
    num_codes: usize,
    /// Cursor move that leaves the selection unchanged; `None` if actions have no cursor.
    stay: Option<usize>,
}

impl ControlFlowExpert {
    pub fn new(env: &ControlFlowEnv) -> Self {
        Self {
            num_subtasks: env.num_subtasks(),
            num_codes: env.num_codes(),
            stay: (!env.config().baseline).then(|| env.n_lines()),
        }
    }

    fn active_code(&self, observation: &ControlFlowObs) -> Option<usize> {
        match &observation.lines {
            EncodedLines::Codes(codes) => codes.get(observation.active).copied(),
            EncodedLines::OneHot(features) => {
                let start = observation.active * self.num_codes;
                (0..self.num_codes).find(|&code| features.get(start + code) == Some(&1.0))
            }
        }
    }
}

impl Actor<ControlFlowObs, ControlFlowAction> for ControlFlowExpert {
    fn act(&mut self, observation: &ControlFlowObs, _: &mut Prng) -> ControlFlowAction {
        // Non-subtask codes are past the subtask range; fall back to the no-op.
        let subtask = self
            .active_code(observation)
            .filter(|&code| code < self.num_subtasks)
            .unwrap_or(self.num_subtasks);
        match self.stay {
            None => ControlFlowAction::Subtask(subtask),
            Some(delta) => ControlFlowAction::SubtaskAndMove { subtask, delta },
        }
    }
}

/// Always chooses the subtask of the active line of a
/// [`GridworldEnv`](crate::envs::GridworldEnv).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GridworldExpert;

impl Actor<GridworldObs, usize> for GridworldExpert {
    fn act(&mut self, observation: &GridworldObs, _: &mut Prng) -> usize {
        let row = observation.lines.row(observation.active);
        let subtask = row[1]
            .checked_sub(1)
            .zip(row[2].checked_sub(1))
            .and_then(|(interaction, item)| {
                Some(Subtask {
                    interaction: Interaction::ALL.get(interaction).copied()?,
                    item: Item::ALL.get(item).copied()?,
                })
            });
        subtask.map_or(0, Subtask::index)
    }
}
