//! Control-flow program environments
//!
//! An agent is shown a program built from subtasks and the control-flow blocks
//! `If` / `Else`, `While` and `Loop`, and must execute it one subtask at a time.
//! Which lines run depends on conditions that the agent observes as execution proceeds.
//!
//! The building blocks are usable on their own:
//! * [`ProgramSynthesizer`] samples random well-nested programs,
//! * [`TransitionTable`] compiles the branch targets of each line,
//! * [`Interpreter`] executes a [`Program`] up to each subtask in turn.
mod env;
pub mod gridworld;
mod interpreter;
mod lines;
mod render;
mod stats;
mod synth;
#[cfg(test)]
pub mod testing;
mod transitions;

pub use env::{
    ControlFlowAction, ControlFlowActionSpace, ControlFlowConfig, ControlFlowEnv, ControlFlowLine,
    ControlFlowObs, ControlFlowObsSpace, ControlFlowState, EncodedLines,
};
pub use gridworld::{GridworldConfig, GridworldEnv, GridworldObs, GridworldState};
pub use interpreter::{Interpreter, Next, Program};
pub use lines::{Label, Line, LineKind};
pub use render::ProgramView;
pub use stats::{EpisodeOutcome, ProgramStats};
pub use synth::{condition_size_program, ProgramSynthesizer};
pub use transitions::{ProgramError, Transition, TransitionTable};
