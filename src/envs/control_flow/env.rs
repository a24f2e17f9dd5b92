//! Single-step control-flow environment
use super::interpreter::{Interpreter, Next, Program};
use super::lines::{Line, LineKind};
use super::render::ProgramView;
use super::stats::{EpisodeOutcome, ProgramStats};
use super::synth::{condition_size_program, ProgramSynthesizer};
use crate::envs::{BuildEnv, BuildEnvError, EnvStructure, Environment, Successor};
use crate::logging::StatsLogger;
use crate::spaces::{BooleanSpace, FeatureSpace, IndexSpace, Space};
use crate::Prng;
use ndarray::Array1;
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A line of a control-flow program: subtasks are identified by index, conditions by a shared bit.
pub type ControlFlowLine = Line<usize, ()>;

/// Configuration of a [`ControlFlowEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlFlowConfig {
    /// Minimum number of program lines in training.
    pub min_lines: usize,
    /// Maximum number of program lines in training.
    pub max_lines: usize,
    /// Number of distinct subtasks. An action equal to this value is a no-op.
    pub num_subtasks: usize,
    /// Probability of flipping the condition bit after each executed subtask.
    pub flip_prob: f64,
    /// End the episode as soon as a wrong subtask is chosen.
    pub terminate_on_failure: bool,
    /// Maximum number of simultaneously open blocks.
    pub max_nesting_depth: Option<usize>,
    /// In evaluation, measure how far a condition can be carried (see [`condition_size_program`]).
    pub eval_condition_size: bool,
    /// Fail the episode after this many no-ops (training only).
    pub no_op_limit: Option<u64>,
    /// Program length in evaluation.
    pub eval_lines: Option<usize>,
    /// Maximum episode length in training.
    pub time_limit: u64,
    /// Maximum episode length in evaluation.
    pub eval_time_limit: Option<u64>,
    pub evaluating: bool,
    /// Encode lines one-hot and act without a selection cursor.
    pub baseline: bool,
    /// Enable `Loop` blocks repeating `1..=max_loops` times.
    pub max_loops: Option<u32>,
    pub discount_factor: f64,
}

impl Default for ControlFlowConfig {
    fn default() -> Self {
        Self {
            min_lines: 1,
            max_lines: 6,
            num_subtasks: 12,
            flip_prob: 0.5,
            terminate_on_failure: false,
            max_nesting_depth: None,
            eval_condition_size: false,
            no_op_limit: None,
            eval_lines: None,
            time_limit: 100,
            eval_time_limit: None,
            evaluating: false,
            baseline: false,
            max_loops: None,
            discount_factor: 0.99,
        }
    }
}

impl ControlFlowConfig {
    fn validate(&self) -> Result<(), BuildEnvError> {
        if self.min_lines < 1 || self.min_lines > self.max_lines {
            return Err(BuildEnvError::LineRange {
                min: self.min_lines,
                max: self.max_lines,
            });
        }
        if self.num_subtasks < 1 {
            return Err(BuildEnvError::TooSmall {
                name: "num_subtasks",
                min: 1,
                value: self.num_subtasks,
            });
        }
        if !(0.0..=1.0).contains(&self.flip_prob) {
            return Err(BuildEnvError::InvalidProbability {
                name: "flip_prob",
                value: self.flip_prob,
            });
        }
        if let Some(max_loops) = self.max_loops {
            if max_loops < 1 {
                return Err(BuildEnvError::TooSmall {
                    name: "max_loops",
                    min: 1,
                    value: max_loops as usize,
                });
            }
        }
        if self.evaluating {
            let eval_lines = self.eval_lines.ok_or(BuildEnvError::MissingEvalLines)?;
            if eval_lines < 1 {
                return Err(BuildEnvError::TooSmall {
                    name: "eval_lines",
                    min: 1,
                    value: eval_lines,
                });
            }
            if self.eval_condition_size && (self.max_lines < 2 || eval_lines <= self.max_lines) {
                return Err(BuildEnvError::ConditionSizeRange {
                    eval: eval_lines,
                    max: self.max_lines,
                });
            }
        }
        Ok(())
    }
}

impl BuildEnv for ControlFlowConfig {
    type Environment = ControlFlowEnv;

    fn build_env(&self, _: &mut Prng) -> Result<Self::Environment, BuildEnvError> {
        self.validate()?;
        let n_lines = match (self.evaluating, self.eval_lines) {
            (true, Some(eval_lines)) => eval_lines + 1,
            _ => self.max_lines + 1,
        };
        Ok(ControlFlowEnv {
            config: self.clone(),
            n_lines,
            synthesizer: ProgramSynthesizer::new(self.max_nesting_depth, self.max_loops.is_some()),
        })
    }
}

/// An agent must execute a program one subtask at a time.
///
/// Each step the agent names the subtask of the active line (or does nothing).
/// Control flow is resolved by a hidden condition bit that is observed by the agent and may
/// flip after every executed subtask. The episode succeeds with reward 1 when the program
/// ends without any wrong choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFlowEnv {
    config: ControlFlowConfig,
    n_lines: usize,
    synthesizer: ProgramSynthesizer,
}

impl ControlFlowEnv {
    pub const fn config(&self) -> &ControlFlowConfig {
        &self.config
    }

    /// Width of the observed program, including at least one padding line.
    pub const fn n_lines(&self) -> usize {
        self.n_lines
    }

    /// Number of subtasks. Also the no-op action choice.
    pub const fn num_subtasks(&self) -> usize {
        self.config.num_subtasks
    }

    /// Number of distinct line codes in the observation.
    pub const fn num_codes(&self) -> usize {
        self.config.num_subtasks + LineKind::ALL.len()
    }

    /// Encode a line (or padding if `None`) as a single code.
    pub fn encode_line(&self, line: Option<&ControlFlowLine>) -> usize {
        match line {
            Some(Line::Subtask(id)) => *id,
            Some(line) => self.config.num_subtasks + line.kind().index(),
            None => self.config.num_subtasks + LineKind::Padding.index(),
        }
    }

    fn sample_program(&self, rng: &mut Prng) -> Program<usize, ()> {
        let kinds = match (self.config.evaluating, self.config.eval_lines) {
            (true, Some(eval_lines)) if self.config.eval_condition_size => {
                let length = rng.gen_range(self.config.max_lines..eval_lines);
                condition_size_program(length, rng)
            }
            (true, Some(eval_lines)) => self.synthesizer.synthesize(eval_lines, rng),
            _ => {
                let length = rng.gen_range(self.config.min_lines..=self.config.max_lines);
                self.synthesizer.synthesize(length, rng)
            }
        };
        let num_subtasks = self.config.num_subtasks;
        let max_loops = self.config.max_loops.unwrap_or(1);
        let lines = kinds
            .into_iter()
            .map(|kind| {
                Line::from_kind(
                    kind,
                    &mut *rng,
                    |rng| rng.gen_range(0..num_subtasks),
                    |_| (),
                    |rng| rng.gen_range(1..=max_loops),
                )
            })
            .collect();
        Program::new(lines).unwrap_or_else(|err| panic!("synthesized invalid program: {}", err))
    }

    /// Time limit of the current mode, if any.
    const fn time_limit(&self) -> Option<u64> {
        if self.config.evaluating {
            self.config.eval_time_limit
        } else {
            Some(self.config.time_limit)
        }
    }

    /// Render the program and episode status as text.
    pub fn render(&self, state: &ControlFlowState) -> String {
        let view = ProgramView {
            lines: state.interpreter.program().lines(),
            active: Some(state.active),
            selected: (!self.config.baseline).then(|| state.selected),
        };
        format!(
            "{}Condition: {}\nFailing: {}\n",
            view, state.condition, state.failing
        )
    }
}

/// Episode state of a [`ControlFlowEnv`].
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFlowState {
    interpreter: Interpreter<usize, ()>,
    condition: bool,
    /// Index of the active subtask line.
    active: usize,
    /// Index of the previously active subtask line.
    prev: Option<usize>,
    /// Index of the line at which the episode first failed.
    failed_line: Option<usize>,
    /// Line selected by the agent's cursor.
    selected: usize,
    steps: u64,
    no_ops: u64,
    failing: bool,
}

impl ControlFlowState {
    fn outcome(&self, success: bool) -> EpisodeOutcome {
        if success {
            EpisodeOutcome {
                success,
                steps: self.steps,
                success_line: self.interpreter.program().len(),
                failure_line: None,
            }
        } else {
            EpisodeOutcome {
                success,
                steps: self.steps,
                success_line: self.prev.unwrap_or(0),
                failure_line: Some(self.failed_line.unwrap_or(self.active)),
            }
        }
    }

    fn fail(&mut self) {
        self.failing = true;
        self.failed_line.get_or_insert(self.active);
    }

    pub fn lines(&self) -> &[ControlFlowLine] {
        self.interpreter.program().lines()
    }

    pub const fn active(&self) -> usize {
        self.active
    }

    pub const fn condition(&self) -> bool {
        self.condition
    }

    pub const fn failing(&self) -> bool {
        self.failing
    }
}

/// Action of a [`ControlFlowEnv`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlFlowAction {
    /// Choose a subtask (or the no-op, equal to the number of subtasks).
    Subtask(usize),
    /// Choose a subtask and move the selection cursor by `delta` modulo the program width.
    SubtaskAndMove { subtask: usize, delta: usize },
}

impl ControlFlowAction {
    pub const fn choice(&self) -> usize {
        match self {
            Self::Subtask(subtask) | Self::SubtaskAndMove { subtask, .. } => *subtask,
        }
    }

    pub const fn delta(&self) -> Option<usize> {
        match self {
            Self::Subtask(_) => None,
            Self::SubtaskAndMove { delta, .. } => Some(*delta),
        }
    }
}

/// Encoded program lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncodedLines {
    /// One code per line.
    Codes(Vec<usize>),
    /// Flattened one-hot encoding of the codes.
    OneHot(Array1<f32>),
}

/// Observation of a [`ControlFlowEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFlowObs {
    /// Index of the active line.
    pub active: usize,
    pub lines: EncodedLines,
    pub condition: bool,
}

/// Observation space of a [`ControlFlowEnv`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlFlowObsSpace {
    pub n_lines: usize,
    pub num_codes: usize,
    pub one_hot: bool,
    pub condition: BooleanSpace,
}

impl ControlFlowObsSpace {
    /// Space of the active line index, including the past-the-end index `n_lines`.
    pub const fn active(&self) -> IndexSpace {
        IndexSpace::new(self.n_lines + 1)
    }
}

impl Space for ControlFlowObsSpace {
    type Element = ControlFlowObs;

    fn contains(&self, value: &Self::Element) -> bool {
        self.active().contains(&value.active)
            && self.condition.contains(&value.condition)
            && match (&value.lines, self.one_hot) {
                (EncodedLines::Codes(codes), false) => {
                    codes.len() == self.n_lines && codes.iter().all(|&c| c < self.num_codes)
                }
                (EncodedLines::OneHot(features), true) => {
                    features.len() == self.n_lines * self.num_codes
                        && features
                            .as_slice()
                            .map_or(false, |f| {
                                f.chunks(self.num_codes)
                                    .all(|row| row.iter().filter(|&&x| x == 1.0).count() == 1)
                            })
                        && features.iter().all(|&x| x == 0.0 || x == 1.0)
                }
                _ => false,
            }
    }
}

/// Action space of a [`ControlFlowEnv`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlFlowActionSpace {
    /// Number of subtask choices, including the no-op.
    pub num_choices: usize,
    /// Number of cursor moves, if the action includes one.
    pub num_deltas: Option<usize>,
}

impl Space for ControlFlowActionSpace {
    type Element = ControlFlowAction;

    fn contains(&self, value: &Self::Element) -> bool {
        match (value, self.num_deltas) {
            (ControlFlowAction::Subtask(subtask), None) => *subtask < self.num_choices,
            (ControlFlowAction::SubtaskAndMove { subtask, delta }, Some(num_deltas)) => {
                *subtask < self.num_choices && *delta < num_deltas
            }
            _ => false,
        }
    }
}

impl Distribution<ControlFlowAction> for ControlFlowActionSpace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ControlFlowAction {
        let subtask = rng.gen_range(0..self.num_choices);
        match self.num_deltas {
            None => ControlFlowAction::Subtask(subtask),
            Some(num_deltas) => ControlFlowAction::SubtaskAndMove {
                subtask,
                delta: rng.gen_range(0..num_deltas),
            },
        }
    }
}

impl fmt::Display for ControlFlowActionSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.num_deltas {
            None => write!(f, "ControlFlowActionSpace({})", self.num_choices),
            Some(num_deltas) => {
                write!(f, "ControlFlowActionSpace({}, {})", self.num_choices, num_deltas)
            }
        }
    }
}

impl EnvStructure for ControlFlowEnv {
    type ObservationSpace = ControlFlowObsSpace;
    type ActionSpace = ControlFlowActionSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        ControlFlowObsSpace {
            n_lines: self.n_lines,
            num_codes: self.num_codes(),
            one_hot: self.config.baseline,
            condition: BooleanSpace::new(),
        }
    }

    fn action_space(&self) -> Self::ActionSpace {
        ControlFlowActionSpace {
            num_choices: self.config.num_subtasks + 1,
            num_deltas: (!self.config.baseline).then(|| 2 * self.n_lines),
        }
    }

    fn reward_range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn discount_factor(&self) -> f64 {
        self.config.discount_factor
    }
}

impl Environment for ControlFlowEnv {
    type State = ControlFlowState;
    type Observation = ControlFlowObs;
    type Action = ControlFlowAction;

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        loop {
            let condition = if self.config.evaluating && self.config.eval_condition_size {
                false
            } else {
                rng.gen()
            };
            let mut interpreter = Interpreter::new(self.sample_program(rng));
            if let Next::Subtask(active) = interpreter.resume(condition) {
                return ControlFlowState {
                    interpreter,
                    condition,
                    active,
                    prev: None,
                    failed_line: None,
                    selected: 0,
                    steps: 0,
                    no_ops: 0,
                    failing: false,
                };
            }
        }
    }

    fn observe(&self, state: &Self::State, _: &mut Prng) -> Self::Observation {
        let program_lines = state.interpreter.program().lines();
        let codes = (0..self.n_lines).map(|i| self.encode_line(program_lines.get(i)));
        let lines = if self.config.baseline {
            let code_space = IndexSpace::new(self.num_codes());
            let mut features = Array1::zeros(self.n_lines * code_space.num_features());
            let rows = features
                .as_slice_mut()
                .expect("freshly allocated array is contiguous")
                .chunks_exact_mut(code_space.num_features());
            for (row, code) in rows.zip(codes) {
                code_space.features_out(&code, row);
            }
            EncodedLines::OneHot(features)
        } else {
            EncodedLines::Codes(codes.collect())
        };
        ControlFlowObs {
            active: state.active,
            lines,
            condition: state.condition,
        }
    }

    fn step(
        &self,
        mut state: Self::State,
        action: &Self::Action,
        rng: &mut Prng,
        logger: &mut dyn StatsLogger,
    ) -> (Successor<Self::State>, f64) {
        if state.steps == 0 {
            ProgramStats::from_kinds(state.interpreter.program().kinds()).log(logger);
        }
        state.steps += 1;
        if let Some(delta) = action.delta() {
            state.selected = (state.selected + delta) % self.n_lines;
        }

        let choice = action.choice();
        if choice == self.config.num_subtasks {
            state.no_ops += 1;
            let limit_reached = self
                .config
                .no_op_limit
                .map_or(false, |limit| state.no_ops >= limit);
            if limit_reached && !self.config.evaluating {
                state.fail();
            }
        } else {
            let expected = state.interpreter.program().lines()[state.active].subtask();
            if expected != Some(&choice) {
                state.fail();
            }
            if rng.gen_bool(self.config.flip_prob) {
                state.condition = !state.condition;
            }
            state.prev = Some(state.active);
            match state.interpreter.resume(state.condition) {
                Next::Subtask(active) => state.active = active,
                Next::Done => {
                    let success = !state.failing;
                    state.outcome(success).log(logger);
                    return (Successor::Terminate, if success { 1.0 } else { 0.0 });
                }
            }
        }

        if state.failing && self.config.terminate_on_failure {
            state.outcome(false).log(logger);
            return (Successor::Terminate, 0.0);
        }
        if self.time_limit().map_or(false, |limit| state.steps >= limit) {
            state.outcome(false).log(logger);
            return (Successor::Interrupt(state), 0.0);
        }
        (Successor::Continue(state), 0.0)
    }
}
