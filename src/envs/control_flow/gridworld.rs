//! Multi-step control-flow environment in a gridworld
//!
//! Subtasks are interactions with items scattered over a grid. Executing a subtask takes
//! several steps: the agent walks to the nearest matching item and then interacts with it.
//! Conditions test whether an item is present anywhere in the world.
use super::interpreter::{Interpreter, Next, Program};
use super::lines::{Label, Line, LineKind};
use super::render::ProgramView;
use super::stats::{EpisodeOutcome, ProgramStats};
use super::synth::ProgramSynthesizer;
use crate::envs::{BuildEnv, BuildEnvError, EnvStructure, Environment, Successor};
use crate::logging::StatsLogger;
use crate::spaces::{IndexSpace, Space};
use crate::Prng;
use enum_map::{Enum, EnumMap};
use ndarray::{Array2, Array3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An item in the world.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize,
)]
pub enum Item {
    Wood,
    Gold,
    Iron,
    Merchant,
}

impl Item {
    pub const ALL: [Self; 4] = [Self::Wood, Self::Gold, Self::Iron, Self::Merchant];
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Wood => "wood",
            Self::Gold => "gold",
            Self::Iron => "iron",
            Self::Merchant => "merchant",
        })
    }
}

impl Label for Item {
    fn fmt_label(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, " {}", self)
    }
}

/// A way of interacting with an item.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize,
)]
pub enum Interaction {
    /// Remove the item.
    Mine,
    /// Remove the item, leaving a bridge.
    Sell,
    /// Stand on the item.
    Goto,
}

impl Interaction {
    pub const ALL: [Self; 3] = [Self::Mine, Self::Sell, Self::Goto];
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Mine => "mine",
            Self::Sell => "sell",
            Self::Goto => "goto",
        })
    }
}

/// A gridworld subtask: interact with the nearest item of a kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Subtask {
    pub interaction: Interaction,
    pub item: Item,
}

impl Subtask {
    /// Number of distinct subtasks.
    pub const COUNT: usize = Item::ALL.len() * Interaction::ALL.len();

    /// Index in the subtask catalog, ordered by item then interaction.
    pub fn index(self) -> usize {
        self.item.into_usize() * Interaction::ALL.len() + self.interaction.into_usize()
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= Self::COUNT {
            return None;
        }
        Some(Self {
            interaction: Interaction::ALL[index % Interaction::ALL.len()],
            item: Item::ALL[index / Interaction::ALL.len()],
        })
    }
}

impl Label for Subtask {
    fn fmt_label(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, " {} {}", self.interaction, self.item)
    }
}

/// A non-agent object occupying a cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Item(Item),
    Bridge,
}

impl Tile {
    /// Observation channel of this tile.
    fn channel(self) -> usize {
        match self {
            Self::Item(item) => item.into_usize(),
            Self::Bridge => Item::ALL.len(),
        }
    }
}

/// Observation channel of the agent.
const AGENT_CHANNEL: usize = Item::ALL.len() + 1;
const NUM_CHANNELS: usize = AGENT_CHANNEL + 1;
/// Width of an encoded line: kind, interaction, item, loop count.
const LINE_WIDTH: usize = 4;

/// Grid cell as `[row, column]`.
pub type Pos = [usize; 2];

fn chebyshev(a: Pos, b: Pos) -> usize {
    a[0].abs_diff(b[0]).max(a[1].abs_diff(b[1]))
}

fn manhattan(a: Pos, b: Pos) -> usize {
    a[0].abs_diff(b[0]) + a[1].abs_diff(b[1])
}

fn step_toward(from: usize, to: usize) -> usize {
    match from.cmp(&to) {
        std::cmp::Ordering::Less => from + 1,
        std::cmp::Ordering::Equal => from,
        std::cmp::Ordering::Greater => from - 1,
    }
}

pub type GridworldLine = Line<Subtask, Item>;

/// Configuration of a [`GridworldEnv`].
///
/// Blocks are never nested so that every `While` body consists of subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridworldConfig {
    pub min_lines: usize,
    pub max_lines: usize,
    /// Program length in evaluation.
    pub eval_lines: Option<usize>,
    pub evaluating: bool,
    /// Side length of the square world.
    pub world_size: usize,
    /// Maximum number of extra items scattered for each `While` condition (training only).
    pub max_while_objects: usize,
    /// Number of item kinds (drawn with replacement) that subtasks never use.
    pub num_excluded_objects: usize,
    /// Move one cell per step instead of jumping onto the target item.
    pub temporal_extension: bool,
    /// Slack added to the time budget at the start of a training episode.
    pub time_to_waste: u64,
    /// Enable `Loop` blocks repeating `1..=max_loops` times.
    pub max_loops: Option<u32>,
    pub discount_factor: f64,
}

impl Default for GridworldConfig {
    fn default() -> Self {
        Self {
            min_lines: 1,
            max_lines: 6,
            eval_lines: None,
            evaluating: false,
            world_size: 6,
            max_while_objects: 2,
            num_excluded_objects: 0,
            temporal_extension: true,
            time_to_waste: 5,
            max_loops: None,
            discount_factor: 0.99,
        }
    }
}

/// Initial time budget in evaluation.
const EVAL_TIME_BUDGET: u64 = 200;

impl GridworldConfig {
    fn validate(&self) -> Result<(), BuildEnvError> {
        if self.min_lines < 1 || self.min_lines > self.max_lines {
            return Err(BuildEnvError::LineRange {
                min: self.min_lines,
                max: self.max_lines,
            });
        }
        if self.world_size < 1 {
            return Err(BuildEnvError::TooSmall {
                name: "world_size",
                min: 1,
                value: self.world_size,
            });
        }
        if self.num_excluded_objects >= Item::ALL.len() {
            return Err(BuildEnvError::TooSmall {
                name: "number of usable items",
                min: 1,
                value: Item::ALL.len().saturating_sub(self.num_excluded_objects),
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
        }
        Ok(())
    }
}

impl BuildEnv for GridworldConfig {
    type Environment = GridworldEnv;

    fn build_env(&self, _: &mut Prng) -> Result<Self::Environment, BuildEnvError> {
        self.validate()?;
        let n_lines = match (self.evaluating, self.eval_lines) {
            (true, Some(eval_lines)) => eval_lines + 1,
            _ => self.max_lines + 1,
        };
        Ok(GridworldEnv {
            config: self.clone(),
            n_lines,
            synthesizer: ProgramSynthesizer::new(Some(1), self.max_loops.is_some()),
        })
    }
}

/// Multi-step control-flow environment.
///
/// Each step the agent names a subtask. If it stands on a matching item it interacts with it,
/// otherwise it moves toward the nearest one. Mining or selling the wrong item fails the
/// episode. The agent must keep up with a time budget that grows with the distance to each
/// newly active subtask.
#[derive(Debug, Clone, PartialEq)]
pub struct GridworldEnv {
    config: GridworldConfig,
    n_lines: usize,
    synthesizer: ProgramSynthesizer,
}

/// Episode state of a [`GridworldEnv`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridworldState {
    interpreter: Interpreter<Subtask, Item>,
    objects: Vec<(Tile, Pos)>,
    agent: Pos,
    /// Index of the active subtask line.
    active: usize,
    prev: Option<usize>,
    time_remaining: u64,
    steps: u64,
    failed: bool,
}

impl GridworldState {
    pub fn lines(&self) -> &[GridworldLine] {
        self.interpreter.program().lines()
    }

    pub const fn active(&self) -> usize {
        self.active
    }

    pub const fn agent(&self) -> Pos {
        self.agent
    }

    pub fn objects(&self) -> &[(Tile, Pos)] {
        &self.objects
    }

    pub const fn time_remaining(&self) -> u64 {
        self.time_remaining
    }

    /// Position of the item of the given kind closest to the agent by Manhattan distance.
    fn nearest(&self, item: Item) -> Option<Pos> {
        self.objects
            .iter()
            .filter(|(tile, _)| *tile == Tile::Item(item))
            .map(|&(_, pos)| pos)
            .min_by_key(|&pos| manhattan(self.agent, pos))
    }

    /// Time needed to reach and interact with the active subtask's item.
    fn activation_cost(&self) -> u64 {
        let item = self.lines()[self.active].subtask().map(|s| s.item);
        1 + item
            .and_then(|item| self.nearest(item))
            .map_or(0, |pos| chebyshev(self.agent, pos) as u64)
    }

    /// Move past the active subtask. Returns `false` if the program has ended.
    fn advance(&mut self) -> bool {
        self.prev = Some(self.active);
        let objects = &self.objects;
        let next = self
            .interpreter
            .resume_with(|line| condition_holds(line, objects));
        match next {
            Next::Subtask(active) => {
                self.active = active;
                self.time_remaining += self.activation_cost();
                true
            }
            Next::Done => false,
        }
    }

    fn outcome(&self, success: bool) -> EpisodeOutcome {
        EpisodeOutcome {
            success,
            steps: self.steps,
            success_line: if success {
                self.interpreter.program().len()
            } else {
                self.prev.unwrap_or(0)
            },
            failure_line: (!success).then(|| self.active),
        }
    }
}

fn condition_holds(line: &GridworldLine, objects: &[(Tile, Pos)]) -> bool {
    match line.condition() {
        Some(&item) => objects.iter().any(|(tile, _)| *tile == Tile::Item(item)),
        None => true,
    }
}

/// Observation of a [`GridworldEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridworldObs {
    /// Index of the active line.
    pub active: usize,
    /// One row per line: `[kind, interaction + 1, item + 1, loop_count]`, zero where absent.
    pub lines: Array2<usize>,
    /// Occupancy of each `(channel, row, column)`.
    /// Channels are the items, then bridges, then the agent.
    pub world: Array3<f32>,
}

/// Observation space of a [`GridworldEnv`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridworldObsSpace {
    pub n_lines: usize,
    pub world_size: usize,
    pub max_loops: u32,
}

impl Space for GridworldObsSpace {
    type Element = GridworldObs;

    fn contains(&self, value: &Self::Element) -> bool {
        let bounds = [
            LineKind::ALL.len(),
            Interaction::ALL.len() + 1,
            Item::ALL.len() + 1,
            self.max_loops as usize + 1,
        ];
        // The active index may be one past the last line once the program is done.
        IndexSpace::new(self.n_lines + 1).contains(&value.active)
            && value.lines.dim() == (self.n_lines, LINE_WIDTH)
            && value
                .lines
                .rows()
                .into_iter()
                .all(|row| row.iter().zip(bounds).all(|(&x, bound)| x < bound))
            && value.world.dim() == (NUM_CHANNELS, self.world_size, self.world_size)
            && value.world.iter().all(|&x| x == 0.0 || x == 1.0)
    }
}

impl GridworldEnv {
    pub const fn config(&self) -> &GridworldConfig {
        &self.config
    }

    /// Width of the observed program, including at least one padding line.
    pub const fn n_lines(&self) -> usize {
        self.n_lines
    }

    fn random_pos(&self, rng: &mut Prng) -> Pos {
        [
            rng.gen_range(0..self.config.world_size),
            rng.gen_range(0..self.config.world_size),
        ]
    }

    fn sample_lines(&self, rng: &mut Prng) -> Vec<GridworldLine> {
        let length = match (self.config.evaluating, self.config.eval_lines) {
            (true, Some(eval_lines)) => eval_lines,
            _ => rng.gen_range(self.config.min_lines..=self.config.max_lines),
        };
        let kinds = self.synthesizer.synthesize(length, rng);

        let mut excluded = EnumMap::<Item, bool>::default();
        for _ in 0..self.config.num_excluded_objects {
            excluded[Item::ALL[rng.gen_range(0..Item::ALL.len())]] = true;
        }
        let included: Vec<Item> = Item::ALL.into_iter().filter(|&i| !excluded[i]).collect();
        let max_loops = self.config.max_loops.unwrap_or(1);

        kinds
            .into_iter()
            .map(|kind| {
                Line::from_kind(
                    kind,
                    &mut *rng,
                    |rng| Subtask {
                        interaction: Interaction::ALL[rng.gen_range(0..Interaction::ALL.len())],
                        item: included[rng.gen_range(0..included.len())],
                    },
                    |rng| Item::ALL[rng.gen_range(0..Item::ALL.len())],
                    |rng| rng.gen_range(1..=max_loops),
                )
            })
            .collect()
    }

    /// Scatter the items needed by a program.
    ///
    /// One subtask of each `While` body is first rewritten to consume the condition item.
    /// Every subtask then gets one item per execution of its enclosing loop.
    fn populate_world(&self, lines: &mut [GridworldLine], rng: &mut Prng) -> Vec<(Tile, Pos)> {
        let mut objects = Vec::new();

        let mut while_bodies: Vec<(Item, Vec<usize>)> = Vec::new();
        let mut in_while = false;
        for (i, line) in lines.iter().enumerate() {
            match line {
                Line::While(item) => {
                    while_bodies.push((*item, Vec::new()));
                    in_while = true;
                }
                Line::EndWhile => in_while = false,
                Line::Subtask(_) if in_while => {
                    if let Some((_, body)) = while_bodies.last_mut() {
                        body.push(i);
                    }
                }
                _ => {}
            }
        }
        for (item, body) in while_bodies {
            if body.is_empty() {
                continue;
            }
            let target = body[rng.gen_range(0..body.len())];
            let interaction = if rng.gen() {
                Interaction::Mine
            } else {
                Interaction::Sell
            };
            lines[target] = Line::Subtask(Subtask { interaction, item });
            if !self.config.evaluating {
                for _ in 0..rng.gen_range(0..=self.config.max_while_objects) {
                    objects.push((Tile::Item(item), self.random_pos(rng)));
                }
            }
        }

        let mut loop_count = 0;
        for line in lines.iter() {
            match line {
                Line::Loop(count) => loop_count = *count,
                Line::EndLoop => loop_count = 0,
                Line::Subtask(subtask) => {
                    for _ in 0..=loop_count {
                        objects.push((Tile::Item(subtask.item), self.random_pos(rng)));
                    }
                }
                _ => {}
            }
        }
        objects
    }

    fn encode_line(line: Option<&GridworldLine>) -> [usize; LINE_WIDTH] {
        let kind = line.map_or(LineKind::Padding, Line::kind).index();
        match line {
            Some(Line::Subtask(subtask)) => [
                kind,
                subtask.interaction.into_usize() + 1,
                subtask.item.into_usize() + 1,
                0,
            ],
            Some(Line::If(item) | Line::While(item)) => [kind, 0, item.into_usize() + 1, 0],
            Some(Line::Loop(count)) => [kind, 0, 0, *count as usize],
            _ => [kind, 0, 0, 0],
        }
    }

    /// Render the world, the program and the time budget as text.
    pub fn render(&self, state: &GridworldState) -> String {
        let size = self.config.world_size;
        let mut grid = vec![vec![' '; size]; size];
        for &(tile, [row, col]) in &state.objects {
            grid[row][col] = match tile {
                Tile::Item(Item::Wood) => 'w',
                Tile::Item(Item::Gold) => 'g',
                Tile::Item(Item::Iron) => 'i',
                Tile::Item(Item::Merchant) => 'm',
                Tile::Bridge => 'b',
            };
        }
        grid[state.agent[0]][state.agent[1]] = 'A';
        let mut text = String::new();
        for row in grid {
            text.extend(row.into_iter().flat_map(|c| [c, '|']));
            text.push('\n');
        }
        let view = ProgramView {
            lines: state.lines(),
            active: Some(state.active),
            selected: None,
        };
        text.push_str(&format!(
            "{}Time remaining: {}\n",
            view, state.time_remaining
        ));
        text
    }
}

impl EnvStructure for GridworldEnv {
    type ObservationSpace = GridworldObsSpace;
    type ActionSpace = IndexSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        GridworldObsSpace {
            n_lines: self.n_lines,
            world_size: self.config.world_size,
            max_loops: self.config.max_loops.unwrap_or(0),
        }
    }

    fn action_space(&self) -> Self::ActionSpace {
        IndexSpace::new(Subtask::COUNT)
    }

    fn reward_range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn discount_factor(&self) -> f64 {
        self.config.discount_factor
    }
}

impl Environment for GridworldEnv {
    type State = GridworldState;
    type Observation = GridworldObs;
    type Action = usize;

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        loop {
            let agent = self.random_pos(rng);
            let mut lines = self.sample_lines(rng);
            let objects = self.populate_world(&mut lines, rng);
            let program = Program::new(lines)
                .unwrap_or_else(|err| panic!("synthesized invalid program: {}", err));
            let mut interpreter = Interpreter::new(program);
            let first = interpreter.resume_with(|line| condition_holds(line, &objects));
            if let Next::Subtask(active) = first {
                let mut state = GridworldState {
                    interpreter,
                    objects,
                    agent,
                    active,
                    prev: None,
                    time_remaining: if self.config.evaluating {
                        EVAL_TIME_BUDGET
                    } else {
                        self.config.time_to_waste
                    },
                    steps: 0,
                    failed: false,
                };
                state.time_remaining += state.activation_cost();
                return state;
            }
        }
    }

    fn observe(&self, state: &Self::State, _: &mut Prng) -> Self::Observation {
        let program_lines = state.lines();
        let mut lines = Array2::zeros((self.n_lines, LINE_WIDTH));
        for (i, mut row) in lines.rows_mut().into_iter().enumerate() {
            for (x, code) in row.iter_mut().zip(Self::encode_line(program_lines.get(i))) {
                *x = code;
            }
        }

        let size = self.config.world_size;
        let mut world = Array3::zeros((NUM_CHANNELS, size, size));
        for &(tile, [row, col]) in &state.objects {
            world[[tile.channel(), row, col]] = 1.0;
        }
        world[[AGENT_CHANNEL, state.agent[0], state.agent[1]]] = 1.0;

        GridworldObs {
            active: state.active,
            lines,
            world,
        }
    }

    fn step(
        &self,
        mut state: Self::State,
        action: &Self::Action,
        _: &mut Prng,
        logger: &mut dyn StatsLogger,
    ) -> (Successor<Self::State>, f64) {
        if state.steps == 0 {
            ProgramStats::from_kinds(state.interpreter.program().kinds()).log(logger);
        }
        state.steps += 1;
        state.time_remaining = state.time_remaining.saturating_sub(1);

        let mut running = true;
        if let Some(chosen) = Subtask::from_index(*action) {
            let correct = state.lines()[state.active].subtask() == Some(&chosen);
            let here = state
                .objects
                .iter()
                .position(|&(tile, pos)| tile == Tile::Item(chosen.item) && pos == state.agent);
            if let Some(index) = here {
                if chosen.interaction != Interaction::Goto {
                    state.objects.remove(index);
                    if !correct {
                        state.failed = true;
                    }
                }
                if chosen.interaction == Interaction::Sell {
                    state.objects.push((Tile::Bridge, state.agent));
                }
                if correct {
                    running = state.advance();
                }
            } else if let Some(target) = state.nearest(chosen.item) {
                state.agent = if self.config.temporal_extension {
                    [
                        step_toward(state.agent[0], target[0]),
                        step_toward(state.agent[1], target[1]),
                    ]
                } else {
                    target
                };
            } else if correct {
                // No such item is left so the subtask is impossible and the program ends.
                state.prev = Some(state.active);
                running = false;
            }
        }

        if state.failed {
            state.outcome(false).log(logger);
            return (Successor::Terminate, 0.0);
        }
        if !running {
            state.outcome(true).log(logger);
            return (Successor::Terminate, 1.0);
        }
        if state.time_remaining == 0 {
            state.outcome(false).log(logger);
            return (Successor::Interrupt(state), 0.0);
        }
        (Successor::Continue(state), 0.0)
    }
}
