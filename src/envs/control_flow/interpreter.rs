//! Step-wise program interpretation
use super::lines::{Line, LineKind};
use super::transitions::{ProgramError, TransitionTable};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// A well-nested program together with its transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program<S, C> {
    lines: Vec<Line<S, C>>,
    transitions: TransitionTable,
}

impl<S, C> Program<S, C> {
    /// Validate the block structure of `lines` and compile its transition table.
    pub fn new(lines: Vec<Line<S, C>>) -> Result<Self, ProgramError> {
        let transitions = TransitionTable::compile(lines.iter().map(Line::kind))?;
        Ok(Self { lines, transitions })
    }

    pub fn lines(&self) -> &[Line<S, C>] {
        &self.lines
    }

    pub const fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = LineKind> + '_ {
        self.lines.iter().map(Line::kind)
    }
}

/// The result of resuming an [`Interpreter`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Next {
    /// Execution is paused at the subtask line with this index.
    Subtask(usize),
    /// Execution reached the end of the program.
    Done,
}

impl Next {
    /// The subtask line index, if any.
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Subtask(index) => Some(index),
            Self::Done => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Position {
    Start,
    At(usize),
    Done,
}

/// Executes a program one subtask at a time.
///
/// Each call to [`Interpreter::resume`] moves past the current subtask (if any) and runs the
/// control-flow lines up to the next `Subtask` line, evaluating every `If` and `While` visited
/// on the way. `Else` takes the opposite of its `If` evaluation and `Loop` lines count down
/// their remaining iterations.
///
/// The caller is responsible for conditions that eventually let every `While` body reach a
/// subtask; a block that loops without one never yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter<S, C> {
    program: Program<S, C>,
    position: Position,
    /// Evaluations of the enclosing `If` lines; innermost last.
    if_evaluations: SmallVec<[bool; 8]>,
    /// Remaining iterations of each active `Loop`, by line index.
    loop_remaining: BTreeMap<usize, u32>,
}

impl<S, C> Interpreter<S, C> {
    pub fn new(program: Program<S, C>) -> Self {
        Self {
            program,
            position: Position::Start,
            if_evaluations: SmallVec::new(),
            loop_remaining: BTreeMap::new(),
        }
    }

    pub const fn program(&self) -> &Program<S, C> {
        &self.program
    }

    /// Index of the subtask line at which execution is paused.
    pub const fn current(&self) -> Option<usize> {
        match self.position {
            Position::At(index) => Some(index),
            Position::Start | Position::Done => None,
        }
    }

    /// Whether execution has reached the end of the program.
    pub const fn is_done(&self) -> bool {
        matches!(self.position, Position::Done)
    }

    /// Resume execution with every condition evaluating to `condition`.
    ///
    /// # Panics
    /// If execution has already reached the end of the program.
    pub fn resume(&mut self, condition: bool) -> Next {
        self.resume_with(|_| condition)
    }

    /// Resume execution, evaluating `If` and `While` conditions with `evaluate`.
    ///
    /// # Panics
    /// If execution has already reached the end of the program.
    pub fn resume_with<F>(&mut self, mut evaluate: F) -> Next
    where
        F: FnMut(&Line<S, C>) -> bool,
    {
        let mut index = match self.position {
            Position::Start => 0,
            Position::At(index) => self.advance(index, &mut evaluate),
            Position::Done => panic!("resumed a program that has already finished"),
        };
        loop {
            match self.program.lines.get(index).map(Line::kind) {
                Some(LineKind::Subtask) => {
                    self.position = Position::At(index);
                    return Next::Subtask(index);
                }
                Some(_) => index = self.advance(index, &mut evaluate),
                None => {
                    self.position = Position::Done;
                    return Next::Done;
                }
            }
        }
    }

    /// Execute the line at `index` and return the index of the next line.
    fn advance<F>(&mut self, index: usize, evaluate: &mut F) -> usize
    where
        F: FnMut(&Line<S, C>) -> bool,
    {
        let line = &self.program.lines[index];
        let evaluation = match line {
            Line::If(_) => {
                let evaluation = evaluate(line);
                self.if_evaluations.push(evaluation);
                evaluation
            }
            Line::Else => !*self
                .if_evaluations
                .last()
                .expect("validated programs only reach Else inside an If"),
            Line::EndIf => {
                self.if_evaluations.pop();
                true
            }
            Line::While(_) => evaluate(line),
            Line::Loop(count) => {
                let remaining = self.loop_remaining.entry(index).or_insert(*count);
                let enter = *remaining > 0;
                if enter {
                    *remaining -= 1;
                } else {
                    self.loop_remaining.remove(&index);
                }
                enter
            }
            Line::EndWhile | Line::EndLoop | Line::Subtask(_) | Line::Padding => true,
        };
        self.program
            .transitions
            .get(index)
            .map_or(index + 1, |transition| transition.successor(evaluation))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{reference_trace, BitSource};
    use super::super::synth::ProgramSynthesizer;
    use super::*;
    use crate::Prng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    type TestLine = Line<usize, ()>;

    fn interpreter(lines: Vec<TestLine>) -> Interpreter<usize, ()> {
        Interpreter::new(Program::new(lines).unwrap())
    }

    fn if_else() -> Vec<TestLine> {
        vec![
            Line::If(()),
            Line::Subtask(0),
            Line::Else,
            Line::Subtask(1),
            Line::EndIf,
        ]
    }

    #[test]
    fn if_true_takes_then_branch() {
        let mut interp = interpreter(if_else());
        assert_eq!(interp.resume(true), Next::Subtask(1));
        assert_eq!(interp.current(), Some(1));
        assert_eq!(interp.resume(true), Next::Done);
        assert!(interp.is_done());
    }

    #[test]
    fn if_false_takes_else_branch() {
        let mut interp = interpreter(if_else());
        assert_eq!(interp.resume(false), Next::Subtask(3));
        assert_eq!(interp.resume(false), Next::Done);
    }

    #[test]
    fn else_uses_if_evaluation_not_current_condition() {
        let mut interp = interpreter(if_else());
        assert_eq!(interp.resume(true), Next::Subtask(1));
        // The condition changed but the else branch was decided by the If.
        assert_eq!(interp.resume(false), Next::Done);
    }

    #[test]
    fn while_repeats_until_false() {
        let mut interp = interpreter(vec![Line::While(()), Line::Subtask(0), Line::EndWhile]);
        let mut evaluations = 0;
        let mut bits = [true, true, false].into_iter();
        let mut trace = Vec::new();
        loop {
            let next = interp.resume_with(|_| {
                evaluations += 1;
                bits.next().unwrap_or(false)
            });
            match next {
                Next::Subtask(i) => trace.push(i),
                Next::Done => break,
            }
        }
        assert_eq!(trace, [1, 1]);
        assert_eq!(evaluations, 3);
    }

    #[test]
    fn false_while_is_skipped() {
        let mut interp = interpreter(vec![
            Line::While(()),
            Line::Subtask(0),
            Line::EndWhile,
            Line::Subtask(1),
        ]);
        assert_eq!(interp.resume(false), Next::Subtask(3));
        assert_eq!(interp.resume(false), Next::Done);
    }

    #[rstest]
    #[case(0, &[3])]
    #[case(1, &[1, 3])]
    #[case(3, &[1, 1, 1, 3])]
    fn loop_runs_count_times(#[case] count: u32, #[case] expected: &[usize]) {
        let mut interp = interpreter(vec![
            Line::Loop(count),
            Line::Subtask(0),
            Line::EndLoop,
            Line::Subtask(1),
        ]);
        let trace: Vec<_> = std::iter::from_fn(|| interp.resume(true).index()).collect();
        assert_eq!(trace, expected);
    }

    #[test]
    fn loop_restarts_when_reentered() {
        let mut interp = interpreter(vec![
            Line::While(()),
            Line::Loop(2),
            Line::Subtask(0),
            Line::EndLoop,
            Line::EndWhile,
        ]);
        let mut bits = [true, true, false].into_iter();
        let trace: Vec<_> = std::iter::from_fn(|| {
            interp
                .resume_with(|_| bits.next().unwrap_or(false))
                .index()
        })
        .collect();
        assert_eq!(trace, [2, 2, 2, 2]);
    }

    #[test]
    fn single_subtask() {
        let mut interp = interpreter(vec![Line::Subtask(5)]);
        assert_eq!(interp.resume(false), Next::Subtask(0));
        assert_eq!(interp.resume(false), Next::Done);
    }

    #[test]
    fn empty_program_is_done() {
        let mut interp = interpreter(vec![]);
        assert_eq!(interp.resume(true), Next::Done);
    }

    #[test]
    #[should_panic]
    fn resume_after_done_panics() {
        let mut interp = interpreter(vec![Line::Subtask(5)]);
        interp.resume(true);
        interp.resume(true);
        interp.resume(true);
    }

    #[test]
    fn matches_reference_interpreter() {
        let synth = ProgramSynthesizer::new(None, true);
        let mut rng = Prng::seed_from_u64(11);
        for case in 0..500 {
            let length = rng.gen_range(1..16);
            let lines: Vec<TestLine> = synth
                .synthesize(length, &mut rng)
                .into_iter()
                .enumerate()
                .map(|(i, kind)| {
                    Line::from_kind(kind, &mut (), |_| i, |_| (), |_| 1 + (i as u32 % 3))
                })
                .collect();
            let seed = rng.gen();
            let expected = reference_trace(&lines, &mut BitSource::new(seed, 40));

            let mut interp = interpreter(lines.clone());
            let mut bits = BitSource::new(seed, 40);
            let actual: Vec<_> =
                std::iter::from_fn(|| interp.resume_with(|_| bits.next_bit()).index()).collect();
            assert_eq!(actual, expected, "case {}: {:?}", case, lines);
        }
    }
}
