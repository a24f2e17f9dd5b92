//! Random program synthesis
use super::lines::LineKind;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Samples random well-nested programs as sequences of line kinds.
///
/// Programs are built line by line while tracking the stack of open blocks.
/// Closers and `Else` are only offered directly after a `Subtask` line so that every branch
/// body does some work. Once the remaining length equals the number of open blocks, the
/// program is finished with exactly the closers it needs.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramSynthesizer {
    /// Maximum number of simultaneously open blocks. Unlimited if `None`.
    pub max_nesting_depth: Option<usize>,
    /// Whether to generate `Loop` blocks.
    pub loops: bool,
}

impl ProgramSynthesizer {
    pub const fn new(max_nesting_depth: Option<usize>, loops: bool) -> Self {
        Self {
            max_nesting_depth,
            loops,
        }
    }

    /// Sample a program with exactly `length` lines.
    pub fn synthesize<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> Vec<LineKind> {
        let mut lines = Vec::with_capacity(length);
        // Innermost block is last. Holds `Else` in place of `If` once the else branch opens.
        let mut open: SmallVec<[LineKind; 8]> = SmallVec::new();
        let mut choices: SmallVec<[LineKind; 8]> = SmallVec::new();
        let mut last = None;

        while lines.len() < length {
            let remaining = length - lines.len();
            if remaining == open.len() {
                lines.extend(open.drain(..).rev().filter_map(LineKind::closer));
                break;
            }
            if remaining == 1 {
                lines.push(LineKind::Subtask);
                break;
            }

            choices.clear();
            choices.push(LineKind::Subtask);
            let depth = open.len();
            if remaining > depth + 2 && self.max_nesting_depth.map_or(true, |max| depth < max) {
                choices.push(LineKind::If);
                choices.push(LineKind::While);
                if self.loops {
                    choices.push(LineKind::Loop);
                }
            }
            if last == Some(LineKind::Subtask) {
                match open.last() {
                    Some(LineKind::If) => {
                        choices.push(LineKind::Else);
                        choices.push(LineKind::EndIf);
                    }
                    Some(&kind) => choices.extend(kind.closer()),
                    None => {}
                }
            }

            let kind = choices[rng.gen_range(0..choices.len())];
            match kind {
                LineKind::If | LineKind::While | LineKind::Loop => open.push(kind),
                LineKind::Else => {
                    if let Some(top) = open.last_mut() {
                        *top = LineKind::Else;
                    }
                }
                LineKind::EndIf | LineKind::EndWhile | LineKind::EndLoop => {
                    open.pop();
                }
                LineKind::Subtask | LineKind::Padding => {}
            }
            lines.push(kind);
            last = Some(kind);
        }
        lines
    }
}

/// A program measuring how far an agent can carry a condition.
///
/// Consists of a single `If` or `While` block wrapping `length - 2` subtasks,
/// followed by one trailing subtask; `length + 1` lines in total.
///
/// # Panics
/// If `length < 2`.
pub fn condition_size_program<R: Rng + ?Sized>(length: usize, rng: &mut R) -> Vec<LineKind> {
    assert!(length >= 2, "condition size program must have length >= 2");
    let opener = if rng.gen() {
        LineKind::If
    } else {
        LineKind::While
    };
    let mut lines = Vec::with_capacity(length + 1);
    lines.push(opener);
    lines.extend(std::iter::repeat(LineKind::Subtask).take(length - 2));
    lines.extend(opener.closer());
    lines.push(LineKind::Subtask);
    lines
}

#[cfg(test)]
mod tests {
    use super::super::transitions::TransitionTable;
    use super::*;
    use crate::Prng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn max_depth(lines: &[LineKind]) -> usize {
        let mut depth = 0_usize;
        let mut max = 0;
        for kind in lines {
            if kind.is_opener() {
                depth += 1;
                max = max.max(depth);
            } else if kind.is_closer() {
                depth -= 1;
            }
        }
        max
    }

    #[rstest]
    fn well_nested(
        #[values(None, Some(1), Some(2))] max_nesting_depth: Option<usize>,
        #[values(false, true)] loops: bool,
    ) {
        let synth = ProgramSynthesizer::new(max_nesting_depth, loops);
        let mut rng = Prng::seed_from_u64(7);
        for length in 0..20 {
            for _ in 0..20 {
                let lines = synth.synthesize(length, &mut rng);
                assert_eq!(lines.len(), length);
                assert!(TransitionTable::compile(lines.iter().copied()).is_ok());
                if let Some(max) = max_nesting_depth {
                    assert!(max_depth(&lines) <= max);
                }
                if !loops {
                    assert!(!lines.contains(&LineKind::Loop));
                }
            }
        }
    }

    #[test]
    fn length_one_is_subtask() {
        let synth = ProgramSynthesizer::default();
        let mut rng = Prng::seed_from_u64(0);
        for _ in 0..10 {
            assert_eq!(synth.synthesize(1, &mut rng), [LineKind::Subtask]);
        }
    }

    #[test]
    fn depth_zero_is_flat() {
        let synth = ProgramSynthesizer::new(Some(0), true);
        let mut rng = Prng::seed_from_u64(1);
        let lines = synth.synthesize(10, &mut rng);
        assert!(lines.iter().all(|&kind| kind == LineKind::Subtask));
    }

    #[test]
    fn generates_every_block_kind() {
        let synth = ProgramSynthesizer::new(None, true);
        let mut rng = Prng::seed_from_u64(2);
        let mut seen = enum_map::EnumMap::<LineKind, bool>::default();
        for _ in 0..200 {
            for kind in synth.synthesize(12, &mut rng) {
                seen[kind] = true;
            }
        }
        for kind in LineKind::ALL {
            assert_eq!(seen[kind], kind != LineKind::Padding, "{:?}", kind);
        }
    }

    #[test]
    fn condition_size_layout() {
        let mut rng = Prng::seed_from_u64(3);
        let lines = condition_size_program(5, &mut rng);
        assert_eq!(lines.len(), 6);
        assert!(matches!(lines[0], LineKind::If | LineKind::While));
        assert_eq!(&lines[1..4], [LineKind::Subtask; 3]);
        assert_eq!(Some(lines[4]), lines[0].closer());
        assert_eq!(lines[5], LineKind::Subtask);
    }
}
