//! Control-flow transition tables
use super::lines::LineKind;
use smallvec::SmallVec;
use thiserror::Error;

/// Successor line indices of a single line.
///
/// For `If`, `While` and `Loop` lines `on_true` enters the body and `on_false` skips it.
/// A false `If` goes to its `Else`, if any. `Else` evaluates to the negation of its `If`:
/// `on_true` enters the else body and `on_false` skips to `EndIf`.
/// Skipping an if-block always lands on its `EndIf`, so every executed `If` reaches `EndIf`.
/// Skipping a `While` or `Loop` block lands past its closer.
/// Block closers jump back to the matching `While` or `Loop` head, or fall through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Transition {
    pub on_false: usize,
    pub on_true: usize,
}

impl Transition {
    const fn goto(index: usize) -> Self {
        Self {
            on_false: index,
            on_true: index,
        }
    }

    /// The successor index given the evaluation of the current line.
    #[inline]
    pub const fn successor(self, evaluation: bool) -> usize {
        if evaluation {
            self.on_true
        } else {
            self.on_false
        }
    }
}

/// Error in the block structure of a program.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("line {index}: {kind} does not match any open block")]
    Unmatched { index: usize, kind: LineKind },
    #[error("line {index}: {kind} block is never closed")]
    Unclosed { index: usize, kind: LineKind },
    #[error("line {index}: padding is not a program line")]
    Padding { index: usize },
}

#[derive(Debug, Copy, Clone)]
struct OpenBlock {
    kind: LineKind,
    head: usize,
    /// Index of the `Else` line, if any.
    branch: Option<usize>,
}

/// The successor of every line of a program for each possible evaluation.
///
/// A line with index equal to the program length is the end of the program.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
}

impl TransitionTable {
    /// Compute the transition table of a program given its line kinds.
    ///
    /// Compiling the same lines always produces the same table.
    pub fn compile<I>(kinds: I) -> Result<Self, ProgramError>
    where
        I: IntoIterator<Item = LineKind>,
    {
        let mut transitions = Vec::new();
        let mut open: SmallVec<[OpenBlock; 8]> = SmallVec::new();

        for (index, kind) in kinds.into_iter().enumerate() {
            transitions.push(Transition::goto(index + 1));
            match kind {
                LineKind::If | LineKind::While | LineKind::Loop => open.push(OpenBlock {
                    kind,
                    head: index,
                    branch: None,
                }),
                LineKind::Else => match open.last_mut() {
                    Some(block) if block.kind == LineKind::If && block.branch.is_none() => {
                        block.branch = Some(index);
                        transitions[block.head].on_false = index;
                    }
                    _ => return Err(ProgramError::Unmatched { index, kind }),
                },
                LineKind::EndIf | LineKind::EndWhile | LineKind::EndLoop => {
                    let block = match open.pop() {
                        Some(block) if block.kind.closer() == Some(kind) => block,
                        _ => return Err(ProgramError::Unmatched { index, kind }),
                    };
                    match block.branch {
                        Some(branch) => {
                            // Reaching `Else` from the then body skips the else body.
                            transitions[branch] = Transition {
                                on_false: index,
                                on_true: branch + 1,
                            };
                        }
                        None if kind == LineKind::EndIf => transitions[block.head].on_false = index,
                        None => transitions[block.head].on_false = index + 1,
                    }
                    if kind != LineKind::EndIf {
                        transitions[index] = Transition::goto(block.head);
                    }
                }
                LineKind::Subtask => {}
                LineKind::Padding => return Err(ProgramError::Padding { index }),
            }
        }
        if let Some(block) = open.pop() {
            return Err(ProgramError::Unclosed {
                index: block.head,
                kind: block.kind,
            });
        }
        Ok(Self { transitions })
    }

    /// Number of lines in the program.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Transition> {
        self.transitions.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Transition> + '_ {
        self.transitions.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LineKind::*;

    fn t(on_false: usize, on_true: usize) -> Transition {
        Transition { on_false, on_true }
    }

    #[test]
    fn if_else() {
        let table = TransitionTable::compile([If, Subtask, Else, Subtask, EndIf]).unwrap();
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            [t(2, 1), t(2, 2), t(4, 3), t(4, 4), t(5, 5)]
        );
    }

    #[test]
    fn false_if_goes_to_else() {
        let kinds = [Subtask, If, If, Subtask, Else, Subtask, EndIf, EndIf];
        let table = TransitionTable::compile(kinds).unwrap();
        assert_eq!(table.get(1), Some(t(7, 2)));
        assert_eq!(table.get(2), Some(t(4, 3)));
        assert_eq!(table.get(4), Some(t(6, 5)));
    }

    #[test]
    fn if_without_else() {
        let table = TransitionTable::compile([If, Subtask, EndIf, Subtask]).unwrap();
        assert_eq!(table.get(0), Some(t(2, 1)));
    }

    #[test]
    fn while_jumps_back() {
        let table = TransitionTable::compile([While, Subtask, EndWhile, Subtask]).unwrap();
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            [t(3, 1), t(2, 2), t(0, 0), t(4, 4)]
        );
    }

    #[test]
    fn nested_blocks() {
        let kinds = [Loop, While, Subtask, EndWhile, Subtask, EndLoop];
        let table = TransitionTable::compile(kinds).unwrap();
        assert_eq!(table.get(0), Some(t(6, 1)));
        assert_eq!(table.get(1), Some(t(4, 2)));
        assert_eq!(table.get(3), Some(t(1, 1)));
        assert_eq!(table.get(5), Some(t(0, 0)));
    }

    #[test]
    fn compile_is_idempotent() {
        let kinds = [If, Subtask, Else, While, Subtask, EndWhile, EndIf];
        assert_eq!(
            TransitionTable::compile(kinds).unwrap(),
            TransitionTable::compile(kinds).unwrap()
        );
    }

    #[test]
    fn single_subtask() {
        let table = TransitionTable::compile([Subtask]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0), Some(t(1, 1)));
    }

    #[test]
    fn mismatched_closer() {
        assert_eq!(
            TransitionTable::compile([While, Subtask, EndIf]),
            Err(ProgramError::Unmatched {
                index: 2,
                kind: EndIf
            })
        );
    }

    #[test]
    fn double_else() {
        assert_eq!(
            TransitionTable::compile([If, Subtask, Else, Subtask, Else, EndIf]),
            Err(ProgramError::Unmatched {
                index: 4,
                kind: Else
            })
        );
    }

    #[test]
    fn unclosed() {
        assert_eq!(
            TransitionTable::compile([Subtask, If, Subtask]),
            Err(ProgramError::Unclosed { index: 1, kind: If })
        );
    }

    #[test]
    fn padding_rejected() {
        assert_eq!(
            TransitionTable::compile([Subtask, Padding]),
            Err(ProgramError::Padding { index: 1 })
        );
    }
}
