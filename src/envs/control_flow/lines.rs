//! Program lines
use enum_map::Enum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a program line, ignoring any subtask or condition identifier.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize,
)]
pub enum LineKind {
    If,
    Else,
    EndIf,
    While,
    EndWhile,
    Loop,
    EndLoop,
    Subtask,
    Padding,
}

impl LineKind {
    /// All line kinds, ordered by their index.
    pub const ALL: [Self; 9] = [
        Self::If,
        Self::Else,
        Self::EndIf,
        Self::While,
        Self::EndWhile,
        Self::Loop,
        Self::EndLoop,
        Self::Subtask,
        Self::Padding,
    ];

    /// Index of this kind within [`LineKind::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this line opens a block.
    pub const fn is_opener(self) -> bool {
        matches!(self, Self::If | Self::While | Self::Loop)
    }

    /// The line that closes the block opened (or continued) by this line.
    pub const fn closer(self) -> Option<Self> {
        match self {
            Self::If | Self::Else => Some(Self::EndIf),
            Self::While => Some(Self::EndWhile),
            Self::Loop => Some(Self::EndLoop),
            _ => None,
        }
    }

    /// Whether this line ends a block.
    pub const fn is_closer(self) -> bool {
        matches!(self, Self::EndIf | Self::EndWhile | Self::EndLoop)
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A program line.
///
/// `S` identifies subtasks and `C` identifies the condition tested by `If` and `While`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Line<S, C> {
    If(C),
    Else,
    EndIf,
    While(C),
    EndWhile,
    /// Execute the body a fixed number of times.
    Loop(u32),
    EndLoop,
    Subtask(S),
    Padding,
}

impl<S, C> Line<S, C> {
    pub const fn kind(&self) -> LineKind {
        match self {
            Self::If(_) => LineKind::If,
            Self::Else => LineKind::Else,
            Self::EndIf => LineKind::EndIf,
            Self::While(_) => LineKind::While,
            Self::EndWhile => LineKind::EndWhile,
            Self::Loop(_) => LineKind::Loop,
            Self::EndLoop => LineKind::EndLoop,
            Self::Subtask(_) => LineKind::Subtask,
            Self::Padding => LineKind::Padding,
        }
    }

    /// The subtask identifier if this is a `Subtask` line.
    pub const fn subtask(&self) -> Option<&S> {
        match self {
            Self::Subtask(s) => Some(s),
            _ => None,
        }
    }

    /// The condition identifier if this is an `If` or `While` line.
    pub const fn condition(&self) -> Option<&C> {
        match self {
            Self::If(c) | Self::While(c) => Some(c),
            _ => None,
        }
    }

    /// Create a line of the given kind with identifiers drawn from the given closures.
    ///
    /// Each closure is passed `context`, typically a random number generator.
    pub fn from_kind<R, FS, FC, FL>(
        kind: LineKind,
        context: &mut R,
        subtask: FS,
        condition: FC,
        loop_count: FL,
    ) -> Self
    where
        R: ?Sized,
        FS: FnOnce(&mut R) -> S,
        FC: FnOnce(&mut R) -> C,
        FL: FnOnce(&mut R) -> u32,
    {
        match kind {
            LineKind::If => Self::If(condition(context)),
            LineKind::Else => Self::Else,
            LineKind::EndIf => Self::EndIf,
            LineKind::While => Self::While(condition(context)),
            LineKind::EndWhile => Self::EndWhile,
            LineKind::Loop => Self::Loop(loop_count(context)),
            LineKind::EndLoop => Self::EndLoop,
            LineKind::Subtask => Self::Subtask(subtask(context)),
            LineKind::Padding => Self::Padding,
        }
    }
}

/// An identifier that can be shown as part of a rendered line.
pub trait Label {
    /// Format the label, including any leading separator. May write nothing.
    fn fmt_label(&self, f: &mut fmt::Formatter) -> fmt::Result;
}

impl Label for () {
    fn fmt_label(&self, _: &mut fmt::Formatter) -> fmt::Result {
        Ok(())
    }
}

impl Label for usize {
    fn fmt_label(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, " {}", self)
    }
}

impl<S: Label, C: Label> fmt::Display for Line<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind())?;
        match self {
            Self::If(c) | Self::While(c) => c.fmt_label(f),
            Self::Loop(count) => write!(f, " {}", count),
            Self::Subtask(s) => s.fmt_label(f),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn kind_index_matches_all() {
        for (i, kind) in LineKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(<LineKind as Enum>::into_usize(*kind), i);
        }
    }

    #[rstest]
    #[case(LineKind::If, Some(LineKind::EndIf))]
    #[case(LineKind::Else, Some(LineKind::EndIf))]
    #[case(LineKind::While, Some(LineKind::EndWhile))]
    #[case(LineKind::Loop, Some(LineKind::EndLoop))]
    #[case(LineKind::Subtask, None)]
    #[case(LineKind::EndIf, None)]
    fn closer(#[case] kind: LineKind, #[case] expected: Option<LineKind>) {
        assert_eq!(kind.closer(), expected);
    }

    #[test]
    fn line_kind_and_ids() {
        let line: Line<usize, ()> = Line::Subtask(4);
        assert_eq!(line.kind(), LineKind::Subtask);
        assert_eq!(line.subtask(), Some(&4));
        assert_eq!(line.condition(), None);
    }

    #[test]
    fn display() {
        assert_eq!(Line::<usize, ()>::Subtask(3).to_string(), "Subtask 3");
        assert_eq!(Line::<usize, ()>::If(()).to_string(), "If");
        assert_eq!(Line::<usize, ()>::Loop(2).to_string(), "Loop 2");
    }
}
