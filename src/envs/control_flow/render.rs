//! Text rendering of programs
use super::lines::{Label, Line, LineKind};
use std::fmt;
use yansi::Paint;

/// Displays a program with block indentation and line markers.
///
/// The marker column shows `+` on the line that is both active and selected, `|` on the
/// active line and `-` on the selected line. The active line is highlighted in green.
#[derive(Debug, Copy, Clone)]
pub struct ProgramView<'a, S, C> {
    pub lines: &'a [Line<S, C>],
    pub active: Option<usize>,
    pub selected: Option<usize>,
}

impl<S: Label, C: Label> fmt::Display for ProgramView<'_, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut level = 1_usize;
        for (i, line) in self.lines.iter().enumerate() {
            let kind = line.kind();
            if kind.is_closer() || kind == LineKind::Else {
                level = level.saturating_sub(1);
            }
            let is_active = self.active == Some(i);
            let is_selected = self.selected == Some(i);
            let marker = match (is_active, is_selected) {
                (true, true) => "+ ",
                (true, false) => "| ",
                (false, true) => "- ",
                (false, false) => "  ",
            };
            let text = format!("{:>2} {}{}", i, marker.repeat(level), line);
            if is_active {
                writeln!(f, "{}", Paint::green(text))?;
            } else {
                writeln!(f, "{}", text)?;
            }
            if kind.is_opener() || kind == LineKind::Else {
                level += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_blocks_and_marks_lines() {
        Paint::disable();
        let lines: Vec<Line<usize, ()>> = vec![
            Line::While(()),
            Line::Subtask(3),
            Line::EndWhile,
            Line::Subtask(1),
        ];
        let view = ProgramView {
            lines: &lines,
            active: Some(1),
            selected: Some(3),
        };
        assert_eq!(
            view.to_string(),
            " 0   While\n 1 | | Subtask 3\n 2   EndWhile\n 3 - Subtask 1\n"
        );
    }
}
