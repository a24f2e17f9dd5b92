//! Structural statistics of programs
use super::lines::LineKind;
use crate::logging::{Id, Loggable, StatsLogger};
use crate::utils::stats::OnlineMeanVariance;
use enum_map::EnumMap;
use smallvec::SmallVec;

/// Structural statistics of a program, logged at the start of each episode.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProgramStats {
    pub num_lines: usize,
    /// Number of lines of each kind.
    pub counts: EnumMap<LineKind, usize>,
    pub max_nesting_depth: usize,
    /// Number of control-flow edges.
    pub num_edges: usize,
    /// Mean number of lines from the start of each clause up to its end.
    pub if_clause_length: Option<f64>,
    pub else_clause_length: Option<f64>,
    pub while_clause_length: Option<f64>,
    pub loop_clause_length: Option<f64>,
}

impl ProgramStats {
    pub fn from_kinds<I: IntoIterator<Item = LineKind>>(kinds: I) -> Self {
        let mut stats = Self::default();
        let mut open: SmallVec<[(LineKind, usize); 8]> = SmallVec::new();
        let mut if_lengths = OnlineMeanVariance::new();
        let mut else_lengths = OnlineMeanVariance::new();
        let mut while_lengths = OnlineMeanVariance::new();
        let mut loop_lengths = OnlineMeanVariance::new();

        for (index, kind) in kinds.into_iter().enumerate() {
            stats.num_lines += 1;
            stats.counts[kind] += 1;
            match kind {
                LineKind::If | LineKind::While | LineKind::Loop => {
                    open.push((kind, index));
                    stats.max_nesting_depth = stats.max_nesting_depth.max(open.len());
                }
                LineKind::Else => {
                    if let Some((start_kind, start)) = open.last_mut() {
                        if_lengths.push((index - *start) as f64);
                        *start_kind = LineKind::Else;
                        *start = index;
                    }
                }
                LineKind::EndIf | LineKind::EndWhile | LineKind::EndLoop => {
                    if let Some((start_kind, start)) = open.pop() {
                        let length = (index - start) as f64;
                        match start_kind {
                            LineKind::If => if_lengths.push(length),
                            LineKind::Else => else_lengths.push(length),
                            LineKind::While => while_lengths.push(length),
                            _ => loop_lengths.push(length),
                        }
                    }
                }
                LineKind::Subtask | LineKind::Padding => {}
            }
        }
        let branching = stats.counts[LineKind::If]
            + stats.counts[LineKind::Else]
            + stats.counts[LineKind::While]
            + stats.counts[LineKind::Loop];
        stats.num_edges = 2 * branching + stats.counts[LineKind::Subtask];
        stats.if_clause_length = if_lengths.mean();
        stats.else_clause_length = else_lengths.mean();
        stats.while_clause_length = while_lengths.mean();
        stats.loop_clause_length = loop_lengths.mean();
        stats
    }

    /// Log the statistics as a single group.
    pub fn log<L: StatsLogger + ?Sized>(&self, logger: &mut L) {
        logger.group_start();
        let mut log = |name: &'static str, value: f64| {
            logger
                .group_log(Id::new(name).with_prefix("program"), Loggable::Scalar(value))
                .unwrap()
        };
        log("num_lines", self.num_lines as f64);
        log("if_lines", self.counts[LineKind::If] as f64);
        log("else_lines", self.counts[LineKind::Else] as f64);
        log("while_lines", self.counts[LineKind::While] as f64);
        log("loop_lines", self.counts[LineKind::Loop] as f64);
        log("subtask_lines", self.counts[LineKind::Subtask] as f64);
        log("nesting_depth", self.max_nesting_depth as f64);
        log("num_edges", self.num_edges as f64);
        for (name, length) in [
            ("if_clause_length", self.if_clause_length),
            ("else_clause_length", self.else_clause_length),
            ("while_clause_length", self.while_clause_length),
            ("loop_clause_length", self.loop_clause_length),
        ] {
            if let Some(length) = length {
                log(name, length);
            }
        }
        logger.group_end();
    }
}

/// Outcome of a finished episode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeOutcome {
    pub success: bool,
    /// Number of steps taken in the episode.
    pub steps: u64,
    /// The last line completed successfully; the program length on success.
    pub success_line: usize,
    /// The line at which the episode failed, if it did.
    pub failure_line: Option<usize>,
}

impl EpisodeOutcome {
    /// Log the outcome as a single group.
    pub fn log<L: StatsLogger + ?Sized>(&self, logger: &mut L) {
        logger.group_start();
        let mut log = |name: &'static str, value: f64| {
            logger
                .group_log(name.into(), Loggable::Scalar(value))
                .unwrap()
        };
        log("success", if self.success { 1.0 } else { 0.0 });
        log("episode_length", self.steps as f64);
        log("success_line", self.success_line as f64);
        if let Some(line) = self.failure_line {
            log("failure_line", line as f64);
        }
        logger.group_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::testing::RecordingLogger;
    use LineKind::*;

    #[test]
    fn counts_and_depth() {
        let stats = ProgramStats::from_kinds([
            If, Subtask, Else, While, Subtask, EndWhile, EndIf, Subtask,
        ]);
        assert_eq!(stats.num_lines, 8);
        assert_eq!(stats.counts[If], 1);
        assert_eq!(stats.counts[Subtask], 3);
        assert_eq!(stats.max_nesting_depth, 2);
        assert_eq!(stats.num_edges, 2 * 3 + 3);
    }

    #[test]
    fn clause_lengths() {
        let stats = ProgramStats::from_kinds([If, Subtask, Subtask, Else, Subtask, EndIf]);
        assert_eq!(stats.if_clause_length, Some(3.0));
        assert_eq!(stats.else_clause_length, Some(2.0));
        assert_eq!(stats.while_clause_length, None);
    }

    #[test]
    fn flat_program() {
        let stats = ProgramStats::from_kinds([Subtask, Subtask]);
        assert_eq!(stats.max_nesting_depth, 0);
        assert_eq!(stats.num_edges, 2);
    }

    #[test]
    fn logs_scoped_values() {
        let mut logger = RecordingLogger::default();
        ProgramStats::from_kinds([While, Subtask, EndWhile]).log(&mut logger);
        assert_eq!(
            logger.values("program/while_lines"),
            [&Loggable::Scalar(1.0)]
        );
        assert_eq!(
            logger.values("program/while_clause_length"),
            [&Loggable::Scalar(2.0)]
        );
        assert!(logger.values("program/if_clause_length").is_empty());
    }

    #[test]
    fn logs_outcome() {
        let mut logger = RecordingLogger::default();
        EpisodeOutcome {
            success: false,
            steps: 4,
            success_line: 2,
            failure_line: Some(3),
        }
        .log(&mut logger);
        assert_eq!(logger.values("success"), [&Loggable::Scalar(0.0)]);
        assert_eq!(logger.values("episode_length"), [&Loggable::Scalar(4.0)]);
        assert_eq!(logger.values("failure_line"), [&Loggable::Scalar(3.0)]);
    }
}
