//! Command-line logger
use super::chunk::{ChunkLogger, ChunkSummary, Chunker, SummaryWriter};
use super::{ByTime, Id, LogError, Loggable, StatsLogger};
use crate::utils::fmt::{DisplayFn, PrettyPrint};
use std::fmt;
use std::time::Duration;
use yansi::Paint;

/// Logger that displays grouped summaries to standard output.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DisplayLogger<C: Chunker = ByTime>(ChunkLogger<C, DisplayBackend>);

impl<C: Chunker> DisplayLogger<C> {
    #[inline]
    pub fn new(chunker: C) -> Self {
        Self(ChunkLogger::new(chunker, DisplayBackend))
    }
}

impl<C: Chunker> StatsLogger for DisplayLogger<C> {
    #[inline]
    fn group_start(&mut self) {
        self.0.group_start()
    }
    #[inline]
    fn group_log(&mut self, id: Id, value: Loggable) -> Result<(), LogError> {
        self.0.group_log(id, value)
    }
    #[inline]
    fn group_end(&mut self) {
        self.0.group_end()
    }
    #[inline]
    fn flush(&mut self) {
        self.0.flush()
    }
}

/// Logging backend that displays summaries to standard output.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DisplayBackend;

impl SummaryWriter for DisplayBackend {
    fn write_summaries<'a, I>(&mut self, summaries: I, elapsed: Duration)
    where
        I: Iterator<Item = (&'a Id, &'a ChunkSummary)>,
    {
        let mut summaries = summaries.peekable();
        if summaries.peek().is_none() {
            return;
        }
        println!();
        println!("{}", Paint::fixed(8, DisplayFn(|f| write!(f, "[{:.1?}]", elapsed))));
        for (id, summary) in summaries {
            println!("{:<32} {}", Paint::fixed(35, id), DisplaySummary(summary));
        }
    }
}

struct DisplaySummary<'a>(&'a ChunkSummary);

impl fmt::Display for DisplaySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            ChunkSummary::Nothing => Ok(()),
            ChunkSummary::Counter {
                increment,
                initial_value,
            } => write!(
                f,
                "{}  (+{})",
                initial_value + increment,
                Paint::fixed(253, increment)
            ),
            ChunkSummary::Duration { stats } => match stats.mean() {
                Some(mean) => write!(f, "{:.4}", PrettyPrint(Duration::from_secs_f64(mean))),
                None => Ok(()),
            },
            ChunkSummary::Scalar { stats } => {
                if let Some(mean) = stats.mean() {
                    write!(f, "{:.3}", PrettyPrint(mean))?;
                }
                if stats.count() > 1 {
                    if let Some(stddev) = stats.stddev() {
                        write!(
                            f,
                            " {}",
                            Paint::fixed(
                                8,
                                DisplayFn(|f| write!(f, "(σ {:.3})", PrettyPrint(stddev)))
                            )
                        )?;
                    }
                }
                Ok(())
            }
            ChunkSummary::Index { counts } => {
                let n: usize = counts.iter().sum();
                write!(f, "(n {})  [", n)?;
                for (i, c) in counts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", c * 100 / n.max(1))?;
                }
                f.write_str("]%")
            }
            ChunkSummary::Message { counts } => {
                for (i, (message, count)) in counts.iter().enumerate() {
                    if i > 0 {
                        f.write_str("  ")?;
                    }
                    write!(f, "{} {}", message, Paint::fixed(253, DisplayFn(|f| write!(f, "(x{})", count))))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::stats::OnlineMeanVariance;

    #[test]
    fn default_chunker_checks_value_types() {
        let mut logger: DisplayLogger = DisplayLogger::new(ByTime::default());
        logger.log_scalar("reward", 1.0).unwrap();
        assert_eq!(
            logger.log_counter_increment("reward", 1),
            Err(LogError::IncompatibleValue {
                prev: "Scalar",
                now: "CounterIncrement"
            })
        );
    }

    #[test]
    fn index_summary_percentages() {
        Paint::disable();
        let summary = ChunkSummary::Index {
            counts: vec![1, 3],
        };
        assert_eq!(DisplaySummary(&summary).to_string(), "(n 4)  [25 75]%");
    }

    #[test]
    fn scalar_summary_single_value() {
        Paint::disable();
        let stats: OnlineMeanVariance<f64> = [0.5].into_iter().collect();
        let summary = ChunkSummary::Scalar { stats };
        assert_eq!(DisplaySummary(&summary).to_string(), "0.500");
    }
}
