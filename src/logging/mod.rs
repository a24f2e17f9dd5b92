//! Logging statistics from environments and simulation runs
mod chunk;
mod chunk_by_time;
mod display;

pub use chunk::{ChunkLogger, ChunkSummary, Chunker, SummaryWriter};
pub use chunk_by_time::ByTime;
pub use display::{DisplayBackend, DisplayLogger};

use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A value that can be logged.
#[derive(Debug, Clone, PartialEq)]
pub enum Loggable {
    /// Nothing. No data to log.
    ///
    /// Logging `Nothing` may still produce a placeholder entry for the name.
    Nothing,
    /// Increment a counter.
    CounterIncrement(u64),
    /// A duration. Aggregated by taking means.
    Duration(Duration),
    /// A scalar value. Aggregated by taking means.
    Scalar(f64),
    /// A sample from a distribution over `0 .. size`.
    Index { value: usize, size: usize },
    /// A message.
    Message(Cow<'static, str>),
}

impl Loggable {
    /// The name of the variant
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Nothing => "Nothing",
            Self::CounterIncrement(_) => "CounterIncrement",
            Self::Duration(_) => "Duration",
            Self::Scalar(_) => "Scalar",
            Self::Index { .. } => "Index",
            Self::Message(_) => "Message",
        }
    }
}

impl From<f64> for Loggable {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Duration> for Loggable {
    #[inline]
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl From<&'static str> for Loggable {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self::Message(value.into())
    }
}

/// Identifier of a logged value: a name within a namespace of scopes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id {
    namespace: SmallVec<[&'static str; 4]>,
    name: Cow<'static, str>,
}

impl Id {
    pub fn new<T: Into<Cow<'static, str>>>(name: T) -> Self {
        Self {
            namespace: SmallVec::new(),
            name: name.into(),
        }
    }

    /// Place this id inside the given scope.
    #[must_use]
    pub fn with_prefix(mut self, scope: &'static str) -> Self {
        self.namespace.insert(0, scope);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&'static str> for Id {
    #[inline]
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Id {
    #[inline]
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for scope in &self.namespace {
            write!(f, "{}/", scope)?;
        }
        f.write_str(&self.name)
    }
}

/// Error logging a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    #[error("incompatible value type; previously {prev} now {now}")]
    IncompatibleValue {
        prev: &'static str,
        now: &'static str,
    },
    #[error("incompatible index size; previously {prev} now {now}")]
    IncompatibleIndexSize { prev: usize, now: usize },
}

/// Log statistics.
///
/// Values are logged in groups; all values in a group are associated with the same point in
/// time. Single values can be logged with [`StatsLogger::log`] and the typed helpers.
pub trait StatsLogger {
    /// Start a new group of values.
    fn group_start(&mut self);

    /// Log a value within the current group.
    ///
    /// # Returns
    /// An error if the value is structurally incompatible with previous values logged under
    /// the same id.
    fn group_log(&mut self, id: Id, value: Loggable) -> Result<(), LogError>;

    /// End the current group.
    fn group_end(&mut self);

    /// Write out any pending summaries.
    fn flush(&mut self);

    /// Log a single value as its own group.
    #[inline]
    fn log(&mut self, id: Id, value: Loggable) -> Result<(), LogError> {
        self.group_start();
        let result = self.group_log(id, value);
        self.group_end();
        result
    }

    /// Log a scalar value.
    #[inline]
    fn log_scalar(&mut self, name: &'static str, value: f64) -> Result<(), LogError> {
        self.log(name.into(), Loggable::Scalar(value))
    }

    /// Increment a counter.
    #[inline]
    fn log_counter_increment(&mut self, name: &'static str, increment: u64) -> Result<(), LogError> {
        self.log(name.into(), Loggable::CounterIncrement(increment))
    }

    /// Log a sample from `0 .. size`.
    #[inline]
    fn log_index(&mut self, name: &'static str, value: usize, size: usize) -> Result<(), LogError> {
        self.log(name.into(), Loggable::Index { value, size })
    }

    /// Log a message.
    #[inline]
    fn log_message(&mut self, name: &'static str, message: &'static str) -> Result<(), LogError> {
        self.log(name.into(), Loggable::Message(message.into()))
    }

    /// Log a value, panicking if it is incompatible with earlier values under the same id.
    ///
    /// For code that logs a fixed set of ids with fixed types, such as environments.
    #[inline]
    fn unwrap_log(&mut self, id: Id, value: Loggable) {
        self.log(id, value).unwrap()
    }

    /// Log a scalar, panicking if it is incompatible with earlier values under the same id.
    #[inline]
    fn unwrap_log_scalar(&mut self, name: &'static str, value: f64) {
        self.log_scalar(name, value).unwrap()
    }
}

/// Logger that does nothing
impl StatsLogger for () {
    #[inline]
    fn group_start(&mut self) {}
    #[inline]
    fn group_log(&mut self, _: Id, _: Loggable) -> Result<(), LogError> {
        Ok(())
    }
    #[inline]
    fn group_end(&mut self) {}
    #[inline]
    fn flush(&mut self) {}
}

impl<L: StatsLogger + ?Sized> StatsLogger for &'_ mut L {
    #[inline]
    fn group_start(&mut self) {
        L::group_start(self)
    }
    #[inline]
    fn group_log(&mut self, id: Id, value: Loggable) -> Result<(), LogError> {
        L::group_log(self, id, value)
    }
    #[inline]
    fn group_end(&mut self) {
        L::group_end(self)
    }
    #[inline]
    fn flush(&mut self) {
        L::flush(self)
    }
}

/// Wraps a logger, placing every logged id inside a scope.
#[derive(Debug)]
pub struct ScopedLogger<'a, L: ?Sized> {
    scope: &'static str,
    logger: &'a mut L,
}

impl<'a, L: ?Sized> ScopedLogger<'a, L> {
    pub fn new(logger: &'a mut L, scope: &'static str) -> Self {
        Self { scope, logger }
    }
}

impl<L: StatsLogger + ?Sized> StatsLogger for ScopedLogger<'_, L> {
    #[inline]
    fn group_start(&mut self) {
        self.logger.group_start()
    }
    #[inline]
    fn group_log(&mut self, id: Id, value: Loggable) -> Result<(), LogError> {
        self.logger.group_log(id.with_prefix(self.scope), value)
    }
    #[inline]
    fn group_end(&mut self) {
        self.logger.group_end()
    }
    #[inline]
    fn flush(&mut self) {
        self.logger.flush()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingLogger;
    use super::*;

    #[test]
    fn id_display_with_scopes() {
        let id = Id::new("reward").with_prefix("episode").with_prefix("env");
        assert_eq!(id.to_string(), "env/episode/reward");
    }

    #[test]
    fn scoped_logger_prefixes_ids() {
        let mut recorder = RecordingLogger::default();
        let mut scoped = ScopedLogger::new(&mut recorder, "env");
        scoped.log_scalar("success", 1.0).unwrap();
        assert_eq!(recorder.values("env/success"), [&Loggable::Scalar(1.0)]);
    }

    #[test]
    fn null_logger_accepts_anything() {
        let mut logger = ();
        logger.log_scalar("a", 1.0).unwrap();
        logger.log_message("a", "not a scalar").unwrap();
    }
}
