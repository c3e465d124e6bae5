//! Exclusive access to captured `log` records.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use logtest::Logger;
use rstest::fixture;

/// Guard over the process-wide [`Logger`].
///
/// `logtest` installs a single global logger, so tests that assert on log
/// output hold this guard to keep their records apart.
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Acquire the logger, draining anything earlier tests left behind.
    #[must_use]
    pub fn new() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        let mut guard = logger.lock().unwrap_or_else(PoisonError::into_inner);
        while guard.pop().is_some() {}
        Self { guard }
    }

    /// Drain the captured records as `(level, message)` pairs.
    pub fn drain(&mut self) -> Vec<(log::Level, String)> {
        std::iter::from_fn(|| self.guard.pop())
            .map(|record| (record.level(), record.args().to_owned()))
            .collect()
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

impl std::ops::Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl std::ops::DerefMut for LoggerHandle {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.guard }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logger() -> LoggerHandle { LoggerHandle::new() }
