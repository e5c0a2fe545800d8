//! Clock abstraction for signature freshness checks and health timing.
//!
//! Webhook signatures are only accepted within a window around the current
//! time, so the handler reads time through [`Clock`] instead of calling
//! `SystemTime::now()` directly. Tests pin the clock with [`TestClock`].

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

/// Source of wall-clock and monotonic time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current instant for measuring durations.
    fn now(&self) -> Instant;

    /// Returns the current wall-clock time.
    fn now_system(&self) -> SystemTime;

    /// Returns the current wall-clock time as whole Unix seconds.
    ///
    /// Times before the epoch map to negative values.
    fn unix_timestamp(&self) -> i64 {
        match self.now_system().duration_since(UNIX_EPOCH) {
            Ok(since) => i64::try_from(since.as_secs()).unwrap_or(i64::MAX),
            Err(before) => -i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX),
        }
    }
}

/// Production clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_system(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can hand one clone to
/// the router and keep another to move time forward.
#[derive(Debug, Clone)]
pub struct TestClock {
    state: Arc<Mutex<TestClockState>>,
    base_instant: Instant,
}

#[derive(Debug)]
struct TestClockState {
    system: SystemTime,
    elapsed: Duration,
}

impl TestClock {
    /// Creates a test clock frozen at the current wall-clock time.
    pub fn new() -> Self {
        Self::with_start_time(SystemTime::now())
    }

    /// Creates a test clock frozen at `start`.
    pub fn with_start_time(start: SystemTime) -> Self {
        Self {
            state: Arc::new(Mutex::new(TestClockState { system: start, elapsed: Duration::ZERO })),
            base_instant: Instant::now(),
        }
    }

    /// Creates a test clock frozen at the given Unix second.
    pub fn at_unix(seconds: u64) -> Self {
        Self::with_start_time(UNIX_EPOCH + Duration::from_secs(seconds))
    }

    /// Moves both wall-clock and monotonic time forward.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.system += duration;
        state.elapsed += duration;
    }

    /// Sets wall-clock time, which may move backwards. Monotonic time is
    /// unaffected.
    pub fn set_system_time(&self, time: SystemTime) {
        self.lock().system = time;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TestClockState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.base_instant + self.lock().elapsed
    }

    fn now_system(&self) -> SystemTime {
        self.lock().system
    }
}
