use std::time::Instant;

const NANOS_PER_MS: u64 = 1_000_000;

/// Opaque high-resolution timestamp. Only meaningful to the clock that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }
}

/// Injected timing source for request duration measurement.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Whole milliseconds elapsed since `start`. The sub-millisecond
    /// remainder is discarded, not rounded.
    fn elapsed_ms(&self, start: Timestamp) -> u64 {
        self.now().as_nanos().saturating_sub(start.as_nanos()) / NANOS_PER_MS
    }
}

/// Monotonic wall-clock backed by `std::time::Instant`.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.origin.elapsed().as_nanos() as u64)
    }
}
