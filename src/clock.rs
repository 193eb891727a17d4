//! Injectable Time Source
//!
//! The store never asks the operating system for the time directly. Instead it
//! is generic over a [`Clock`], a single "read the current time" capability
//! measured in whole seconds.
//!
//! ## Implementations
//!
//! - [`SystemClock`]: wall-clock seconds since the UNIX epoch (production)
//! - [`ManualClock`]: a shared counter that tests advance explicitly
//! - any `Fn() -> u64` closure
//!
//! ## Example
//!
//! ```
//! use ttlkv::clock::{Clock, ManualClock};
//!
//! let clock = ManualClock::new(100);
//! let handle = clock.clone();
//!
//! handle.advance(5);
//! assert_eq!(clock.now(), 105);
//!
//! handle.set(7);
//! assert_eq!(clock.now(), 7);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of the current time in seconds.
///
/// Readings are expected to be monotonically non-decreasing. The store only
/// ever reads the clock; it never advances it.
pub trait Clock {
    /// Returns the current time in seconds.
    fn now(&self) -> u64;
}

impl<F> Clock for F
where
    F: Fn() -> u64,
{
    #[inline]
    fn now(&self) -> u64 {
        self()
    }
}

/// Wall-clock time source backed by [`SystemTime`].
///
/// `SystemTime` can step backwards when the host clock is adjusted. Readings
/// are held at the highest value seen so far, so a backwards step pauses the
/// clock instead of reviving expired entries.
#[derive(Debug, Default)]
pub struct SystemClock {
    high_water: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `reading`, or the highest earlier reading if that is larger.
    fn hold(&self, reading: u64) -> u64 {
        let previous = self.high_water.fetch_max(reading, Ordering::Relaxed);
        previous.max(reading)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        let reading = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.hold(reading)
    }
}

/// A manually driven clock.
///
/// Cloning produces another handle to the same reading, so a test can keep one
/// handle to move time forward while the store owns the other.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock that reads `start` until changed.
    pub fn new(start: u64) -> Self {
        Self {
            time: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Moves the clock forward by `seconds`, saturating at `u64::MAX`.
    pub fn advance(&self, seconds: u64) -> u64 {
        let previous = self
            .time
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |t| {
                Some(t.saturating_add(seconds))
            })
            .unwrap_or_else(|t| t);
        previous.saturating_add(seconds)
    }

    /// Sets the clock to an absolute reading.
    pub fn set(&self, time: u64) {
        self.time.store(time, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> u64 {
        self.time.load(Ordering::Relaxed)
    }
}
