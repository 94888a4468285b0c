//! Clock abstraction used when issuing and verifying tokens.
//!
//! Production code reads the system clock; tests substitute a manual clock so
//! that expiry can be exercised deterministically.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the current wall-clock time.
pub trait TimeSource: Send + Sync {
    /// Get the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Get the current time in whole seconds since Unix epoch.
    ///
    /// JWT `iat`/`exp` claims are expressed in seconds.
    #[allow(clippy::cast_possible_wrap)] // Seconds since 1970 fit in i64 for the foreseeable future
    fn now_secs(&self) -> i64 {
        (self.now_ms() / 1000) as i64
    }
}

/// Real time source using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    #[allow(clippy::cast_possible_truncation)] // Milliseconds won't overflow u64 for billions of years
    fn now_ms(&self) -> u64 {
        // A clock set before 1970 is treated as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_millis() as u64)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
