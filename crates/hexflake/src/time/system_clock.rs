use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::time::{DEFAULT_EPOCH, TimeSource};

/// A wall-clock time source reading [`SystemTime::now`] on every call.
///
/// Unlike a monotonic timer, this clock follows external adjustments (NTP
/// steps, manual changes), so consecutive readings can go backwards. The
/// generator detects that and refuses to issue IDs rather than hiding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClock {
    epoch_ms: u64,
}

impl Default for SystemClock {
    /// Constructs a clock aligned to [`DEFAULT_EPOCH`] (the Unix epoch).
    fn default() -> Self {
        Self::with_epoch(DEFAULT_EPOCH)
    }
}

impl SystemClock {
    /// Constructs a clock whose zero point is `epoch`, given as a
    /// [`Duration`] since 1970-01-01 UTC.
    ///
    /// Readings earlier than the epoch saturate to zero.
    ///
    /// # Example
    ///
    /// ```
    /// use core::time::Duration;
    /// use hexflake::{SystemClock, TimeSource};
    ///
    /// let unix = SystemClock::default();
    /// let shifted = SystemClock::with_epoch(Duration::from_secs(1_000));
    ///
    /// let a: u64 = unix.current_millis();
    /// let b: u64 = shifted.current_millis();
    /// assert!(a >= 1_000_000 && b < a);
    /// ```
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_ms: epoch.as_millis() as u64,
        }
    }

    /// The configured epoch, in milliseconds since the Unix epoch.
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch_ms
    }
}

impl TimeSource<u64> for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock set before 1970 reads as zero rather than panicking.
        let since_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        since_unix.saturating_sub(self.epoch_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_epoch_is_unix() {
        let clock = SystemClock::default();
        assert_eq!(clock.epoch_millis(), 0);

        let expected = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let observed: u64 = clock.current_millis();
        // Allow for scheduling delay between the two reads.
        assert!(observed >= expected && observed - expected < 1_000);
    }

    #[test]
    fn custom_epoch_is_subtracted() {
        let epoch = Duration::from_millis(1_735_689_600_000);
        let clock = SystemClock::with_epoch(epoch);
        let shifted: u64 = clock.current_millis();
        let unix: u64 = SystemClock::default().current_millis();
        let diff = unix - shifted;
        assert!((1_735_689_600_000..1_735_689_601_000).contains(&diff));
    }

    #[test]
    fn future_epoch_saturates_to_zero() {
        let clock = SystemClock::with_epoch(Duration::from_millis(u64::MAX));
        assert_eq!(TimeSource::<u64>::current_millis(&clock), 0);
    }
}
