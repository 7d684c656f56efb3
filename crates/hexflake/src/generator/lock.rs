use core::cmp::Ordering;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, Result,
    generator::Mutex,
    id::HexFlakeId,
    time::TimeSource,
};

/// Mutable generator state. Only ever touched while the lock is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct State {
    /// Last millisecond used for issuance.
    pub(crate) current_ms: u64,
    /// Last sequence value issued in `current_ms`. Zero right after a reset.
    pub(crate) sequence: u16,
}

/// A lock-based [`HexFlakeId`] generator suitable for multi-threaded
/// environments.
///
/// Every call to [`produce`] runs under a single mutex: the clock read, the
/// millisecond comparison, the sequence updates and the ID construction all
/// happen while it is held. Callers never see the clock or sequence state,
/// only the IDs it yields.
///
/// Wrap it in an [`Arc`] to share it across threads or tasks.
///
/// ## Guarantees
/// - IDs are unique for the lifetime of the generator as long as the clock
///   does not go backwards (which is reported, never masked).
/// - IDs come out in non-decreasing `(timestamp, sequence)` order.
/// - A millisecond can issue sequence values `1..=65535`; batches that do not
///   fit fail with [`Error::SequenceExhausted`] instead of wrapping.
///
/// [`produce`]: HexFlakeGenerator::produce
/// [`Arc`]: std::sync::Arc
pub struct HexFlakeGenerator<T>
where
    T: TimeSource<u64>,
{
    pub(crate) state: Mutex<State>,
    machine_id: u64,
    time: T,
}

impl<T> HexFlakeGenerator<T>
where
    T: TimeSource<u64>,
{
    /// Creates a new generator for `machine_id`, using the current reading of
    /// `time` as the starting millisecond and zero as the starting sequence.
    ///
    /// # Example
    /// ```
    /// use hexflake::{HexFlakeGenerator, SystemClock};
    ///
    /// let generator = HexFlakeGenerator::new(0x0242_ac11_0002, SystemClock::default());
    /// let ids = generator.produce(3).unwrap();
    /// assert_eq!(ids.len(), 3);
    /// assert!(ids.iter().all(|id| id.machine_id() == 0x0242_ac11_0002));
    /// ```
    pub fn new(machine_id: u64, time: T) -> Self {
        let current_ms = time.current_millis();
        Self::from_components(current_ms, machine_id, 0, time)
    }

    /// Creates a generator from explicit state.
    ///
    /// `sequence` is the last sequence value treated as already issued in
    /// `timestamp`; the next ID in that millisecond gets `sequence + 1`.
    ///
    /// # ⚠️ Note
    /// In typical use cases, you should prefer [`Self::new`] to let the
    /// generator initialize itself from the current time.
    pub fn from_components(timestamp: u64, machine_id: u64, sequence: u16, time: T) -> Self {
        Self {
            state: Mutex::new(State {
                current_ms: timestamp,
                sequence,
            }),
            machine_id,
            time,
        }
    }

    /// The machine ID stamped into every ID.
    pub const fn machine_id(&self) -> u64 {
        self.machine_id
    }

    /// Issues `count` new IDs, in order.
    ///
    /// The clock is read once per call. If it has advanced since the last
    /// issuance the sequence restarts, so the first ID of a new millisecond
    /// has sequence `1`; otherwise numbering continues where the previous
    /// batch stopped.
    ///
    /// # Errors
    /// - [`Error::InvalidCount`] if `count` is zero
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued millisecond
    /// - [`Error::SequenceExhausted`] if fewer than `count` sequence values
    ///   are left in the current millisecond
    /// - `Error::LockPoisoned` if another thread panicked while holding the
    ///   lock (std mutex only)
    ///
    /// Nothing is issued and no state changes on any error.
    ///
    /// # Example
    /// ```
    /// use hexflake::{HexFlakeGenerator, TimeSource};
    ///
    /// struct FixedTime;
    /// impl TimeSource<u64> for FixedTime {
    ///     fn current_millis(&self) -> u64 {
    ///         1_700_000_000_000
    ///     }
    /// }
    ///
    /// let generator = HexFlakeGenerator::new(7, FixedTime);
    /// let ids = generator.produce(2).unwrap();
    /// assert_eq!(ids[0].sequence(), 1);
    /// assert_eq!(ids[1].sequence(), 2);
    /// assert_eq!(ids[1].timestamp(), 1_700_000_000_000);
    /// ```
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self), fields(machine_id = self.machine_id))
    )]
    pub fn produce(&self, count: usize) -> Result<Vec<HexFlakeId>> {
        if count == 0 {
            return Err(Error::InvalidCount);
        }

        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let observed_ms = self.time.current_millis();
        let last_sequence = match observed_ms.cmp(&state.current_ms) {
            Ordering::Equal => state.sequence,
            Ordering::Greater => 0,
            Ordering::Less => return Err(Self::cold_clock_behind(state.current_ms, observed_ms)),
        };

        let available = HexFlakeId::max_sequence() - last_sequence;
        if count > usize::from(available) {
            return Err(Self::cold_sequence_exhausted(observed_ms, count, available));
        }

        // `count <= available`, so this stays within the 16-bit field.
        let end = last_sequence + count as u16;
        let ids = (last_sequence + 1..=end)
            .map(|sequence| HexFlakeId::from(observed_ms, self.machine_id, sequence))
            .collect();

        *state = State {
            current_ms: observed_ms,
            sequence: end,
        };

        Ok(ids)
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(stale_ms: u64, observed_ms: u64) -> Error {
        debug_assert!(observed_ms < stale_ms);
        Error::ClockRegression {
            stale_ms,
            observed_ms,
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_sequence_exhausted(timestamp_ms: u64, requested: usize, available: u16) -> Error {
        Error::SequenceExhausted {
            timestamp_ms,
            requested,
            available,
        }
    }
}

impl<T> core::fmt::Debug for HexFlakeGenerator<T>
where
    T: TimeSource<u64>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HexFlakeGenerator")
            .field("machine_id", &format_args!("{:#014x}", self.machine_id))
            .finish_non_exhaustive()
    }
}
