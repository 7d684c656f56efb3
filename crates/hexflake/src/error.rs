/// A result type defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `hexflake` can produce.
///
/// Generation errors are plain return values. The generator never logs them
/// and never retries; the caller decides whether to back off and try again.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The wall clock reads earlier than the last millisecond used for
    /// issuance. Nothing was issued and the generator state is unchanged.
    #[error("clock moved backwards: last issued at {stale_ms} ms, clock now reads {observed_ms} ms")]
    ClockRegression {
        /// The millisecond the generator last issued IDs for.
        stale_ms: u64,
        /// The (earlier) millisecond the clock reported.
        observed_ms: u64,
    },

    /// The batch does not fit in the sequence values left for this
    /// millisecond. Nothing was issued; retrying in the next millisecond
    /// starts from a fresh sequence.
    #[error(
        "sequence exhausted at {timestamp_ms} ms: requested {requested} IDs, {available} remaining"
    )]
    SequenceExhausted {
        /// The millisecond the batch would have been issued in.
        timestamp_ms: u64,
        /// The number of IDs requested.
        requested: usize,
        /// The number of sequence values still free in that millisecond.
        available: u16,
    },

    /// A batch of zero IDs was requested.
    #[error("requested ID count must be at least 1")]
    InvalidCount,

    /// The generator lock was poisoned by a thread that panicked while
    /// holding it.
    ///
    /// `parking_lot` mutexes do not poison, so this variant only exists when
    /// the `parking-lot` feature is disabled.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,

    /// A hex-encoded ID did not have exactly 32 characters.
    #[error("invalid hex ID length: {len} (expected 32)")]
    DecodeInvalidLen {
        /// The length of the rejected input, in bytes.
        len: usize,
    },

    /// A hex-encoded ID contained a byte outside `[0-9a-fA-F]`.
    #[error("invalid hex byte {byte:#04x} at index {index}")]
    DecodeInvalidAscii {
        /// The offending byte.
        byte: u8,
        /// Its position in the input.
        index: usize,
    },
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
// Collapse every poisoned guard into `LockPoisoned`
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
