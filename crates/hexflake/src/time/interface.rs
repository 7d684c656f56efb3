use core::time::Duration;

/// Default epoch: Thursday, January 1, 1970 00:00:00 UTC
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(0);

/// A trait for time sources that return a wall-clock or mocked timestamp.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests.
///
/// The timestamp type `T` is generic, and the unit is expected to be
/// **milliseconds** relative to a configurable origin.
///
/// # Example
///
/// ```
/// use hexflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource<u64> for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource<T> {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> T;
}
