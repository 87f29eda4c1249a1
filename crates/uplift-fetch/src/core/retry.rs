use std::time::Duration;

/// Calculate the delay before a retry attempt using exponential backoff.
///
/// The delay formula is: `base * 2^retry_count`
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use uplift_fetch::retry_delay;
///
/// let base = Duration::from_secs(1);
/// assert_eq!(retry_delay(0, base), Duration::from_secs(1));
/// assert_eq!(retry_delay(1, base), Duration::from_secs(2));
/// assert_eq!(retry_delay(2, base), Duration::from_secs(4));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}

/// Linear backoff: `step * (retry_count + 1)`.
///
/// Used between whole release-check passes, where each pass already tries
/// every endpoint once.
///
/// ```
/// use std::time::Duration;
/// use uplift_fetch::linear_delay;
///
/// let step = Duration::from_secs(2);
/// assert_eq!(linear_delay(0, step), Duration::from_secs(2));
/// assert_eq!(linear_delay(1, step), Duration::from_secs(4));
/// ```
pub fn linear_delay(retry_count: u32, step: Duration) -> Duration {
    step.saturating_mul(retry_count.saturating_add(1))
}
