//! Fixed-interval pacing for the network fetches of one batch.
//!
//! A [`Pacer`] belongs to a single batch resolution. It sleeps the pacing
//! interval before every fetch it admits, so a batch with `n` misses spends
//! at least `n * interval` waiting regardless of how fast upstream answers.
//! Separate batches own separate pacers and never wait on each other.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use gallery_core::resolve::Pacer;
//!
//! # async fn example() {
//! let mut pacer = Pacer::new(Duration::from_millis(100));
//! pacer.pace().await; // waits 100ms
//! pacer.pace().await; // waits another 100ms
//! assert_eq!(pacer.cumulative_delay(), Duration::from_millis(200));
//! # }
//! ```

use std::time::Duration;

use tracing::{debug, instrument, warn};

/// Warning threshold for cumulative pacing delay within one batch.
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Maximum Retry-After value (1 hour) to prevent excessive delays.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Per-batch pacing state.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    cumulative: Duration,
    warned: bool,
}

impl Pacer {
    /// Creates a pacer that waits `interval` before each fetch.
    ///
    /// A zero interval disables pacing.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cumulative: Duration::ZERO,
            warned: false,
        }
    }

    /// Creates a pacer that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.interval.is_zero()
    }

    /// Returns the configured interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total time this pacer has spent waiting, including extra waits.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        self.cumulative
    }

    /// Waits one pacing interval.
    #[instrument(level = "trace", skip(self), fields(interval_ms = self.interval.as_millis()))]
    pub async fn pace(&mut self) {
        if self.is_disabled() {
            return;
        }
        self.wait(self.interval).await;
    }

    /// Waits an additional, caller-chosen delay (retry backoff).
    pub async fn wait_extra(&mut self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        debug!(delay_ms = delay.as_millis(), "applying backoff delay");
        self.wait(delay).await;
    }

    async fn wait(&mut self, delay: Duration) {
        self.cumulative += delay;
        if !self.warned && self.cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
            self.warned = true;
            warn!(
                cumulative_delay_secs = self.cumulative.as_secs(),
                "excessive pacing in one batch - consider lowering the resolve cap"
            );
        }
        tokio::time::sleep(delay).await;
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports two formats as per RFC 7231:
/// - Integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2025 07:28:00 GMT`
///
/// Returns `None` if the value cannot be parsed. Caps excessive values at 1 hour.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use gallery_core::resolve::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("invalid"), None);
/// ```
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);
        return Some(duration.min(MAX_RETRY_AFTER));
    }

    if let Ok(datetime) = httpdate::parse_http_date(header_value) {
        let now = std::time::SystemTime::now();
        match datetime.duration_since(now) {
            Ok(duration) => Some(duration.min(MAX_RETRY_AFTER)),
            // Date in the past
            Err(_) => Some(Duration::ZERO),
        }
    } else {
        debug!(header_value, "unparseable Retry-After value");
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_pacer_waits_interval_each_call() {
        let mut pacer = Pacer::new(Duration::from_millis(200));
        let start = Instant::now();

        pacer.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(200));

        pacer.pace().await;
        pacer.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(600));
        assert_eq!(pacer.cumulative_delay(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_pacer_never_waits() {
        let mut pacer = Pacer::disabled();
        let start = Instant::now();
        for _ in 0..10 {
            pacer.pace().await;
        }
        assert!(start.elapsed() < Duration::from_millis(1));
        assert!(pacer.is_disabled());
        assert_eq!(pacer.cumulative_delay(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_extra_counts_toward_cumulative() {
        let mut pacer = Pacer::new(Duration::from_millis(50));
        pacer.pace().await;
        pacer.wait_extra(Duration::from_secs(2)).await;
        pacer.wait_extra(Duration::ZERO).await;
        assert_eq!(pacer.cumulative_delay(), Duration::from_millis(2050));
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after("  7 "), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after("0"), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_retry_after_rejects_garbage() {
        assert_eq!(parse_retry_after("-5"), None);
        assert_eq!(parse_retry_after(""), None);
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_parse_retry_after_caps_at_one_hour() {
        assert_eq!(parse_retry_after("7200"), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_retry_after_http_date_past() {
        assert_eq!(
            parse_retry_after("Wed, 01 Jan 2020 00:00:00 GMT"),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_parse_retry_after_http_date_future() {
        let future_time = std::time::SystemTime::now() + Duration::from_secs(60);
        let duration = parse_retry_after(&httpdate::fmt_http_date(future_time)).unwrap();
        assert!(
            duration >= Duration::from_secs(55) && duration <= Duration::from_secs(65),
            "Duration should be ~60s, got {duration:?}"
        );
    }
}
