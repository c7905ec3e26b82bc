//! Byte-rate limiting for fetches
//!
//! Rate strings have the form `<number>[k|m|g]` (case-insensitive, base 1024,
//! `kb`/`mb`/`gb`/`b` accepted too); no suffix means bytes per second.
//!
//! One admission policy is used everywhere: tokens are bytes, and every body
//! chunk read from the network acquires as many tokens as it has bytes. The
//! bucket holds one second's worth of bytes, so short bursts up to that size
//! pass immediately and the sustained rate converges on the configured one.

use crate::RateLimitError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Longest refill period accepted for sub-byte-per-second rates
const MAX_REFILL_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Parses a rate string into bytes per second
///
/// # Examples
///
/// ```
/// use site_mirror::crawler::parse_rate;
///
/// assert_eq!(parse_rate("400k").unwrap(), 400.0 * 1024.0);
/// assert_eq!(parse_rate("2M").unwrap(), 2.0 * 1024.0 * 1024.0);
/// assert_eq!(parse_rate("512").unwrap(), 512.0);
/// assert!(parse_rate("fast").is_err());
/// ```
pub fn parse_rate(spec: &str) -> Result<f64, RateLimitError> {
    let normalized = spec.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(RateLimitError::Empty);
    }

    let split_at = normalized
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(normalized.len());
    let (number, unit) = normalized.split_at(split_at);

    if number.is_empty() {
        return Err(RateLimitError::MissingNumber(spec.to_string()));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| RateLimitError::InvalidNumber(spec.to_string()))?;

    let multiplier = match unit.trim() {
        "" | "b" => 1.0,
        "k" | "kb" => 1024.0,
        "m" | "mb" => 1024.0 * 1024.0,
        "g" | "gb" => 1024.0 * 1024.0 * 1024.0,
        other => {
            return Err(RateLimitError::UnknownUnit {
                spec: spec.to_string(),
                unit: other.to_string(),
            })
        }
    };

    let bytes_per_second = value * multiplier;
    if !bytes_per_second.is_finite() || bytes_per_second <= 0.0 {
        return Err(RateLimitError::NonPositive(spec.to_string()));
    }

    Ok(bytes_per_second)
}

/// Token bucket measured in bytes
pub struct ByteRateLimiter {
    limiter: DefaultDirectRateLimiter,
    burst: NonZeroU32,
    bytes_per_second: f64,
}

impl std::fmt::Debug for ByteRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteRateLimiter")
            .field("bytes_per_second", &self.bytes_per_second)
            .field("burst", &self.burst)
            .finish()
    }
}

impl ByteRateLimiter {
    /// Creates a limiter admitting `bytes_per_second` on average
    pub fn new(bytes_per_second: f64) -> Result<Self, RateLimitError> {
        if !bytes_per_second.is_finite() || bytes_per_second <= 0.0 {
            return Err(RateLimitError::NonPositive(bytes_per_second.to_string()));
        }

        let (quota, burst) = if bytes_per_second >= 1.0 {
            let burst = NonZeroU32::new(bytes_per_second.min(u32::MAX as f64) as u32)
                .unwrap_or(NonZeroU32::MIN);
            (Quota::per_second(burst), burst)
        } else {
            let period = Duration::try_from_secs_f64(1.0 / bytes_per_second)
                .unwrap_or(MAX_REFILL_PERIOD)
                .min(MAX_REFILL_PERIOD);
            let quota = Quota::with_period(period)
                .ok_or_else(|| RateLimitError::NonPositive(bytes_per_second.to_string()))?
                .allow_burst(NonZeroU32::MIN);
            (quota, NonZeroU32::MIN)
        };

        Ok(Self {
            limiter: RateLimiter::direct(quota),
            burst,
            bytes_per_second,
        })
    }

    /// Parses a rate string and builds the limiter
    pub fn from_spec(spec: &str) -> Result<Self, RateLimitError> {
        Self::new(parse_rate(spec)?)
    }

    /// Sustained rate in bytes per second
    pub fn bytes_per_second(&self) -> f64 {
        self.bytes_per_second
    }

    /// Bucket capacity in bytes
    pub fn burst(&self) -> u32 {
        self.burst.get()
    }

    /// Waits until `bytes` tokens have been admitted
    ///
    /// Requests larger than the bucket are admitted in bucket-sized slices.
    pub async fn acquire(&self, bytes: usize) {
        let slice = self.burst.get() as usize;
        let mut remaining = bytes;

        while remaining > 0 {
            let take = remaining.min(slice);
            let Some(tokens) = u32::try_from(take).ok().and_then(NonZeroU32::new) else {
                break;
            };

            if let Err(e) = self.limiter.until_n_ready(tokens).await {
                tracing::warn!("Rate limiter refused {} bytes: {}", take, e);
                break;
            }
            remaining -= take;
        }
    }
}

/// Builds the crawl limiter from a configured rate string
///
/// An empty string means unlimited. An unparsable or non-positive rate is a
/// degraded configuration: it is logged and the run proceeds without limiting.
pub fn limiter_from_config(spec: &str) -> Option<Arc<ByteRateLimiter>> {
    if spec.trim().is_empty() {
        return None;
    }

    match ByteRateLimiter::from_spec(spec) {
        Ok(limiter) => {
            tracing::info!(
                "Rate limiting to {:.0} bytes/sec (burst {} bytes)",
                limiter.bytes_per_second(),
                limiter.burst()
            );
            Some(Arc::new(limiter))
        }
        Err(e) => {
            tracing::warn!(
                "Invalid rate limit, proceeding without rate limiting: {}",
                e
            );
            None
        }
    }
}
