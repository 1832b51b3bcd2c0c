//! Delay between failed attempts.

use std::time::Duration;

/// Delay after the first failed attempt.
pub const BACKOFF_BASE: Duration = Duration::from_millis(100);

/// Longest delay between attempts.
pub const BACKOFF_CAP: Duration = Duration::from_secs(2);

/// Exponential backoff: 100ms, 200ms, 400ms, ... capped at 2s.
///
/// `attempt` is zero-based: `backoff(0)` is the pause after the first
/// failure.
pub fn backoff(attempt: u32) -> Duration {
    if attempt == 0 {
        return BACKOFF_BASE;
    }
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    BACKOFF_BASE.saturating_mul(factor).min(BACKOFF_CAP)
}
