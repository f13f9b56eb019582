// Retry policy for the JSON call wrapper.
//
// The server answers non-200 during startup, database migration, and
// nightly cleanup windows; the call wrapper re-issues the request until
// the policy's attempt ceiling is reached. Backoff is a property of the
// policy, not of the logging around it.

use std::time::Duration;

/// How long to wait between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Re-issue immediately, as fast as the server answers.
    None,
    /// Sleep a fixed interval between attempts.
    Fixed(Duration),
    /// Double the delay after every failed attempt, up to `cap`.
    Exponential { base: Duration, cap: Duration },
}

/// Bounded-retry policy applied to every JSON call.
///
/// `max_attempts` counts total tries, not re-tries: a policy with
/// `max_attempts = 1` sends the request exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    /// 50 immediate attempts, matching the server web UI's own behavior
    /// of hammering the endpoint until the service is back.
    fn default() -> Self {
        Self {
            max_attempts: 50,
            backoff: Backoff::None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Delay to sleep after the given failed attempt (1-based), or `None`
    /// to retry immediately.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        match self.backoff {
            Backoff::None => None,
            Backoff::Fixed(delay) => Some(delay),
            Backoff::Exponential { base, cap } => {
                let exp = attempt.saturating_sub(1).min(16);
                Some(base.saturating_mul(1 << exp).min(cap))
            }
        }
    }
}
