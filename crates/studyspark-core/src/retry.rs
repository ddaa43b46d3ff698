use std::time::Duration;

use rand::Rng;

/// What went wrong with a single HTTP attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response was received (connect/reset/DNS).
    Network,
    /// The per-attempt timeout elapsed before a response arrived.
    Timeout,
    /// A response arrived with a non-success status.
    Status(u16),
    /// Status and headers arrived but the body was cut off.
    Truncated(u16),
}

impl FailureKind {
    #[must_use]
    pub fn status(self) -> Option<u16> {
        match self {
            FailureKind::Status(status) | FailureKind::Truncated(status) => Some(status),
            FailureKind::Network | FailureKind::Timeout => None,
        }
    }
}

pub const IDEMPOTENT_METHODS: [&str; 6] = ["GET", "HEAD", "OPTIONS", "PUT", "DELETE", "TRACE"];

#[must_use]
pub fn is_idempotent_method(method: &str) -> bool {
    let method = method.trim();
    IDEMPOTENT_METHODS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(method))
}

/// Retry eligibility for one failed attempt, ignoring the attempt budget.
///
/// Network failures are always eligible. Timeouts, truncated bodies and 5xx
/// responses are eligible only for idempotent methods: a POST that may have
/// reached the server is never replayed.
#[must_use]
pub fn is_retryable(method: &str, failure: FailureKind) -> bool {
    match failure {
        FailureKind::Network => true,
        FailureKind::Timeout | FailureKind::Truncated(_) => is_idempotent_method(method),
        FailureKind::Status(status) => status >= 500 && is_idempotent_method(method),
    }
}

pub trait BackoffPolicy {
    /// Delay before retry number `retry` (1 = first retry).
    fn delay_for_retry(&self, retry: u32) -> Duration;
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Extra random delay as a fraction of the exponential delay, in `[0, 1]`.
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
            jitter_ratio: 0.2,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter_ratio = 0.0;
        self
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether another attempt should follow `attempts_made` failed ones.
    #[must_use]
    pub fn should_retry(&self, method: &str, failure: FailureKind, attempts_made: u32) -> bool {
        attempts_made < self.attempts() && is_retryable(method, failure)
    }

    /// Exponential delay plus jitter, clamped below the next retry's
    /// un-jittered delay so the sequence stays non-decreasing.
    pub fn jittered_delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let delay = self.delay_for_retry(retry);
        let ratio = self.jitter_ratio.clamp(0.0, 1.0);
        if ratio <= 0.0 {
            return delay;
        }
        let delay_ms = delay.as_millis() as u64;
        let extra = (delay_ms as f64 * rng.gen_range(0.0..=ratio)) as u64;
        let ceiling = self.delay_for_retry(retry.saturating_add(1)).as_millis() as u64;
        Duration::from_millis(delay_ms.saturating_add(extra).min(ceiling))
    }
}

impl BackoffPolicy for RetryPolicy {
    fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.max(1).saturating_sub(1).min(32);
        let delay = self
            .base_delay_ms
            .saturating_mul(1_u64 << exponent)
            .min(self.max_delay_ms.max(self.base_delay_ms));
        Duration::from_millis(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn idempotent_methods_are_case_insensitive() {
        assert!(is_idempotent_method("get"));
        assert!(is_idempotent_method("DELETE"));
        assert!(is_idempotent_method(" options "));
        assert!(!is_idempotent_method("POST"));
        assert!(!is_idempotent_method("PATCH"));
    }

    #[test]
    fn network_failures_retry_for_every_method() {
        assert!(is_retryable("GET", FailureKind::Network));
        assert!(is_retryable("POST", FailureKind::Network));
        assert!(is_retryable("PATCH", FailureKind::Network));
    }

    #[test]
    fn post_with_response_is_never_retried() {
        assert!(!is_retryable("POST", FailureKind::Status(503)));
        assert!(!is_retryable("POST", FailureKind::Status(500)));
        assert!(!is_retryable("POST", FailureKind::Timeout));
    }

    #[test]
    fn truncated_body_follows_idempotency() {
        assert!(!is_retryable("POST", FailureKind::Truncated(200)));
        assert!(!is_retryable("PATCH", FailureKind::Truncated(502)));
        assert!(is_retryable("GET", FailureKind::Truncated(200)));
        assert_eq!(FailureKind::Truncated(200).status(), Some(200));
    }

    #[test]
    fn idempotent_server_errors_retry() {
        assert!(is_retryable("GET", FailureKind::Status(500)));
        assert!(is_retryable("PUT", FailureKind::Status(503)));
        assert!(is_retryable("GET", FailureKind::Timeout));
    }

    #[test]
    fn client_errors_never_retry() {
        for status in [400, 401, 403, 404, 409, 429] {
            assert!(!is_retryable("GET", FailureKind::Status(status)));
        }
    }

    #[test]
    fn budget_caps_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry("GET", FailureKind::Network, 1));
        assert!(policy.should_retry("GET", FailureKind::Network, 2));
        assert!(!policy.should_retry("GET", FailureKind::Network, 3));
    }

    #[test]
    fn zero_attempts_means_single_try() {
        let policy = RetryPolicy::new(0, 10);
        assert_eq!(policy.attempts(), 1);
        assert!(!policy.should_retry("GET", FailureKind::Network, 1));
    }

    #[test]
    fn delays_double_then_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 200,
            max_delay_ms: 1_000,
            jitter_ratio: 0.0,
        };
        let delays: Vec<u64> = (1..=5)
            .map(|retry| policy.delay_for_retry(retry).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![200, 400, 800, 1_000, 1_000]);
        assert_eq!(policy.delay_for_retry(0), policy.delay_for_retry(1));
    }

    #[test]
    fn jitter_stays_below_next_delay() {
        let policy = RetryPolicy {
            jitter_ratio: 1.0,
            ..RetryPolicy::default()
        };
        let mut rng = StepRng::new(u64::MAX, 0);
        let first = policy.jittered_delay(1, &mut rng);
        assert!(first >= policy.delay_for_retry(1));
        assert!(first <= policy.delay_for_retry(2));
    }
}
