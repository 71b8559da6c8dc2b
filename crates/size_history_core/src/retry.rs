//! Bounded polling used by one-shot infrastructure setup.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential { max_delay: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff: Backoff::Exponential { max_delay },
        }
    }

    /// Delay slept after the failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.initial_delay,
            Backoff::Exponential { max_delay } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.initial_delay.saturating_mul(factor).min(max_delay)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    Pending(String),
}

/// Probes until it reports ready, an error occurs, or attempts run out.
pub fn poll_until<T>(
    policy: &RetryPolicy,
    sleep: &mut dyn FnMut(Duration),
    mut probe: impl FnMut(u32) -> Result<PollOutcome<T>, String>,
) -> Result<T, String> {
    let mut last_status = String::from("not polled");
    for attempt in 1..=policy.max_attempts {
        match probe(attempt)? {
            PollOutcome::Ready(value) => return Ok(value),
            PollOutcome::Pending(status) => last_status = status,
        }
        if attempt < policy.max_attempts {
            sleep(policy.delay_after(attempt));
        }
    }
    Err(format!(
        "gave up after {} attempts; last status: {last_status}",
        policy.max_attempts
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_is_capped() {
        let policy =
            RetryPolicy::exponential(6, Duration::from_millis(500), Duration::from_secs(3));
        let delays: Vec<Duration> = (1..=5).map(|attempt| policy.delay_after(attempt)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(3),
                Duration::from_secs(3),
            ]
        );
    }

    #[test]
    fn returns_once_probe_is_ready() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(2));
        let mut slept = Vec::new();
        let value = poll_until(&policy, &mut |delay| slept.push(delay), |attempt| {
            if attempt < 3 {
                Ok(PollOutcome::Pending("CREATING".to_string()))
            } else {
                Ok(PollOutcome::Ready("ACTIVE"))
            }
        })
        .expect("probe should succeed");

        assert_eq!(value, "ACTIVE");
        assert_eq!(slept, vec![Duration::from_secs(2); 2]);
    }

    #[test]
    fn gives_up_after_max_attempts_without_trailing_sleep() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(1));
        let mut sleeps = 0;
        let error = poll_until::<()>(&policy, &mut |_| sleeps += 1, |_| {
            Ok(PollOutcome::Pending("CREATING".to_string()))
        })
        .expect_err("should give up");

        assert!(error.contains("gave up after 3 attempts"));
        assert!(error.contains("CREATING"));
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn probe_error_stops_polling() {
        let policy = RetryPolicy::fixed(10, Duration::ZERO);
        let mut attempts = 0;
        let error = poll_until::<()>(&policy, &mut |_| {}, |_| {
            attempts += 1;
            Err("access denied".to_string())
        })
        .expect_err("probe error should surface");

        assert_eq!(error, "access denied");
        assert_eq!(attempts, 1);
    }
}
