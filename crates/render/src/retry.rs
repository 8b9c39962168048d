use std::fmt::Display;
use std::time::Duration;

use til_types::RenderConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Fixed wait between two attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            backoff: config.backoff(),
        }
    }
}

/// Every attempt failed; `last` is the final attempt's error.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `op` until it succeeds or `policy.attempts` attempts have failed,
/// calling `sleep(policy.backoff)` between consecutive attempts. `op`
/// receives the 1-based attempt number.
///
/// No sleep follows the final failure, so a run that gives up blocks for
/// `(attempts - 1) * backoff` in total.
pub fn with_retries<T, E, S, F>(policy: &RetryPolicy, mut sleep: S, mut op: F) -> Result<T, Exhausted<E>>
where
    E: Display,
    S: FnMut(Duration),
    F: FnMut(u32) -> Result<T, E>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(last) if attempt >= attempts => return Err(Exhausted { attempts, last }),
            Err(e) => {
                tracing::warn!(
                    attempt,
                    error = %e,
                    "attempt failed, sleeping {}s",
                    policy.backoff.as_secs()
                );
                sleep(policy.backoff);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            backoff: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_always_failing_makes_exactly_three_attempts_with_two_waits() {
        let mut sleeps = Vec::new();
        let mut calls = Vec::new();
        let result: Result<(), Exhausted<String>> = with_retries(
            &policy(),
            |d| sleeps.push(d),
            |n| {
                calls.push(n);
                Err(format!("HTTP 502 on attempt {}", n))
            },
        );

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last, "HTTP 502 on attempt 3");
        assert_eq!(calls, vec![1, 2, 3]);
        assert_eq!(sleeps, vec![Duration::from_secs(60); 2]);
    }

    #[test]
    fn test_success_after_failure_stops_retrying() {
        let mut sleeps = 0;
        let result: Result<&str, Exhausted<&str>> = with_retries(
            &policy(),
            |_| sleeps += 1,
            |n| if n < 2 { Err("busy") } else { Ok("<p>ok</p>") },
        );
        assert_eq!(result.unwrap(), "<p>ok</p>");
        assert_eq!(sleeps, 1);
    }

    #[test]
    fn test_first_success_never_sleeps() {
        let mut slept = false;
        let result: Result<u8, Exhausted<&str>> = with_retries(&policy(), |_| slept = true, |_| Ok(7));
        assert_eq!(result.unwrap(), 7);
        assert!(!slept);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            attempts: 0,
            backoff: Duration::ZERO,
        };
        let mut calls = 0;
        let result: Result<(), Exhausted<&str>> = with_retries(&policy, |_| {}, |_| {
            calls += 1;
            Err("down")
        });
        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls, 1);
    }
}
