//! Connection retry policies.
//!
//! A [`RetryPolicy`] is a plain value: attempt limit plus fixed backoff.
//! [`RetryPolicy::run`] drives an operation against any `embedded_hal`
//! delay, so host tests run it with a fake delay and no wall-clock time.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries until the operation succeeds.
    max_attempts: Option<u32>,
    backoff_ms: u32,
}

impl RetryPolicy {
    /// Give up after `attempts` tries (at least one).
    pub const fn bounded(attempts: u32, backoff_ms: u32) -> Self {
        Self {
            max_attempts: Some(if attempts == 0 { 1 } else { attempts }),
            backoff_ms,
        }
    }

    /// Never give up.
    pub const fn unbounded(backoff_ms: u32) -> Self {
        Self {
            max_attempts: None,
            backoff_ms,
        }
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn backoff_ms(&self) -> u32 {
        self.backoff_ms
    }

    /// Call `op` (with the 1-based attempt number) until it succeeds or the
    /// attempt limit is reached.  Sleeps `backoff_ms` between attempts, never
    /// after the last one.  Returns the last error on exhaustion.
    pub fn run<T, E, D, F>(&self, delay: &mut D, mut op: F) -> Result<T, E>
    where
        E: core::fmt::Display,
        D: DelayNs,
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 1u32;
        loop {
            match op(attempt) {
                Ok(v) => {
                    if attempt > 1 {
                        debug!("retry: succeeded on attempt {}", attempt);
                    }
                    return Ok(v);
                }
                Err(e) => {
                    if self.max_attempts.is_some_and(|max| attempt >= max) {
                        warn!("retry: giving up after {} attempts: {}", attempt, e);
                        return Err(e);
                    }
                    debug!("retry: attempt {} failed: {}", attempt, e);
                }
            }
            delay.delay_ms(self.backoff_ms);
            attempt = attempt.saturating_add(1);
        }
    }
}
