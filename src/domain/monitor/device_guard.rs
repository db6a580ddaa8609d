use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::domain::clock::clock::SharedClock;
use crate::domain::device::switch_control::DeviceError;
use crate::domain::utils::id::NodeId;

#[derive(Debug, Clone, Default)]
struct Breaker {
    consecutive_failures: u32,
    open_until_ms: Option<i64>,
}

/// Bounds every device call of the control loop: per-call timeout, retries with exponential backoff and
/// a per-device circuit breaker.
///
/// A breaker opens after `breaker_threshold` consecutive failed calls and short-circuits calls to that device until
/// `breaker_cooldown_ms` has passed on the clock. The first call after the cooldown is a trial: it closes the
/// breaker on success and re-opens it on failure.
#[derive(Debug)]
pub struct DeviceGuard {
    clock: SharedClock,
    timeout: Duration,
    retries: u32,
    retry_backoff: Duration,
    breaker_threshold: u32,
    breaker_cooldown_ms: i64,
    breakers: HashMap<NodeId, Breaker>,
}

impl DeviceGuard {
    pub fn new(clock: SharedClock, timeout: Duration, retries: u32, retry_backoff: Duration, breaker_threshold: u32, breaker_cooldown_ms: i64) -> Self {
        Self { clock, timeout, retries, retry_backoff, breaker_threshold: breaker_threshold.max(1), breaker_cooldown_ms, breakers: HashMap::new() }
    }

    pub fn is_open(&self, device: &NodeId) -> bool {
        let now = self.clock.now_ms();
        self.breakers.get(device).and_then(|b| b.open_until_ms).is_some_and(|until| now < until)
    }

    /// Runs `operation` against `device`, retrying transient failures.
    ///
    /// A `Rejected` answer proves the device is reachable: it is returned at once and resets the breaker.
    pub async fn call<T, F, Fut>(&mut self, device: &NodeId, operation: F) -> Result<T, DeviceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, DeviceError>>,
    {
        let now = self.clock.now_ms();
        let breaker = self.breakers.entry(device.clone()).or_default();
        if let Some(until_ms) = breaker.open_until_ms.filter(|until| now < *until) {
            return Err(DeviceError::CircuitOpen { until_ms });
        }

        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(DeviceError::Timeout(self.timeout.as_millis() as u64)),
            };

            match result {
                Ok(value) => {
                    *breaker = Breaker::default();
                    return Ok(value);
                }
                Err(DeviceError::Rejected(reason)) => {
                    *breaker = Breaker::default();
                    return Err(DeviceError::Rejected(reason));
                }
                Err(error) if attempt < self.retries => {
                    let backoff = self.retry_backoff.saturating_mul(1u32 << attempt.min(16));
                    log::debug!("{}: attempt {} failed ({}); retrying in {:?}.", device, attempt + 1, error, backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(error) => {
                    breaker.consecutive_failures += 1;
                    if breaker.consecutive_failures >= self.breaker_threshold {
                        let until_ms = self.clock.now_ms() + self.breaker_cooldown_ms;
                        breaker.open_until_ms = Some(until_ms);
                        log::warn!("{}: circuit opened until {} after {} failed calls.", device, until_ms, breaker.consecutive_failures);
                    }
                    return Err(error);
                }
            }
        }
    }
}
