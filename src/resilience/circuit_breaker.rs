use std::time::{Duration, Instant};

/// Point-in-time view of the breaker, exposed for tests and diagnostics.
#[derive(Debug, Clone)]
pub struct CircuitBreakerSnapshot {
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
    pub consecutive_failures: u32,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

#[derive(Debug)]
struct State {
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

/// Circuit breaker with an explicit closed / open / half-open lifecycle.
///
/// - **Closed**: requests pass; failures increment a consecutive counter.
/// - **Open**: the counter reached the threshold; [`allow`](Self::allow)
///   fails fast with the remaining cooldown until `open_until` passes.
/// - **Half-open**: the cooldown elapsed; the next gate check resets the
///   counter and lets a probe request through. A success closes the
///   breaker, a failure starts counting toward re-opening.
///
/// Shared across concurrent in-flight requests; the mutex makes each
/// read-modify-write atomic, but two first attempts can both pass the gate
/// before either failure is recorded. That under-count is accepted: the
/// breaker damps failure storms, it does not strictly serialize them.
pub struct CircuitBreaker {
    cfg: CircuitBreakerConfig,
    state: std::sync::Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(cfg: CircuitBreakerConfig) -> Self {
        Self {
            cfg,
            state: std::sync::Mutex::new(State {
                consecutive_failures: 0,
                open_until: None,
            }),
        }
    }

    /// Gate check before a request. `Err` carries the remaining cooldown.
    pub fn allow(&self) -> Result<(), Duration> {
        let mut st = match self.state.lock() {
            Ok(st) => st,
            // Poisoned lock: fail open rather than wedging all traffic.
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(until) = st.open_until {
            let now = Instant::now();
            if now < until {
                return Err(until - now);
            }
        }
        // Half-open: the cooldown expired, or the counter reached the
        // threshold without an armed cooldown. Reset and let a probe through.
        if st.open_until.is_some() || st.consecutive_failures >= self.cfg.failure_threshold {
            tracing::debug!("circuit breaker half-open, allowing probe request");
            st.open_until = None;
            st.consecutive_failures = 0;
        }
        Ok(())
    }

    pub fn on_success(&self) {
        if let Ok(mut st) = self.state.lock() {
            st.consecutive_failures = 0;
            st.open_until = None;
        }
    }

    pub fn on_failure(&self) {
        if let Ok(mut st) = self.state.lock() {
            st.consecutive_failures = st.consecutive_failures.saturating_add(1);
            if st.consecutive_failures >= self.cfg.failure_threshold {
                tracing::warn!(
                    consecutive_failures = st.consecutive_failures,
                    cooldown_ms = self.cfg.cooldown.as_millis() as u64,
                    "circuit breaker opened"
                );
                st.open_until = Some(Instant::now() + self.cfg.cooldown);
            }
        }
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let now = Instant::now();
        let (consecutive_failures, open_remaining_ms) = match self.state.lock() {
            Ok(st) => {
                let remaining = st.open_until.and_then(|until| {
                    (until > now).then(|| (until - now).as_millis() as u64)
                });
                (st.consecutive_failures, remaining)
            }
            Err(_) => (0, None),
        };
        CircuitBreakerSnapshot {
            failure_threshold: self.cfg.failure_threshold,
            cooldown_ms: self.cfg.cooldown.as_millis() as u64,
            consecutive_failures,
            open_remaining_ms,
        }
    }

    /// Force the breaker into a specific state. Test hook.
    pub fn set_state(&self, consecutive_failures: u32, open_for: Option<Duration>) {
        if let Ok(mut st) = self.state.lock() {
            st.consecutive_failures = consecutive_failures;
            st.open_until = open_for.map(|d| Instant::now() + d);
        }
    }

    /// Reset to the closed state. Test hook.
    pub fn reset(&self) {
        self.set_state(0, None);
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
