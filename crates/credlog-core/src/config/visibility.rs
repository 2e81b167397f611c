use std::time::Duration;

/// Delay schedule between visibility probes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed delay between probes
    Fixed(Duration),

    /// Exponential: initial * 2^attempt (capped at max)
    Exponential { initial: Duration, max: Duration },
}

impl BackoffStrategy {
    /// Delay before probe number `attempt + 1`
    pub fn calculate(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { initial, max } => {
                let multiplier = 2u32.saturating_pow(attempt);
                initial.saturating_mul(multiplier).min(*max)
            }
        }
    }
}

/// Configuration for waiting on a submitted event to become readable
#[derive(Debug, Clone)]
pub struct VisibilityConfig {
    /// Give up after this long and report "not yet visible"
    pub timeout: Duration,

    /// Delay schedule between probes
    pub backoff: BackoffStrategy,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            backoff: BackoffStrategy::Exponential {
                initial: Duration::from_millis(500),
                max: Duration::from_secs(5),
            },
        }
    }
}

impl VisibilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }
}
