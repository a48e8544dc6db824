//! Connection lifecycle of the progress stream.
//!
//! `Connecting -> Open -> Retrying(n) -> Connecting -> ... -> Failed`, driven by a pure
//! transition function so the retry rules can be tested without a network.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures after which the connection is given up
    pub max_attempts: u32,
    /// Delay unit; the n-th retry waits `n * base_delay`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn delay_for(&self, failures: u32) -> Duration {
        self.base_delay.saturating_mul(failures)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting { failures: u32 },
    Open { failures: u32 },
    Retrying { failures: u32, delay: Duration },
    Failed { failures: u32 },
    Closed,
}

impl ConnectionState {
    pub fn initial() -> Self {
        ConnectionState::Connecting { failures: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Failed { .. } | ConnectionState::Closed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Open { .. } => "open",
            ConnectionState::Retrying { .. } => "retrying",
            ConnectionState::Failed { .. } => "failed",
            ConnectionState::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened,
    /// A frame arrived; proves the connection is healthy.
    EventReceived,
    TransportFailed,
    RetryElapsed,
    Close,
}

fn after_failure(failures: u32, policy: &RetryPolicy) -> ConnectionState {
    let failures = failures.saturating_add(1);
    if failures >= policy.max_attempts {
        ConnectionState::Failed { failures }
    } else {
        ConnectionState::Retrying {
            failures,
            delay: policy.delay_for(failures),
        }
    }
}

pub fn transition(
    state: ConnectionState,
    event: ConnectionEvent,
    policy: &RetryPolicy,
) -> ConnectionState {
    use ConnectionEvent as E;
    use ConnectionState as S;

    match (state, event) {
        (S::Failed { .. } | S::Closed, _) => state,
        (_, E::Close) => S::Closed,

        (S::Connecting { failures }, E::Opened) => S::Open { failures },
        (S::Connecting { failures }, E::TransportFailed) => after_failure(failures, policy),

        (S::Open { .. }, E::EventReceived) => S::Open { failures: 0 },
        (S::Open { failures }, E::TransportFailed) => after_failure(failures, policy),

        (S::Retrying { failures, .. }, E::RetryElapsed) => S::Connecting { failures },

        (state, _) => state,
    }
}
