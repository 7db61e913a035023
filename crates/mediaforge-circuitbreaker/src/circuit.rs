//! Consecutive-failure state machine for a single protected dependency.
//!
//! Spec §4.C: closed counts consecutive failures and trips to open at a
//! threshold; open fails fast until a recovery timeout elapses, then lets
//! exactly one probe call through in half-open; that probe's outcome
//! decides closed-or-open. This replaces the teacher's rate-over-a-sliding-
//! window design (`failure_rate_threshold` against `sliding_window_size`)
//! with the simpler count-based model the spec calls for.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Point-in-time view of a circuit's counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub total_calls: u64,
    pub total_failures: u64,
}

impl CircuitMetrics {
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.total_failures as f64 / self.total_calls as f64
        }
    }
}

pub(crate) struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    last_state_change: Instant,
    half_open_probe_in_flight: bool,
    total_calls: u64,
    total_failures: u64,
}

impl Circuit {
    pub(crate) fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_state_change: Instant::now(),
            half_open_probe_in_flight: false,
            total_calls: 0,
            total_failures: 0,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn metrics(&self) -> CircuitMetrics {
        CircuitMetrics {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
            total_calls: self.total_calls,
            total_failures: self.total_failures,
        }
    }

    /// Decides whether a call may proceed right now, transitioning
    /// open → half_open if the recovery timeout has elapsed.
    pub(crate) fn try_acquire(&mut self, recovery_timeout: Duration) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if self.last_state_change.elapsed() >= recovery_timeout {
                    self.state = CircuitState::HalfOpen;
                    self.last_state_change = Instant::now();
                    self.half_open_probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                // Only one probe call is admitted at a time.
                if self.half_open_probe_in_flight {
                    false
                } else {
                    self.half_open_probe_in_flight = true;
                    true
                }
            }
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.total_calls += 1;
        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_probe_in_flight = false;
                self.state = CircuitState::Closed;
                self.last_state_change = Instant::now();
                self.consecutive_failures = 0;
            }
            _ => {
                self.consecutive_failures = 0;
            }
        }
    }

    pub(crate) fn record_failure(&mut self, failure_threshold: u32) {
        self.total_calls += 1;
        self.total_failures += 1;
        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_probe_in_flight = false;
                self.state = CircuitState::Open;
                self.last_state_change = Instant::now();
            }
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= failure_threshold {
                    self.state = CircuitState::Open;
                    self.last_state_change = Instant::now();
                }
            }
            CircuitState::Open => {}
        }
    }
}
