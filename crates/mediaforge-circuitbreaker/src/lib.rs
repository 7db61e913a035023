//! Per-dependency circuit breaker.
//!
//! Wraps outbound calls to the media tool and to storage (spec §4.C,
//! §2 control flow: "Cross-cutting C wraps outbound calls to the media tool
//! and to storage"). A [`Registry`] owns one [`CircuitBreaker`] per name so
//! callers don't have to thread breaker instances through by hand.
//!
//! # Examples
//!
//! ```
//! use mediaforge_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//!
//! # async fn example() {
//! let breaker = CircuitBreaker::new(CircuitBreakerConfig::new("storage").failure_threshold(3));
//! for _ in 0..3 {
//!     let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
//! }
//! assert_eq!(breaker.state().await, CircuitState::Open);
//! # }
//! ```

pub mod circuit;
pub mod config;
pub mod error;
pub mod registry;

pub use circuit::{CircuitMetrics, CircuitState};
pub use config::CircuitBreakerConfig;
pub use error::CircuitBreakerError;
pub use registry::Registry;

use circuit::Circuit;
use mediaforge_core::{EventListener, EventListeners, ResilienceEvent};
use std::time::Instant;
use tokio::sync::Mutex;

/// An event emitted by a circuit's state transitions, for the shared
/// observability bus in `mediaforge_core::events`.
#[derive(Debug, Clone)]
pub struct CircuitBreakerEvent {
    pub name: String,
    pub timestamp: Instant,
    pub from: CircuitState,
    pub to: CircuitState,
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        "state_transition"
    }

    fn timestamp(&self) -> Instant {
        self.timestamp
    }

    fn pattern_name(&self) -> &str {
        &self.name
    }
}

/// Protects one dependency behind a consecutive-failure gate.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
    listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            circuit: Mutex::new(Circuit::new()),
            listeners: EventListeners::new(),
        }
    }

    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: EventListener<CircuitBreakerEvent> + 'static,
    {
        self.listeners.add(listener);
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub async fn state(&self) -> CircuitState {
        self.circuit.lock().await.state()
    }

    pub async fn metrics(&self) -> CircuitMetrics {
        self.circuit.lock().await.metrics()
    }

    /// Runs `f` through the breaker. Rejects immediately with
    /// [`CircuitBreakerError::Open`] if the circuit is open and the recovery
    /// timeout hasn't elapsed; otherwise runs `f` and records the outcome.
    ///
    /// Only the error path counts as a failure; callers that need to
    /// exclude certain error variants (e.g. a 4xx that isn't the
    /// dependency's fault) should filter before calling, since this breaker
    /// treats every `Err` as failure like the spec's "expected category"
    /// classifier reduced to the common case.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let permitted = {
            let mut circuit = self.circuit.lock().await;
            let before = circuit.state();
            let permitted = circuit.try_acquire(self.config.recovery_timeout);
            if permitted && before != circuit.state() {
                self.emit(before, circuit.state());
            }
            permitted
        };

        if !permitted {
            return Err(CircuitBreakerError::Open {
                name: self.config.name.clone(),
            });
        }

        let before_state = self.circuit.lock().await.state();
        match f().await {
            Ok(value) => {
                let mut circuit = self.circuit.lock().await;
                circuit.record_success();
                if before_state != circuit.state() {
                    self.emit(before_state, circuit.state());
                }
                Ok(value)
            }
            Err(err) => {
                let mut circuit = self.circuit.lock().await;
                circuit.record_failure(self.config.failure_threshold);
                if before_state != circuit.state() {
                    self.emit(before_state, circuit.state());
                }
                Err(CircuitBreakerError::Inner(err))
            }
        }
    }

    fn emit(&self, from: CircuitState, to: CircuitState) {
        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %self.config.name, ?from, ?to, "circuit state transition");

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "circuitbreaker_transitions_total",
            "circuitbreaker" => self.config.name.clone()
        )
        .increment(1);

        self.listeners.emit(&CircuitBreakerEvent {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
            from,
            to,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn admits_calls_while_closed() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::new("x"));
        let result = breaker.call(|| async { Ok::<_, &str>(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn opens_after_threshold_and_rejects_fast() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::new("x").failure_threshold(3));
        for _ in 0..3 {
            let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state().await, CircuitState::Open);

        let attempts = AtomicU32::new(0);
        let result = breaker
            .call(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, &str>(()) }
            })
            .await;
        assert!(matches!(result, Err(CircuitBreakerError::Open { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 0, "inner call must not run while open");
    }

    #[tokio::test]
    async fn half_open_probe_after_recovery_timeout() {
        use std::time::Duration;
        let breaker = CircuitBreaker::new(
            CircuitBreakerConfig::new("x")
                .failure_threshold(1)
                .recovery_timeout(Duration::from_millis(10)),
        );
        let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(breaker.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = breaker.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }
}
