//! Check orchestration
//!
//! Runs exactly one handshake attempt per invocation and races it against
//! the overall deadline and external interruption. The race is expressed
//! as a single mpsc channel acting as a one-shot result slot: the
//! handshake worker and the interrupt handler both send [`CheckEvent`]s,
//! the orchestrator waits with `recv_timeout`, and the first event (or
//! the timeout) decides the outcome.
//!
//! A worker still in flight when the race is decided is abandoned, never
//! joined; its eventual send lands in a channel nobody reads and is
//! discarded. There are no retries — re-running the whole check belongs
//! to the external scheduler.

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::{error, info};
use url::Url;

use crate::config::CheckConfig;
use crate::tls::handshake::{handshake, HandshakeError};
use crate::tls::trust::{build_trust_anchors, TrustError, TrustPaths};

/// Failure reason reported when the deadline elapses first.
pub const TIMEOUT_REASON: &str =
    "Failed to complete SSL handshake in time. Timeout was reached.";

/// Failure reason reported when the run is interrupted externally.
pub const INTERRUPT_REASON: &str = "Cancelling check and shutting down due to interrupt.";

/// Events racing for the one-shot result slot.
#[derive(Debug)]
pub enum CheckEvent {
    /// The handshake attempt finished, successfully or not.
    Finished(Result<(), CheckError>),
    /// An external interrupt asked the check to stop.
    Interrupted,
}

/// Terminal outcome of a check run, produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure { reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Errors from the handshake attempt itself.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("error building URL for target: {0}")]
    Url(#[from] url::ParseError),

    #[error("error creating cert pool for ssl checks: {0}")]
    Trust(#[from] TrustError),

    #[error(transparent)]
    Handshake(#[from] HandshakeError),
}

/// Runs the SSL handshake check.
#[derive(Debug, Clone)]
pub struct Checker {
    domain_name: String,
    port: String,
    self_signed: bool,
    check_timeout: Duration,
    trust_paths: TrustPaths,
}

impl Checker {
    /// Build a checker from configuration, probing the well-known pod
    /// mount paths for trust material.
    pub fn new(cfg: &CheckConfig) -> Self {
        Checker {
            domain_name: cfg.domain_name.clone(),
            port: cfg.port.clone(),
            self_signed: cfg.self_signed,
            check_timeout: cfg.check_timeout,
            trust_paths: TrustPaths::default(),
        }
    }

    /// Override the trust material locations (used by tests).
    pub fn with_trust_paths(mut self, trust_paths: TrustPaths) -> Self {
        self.trust_paths = trust_paths;
        self
    }

    /// Execute the check under the configured deadline.
    ///
    /// `events` is the sender half of the result slot; the caller may
    /// clone it into an interrupt handler before passing it in. An
    /// [`CheckEvent::Interrupted`] already queued when `run` is called
    /// wins the race immediately.
    pub fn run(&self, events: Sender<CheckEvent>, results: Receiver<CheckEvent>) -> Outcome {
        info!(
            domain = %self.domain_name,
            port = %self.port,
            self_signed = self.self_signed,
            timeout = ?self.check_timeout,
            "running SSL handshake check"
        );

        let worker = self.clone();
        thread::spawn(move || {
            // Discarded if the race was already decided.
            let _ = events.send(CheckEvent::Finished(worker.do_checks()));
        });

        match results.recv_timeout(self.check_timeout) {
            Ok(CheckEvent::Finished(Ok(()))) => {
                info!(domain = %self.domain_name, "SSL handshake completed successfully");
                Outcome::Success
            }
            Ok(CheckEvent::Finished(Err(err))) => {
                error!(domain = %self.domain_name, error = %err, "error when doing SSL handshake");
                Outcome::Failure {
                    reason: err.to_string(),
                }
            }
            Ok(CheckEvent::Interrupted) => {
                info!("cancelling check and shutting down due to interrupt");
                Outcome::Failure {
                    reason: INTERRUPT_REASON.to_string(),
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                info!("cancelling check and shutting down due to timeout");
                Outcome::Failure {
                    reason: TIMEOUT_REASON.to_string(),
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                // Only possible if the worker died without sending.
                error!("handshake worker exited without reporting a result");
                Outcome::Failure {
                    reason: "handshake worker exited without reporting a result".to_string(),
                }
            }
        }
    }

    /// One handshake attempt: build the target URL, build the trust pool,
    /// run the handshake.
    fn do_checks(&self) -> Result<(), CheckError> {
        let site = Url::parse(&format!("https://{}:{}", self.domain_name, self.port))?;
        let anchors = build_trust_anchors(&self.trust_paths)?;
        handshake(&site, anchors)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn test_checker(timeout: Duration) -> Checker {
        let cfg = CheckConfig {
            domain_name: "localhost".to_string(),
            port: "443".to_string(),
            self_signed: false,
            check_timeout: timeout,
        };
        Checker::new(&cfg)
    }

    #[test]
    fn test_queued_interrupt_beats_the_worker() {
        let checker = test_checker(Duration::from_secs(30));
        let (tx, rx) = mpsc::channel();
        tx.send(CheckEvent::Interrupted).unwrap();

        let outcome = checker.run(tx, rx);
        assert_eq!(
            outcome,
            Outcome::Failure {
                reason: INTERRUPT_REASON.to_string()
            }
        );
    }

    #[test]
    fn test_zero_timeout_reports_timeout_reason() {
        let checker = test_checker(Duration::ZERO);
        let (tx, rx) = mpsc::channel();

        let outcome = checker.run(tx, rx);
        assert_eq!(
            outcome,
            Outcome::Failure {
                reason: TIMEOUT_REASON.to_string()
            }
        );
    }

    #[test]
    fn test_bad_port_is_a_url_error() {
        let cfg = CheckConfig {
            domain_name: "localhost".to_string(),
            port: "not-a-port".to_string(),
            self_signed: false,
            check_timeout: Duration::from_secs(5),
        };
        let err = Checker::new(&cfg).do_checks().unwrap_err();
        assert!(matches!(err, CheckError::Url(_)));
    }
}
