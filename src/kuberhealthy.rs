//! Kuberhealthy collaborators
//!
//! The narrow surface of the Kuberhealthy platform this check consumes:
//! the status reporting endpoint, the run deadline, and a readiness gate
//! that waits until the reporting endpoint is reachable from the pod.
//!
//! Kuberhealthy injects `KH_REPORTING_URL` and `KH_CHECK_RUN_DEADLINE`
//! into every check pod; the report body is a JSON object of the shape
//! `{"Errors": [...], "OK": bool}`.

use std::env;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, info, warn};

/// Environment variable holding the reporting endpoint URL.
pub const REPORTING_URL_ENV: &str = "KH_REPORTING_URL";

/// Environment variable holding the run deadline as unix seconds.
pub const RUN_DEADLINE_ENV: &str = "KH_CHECK_RUN_DEADLINE";

/// Interval between readiness-gate polls.
const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Per-request timeout used by the readiness gate and status reports.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Status report body expected by the Kuberhealthy server.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    #[serde(rename = "Errors")]
    pub errors: Vec<String>,
    #[serde(rename = "OK")]
    pub ok: bool,
}

/// Reporting errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{0} environment variable has not been set")]
    MissingEnv(&'static str),

    #[error("error sending status report: {0}")]
    Http(#[from] reqwest::Error),

    #[error("reporting endpoint returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Deadline provider errors
#[derive(Debug, thiserror::Error)]
pub enum DeadlineError {
    #[error("{0} environment variable has not been set")]
    Missing(&'static str),

    #[error("could not parse KH_CHECK_RUN_DEADLINE value {0:?} as unix seconds")]
    Malformed(String),
}

/// Client for the Kuberhealthy reporting endpoint.
pub struct Client {
    reporting_url: String,
    http: reqwest::blocking::Client,
}

impl Client {
    /// Build a client from `KH_REPORTING_URL`.
    pub fn from_env() -> Result<Self, ReportError> {
        let reporting_url = env::var(REPORTING_URL_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or(ReportError::MissingEnv(REPORTING_URL_ENV))?;
        Ok(Self::new(reporting_url))
    }

    /// Build a client against an explicit reporting URL.
    pub fn new(reporting_url: impl Into<String>) -> Self {
        Client {
            reporting_url: reporting_url.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    /// The endpoint status reports are delivered to.
    pub fn reporting_url(&self) -> &str {
        &self.reporting_url
    }

    /// Report that the check passed.
    pub fn report_success(&self) -> Result<(), ReportError> {
        self.send(&StatusReport {
            errors: Vec::new(),
            ok: true,
        })
    }

    /// Report that the check failed with the given reasons.
    pub fn report_failure(&self, reasons: Vec<String>) -> Result<(), ReportError> {
        self.send(&StatusReport {
            errors: reasons,
            ok: false,
        })
    }

    fn send(&self, report: &StatusReport) -> Result<(), ReportError> {
        let response = self
            .http
            .post(&self.reporting_url)
            .timeout(REQUEST_TIMEOUT)
            .json(report)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status(status));
        }
        Ok(())
    }

    /// Readiness gate: poll the reporting endpoint until any HTTP
    /// response arrives, bounded by `timeout`.
    ///
    /// Returns whether the endpoint answered. Failure to become ready is
    /// the caller's to log; it is never fatal to the check run.
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self
                .http
                .get(&self.reporting_url)
                .timeout(REQUEST_TIMEOUT)
                .send()
            {
                Ok(_) => {
                    info!("Kuberhealthy reporting endpoint is reachable");
                    return true;
                }
                Err(err) => {
                    debug!(error = %err, "Kuberhealthy reporting endpoint not reachable yet");
                }
            }
            if Instant::now() >= deadline {
                warn!("timed out waiting for the Kuberhealthy reporting endpoint");
                return false;
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }
}

/// Read the run deadline Kuberhealthy injected into the environment.
pub fn deadline_from_env() -> Result<SystemTime, DeadlineError> {
    let raw = env::var(RUN_DEADLINE_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(DeadlineError::Missing(RUN_DEADLINE_ENV))?;
    let seconds: u64 = raw
        .trim()
        .parse()
        .map_err(|_| DeadlineError::Malformed(raw))?;
    Ok(UNIX_EPOCH + Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_in_kuberhealthy_shape() {
        let report = StatusReport {
            errors: vec!["handshake failed".to_string()],
            ok: false,
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({"Errors": ["handshake failed"], "OK": false})
        );
    }

    #[test]
    fn test_success_report_has_no_errors() {
        let report = StatusReport {
            errors: Vec::new(),
            ok: true,
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({"Errors": [], "OK": true})
        );
    }
}
