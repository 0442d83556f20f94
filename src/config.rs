//! Check configuration
//!
//! Builds the immutable [`CheckConfig`] from environment variables at
//! startup. All inputs are required; a missing or malformed value aborts
//! the run before any network activity.
//!
//! The overall check timeout comes from the Kuberhealthy run deadline
//! minus a small safety margin, falling back to a fixed default when the
//! deadline is unavailable.

use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::kuberhealthy;

/// Environment variable naming the domain to check.
pub const DOMAIN_NAME_ENV: &str = "DOMAIN_NAME";

/// Environment variable naming the TLS port to check.
pub const PORT_ENV: &str = "PORT";

/// Environment variable flagging a self-signed target certificate.
pub const SELF_SIGNED_ENV: &str = "SELF_SIGNED";

/// Fallback timeout when the Kuberhealthy deadline is unavailable.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(20);

/// Margin subtracted from the run deadline so the result report can still
/// be delivered before Kuberhealthy gives up on the run.
const DEADLINE_SAFETY_MARGIN: Duration = Duration::from_secs(5);

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable has not been set")]
    Missing(&'static str),

    #[error("failed to parse {var}: {value:?} is not a boolean")]
    InvalidBool { var: &'static str, value: String },
}

/// Configuration for one SSL handshake check run. Immutable once built.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Domain to check.
    pub domain_name: String,
    /// TLS port to check. Kept as a string; a non-numeric value surfaces
    /// later as a connection failure rather than a config error.
    pub port: String,
    /// Whether the target presents a self-signed certificate.
    pub self_signed: bool,
    /// Overall deadline for the check run.
    pub check_timeout: Duration,
}

/// Read configuration from the process environment.
pub fn from_env() -> Result<CheckConfig, ConfigError> {
    let check_timeout = resolve_check_timeout(SystemTime::now());
    from_vars(|name| std::env::var(name).ok(), check_timeout)
}

/// Build a config from an injected variable lookup.
fn from_vars<F>(lookup: F, check_timeout: Duration) -> Result<CheckConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let domain_name = required(&lookup, DOMAIN_NAME_ENV)?;
    let port = required(&lookup, PORT_ENV)?;

    let self_signed_raw = required(&lookup, SELF_SIGNED_ENV)?;
    let self_signed = parse_bool(&self_signed_raw).ok_or(ConfigError::InvalidBool {
        var: SELF_SIGNED_ENV,
        value: self_signed_raw,
    })?;

    Ok(CheckConfig {
        domain_name,
        port,
        self_signed,
        check_timeout,
    })
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(var))
}

/// Boolean forms accepted by the original check manifests.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Derive the check timeout from the Kuberhealthy run deadline.
fn resolve_check_timeout(now: SystemTime) -> Duration {
    let timeout = match kuberhealthy::deadline_from_env() {
        Ok(deadline) => timeout_until(deadline, now),
        Err(err) => {
            warn!(error = %err, "there was an issue getting the check deadline, using the default");
            DEFAULT_CHECK_TIMEOUT
        }
    };
    info!(?timeout, "check time limit set");
    timeout
}

/// Time left until `deadline` minus the safety margin, saturating to zero
/// when the deadline is already in the past.
fn timeout_until(deadline: SystemTime, now: SystemTime) -> Duration {
    deadline
        .duration_since(now + DEADLINE_SAFETY_MARGIN)
        .unwrap_or(Duration::ZERO)
}
