//! SSL handshake check for Kuberhealthy
//!
//! Verifies that a remote host completes a valid TLS handshake on a given
//! port and reports pass/fail to the Kuberhealthy reporting endpoint.
//! Trust comes either from the system store supplemented with the cluster
//! certificate authority, or exclusively from a locally mounted
//! self-signed certificate.

pub mod check;
pub mod config;
pub mod kuberhealthy;
pub mod tls;

/// Initialize tracing output for the process.
///
/// Honors `RUST_LOG`, defaulting to info. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
