//! Binary entrypoint for the SSL handshake check.
//!
//! Flow: read configuration from the environment, wait briefly for the
//! Kuberhealthy reporting endpoint to become reachable, run one handshake
//! check under the configured deadline, report the outcome.

use std::process;
use std::sync::mpsc;
use std::time::Duration;

use tracing::{error, info, warn};

use ssl_handshake_check::check::{CheckEvent, Checker, Outcome};
use ssl_handshake_check::{config, init_tracing, kuberhealthy};

/// How long to wait for the reporting endpoint before checking anyway.
const READINESS_TIMEOUT: Duration = Duration::from_secs(60);

fn main() {
    init_tracing();

    // Without a reporting URL no outcome can be delivered at all.
    let reporter = match kuberhealthy::Client::from_env() {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "cannot build Kuberhealthy reporting client");
            process::exit(1);
        }
    };

    let cfg = match config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            report_failure_and_exit(&reporter, err.to_string());
            return;
        }
    };

    // Readiness gate; failure is logged inside, never fatal.
    reporter.wait_until_ready(READINESS_TIMEOUT);

    let (events_tx, events_rx) = mpsc::channel();
    let interrupt_tx = events_tx.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(CheckEvent::Interrupted);
    }) {
        warn!(error = %err, "could not install interrupt handler");
    }

    let checker = Checker::new(&cfg);
    let outcome = checker.run(events_tx, events_rx);

    match outcome {
        Outcome::Success => match reporter.report_success() {
            Ok(()) => info!("reported success to Kuberhealthy"),
            Err(err) => error!(error = %err, "error reporting success to Kuberhealthy"),
        },
        Outcome::Failure { reason } => {
            error!(domain = %cfg.domain_name, %reason, "SSL handshake check failed");
            match reporter.report_failure(vec![reason]) {
                Ok(()) => info!("reported failure to Kuberhealthy"),
                Err(err) => error!(error = %err, "error reporting failure to Kuberhealthy"),
            }
        }
    }
}

/// Deliver a failure report for an error that aborted the run before any
/// check could start, then exit. Failing to deliver it is fatal.
fn report_failure_and_exit(reporter: &kuberhealthy::Client, reason: String) {
    if let Err(err) = reporter.report_failure(vec![reason]) {
        error!(error = %err, "error reporting failure to Kuberhealthy");
        process::exit(1);
    }
    process::exit(0);
}
