//! Trust pool selection and leniency properties
//!
//! Covers the two mutually exclusive trust modes and the required
//! non-fatal-degradation behavior around the cluster certificate
//! authority file.

use std::fs;

use tempfile::TempDir;

use ssl_handshake_check::tls::trust::{
    build_trust_anchors, TrustError, TrustPaths, TrustSource,
};

/// Trust paths pointing into a scratch directory; neither file exists
/// until a test writes it.
fn paths_in(dir: &TempDir) -> TrustPaths {
    TrustPaths {
        self_signed_cert: dir.path().join("certificate.crt"),
        cluster_ca: dir.path().join("ca.crt"),
    }
}

fn throwaway_cert_pem(name: &str) -> String {
    rcgen::generate_simple_self_signed(vec![name.to_string()])
        .unwrap()
        .serialize_pem()
        .unwrap()
}

#[test]
fn self_signed_cert_selects_exclusive_trust() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    fs::write(&paths.self_signed_cert, throwaway_cert_pem("localhost")).unwrap();
    // A cluster CA sitting next to it must be ignored in this mode.
    fs::write(&paths.cluster_ca, throwaway_cert_pem("cluster.internal")).unwrap();

    let anchors = build_trust_anchors(&paths).unwrap();
    assert_eq!(anchors.source(), TrustSource::SelfSigned);
}

#[test]
fn malformed_self_signed_cert_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    fs::write(&paths.self_signed_cert, "this is not PEM certificate data").unwrap();

    let err = build_trust_anchors(&paths).unwrap_err();
    assert!(matches!(err, TrustError::CertParse { .. }), "got {err:?}");
}

#[test]
fn empty_self_signed_cert_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    fs::write(&paths.self_signed_cert, "").unwrap();

    let err = build_trust_anchors(&paths).unwrap_err();
    assert!(matches!(err, TrustError::CertParse { .. }), "got {err:?}");
}

#[test]
fn system_trust_alone_when_no_files_present() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);

    let anchors = build_trust_anchors(&paths).unwrap();
    assert_eq!(anchors.source(), TrustSource::SystemPlusCluster);
}

#[test]
fn malformed_cluster_ca_does_not_fail_the_pool() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    fs::write(&paths.cluster_ca, "garbage, definitely not a certificate").unwrap();

    let anchors = build_trust_anchors(&paths).unwrap();
    assert_eq!(anchors.source(), TrustSource::SystemPlusCluster);
}

#[test]
fn valid_cluster_ca_is_appended() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    fs::write(&paths.cluster_ca, throwaway_cert_pem("cluster.internal")).unwrap();

    let anchors = build_trust_anchors(&paths).unwrap();
    assert_eq!(anchors.source(), TrustSource::SystemPlusCluster);
}
