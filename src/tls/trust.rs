//! Trust pool construction
//!
//! Decides which set of root certificate authorities a check run trusts.
//! Two mutually exclusive modes:
//!
//! - A self-signed certificate mounted at the well-known path is an
//!   explicit operator signal meaning "trust only this". The pool then
//!   contains exactly the certificates from that file and nothing else.
//! - Otherwise the platform's default trust store is used, and the
//!   cluster certificate authority (mounted into pods by the
//!   orchestration platform) is appended when readable. The cluster CA
//!   is a supplement, not a replacement, so problems appending it are
//!   logged and never fail pool construction.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use openssl::error::ErrorStack;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::X509;
use tracing::{info, warn};

/// Path for custom self-signed certificates mounted into the pod.
pub const SELF_SIGNED_CERT_PATH: &str = "/etc/ssl/selfsign/certificate.crt";

/// Kubernetes CA path mounted in pods by the service account.
pub const CLUSTER_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Filesystem locations of trust material.
///
/// Injected rather than hard-coded so tests can point the builder at
/// fixture files. `Default` yields the well-known pod mount paths.
#[derive(Debug, Clone)]
pub struct TrustPaths {
    /// Self-signed certificate; presence switches the pool to exclusive trust.
    pub self_signed_cert: PathBuf,
    /// Cluster certificate authority, appended to system trust when readable.
    pub cluster_ca: PathBuf,
}

impl Default for TrustPaths {
    fn default() -> Self {
        TrustPaths {
            self_signed_cert: PathBuf::from(SELF_SIGNED_CERT_PATH),
            cluster_ca: PathBuf::from(CLUSTER_CA_PATH),
        }
    }
}

/// Which trust mode a pool was built in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustSource {
    /// Exactly the certificates from the mounted self-signed file.
    SelfSigned,
    /// The system trust store, plus the cluster CA when it was readable.
    SystemPlusCluster,
}

/// Trust pool errors
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("error reading certificate file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error parsing certs from file {path}")]
    CertParse { path: PathBuf },

    #[error("system trust store unavailable: {0}")]
    SystemStore(ErrorStack),

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] ErrorStack),
}

/// An immutable set of trusted certificate authorities.
///
/// Built once per check run and consumed by value by the handshake, so
/// exclusive ownership is enforced by the type system.
pub struct TrustAnchors {
    store: X509Store,
    source: TrustSource,
}

impl std::fmt::Debug for TrustAnchors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // X509Store has no Debug impl; show only the trust mode.
        f.debug_struct("TrustAnchors")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl TrustAnchors {
    /// Which trust mode this pool was built in.
    pub fn source(&self) -> TrustSource {
        self.source
    }

    pub(crate) fn into_store(self) -> X509Store {
        self.store
    }
}

/// Build the trust pool for a check run.
///
/// Presence of the self-signed file selects exclusive trust; any problem
/// with a present file is fatal. In the default mode the system store
/// must be available, while the cluster CA append is best-effort.
pub fn build_trust_anchors(paths: &TrustPaths) -> Result<TrustAnchors, TrustError> {
    if paths.self_signed_cert.exists() {
        info!(
            path = %paths.self_signed_cert.display(),
            "using self signed CA mounted on disk"
        );
        return self_signed_pool(&paths.self_signed_cert);
    }

    info!(
        path = %paths.cluster_ca.display(),
        "using default certs plus cluster certificate authority"
    );
    let mut builder = X509StoreBuilder::new()?;
    builder
        .set_default_paths()
        .map_err(TrustError::SystemStore)?;

    if let Err(err) = append_cluster_ca(&mut builder, &paths.cluster_ca) {
        warn!(
            error = %err,
            "could not append cluster certificate authority; continuing with system trust"
        );
    }

    Ok(TrustAnchors {
        store: builder.build(),
        source: TrustSource::SystemPlusCluster,
    })
}

/// Build a pool containing exactly the certificates from `path`.
fn self_signed_pool(path: &Path) -> Result<TrustAnchors, TrustError> {
    let certs = certs_from_file(path)?;

    let mut builder = X509StoreBuilder::new()?;
    for cert in certs {
        builder.add_cert(cert)?;
    }
    info!("self signed certificate file appended to cert pool");

    Ok(TrustAnchors {
        store: builder.build(),
        source: TrustSource::SelfSigned,
    })
}

/// Append the cluster CA certificates to the pool under construction.
fn append_cluster_ca(builder: &mut X509StoreBuilder, path: &Path) -> Result<(), TrustError> {
    let certs = certs_from_file(path)?;
    for cert in certs {
        builder.add_cert(cert)?;
    }
    info!("cluster certificate authority appended to cert pool");
    Ok(())
}

/// Read and parse all PEM certificates from a file.
///
/// A file that exists but yields no certificate is a parse error; an
/// empty pool must never be silently accepted as trusted.
fn certs_from_file(path: &Path) -> Result<Vec<X509>, TrustError> {
    let pem = fs::read(path).map_err(|source| TrustError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let certs = X509::stack_from_pem(&pem).map_err(|_| TrustError::CertParse {
        path: path.to_path_buf(),
    })?;
    if certs.is_empty() {
        return Err(TrustError::CertParse {
            path: path.to_path_buf(),
        });
    }

    Ok(certs)
}
