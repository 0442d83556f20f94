//! TLS handshake execution
//!
//! Performs exactly one verifying TLS handshake against a target using a
//! supplied trust pool. Certificate verification is never skipped and the
//! minimum protocol version is TLS 1.2.
//!
//! The TCP dial has its own fixed timeout, independent of the overall
//! check deadline; deadline enforcement for the whole attempt belongs to
//! the checker that schedules this call.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use openssl::error::ErrorStack;
use openssl::ssl::{Ssl, SslContextBuilder, SslMethod, SslVerifyMode, SslVersion};
use tracing::debug;
use url::Url;

use super::trust::TrustAnchors;

/// Timeout for the TCP connect phase. Bounds only the dial, not the TLS
/// negotiation itself.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handshake errors
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("the url specified {0} was not an https URL")]
    Scheme(String),

    #[error("could not resolve an address for {0}")]
    Resolve(String),

    #[error("error making connection to perform TLS handshake: {0}")]
    Connect(#[from] io::Error),

    #[error("unable to perform TLS handshake: {0}")]
    Handshake(String),

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] ErrorStack),
}

/// Perform a single verifying TLS handshake against `site`.
///
/// The trust pool is consumed: it belongs to exactly one handshake
/// attempt. Verification errors (untrusted chain, hostname mismatch,
/// expired certificate, protocol floor rejection) surface as
/// [`HandshakeError::Handshake`] before any application data would be
/// exchanged. The connection is released on every exit path.
///
/// The scheme guard never fires when called through the checker, which
/// always builds https URLs, but this primitive is public and external
/// callers get a deterministic error for anything else.
pub fn handshake(site: &Url, anchors: TrustAnchors) -> Result<(), HandshakeError> {
    if site.scheme() != "https" {
        return Err(HandshakeError::Scheme(site.to_string()));
    }
    let host = site
        .host_str()
        .ok_or_else(|| HandshakeError::Scheme(site.to_string()))?
        .to_string();
    let port = site.port_or_known_default().unwrap_or(443);

    debug!(source = ?anchors.source(), %host, port, "starting TLS handshake");

    let addr = (host.as_str(), port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| HandshakeError::Resolve(format!("{}:{}", host, port)))?;
    let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;

    // Raw context rather than SslConnector: the connector would merge the
    // default verify paths into the store, breaking self-signed exclusivity.
    let mut builder = SslContextBuilder::new(SslMethod::tls_client())?;
    builder.set_verify(SslVerifyMode::PEER);
    builder.set_min_proto_version(Some(SslVersion::TLS1_2))?;
    builder.set_cert_store(anchors.into_store());
    let ctx = builder.build();

    let mut ssl = Ssl::new(&ctx)?;
    ssl.set_hostname(&host)?;
    // Hostname verification must be requested explicitly on the raw path.
    ssl.param_mut().set_host(&host)?;

    // Explicit handshake; nothing is written to the connection.
    let mut tls = ssl
        .connect(tcp)
        .map_err(|err| HandshakeError::Handshake(err.to_string()))?;

    debug!(%host, port, "TLS handshake completed");
    let _ = tls.shutdown();
    Ok(())
}
