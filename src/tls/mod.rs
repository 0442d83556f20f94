//! TLS trust-pool and handshake verification
//!
//! This module owns the core of the SSL handshake check: deciding which
//! certificate authorities to trust and performing a single verifying
//! TLS handshake against a target.
//!
//! # Architecture
//!
//! 1. `trust` builds a `TrustAnchors` pool, choosing between an
//!    operator-mounted self-signed certificate (exclusive trust) and the
//!    system store supplemented with the cluster certificate authority.
//! 2. `handshake` consumes the pool, dials the target with a bounded
//!    connect timeout and runs the handshake with verification always on
//!    and a TLS 1.2 protocol floor.
//!
//! The pool is built at most once per check run and handed to the
//! handshake by value; nothing mutates it after construction.
//!
//! # Examples
//!
//! ```no_run
//! use ssl_handshake_check::tls::{build_trust_anchors, handshake, TrustPaths};
//! use url::Url;
//!
//! let anchors = build_trust_anchors(&TrustPaths::default()).unwrap();
//! let site = Url::parse("https://example.com:443").unwrap();
//! handshake(&site, anchors).unwrap();
//! ```

pub mod handshake;
pub mod trust;

pub use handshake::{handshake, HandshakeError, CONNECT_TIMEOUT};
pub use trust::{build_trust_anchors, TrustAnchors, TrustError, TrustPaths, TrustSource};
