//! Thin wrapper over `rustls`/`tokio-rustls` for the optional TLS listener.
//!
//! A server can run entirely in plaintext. TLS only activates once both a
//! certificate and a private key path are configured; any other combination
//! (neither set, or only one set) is treated as "TLS unavailable" rather
//! than an error, mirroring a null-safe accept/connect contract.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};

/// Errors that can occur while building a TLS listener configuration.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// The certificate or key file could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The PEM content did not contain a usable certificate chain or key.
    #[error("no usable {0} found in PEM file")]
    NoPemItems(&'static str),

    /// `rustls` rejected the certificate chain, key, or client-auth roots.
    #[error("TLS configuration rejected: {0}")]
    Rustls(#[from] rustls::Error),
}

/// A built server-side TLS configuration, ready to wrap accepted TCP
/// connections. Constructing one always succeeds or fails outright; there
/// is no partially-configured state once it exists.
pub struct TlsAcceptorConfig {
    server_config: Arc<ServerConfig>,
    client_auth_required: bool,
}

impl TlsAcceptorConfig {
    /// Loads a certificate chain and private key from disk and builds a
    /// `rustls` server configuration requiring TLS 1.2 or newer.
    ///
    /// `client_ca_path`, when set, enables mutual TLS: client certificates
    /// are verified against the given CA bundle and connections without one
    /// are rejected during the handshake.
    pub fn load(
        cert_path: &Path,
        key_path: &Path,
        client_ca_path: Option<&Path>,
    ) -> Result<Self, TlsError> {
        let cert_chain = load_certs(cert_path)?;
        let private_key = load_private_key(key_path)?;

        let client_auth_required = client_ca_path.is_some();
        let client_verifier = match client_ca_path {
            Some(ca_path) => {
                let mut roots = RootCertStore::empty();
                for cert in load_certs(ca_path)? {
                    roots.add(cert).map_err(TlsError::Rustls)?;
                }
                WebPkiClientVerifier::builder(Arc::new(roots))
                    .build()
                    .map_err(|e| {
                        tracing::warn!(error = %e, "client CA verifier rejected");
                        TlsError::NoPemItems("client CA")
                    })?
            }
            None => WebPkiClientVerifier::no_client_auth(),
        };

        let config = ServerConfig::builder()
            .with_client_cert_verifier(client_verifier)
            .with_single_cert(cert_chain, private_key)?;

        Ok(Self {
            server_config: Arc::new(config),
            client_auth_required,
        })
    }

    /// Whether this configuration is ready to accept connections. Always
    /// `true` once constructed; kept as an explicit predicate so callers
    /// mirror the "is TLS available" check even when they hold an
    /// `Option<TlsAcceptorConfig>` rather than matching on it directly.
    #[must_use]
    pub fn is_available(&self) -> bool {
        true
    }

    /// Whether handshakes require a verified client certificate.
    #[must_use]
    pub fn requires_client_auth(&self) -> bool {
        self.client_auth_required
    }

    /// The built `rustls` server configuration, for handing to a
    /// connection-level TLS acceptor (e.g. `axum_server::tls_rustls::RustlsConfig::from_config`).
    #[must_use]
    pub fn server_config(&self) -> Arc<ServerConfig> {
        Arc::clone(&self.server_config)
    }

    /// A short human-readable description of the negotiated protocol
    /// floor, for logs and health reports.
    #[must_use]
    pub fn version_string(&self) -> &'static str {
        "TLS 1.2+"
    }

    /// Days until the leaf certificate expires, if that can be determined.
    ///
    /// Left unimplemented: reading a certificate's `notAfter` field needs a
    /// DER/X.509 parser, and none of this stack's dependencies carry one.
    /// Always returns `None` rather than a wrong answer.
    #[must_use]
    pub fn cert_days_remaining(&self) -> Option<i64> {
        None
    }
}

/// Extracts the verified peer's certificate common name from a completed
/// handshake, when client auth was performed.
///
/// Same limitation as [`TlsAcceptorConfig::cert_days_remaining`]: without a
/// certificate parser this can't decode the subject DN, so it always
/// returns `None`. Kept as a named seam so a parser can be dropped in
/// later without touching call sites.
#[must_use]
pub fn peer_common_name(_connection: &rustls::ServerConnection) -> Option<String> {
    None
}

fn load_certs(path: &Path) -> Result<Vec<rustls::pki_types::CertificateDer<'static>>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let certs: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(file))
        .filter_map(Result::ok)
        .collect();
    if certs.is_empty() {
        return Err(TlsError::NoPemItems("certificate"));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<rustls::pki_types::PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .ok()
        .flatten()
        .ok_or(TlsError::NoPemItems("private key"))
}
