use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the server from starting or serving.
///
/// Per-request failures never show up here: they are answered with an HTTP
/// response and the server keeps running.
#[derive(Debug, Error)]
pub enum Error {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A certificate or key file could not be read or parsed.
    #[error("failed to read {}: {source}", path.display())]
    Certificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The certificate file contains no certificates.
    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    /// The key file contains no private key.
    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    /// rustls rejected the certificate material.
    #[error("TLS configuration error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for dav-serve operations.
pub type Result<T> = std::result::Result<T, Error>;
