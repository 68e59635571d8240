//! TLS material loading for HTTPS mode.

use crate::error::{Error, Result};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig as RustlsConfig;
use tokio_rustls::TlsAcceptor;

/// Build a TLS acceptor from a PEM certificate chain and a PEM private key.
pub fn load_acceptor(cert_file: &Path, key_file: &Path) -> Result<TlsAcceptor> {
    let certs = load_certs(cert_file)?;
    let key = load_private_key(key_file)?;
    debug!(
        "Loaded {} certificate(s) from {}",
        certs.len(),
        cert_file.display()
    );

    let mut config = RustlsConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    // Connections are served with hyper's HTTP/1 builder, so h2 is never offered.
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = open_pem(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|source| Error::Certificate {
            path: path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(Error::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let mut reader = open_pem(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| Error::Certificate {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| Error::NoPrivateKey(path.to_path_buf()))
}

fn open_pem(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| Error::Certificate {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_self_signed(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let cert_path = dir.join("cert.pem");
        let key_path = dir.join("key.pem");
        std::fs::write(&cert_path, certified.cert.pem()).unwrap();
        std::fs::write(&key_path, certified.key_pair.serialize_pem()).unwrap();
        (cert_path, key_path)
    }

    #[test]
    fn loads_self_signed_pair() {
        let temp = TempDir::new().unwrap();
        let (cert, key) = write_self_signed(temp.path());
        let acceptor = load_acceptor(&cert, &key).unwrap();
        // HTTP/1.1 only; no h2
        assert_eq!(acceptor.config().alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn missing_certificate_is_reported_with_path() {
        let temp = TempDir::new().unwrap();
        let (_, key) = write_self_signed(temp.path());
        let missing = temp.path().join("missing.pem");

        match load_acceptor(&missing, &key) {
            Err(Error::Certificate { path, .. }) => assert_eq!(path, missing),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("missing certificate must fail"),
        }
    }

    #[test]
    fn swapped_files_are_rejected() {
        let temp = TempDir::new().unwrap();
        let (cert, key) = write_self_signed(temp.path());

        assert!(matches!(
            load_acceptor(&key, &key),
            Err(Error::NoCertificates(_))
        ));
        assert!(matches!(
            load_acceptor(&cert, &cert),
            Err(Error::NoPrivateKey(_))
        ));
    }
}
