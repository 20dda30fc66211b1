//! Client TLS configuration and certificate loading.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("{kind} file not found: {path:?}")]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("failed to read {kind} file {path:?}: {source}")]
    Read {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no PEM {kind} found in {path:?}")]
    Empty { kind: &'static str, path: PathBuf },

    #[error("invalid TLS material: {0}")]
    Invalid(#[source] reqwest::Error),
}

/// Client certificate, private key, and CA bundle for mutual TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub ca_path: PathBuf,
}

impl TlsMaterial {
    pub fn new(
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
        ca_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
            ca_path: ca_path.into(),
        }
    }
}

fn read_pem(kind: &'static str, path: &Path) -> Result<Vec<u8>, TlsError> {
    if !path.exists() {
        return Err(TlsError::NotFound {
            kind,
            path: path.to_path_buf(),
        });
    }
    fs::read(path).map_err(|source| TlsError::Read {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

fn count_certs(kind: &'static str, path: &Path, pem: &[u8]) -> Result<usize, TlsError> {
    let mut reader = BufReader::new(pem);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            kind,
            path: path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::Empty {
            kind,
            path: path.to_path_buf(),
        });
    }
    Ok(certs.len())
}

/// Apply client identity and trusted CA to a `reqwest` client builder.
///
/// Load failures are returned to the caller; nothing here exits the
/// process.
pub fn configure_client(
    builder: reqwest::ClientBuilder,
    material: &TlsMaterial,
) -> Result<reqwest::ClientBuilder, TlsError> {
    let cert_pem = read_pem("certificate", &material.cert_path)?;
    let key_pem = read_pem("private key", &material.key_path)?;
    let ca_pem = read_pem("CA", &material.ca_path)?;

    count_certs("certificate", &material.cert_path, &cert_pem)?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_pem.as_slice()))
        .map_err(|source| TlsError::Read {
            kind: "private key",
            path: material.key_path.clone(),
            source,
        })?;
    if key.is_none() {
        return Err(TlsError::Empty {
            kind: "private key",
            path: material.key_path.clone(),
        });
    }
    let ca_count = count_certs("CA", &material.ca_path, &ca_pem)?;

    let mut identity_pem = cert_pem;
    identity_pem.push(b'\n');
    identity_pem.extend_from_slice(&key_pem);
    let identity = reqwest::Identity::from_pem(&identity_pem).map_err(TlsError::Invalid)?;

    let mut builder = builder.use_rustls_tls().identity(identity);
    for ca in reqwest::Certificate::from_pem_bundle(&ca_pem).map_err(TlsError::Invalid)? {
        builder = builder.add_root_certificate(ca);
    }

    tracing::debug!(
        cert = ?material.cert_path,
        ca = ?material.ca_path,
        ca_count,
        "Client TLS configured"
    );
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_certificate() {
        let material = TlsMaterial::new("/no/cert.pem", "/no/key.pem", "/no/ca.pem");
        let err = configure_client(reqwest::Client::builder(), &material).unwrap_err();
        assert!(matches!(err, TlsError::NotFound { kind: "certificate", .. }));
    }

    #[test]
    fn test_file_without_pem_blocks() {
        let mut junk = tempfile::NamedTempFile::new().unwrap();
        writeln!(junk, "not a certificate").unwrap();
        let material = TlsMaterial::new(junk.path(), junk.path(), junk.path());

        let err = configure_client(reqwest::Client::builder(), &material).unwrap_err();
        assert!(matches!(err, TlsError::Empty { kind: "certificate", .. }));
    }
}
