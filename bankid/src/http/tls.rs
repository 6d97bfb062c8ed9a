//! Client certificate, private key and CA bundle for mutual TLS with the RP API.
//!
//! The material is read once at startup. Anything missing or unparsable is a
//! provisioning error and the service must not start.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::*;
use reqwest::{Certificate, Identity};
use rustls_pemfile::certs;

use crate::error::{provisioning_error, Error, ProvisioningErrorKind};
use crate::rp::Environment;

const CERT_FILE: &str = "cert.pem";
const KEY_FILE: &str = "key.pem";
const CA_FILE: &str = "ca-cert.pem";

/// Locations of the PEM files for one environment.
#[derive(Debug, Clone)]
pub struct TlsPaths {
    cert: PathBuf,
    key: PathBuf,
    ca: PathBuf,
}

impl TlsPaths {
    pub fn new(cert: PathBuf, key: PathBuf, ca: PathBuf) -> Self {
        Self { cert, key, ca }
    }

    /// `<dir>/<env>/cert.pem`, `<dir>/<env>/key.pem` and `<dir>/<env>/ca-cert.pem`.
    pub fn for_environment(dir: impl AsRef<Path>, environment: Environment) -> Self {
        let base = dir.as_ref().join(environment.as_str());
        Self {
            cert: base.join(CERT_FILE),
            key: base.join(KEY_FILE),
            ca: base.join(CA_FILE),
        }
    }

    pub fn cert_path(&self) -> &Path {
        &self.cert
    }

    pub fn key_path(&self) -> &Path {
        &self.key
    }

    pub fn ca_path(&self) -> &Path {
        &self.ca
    }
}

/// Parsed client identity and trusted CA certificates.
#[derive(Clone)]
pub struct TlsMaterial {
    identity: Identity,
    roots: Vec<Certificate>,
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("roots", &self.roots.len())
            .finish_non_exhaustive()
    }
}

impl TlsMaterial {
    /// Load the material for `environment` from the certificate directory.
    pub fn load_for_environment(
        dir: impl AsRef<Path>,
        environment: Environment,
    ) -> Result<Self, Error> {
        Self::load(&TlsPaths::for_environment(dir, environment))
    }

    /// Load and validate the client certificate, key and CA bundle.
    pub fn load(paths: &TlsPaths) -> Result<Self, Error> {
        let mut pem = read_file(paths.cert_path())?;
        pem.push(b'\n');
        pem.extend(read_file(paths.key_path())?);

        let identity = Identity::from_pem(&pem).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: crate::ErrorKind::Provisioning(ProvisioningErrorKind::InvalidIdentity),
        })?;

        let roots = load_roots(paths.ca_path())?;
        info!(
            "Loaded BankID client certificate {} with {} trusted CA certificate(s)",
            paths.cert_path().display(),
            roots.len()
        );

        Ok(Self { identity, roots })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn roots(&self) -> &[Certificate] {
        &self.roots
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|e| {
        error!("Failed to read TLS material {}: {}", path.display(), e);
        provisioning_error(
            ProvisioningErrorKind::MissingFile,
            &format!("{}: {}", path.display(), e),
        )
    })
}

fn load_roots(path: &Path) -> Result<Vec<Certificate>, Error> {
    let file = File::open(path).map_err(|e| {
        provisioning_error(
            ProvisioningErrorKind::MissingFile,
            &format!("{}: {}", path.display(), e),
        )
    })?;
    let mut reader = BufReader::new(file);
    let ders = certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            provisioning_error(
                ProvisioningErrorKind::InvalidCa,
                &format!("{}: {}", path.display(), e),
            )
        })?;
    if ders.is_empty() {
        return Err(provisioning_error(
            ProvisioningErrorKind::InvalidCa,
            &format!("CA bundle is empty: {}", path.display()),
        ));
    }

    ders.iter()
        .map(|der| {
            Certificate::from_der(der.as_ref()).map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: crate::ErrorKind::Provisioning(ProvisioningErrorKind::InvalidCa),
            })
        })
        .collect()
}
