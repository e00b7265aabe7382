use std::path::{Path, PathBuf};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use thiserror::Error;

/// The only signing algorithm the service issues or accepts.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

const PROBE_MESSAGE: &[u8] = b"devoria.keypair.probe";

/// Failures while loading the RSA keypair at startup.
#[derive(Debug, Error)]
pub enum KeyLoadError {
    #[error("failed to read key file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {kind} key encoding: {source}")]
    Parse {
        kind: &'static str,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    #[error("private key cannot sign: {0}")]
    Unusable(#[source] jsonwebtoken::errors::Error),

    #[error("private and public keys do not belong to the same pair")]
    Mismatch,
}

/// The process-wide RSA keypair.
///
/// Built once at startup and shared behind an `Arc`; there are no setters, so
/// concurrent readers need no synchronization.
pub struct KeyMaterial {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyMaterial {
    /// Reads a PEM private key and PEM public key from disk.
    pub fn load(
        private_path: impl AsRef<Path>,
        public_path: impl AsRef<Path>,
    ) -> Result<Self, KeyLoadError> {
        let private_pem = read_key_file(private_path.as_ref())?;
        let public_pem = read_key_file(public_path.as_ref())?;
        Self::from_pem(&private_pem, &public_pem)
    }

    /// Parses both halves and proves they form a pair by signing a probe.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, KeyLoadError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem).map_err(|source| {
            KeyLoadError::Parse {
                kind: "private",
                source,
            }
        })?;
        let decoding = DecodingKey::from_rsa_pem(public_pem).map_err(|source| {
            KeyLoadError::Parse {
                kind: "public",
                source,
            }
        })?;

        let material = Self { encoding, decoding };
        material.self_check()?;

        tracing::debug!("RSA keypair loaded and verified");
        Ok(material)
    }

    fn self_check(&self) -> Result<(), KeyLoadError> {
        let signature = jsonwebtoken::crypto::sign(PROBE_MESSAGE, &self.encoding, SIGNING_ALGORITHM)
            .map_err(KeyLoadError::Unusable)?;

        match jsonwebtoken::crypto::verify(
            &signature,
            PROBE_MESSAGE,
            &self.decoding,
            SIGNING_ALGORITHM,
        ) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(KeyLoadError::Mismatch),
        }
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}

fn read_key_file(path: &Path) -> Result<Vec<u8>, KeyLoadError> {
    std::fs::read(path).map_err(|source| KeyLoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}
