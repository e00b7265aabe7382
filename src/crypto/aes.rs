use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// The size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Failures of the symmetric cipher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid key length: expected {KEY_SIZE} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid nonce length: expected {NONCE_SIZE} bytes, got {0}")]
    InvalidNonceLength(usize),

    #[error("malformed ciphertext: {0}")]
    Malformed(String),

    #[error("encryption failed")]
    Encrypt,

    /// Authentication tag mismatch: tampered payload or wrong key.
    #[error("decryption failed")]
    Decrypt,
}

/// A secure key wrapper that ensures the key is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecureKey([u8; KEY_SIZE]);

impl SecureKey {
    /// Creates a new `SecureKey` from a byte array.
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self(key)
    }

    /// Copies a key out of a slice, rejecting anything but 32 bytes.
    pub fn from_slice(key: &[u8]) -> Result<Self, CipherError> {
        let key: [u8; KEY_SIZE] = key
            .try_into()
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
        Ok(Self(key))
    }

    /// Returns a reference to the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SecureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecureKey(**redacted**)")
    }
}

/// Generates a new random AES-GCM nonce.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

fn cipher_for(key: &[u8]) -> Result<Aes256Gcm, CipherError> {
    Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))
}

fn check_nonce(nonce: &[u8]) -> Result<(), CipherError> {
    if nonce.len() != NONCE_SIZE {
        return Err(CipherError::InvalidNonceLength(nonce.len()));
    }
    Ok(())
}

/// Encrypts `plaintext` with AES-256-GCM under a caller supplied nonce.
///
/// Deterministic for a fixed key/nonce pair. Reusing a nonce across distinct
/// plaintexts breaks confidentiality, so callers without their own nonce
/// bookkeeping should use [`EncryptedBlob::seal`].
pub fn encrypt(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = cipher_for(key)?;
    check_nonce(nonce)?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CipherError::Encrypt)
}

/// Decrypts a ciphertext produced by [`encrypt`].
pub fn decrypt(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = cipher_for(key)?;
    check_nonce(nonce)?;

    if ciphertext.len() < TAG_SIZE {
        return Err(CipherError::Malformed(format!(
            "ciphertext is {} bytes, shorter than the {} byte tag",
            ciphertext.len(),
            TAG_SIZE
        )));
    }

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CipherError::Decrypt)
}

/// Ciphertext plus the nonce it was sealed with.
///
/// Wire layout: `[ciphertext || nonce]`, nonce is the trailing 12 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
}

impl EncryptedBlob {
    /// Encrypts under a freshly generated nonce.
    pub fn seal(key: &SecureKey, plaintext: &[u8]) -> Result<Self, CipherError> {
        let nonce = generate_nonce();
        let ciphertext = encrypt(key.as_bytes(), &nonce, plaintext)?;
        Ok(Self { ciphertext, nonce })
    }

    pub fn open(&self, key: &SecureKey) -> Result<Vec<u8>, CipherError> {
        decrypt(key.as_bytes(), &self.nonce, &self.ciphertext)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.ciphertext.len() + NONCE_SIZE);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.nonce);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::Malformed(format!(
                "blob is {} bytes, need at least {}",
                bytes.len(),
                NONCE_SIZE + TAG_SIZE
            )));
        }

        let (ciphertext, nonce) = bytes.split_at(bytes.len() - NONCE_SIZE);
        let nonce: [u8; NONCE_SIZE] = nonce
            .try_into()
            .map_err(|_| CipherError::InvalidNonceLength(nonce.len()))?;

        Ok(Self {
            ciphertext: ciphertext.to_vec(),
            nonce,
        })
    }

    /// Standard base64 of [`Self::to_bytes`], the form kept in the cache.
    pub fn encode(&self) -> String {
        general_purpose::STANDARD.encode(self.to_bytes())
    }

    pub fn decode(encoded: &str) -> Result<Self, CipherError> {
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| CipherError::Malformed(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}
