//! Message sealing using `XChaCha20-Poly1305`
//!
//! [`seal_with_nonce`] and [`open`] are pure. [`seal`] draws the nonce from
//! an injected random source.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};

use super::derivation::DerivedKey;
use crate::{
    error::{CodecError, CodecResult},
    random::SecureRandom,
};

/// Size of the random `XChaCha20` nonce (24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// A sealed payload: the nonce and the ciphertext with its tag appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBox {
    /// The 24-byte `XChaCha20` nonce
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext including 16-byte Poly1305 tag
    pub ciphertext: Vec<u8>,
}

impl SealedBox {
    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_SIZE)
    }
}

/// Seal `plaintext` under `key` with a fresh random nonce.
///
/// # Security
///
/// - A new nonce is drawn for every call; 192-bit random nonces make reuse
///   under one key negligible
/// - `rng` MUST be cryptographically secure in production
pub fn seal(
    key: &DerivedKey,
    plaintext: &[u8],
    associated_data: &[u8],
    rng: &impl SecureRandom,
) -> SealedBox {
    let nonce = rng.random_array::<NONCE_SIZE>();
    seal_with_nonce(key, nonce, plaintext, associated_data)
}

/// Seal `plaintext` under `key` with a caller-provided nonce.
///
/// Callers MUST NOT reuse a nonce with the same key.
pub fn seal_with_nonce(
    key: &DerivedKey,
    nonce: [u8; NONCE_SIZE],
    plaintext: &[u8],
    associated_data: &[u8],
) -> SealedBox {
    let cipher = XChaCha20Poly1305::new(key.key().into());
    let payload = Payload { msg: plaintext, aad: associated_data };

    let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), payload) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    SealedBox { nonce, ciphertext }
}

/// Open a sealed payload.
///
/// # Errors
///
/// - `AuthenticationFailed`: wrong key, wrong associated data, truncated
///   ciphertext or any modified byte
pub fn open(
    key: &DerivedKey,
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    associated_data: &[u8],
) -> CodecResult<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(CodecError::AuthenticationFailed);
    }

    let cipher = XChaCha20Poly1305::new(key.key().into());
    let payload = Payload { msg: ciphertext, aad: associated_data };

    cipher
        .decrypt(XNonce::from_slice(nonce), payload)
        .map_err(|_| CodecError::AuthenticationFailed)
}
