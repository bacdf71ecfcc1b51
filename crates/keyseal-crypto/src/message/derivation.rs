//! Shared key derivation using X25519 and HKDF

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{
    error::{CodecError, CodecResult},
    keys::{KeyPair, PUBLIC_KEY_SIZE, PublicKey},
};

/// Size of a derived symmetric key (32 bytes)
pub const DERIVED_KEY_SIZE: usize = 32;

/// Domain separation label mixed into every key derivation.
///
/// Keys derived for different message kinds are independent even when the
/// same two identities are involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextLabel {
    /// Encrypted message between two long-term identities
    Message,
    /// Harvesting delegation from an ephemeral key to a node
    Delegation,
}

impl ContextLabel {
    /// ASCII label bytes fed into HKDF info.
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Message => b"message",
            Self::Delegation => b"delegation",
        }
    }
}

/// A symmetric key derived for one message.
///
/// Used for a single seal or open and then dropped. Zeroized on drop.
pub struct DerivedKey {
    key: [u8; DERIVED_KEY_SIZE],
    label: ContextLabel,
}

impl DerivedKey {
    /// 32-byte symmetric key for XChaCha20-Poly1305 AEAD.
    pub fn key(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.key
    }

    /// Context this key was derived for.
    pub fn label(&self) -> ContextLabel {
        self.label
    }

    #[cfg(test)]
    pub(crate) fn from_raw(key: [u8; DERIVED_KEY_SIZE], label: ContextLabel) -> Self {
        Self { key, label }
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Derive the symmetric key shared by `own` and `other`.
///
/// Both parties obtain the same key: `derive_shared_key(a, b.public, label)`
/// equals `derive_shared_key(b, a.public, label)`.
///
/// # Construction
///
/// ```text
/// raw  = X25519(own.private, other)
/// prk  = HKDF-Extract(salt = none, raw)
/// info = label || min(own.public, other) || max(own.public, other)
/// key  = HKDF-Expand(prk, info, 32)
/// ```
///
/// # Errors
///
/// - `LowOrderPointRejected`: `other` is a low-order point and the agreement
///   output is all zeroes
pub fn derive_shared_key(
    own: &KeyPair,
    other: &PublicKey,
    label: ContextLabel,
) -> CodecResult<DerivedKey> {
    let secret = own.private_key().to_static_secret();
    let shared = secret.diffie_hellman(&other.to_curve_point());
    if !shared.was_contributory() {
        return Err(CodecError::LowOrderPointRejected);
    }

    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());

    // Order the public keys so both sides build identical info
    let (first, second) = if own.public_key() <= other {
        (own.public_key(), other)
    } else {
        (other, own.public_key())
    };

    let label_bytes = label.as_bytes();
    let mut info = Vec::with_capacity(label_bytes.len() + 2 * PUBLIC_KEY_SIZE);
    info.extend_from_slice(label_bytes);
    info.extend_from_slice(first.as_bytes());
    info.extend_from_slice(second.as_bytes());

    let mut key = [0u8; DERIVED_KEY_SIZE];
    let Ok(()) = hkdf.expand(&info, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    Ok(DerivedKey { key, label })
}
