//! X25519 identity keys
//!
//! A [`KeyPair`] binds one private scalar to the public point it generates.
//! The raw scalar bytes supplied by the caller are kept as-is; clamping is
//! applied by the curve library whenever the scalar is used, so exporting a
//! key returns exactly the bytes it was built from.

use std::fmt;

use x25519_dalek::{PublicKey as CurvePoint, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use crate::{
    error::{CodecError, CodecResult},
    random::SecureRandom,
};

/// Size of an X25519 private scalar (32 bytes)
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of an X25519 public point (32 bytes)
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Private scalar of an identity.
///
/// Not `Clone`: the only way to duplicate the bytes is the explicit
/// [`expose_bytes`](Self::expose_bytes) export. Zeroized on drop.
pub struct PrivateKey {
    bytes: [u8; PRIVATE_KEY_SIZE],
}

impl PrivateKey {
    /// Build a private key from exactly [`PRIVATE_KEY_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: input is not 32 bytes
    /// - `InvalidKeyEncoding`: input is all zeroes
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        let Ok(array) = <[u8; PRIVATE_KEY_SIZE]>::try_from(bytes) else {
            return Err(CodecError::InvalidKeyLength {
                expected: PRIVATE_KEY_SIZE,
                actual: bytes.len(),
            });
        };

        if array.iter().all(|&b| b == 0) {
            return Err(CodecError::InvalidKeyEncoding {
                reason: "private key must not be all zeroes".to_string(),
            });
        }

        Ok(Self { bytes: array })
    }

    /// Raw scalar bytes, exactly as supplied at construction.
    pub fn expose_bytes(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.bytes
    }

    pub(crate) fn to_static_secret(&self) -> StaticSecret {
        StaticSecret::from(self.bytes)
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// Public point of an identity. Safe to share and log.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wrap raw point bytes.
    ///
    /// Any 32 bytes are accepted here. Points that cannot produce a safe
    /// shared secret are rejected at key agreement time.
    pub const fn new(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a public key from a byte slice.
    pub fn from_slice(bytes: &[u8]) -> CodecResult<Self> {
        <[u8; PUBLIC_KEY_SIZE]>::try_from(bytes).map(Self).map_err(|_| {
            CodecError::InvalidKeyLength { expected: PUBLIC_KEY_SIZE, actual: bytes.len() }
        })
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> CodecResult<Self> {
        let bytes = decode_hex(hex_str)?;
        Self::from_slice(&bytes)
    }

    /// Raw point bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Upper-case hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub(crate) fn to_curve_point(self) -> CurvePoint {
        CurvePoint::from(self.0)
    }
}

impl From<[u8; PUBLIC_KEY_SIZE]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// A private key and the public key derived from it.
///
/// Immutable after construction: the public half is always the base point
/// multiple of the private half.
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a fresh identity from `rng`.
    pub fn generate(rng: &impl SecureRandom) -> Self {
        let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        loop {
            rng.fill_bytes(bytes.as_mut_slice());
            // Only the all-zero scalar is rejected; retrying is negligible
            if let Ok(private_key) = PrivateKey::from_bytes(bytes.as_slice()) {
                return Self::from_private(private_key);
            }
        }
    }

    /// Build an identity from raw private scalar bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: input is not 32 bytes
    /// - `InvalidKeyEncoding`: input is all zeroes
    pub fn from_private_key(bytes: &[u8]) -> CodecResult<Self> {
        PrivateKey::from_bytes(bytes).map(Self::from_private)
    }

    /// Build an identity from a 64-character hex private key.
    pub fn from_hex(hex_str: &str) -> CodecResult<Self> {
        let bytes = Zeroizing::new(decode_hex(hex_str)?);
        Self::from_private_key(&bytes)
    }

    /// Build an identity from an already validated private key.
    pub fn from_private(private_key: PrivateKey) -> Self {
        let public_key = PublicKey(CurvePoint::from(&private_key.to_static_secret()).to_bytes());
        Self { private_key, public_key }
    }

    /// Private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &self.private_key)
            .field("public_key", &self.public_key)
            .finish()
    }
}

fn decode_hex(hex_str: &str) -> CodecResult<Vec<u8>> {
    hex::decode(hex_str)
        .map_err(|e| CodecError::InvalidKeyEncoding { reason: format!("invalid hex: {e}") })
}
