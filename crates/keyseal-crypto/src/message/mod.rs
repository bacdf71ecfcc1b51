//! Encrypted messages between account identities
//!
//! # Architecture
//!
//! ```text
//! own private key + counterparty public key
//!        │
//!        ▼ X25519
//! raw shared secret (rejected if non-contributory)
//!        │
//!        ▼ HKDF-SHA256 (label || ordered public keys)
//! DerivedKey
//!        │
//!        ▼ Seal
//! XChaCha20-Poly1305 ciphertext
//!        │
//!        ▼ Frame
//! tag || [ephemeral public] || nonce || ciphertext
//! ```
//!
//! # Security Properties
//!
//! - Domain separation: each message kind derives keys under its own label
//! - Fresh nonces: every seal draws a new 192-bit random nonce
//! - Fail closed: decoding returns the input unchanged on any failure

pub mod byte_utils;
pub mod derivation;
pub mod encoder;
pub mod encryption;

pub use derivation::{ContextLabel, DerivedKey, derive_shared_key};
pub use encoder::{DecodeOutcome, DelegatedKeys, EncodedMessage, MessageEncoder, MessageTypeTag};
pub use encryption::{SealedBox, open, seal, seal_with_nonce};
