//! Keyseal Cryptographic Message Codec
//!
//! Encrypts payloads between two account identities and delegates harvesting
//! keys to a node without exposing them on a public ledger. Pure functions
//! where possible; randomness is injected so tests can replay exact outputs.
//!
//! # Message Kinds
//!
//! | Tag | Kind | Key agreement |
//! |-----|------|---------------|
//! | `0x01` | Plain encrypted | sender identity ↔ recipient identity |
//! | `0xFF` | Persistent harvesting delegation | ephemeral key ↔ node identity |
//!
//! Any other tag is left uninterpreted.
//!
//! # Example
//!
//! ```
//! use keyseal_crypto::{DecodeOutcome, KeyPair, MessageEncoder, OsRandom};
//!
//! let alice = MessageEncoder::new(KeyPair::generate(&OsRandom));
//! let bob = MessageEncoder::new(KeyPair::generate(&OsRandom));
//!
//! let encoded = alice.encode(bob.public_key(), b"hello").unwrap();
//! let outcome = bob.try_decode(alice.public_key(), encoded.as_bytes());
//!
//! assert_eq!(outcome, DecodeOutcome::Decoded(b"hello".to_vec()));
//! ```
//!
//! # Security
//!
//! Confidentiality and Integrity:
//! - X25519 key agreement, HKDF-SHA256 derivation, XChaCha20-Poly1305 AEAD
//! - Message tag is authenticated as associated data
//! - Low-order counterparty keys are rejected before any key is derived
//!
//! Key Hygiene:
//! - Private keys and derived keys are zeroized on drop
//! - Derived keys live for a single seal or open
//! - Delegation ephemeral keys never leave the encode call
//! - `Debug` output redacts private material
//!
//! Speculative Decoding:
//! - `try_decode` is total: it never panics or errors
//! - Unknown tags, bad framing and failed authentication all return the
//!   original bytes untouched

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod keys;
pub mod message;
pub mod random;

pub use error::{CodecError, CodecResult};
pub use keys::{KeyPair, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, PrivateKey, PublicKey};
pub use message::{
    ContextLabel, DecodeOutcome, DelegatedKeys, EncodedMessage, MessageEncoder, MessageTypeTag,
    derive_shared_key,
    encoder::{
        DELEGATION_PAYLOAD_SIZE, MIN_PLAIN_ENCRYPTED_SIZE, PERSISTENT_HARVESTING_DELEGATION_SIZE,
        PERSISTENT_HARVESTING_DELEGATION_TAG, PLAIN_ENCRYPTED_TAG,
    },
    encryption::{NONCE_SIZE, TAG_SIZE},
};
pub use random::{OsRandom, SecureRandom, SeededRandom};
