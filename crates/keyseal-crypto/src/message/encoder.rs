//! Message encoder: wire framing and tag dispatch
//!
//! # Wire Format
//!
//! ```text
//! 0x01 PlainEncrypted:
//!   tag (1) || nonce (24) || ciphertext (plaintext_len + 16)
//!
//! 0xFF PersistentHarvestingDelegation:
//!   tag (1) || ephemeral_public (32) || nonce (24) || ciphertext (64 + 16)
//! ```
//!
//! The tag byte is bound to the ciphertext as associated data.

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

use super::{
    byte_utils::{concat, split_array, split_exact},
    derivation::{ContextLabel, derive_shared_key},
    encryption::{NONCE_SIZE, TAG_SIZE, open, seal},
};
use crate::{
    error::{CodecError, CodecResult},
    keys::{KeyPair, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, PublicKey},
    random::{OsRandom, SecureRandom},
};

/// Tag byte of a plain encrypted message
pub const PLAIN_ENCRYPTED_TAG: u8 = 0x01;

/// Tag byte of a persistent harvesting delegation message
pub const PERSISTENT_HARVESTING_DELEGATION_TAG: u8 = 0xFF;

/// Size of the delegation plaintext: remote key || VRF key
pub const DELEGATION_PAYLOAD_SIZE: usize = 2 * PRIVATE_KEY_SIZE;

/// Smallest valid plain encrypted message (empty plaintext)
pub const MIN_PLAIN_ENCRYPTED_SIZE: usize = 1 + NONCE_SIZE + TAG_SIZE;

/// Exact size of a delegation message
pub const PERSISTENT_HARVESTING_DELEGATION_SIZE: usize =
    1 + PUBLIC_KEY_SIZE + NONCE_SIZE + DELEGATION_PAYLOAD_SIZE + TAG_SIZE;

/// Message kind, read from the first byte of an encoded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTypeTag {
    /// Message encrypted between two long-term identities
    PlainEncrypted,
    /// Remote and VRF keys delegated to a node
    PersistentHarvestingDelegation,
    /// Any tag this decoder does not interpret
    Unknown(u8),
}

impl MessageTypeTag {
    /// Tag of the first byte of `bytes`, if any.
    pub fn peek(bytes: &[u8]) -> Option<Self> {
        bytes.first().map(|&byte| Self::from(byte))
    }

    /// Wire byte for this tag.
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::PlainEncrypted => PLAIN_ENCRYPTED_TAG,
            Self::PersistentHarvestingDelegation => PERSISTENT_HARVESTING_DELEGATION_TAG,
            Self::Unknown(byte) => byte,
        }
    }
}

impl From<u8> for MessageTypeTag {
    fn from(byte: u8) -> Self {
        match byte {
            PLAIN_ENCRYPTED_TAG => Self::PlainEncrypted,
            PERSISTENT_HARVESTING_DELEGATION_TAG => Self::PersistentHarvestingDelegation,
            other => Self::Unknown(other),
        }
    }
}

/// An encoded message whose first byte is always a recognized tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage(Vec<u8>);

impl EncodedMessage {
    /// Tag of this message.
    pub fn message_type(&self) -> MessageTypeTag {
        // Constructed only by the encoder, which always writes a tag first
        MessageTypeTag::peek(&self.0).unwrap_or(MessageTypeTag::Unknown(0))
    }

    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Encoded length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: every encoded message carries at least a tag.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for EncodedMessage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<EncodedMessage> for Vec<u8> {
    fn from(message: EncodedMessage) -> Self {
        message.0
    }
}

/// Result of [`MessageEncoder::try_decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Message was authenticated and decrypted
    Decoded(Vec<u8>),
    /// Message could not be interpreted; holds the exact input bytes
    Unrecognized(Vec<u8>),
}

impl DecodeOutcome {
    /// True if the message was decoded.
    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }

    /// Decoded plaintext, or the original bytes on failure.
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Decoded(bytes) | Self::Unrecognized(bytes) => bytes,
        }
    }

    /// Split into `(decoded, payload)`.
    pub fn into_parts(self) -> (bool, Vec<u8>) {
        match self {
            Self::Decoded(bytes) => (true, bytes),
            Self::Unrecognized(bytes) => (false, bytes),
        }
    }
}

/// Remote and VRF identities recovered from a delegation payload.
#[derive(Debug)]
pub struct DelegatedKeys {
    /// Remote signing identity
    pub remote: KeyPair,
    /// VRF identity
    pub vrf: KeyPair,
}

impl DelegatedKeys {
    /// Split a decoded delegation payload into its two identities.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: payload is not exactly two private keys
    /// - `InvalidKeyEncoding`: either half is not a usable private key
    pub fn from_payload(payload: &[u8]) -> CodecResult<Self> {
        let Some((remote, vrf)) = split_exact::<PRIVATE_KEY_SIZE, PRIVATE_KEY_SIZE>(payload) else {
            return Err(CodecError::InvalidKeyLength {
                expected: DELEGATION_PAYLOAD_SIZE,
                actual: payload.len(),
            });
        };

        Ok(Self { remote: KeyPair::from_private_key(remote)?, vrf: KeyPair::from_private_key(vrf)? })
    }
}

/// Encodes and decodes messages on behalf of one identity.
///
/// Stateless apart from the identity and the random source; every call
/// handles one complete message and may run concurrently with others.
pub struct MessageEncoder<R = OsRandom> {
    identity: KeyPair,
    rng: R,
}

impl MessageEncoder<OsRandom> {
    /// Encoder for `identity` using operating system randomness.
    pub fn new(identity: KeyPair) -> Self {
        Self::with_random(identity, OsRandom)
    }
}

impl<R: SecureRandom> MessageEncoder<R> {
    /// Encoder for `identity` drawing nonces and ephemeral keys from `rng`.
    pub fn with_random(identity: KeyPair, rng: R) -> Self {
        Self { identity, rng }
    }

    /// Public key of the encoding identity.
    pub fn public_key(&self) -> &PublicKey {
        self.identity.public_key()
    }

    /// Encrypt `plaintext` for `recipient`.
    ///
    /// The recipient decodes with its own identity and this encoder's
    /// public key.
    ///
    /// # Errors
    ///
    /// - `LowOrderPointRejected`: `recipient` is not a safe public key
    pub fn encode(&self, recipient: &PublicKey, plaintext: &[u8]) -> CodecResult<EncodedMessage> {
        let key = derive_shared_key(&self.identity, recipient, ContextLabel::Message)?;
        let tag = [PLAIN_ENCRYPTED_TAG];
        let sealed = seal(&key, plaintext, &tag, &self.rng);

        tracing::debug!(
            recipient = %recipient,
            plaintext_len = plaintext.len(),
            "encoded plain encrypted message"
        );

        Ok(EncodedMessage(concat(&[&tag, &sealed.nonce, &sealed.ciphertext])))
    }

    /// Delegate `remote` and `vrf` private keys to the node owning `node`.
    ///
    /// A fresh ephemeral identity performs the key agreement and is dropped
    /// before returning, so only the node can ever decode the result.
    ///
    /// # Errors
    ///
    /// - `LowOrderPointRejected`: `node` is not a safe public key
    pub fn encode_persistent_harvesting_delegation(
        &self,
        node: &PublicKey,
        remote: &KeyPair,
        vrf: &KeyPair,
    ) -> CodecResult<EncodedMessage> {
        let ephemeral = KeyPair::generate(&self.rng);
        let key = derive_shared_key(&ephemeral, node, ContextLabel::Delegation)?;

        let mut plaintext = concat(&[
            remote.private_key().expose_bytes(),
            vrf.private_key().expose_bytes(),
        ]);
        debug_assert_eq!(plaintext.len(), DELEGATION_PAYLOAD_SIZE);

        let tag = [PERSISTENT_HARVESTING_DELEGATION_TAG];
        let sealed = seal(&key, &plaintext, &tag, &self.rng);
        plaintext.zeroize();

        tracing::debug!(node = %node, "encoded persistent harvesting delegation");

        let encoded = concat(&[
            &tag,
            ephemeral.public_key().as_bytes(),
            &sealed.nonce,
            &sealed.ciphertext,
        ]);
        debug_assert_eq!(encoded.len(), PERSISTENT_HARVESTING_DELEGATION_SIZE);

        Ok(EncodedMessage(encoded))
    }

    /// Try to decode `encoded`, exchanged with `counterparty`.
    ///
    /// Never fails: any unknown tag, malformed frame, unsafe key or
    /// authentication failure returns [`DecodeOutcome::Unrecognized`] holding
    /// the input unchanged. For delegation messages `counterparty` is ignored
    /// and the embedded ephemeral key is used instead.
    pub fn try_decode(&self, counterparty: &PublicKey, encoded: &[u8]) -> DecodeOutcome {
        match self.decode_frame(counterparty, encoded) {
            Ok(plaintext) => DecodeOutcome::Decoded(plaintext),
            Err(e) => {
                tracing::trace!(
                    tag = ?MessageTypeTag::peek(encoded),
                    len = encoded.len(),
                    error = %e,
                    "message not decoded"
                );
                DecodeOutcome::Unrecognized(encoded.to_vec())
            },
        }
    }

    /// Decode a delegation message addressed to this node.
    ///
    /// Returns `None` for any other message kind or on any failure.
    pub fn try_decode_delegation(&self, encoded: &[u8]) -> Option<DelegatedKeys> {
        if MessageTypeTag::peek(encoded) != Some(MessageTypeTag::PersistentHarvestingDelegation) {
            return None;
        }

        let plaintext = Zeroizing::new(self.decode_delegation(encoded).ok()?);
        DelegatedKeys::from_payload(&plaintext).ok()
    }

    fn decode_frame(&self, counterparty: &PublicKey, encoded: &[u8]) -> CodecResult<Vec<u8>> {
        let Some(tag) = MessageTypeTag::peek(encoded) else {
            return Err(CodecError::MalformedFrame { reason: "empty message".to_string() });
        };

        match tag {
            MessageTypeTag::PlainEncrypted => self.decode_plain(counterparty, encoded),
            MessageTypeTag::PersistentHarvestingDelegation => self.decode_delegation(encoded),
            MessageTypeTag::Unknown(byte) => {
                Err(CodecError::MalformedFrame { reason: format!("unknown tag {byte:#04x}") })
            },
        }
    }

    fn decode_plain(&self, counterparty: &PublicKey, encoded: &[u8]) -> CodecResult<Vec<u8>> {
        if encoded.len() < MIN_PLAIN_ENCRYPTED_SIZE {
            return Err(CodecError::MalformedFrame {
                reason: format!(
                    "plain message needs at least {MIN_PLAIN_ENCRYPTED_SIZE} bytes, got {}",
                    encoded.len()
                ),
            });
        }

        let Some((tag, body)) = split_array::<1>(encoded) else {
            return Err(CodecError::MalformedFrame { reason: "missing tag".to_string() });
        };
        let Some((nonce, ciphertext)) = split_array::<NONCE_SIZE>(body) else {
            return Err(CodecError::MalformedFrame { reason: "missing nonce".to_string() });
        };

        let key = derive_shared_key(&self.identity, counterparty, ContextLabel::Message)?;
        open(&key, nonce, ciphertext, tag)
    }

    fn decode_delegation(&self, encoded: &[u8]) -> CodecResult<Vec<u8>> {
        if encoded.len() != PERSISTENT_HARVESTING_DELEGATION_SIZE {
            return Err(CodecError::MalformedFrame {
                reason: format!(
                    "delegation message must be {PERSISTENT_HARVESTING_DELEGATION_SIZE} bytes, got {}",
                    encoded.len()
                ),
            });
        }

        let Some((tag, body)) = split_array::<1>(encoded) else {
            return Err(CodecError::MalformedFrame { reason: "missing tag".to_string() });
        };
        let Some((ephemeral, body)) = split_array::<PUBLIC_KEY_SIZE>(body) else {
            return Err(CodecError::MalformedFrame { reason: "missing ephemeral key".to_string() });
        };
        let Some((nonce, ciphertext)) = split_array::<NONCE_SIZE>(body) else {
            return Err(CodecError::MalformedFrame { reason: "missing nonce".to_string() });
        };

        let ephemeral = PublicKey::new(*ephemeral);
        let key = derive_shared_key(&self.identity, &ephemeral, ContextLabel::Delegation)?;
        open(&key, nonce, ciphertext, tag)
    }
}

impl<R> fmt::Debug for MessageEncoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageEncoder").field("identity", &self.identity).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;

    fn encoder(seed: u64) -> MessageEncoder<SeededRandom> {
        let rng = SeededRandom::from_seed(seed);
        let identity = KeyPair::generate(&rng);
        MessageEncoder::with_random(identity, rng)
    }

    #[test]
    fn tag_from_byte() {
        assert_eq!(MessageTypeTag::from(0x01), MessageTypeTag::PlainEncrypted);
        assert_eq!(MessageTypeTag::from(0xFF), MessageTypeTag::PersistentHarvestingDelegation);
        assert_eq!(MessageTypeTag::from(0x02), MessageTypeTag::Unknown(0x02));
        assert_eq!(MessageTypeTag::from(0xFE).to_byte(), 0xFE);
        assert_eq!(MessageTypeTag::peek(&[]), None);
    }

    #[test]
    fn encode_layout() {
        let alice = encoder(1);
        let bob = encoder(2);

        let encoded = alice.encode(bob.public_key(), b"hello").unwrap();

        assert_eq!(encoded.message_type(), MessageTypeTag::PlainEncrypted);
        assert_eq!(encoded.as_bytes()[0], PLAIN_ENCRYPTED_TAG);
        assert_eq!(encoded.len(), MIN_PLAIN_ENCRYPTED_SIZE + 5);
    }

    #[test]
    fn recipient_decodes_plain_message() {
        let alice = encoder(1);
        let bob = encoder(2);

        let encoded = alice.encode(bob.public_key(), b"hello bob").unwrap();
        let outcome = bob.try_decode(alice.public_key(), encoded.as_bytes());

        assert_eq!(outcome, DecodeOutcome::Decoded(b"hello bob".to_vec()));
    }

    #[test]
    fn sender_decodes_own_plain_message() {
        let alice = encoder(1);
        let bob = encoder(2);

        let encoded = alice.encode(bob.public_key(), b"note to self").unwrap();
        let outcome = alice.try_decode(bob.public_key(), encoded.as_bytes());

        assert_eq!(outcome.into_parts(), (true, b"note to self".to_vec()));
    }

    #[test]
    fn plain_message_with_wrong_counterparty_is_unrecognized() {
        let alice = encoder(1);
        let bob = encoder(2);
        let eve = encoder(3);

        let encoded = alice.encode(bob.public_key(), b"hello bob").unwrap();
        let outcome = bob.try_decode(eve.public_key(), encoded.as_bytes());

        assert_eq!(outcome, DecodeOutcome::Unrecognized(encoded.into_bytes()));
    }

    #[test]
    fn encode_rejects_low_order_recipient() {
        let alice = encoder(1);
        let result = alice.encode(&PublicKey::new([0u8; PUBLIC_KEY_SIZE]), b"hello");

        assert_eq!(result, Err(CodecError::LowOrderPointRejected));
    }

    #[test]
    fn delegation_layout() {
        let sender = encoder(1);
        let node = encoder(2);
        let remote = KeyPair::generate(&SeededRandom::from_seed(3));
        let vrf = KeyPair::generate(&SeededRandom::from_seed(4));

        let encoded = sender
            .encode_persistent_harvesting_delegation(node.public_key(), &remote, &vrf)
            .unwrap();

        assert_eq!(encoded.message_type(), MessageTypeTag::PersistentHarvestingDelegation);
        assert_eq!(encoded.len(), PERSISTENT_HARVESTING_DELEGATION_SIZE);
        // Ephemeral key is neither the sender's nor the node's
        let ephemeral = &encoded.as_bytes()[1..1 + PUBLIC_KEY_SIZE];
        assert_ne!(ephemeral, sender.public_key().as_bytes());
        assert_ne!(ephemeral, node.public_key().as_bytes());
    }

    #[test]
    fn node_decodes_delegation_regardless_of_counterparty() {
        let sender = encoder(1);
        let node = encoder(2);
        let remote = KeyPair::generate(&SeededRandom::from_seed(3));
        let vrf = KeyPair::generate(&SeededRandom::from_seed(4));

        let encoded = sender
            .encode_persistent_harvesting_delegation(node.public_key(), &remote, &vrf)
            .unwrap();

        let expected =
            concat(&[remote.private_key().expose_bytes(), vrf.private_key().expose_bytes()]);
        for counterparty in [*sender.public_key(), *node.public_key(), PublicKey::new([0u8; 32])]
        {
            let outcome = node.try_decode(&counterparty, encoded.as_bytes());
            assert_eq!(outcome, DecodeOutcome::Decoded(expected.clone()));
        }
    }

    #[test]
    fn sender_cannot_decode_delegation() {
        let sender = encoder(1);
        let node = encoder(2);
        let remote = KeyPair::generate(&SeededRandom::from_seed(3));
        let vrf = KeyPair::generate(&SeededRandom::from_seed(4));

        let encoded = sender
            .encode_persistent_harvesting_delegation(node.public_key(), &remote, &vrf)
            .unwrap();
        let outcome = sender.try_decode(node.public_key(), encoded.as_bytes());

        assert!(!outcome.is_decoded());
        assert_eq!(outcome.payload(), encoded.as_bytes());
    }

    #[test]
    fn try_decode_delegation_recovers_key_pairs() {
        let sender = encoder(1);
        let node = encoder(2);
        let remote = KeyPair::generate(&SeededRandom::from_seed(3));
        let vrf = KeyPair::generate(&SeededRandom::from_seed(4));

        let encoded = sender
            .encode_persistent_harvesting_delegation(node.public_key(), &remote, &vrf)
            .unwrap();
        let keys = node.try_decode_delegation(encoded.as_bytes()).unwrap();

        assert_eq!(keys.remote.public_key(), remote.public_key());
        assert_eq!(keys.vrf.public_key(), vrf.public_key());
    }

    #[test]
    fn try_decode_delegation_ignores_plain_messages() {
        let alice = encoder(1);
        let bob = encoder(2);

        let encoded = alice.encode(bob.public_key(), &[0x11; 64]).unwrap();

        assert!(bob.try_decode_delegation(encoded.as_bytes()).is_none());
    }

    #[test]
    fn delegated_keys_reject_wrong_length() {
        let result = DelegatedKeys::from_payload(&[0x11; 63]);
        assert!(matches!(result, Err(CodecError::InvalidKeyLength { expected: 64, actual: 63 })));
    }

    #[test]
    fn unknown_tag_is_unrecognized() {
        let decoder = encoder(1);
        let input = [0x02, 0x4A, 0x4A, 0x4A];

        let outcome = decoder.try_decode(&PublicKey::new([0u8; 32]), &input);

        assert_eq!(outcome, DecodeOutcome::Unrecognized(input.to_vec()));
    }

    #[test]
    fn empty_input_is_unrecognized() {
        let decoder = encoder(1);

        let outcome = decoder.try_decode(decoder.public_key(), &[]);

        assert_eq!(outcome, DecodeOutcome::Unrecognized(Vec::new()));
    }

    #[test]
    fn short_frames_are_unrecognized() {
        let decoder = encoder(1);
        let counterparty = *encoder(2).public_key();

        for len in 1..MIN_PLAIN_ENCRYPTED_SIZE {
            let mut input = vec![0u8; len];
            input[0] = PLAIN_ENCRYPTED_TAG;
            let outcome = decoder.try_decode(&counterparty, &input);
            assert_eq!(outcome, DecodeOutcome::Unrecognized(input));
        }

        for len in [1, 33, 57, PERSISTENT_HARVESTING_DELEGATION_SIZE - 1] {
            let mut input = vec![0u8; len];
            input[0] = PERSISTENT_HARVESTING_DELEGATION_TAG;
            let outcome = decoder.try_decode(&counterparty, &input);
            assert_eq!(outcome, DecodeOutcome::Unrecognized(input));
        }
    }

    #[test]
    fn oversized_delegation_is_unrecognized() {
        let sender = encoder(1);
        let node = encoder(2);
        let remote = KeyPair::generate(&SeededRandom::from_seed(3));
        let vrf = KeyPair::generate(&SeededRandom::from_seed(4));

        let mut bytes = sender
            .encode_persistent_harvesting_delegation(node.public_key(), &remote, &vrf)
            .unwrap()
            .into_bytes();
        bytes.push(0x00);

        let outcome = node.try_decode(sender.public_key(), &bytes);
        assert_eq!(outcome, DecodeOutcome::Unrecognized(bytes));
    }

    #[test]
    fn retagged_message_is_unrecognized() {
        let alice = encoder(1);
        let bob = encoder(2);

        // Same length as a delegation so it parses under the other tag
        let mut bytes = alice.encode(bob.public_key(), &[0x33; 96]).unwrap().into_bytes();
        assert_eq!(bytes.len(), PERSISTENT_HARVESTING_DELEGATION_SIZE);
        bytes[0] = PERSISTENT_HARVESTING_DELEGATION_TAG;

        let outcome = bob.try_decode(alice.public_key(), &bytes);
        assert_eq!(outcome, DecodeOutcome::Unrecognized(bytes));
    }

    #[test]
    fn delegation_payload_round_trips_unclamped_scalars() {
        let sender = encoder(1);
        let node = encoder(2);
        let remote = KeyPair::from_private_key(&[0xFF; 32]).unwrap();
        let vrf = KeyPair::from_private_key(&[0x07; 32]).unwrap();

        let encoded = sender
            .encode_persistent_harvesting_delegation(node.public_key(), &remote, &vrf)
            .unwrap();
        let (decoded, payload) =
            node.try_decode(sender.public_key(), encoded.as_bytes()).into_parts();

        assert!(decoded);
        assert_eq!(&payload[..32], &[0xFF; 32]);
        assert_eq!(&payload[32..], &[0x07; 32]);
    }

    #[test]
    fn debug_does_not_leak_identity() {
        let alice = encoder(1);
        let debug = format!("{alice:?}");

        assert!(debug.contains("REDACTED"));
    }
}
