//! Fuzz target for speculative message decoding
//!
//! Feeds adversarial bytes and mutated valid messages to `try_decode`.
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary input under any tag
//! - Mutated plain messages: valid encode, then byte edits or truncation
//! - Mutated delegations: valid delegation, then byte edits or truncation
//! - Arbitrary counterparty keys, including low-order points
//!
//! # Invariants
//!
//! - `try_decode` NEVER panics
//! - Any failure returns the input bytes unchanged
//! - Unmodified messages always decode to their plaintext

#![no_main]

use arbitrary::Arbitrary;
use keyseal_crypto::{DecodeOutcome, KeyPair, MessageEncoder, PublicKey, SeededRandom};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct DecodeScenario {
    /// Private key of the sender (zero is replaced)
    sender_key: [u8; 32],
    /// Private key of the recipient (zero is replaced)
    recipient_key: [u8; 32],
    /// Counterparty key passed to raw decode attempts
    counterparty: [u8; 32],
    /// Seed for nonces and ephemeral keys
    seed: u64,
    /// What to decode
    input: DecodeInput,
}

#[derive(Debug, Clone, Arbitrary)]
enum DecodeInput {
    /// Completely arbitrary bytes
    Raw(Vec<u8>),
    /// Plain message, optionally mutated
    Plain { plaintext: Vec<u8>, mutation: Mutation },
    /// Delegation message, optionally mutated
    Delegation { remote_key: [u8; 32], vrf_key: [u8; 32], mutation: Mutation },
}

#[derive(Debug, Clone, Arbitrary)]
enum Mutation {
    None,
    FlipBit { position: u16, bit: u8 },
    Truncate { len: u16 },
    Append(Vec<u8>),
    Retag(u8),
}

impl Mutation {
    fn apply(&self, bytes: &mut Vec<u8>) -> bool {
        match self {
            Mutation::None => false,
            Mutation::FlipBit { position, bit } => {
                let index = *position as usize % bytes.len();
                bytes[index] ^= 1 << (bit % 8);
                true
            },
            Mutation::Truncate { len } => {
                let len = *len as usize % bytes.len();
                bytes.truncate(len);
                true
            },
            Mutation::Append(extra) => {
                bytes.extend_from_slice(extra);
                !extra.is_empty()
            },
            Mutation::Retag(tag) => {
                let changed = bytes[0] != *tag;
                bytes[0] = *tag;
                changed
            },
        }
    }
}

fn key_pair(bytes: [u8; 32]) -> KeyPair {
    KeyPair::from_private_key(&bytes).unwrap_or_else(|_| KeyPair::from_private_key(&[1; 32]).unwrap())
}

fuzz_target!(|scenario: DecodeScenario| {
    let sender = MessageEncoder::with_random(
        key_pair(scenario.sender_key),
        SeededRandom::from_seed(scenario.seed),
    );
    let recipient = MessageEncoder::with_random(
        key_pair(scenario.recipient_key),
        SeededRandom::from_seed(scenario.seed.wrapping_add(1)),
    );

    match scenario.input {
        DecodeInput::Raw(bytes) => {
            let outcome = recipient.try_decode(&PublicKey::new(scenario.counterparty), &bytes);
            if !outcome.is_decoded() {
                assert_eq!(outcome.payload(), bytes.as_slice());
            }
        },

        DecodeInput::Plain { plaintext, mutation } => {
            let Ok(encoded) = sender.encode(recipient.public_key(), &plaintext) else {
                return;
            };
            let mut bytes = encoded.into_bytes();
            let mutated = mutation.apply(&mut bytes);

            let outcome = recipient.try_decode(sender.public_key(), &bytes);
            if mutated {
                assert_eq!(outcome, DecodeOutcome::Unrecognized(bytes));
            } else {
                assert_eq!(outcome, DecodeOutcome::Decoded(plaintext));
            }
        },

        DecodeInput::Delegation { remote_key, vrf_key, mutation } => {
            let remote = key_pair(remote_key);
            let vrf = key_pair(vrf_key);
            let Ok(encoded) =
                sender.encode_persistent_harvesting_delegation(recipient.public_key(), &remote, &vrf)
            else {
                return;
            };
            let mut bytes = encoded.into_bytes();
            let mutated = mutation.apply(&mut bytes);

            let outcome = recipient.try_decode(&PublicKey::new(scenario.counterparty), &bytes);
            if mutated {
                assert_eq!(outcome, DecodeOutcome::Unrecognized(bytes));
            } else {
                let mut expected = remote.private_key().expose_bytes().to_vec();
                expected.extend_from_slice(vrf.private_key().expose_bytes());
                assert_eq!(outcome, DecodeOutcome::Decoded(expected));
            }
        },
    }
});
