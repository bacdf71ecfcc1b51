//! Randomness abstraction for key generation and nonces.
//!
//! Every encode call needs fresh random bytes (a nonce, and for delegations
//! an ephemeral key). The source is injected rather than global so tests can
//! replay exact outputs while production uses the operating system RNG.

use std::sync::{Mutex, PoisonError};

use rand::{RngCore, SeedableRng, rngs::OsRng};
use rand_chacha::ChaCha20Rng;

/// Source of cryptographically secure random bytes.
///
/// # Invariants
///
/// - Production implementations MUST use cryptographically secure entropy
/// - Implementations are callable concurrently through a shared reference
pub trait SecureRandom: Send + Sync {
    /// Fills the provided buffer with random bytes.
    fn fill_bytes(&self, buffer: &mut [u8]);

    /// Returns `N` random bytes.
    fn random_array<const N: usize>(&self) -> [u8; N]
    where
        Self: Sized,
    {
        let mut bytes = [0u8; N];
        self.fill_bytes(&mut bytes);
        bytes
    }
}

impl<R: SecureRandom + ?Sized> SecureRandom for &R {
    fn fill_bytes(&self, buffer: &mut [u8]) {
        (**self).fill_bytes(buffer);
    }
}

/// Operating system entropy.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill_bytes(&self, buffer: &mut [u8]) {
        OsRng.fill_bytes(buffer);
    }
}

/// Deterministic ChaCha20 stream for reproducible tests.
///
/// Given the same seed, successive calls produce the same byte sequence.
/// Never use this for real keys.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<ChaCha20Rng>,
}

impl SeededRandom {
    /// Create a source from a 64-bit seed.
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)) }
    }
}

impl SecureRandom for SeededRandom {
    fn fill_bytes(&self, buffer: &mut [u8]) {
        // A poisoned lock still holds a valid RNG state
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.fill_bytes(buffer);
    }
}
