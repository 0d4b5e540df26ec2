//! Secret generation for provisioned users
//!
//! Two strategies are available:
//!
//! - [`DeterministicGenerator`]: a SHA-256 digest of a seed (plus an optional
//!   salt). The same seed always yields the same secret, so a later request can
//!   reconstruct it without stored state.
//! - [`RandomGenerator`]: bytes drawn from the operating system CSPRNG.
//!
//! Both encode with the URL-safe base64 alphabet without padding, so the output
//! never contains `:`, `@`, `/` or control characters and can be used verbatim
//! in Basic-Auth headers and AMQP URIs.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt::Debug;

use crate::error::{BrokerError, Result};

/// Minimum number of random bytes drawn per secret
pub const MIN_STRENGTH: usize = 16;

/// Produces secrets for backing-system users
pub trait SecretGenerator: Send + Sync + Debug {
    /// Generate a secret for the given seed.
    ///
    /// Deterministic generators derive the secret from `seed`; random
    /// generators ignore it.
    fn generate(&self, seed: &str) -> Result<String>;

    /// Whether the same seed always yields the same secret
    fn is_deterministic(&self) -> bool;
}

/// Digest-based generator
#[derive(Clone, Default)]
pub struct DeterministicGenerator {
    salt: Vec<u8>,
}

impl DeterministicGenerator {
    /// Create a generator without a salt
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator mixing a deployment secret into every digest
    pub fn with_salt(salt: impl AsRef<[u8]>) -> Self {
        Self {
            salt: salt.as_ref().to_vec(),
        }
    }
}

impl Debug for DeterministicGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeterministicGenerator")
            .field("salted", &!self.salt.is_empty())
            .finish()
    }
}

impl SecretGenerator for DeterministicGenerator {
    fn generate(&self, seed: &str) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(&self.salt);
        hasher.update(seed.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    fn is_deterministic(&self) -> bool {
        true
    }
}

/// CSPRNG-backed generator
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    strength: usize,
}

impl RandomGenerator {
    /// Create a generator drawing [`MIN_STRENGTH`] bytes per secret
    pub fn new() -> Self {
        Self {
            strength: MIN_STRENGTH,
        }
    }

    /// Create a generator drawing `strength` bytes per secret.
    ///
    /// Values below [`MIN_STRENGTH`] are raised to it.
    pub fn with_strength(strength: usize) -> Self {
        Self {
            strength: strength.max(MIN_STRENGTH),
        }
    }

    /// Number of random bytes behind each secret
    pub fn strength(&self) -> usize {
        self.strength
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretGenerator for RandomGenerator {
    fn generate(&self, _seed: &str) -> Result<String> {
        random_secret(&mut OsRng, self.strength)
    }

    fn is_deterministic(&self) -> bool {
        false
    }
}

fn random_secret<R: RngCore + ?Sized>(rng: &mut R, strength: usize) -> Result<String> {
    let mut key = vec![0u8; strength];
    rng.try_fill_bytes(&mut key)
        .map_err(|e| BrokerError::Generation(format!("Failed to generate random key: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(key))
}
