//! PBKDF2-HMAC password stretching.
//!
//! The same password, salt, iteration count and key size always produce the
//! same key. Envelopes rely on this: the salt travels in clear next to the
//! ciphertext and the key is rebuilt from it on decrypt.

use std::fmt;
use std::str::FromStr;

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Supported password hash functions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KdfAlgorithm {
    #[serde(rename = "PBKDF2WithHmacSHA256")]
    Pbkdf2HmacSha256,
    #[default]
    #[serde(rename = "PBKDF2WithHmacSHA512")]
    Pbkdf2HmacSha512,
}

impl KdfAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            KdfAlgorithm::Pbkdf2HmacSha256 => "PBKDF2WithHmacSHA256",
            KdfAlgorithm::Pbkdf2HmacSha512 => "PBKDF2WithHmacSHA512",
        }
    }
}

impl fmt::Display for KdfAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KdfAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PBKDF2WithHmacSHA256" => Ok(Self::Pbkdf2HmacSha256),
            "PBKDF2WithHmacSHA512" => Ok(Self::Pbkdf2HmacSha512),
            other => Err(CryptoError::Configuration(format!(
                "unsupported key derivation algorithm: {}",
                other
            ))),
        }
    }
}

/// Derive a key of `key_bits` bits from a password and salt.
///
/// # Arguments
/// * `algorithm` - PBKDF2 hash function
/// * `password` - Password bytes (any length, including raw key material)
/// * `salt` - Salt bytes, stored in clear alongside the ciphertext
/// * `iterations` - PBKDF2 round count, must be non-zero
/// * `key_bits` - Output size in bits, a positive multiple of 8
pub fn derive_key(
    algorithm: KdfAlgorithm,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    key_bits: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::Configuration(
            "KDF iteration count must be positive".to_string(),
        ));
    }
    if key_bits == 0 || key_bits % 8 != 0 {
        return Err(CryptoError::Configuration(format!(
            "key size must be a positive multiple of 8, got {}",
            key_bits
        )));
    }

    let mut key = Zeroizing::new(vec![0u8; key_bits / 8]);
    match algorithm {
        KdfAlgorithm::Pbkdf2HmacSha256 => {
            pbkdf2_hmac::<Sha256>(password, salt, iterations, key.as_mut_slice())
        }
        KdfAlgorithm::Pbkdf2HmacSha512 => {
            pbkdf2_hmac::<Sha512>(password, salt, iterations, key.as_mut_slice())
        }
    }
    Ok(key)
}

/// Same as [`derive_key`], resolving the algorithm by its configured name.
pub fn derive_key_named(
    algorithm: &str,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    key_bits: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    derive_key(algorithm.parse()?, password, salt, iterations, key_bits)
}
