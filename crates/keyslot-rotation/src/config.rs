use serde::{Deserialize, Serialize};

use keyslot_crypto::{CryptoError, DEFAULT_EPHEMERAL_KEY_BITS};

/// Default number of key slots in the ring.
pub const DEFAULT_SLOT_COUNT: usize = 2;

/// Default encryption TTL per key (1 hour).
pub const DEFAULT_ENCRYPTION_TTL_MS: u64 = 60 * 60 * 1000;

/// Construction-time settings for a [`crate::RotatingKeyManager`].
///
/// Each key encrypts for `encryption_ttl_ms` and decrypts for
/// `encryption_ttl_ms * slot_count`, both measured from when it was minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Size of each minted key in bits, a positive multiple of 8.
    pub key_bits: usize,
    pub slot_count: usize,
    pub encryption_ttl_ms: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_EPHEMERAL_KEY_BITS,
            slot_count: DEFAULT_SLOT_COUNT,
            encryption_ttl_ms: DEFAULT_ENCRYPTION_TTL_MS,
        }
    }
}

impl RotationConfig {
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.key_bits < 8 || self.key_bits % 8 != 0 {
            return Err(CryptoError::Configuration(
                "Key size must be a positive multiple of 8".to_string(),
            ));
        }
        if self.slot_count == 0 {
            return Err(CryptoError::Configuration(
                "slot count must be at least 1".to_string(),
            ));
        }
        if self.encryption_ttl_ms == 0 {
            return Err(CryptoError::Configuration(
                "encryption TTL must be positive".to_string(),
            ));
        }
        self.decryption_ttl_ms()?;
        Ok(())
    }

    /// How long a key stays usable for decryption after it is minted.
    pub fn decryption_ttl_ms(&self) -> Result<u64, CryptoError> {
        let ttl = self.encryption_ttl_ms;
        let slots = self.slot_count;
        u64::try_from(slots)
            .ok()
            .and_then(|n| ttl.checked_mul(n))
            .ok_or_else(|| {
                CryptoError::Configuration(format!("TTL overflows: {ttl} ms x {slots} slots"))
            })
    }
}
