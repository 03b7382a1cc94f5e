//! Named cipher variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cipher::{AeadCipher, CipherParams};
use crate::error::CryptoError;
use crate::kdf::KdfAlgorithm;
use crate::types::DEFAULT_KDF_ITERATIONS;

static AES128: AeadCipher = AeadCipher::from_params(CipherParams {
    key_bits: 128,
    kdf: KdfAlgorithm::Pbkdf2HmacSha512,
    iterations: DEFAULT_KDF_ITERATIONS,
});

static AES256: AeadCipher = AeadCipher::from_params(CipherParams {
    key_bits: 256,
    kdf: KdfAlgorithm::Pbkdf2HmacSha512,
    iterations: DEFAULT_KDF_ITERATIONS,
});

/// The closed set of built-in ciphers. Both share one implementation and
/// differ only in derived key length.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CipherVariant {
    Aes128,
    #[default]
    Aes256,
}

impl CipherVariant {
    pub fn all() -> &'static [CipherVariant] {
        &[CipherVariant::Aes128, CipherVariant::Aes256]
    }

    pub fn name(self) -> &'static str {
        match self {
            CipherVariant::Aes128 => "AES128",
            CipherVariant::Aes256 => "AES256",
        }
    }

    pub fn cipher(self) -> &'static AeadCipher {
        match self {
            CipherVariant::Aes128 => &AES128,
            CipherVariant::Aes256 => &AES256,
        }
    }

    pub fn params(self) -> CipherParams {
        *self.cipher().params()
    }

    /// Lookup by exact name, `None` if unknown.
    pub fn try_parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|v| v.name() == name)
    }

    pub fn has_name(name: &str) -> bool {
        Self::try_parse(name).is_some()
    }
}

impl fmt::Display for CipherVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherVariant {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
            .ok_or_else(|| CryptoError::Configuration(format!("unknown cipher variant: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_params() {
        assert_eq!(CipherVariant::Aes128.params().key_bits, 128);
        assert_eq!(CipherVariant::Aes256.params().key_bits, 256);
        for v in CipherVariant::all() {
            assert!(v.params().validate().is_ok());
            assert_eq!(v.params().iterations, DEFAULT_KDF_ITERATIONS);
            assert_eq!(v.params().kdf, KdfAlgorithm::Pbkdf2HmacSha512);
        }
    }

    #[test]
    fn lookup_by_name() {
        let parsed: CipherVariant = "AES128".parse().unwrap();
        assert_eq!(parsed, CipherVariant::Aes128);
        assert_eq!(
            CipherVariant::try_parse("AES256"),
            Some(CipherVariant::Aes256)
        );
        assert!(CipherVariant::has_name("AES256"));
        assert!(!CipherVariant::has_name("aes256"));
        assert_eq!(CipherVariant::try_parse("DES"), None);
    }

    #[test]
    fn unknown_name_is_configuration_error() {
        let err = "ROT13".parse::<CipherVariant>().unwrap_err();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn serializes_by_name() {
        let json = serde_json::to_string(&CipherVariant::Aes128).unwrap();
        assert_eq!(json, "\"AES128\"");
        let v: CipherVariant = serde_json::from_str("\"AES256\"").unwrap();
        assert_eq!(v, CipherVariant::Aes256);
    }

    #[test]
    fn default_is_aes256() {
        assert_eq!(CipherVariant::default(), CipherVariant::Aes256);
    }

    #[test]
    fn built_in_round_trip() {
        for v in CipherVariant::all() {
            let cipher = v.cipher();
            let encrypted = cipher.encrypt(b"Test", b"pw").unwrap();
            assert_ne!(encrypted.as_bytes(), b"Test");
            assert_eq!(cipher.decrypt_string(&encrypted, b"pw").unwrap(), "Test");
        }
    }

    #[test]
    fn built_in_variants_do_not_interoperate() {
        let aes128 = CipherVariant::Aes128.cipher();
        let aes256 = CipherVariant::Aes256.cipher();
        let encrypted = aes128.encrypt(b"Test", b"pw").unwrap();
        let err = aes256.decrypt(&encrypted, b"pw").unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailure));
    }
}
