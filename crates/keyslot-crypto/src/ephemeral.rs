//! Ciphers keyed by process-local secrets instead of user passwords.
//!
//! The key material is fed to an [`AeadCipher`] as the password, so every
//! envelope still gets its own salt and derived key.

use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::cipher::{random_bytes, AeadCipher};
use crate::error::CryptoError;
use crate::types::DEFAULT_EPHEMERAL_KEY_BITS;
use crate::variant::CipherVariant;

/// Generate `key_bits` bits of random key material.
///
/// `key_bits` must be a positive multiple of 8.
pub fn generate_key_material(key_bits: usize) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if key_bits < 8 || key_bits % 8 != 0 {
        return Err(CryptoError::Configuration(
            "Key size must be a positive multiple of 8".to_string(),
        ));
    }
    Ok(Zeroizing::new(random_bytes(key_bits / 8)?))
}

/// Encrypt and decrypt with a key the implementor owns.
///
/// The plain methods use AES-256; the `_with` methods take an explicit cipher.
pub trait EphemeralCipher: Send + Sync {
    fn encrypt_with(&self, data: &[u8], cipher: &AeadCipher) -> Result<String, CryptoError>;

    fn decrypt_with(&self, data: &str, cipher: &AeadCipher) -> Result<Vec<u8>, CryptoError>;

    fn decrypt_string_with(&self, data: &str, cipher: &AeadCipher) -> Result<String, CryptoError> {
        let plaintext = self.decrypt_with(data, cipher)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    fn encrypt(&self, data: &[u8]) -> Result<String, CryptoError> {
        self.encrypt_with(data, CipherVariant::default().cipher())
    }

    fn decrypt(&self, data: &str) -> Result<Vec<u8>, CryptoError> {
        self.decrypt_with(data, CipherVariant::default().cipher())
    }

    fn decrypt_string(&self, data: &str) -> Result<String, CryptoError> {
        self.decrypt_string_with(data, CipherVariant::default().cipher())
    }
}

/// Random key held only in memory. Nothing it encrypts survives the process.
pub struct MemoryBackedCipher {
    key: RwLock<Zeroizing<Vec<u8>>>,
}

impl MemoryBackedCipher {
    /// # Arguments
    /// * `key_bits` - Key size in bits, a positive multiple of 8
    pub fn new(key_bits: usize) -> Result<Self, CryptoError> {
        Ok(Self {
            key: RwLock::new(generate_key_material(key_bits)?),
        })
    }

    /// A 4096-bit random key.
    pub fn with_default_key() -> Result<Self, CryptoError> {
        Self::new(DEFAULT_EPHEMERAL_KEY_BITS)
    }

    pub fn key_bits(&self) -> usize {
        self.key.read().len() * 8
    }

    /// Replace the key with fresh random bytes of the same size. The old key
    /// is wiped, so everything encrypted before this call becomes unreadable.
    pub fn rotate_key(&self) -> Result<(), CryptoError> {
        let mut key = self.key.write();
        let fresh = generate_key_material(key.len() * 8)?;
        *key = fresh;
        tracing::debug!(key_bits = key.len() * 8, "memory-backed key rotated");
        Ok(())
    }
}

impl EphemeralCipher for MemoryBackedCipher {
    fn encrypt_with(&self, data: &[u8], cipher: &AeadCipher) -> Result<String, CryptoError> {
        let key = self.key.read().clone();
        cipher.encrypt(data, &key)
    }

    fn decrypt_with(&self, data: &str, cipher: &AeadCipher) -> Result<Vec<u8>, CryptoError> {
        let key = self.key.read().clone();
        cipher.decrypt(data, &key)
    }
}

/// Key loaded once from a file at construction.
///
/// The path is meant to be deployment configuration; never derive it from
/// user input.
pub struct FileBackedCipher {
    key: Zeroizing<Vec<u8>>,
}

impl FileBackedCipher {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CryptoError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CryptoError::Configuration("Key path is required".into()));
        }

        let key = match fs::read(path) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) => {
                let reason = format!("failed to read {}: {}", path.display(), e);
                return Err(CryptoError::KeyLoad(reason));
            }
        };
        if key.is_empty() {
            return Err(CryptoError::KeyLoad(format!(
                "{} must contain at least 1 byte",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "loaded file-backed key");
        Ok(Self { key })
    }
}

impl EphemeralCipher for FileBackedCipher {
    fn encrypt_with(&self, data: &[u8], cipher: &AeadCipher) -> Result<String, CryptoError> {
        cipher.encrypt(data, &self.key)
    }

    fn decrypt_with(&self, data: &str, cipher: &AeadCipher) -> Result<Vec<u8>, CryptoError> {
        cipher.decrypt(data, &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::CipherParams;
    use crate::kdf::KdfAlgorithm;
    use std::io::Write;

    fn fast_cipher() -> AeadCipher {
        AeadCipher::new(CipherParams {
            key_bits: 128,
            kdf: KdfAlgorithm::Pbkdf2HmacSha256,
            iterations: 100,
        })
        .unwrap()
    }

    #[test]
    fn key_material_size() {
        assert_eq!(generate_key_material(8).unwrap().len(), 1);
        assert_eq!(generate_key_material(4096).unwrap().len(), 512);
    }

    #[test]
    fn rejects_bad_key_sizes() {
        for bits in [0usize, 1, 7, 9, 15] {
            let err = MemoryBackedCipher::new(bits).err().unwrap();
            assert_eq!(
                err.to_string(),
                "Configuration error: Key size must be a positive multiple of 8"
            );
        }
    }

    #[test]
    fn default_key_is_4096_bits() {
        let mbc = MemoryBackedCipher::with_default_key().unwrap();
        assert_eq!(mbc.key_bits(), 4096);
    }

    #[test]
    fn memory_round_trip() {
        let mbc = MemoryBackedCipher::new(256).unwrap();
        let c = fast_cipher();
        let encrypted = mbc.encrypt_with(b"data", &c).unwrap();
        assert_eq!(mbc.decrypt_string_with(&encrypted, &c).unwrap(), "data");
    }

    #[test]
    fn memory_round_trip_default_cipher() {
        let mbc = MemoryBackedCipher::new(64).unwrap();
        let encrypted = mbc.encrypt(&[0x00]).unwrap();
        assert_eq!(mbc.decrypt(&encrypted).unwrap(), vec![0x00]);
    }

    #[test]
    fn instances_do_not_share_keys() {
        let a = MemoryBackedCipher::new(256).unwrap();
        let b = MemoryBackedCipher::new(256).unwrap();
        let c = fast_cipher();
        let encrypted = a.encrypt_with(b"data", &c).unwrap();
        let err = b.decrypt_with(&encrypted, &c).unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailure));
    }

    #[test]
    fn rotate_key_invalidates_old_ciphertext() {
        let mbc = MemoryBackedCipher::new(256).unwrap();
        let c = fast_cipher();
        let before = mbc.encrypt_with(b"data", &c).unwrap();
        mbc.rotate_key().unwrap();
        assert_eq!(mbc.key_bits(), 256);

        let err = mbc.decrypt_with(&before, &c).unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailure));

        let after = mbc.encrypt_with(b"data", &c).unwrap();
        assert_eq!(mbc.decrypt_with(&after, &c).unwrap(), b"data");
    }

    #[test]
    fn file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4]).unwrap();

        let fbc = FileBackedCipher::load(file.path()).unwrap();
        let c = fast_cipher();
        let encrypted = fbc.encrypt_with(b"data", &c).unwrap();

        // A second load of the same file reproduces the key.
        let again = FileBackedCipher::load(file.path()).unwrap();
        assert_eq!(again.decrypt_string_with(&encrypted, &c).unwrap(), "data");
    }

    #[test]
    fn file_requires_path() {
        let err = FileBackedCipher::load("").err().unwrap();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.key");
        let err = FileBackedCipher::load(path).err().unwrap();
        assert!(matches!(err, CryptoError::KeyLoad(_)));
    }

    #[test]
    fn file_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = FileBackedCipher::load(file.path()).err().unwrap();
        assert!(err.to_string().contains("at least 1 byte"));
    }
}
