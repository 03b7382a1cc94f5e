//! AES-GCM encryption under password-derived keys.
//!
//! Every call derives a fresh key from the password and the salt, so the same
//! password yields a different key per envelope. See [`crate::envelope`] for
//! the text format.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use zeroize::Zeroizing;

use crate::envelope::CipherEnvelope;
use crate::error::CryptoError;
use crate::kdf::{derive_key, KdfAlgorithm};
use crate::types::{AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, DEFAULT_SALT_LENGTH};

/// Fill a new buffer from the OS random source.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut buf = vec![0u8; len];
    getrandom::getrandom(&mut buf).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(buf)
}

/// Generate a random 12-byte IV for AES-GCM.
pub fn generate_iv() -> Result<[u8; AES_GCM_IV_LENGTH], CryptoError> {
    let mut iv = [0u8; AES_GCM_IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

/// Parameters that distinguish one cipher variant from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherParams {
    /// AES key size in bits (128 or 256).
    pub key_bits: usize,
    pub kdf: KdfAlgorithm,
    pub iterations: u32,
}

impl CipherParams {
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.key_bits != 128 && self.key_bits != 256 {
            return Err(CryptoError::Configuration(format!(
                "AES key size must be 128 or 256 bits, got {}",
                self.key_bits
            )));
        }
        if self.iterations == 0 {
            return Err(CryptoError::Configuration(
                "KDF iteration count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Password-based AES-GCM cipher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadCipher {
    params: CipherParams,
}

impl AeadCipher {
    pub fn new(params: CipherParams) -> Result<Self, CryptoError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// For the built-in variant table, whose parameters are known good.
    pub(crate) const fn from_params(params: CipherParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CipherParams {
        &self.params
    }

    pub fn key_bits(&self) -> usize {
        self.params.key_bits
    }

    fn derive(&self, password: &[u8], salt: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        derive_key(
            self.params.kdf,
            password,
            salt,
            self.params.iterations,
            self.params.key_bits,
        )
    }

    /// Encrypt with a random salt and IV.
    ///
    /// Returns the envelope text: base64(IV) $ base64(salt) $ base64(ciphertext+tag)
    pub fn encrypt(&self, plaintext: &[u8], password: &[u8]) -> Result<String, CryptoError> {
        let salt = random_bytes(DEFAULT_SALT_LENGTH)?;
        self.encrypt_with_salt(plaintext, password, &salt)
    }

    /// Encrypt with a caller-supplied salt and a random IV.
    pub fn encrypt_with_salt(
        &self,
        plaintext: &[u8],
        password: &[u8],
        salt: &[u8],
    ) -> Result<String, CryptoError> {
        let iv = generate_iv()?;
        let ciphertext = self.encrypt_raw(plaintext, password, salt, &iv)?;
        Ok(CipherEnvelope {
            iv,
            salt: salt.to_vec(),
            ciphertext,
        }
        .encode())
    }

    /// Encrypt with caller-managed salt and IV. Returns ciphertext+tag only;
    /// the caller is responsible for keeping salt and IV.
    pub fn encrypt_raw(
        &self,
        plaintext: &[u8],
        password: &[u8],
        salt: &[u8],
        iv: &[u8; AES_GCM_IV_LENGTH],
    ) -> Result<Vec<u8>, CryptoError> {
        let key = self.derive(password, salt)?;
        seal(&key, iv, plaintext)
    }

    /// Decrypt envelope text produced by [`AeadCipher::encrypt`].
    pub fn decrypt(&self, envelope: &str, password: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let envelope = CipherEnvelope::decode(envelope)?;
        self.decrypt_envelope(&envelope, password)
    }

    pub fn decrypt_envelope(
        &self,
        envelope: &CipherEnvelope,
        password: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.decrypt_raw(&envelope.ciphertext, password, &envelope.salt, &envelope.iv)
    }

    /// Decrypt envelope text and interpret the plaintext as UTF-8.
    pub fn decrypt_string(&self, envelope: &str, password: &[u8]) -> Result<String, CryptoError> {
        let plaintext = self.decrypt(envelope, password)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Inverse of [`AeadCipher::encrypt_raw`].
    pub fn decrypt_raw(
        &self,
        ciphertext: &[u8],
        password: &[u8],
        salt: &[u8],
        iv: &[u8; AES_GCM_IV_LENGTH],
    ) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < AES_GCM_TAG_LENGTH {
            return Err(CryptoError::MalformedEnvelope(
                "ciphertext shorter than authentication tag".to_string(),
            ));
        }
        let key = self.derive(password, salt)?;
        open(&key, iv, ciphertext)
    }
}

fn seal(
    key: &[u8],
    iv: &[u8; AES_GCM_IV_LENGTH],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    match key.len() {
        16 => seal_with::<Aes128Gcm>(key, iv, plaintext),
        32 => seal_with::<Aes256Gcm>(key, iv, plaintext),
        n => Err(CryptoError::Configuration(format!(
            "no AES-GCM variant for a {}-byte key",
            n
        ))),
    }
}

fn open(
    key: &[u8],
    iv: &[u8; AES_GCM_IV_LENGTH],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    match key.len() {
        16 => open_with::<Aes128Gcm>(key, iv, ciphertext),
        32 => open_with::<Aes256Gcm>(key, iv, ciphertext),
        n => Err(CryptoError::Configuration(format!(
            "no AES-GCM variant for a {}-byte key",
            n
        ))),
    }
}

fn seal_with<C>(
    key: &[u8],
    iv: &[u8; AES_GCM_IV_LENGTH],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError>
where
    C: Aead + AeadCore + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    cipher
        .encrypt(Nonce::<C>::from_slice(iv), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

fn open_with<C>(
    key: &[u8],
    iv: &[u8; AES_GCM_IV_LENGTH],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError>
where
    C: Aead + AeadCore + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    cipher
        .decrypt(Nonce::<C>::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailure)
}
