//! Password-based AES-GCM envelopes and ephemeral key sources.

pub mod base64;
pub mod cipher;
pub mod envelope;
pub mod ephemeral;
pub mod error;
pub mod kdf;
pub mod types;
pub mod variant;

pub use base64::{base64_decode, base64_encode};
pub use cipher::{generate_iv, random_bytes, AeadCipher, CipherParams};
pub use envelope::CipherEnvelope;
pub use ephemeral::{generate_key_material, EphemeralCipher, FileBackedCipher, MemoryBackedCipher};
pub use error::CryptoError;
pub use kdf::{derive_key, derive_key_named, KdfAlgorithm};
pub use types::{
    AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, DEFAULT_EPHEMERAL_KEY_BITS, DEFAULT_KDF_ITERATIONS,
    DEFAULT_SALT_LENGTH, ENVELOPE_DELIMITER,
};
pub use variant::CipherVariant;
