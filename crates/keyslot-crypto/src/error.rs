use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid algorithm name, key size or iteration count. Raised at
    /// construction time; never worth retrying.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Tag verification failed. Wrong password, wrong salt and corrupted
    /// ciphertext all land here and are not told apart.
    #[error("Authentication failed")]
    AuthenticationFailure,

    #[error("Unable to decrypt value using available keys")]
    NoMatchingKey,

    #[error("Decrypted value is not valid UTF-8")]
    InvalidUtf8,

    #[error("Key load failed: {0}")]
    KeyLoad(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
