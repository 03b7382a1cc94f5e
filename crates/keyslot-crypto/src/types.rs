/// Separator between envelope segments. Never produced by standard Base64.
pub const ENVELOPE_DELIMITER: char = '$';

/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// Salt length used when the caller does not supply one.
pub const DEFAULT_SALT_LENGTH: usize = 16;

/// PBKDF2 iteration count shared by the built-in cipher variants.
pub const DEFAULT_KDF_ITERATIONS: u32 = 101_113;

/// Size of randomly generated ephemeral keys, in bits.
pub const DEFAULT_EPHEMERAL_KEY_BITS: usize = 4096;
