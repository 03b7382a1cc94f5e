use base64ct::{Base64, Encoding};

use crate::error::CryptoError;

/// Standard padded Base64 encode. Output never contains the envelope delimiter.
pub fn base64_encode(data: &[u8]) -> String {
    Base64::encode_string(data)
}

/// Standard padded Base64 decode.
///
/// Any decoding failure is reported as a malformed envelope, since every
/// Base64 string this crate reads is a segment of one.
pub fn base64_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    Base64::decode_vec(s)
        .map_err(|e| CryptoError::MalformedEnvelope(format!("invalid base64 segment: {}", e)))
}
