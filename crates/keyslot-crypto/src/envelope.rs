//! Text envelope for password-encrypted values.
//!
//! Wire format:
//! base64(IV:12) $ base64(salt) $ base64(ciphertext + tag:16)

use crate::base64::{base64_decode, base64_encode};
use crate::error::CryptoError;
use crate::types::{AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, ENVELOPE_DELIMITER};

/// One encrypted value together with everything needed to re-derive its key,
/// except the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherEnvelope {
    pub iv: [u8; AES_GCM_IV_LENGTH],
    pub salt: Vec<u8>,
    /// Ciphertext with the GCM tag appended.
    pub ciphertext: Vec<u8>,
}

impl CipherEnvelope {
    pub fn encode(&self) -> String {
        let mut out = base64_encode(&self.iv);
        out.push(ENVELOPE_DELIMITER);
        out.push_str(&base64_encode(&self.salt));
        out.push(ENVELOPE_DELIMITER);
        out.push_str(&base64_encode(&self.ciphertext));
        out
    }

    /// Parse the three-segment text form.
    pub fn decode(text: &str) -> Result<Self, CryptoError> {
        let parts: Vec<&str> = text.split(ENVELOPE_DELIMITER).collect();
        if parts.len() != 3 {
            return Err(CryptoError::MalformedEnvelope(format!(
                "expected 3 segments, got {}",
                parts.len()
            )));
        }

        let iv_bytes = base64_decode(parts[0])?;
        let iv: [u8; AES_GCM_IV_LENGTH] = iv_bytes.as_slice().try_into().map_err(|_| {
            CryptoError::MalformedEnvelope(format!(
                "IV must be {} bytes, got {}",
                AES_GCM_IV_LENGTH,
                iv_bytes.len()
            ))
        })?;
        let salt = base64_decode(parts[1])?;
        let ciphertext = base64_decode(parts[2])?;
        if ciphertext.len() < AES_GCM_TAG_LENGTH {
            return Err(CryptoError::MalformedEnvelope(
                "ciphertext shorter than authentication tag".to_string(),
            ));
        }

        Ok(Self {
            iv,
            salt,
            ciphertext,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CipherEnvelope {
        CipherEnvelope {
            iv: [7u8; AES_GCM_IV_LENGTH],
            salt: b"salt".to_vec(),
            ciphertext: vec![0xab; AES_GCM_TAG_LENGTH + 3],
        }
    }

    #[test]
    fn encodes_three_segments() {
        let text = sample().encode();
        let parts: Vec<&str> = text.split('$').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "BwcHBwcHBwcHBwcH");
        assert_eq!(parts[1], "c2FsdA==");
    }

    #[test]
    fn decode_inverts_encode() {
        let env = sample();
        assert_eq!(CipherEnvelope::decode(&env.encode()).unwrap(), env);
    }

    #[test]
    fn empty_salt_is_allowed() {
        let env = CipherEnvelope {
            salt: Vec::new(),
            ..sample()
        };
        assert_eq!(CipherEnvelope::decode(&env.encode()).unwrap().salt, b"");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for text in ["", "abc", "a$b", "a$b$c$d"] {
            let err = CipherEnvelope::decode(text).unwrap_err();
            assert!(matches!(err, CryptoError::MalformedEnvelope(_)), "{}", text);
        }
    }

    #[test]
    fn rejects_bad_base64() {
        let err = CipherEnvelope::decode("!!!$c2FsdA==$AAAA").unwrap_err();
        assert!(matches!(err, CryptoError::MalformedEnvelope(_)));
    }

    #[test]
    fn rejects_short_iv() {
        let text = format!(
            "{}${}${}",
            base64_encode(&[0u8; 8]),
            base64_encode(b"salt"),
            base64_encode(&[0u8; 32])
        );
        let err = CipherEnvelope::decode(&text).unwrap_err();
        assert!(err.to_string().contains("IV must be 12 bytes"));
    }

    #[test]
    fn rejects_truncated_ciphertext() {
        let text = format!(
            "{}${}${}",
            base64_encode(&[0u8; 12]),
            base64_encode(b"salt"),
            base64_encode(&[0u8; 4])
        );
        let err = CipherEnvelope::decode(&text).unwrap_err();
        assert!(err.to_string().contains("shorter than authentication tag"));
    }
}
