//! Key slots and the slot-id prefix on rotating envelopes.
//!
//! Rotating envelope format:
//! base64(slot id: u32 BE) $ <password envelope keyed by the slot's key>

use std::fmt;

use zeroize::Zeroizing;

use keyslot_crypto::{
    base64_decode, base64_encode, generate_key_material, CryptoError, ENVELOPE_DELIMITER,
};

/// One minted key and its two deadlines. Key bytes are wiped when the last
/// reference is dropped.
pub(crate) struct KeySlot {
    id: u32,
    key: Zeroizing<Vec<u8>>,
    encrypt_until: u64,
    decrypt_until: u64,
}

impl KeySlot {
    pub(crate) fn mint(
        id: u32,
        key_bits: usize,
        now: u64,
        encryption_ttl_ms: u64,
        decryption_ttl_ms: u64,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            id,
            key: generate_key_material(key_bits)?,
            encrypt_until: now.saturating_add(encryption_ttl_ms),
            decrypt_until: now.saturating_add(decryption_ttl_ms),
        })
    }

    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    pub(crate) fn accepts_encrypt(&self, now: u64) -> bool {
        now < self.encrypt_until
    }

    pub(crate) fn accepts_decrypt(&self, now: u64) -> bool {
        now < self.decrypt_until
    }

    pub(crate) fn info(&self) -> SlotInfo {
        SlotInfo {
            id: self.id,
            encrypt_until: self.encrypt_until,
            decrypt_until: self.decrypt_until,
        }
    }
}

impl fmt::Debug for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySlot")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .field("encrypt_until", &self.encrypt_until)
            .field("decrypt_until", &self.decrypt_until)
            .finish()
    }
}

/// Key-free view of a slot, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInfo {
    pub id: u32,
    /// Millisecond timestamp after which the key no longer encrypts.
    pub encrypt_until: u64,
    /// Millisecond timestamp after which the key no longer decrypts.
    pub decrypt_until: u64,
}

/// Base64 of the id as 4 big-endian bytes.
pub fn encode_slot_id(id: u32) -> String {
    base64_encode(&id.to_be_bytes())
}

pub fn decode_slot_id(segment: &str) -> Result<u32, CryptoError> {
    let bytes = base64_decode(segment)?;
    let bytes: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
        CryptoError::MalformedEnvelope(format!("slot id must be 4 bytes, got {}", bytes.len()))
    })?;
    Ok(u32::from_be_bytes(bytes))
}

/// Split a rotating envelope into its slot id and the inner envelope text.
pub fn split_tagged(text: &str) -> Result<(u32, &str), CryptoError> {
    let (id, rest) = text
        .split_once(ENVELOPE_DELIMITER)
        .ok_or_else(|| CryptoError::MalformedEnvelope("missing slot id".to_string()))?;
    Ok((decode_slot_id(id)?, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_is_big_endian() {
        assert_eq!(encode_slot_id(0x0102_0304), base64_encode(&[1, 2, 3, 4]));
        let encoded = encode_slot_id(0x0102_0304);
        assert_eq!(decode_slot_id(&encoded).unwrap(), 0x0102_0304);
        assert_eq!(decode_slot_id(&encode_slot_id(u32::MAX)).unwrap(), u32::MAX);
    }

    #[test]
    fn rejects_wrong_id_width() {
        let err = decode_slot_id(&base64_encode(&[1, 2, 3])).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedEnvelope(_)));
    }

    #[test]
    fn split_at_first_delimiter() {
        let text = format!("{}$a$b$c", encode_slot_id(7));
        let (id, rest) = split_tagged(&text).unwrap();
        assert_eq!(id, 7);
        assert_eq!(rest, "a$b$c");
    }

    #[test]
    fn split_requires_delimiter() {
        let err = split_tagged("AAAAAQ==").unwrap_err();
        assert!(err.to_string().contains("missing slot id"));
    }

    #[test]
    fn slot_deadlines() {
        let slot = KeySlot::mint(1, 64, 1_000, 100, 300).unwrap();
        assert_eq!(slot.key().len(), 8);
        assert!(slot.accepts_encrypt(1_099));
        assert!(!slot.accepts_encrypt(1_100));
        assert!(slot.accepts_decrypt(1_299));
        assert!(!slot.accepts_decrypt(1_300));
        assert_eq!(
            slot.info(),
            SlotInfo {
                id: 1,
                encrypt_until: 1_100,
                decrypt_until: 1_300
            }
        );
    }

    #[test]
    fn debug_redacts_key() {
        let slot = KeySlot::mint(1, 64, 0, 1, 1).unwrap();
        assert!(format!("{:?}", slot).contains("<redacted>"));
    }
}
