//! Rotating in-memory key manager.
//!
//! Keys are minted on demand when an encrypt finds the current slot empty or
//! past its encryption deadline. An expired current key rotates forward one
//! slot, overwriting whatever lived there. Decryption walks back through the
//! ring looking for the slot id carried in the envelope.
//!
//! Slot lifecycle:
//! absent -> encrypts and decrypts -> decrypts only -> absent

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use keyslot_crypto::{AeadCipher, CipherEnvelope, CryptoError, EphemeralCipher, ENVELOPE_DELIMITER};

use crate::clock::{Clock, SystemClock};
use crate::config::RotationConfig;
use crate::ring::KeySlotRing;
use crate::slot::{encode_slot_id, split_tagged, KeySlot, SlotInfo};

/// State only touched while holding the mint lock.
struct Minter {
    next_id: u32,
    minted: u64,
}

pub struct RotatingKeyManager {
    config: RotationConfig,
    decryption_ttl_ms: u64,
    ring: KeySlotRing,
    minter: Mutex<Minter>,
    clock: Arc<dyn Clock>,
}

impl RotatingKeyManager {
    pub fn new(config: RotationConfig) -> Result<Self, CryptoError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RotationConfig, clock: Arc<dyn Clock>) -> Result<Self, CryptoError> {
        config.validate()?;
        let decryption_ttl_ms = config.decryption_ttl_ms()?;

        // Ids count up from a random start so two managers rarely agree on one.
        let mut seed = [0u8; 4];
        getrandom::getrandom(&mut seed).map_err(|e| CryptoError::RngFailed(e.to_string()))?;

        Ok(Self {
            config,
            decryption_ttl_ms,
            ring: KeySlotRing::new(config.slot_count),
            minter: Mutex::new(Minter {
                next_id: u32::from_be_bytes(seed),
                minted: 0,
            }),
            clock,
        })
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub fn slot_count(&self) -> usize {
        self.ring.len()
    }

    pub fn current_index(&self) -> usize {
        self.ring.current_index()
    }

    pub fn slot_info(&self, index: usize) -> Option<SlotInfo> {
        self.ring.load(index).map(|slot| slot.info())
    }

    /// Total keys minted over the lifetime of this manager.
    pub fn keys_minted(&self) -> u64 {
        self.minter.lock().minted
    }

    /// Encrypt `data` under the current slot key, minting or rotating first
    /// when needed.
    ///
    /// Returns: base64(slot id) $ <envelope>
    pub fn encrypt_with_rotation(
        &self,
        data: &[u8],
        cipher: &AeadCipher,
    ) -> Result<String, CryptoError> {
        let slot = self.encryption_slot()?;
        let body = cipher.encrypt(data, slot.key())?;

        let mut out = encode_slot_id(slot.id());
        out.push(ENVELOPE_DELIMITER);
        out.push_str(&body);
        Ok(out)
    }

    /// Decrypt a value produced by [`RotatingKeyManager::encrypt_with_rotation`].
    ///
    /// Fails with `NoMatchingKey` once the originating slot has been
    /// overwritten or has passed its decryption deadline.
    pub fn decrypt_with_rotation(
        &self,
        data: &str,
        cipher: &AeadCipher,
    ) -> Result<Vec<u8>, CryptoError> {
        let (id, body) = split_tagged(data)?;
        let envelope = CipherEnvelope::decode(body)?;
        let now = self.clock.now_millis();

        for index in self.ring.scan_order() {
            let Some(slot) = self.ring.load(index) else {
                continue;
            };
            if slot.id() != id || !slot.accepts_decrypt(now) {
                continue;
            }

            match cipher.decrypt_envelope(&envelope, slot.key()) {
                Ok(plaintext) => return Ok(plaintext),
                // An id collision looks exactly like this; keep looking.
                Err(CryptoError::AuthenticationFailure) => {
                    tracing::trace!(slot_id = id, index, "slot id matched but key did not");
                }
                Err(e) => return Err(e),
            }
        }

        Err(CryptoError::NoMatchingKey)
    }

    /// Drop non-current slots whose decryption deadline has passed, wiping
    /// their keys now rather than on the next overwrite.
    pub fn purge_expired(&self) -> usize {
        let _minter = self.minter.lock();
        let now = self.clock.now_millis();
        let current = self.ring.current_index();

        let mut purged = 0;
        for index in (0..self.ring.len()).filter(|&i| i != current) {
            let expired = self
                .ring
                .load(index)
                .is_some_and(|slot| !slot.accepts_decrypt(now));
            if expired {
                self.ring.evict(index);
                purged += 1;
            }
        }

        if purged > 0 {
            tracing::debug!(purged, "purged expired key slots");
        }
        purged
    }

    /// Current slot if it can still encrypt, otherwise mint under the lock.
    fn encryption_slot(&self) -> Result<Arc<KeySlot>, CryptoError> {
        let now = self.clock.now_millis();
        if let Some(slot) = self.ring.load(self.ring.current_index()) {
            if slot.accepts_encrypt(now) {
                return Ok(slot);
            }
        }
        self.mint_current()
    }

    /// Re-checks the current slot under the mint lock, since the unlocked read
    /// in `encryption_slot` may be stale. An empty current slot is filled in
    /// place; an expired one rotates forward one index.
    fn mint_current(&self) -> Result<Arc<KeySlot>, CryptoError> {
        let mut minter = self.minter.lock();
        let now = self.clock.now_millis();
        let index = self.ring.current_index();

        let target = match self.ring.load(index) {
            None => index,
            Some(slot) if slot.accepts_encrypt(now) => return Ok(slot),
            Some(_) => (index + 1) % self.ring.len(),
        };

        let slot = KeySlot::mint(
            minter.next_id,
            self.config.key_bits,
            now,
            self.config.encryption_ttl_ms,
            self.decryption_ttl_ms,
        )?;
        let slot = Arc::new(slot);
        minter.next_id = minter.next_id.wrapping_add(1);
        minter.minted += 1;

        let evicted = self.ring.install_current(target, Arc::clone(&slot));
        tracing::debug!(
            slot_id = slot.id(),
            index = target,
            rotated = target != index || evicted.is_some(),
            evicted_id = evicted.as_ref().map(|s| s.id()),
            "minted key"
        );
        Ok(slot)
    }
}

impl EphemeralCipher for RotatingKeyManager {
    fn encrypt_with(&self, data: &[u8], cipher: &AeadCipher) -> Result<String, CryptoError> {
        self.encrypt_with_rotation(data, cipher)
    }

    fn decrypt_with(&self, data: &str, cipher: &AeadCipher) -> Result<Vec<u8>, CryptoError> {
        self.decrypt_with_rotation(data, cipher)
    }
}

impl fmt::Debug for RotatingKeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingKeyManager")
            .field("config", &self.config)
            .field("current_index", &self.ring.current_index())
            .finish_non_exhaustive()
    }
}
