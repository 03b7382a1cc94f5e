//! Rotating in-memory AES key slots.
//!
//! A [`RotatingKeyManager`] hands out the current key for encryption and finds
//! the historical key for decryption. Keys live only in memory and age out on
//! a fixed schedule; nothing is persisted.

pub mod clock;
pub mod config;
pub mod manager;
mod ring;
pub mod slot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RotationConfig, DEFAULT_ENCRYPTION_TTL_MS, DEFAULT_SLOT_COUNT};
pub use manager::RotatingKeyManager;
pub use slot::{decode_slot_id, encode_slot_id, split_tagged, SlotInfo};
