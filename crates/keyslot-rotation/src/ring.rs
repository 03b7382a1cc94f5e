use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::slot::KeySlot;

/// Fixed-size circular array of key slots plus the index of the slot that
/// currently encrypts.
///
/// Each slot is published with a single atomic pointer swap, so readers never
/// lock and never see a half-built slot. Writers are serialized by the
/// manager's mint lock; the ring itself does not lock.
pub(crate) struct KeySlotRing {
    slots: Box<[ArcSwapOption<KeySlot>]>,
    current: AtomicUsize,
}

impl KeySlotRing {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| ArcSwapOption::empty()).collect(),
            current: AtomicUsize::new(0),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn current_index(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub(crate) fn load(&self, index: usize) -> Option<Arc<KeySlot>> {
        self.slots.get(index).and_then(|slot| slot.load_full())
    }

    /// Publish `slot` at `index` and make it current. The slot store happens
    /// before the index store, so a reader that sees the new index also sees
    /// the new slot.
    pub(crate) fn install_current(&self, index: usize, slot: Arc<KeySlot>) -> Option<Arc<KeySlot>> {
        let previous = self.slots[index].swap(Some(slot));
        self.current.store(index, Ordering::Release);
        previous
    }

    pub(crate) fn evict(&self, index: usize) -> Option<Arc<KeySlot>> {
        self.slots[index].swap(None)
    }

    /// Indices from the current slot walking backward, wrapping once.
    pub(crate) fn scan_order(&self) -> impl Iterator<Item = usize> {
        let len = self.len();
        let start = self.current_index();
        (0..len).map(move |step| (start + len - step) % len)
    }
}
