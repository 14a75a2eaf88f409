// SPDX-License-Identifier: Apache-2.0

//! Memory pool backing every node and every duplicated string of a document.
//!
//! The pool is one contiguous byte region. Fixed-size slots are handed out from
//! the front, growing forward, and strings from the back, growing backward.
//! Slots are addressed by index and strings by their distance from the end of
//! the region, so growing the pool is a bulk copy of the string region to the
//! new end and no stored handle ever needs rewriting.

/// Size in bytes of a single node slot.
pub const SLOT_SIZE: usize = 16;

/// Smallest capacity a growable pool reallocates to.
const MIN_GROWTH: usize = 64;

/// Error type for MemoryPool operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The slot and string regions would overlap and the pool could not grow.
    Exhausted,
}

/// Backing storage of a [`MemoryPool`].
///
/// Fixed storage (`&mut [u8]`, `[u8; N]`) never grows. `Vec<u8>` storage
/// (with the `alloc` feature) grows on demand up to the pool's maximum capacity.
pub trait PoolStorage {
    /// The entire storage region.
    fn bytes(&self) -> &[u8];
    /// The entire storage region, mutably.
    fn bytes_mut(&mut self) -> &mut [u8];
    /// Resize the region to `new_len` bytes keeping existing bytes at their offsets.
    ///
    /// Returns false, leaving the storage untouched, when it cannot be resized.
    fn try_resize(&mut self, new_len: usize) -> bool {
        let _ = new_len;
        false
    }
}

impl PoolStorage for &mut [u8] {
    fn bytes(&self) -> &[u8] {
        self
    }
    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

impl<const N: usize> PoolStorage for [u8; N] {
    fn bytes(&self) -> &[u8] {
        self
    }
    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

#[cfg(feature = "alloc")]
impl PoolStorage for alloc::vec::Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self
    }
    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }
    fn try_resize(&mut self, new_len: usize) -> bool {
        let additional = new_len.saturating_sub(self.len());
        if self.try_reserve_exact(additional).is_err() {
            return false;
        }
        self.resize(new_len, 0);
        true
    }
}

/// Index of a slot in the pool's slot region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotId(u32);

impl SlotId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// The slot directly after this one.
    pub(crate) fn successor(self) -> SlotId {
        SlotId(self.0.saturating_add(1))
    }

    /// Link encoding used inside slots: 0 is "no slot".
    pub(crate) fn to_link(slot: Option<SlotId>) -> u32 {
        slot.map_or(0, |s| s.0.saturating_add(1))
    }

    pub(crate) fn from_link(link: u32) -> Option<SlotId> {
        link.checked_sub(1).map(SlotId)
    }
}

/// Handle to string content referenced by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StrRef {
    /// Copy held in the string region, starting `tail` bytes before the pool end.
    Owned { tail: u32, len: u32 },
    /// Span of the caller's input, which outlives the document.
    Borrowed { start: u32, len: u32 },
}

/// Bytes of an owned string inside a pool region.
pub(crate) fn owned_bytes(region: &[u8], tail: u32, len: u32) -> &[u8] {
    let start = region.len().saturating_sub(tail as usize);
    let end = start.saturating_add(len as usize);
    region.get(start..end).unwrap_or(&[])
}

/// A single-region allocator for document nodes and strings.
///
/// Layout: `[ slots -> | staged string | free | <- strings ]`
#[derive(Debug)]
pub struct MemoryPool<S: PoolStorage> {
    storage: S,
    /// High-water mark of the slot region, in bytes from offset 0
    slots_len: usize,
    /// Size of the string region, which ends at the pool capacity
    strings_len: usize,
    /// Bytes of a string being built directly after the slot region
    staged_len: usize,
    max_capacity: usize,
}

impl<S: PoolStorage> MemoryPool<S> {
    /// Creates a pool over `storage` that never grows past its initial size.
    pub fn new(storage: S) -> Self {
        let capacity = storage.bytes().len();
        Self::with_max_capacity(storage, capacity)
    }

    /// Creates a pool over `storage` that may grow up to `max_capacity` bytes,
    /// provided the storage supports resizing.
    pub fn with_max_capacity(storage: S, max_capacity: usize) -> Self {
        let capacity = storage.bytes().len();
        Self {
            storage,
            slots_len: 0,
            strings_len: 0,
            staged_len: 0,
            max_capacity: max_capacity.max(capacity),
        }
    }

    /// Current size of the backing region in bytes.
    pub fn capacity(&self) -> usize {
        self.storage.bytes().len()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Bytes consumed by slots and committed strings.
    pub fn memory_usage(&self) -> usize {
        self.slots_len.saturating_add(self.strings_len)
    }

    /// Wipes the pool. Every previously issued handle becomes invalid.
    pub fn clear(&mut self) {
        self.slots_len = 0;
        self.strings_len = 0;
        self.staged_len = 0;
    }

    /// Reallocates the backing region to `new_capacity` bytes.
    ///
    /// The slot region keeps its offsets and the string region moves to the new
    /// end. Either the whole operation succeeds or the pool is left unchanged.
    pub fn grow(&mut self, new_capacity: usize) -> Result<(), PoolError> {
        let old_capacity = self.capacity();
        if new_capacity <= old_capacity {
            return Ok(());
        }
        if new_capacity > self.max_capacity || u32::try_from(new_capacity).is_err() {
            log::debug!(
                "pool cannot grow to {} bytes (max {})",
                new_capacity,
                self.max_capacity
            );
            return Err(PoolError::Exhausted);
        }
        if !self.storage.try_resize(new_capacity) {
            log::debug!("pool storage refused to resize to {} bytes", new_capacity);
            return Err(PoolError::Exhausted);
        }
        let strings_from = old_capacity - self.strings_len;
        let strings_to = new_capacity - self.strings_len;
        self.storage
            .bytes_mut()
            .copy_within(strings_from..old_capacity, strings_to);
        log::debug!(
            "pool grew from {} to {} bytes, relocated {} string bytes",
            old_capacity,
            new_capacity,
            self.strings_len
        );
        Ok(())
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        self.storage.bytes()
    }

    fn used(&self) -> usize {
        self.slots_len
            .saturating_add(self.staged_len)
            .saturating_add(self.strings_len)
    }

    /// Makes room for `additional` bytes between the regions, growing if allowed.
    fn reserve(&mut self, additional: usize) -> Result<(), PoolError> {
        let needed = self
            .used()
            .checked_add(additional)
            .ok_or(PoolError::Exhausted)?;
        let capacity = self.capacity();
        if needed <= capacity {
            return Ok(());
        }
        let mut target = capacity.max(MIN_GROWTH);
        while target < needed {
            target = target.saturating_mul(2);
        }
        self.grow(target.min(self.max_capacity).max(needed))
    }

    /// Allocates `count` zeroed, adjacent slots and returns the first one.
    pub(crate) fn alloc_slots(&mut self, count: usize) -> Result<SlotId, PoolError> {
        let size = count.checked_mul(SLOT_SIZE).ok_or(PoolError::Exhausted)?;
        let first = self.slots_len / SLOT_SIZE;
        let last = first.checked_add(count).ok_or(PoolError::Exhausted)?;
        // Links store index + 1, so the last index must stay below u32::MAX
        if last >= u32::MAX as usize {
            return Err(PoolError::Exhausted);
        }
        let id = u32::try_from(first).map_err(|_| PoolError::Exhausted)?;
        self.reserve(size)?;
        let start = self.slots_len;
        let region = self
            .storage
            .bytes_mut()
            .get_mut(start..start + size)
            .ok_or(PoolError::Exhausted)?;
        region.fill(0);
        self.slots_len += size;
        Ok(SlotId(id))
    }

    pub(crate) fn slot(&self, id: SlotId) -> Option<&[u8]> {
        let start = id.index().checked_mul(SLOT_SIZE)?;
        if start >= self.slots_len {
            return None;
        }
        self.storage.bytes().get(start..start + SLOT_SIZE)
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> Option<&mut [u8]> {
        let start = id.index().checked_mul(SLOT_SIZE)?;
        if start >= self.slots_len {
            return None;
        }
        self.storage.bytes_mut().get_mut(start..start + SLOT_SIZE)
    }

    /// Copies `bytes` into the string region.
    pub(crate) fn alloc_string(&mut self, bytes: &[u8]) -> Result<StrRef, PoolError> {
        self.begin_string();
        self.push_string_bytes(bytes)?;
        self.commit_string()
    }

    /// Starts building a string in the free gap after the slot region.
    ///
    /// No slot may be allocated until the string is committed or abandoned.
    pub(crate) fn begin_string(&mut self) {
        self.staged_len = 0;
    }

    pub(crate) fn push_string_bytes(&mut self, bytes: &[u8]) -> Result<(), PoolError> {
        self.reserve(bytes.len())?;
        let at = self.slots_len + self.staged_len;
        let dest = self
            .storage
            .bytes_mut()
            .get_mut(at..at + bytes.len())
            .ok_or(PoolError::Exhausted)?;
        dest.copy_from_slice(bytes);
        self.staged_len += bytes.len();
        Ok(())
    }

    pub(crate) fn push_string_byte(&mut self, byte: u8) -> Result<(), PoolError> {
        self.push_string_bytes(&[byte])
    }

    /// The string built so far.
    pub(crate) fn staged(&self) -> &[u8] {
        let start = self.slots_len;
        self.storage
            .bytes()
            .get(start..start + self.staged_len)
            .unwrap_or(&[])
    }

    /// Moves the staged string into the string region.
    pub(crate) fn commit_string(&mut self) -> Result<StrRef, PoolError> {
        let len = self.staged_len;
        let tail_len = self.strings_len + len;
        let tail = u32::try_from(tail_len).map_err(|_| PoolError::Exhausted)?;
        let len32 = u32::try_from(len).map_err(|_| PoolError::Exhausted)?;
        let dest = self.capacity() - tail_len;
        let start = self.slots_len;
        self.storage
            .bytes_mut()
            .copy_within(start..start + len, dest);
        self.strings_len = tail_len;
        self.staged_len = 0;
        Ok(StrRef::Owned { tail, len: len32 })
    }

    /// Drops the staged string.
    pub(crate) fn abandon_string(&mut self) {
        self.staged_len = 0;
    }

    /// Releases `string` if it is the most recently committed one.
    pub(crate) fn reclaim_string(&mut self, string: StrRef) {
        if let StrRef::Owned { tail, len } = string {
            if tail as usize == self.strings_len {
                self.strings_len -= len as usize;
            }
        }
    }

    pub(crate) fn owned_string(&self, tail: u32, len: u32) -> &[u8] {
        owned_bytes(self.storage.bytes(), tail, len)
    }
}
