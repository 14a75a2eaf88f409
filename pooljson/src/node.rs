// SPDX-License-Identifier: Apache-2.0

//! Tagged-union nodes and their 16-byte slot encoding.
//!
//! Slot layout:
//! - byte 0: tag
//! - byte 1: boolean payload
//! - bytes 4..8: link to the next sibling (slot index + 1, 0 for none)
//! - bytes 8..16: payload (integer, float bits, string handle, list head/tail)
//!
//! An object member occupies two adjacent slots: the key (a string node that
//! carries the sibling link) followed by its value.

use crate::pool::{MemoryPool, PoolError, PoolStorage, SlotId, StrRef};

// Type alias for the configured integer type
#[cfg(feature = "int32")]
pub type Integer = i32;
#[cfg(feature = "int64")]
pub type Integer = i64;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_OWNED_STR: u8 = 4;
const TAG_BORROWED_STR: u8 = 5;
const TAG_ARRAY: u8 = 6;
const TAG_OBJECT: u8 = 7;

const NEXT_AT: usize = 4;
const PAYLOAD_AT: usize = 8;

/// Head and tail of a singly-linked chain of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct List {
    pub head: Option<SlotId>,
    pub tail: Option<SlotId>,
}

/// Decoded content of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NodeData {
    Null,
    Bool(bool),
    Int(Integer),
    Float(f64),
    Str(StrRef),
    Array(List),
    Object(List),
}

fn read_u32(slot: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    if let Some(src) = slot.get(at..at + 4) {
        buf.copy_from_slice(src);
    }
    u32::from_le_bytes(buf)
}

fn write_u32(slot: &mut [u8], at: usize, value: u32) {
    if let Some(dest) = slot.get_mut(at..at + 4) {
        dest.copy_from_slice(&value.to_le_bytes());
    }
}

fn read_u64(slot: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    if let Some(src) = slot.get(at..at + 8) {
        buf.copy_from_slice(src);
    }
    u64::from_le_bytes(buf)
}

fn write_u64(slot: &mut [u8], at: usize, value: u64) {
    if let Some(dest) = slot.get_mut(at..at + 8) {
        dest.copy_from_slice(&value.to_le_bytes());
    }
}

impl NodeData {
    /// Decodes the node stored in `slot`. Unknown tags read as null.
    pub(crate) fn decode(slot: &[u8]) -> NodeData {
        let pair = |slot: &[u8]| {
            (
                read_u32(slot, PAYLOAD_AT),
                read_u32(slot, PAYLOAD_AT + 4),
            )
        };
        match slot.first().copied().unwrap_or(TAG_NULL) {
            TAG_BOOL => NodeData::Bool(slot.get(1).copied().unwrap_or(0) != 0),
            TAG_INT => NodeData::Int(read_u64(slot, PAYLOAD_AT) as i64 as Integer),
            TAG_FLOAT => NodeData::Float(f64::from_bits(read_u64(slot, PAYLOAD_AT))),
            TAG_OWNED_STR => {
                let (tail, len) = pair(slot);
                NodeData::Str(StrRef::Owned { tail, len })
            }
            TAG_BORROWED_STR => {
                let (start, len) = pair(slot);
                NodeData::Str(StrRef::Borrowed { start, len })
            }
            TAG_ARRAY | TAG_OBJECT => {
                let (head, tail) = pair(slot);
                let list = List {
                    head: SlotId::from_link(head),
                    tail: SlotId::from_link(tail),
                };
                if slot.first() == Some(&TAG_ARRAY) {
                    NodeData::Array(list)
                } else {
                    NodeData::Object(list)
                }
            }
            _ => NodeData::Null,
        }
    }

    /// Encodes this node into `slot`, leaving its sibling link untouched.
    pub(crate) fn encode(&self, slot: &mut [u8]) {
        let (tag, flag, payload) = match *self {
            NodeData::Null => (TAG_NULL, 0, 0),
            NodeData::Bool(b) => (TAG_BOOL, u8::from(b), 0),
            NodeData::Int(i) => (TAG_INT, 0, i as i64 as u64),
            NodeData::Float(f) => (TAG_FLOAT, 0, f.to_bits()),
            NodeData::Str(StrRef::Owned { tail, len }) => {
                (TAG_OWNED_STR, 0, join(tail, len))
            }
            NodeData::Str(StrRef::Borrowed { start, len }) => {
                (TAG_BORROWED_STR, 0, join(start, len))
            }
            NodeData::Array(list) => (TAG_ARRAY, 0, join_list(list)),
            NodeData::Object(list) => (TAG_OBJECT, 0, join_list(list)),
        };
        if let Some(header) = slot.get_mut(0..2) {
            header.copy_from_slice(&[tag, flag]);
        }
        write_u64(slot, PAYLOAD_AT, payload);
    }
}

fn join(low: u32, high: u32) -> u64 {
    u64::from(low) | (u64::from(high) << 32)
}

fn join_list(list: List) -> u64 {
    join(SlotId::to_link(list.head), SlotId::to_link(list.tail))
}

/// Sibling of the node stored in `slot`.
pub(crate) fn next_sibling(slot: &[u8]) -> Option<SlotId> {
    SlotId::from_link(read_u32(slot, NEXT_AT))
}

/// Tree building operations: append-only, no lookups.
impl<S: PoolStorage> MemoryPool<S> {
    fn link(&mut self, list: &mut List, slot: SlotId) {
        if let Some(tail) = list.tail {
            if let Some(bytes) = self.slot_mut(tail) {
                write_u32(bytes, NEXT_AT, SlotId::to_link(Some(slot)));
            }
        } else {
            list.head = Some(slot);
        }
        list.tail = Some(slot);
    }

    /// Appends a null element to an array list and returns its slot.
    pub(crate) fn append_element(&mut self, list: &mut List) -> Result<SlotId, PoolError> {
        let slot = self.alloc_slots(1)?;
        self.link(list, slot);
        Ok(slot)
    }

    /// Appends a member with a null value to an object list and returns the value slot.
    pub(crate) fn append_member(
        &mut self,
        list: &mut List,
        key: StrRef,
    ) -> Result<SlotId, PoolError> {
        let key_slot = self.alloc_slots(2)?;
        self.write_node(key_slot, NodeData::Str(key));
        self.link(list, key_slot);
        Ok(key_slot.successor())
    }

    pub(crate) fn write_node(&mut self, slot: SlotId, data: NodeData) {
        if let Some(bytes) = self.slot_mut(slot) {
            data.encode(bytes);
        }
    }

    #[cfg(test)]
    pub(crate) fn read_node(&self, slot: SlotId) -> NodeData {
        self.slot(slot).map_or(NodeData::Null, NodeData::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SLOT_SIZE;

    #[test]
    fn test_scalar_encoding() {
        let cases = [
            NodeData::Null,
            NodeData::Bool(true),
            NodeData::Bool(false),
            NodeData::Int(-42),
            NodeData::Int(Integer::MAX),
            NodeData::Float(2.5),
            NodeData::Str(StrRef::Owned { tail: 12, len: 5 }),
            NodeData::Str(StrRef::Borrowed { start: 3, len: 9 }),
        ];
        for data in cases {
            let mut slot = [0u8; SLOT_SIZE];
            data.encode(&mut slot);
            assert_eq!(NodeData::decode(&slot), data);
        }
    }

    #[test]
    fn test_encoding_keeps_sibling_link() {
        let mut slot = [0u8; SLOT_SIZE];
        write_u32(&mut slot, NEXT_AT, 9);
        NodeData::Int(7).encode(&mut slot);
        assert_eq!(next_sibling(&slot).map(SlotId::index), Some(8));
        assert_eq!(NodeData::decode(&slot), NodeData::Int(7));
    }

    #[test]
    fn test_zeroed_slot_is_null_without_sibling() {
        let slot = [0u8; SLOT_SIZE];
        assert_eq!(NodeData::decode(&slot), NodeData::Null);
        assert_eq!(next_sibling(&slot), None);
    }

    #[test]
    fn test_append_links_in_order() {
        let mut pool = MemoryPool::new([0u8; 128]);
        let mut list = List::default();
        let first = pool.append_element(&mut list).unwrap();
        let second = pool.append_element(&mut list).unwrap();
        pool.write_node(first, NodeData::Int(1));
        pool.write_node(second, NodeData::Int(2));

        assert_eq!(list.head, Some(first));
        assert_eq!(list.tail, Some(second));
        assert_eq!(pool.slot(first).and_then(next_sibling), Some(second));
        assert_eq!(pool.slot(second).and_then(next_sibling), None);
        assert_eq!(pool.read_node(second), NodeData::Int(2));
    }

    #[test]
    fn test_append_member_uses_adjacent_slots() {
        let mut pool = MemoryPool::new([0u8; 128]);
        let mut list = List::default();
        let key = StrRef::Borrowed { start: 0, len: 1 };
        let value = pool.append_member(&mut list, key).unwrap();
        let key_slot = list.head.unwrap();
        assert_eq!(key_slot.successor(), value);
        assert_eq!(pool.read_node(key_slot), NodeData::Str(key));
        assert_eq!(pool.read_node(value), NodeData::Null);
        assert_eq!(pool.memory_usage(), 2 * SLOT_SIZE);
    }
}
