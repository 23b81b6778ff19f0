//! Fixed-size index-tree record.
//!
//! ```text
//! key: u16 | a: u24 | b: u24          (little-endian, 8 bytes)
//! key != 0  ->  a = child.begin, b = child.end
//! key == 0  ->  a = phrase.pos,  b = phrase.freq
//! ```
//!
//! Record 0 is the root; its key holds the record count (saturating at
//! `u16::MAX`) instead of a phone.

use byteorder::{ByteOrder, LittleEndian};
use std::ops::Range;

pub const MAX_U24: u32 = 0xff_ffff;
pub const NODE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializedNode {
    pub key: u16,
    a: u32,
    b: u32,
}

impl SerializedNode {
    pub fn internal(key: u16, begin: u32, end: u32) -> Self {
        debug_assert!(key != 0 && begin <= end && end <= MAX_U24);
        Self { key, a: begin, b: end }
    }

    /// Frequencies beyond 24 bits are clamped.
    pub fn leaf(offset: u32, freq: u32) -> Self {
        debug_assert!(offset <= MAX_U24);
        Self { key: 0, a: offset, b: freq.min(MAX_U24) }
    }

    pub fn is_leaf(&self) -> bool {
        self.key == 0
    }

    pub fn child_range(&self) -> Option<Range<u32>> {
        (!self.is_leaf()).then_some(self.a..self.b)
    }

    /// `(offset, freq)` of a leaf.
    pub fn phrase(&self) -> Option<(u32, u32)> {
        self.is_leaf().then_some((self.a, self.b))
    }

    pub fn to_bytes(&self) -> [u8; NODE_SIZE] {
        let mut buf = [0; NODE_SIZE];
        LittleEndian::write_u16(&mut buf[0..2], self.key);
        LittleEndian::write_u24(&mut buf[2..5], self.a);
        LittleEndian::write_u24(&mut buf[5..8], self.b);
        buf
    }

    pub fn deserialize(data: &[u8]) -> SerializedNode {
        SerializedNode {
            key: LittleEndian::read_u16(&data[0..2]),
            a: LittleEndian::read_u24(&data[2..5]),
            b: LittleEndian::read_u24(&data[5..8]),
        }
    }
}

/// Key stored in record 0 for a tree of `count` records.
pub fn root_key(count: usize) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX)
}

/// The whole tree as written to disk.
pub fn serialize_nodes(nodes: &[SerializedNode]) -> Vec<u8> {
    nodes.iter().flat_map(SerializedNode::to_bytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_is_eight_bytes() {
        let buffer = SerializedNode::internal(0x1234, 5, 0x0a0b0c).to_bytes();
        assert_eq!(buffer, [0x34, 0x12, 5, 0, 0, 0x0c, 0x0b, 0x0a]);
        assert_eq!(
            SerializedNode::deserialize(&buffer).child_range(),
            Some(5..0x0a0b0c)
        );
    }

    #[test]
    fn nodes_serialize_back_to_back() {
        let nodes = [SerializedNode::internal(2, 1, 2), SerializedNode::leaf(0x030201, 7)];
        let bytes = serialize_nodes(&nodes);
        assert_eq!(bytes.len(), 2 * NODE_SIZE);
        assert_eq!(&bytes[NODE_SIZE..], &[0, 0, 1, 2, 3, 7, 0, 0]);
        let back: Vec<_> = bytes.chunks(NODE_SIZE).map(SerializedNode::deserialize).collect();
        assert_eq!(back, nodes);
        assert!(serialize_nodes(&[]).is_empty());
    }

    #[test]
    fn leaf_clamps_frequency() {
        let leaf = SerializedNode::leaf(17, u32::MAX);
        assert_eq!(leaf.phrase(), Some((17, MAX_U24)));
        assert_eq!(leaf.child_range(), None);
    }

    #[test]
    fn root_key_saturates() {
        assert_eq!(root_key(1), 1);
        assert_eq!(root_key(65535), u16::MAX);
        assert_eq!(root_key(300_000), u16::MAX);
    }
}
