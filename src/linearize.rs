//! Breadth-first flattening of the phrase tree.
//!
//! Records come out in discovery order. When an internal node is dequeued its
//! children are enqueued in sibling order and it receives the range
//! `[size, size + children)`, `size` counting every record discovered so far.
//! The root's key is then replaced by the final size.

use crate::error::{BuildError, Result};
use crate::node::{root_key, SerializedNode, MAX_U24};
use crate::trie::{PhraseTrie, TrieNode, ROOT};
use std::collections::VecDeque;

pub fn linearize(trie: PhraseTrie) -> Result<Vec<SerializedNode>> {
    let total = trie.len();
    if total > MAX_U24 as usize {
        return Err(BuildError::CapacityExceeded {
            limit: "MAX_TREE_SIZE",
            capacity: MAX_U24 as usize,
        });
    }
    let mut nodes = trie.into_nodes();

    let mut queue = VecDeque::new();
    queue.try_reserve(total)?;
    let mut out = Vec::new();
    out.try_reserve_exact(total)?;

    queue.push_back(ROOT);
    let mut size: u32 = 1;
    while let Some(id) = queue.pop_front() {
        let record = match &mut nodes[id] {
            TrieNode::Internal { key, children } => {
                let begin = size;
                // children are not needed past this point
                for child in std::mem::take(children) {
                    queue.push_back(child);
                    size += 1;
                }
                SerializedNode::internal(*key, begin, size)
            }
            TrieNode::Leaf { offset, freq } => {
                if *offset > MAX_U24 {
                    return Err(BuildError::CapacityExceeded {
                        limit: "MAX_DICTIONARY_SIZE",
                        capacity: MAX_U24 as usize,
                    });
                }
                SerializedNode::leaf(*offset, *freq)
            }
        };
        out.push(record);
    }

    let count = out.len();
    debug_assert_eq!(count, size as usize);
    if let Some(root) = out.first_mut() {
        root.key = root_key(count);
    }
    if count > u16::MAX as usize {
        log::warn!("tree has {count} records; root key saturated, readers must use the file length");
    }
    log::info!("index tree: {count} records");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PhraseRecord, WordRecord};
    use crate::trie::build_trie;

    fn placed(text: &str, freq: u32, phones: Vec<u16>, offset: u32) -> PhraseRecord {
        let mut record = PhraseRecord::new(text, freq, phones);
        record.assign_offset(offset);
        record
    }

    #[test]
    fn empty_tree_is_a_lone_root() {
        let trie = build_trie(&[], &[]).unwrap();
        let nodes = linearize(trie).unwrap();
        assert_eq!(nodes, vec![SerializedNode::internal(1, 1, 1)]);
    }

    #[test]
    fn ranges_follow_discovery_order() {
        let words = vec![
            WordRecord { record: placed("A", 0, vec![5], 0), index: 0 },
            WordRecord { record: placed("B", 0, vec![7], 2), index: 1 },
        ];
        let phrases = vec![placed("AB", 10, vec![5, 7], 4), placed("AA", 3, vec![5, 5], 7)];
        let nodes = linearize(build_trie(&words, &phrases).unwrap()).unwrap();

        // 0 root | 1 key5, 2 key7 | 3 leafA, 4 key5, 5 key7 | 6 leafB | 7 leafAA | 8 leafAB
        assert_eq!(nodes.len(), 9);
        assert_eq!(nodes[0].key, 9);
        assert_eq!(nodes[0].child_range(), Some(1..3));
        assert_eq!(nodes[1].child_range(), Some(3..6));
        assert_eq!(nodes[2].child_range(), Some(6..7));
        assert_eq!(nodes[3].phrase(), Some((0, 0)));
        assert_eq!(nodes[4].child_range(), Some(7..8));
        assert_eq!(nodes[5].child_range(), Some(8..9));
        assert_eq!(nodes[6].phrase(), Some((2, 0)));
        assert_eq!(nodes[7].phrase(), Some((7, 3)));
        assert_eq!(nodes[8].phrase(), Some((4, 10)));
    }

    #[test]
    fn sibling_ranges_are_contiguous_and_disjoint() {
        let words: Vec<_> = (0..6u16)
            .map(|i| WordRecord {
                record: placed("x", i as u32, vec![1 + i % 3], i as u32 * 2),
                index: i as usize,
            })
            .collect();
        let phrases = vec![
            placed("p", 1, vec![1, 2], 20),
            placed("q", 2, vec![1, 2, 3], 22),
            placed("r", 3, vec![2, 2], 24),
        ];
        let nodes = linearize(build_trie(&words, &phrases).unwrap()).unwrap();
        let mut next = 1;
        for node in &nodes {
            if let Some(range) = node.child_range() {
                assert_eq!(range.start, next);
                next = range.end;
            }
        }
        assert_eq!(next as usize, nodes.len());
    }
}
