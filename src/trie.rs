//! Phrase tree keyed by successive phonetic codes.
//!
//! Nodes live in an arena and refer to their children by index. Under every
//! internal node the leaves come first, by descending frequency, followed by
//! internal children in ascending key order.

use crate::compare;
use crate::encoding::PhoneCode;
use crate::error::{BuildError, Result};
use crate::record::{PhraseRecord, WordRecord};

pub type NodeId = usize;

pub const ROOT: NodeId = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieNode {
    Internal { key: PhoneCode, children: Vec<NodeId> },
    Leaf { offset: u32, freq: u32 },
}

impl TrieNode {
    pub fn key(&self) -> PhoneCode {
        match self {
            TrieNode::Internal { key, .. } => *key,
            TrieNode::Leaf { .. } => 0,
        }
    }
}

/// A finished tree. The root is `ROOT`.
#[derive(Debug)]
pub struct PhraseTrie {
    nodes: Vec<TrieNode>,
}

impl PhraseTrie {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id]
    }

    /// Internal nodes below the root.
    pub fn internal_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TrieNode::Internal { .. }))
            .count()
            .saturating_sub(1)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TrieNode::Leaf { .. }))
            .count()
    }

    pub(crate) fn into_nodes(self) -> Vec<TrieNode> {
        self.nodes
    }
}

pub struct TrieBuilder {
    nodes: Vec<TrieNode>,
}

impl TrieBuilder {
    /// `capacity` is a hint; the arena still grows past it.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut nodes = Vec::new();
        nodes.try_reserve(capacity.max(1))?;
        // key of the root is rewritten with the tree size on linearization
        nodes.push(TrieNode::Internal { key: 1, children: Vec::new() });
        Ok(Self { nodes })
    }

    fn alloc(&mut self, node: TrieNode) -> Result<NodeId> {
        self.nodes.try_reserve(1)?;
        self.nodes.push(node);
        Ok(self.nodes.len() - 1)
    }

    fn children(&self, parent: NodeId) -> &[NodeId] {
        match &self.nodes[parent] {
            TrieNode::Internal { children, .. } => children,
            TrieNode::Leaf { .. } => &[],
        }
    }

    fn attach(&mut self, parent: NodeId, pos: usize, child: NodeId) -> Result<()> {
        if let TrieNode::Internal { children, .. } = &mut self.nodes[parent] {
            children.try_reserve(1)?;
            children.insert(pos, child);
        }
        Ok(())
    }

    /// Child of `parent` keyed `key`, created in key order if missing.
    pub fn find_or_insert(&mut self, parent: NodeId, key: PhoneCode) -> Result<NodeId> {
        debug_assert!(key != 0);
        let siblings = self.children(parent);
        let pos = siblings.partition_point(|&c| self.nodes[c].key() < key);
        if let Some(&found) = siblings.get(pos) {
            if self.nodes[found].key() == key {
                return Ok(found);
            }
        }
        let id = self.alloc(TrieNode::Internal { key, children: Vec::new() })?;
        self.attach(parent, pos, id)?;
        Ok(id)
    }

    /// Adds a leaf before the first leaf of strictly lower frequency.
    pub fn insert_leaf(&mut self, parent: NodeId, offset: u32, freq: u32) -> Result<NodeId> {
        let pos = self
            .children(parent)
            .iter()
            .position(|&c| match self.nodes[c] {
                TrieNode::Leaf { freq: f, .. } => f < freq,
                TrieNode::Internal { .. } => true,
            })
            .unwrap_or_else(|| self.children(parent).len());
        let id = self.alloc(TrieNode::Leaf { offset, freq })?;
        self.attach(parent, pos, id)?;
        Ok(id)
    }

    /// Words become leaves of depth-1 nodes, one node per distinct phone.
    pub fn insert_words(&mut self, words: &[WordRecord]) -> Result<()> {
        let mut stack: Vec<&WordRecord> = words.iter().collect();
        stack.sort_by(|a, b| compare::by_phone_then_insertion(a, b));
        let mut level = ROOT;
        let mut level_key = 0;
        while let Some(word) = stack.pop() {
            if level == ROOT || word.first_phone() != level_key {
                level_key = word.first_phone();
                level = self.find_or_insert(ROOT, level_key)?;
            }
            self.insert_leaf(level, placed_offset(&word.record)?, word.record.freq)?;
        }
        Ok(())
    }

    /// Walks or creates the phone path, then hangs a leaf at its end.
    pub fn insert_phrase(&mut self, phrase: &PhraseRecord) -> Result<()> {
        debug_assert!(phrase.phones.len() >= 2);
        let mut level = ROOT;
        for &phone in &phrase.phones {
            level = self.find_or_insert(level, phone)?;
        }
        self.insert_leaf(level, placed_offset(phrase)?, phrase.freq)?;
        Ok(())
    }

    pub fn finish(self) -> PhraseTrie {
        PhraseTrie { nodes: self.nodes }
    }
}

fn placed_offset(record: &PhraseRecord) -> Result<u32> {
    record.dictionary_offset().ok_or_else(|| {
        BuildError::CorruptIndex(format!("`{}` was never written to the dictionary", record.text))
    })
}

/// Builds the tree from words and multi-character phrases that already carry
/// their dictionary offsets.
pub fn build_trie(words: &[WordRecord], phrases: &[PhraseRecord]) -> Result<PhraseTrie> {
    let mut builder = TrieBuilder::with_capacity(1 + 2 * words.len() + 2 * phrases.len())?;
    builder.insert_words(words)?;
    for phrase in phrases {
        builder.insert_phrase(phrase)?;
    }
    let trie = builder.finish();
    log::debug!(
        "phrase tree: {} internal nodes, {} leaves",
        trie.internal_count(),
        trie.leaf_count()
    );
    Ok(trie)
}
