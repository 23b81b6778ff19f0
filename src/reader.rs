//! Read-side views of the built artifacts.

use crate::dictionary::decode_freq_log;
use crate::encoding::PhoneCode;
use crate::error::{BuildError, Result};
use crate::node::{SerializedNode, NODE_SIZE};
use memmap2::Mmap;
use std::fs::File;
use std::ops::Range;
use std::path::Path;

/// Index tree over any byte buffer, usually a memory map.
pub struct TreeIndex<D: AsRef<[u8]>> {
    data: D,
    len: usize,
}

impl TreeIndex<Mmap> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| BuildError::io(path, e))?;
        let size = file.metadata().map_err(|e| BuildError::io(path, e))?.len();
        if size == 0 {
            return Err(BuildError::CorruptIndex(format!("{} is empty", path.display())));
        }
        let mmap = unsafe { Mmap::map(&file).map_err(|e| BuildError::io(path, e))? };
        Self::from_bytes(mmap)
    }
}

impl<D: AsRef<[u8]>> TreeIndex<D> {
    pub fn from_bytes(data: D) -> Result<Self> {
        let bytes = data.as_ref();
        if bytes.is_empty() || bytes.len() % NODE_SIZE != 0 {
            return Err(BuildError::CorruptIndex(format!(
                "tree of {} bytes is not a whole number of records",
                bytes.len()
            )));
        }
        let len = bytes.len() / NODE_SIZE;
        let root = SerializedNode::deserialize(&bytes[..NODE_SIZE]);
        // a saturated root key defers to the file length
        let expected = u16::try_from(len).unwrap_or(u16::MAX);
        if root.key != expected {
            return Err(BuildError::CorruptIndex(format!(
                "root claims {} records, file holds {}",
                root.key, len
            )));
        }
        Ok(Self { data, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node(&self, index: usize) -> Option<SerializedNode> {
        let start = index.checked_mul(NODE_SIZE)?;
        let bytes = self.data.as_ref().get(start..start + NODE_SIZE)?;
        Some(SerializedNode::deserialize(bytes))
    }

    /// Child indices of an internal node, checked against the file.
    pub fn children(&self, index: usize) -> Result<Range<usize>> {
        let node = self
            .node(index)
            .ok_or_else(|| BuildError::CorruptIndex(format!("record {index} out of range")))?;
        let range = node.child_range().unwrap_or(0..0);
        let (begin, end) = (range.start as usize, range.end as usize);
        if begin > end || end > self.len {
            return Err(BuildError::CorruptIndex(format!(
                "record {index} points at [{begin}, {end}) beyond {} records",
                self.len
            )));
        }
        Ok(begin..end)
    }

    fn find_child(&self, parent: usize, key: PhoneCode) -> Option<usize> {
        let Range { mut start, mut end } = self.children(parent).ok()?;
        // leaves (key 0) precede internal children, which ascend by key
        while start < end {
            let mid = start + (end - start) / 2;
            let mid_key = self.node(mid)?.key;
            match mid_key.cmp(&key) {
                std::cmp::Ordering::Less => start = mid + 1,
                std::cmp::Ordering::Greater => end = mid,
                std::cmp::Ordering::Equal => return Some(mid),
            }
        }
        None
    }

    /// Node reached by following `phones` from the root.
    pub fn lookup(&self, phones: &[PhoneCode]) -> Option<usize> {
        phones
            .iter()
            .try_fold(0, |node, &phone| self.find_child(node, phone))
    }

    /// `(offset, freq)` of the leaves directly under `index`, in stored order.
    pub fn leaves(&self, index: usize) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.children(index)
            .unwrap_or(0..0)
            .map_while(move |i| self.node(i))
            .map_while(|n| n.phrase())
    }
}

/// NUL-terminated strings addressed by byte offset.
pub struct DictionaryView<D: AsRef<[u8]>> {
    data: D,
}

impl DictionaryView<Vec<u8>> {
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| BuildError::io(path, e))?;
        Ok(Self { data })
    }
}

impl<D: AsRef<[u8]>> DictionaryView<D> {
    pub fn from_bytes(data: D) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn phrase_at(&self, offset: u32) -> Result<&str> {
        let bytes = self.data.as_ref();
        let tail = bytes.get(offset as usize..).ok_or_else(|| {
            BuildError::CorruptIndex(format!("offset {offset} beyond dictionary of {} bytes", bytes.len()))
        })?;
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| BuildError::CorruptIndex(format!("string at {offset} is not terminated")))?;
        std::str::from_utf8(&tail[..end])
            .map_err(|e| BuildError::CorruptIndex(format!("string at {offset}: {e}")))
    }

    /// Every string with its offset, in blob order.
    pub fn entries(&self) -> Result<Vec<(u32, &str)>> {
        let bytes = self.data.as_ref();
        let mut entries = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let text = self.phrase_at(offset as u32)?;
            entries.push((offset as u32, text));
            offset += text.len() + 1;
        }
        Ok(entries)
    }
}

pub fn read_freq_log(path: &Path) -> Result<Vec<u32>> {
    let bytes = std::fs::read(path).map_err(|e| BuildError::io(path, e))?;
    decode_freq_log(&bytes)
}
