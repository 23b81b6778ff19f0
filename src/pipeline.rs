//! Top-level builds.
//!
//! ```text
//! phone.cin ─┐                               ┌─> index tree
//!            ├─> RecordStore ─> dictionary ──┤
//! tsi.src ───┘   (validate, sort, fold)      └─> dictionary blob (+ frequency log)
//! ```
//!
//! Everything is computed in memory; nothing touches the output directory
//! until `Database::write` stages all artifacts at once.

use crate::config::{BuildConfig, OutputConfig, DICT_FILE, INDEX_TREE_SUFFIX};
use crate::dictionary::{encode_freq_log, write_dictionary};
use crate::encoding::{BopomofoEncoder, DachenKeyEncoder, KeySequenceEncoder};
use crate::error::{BuildError, Result};
use crate::exception::ExceptionTable;
use crate::linearize::linearize;
use crate::node::{serialize_nodes, SerializedNode};
use crate::output::write_atomically;
use crate::reader::DictionaryView;
use crate::record::RecordStore;
use crate::source::{self, CinTable, PhraseLine};
use crate::trie::build_trie;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub words: usize,
    /// Multi-character phrases placed in the tree.
    pub phrases: usize,
    pub internal_nodes: usize,
    pub leaves: usize,
    pub tree_records: usize,
    pub unique_strings: usize,
    pub dictionary_bytes: usize,
}

/// The built artifacts, not yet on disk.
#[derive(Debug)]
pub struct Database {
    pub tree: Vec<SerializedNode>,
    pub dictionary: Vec<u8>,
    pub freq_log: Option<Vec<u32>>,
    pub stats: BuildStats,
}

impl Database {
    pub fn tree_bytes(&self) -> Vec<u8> {
        serialize_nodes(&self.tree)
    }

    /// Writes the tree, the dictionary and, for multi-IM builds, the
    /// frequency log into `output.dir`.
    pub fn write(&self, output: &OutputConfig) -> Result<Vec<PathBuf>> {
        let tree = self.tree_bytes();
        let tree_file = output.tree_file();
        let freq = self.freq_log.as_deref().map(encode_freq_log);

        let mut artifacts: Vec<(&str, &[u8])> = vec![
            (tree_file.as_str(), tree.as_slice()),
            (DICT_FILE, self.dictionary.as_slice()),
        ];
        if let (Some(name), Some(bytes)) = (output.freq_file(), freq.as_deref()) {
            artifacts.push((name, bytes));
        }
        write_atomically(&output.dir, &artifacts)
    }
}

/// Builds the phonetic database from parsed sources.
pub fn build_database(config: &BuildConfig, cin: &CinTable, phrases: &[PhraseLine]) -> Result<Database> {
    let mut exceptions = ExceptionTable::builtin();
    exceptions.extend_from_config(&config.exceptions, &BopomofoEncoder)?;
    log::debug!("{} exception entries", exceptions.len());

    let mut store = RecordStore::new(config.limits.clone());
    store.load_words(&cin.words, &DachenKeyEncoder::new())?;
    store.load_phrases(phrases, &BopomofoEncoder, &exceptions)?;
    store.finalize()?;
    let (mut words, mut phrases) = store.into_parts();

    let blob = write_dictionary(&mut words, &mut phrases, config.output.multi_im)?;
    let trie = build_trie(&words, &phrases)?;
    let (internal_nodes, leaves) = (trie.internal_count(), trie.leaf_count());
    let tree = linearize(trie)?;

    let stats = BuildStats {
        words: words.len(),
        phrases: phrases.len(),
        internal_nodes,
        leaves,
        tree_records: tree.len(),
        unique_strings: blob.unique,
        dictionary_bytes: blob.bytes.len(),
    };
    Ok(Database {
        tree,
        dictionary: blob.bytes,
        freq_log: blob.freq_log,
        stats,
    })
}

/// Reads `phone.cin` and `tsi.src`, builds, and writes into the configured
/// output directory.
pub fn build(config: &BuildConfig, cin_path: &Path, tsi_path: &Path) -> Result<(Database, Vec<PathBuf>)> {
    let cin = source::read_cin_file(cin_path)?;
    let phrases = source::read_tsi_file(tsi_path)?;
    let database = build_database(config, &cin, &phrases)?;
    let written = database.write(&config.output)?;
    Ok((database, written))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImStats {
    pub words: usize,
    /// Words whose text is not in the dictionary.
    pub skipped: usize,
    pub tree_records: usize,
}

/// Word-only index tree of a supplementary input method.
#[derive(Debug)]
pub struct ImIndex {
    pub name: String,
    pub tree: Vec<SerializedNode>,
    pub stats: ImStats,
}

impl ImIndex {
    pub fn file_name(&self) -> String {
        format!("{}{INDEX_TREE_SUFFIX}", self.name)
    }

    pub fn tree_bytes(&self) -> Vec<u8> {
        serialize_nodes(&self.tree)
    }

    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let bytes = self.tree_bytes();
        let name = self.file_name();
        write_atomically(dir, &[(name.as_str(), bytes.as_slice())])?;
        Ok(dir.join(name))
    }
}

/// Indexes the words of a supplementary `.cin` table against an existing
/// dictionary and its frequency log.
///
/// Keys are packed with the table's `%keyname` alphabet, or the configured
/// default when it has none.
pub fn build_im_index<D: AsRef<[u8]>>(
    config: &BuildConfig,
    cin: &CinTable,
    name: &str,
    dictionary: &DictionaryView<D>,
    freq_log: &[u32],
    show_warning: bool,
) -> Result<ImIndex> {
    let entries = dictionary.entries()?;
    if entries.len() != freq_log.len() {
        return Err(BuildError::CorruptIndex(format!(
            "dictionary holds {} strings but the frequency log {}",
            entries.len(),
            freq_log.len()
        )));
    }
    let known: HashMap<&str, (u32, u32)> = entries
        .into_iter()
        .zip(freq_log)
        .map(|((offset, text), &freq)| (text, (offset, freq)))
        .collect();

    let encoder = if cin.keynames.is_empty() {
        KeySequenceEncoder::new(config.im.default_key_alphabet.chars())
    } else {
        KeySequenceEncoder::new(cin.keynames.iter().copied())
    };
    log::debug!("{name}: {} keys", encoder.alphabet_len());

    let mut store = RecordStore::new(config.limits.clone());
    let mut skipped = 0;
    for line in &cin.words {
        if !known.contains_key(line.text.as_str()) {
            skipped += 1;
            if show_warning {
                log::warn!("line {}: `{}` is not in the dictionary, skipped", line.line, line.text);
            }
            continue;
        }
        store.push_word(line, &encoder)?;
    }
    let (mut words, _) = store.into_parts();
    for word in &mut words {
        if let Some(&(offset, freq)) = known.get(word.record.text.as_str()) {
            word.record.freq = freq;
            word.record.assign_offset(offset);
        }
    }

    let tree = linearize(build_trie(&words, &[])?)?;
    let stats = ImStats {
        words: words.len(),
        skipped,
        tree_records: tree.len(),
    };
    if skipped > 0 {
        log::info!("{name}: {skipped} words not in the dictionary");
    }
    Ok(ImIndex {
        name: name.to_string(),
        tree,
        stats,
    })
}
