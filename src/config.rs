//! Build configuration.
//!
//! Loaded from an optional TOML file. Every field has a default, so an empty
//! file (or no file at all) reproduces the stock capacities and file names.

use crate::error::{BuildError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const MAX_WORD_DATA: usize = 60000;
pub const MAX_PHRASE_DATA: usize = 420000;
pub const MAX_PHRASE_LEN: usize = 11;
pub const MAX_PHRASE_BUF_LEN: usize = 149;
pub const MAX_KEY_LEN: usize = 4;

pub const DICT_FILE: &str = "dictionary.dat";
pub const FREQ_FILE: &str = "total_freq.dat";
pub const PHONE_TREE_FILE: &str = "index_tree.dat";
pub const PHONETIC: &str = "Phonetic";
pub const INDEX_TREE_SUFFIX: &str = "_index_tree.dat";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BuildConfig {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub im: ImConfig,
    #[serde(default)]
    pub exceptions: ExceptionConfig,
}

/// Fixed capacities. Exceeding one is fatal and reported by constant name.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Limits {
    #[serde(default = "default_max_word_data")]
    pub max_word_data: usize,
    #[serde(default = "default_max_phrase_data")]
    pub max_phrase_data: usize,
    #[serde(default = "default_max_phrase_len")]
    pub max_phrase_len: usize,
    /// Includes the terminating NUL.
    #[serde(default = "default_max_phrase_buf_len")]
    pub max_phrase_buf_len: usize,
    #[serde(default = "default_max_key_len")]
    pub max_key_len: usize,
}

fn default_max_word_data() -> usize { MAX_WORD_DATA }
fn default_max_phrase_data() -> usize { MAX_PHRASE_DATA }
fn default_max_phrase_len() -> usize { MAX_PHRASE_LEN }
fn default_max_phrase_buf_len() -> usize { MAX_PHRASE_BUF_LEN }
fn default_max_key_len() -> usize { MAX_KEY_LEN }

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_word_data: MAX_WORD_DATA,
            max_phrase_data: MAX_PHRASE_DATA,
            max_phrase_len: MAX_PHRASE_LEN,
            max_phrase_buf_len: MAX_PHRASE_BUF_LEN,
            max_key_len: MAX_KEY_LEN,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Also emit the total-frequency log and name the tree after the phonetic IM.
    #[serde(default)]
    pub multi_im: bool,
}

fn default_output_dir() -> PathBuf { PathBuf::from(".") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir(), multi_im: false }
    }
}

impl OutputConfig {
    pub fn tree_file(&self) -> String {
        if self.multi_im {
            format!("{PHONETIC}{INDEX_TREE_SUFFIX}")
        } else {
            PHONE_TREE_FILE.to_string()
        }
    }

    pub fn freq_file(&self) -> Option<&'static str> {
        self.multi_im.then_some(FREQ_FILE)
    }
}

/// Settings for supplementary (non-phonetic) input methods.
#[derive(Debug, Deserialize, Clone)]
pub struct ImConfig {
    /// Used when a `.cin` file has no `%keyname` block.
    #[serde(default = "default_key_alphabet")]
    pub default_key_alphabet: String,
}

fn default_key_alphabet() -> String { "abcdefghijklmnopqrstuvwxyz".to_string() }

impl Default for ImConfig {
    fn default() -> Self {
        Self { default_key_alphabet: default_key_alphabet() }
    }
}

/// Extra exception entries appended to the built-in tables.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExceptionConfig {
    #[serde(default)]
    pub phrase: Vec<ExceptionPhraseEntry>,
    #[serde(default)]
    pub word: Vec<ExceptionWordEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExceptionPhraseEntry {
    pub text: String,
    /// One bopomofo syllable per character.
    pub phones: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExceptionWordEntry {
    pub text: String,
    pub phone: String,
}

impl BuildConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| BuildError::Config(e.to_string()))
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let config = Self::from_toml(&text)?;
        log::info!(
            "loaded config {:?}: multi_im={}, max_phrase_data={}",
            path,
            config.output.multi_im,
            config.limits.max_phrase_data
        );
        Ok(config)
    }
}
