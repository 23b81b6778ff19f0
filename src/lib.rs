//! Offline builder for the phonetic input-method database.
//!
//! Turns a keystroke table (`phone.cin`) and a phrase list (`tsi.src`) into a
//! breadth-first index tree keyed by phonetic codes plus a deduplicated
//! dictionary of phrase strings.

pub mod compare;
pub mod config;
pub mod dictionary;
pub mod encoding;
pub mod error;
pub mod exception;
pub mod linearize;
pub mod node;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod source;
pub mod trie;

pub use config::BuildConfig;
pub use error::{BuildError, Result};
pub use pipeline::{build, build_database, build_im_index, BuildStats, Database, ImIndex};
pub use reader::{DictionaryView, TreeIndex};
