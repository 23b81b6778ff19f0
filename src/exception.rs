//! Word-list validation with curated exceptions.
//!
//! Every character of a phrase, read with the phone the phrase gives it, must
//! appear in the word list. Tone sandhi makes some readings legitimately
//! absent; those are listed here by hand. An unexplained miss stops the build
//! and prints an entry ready to paste into `EXCEPTION_PHRASES`.

use crate::compare::format_phones;
use crate::config::ExceptionConfig;
use crate::encoding::{phone_to_bopomofo, with_neutral_tone, KeyEncoder, PhoneCode};
use crate::error::{BuildError, Result};
use crate::record::{PhraseRecord, WordRecord};
use std::collections::HashSet;

/// Whole phrases whose reading differs from their characters' readings.
const EXCEPTION_PHRASES: &[(&str, &[PhoneCode])] = &[
    ("\u{4ec0}\u{9ebc}", &[0x221a, 0x0619]), // ㄕㄜˊ ㄇㄜ˙
    ("\u{9019}\u{9ebc}", &[0x1e1c, 0x0619]), // ㄓㄜˋ ㄇㄜ˙
    ("\u{90a3}\u{9ebc}", &[0x0e0c, 0x0619]), // ㄋㄚˋ ㄇㄜ˙
];

/// Characters whose tone changes with context.
const EXCEPTION_WORDS: &[(&str, PhoneCode)] = &[
    ("\u{4e00}", 0x0082), // 一 ㄧˊ
    ("\u{4e00}", 0x0084), // 一 ㄧˋ
    ("\u{4e0d}", 0x0302), // 不 ㄅㄨˊ
];

#[derive(Debug, Clone, Default)]
pub struct ExceptionTable {
    phrases: HashSet<(String, Vec<PhoneCode>)>,
    words: HashSet<(String, PhoneCode)>,
}

impl ExceptionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (text, phones) in EXCEPTION_PHRASES {
            table.add_phrase(text, phones.to_vec());
        }
        for &(text, phone) in EXCEPTION_WORDS {
            table.add_word(text, phone);
        }
        table
    }

    /// Adds the entries of a config file, whose phones are bopomofo syllables.
    pub fn extend_from_config(&mut self, config: &ExceptionConfig, encoder: &dyn KeyEncoder) -> Result<()> {
        let encode = |syllable: &str| {
            encoder.encode(syllable).ok_or_else(|| {
                BuildError::Config(format!("exception entry has invalid phone `{syllable}`"))
            })
        };
        for entry in &config.phrase {
            let phones = entry
                .phones
                .iter()
                .map(|s| encode(s))
                .collect::<Result<Vec<_>>>()?;
            if phones.len() != entry.text.chars().count() {
                return Err(BuildError::Config(format!(
                    "exception phrase `{}` needs one phone per character",
                    entry.text
                )));
            }
            self.add_phrase(&entry.text, phones);
        }
        for entry in &config.word {
            self.add_word(&entry.text, encode(&entry.phone)?);
        }
        Ok(())
    }

    pub fn add_phrase(&mut self, text: &str, phones: Vec<PhoneCode>) {
        self.phrases.insert((text.to_string(), phones));
    }

    pub fn add_word(&mut self, text: &str, phone: PhoneCode) {
        self.words.insert((text.to_string(), phone));
    }

    pub fn contains_phrase(&self, text: &str, phones: &[PhoneCode]) -> bool {
        self.phrases.contains(&(text.to_string(), phones.to_vec()))
    }

    pub fn contains_word(&self, text: &str, phone: PhoneCode) -> bool {
        self.words.contains(&(text.to_string(), phone))
    }

    pub fn len(&self) -> usize {
        self.phrases.len() + self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks phrases against a word list sorted by text then phone.
pub struct Validator<'a> {
    words: &'a [WordRecord],
    exceptions: &'a ExceptionTable,
}

impl<'a> Validator<'a> {
    pub fn new(words: &'a [WordRecord], exceptions: &'a ExceptionTable) -> Self {
        Self { words, exceptions }
    }

    fn has_word(&self, text: &str, phone: PhoneCode) -> bool {
        self.words
            .binary_search_by(|w| {
                w.record
                    .text
                    .as_bytes()
                    .cmp(text.as_bytes())
                    .then_with(|| w.first_phone().cmp(&phone))
            })
            .is_ok()
    }

    pub fn check(&self, phrase: &PhraseRecord, line: usize) -> Result<()> {
        if self.exceptions.contains_phrase(&phrase.text, &phrase.phones) {
            return Ok(());
        }
        let mut prev: Option<(&str, PhoneCode)> = None;
        for ((start, ch), &phone) in phrase.text.char_indices().zip(&phrase.phones) {
            let text = &phrase.text[start..start + ch.len_utf8()];
            let reduplicated =
                matches!(prev, Some((t, p)) if t == text && phone == with_neutral_tone(p));
            if !(self.has_word(text, phone)
                || self.exceptions.contains_word(text, phone)
                || reduplicated)
            {
                return Err(BuildError::UnresolvedWordReference {
                    line,
                    phrase: phrase.text.clone(),
                    character: text.to_string(),
                    phone: phone_to_bopomofo(phone).unwrap_or_else(|| format!("{phone:#06x}")),
                    snippet: snippet(phrase),
                });
            }
            prev = Some((text, phone));
        }
        Ok(())
    }
}

/// `EXCEPTION_PHRASES` entry for `phrase`, non-ASCII escaped.
pub fn snippet(phrase: &PhraseRecord) -> String {
    let mut out = String::from("    (\"");
    for ch in phrase.text.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.push_str(&format!("\\u{{{:x}}}", ch as u32));
        }
    }
    out.push_str("\", &[");
    let codes: Vec<String> = phrase.phones.iter().map(|p| format!("{p:#06x}")).collect();
    out.push_str(&codes.join(", "));
    out.push_str(&format!("]), // {}", format_phones(&phrase.phones)));
    out
}
