//! Orderings over records.

use crate::encoding::phone_to_bopomofo;
use crate::error::{BuildError, Result};
use crate::record::{PhraseRecord, WordRecord};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Descending first phone, then descending insertion index.
///
/// Reversed so that popping from the back of a sorted vector yields words in
/// ascending phone order, each phone's words in table order.
pub fn by_phone_then_insertion(a: &WordRecord, b: &WordRecord) -> Ordering {
    b.first_phone()
        .cmp(&a.first_phone())
        .then_with(|| b.index.cmp(&a.index))
}

/// Byte-wise text, then first phone ascending.
pub fn by_text_then_phone(a: &PhraseRecord, b: &PhraseRecord) -> Ordering {
    a.text
        .as_bytes()
        .cmp(b.text.as_bytes())
        .then_with(|| a.first_phone().cmp(&b.first_phone()))
}

/// `by_text_then_phone`, then frequency descending, then the full phone
/// sequence so that the order is total.
pub fn by_text_then_full_code(a: &PhraseRecord, b: &PhraseRecord) -> Ordering {
    by_text_then_phone(a, b)
        .then_with(|| b.freq.cmp(&a.freq))
        .then_with(|| a.phones.cmp(&b.phones))
}

/// Fails on the first phrase whose text and full phone sequence repeat an
/// earlier one, then sorts with `by_text_then_full_code`.
pub fn sort_phrases_checking_duplicates(phrases: &mut [PhraseRecord]) -> Result<()> {
    {
        let mut seen: HashSet<(&str, &[u16])> = HashSet::with_capacity(phrases.len());
        for phrase in phrases.iter() {
            if !seen.insert((phrase.text.as_str(), phrase.phones.as_slice())) {
                return Err(BuildError::DuplicatePhrase {
                    phrase: phrase.text.clone(),
                    phones: format_phones(&phrase.phones),
                });
            }
        }
    }
    phrases.sort_by(by_text_then_full_code);
    Ok(())
}

pub(crate) fn format_phones(phones: &[u16]) -> String {
    phones
        .iter()
        .map(|&p| phone_to_bopomofo(p).unwrap_or_else(|| format!("{p:#06x}")))
        .collect::<Vec<_>>()
        .join(" ")
}
