//! Parsed word and phrase records and the store that bounds them.

use crate::compare;
use crate::config::Limits;
use crate::encoding::{KeyEncoder, PhoneCode};
use crate::error::{BuildError, Result};
use crate::exception::{ExceptionTable, Validator};
use crate::node::MAX_U24;
use crate::source::{PhraseLine, WordLine};

/// A string with one phonetic code per character.
///
/// Immutable once parsed, except for the dictionary offset which the
/// dictionary writer assigns exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseRecord {
    pub text: String,
    pub freq: u32,
    pub phones: Vec<PhoneCode>,
    dictionary_offset: Option<u32>,
}

impl PhraseRecord {
    pub fn new(text: impl Into<String>, freq: u32, phones: Vec<PhoneCode>) -> Self {
        Self {
            text: text.into(),
            freq,
            phones,
            dictionary_offset: None,
        }
    }

    pub fn first_phone(&self) -> PhoneCode {
        self.phones.first().copied().unwrap_or(0)
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn dictionary_offset(&self) -> Option<u32> {
        self.dictionary_offset
    }

    pub(crate) fn assign_offset(&mut self, offset: u32) {
        debug_assert!(
            self.dictionary_offset.is_none(),
            "offset of `{}` assigned twice",
            self.text
        );
        self.dictionary_offset = Some(offset);
    }
}

/// A single-character record plus its position in the keystroke table, used
/// only to keep phone-ordered sorting deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub record: PhraseRecord,
    pub index: usize,
}

impl WordRecord {
    pub fn first_phone(&self) -> PhoneCode {
        self.record.first_phone()
    }
}

/// Holds every word and phrase of one build.
///
/// Words must be loaded before phrases: phrases are validated against the
/// word list as they arrive.
#[derive(Debug)]
pub struct RecordStore {
    limits: Limits,
    /// Sorted by text then phone once loaded.
    words: Vec<WordRecord>,
    /// Every accepted `tsi.src` entry, single characters included until
    /// `finalize` folds them into `words`.
    phrases: Vec<PhraseRecord>,
    multi_char: usize,
}

impl RecordStore {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            words: Vec::new(),
            phrases: Vec::new(),
            multi_char: 0,
        }
    }

    pub fn words(&self) -> &[WordRecord] {
        &self.words
    }

    pub fn phrases(&self) -> &[PhraseRecord] {
        &self.phrases
    }

    pub fn into_parts(self) -> (Vec<WordRecord>, Vec<PhraseRecord>) {
        (self.words, self.phrases)
    }

    fn check_text(&self, text: &str, line: usize) -> Result<()> {
        if text.contains('\0') {
            return Err(BuildError::parse(line, format!("`{text}` contains NUL")));
        }
        if text.len() >= self.limits.max_phrase_buf_len {
            return Err(BuildError::CapacityExceeded {
                limit: "MAX_PHRASE_BUF_LEN",
                capacity: self.limits.max_phrase_buf_len,
            });
        }
        Ok(())
    }

    fn push_word_record(&mut self, record: PhraseRecord) -> Result<()> {
        if self.words.len() >= self.limits.max_word_data {
            return Err(BuildError::CapacityExceeded {
                limit: "MAX_WORD_DATA",
                capacity: self.limits.max_word_data,
            });
        }
        let index = self.words.len();
        self.words.push(WordRecord { record, index });
        Ok(())
    }

    /// Append one keystroke-table entry. Call `sort_words` once all are in.
    pub fn push_word(&mut self, line: &WordLine, encoder: &dyn KeyEncoder) -> Result<()> {
        if line.keys.chars().count() > self.limits.max_key_len {
            return Err(BuildError::parse(
                line.line,
                format!("key `{}` longer than {} keystrokes", line.keys, self.limits.max_key_len),
            ));
        }
        if line.text.chars().count() != 1 {
            return Err(BuildError::parse(
                line.line,
                format!("`{}` is not a single character", line.text),
            ));
        }
        self.check_text(&line.text, line.line)?;
        let phone = encoder.encode(&line.keys).ok_or_else(|| {
            BuildError::parse(line.line, format!("cannot encode key `{}`", line.keys))
        })?;
        self.push_word_record(PhraseRecord::new(line.text.clone(), 0, vec![phone]))
    }

    pub fn sort_words(&mut self) {
        self.words
            .sort_by(|a, b| compare::by_text_then_phone(&a.record, &b.record));
    }

    pub fn load_words(&mut self, lines: &[WordLine], encoder: &dyn KeyEncoder) -> Result<()> {
        for line in lines {
            self.push_word(line, encoder)?;
        }
        self.sort_words();
        log::info!("loaded {} words", self.words.len());
        Ok(())
    }

    /// Encode one phrase line, checking bounds and that there is one phone
    /// per character.
    pub fn encode_phrase(&self, line: &PhraseLine, encoder: &dyn KeyEncoder) -> Result<PhraseRecord> {
        self.check_text(&line.text, line.line)?;
        if line.phones.len() > self.limits.max_phrase_len {
            return Err(BuildError::CapacityExceeded {
                limit: "MAX_PHRASE_LEN",
                capacity: self.limits.max_phrase_len,
            });
        }
        let phones = line
            .phones
            .iter()
            .map(|token| {
                encoder.encode(token).ok_or_else(|| {
                    BuildError::parse(
                        line.line,
                        format!("error reading bopomofo `{token}` of `{}`", line.text),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let record = PhraseRecord::new(line.text.clone(), line.freq, phones);
        let characters = record.char_len();
        if characters != record.phones.len() {
            return Err(BuildError::LengthMismatch {
                line: line.line,
                phrase: line.text.clone(),
                characters,
                phones: record.phones.len(),
            });
        }
        if record.freq > MAX_U24 {
            log::warn!(
                "line {}: frequency {} of `{}` will be clamped to {}",
                line.line,
                record.freq,
                record.text,
                MAX_U24
            );
        }
        Ok(record)
    }

    /// Encode, validate against the word list and keep one phrase line.
    pub fn add_phrase(
        &mut self,
        line: &PhraseLine,
        encoder: &dyn KeyEncoder,
        exceptions: &ExceptionTable,
    ) -> Result<()> {
        let record = self.encode_phrase(line, encoder)?;
        Validator::new(&self.words, exceptions).check(&record, line.line)?;
        if record.phones.len() >= 2 {
            if self.multi_char >= self.limits.max_phrase_data {
                return Err(BuildError::CapacityExceeded {
                    limit: "MAX_PHRASE_DATA",
                    capacity: self.limits.max_phrase_data,
                });
            }
            self.multi_char += 1;
        }
        self.phrases.push(record);
        Ok(())
    }

    pub fn load_phrases(
        &mut self,
        lines: &[PhraseLine],
        encoder: &dyn KeyEncoder,
        exceptions: &ExceptionTable,
    ) -> Result<()> {
        for line in lines {
            self.add_phrase(line, encoder, exceptions)?;
        }
        log::info!(
            "loaded {} phrases ({} of two or more characters)",
            self.phrases.len(),
            self.multi_char
        );
        Ok(())
    }

    /// Reject duplicates, sort phrases, and fold single characters into the
    /// word list. Afterwards `phrases` only holds multi-character entries.
    pub fn finalize(&mut self) -> Result<()> {
        compare::sort_phrases_checking_duplicates(&mut self.phrases)?;

        let (singles, phrases): (Vec<_>, Vec<_>) = std::mem::take(&mut self.phrases)
            .into_iter()
            .partition(|p| p.phones.len() < 2);
        self.phrases = phrases;

        let mut added = 0;
        for single in singles {
            let range = self.matching_words(&single);
            if range.is_empty() {
                // only reachable through an exception entry
                self.push_word_record(single)?;
                added += 1;
            } else {
                for word in &mut self.words[range] {
                    word.record.freq = single.freq;
                }
            }
        }
        if added > 0 {
            self.sort_words();
            log::debug!("{added} single-character phrases added to the word list");
        }
        Ok(())
    }

    fn matching_words(&self, single: &PhraseRecord) -> std::ops::Range<usize> {
        let cmp = |w: &WordRecord| compare::by_text_then_phone(&w.record, single);
        let start = self.words.partition_point(|w| cmp(w).is_lt());
        let end = self.words.partition_point(|w| cmp(w).is_le());
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::BopomofoEncoder;

    fn word(line: usize, keys: &str, text: &str) -> WordLine {
        WordLine { line, keys: keys.into(), text: text.into() }
    }

    fn phrase(line: usize, text: &str, freq: u32, phones: &[&str]) -> PhraseLine {
        PhraseLine {
            line,
            text: text.into(),
            freq,
            phones: phones.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn store_with(words: &[(&str, &str)]) -> RecordStore {
        let mut store = RecordStore::new(Limits::default());
        let lines: Vec<_> = words
            .iter()
            .enumerate()
            .map(|(i, (k, t))| word(i + 1, k, t))
            .collect();
        store.load_words(&lines, &BopomofoEncoder).unwrap();
        store
    }

    #[test]
    fn words_sort_by_text_then_phone() {
        let store = store_with(&[("ㄧˋ", "一"), ("ㄅㄨˋ", "不"), ("ㄧ", "一")]);
        let texts: Vec<_> = store
            .words()
            .iter()
            .map(|w| (w.record.text.as_str(), w.index))
            .collect();
        // 一 (U+4E00) sorts before 不 (U+4E0D)
        assert_eq!(texts, vec![("一", 2), ("一", 0), ("不", 1)]);
    }

    #[test]
    fn word_capacity_is_enforced() {
        let mut store = RecordStore::new(Limits { max_word_data: 1, ..Limits::default() });
        let err = store
            .load_words(&[word(1, "ㄧ", "一"), word(2, "ㄦ", "二")], &BopomofoEncoder)
            .unwrap_err();
        assert!(matches!(err, BuildError::CapacityExceeded { limit: "MAX_WORD_DATA", .. }));
    }

    #[test]
    fn word_keys_must_encode() {
        let mut store = RecordStore::new(Limits::default());
        let err = store.push_word(&word(3, "xx", "一"), &BopomofoEncoder).unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 3, .. }));
    }

    #[test]
    fn phrase_length_mismatch_is_reported() {
        let store = store_with(&[("ㄧ", "一")]);
        let err = store
            .encode_phrase(&phrase(4, "一一", 1, &["ㄧ"]), &BopomofoEncoder)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::LengthMismatch { line: 4, characters: 2, phones: 1, .. }
        ));
    }

    #[test]
    fn phrase_too_long_names_the_limit() {
        let store = RecordStore::new(Limits { max_phrase_len: 2, ..Limits::default() });
        let err = store
            .encode_phrase(&phrase(1, "一一一", 1, &["ㄧ", "ㄧ", "ㄧ"]), &BopomofoEncoder)
            .unwrap_err();
        assert!(matches!(err, BuildError::CapacityExceeded { limit: "MAX_PHRASE_LEN", .. }));
    }

    #[test]
    fn phrase_text_must_leave_room_for_its_terminator() {
        let store = RecordStore::new(Limits::default());
        let text = "一".repeat(50);
        let phones = vec!["ㄧ"; 50];
        let err = store
            .encode_phrase(&phrase(1, &text, 1, &phones), &BopomofoEncoder)
            .unwrap_err();
        assert!(matches!(err, BuildError::CapacityExceeded { limit: "MAX_PHRASE_BUF_LEN", .. }));

        // "一一" is six bytes
        let tight = RecordStore::new(Limits { max_phrase_buf_len: 6, ..Limits::default() });
        let line = phrase(2, "一一", 1, &["ㄧ", "ㄧ"]);
        assert!(tight.encode_phrase(&line, &BopomofoEncoder).is_err());
        let roomy = RecordStore::new(Limits { max_phrase_buf_len: 7, ..Limits::default() });
        assert!(roomy.encode_phrase(&line, &BopomofoEncoder).is_ok());
    }

    #[test]
    fn embedded_nul_is_rejected() {
        let mut store = RecordStore::new(Limits::default());
        let err = store.push_word(&word(5, "ㄧ", "\0"), &BopomofoEncoder).unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 5, .. }));
        let err = store
            .encode_phrase(&phrase(6, "一\0", 1, &["ㄧ", "ㄧ"]), &BopomofoEncoder)
            .unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 6, .. }));
    }

    #[test]
    fn word_keys_longer_than_the_limit_fail() {
        let mut store = RecordStore::new(Limits::default());
        let err = store.push_word(&word(7, "ㄅㄨˋˋˋ", "不"), &BopomofoEncoder).unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 7, .. }));
        store.push_word(&word(8, "ㄅㄨˋ", "不"), &BopomofoEncoder).unwrap();
        assert_eq!(store.words().len(), 1);
    }

    #[test]
    fn phrase_capacity_counts_only_multi_character_entries() {
        let mut store = RecordStore::new(Limits { max_phrase_data: 1, ..Limits::default() });
        store
            .load_words(&[word(1, "ㄧ", "一"), word(2, "ㄦˋ", "二")], &BopomofoEncoder)
            .unwrap();
        let exceptions = ExceptionTable::empty();
        store
            .add_phrase(&phrase(1, "一", 5, &["ㄧ"]), &BopomofoEncoder, &exceptions)
            .unwrap();
        store
            .add_phrase(&phrase(2, "一二", 5, &["ㄧ", "ㄦˋ"]), &BopomofoEncoder, &exceptions)
            .unwrap();
        let err = store
            .add_phrase(&phrase(3, "二一", 5, &["ㄦˋ", "ㄧ"]), &BopomofoEncoder, &exceptions)
            .unwrap_err();
        assert!(matches!(err, BuildError::CapacityExceeded { limit: "MAX_PHRASE_DATA", .. }));
    }

    #[test]
    fn single_characters_fold_into_words() {
        let mut store = store_with(&[("ㄧ", "一"), ("ㄦˋ", "二")]);
        let exceptions = ExceptionTable::empty();
        store
            .load_phrases(
                &[phrase(1, "一", 42, &["ㄧ"]), phrase(2, "一二", 7, &["ㄧ", "ㄦˋ"])],
                &BopomofoEncoder,
                &exceptions,
            )
            .unwrap();
        store.finalize().unwrap();
        assert_eq!(store.phrases().len(), 1);
        assert_eq!(store.words().len(), 2);
        let yi = store.words().iter().find(|w| w.record.text == "一").unwrap();
        assert_eq!(yi.record.freq, 42);
    }

    #[test]
    fn excepted_single_character_becomes_a_word() {
        let mut store = store_with(&[("ㄧ", "一")]);
        let mut exceptions = ExceptionTable::empty();
        let yi2 = BopomofoEncoder.encode("ㄧˊ").unwrap();
        exceptions.add_word("一", yi2);
        store
            .load_phrases(&[phrase(1, "一", 3, &["ㄧˊ"])], &BopomofoEncoder, &exceptions)
            .unwrap();
        store.finalize().unwrap();
        assert_eq!(store.words().len(), 2);
        assert!(store
            .words()
            .iter()
            .any(|w| w.first_phone() == yi2 && w.record.freq == 3 && w.index == 1));
    }
}
