//! Dictionary blob writer.
//!
//! Words and phrases, both sorted by text then phone, are merged in one pass.
//! Each distinct text is written once, NUL-terminated; every record with that
//! text gets the same offset. The optional frequency log holds, per distinct
//! text and in blob order, the sum of the frequencies of all its records.

use crate::compare::by_text_then_phone;
use crate::error::{BuildError, Result};
use crate::node::MAX_U24;
use crate::record::{PhraseRecord, WordRecord};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

#[derive(Debug, Default)]
pub struct DictionaryBlob {
    pub bytes: Vec<u8>,
    pub freq_log: Option<Vec<u32>>,
    /// Distinct texts written.
    pub unique: usize,
}

struct Writer {
    bytes: Vec<u8>,
    freq_log: Option<Vec<u32>>,
    unique: usize,
    last: Option<(String, u32)>,
    total: u32,
}

impl Writer {
    fn place(&mut self, record: &mut PhraseRecord) -> Result<()> {
        if let Some((text, offset)) = &self.last {
            if *text == record.text {
                record.assign_offset(*offset);
                self.total = self.total.saturating_add(record.freq);
                return Ok(());
            }
        }
        self.flush();

        let offset = u32::try_from(self.bytes.len())
            .ok()
            .filter(|&o| o <= MAX_U24)
            .ok_or(BuildError::CapacityExceeded {
                limit: "MAX_DICTIONARY_SIZE",
                capacity: MAX_U24 as usize,
            })?;
        self.bytes.try_reserve(record.text.len() + 1)?;
        self.bytes.extend_from_slice(record.text.as_bytes());
        self.bytes.push(0);
        record.assign_offset(offset);

        self.unique += 1;
        self.total = record.freq;
        self.last = Some((record.text.clone(), offset));
        Ok(())
    }

    fn flush(&mut self) {
        if self.last.is_some() {
            if let Some(log) = &mut self.freq_log {
                log.push(self.total);
            }
        }
    }
}

/// Assigns a dictionary offset to every record and returns the blob.
pub fn write_dictionary(
    words: &mut [WordRecord],
    phrases: &mut [PhraseRecord],
    with_freq_log: bool,
) -> Result<DictionaryBlob> {
    let mut writer = Writer {
        bytes: Vec::new(),
        freq_log: with_freq_log.then(Vec::new),
        unique: 0,
        last: None,
        total: 0,
    };

    let (mut i, mut j) = (0, 0);
    while i < words.len() || j < phrases.len() {
        let take_word = match (words.get(i), phrases.get(j)) {
            (Some(w), Some(p)) => by_text_then_phone(&w.record, p).is_le(),
            (Some(_), None) => true,
            _ => false,
        };
        if take_word {
            writer.place(&mut words[i].record)?;
            i += 1;
        } else {
            writer.place(&mut phrases[j])?;
            j += 1;
        }
    }
    writer.flush();

    log::info!(
        "dictionary: {} distinct strings, {} bytes",
        writer.unique,
        writer.bytes.len()
    );
    Ok(DictionaryBlob {
        bytes: writer.bytes,
        freq_log: writer.freq_log,
        unique: writer.unique,
    })
}

/// Frequency log as little-endian `u32`s.
pub fn encode_freq_log(log: &[u32]) -> Vec<u8> {
    log.iter().flat_map(|freq| freq.to_le_bytes()).collect()
}

pub fn decode_freq_log(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(BuildError::CorruptIndex(format!(
            "frequency log of {} bytes is not a multiple of 4",
            bytes.len()
        )));
    }
    let mut cursor = Cursor::new(bytes);
    let mut log = Vec::with_capacity(bytes.len() / 4);
    while let Ok(freq) = cursor.read_u32::<LittleEndian>() {
        log.push(freq);
    }
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, phone: u16, freq: u32, index: usize) -> WordRecord {
        WordRecord { record: PhraseRecord::new(text, freq, vec![phone]), index }
    }

    fn text_at(bytes: &[u8], offset: u32) -> &str {
        let start = offset as usize;
        let end = start + bytes[start..].iter().position(|&b| b == 0).unwrap();
        std::str::from_utf8(&bytes[start..end]).unwrap()
    }

    #[test]
    fn shared_text_shares_one_offset() {
        let mut words = vec![word("A", 5, 0, 0)];
        let mut phrases = vec![
            PhraseRecord::new("AB", 10, vec![5, 7]),
            PhraseRecord::new("AB", 2, vec![5, 8]),
            PhraseRecord::new("AC", 3, vec![5, 9]),
        ];
        let blob = write_dictionary(&mut words, &mut phrases, true).unwrap();
        assert_eq!(blob.bytes, b"A\0AB\0AC\0");
        assert_eq!(blob.unique, 3);
        assert_eq!(words[0].record.dictionary_offset(), Some(0));
        assert_eq!(phrases[0].dictionary_offset(), Some(2));
        assert_eq!(phrases[1].dictionary_offset(), Some(2));
        assert_eq!(phrases[2].dictionary_offset(), Some(5));
        assert_eq!(blob.freq_log, Some(vec![0, 12, 3]));
    }

    #[test]
    fn words_and_phrases_merge_in_text_order() {
        let mut words = vec![word("a", 1, 4, 0), word("c", 2, 1, 1)];
        let mut phrases = vec![PhraseRecord::new("b", 9, vec![3, 3])];
        let blob = write_dictionary(&mut words, &mut phrases, false).unwrap();
        assert_eq!(blob.bytes, b"a\0b\0c\0");
        assert_eq!(blob.freq_log, None);
        for w in &words {
            assert_eq!(text_at(&blob.bytes, w.record.dictionary_offset().unwrap()), w.record.text);
        }
        assert_eq!(text_at(&blob.bytes, phrases[0].dictionary_offset().unwrap()), "b");
    }

    #[test]
    fn homophone_words_share_text_and_total() {
        // 一 read three ways, one of them carrying a folded frequency
        let mut words = vec![word("一", 0x80, 7, 0), word("一", 0x82, 0, 1), word("一", 0x84, 1, 2)];
        let blob = write_dictionary(&mut words, &mut [], true).unwrap();
        assert_eq!(blob.unique, 1);
        assert!(words.iter().all(|w| w.record.dictionary_offset() == Some(0)));
        assert_eq!(blob.freq_log, Some(vec![8]));
    }

    #[test]
    fn empty_input_writes_nothing() {
        let blob = write_dictionary(&mut [], &mut [], true).unwrap();
        assert!(blob.bytes.is_empty());
        assert_eq!(blob.freq_log, Some(vec![]));
    }

    #[test]
    fn freq_log_is_little_endian() {
        let bytes = encode_freq_log(&[1, 0x01020304]);
        assert_eq!(bytes, vec![1, 0, 0, 0, 4, 3, 2, 1]);
        assert_eq!(decode_freq_log(&bytes).unwrap(), vec![1, 0x01020304]);
        assert!(matches!(decode_freq_log(&bytes[..5]), Err(BuildError::CorruptIndex(_))));
    }
}
