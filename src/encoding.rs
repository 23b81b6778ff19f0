//! Phonetic code encoders.
//!
//! The rest of the build treats a code as an opaque non-zero `u16`; the
//! encoders here are the only place that knows how one is made.
//!
//! Bopomofo syllables pack as `initial << 9 | medial << 7 | final << 3 | tone`,
//! each component being a 1-based index into its table (0 = absent).

use std::collections::HashMap;

pub type PhoneCode = u16;

pub const TONE_MASK: PhoneCode = 0x7;
pub const NEUTRAL_TONE: PhoneCode = 1;

const INITIALS: &str = "ㄅㄆㄇㄈㄉㄊㄋㄌㄍㄎㄏㄐㄑㄒㄓㄔㄕㄖㄗㄘㄙ";
const MEDIALS: &str = "ㄧㄨㄩ";
const FINALS: &str = "ㄚㄛㄜㄝㄞㄟㄠㄡㄢㄣㄤㄥㄦ";
const TONES: &str = "˙ˊˇˋ";

const SHIFTS: [u32; 4] = [9, 7, 3, 0];

/// Dachen layout, in the same order as the four tables above chained together.
const DACHEN_KEYS: &str = "1qaz2wsxedcrfv5tgbyhnujm8ik,9ol.0p;/-7634";

/// Turns a key string into a phonetic code.
///
/// Returns `None` when the string is not a valid key sequence for this
/// encoder. A returned code is never 0.
pub trait KeyEncoder {
    fn encode(&self, keys: &str) -> Option<PhoneCode>;
}

fn tables() -> [&'static str; 4] {
    [INITIALS, MEDIALS, FINALS, TONES]
}

/// Component slot and 1-based index of a bopomofo symbol.
fn classify(symbol: char) -> Option<(usize, PhoneCode)> {
    tables().iter().enumerate().find_map(|(slot, table)| {
        table
            .chars()
            .position(|c| c == symbol)
            .map(|idx| (slot, idx as PhoneCode + 1))
    })
}

/// Packs symbols that must appear in initial/medial/final/tone order, each
/// slot at most once.
fn compose(symbols: impl Iterator<Item = char>) -> Option<PhoneCode> {
    let mut code: PhoneCode = 0;
    let mut next_slot = 0;
    for symbol in symbols {
        let (slot, idx) = classify(symbol)?;
        if slot < next_slot {
            return None;
        }
        code |= idx << SHIFTS[slot];
        next_slot = slot + 1;
    }
    (code != 0).then_some(code)
}

/// Renders a code back to bopomofo; first tone has no mark.
pub fn phone_to_bopomofo(code: PhoneCode) -> Option<String> {
    const MASKS: [PhoneCode; 4] = [0x1f, 0x3, 0xf, 0x7];
    if code == 0 {
        return None;
    }
    let mut out = String::new();
    for (slot, table) in tables().iter().enumerate() {
        let idx = (code >> SHIFTS[slot]) & MASKS[slot];
        if idx == 0 {
            continue;
        }
        out.push(table.chars().nth(idx as usize - 1)?);
    }
    Some(out)
}

/// Bopomofo symbols as written in `tsi.src`, e.g. `ㄕㄜˊ`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BopomofoEncoder;

impl KeyEncoder for BopomofoEncoder {
    fn encode(&self, keys: &str) -> Option<PhoneCode> {
        compose(keys.chars())
    }
}

/// Keystrokes on the Dachen (standard) keyboard, as used by `phone.cin`.
#[derive(Debug, Clone)]
pub struct DachenKeyEncoder {
    layout: HashMap<char, char>,
}

impl DachenKeyEncoder {
    pub fn new() -> Self {
        let symbols = tables().concat();
        let layout = DACHEN_KEYS.chars().zip(symbols.chars()).collect();
        Self { layout }
    }
}

impl Default for DachenKeyEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyEncoder for DachenKeyEncoder {
    fn encode(&self, keys: &str) -> Option<PhoneCode> {
        let symbols: Option<Vec<char>> = keys.chars().map(|k| self.layout.get(&k).copied()).collect();
        compose(symbols?.into_iter())
    }
}

/// Packs a whole keystroke sequence into one code, for input methods that are
/// not phonetic (one record per key sequence rather than per syllable).
///
/// Each key maps to its 1-based position in the alphabet; the sequence is read
/// as a number in base `alphabet.len() + 1`, first key most significant.
#[derive(Debug, Clone)]
pub struct KeySequenceEncoder {
    alphabet: HashMap<char, u32>,
    base: u32,
}

impl KeySequenceEncoder {
    pub fn new(alphabet: impl IntoIterator<Item = char>) -> Self {
        let mut map = HashMap::new();
        for key in alphabet {
            let next = map.len() as u32 + 1;
            map.entry(key).or_insert(next);
        }
        let base = map.len() as u32 + 1;
        Self { alphabet: map, base }
    }

    pub fn alphabet_len(&self) -> usize {
        self.alphabet.len()
    }
}

impl KeyEncoder for KeySequenceEncoder {
    fn encode(&self, keys: &str) -> Option<PhoneCode> {
        let mut code: u32 = 0;
        for key in keys.chars() {
            let idx = *self.alphabet.get(&key)?;
            code = code.checked_mul(self.base)?.checked_add(idx)?;
            if code > PhoneCode::MAX as u32 {
                return None;
            }
        }
        PhoneCode::try_from(code).ok().filter(|&c| c != 0)
    }
}

/// Replaces the tone of `code` by the neutral tone.
pub fn with_neutral_tone(code: PhoneCode) -> PhoneCode {
    (code & !TONE_MASK) | NEUTRAL_TONE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bopomofo_packs_components() {
        let enc = BopomofoEncoder;
        assert_eq!(enc.encode("ㄅㄨˊ"), Some(0x302));
        assert_eq!(enc.encode("ㄕㄜˊ"), Some(0x221a));
        assert_eq!(enc.encode("ㄇㄜ˙"), Some(0x619));
        // first tone carries no mark
        assert_eq!(enc.encode("ㄅㄚ"), Some((1 << 9) | (1 << 3)));
    }

    #[test]
    fn bopomofo_rejects_bad_order_and_junk() {
        let enc = BopomofoEncoder;
        assert_eq!(enc.encode(""), None);
        assert_eq!(enc.encode("ㄚㄅ"), None);
        assert_eq!(enc.encode("ㄅㄅ"), None);
        assert_eq!(enc.encode("ba"), None);
    }

    #[test]
    fn dachen_matches_bopomofo() {
        let dachen = DachenKeyEncoder::new();
        let bopomofo = BopomofoEncoder;
        // 1 = ㄅ, j = ㄨ, 6 = ˊ
        assert_eq!(dachen.encode("1j6"), bopomofo.encode("ㄅㄨˊ"));
        // g = ㄕ, k = ㄜ, 6 = ˊ
        assert_eq!(dachen.encode("gk6"), bopomofo.encode("ㄕㄜˊ"));
        // u = ㄧ
        assert_eq!(dachen.encode("u"), bopomofo.encode("ㄧ"));
        assert_eq!(dachen.encode("!"), None);
    }

    #[test]
    fn decode_inverts_encode() {
        let enc = BopomofoEncoder;
        for syllable in ["ㄅㄨˊ", "ㄇㄜ˙", "ㄧ", "ㄓㄨㄤˋ", "ㄦˇ"] {
            let code = enc.encode(syllable).unwrap();
            assert_eq!(phone_to_bopomofo(code).as_deref(), Some(syllable));
        }
        assert_eq!(phone_to_bopomofo(0), None);
    }

    #[test]
    fn neutral_tone_replaces_tone_bits() {
        let enc = BopomofoEncoder;
        let ba4 = enc.encode("ㄅㄚˋ").unwrap();
        assert_eq!(Some(with_neutral_tone(ba4)), enc.encode("ㄅㄚ˙"));
    }

    #[test]
    fn key_sequence_packs_most_significant_first() {
        let enc = KeySequenceEncoder::new("abc".chars());
        assert_eq!(enc.alphabet_len(), 3);
        assert_eq!(enc.encode("a"), Some(1));
        assert_eq!(enc.encode("ba"), Some(2 * 4 + 1));
        assert_eq!(enc.encode("d"), None);
        assert_eq!(enc.encode(""), None);
    }

    #[test]
    fn key_sequence_overflow_is_rejected() {
        let enc = KeySequenceEncoder::new('a'..='z');
        assert!(enc.encode("zzz").is_some());
        assert_eq!(enc.encode("zzzz"), None);
    }
}
