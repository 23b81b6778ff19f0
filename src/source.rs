//! Line readers for the two source formats.
//!
//! `.cin` keystroke tables:
//!
//! ```text
//! %ename  phone
//! %keyname begin
//! a  ㄇ
//! %keyname end
//! %chardef begin
//! 1j6  不
//! %chardef end
//! ```
//!
//! `tsi.src` phrase lists: `<phrase> <freq> <syllable> <syllable> ...`.
//!
//! Comments start at `#`. Paths ending in `.gz` are decompressed on the fly.
//! This module only tokenizes; encoding and checking happen in `record`.

use crate::error::{BuildError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

const ENAME: &str = "%ename";
const KEYNAME: &str = "%keyname";
const CHARDEF: &str = "%chardef";
const BEGIN: &str = "begin";
const END: &str = "end";

/// One `%chardef` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordLine {
    pub line: usize,
    pub keys: String,
    pub text: String,
}

/// One `tsi.src` entry, phones still as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseLine {
    pub line: usize,
    pub text: String,
    pub freq: u32,
    pub phones: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CinTable {
    pub ename: Option<String>,
    /// Keys declared in `%keyname`, in declaration order.
    pub keynames: Vec<char>,
    pub words: Vec<WordLine>,
}

/// Open `path` for line reading, through gzip when it ends with `.gz`.
pub fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| BuildError::io(path, e))?;
    let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Drop the comment and surrounding whitespace.
pub fn strip(line: &str) -> &str {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    line.trim()
}

/// Numbered lines of `reader`. Bytes that are not UTF-8 fail with the line they sit on.
fn numbered_lines<'a, R: BufRead + 'a>(
    reader: R,
    origin: &'a Path,
) -> impl Iterator<Item = Result<(usize, String)>> + 'a {
    reader.split(b'\n').enumerate().map(move |(idx, bytes)| {
        let line_num = idx + 1;
        let mut bytes = bytes.map_err(|e| BuildError::io(origin, e))?;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        let line = String::from_utf8(bytes)
            .map_err(|_| BuildError::parse(line_num, "line is not valid UTF-8"))?;
        Ok((line_num, line))
    })
}

fn normalize(text: &str) -> String {
    text.nfc().collect()
}

#[derive(Clone, Copy, PartialEq)]
enum CinState {
    Init,
    KeyName,
    CharDef,
    Done,
}

pub fn read_cin_file(path: &Path) -> Result<CinTable> {
    read_cin(open(path)?, path)
}

pub fn read_cin<R: BufRead>(reader: R, origin: &Path) -> Result<CinTable> {
    let mut table = CinTable::default();
    let mut state = CinState::Init;
    let mut chardef_seen = false;
    let mut line_num = 0;

    for numbered in numbered_lines(reader, origin) {
        let (num, line) = numbered?;
        line_num = num;
        let buf = strip(&line);
        if buf.is_empty() {
            continue;
        }

        if buf.starts_with('%') {
            let mut tokens = buf.split_whitespace();
            let directive = tokens.next().unwrap_or_default();
            let arg = tokens.next();
            match directive {
                ENAME => table.ename = arg.map(str::to_string),
                KEYNAME => match (arg, state) {
                    (Some(BEGIN), CinState::Init) => state = CinState::KeyName,
                    (Some(END), CinState::KeyName) => state = CinState::Init,
                    _ => {
                        return Err(BuildError::parse(
                            line_num,
                            format!("unexpected `{buf}`"),
                        ))
                    }
                },
                CHARDEF => match (arg, state) {
                    (Some(BEGIN), CinState::Init) if !chardef_seen => {
                        chardef_seen = true;
                        state = CinState::CharDef;
                    }
                    (Some(END), CinState::CharDef) => state = CinState::Done,
                    (_, CinState::CharDef) => {
                        return Err(BuildError::parse(
                            line_num,
                            format!("{CHARDEF} {END} is expected"),
                        ))
                    }
                    _ => {
                        return Err(BuildError::parse(
                            line_num,
                            format!("{CHARDEF} {BEGIN} is expected"),
                        ))
                    }
                },
                _ => log::debug!("line {line_num}: ignoring directive `{directive}`"),
            }
            if state == CinState::Done {
                break;
            }
            continue;
        }

        match state {
            CinState::KeyName => {
                if let Some(key) = buf.chars().next() {
                    if !table.keynames.contains(&key) {
                        table.keynames.push(key);
                    }
                }
            }
            CinState::CharDef => {
                let mut tokens = buf.split_whitespace();
                let (Some(keys), Some(text)) = (tokens.next(), tokens.next()) else {
                    return Err(BuildError::parse(
                        line_num,
                        format!("error reading line `{line}`"),
                    ));
                };
                table.words.push(WordLine {
                    line: line_num,
                    keys: keys.to_string(),
                    text: normalize(text),
                });
            }
            CinState::Init | CinState::Done => {}
        }
    }

    match state {
        CinState::Done => Ok(table),
        CinState::CharDef => Err(BuildError::parse(
            line_num,
            format!("cannot find {CHARDEF} {END}"),
        )),
        _ => Err(BuildError::parse(
            line_num,
            format!("cannot find {CHARDEF} {BEGIN}"),
        )),
    }
}

pub fn read_tsi_file(path: &Path) -> Result<Vec<PhraseLine>> {
    read_tsi(open(path)?, path)
}

pub fn read_tsi<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<PhraseLine>> {
    let mut phrases = Vec::new();
    for numbered in numbered_lines(reader, origin) {
        let (line_num, line) = numbered?;
        if let Some(phrase) = parse_tsi_line(&line, line_num)? {
            phrases.push(phrase);
        }
    }
    Ok(phrases)
}

/// `Ok(None)` for blank and comment-only lines.
pub fn parse_tsi_line(line: &str, line_num: usize) -> Result<Option<PhraseLine>> {
    let buf = strip(line);
    if buf.is_empty() {
        return Ok(None);
    }
    let mut tokens = buf.split_whitespace();
    let text = tokens.next().unwrap_or_default();
    let Some(freq) = tokens.next() else {
        return Err(BuildError::parse(line_num, format!("error reading line `{line}`")));
    };
    let freq: u32 = freq.parse().map_err(|_| {
        BuildError::parse(
            line_num,
            format!("error reading frequency `{freq}` in line `{line}`"),
        )
    })?;
    Ok(Some(PhraseLine {
        line: line_num,
        text: normalize(text),
        freq,
        phones: tokens.map(str::to_string).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cin(text: &str) -> Result<CinTable> {
        read_cin(text.as_bytes(), Path::new("test.cin"))
    }

    #[test]
    fn strip_removes_comment_and_space() {
        assert_eq!(strip("  abc 1  # comment\n"), "abc 1");
        assert_eq!(strip("# only comment"), "");
    }

    #[test]
    fn cin_reads_chardef_block() {
        let table = cin("%ename phone\n%chardef begin\n1j6 不 # bu2\nu 一\n%chardef end\nzz 忽略\n").unwrap();
        assert_eq!(table.ename.as_deref(), Some("phone"));
        assert_eq!(
            table.words,
            vec![
                WordLine { line: 3, keys: "1j6".into(), text: "不".into() },
                WordLine { line: 4, keys: "u".into(), text: "一".into() },
            ]
        );
    }

    #[test]
    fn cin_collects_keynames() {
        let table =
            cin("%keyname begin\na 日\nb 月\na 重\n%keyname end\n%chardef begin\nab 明\n%chardef end\n")
                .unwrap();
        assert_eq!(table.keynames, vec!['a', 'b']);
        assert_eq!(table.words.len(), 1);
    }

    #[test]
    fn cin_without_chardef_fails() {
        let err = cin("%ename x\n").unwrap_err();
        assert!(err.to_string().contains("%chardef begin"));
        let err = cin("%chardef begin\na 一\n").unwrap_err();
        assert!(err.to_string().contains("%chardef end"));
        let err = cin("%chardef end\n").unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 1, .. }));
    }

    #[test]
    fn cin_entry_without_text_fails() {
        let err = cin("%chardef begin\nabc\n%chardef end\n").unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 2, .. }));
    }

    #[test]
    fn tsi_lines_tokenize() {
        let src = "# header\n\n不要 300 ㄅㄨˋ ㄧㄠˋ\n一 10 ㄧ\n";
        let phrases = read_tsi(src.as_bytes(), Path::new("tsi.src")).unwrap();
        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[0].line, 3);
        assert_eq!(phrases[0].text, "不要");
        assert_eq!(phrases[0].freq, 300);
        assert_eq!(phrases[0].phones, vec!["ㄅㄨˋ", "ㄧㄠˋ"]);
    }

    #[test]
    fn tsi_bad_frequency_is_line_numbered() {
        let err = parse_tsi_line("不要 lots ㄅㄨˋ ㄧㄠˋ", 7).unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 7, .. }));
        let err = parse_tsi_line("不要", 8).unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 8, .. }));
    }

    #[test]
    fn invalid_utf8_is_a_line_numbered_parse_error() {
        let src = b"\xe4\xb8\x8d\xe8\xa6\x81 10 a b\n\xff\xfe 1 x\n";
        let err = read_tsi(src.as_slice(), Path::new("tsi.src")).unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 2, .. }));

        let src = b"%chardef begin\nu \xe4\xb8\x80\nj \xc3\x28\n%chardef end\n";
        let err = read_cin(src.as_slice(), Path::new("test.cin")).unwrap_err();
        assert!(matches!(err, BuildError::Parse { line: 3, .. }));
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let table = cin("%chardef begin\r\nu 一\r\n%chardef end\r\n").unwrap();
        assert_eq!(table.words[0].text, "一");
        let phrases = read_tsi("不要 3 ㄅㄨˋ ㄧㄠˋ\r\n".as_bytes(), Path::new("tsi.src")).unwrap();
        assert_eq!(phrases[0].phones, vec!["ㄅㄨˋ", "ㄧㄠˋ"]);
    }

    #[test]
    fn text_is_nfc_normalized() {
        // e + combining acute
        let phrase = parse_tsi_line("e\u{301} 1 ㄝ", 1).unwrap().unwrap();
        assert_eq!(phrase.text, "\u{e9}");
    }
}
