//! Lenient HTML tokenizer for the host parser.
//!
//! A tag name runs until ASCII whitespace, `/` or `>`, so `.` and non-ASCII
//! characters stay part of it. Attribute names are restricted to ASCII
//! `[A-Za-z0-9:_-]`. Both are interned ASCII-lowercased. A `<` that does not
//! open markup is read as text.
//! The tokenizer never fails; malformed bytes are skipped or kept as text.
//!
//! Known limitations:
//! - No HTML5 parse-error recovery or character-reference tables beyond the
//!   subset in `entities`.
//! - Only `script` and `style` are treated as raw text.

use crate::entities::decode_entities;
use crate::serialize::is_rawtext_element;
use crate::types::{AtomId, AtomTable, Token, TokenStream};
use memchr::memchr;

const COMMENT_OPEN: &[u8] = b"<!--";
const COMMENT_CLOSE: &str = "-->";
const DOCTYPE_OPEN: &[u8] = b"<!doctype";
const SCRIPT_CLOSE_TAG: &[u8] = b"</script";
const STYLE_CLOSE_TAG: &[u8] = b"</style";

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':')
}

/// Every terminator is ASCII, so a tag name always ends on a UTF-8 boundary.
fn is_tag_name_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'/' | b'>' | b'\0')
}

fn starts_with_ignore_ascii_case(haystack: &[u8], at: usize, needle: &[u8]) -> bool {
    haystack.len() >= at + needle.len()
        && haystack[at..at + needle.len()].eq_ignore_ascii_case(needle)
}

/// Find `close_tag` (optionally followed by ASCII whitespace) and its `>`.
///
/// Returns `(text_end, resume_at)`. Only ASCII `<` positions are probed, so both
/// offsets are UTF-8 boundaries.
fn find_rawtext_close(bytes: &[u8], from: usize, close_tag: &[u8]) -> Option<(usize, usize)> {
    let mut i = from;
    while i < bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        if starts_with_ignore_ascii_case(bytes, i, close_tag) {
            let mut k = i + close_tag.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if bytes.get(k) == Some(&b'>') {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

/// Tokenize a complete markup string.
pub fn tokenize(input: &str) -> TokenStream {
    let mut tokenizer = Tokenizer::new(input);
    tokenizer.run();
    tokenizer.finish()
}

pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    atoms: AtomTable,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            atoms: AtomTable::new(),
            tokens: Vec::new(),
        }
    }

    pub fn run(&mut self) {
        let bytes = self.bytes();
        while self.pos < bytes.len() {
            if bytes[self.pos] == b'<' && self.consume_markup() {
                continue;
            }
            self.consume_text();
        }
    }

    pub fn finish(self) -> TokenStream {
        TokenStream::new(self.tokens, self.atoms)
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    /// Returns `false` when the `<` at the cursor does not open markup.
    fn consume_markup(&mut self) -> bool {
        let bytes = self.bytes();
        let at = self.pos;
        if starts_with_ignore_ascii_case(bytes, at, COMMENT_OPEN) {
            self.consume_comment();
            return true;
        }
        if starts_with_ignore_ascii_case(bytes, at, DOCTYPE_OPEN) {
            self.consume_doctype();
            return true;
        }
        match bytes.get(at + 1) {
            Some(b'/') => {
                self.consume_end_tag();
                true
            }
            Some(b) if b.is_ascii_alphabetic() => {
                self.consume_start_tag();
                true
            }
            _ => false,
        }
    }

    fn consume_text(&mut self) {
        let bytes = self.bytes();
        let start = self.pos;
        // A stray `<` belongs to the text run it starts.
        let scan_from = if bytes[start] == b'<' { start + 1 } else { start };
        let end = memchr(b'<', &bytes[scan_from..]).map_or(bytes.len(), |rel| scan_from + rel);
        self.pos = end;
        let decoded = decode_entities(&self.input[start..end]);
        if decoded.is_empty() {
            return;
        }
        match self.tokens.last_mut() {
            Some(Token::Text(previous)) => previous.push_str(&decoded),
            _ => self.tokens.push(Token::Text(decoded)),
        }
    }

    fn consume_comment(&mut self) {
        let body_start = self.pos + COMMENT_OPEN.len();
        let rest = &self.input[body_start..];
        match rest.find(COMMENT_CLOSE) {
            Some(end) => {
                self.tokens.push(Token::Comment(rest[..end].to_string()));
                self.pos = body_start + end + COMMENT_CLOSE.len();
            }
            None => {
                self.tokens.push(Token::Comment(rest.to_string()));
                self.pos = self.input.len();
            }
        }
    }

    fn consume_doctype(&mut self) {
        let body_start = self.pos + 2;
        let rest = &self.input[body_start..];
        let end = rest.find('>').unwrap_or(rest.len());
        self.tokens.push(Token::Doctype(rest[..end].trim().to_string()));
        self.pos = (body_start + end + 1).min(self.input.len());
    }

    fn consume_end_tag(&mut self) {
        let bytes = self.bytes();
        let name_start = self.pos + 2;
        let name_end = self.scan_tag_name(name_start);
        let close = memchr(b'>', &bytes[name_end..]).map_or(bytes.len(), |rel| name_end + rel + 1);
        if name_end > name_start {
            let name = self
                .atoms
                .intern_ascii_lowercase(&self.input[name_start..name_end]);
            self.tokens.push(Token::EndTag(name));
        }
        self.pos = close;
    }

    fn consume_start_tag(&mut self) {
        let bytes = self.bytes();
        let name_start = self.pos + 1;
        let name_end = self.scan_tag_name(name_start);
        let name = self
            .atoms
            .intern_ascii_lowercase(&self.input[name_start..name_end]);
        self.pos = name_end;

        let mut attributes: Vec<(AtomId, Option<String>)> = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            match bytes.get(self.pos) {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    if bytes.get(self.pos + 1) == Some(&b'>') {
                        self_closing = true;
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                Some(&b) if is_name_byte(b) => {
                    let (attribute, value) = self.consume_attribute();
                    // First occurrence wins, later duplicates are dropped.
                    if !attributes.iter().any(|(existing, _)| *existing == attribute) {
                        attributes.push((attribute, value));
                    }
                }
                Some(_) => self.advance_char(),
            }
        }

        self.tokens.push(Token::StartTag {
            name,
            attributes,
            self_closing,
        });

        let tag = self.atoms.resolve(name);
        if is_rawtext_element(tag) && !self_closing {
            let close_tag = if tag == "script" {
                SCRIPT_CLOSE_TAG
            } else {
                STYLE_CLOSE_TAG
            };
            self.consume_rawtext(name, close_tag);
        }
    }

    fn consume_rawtext(&mut self, name: AtomId, close_tag: &[u8]) {
        let bytes = self.bytes();
        let start = self.pos;
        // A missing close tag turns the rest of the input into raw text.
        let (text_end, resume_at) =
            find_rawtext_close(bytes, start, close_tag).unwrap_or((bytes.len(), bytes.len()));
        if text_end > start {
            self.tokens
                .push(Token::Text(self.input[start..text_end].to_string()));
        }
        self.tokens.push(Token::EndTag(name));
        self.pos = resume_at;
    }

    fn consume_attribute(&mut self) -> (AtomId, Option<String>) {
        let name_start = self.pos;
        let name_end = self.scan_name(name_start);
        let name = self
            .atoms
            .intern_ascii_lowercase(&self.input[name_start..name_end]);
        self.pos = name_end;
        self.skip_whitespace();

        let bytes = self.bytes();
        if bytes.get(self.pos) != Some(&b'=') {
            return (name, None);
        }
        self.pos += 1;
        self.skip_whitespace();

        let value = match bytes.get(self.pos) {
            Some(&quote @ (b'"' | b'\'')) => {
                let value_start = self.pos + 1;
                let value_end = memchr(quote, &bytes[value_start..])
                    .map_or(bytes.len(), |rel| value_start + rel);
                self.pos = (value_end + 1).min(bytes.len());
                decode_entities(&self.input[value_start..value_end])
            }
            _ => {
                let value_start = self.pos;
                let mut end = value_start;
                while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                    if bytes[end] == b'/' && bytes.get(end + 1) == Some(&b'>') {
                        break;
                    }
                    end += 1;
                }
                self.pos = end;
                decode_entities(&self.input[value_start..end])
            }
        };
        (name, Some(value))
    }

    fn scan_name(&self, from: usize) -> usize {
        let bytes = self.bytes();
        let mut end = from;
        while end < bytes.len() && is_name_byte(bytes[end]) {
            end += 1;
        }
        end
    }

    fn scan_tag_name(&self, from: usize) -> usize {
        let bytes = self.bytes();
        let mut end = from;
        while end < bytes.len() && is_tag_name_byte(bytes[end]) {
            end += 1;
        }
        end
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn advance_char(&mut self) {
        let width = self.input[self.pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.pos += width;
    }
}
