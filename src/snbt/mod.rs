//! Stringified NBT, the human readable dialect.
//!
//! Reading infers every value's type from the text: a peek classifies the
//! upcoming token without consuming it, then the typed accessor parses it.
//! Sizes are never known up front, so non-empty collections report
//! [`UNKNOWN_SIZE`] and are iterated entry by entry.

pub(crate) mod literal;

use std::io::Write;

use crate::error::{Error, Result};
use crate::reader::{
    ArrayInfo, CompoundEntryInfo, ListInfo, NbtReader, RootTagInfo, UNKNOWN_SIZE,
};
use crate::writer::NbtWriter;
use crate::Tag;

fn is_unquoted_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
}

/// A cheap cursor over the input, cloneable so type inference can look ahead
/// without committing.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.next();
        }
    }

    /// The longest run of unquoted-safe characters at the cursor, without
    /// advancing.
    fn peek_unquoted(&self) -> &'a str {
        let rest = &self.src[self.pos..];
        let end = rest
            .char_indices()
            .find(|(_, c)| !is_unquoted_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..end]
    }
}

pub(crate) struct SnbtReader<'a> {
    cur: Cursor<'a>,
    // One "consumed an entry yet" flag per open collection, so a nested
    // empty collection can't clobber its parent's separator tracking.
    first_entry: Vec<bool>,
}

impl<'a> SnbtReader<'a> {
    pub fn new(src: &'a str) -> Self {
        SnbtReader {
            cur: Cursor { src, pos: 0 },
            first_entry: Vec::new(),
        }
    }

    /// Error unless everything but trailing whitespace was consumed.
    pub fn finish(&mut self) -> Result<()> {
        self.cur.skip_whitespace();
        if self.cur.peek().is_some() {
            return Err(Error::input_not_consumed());
        }
        Ok(())
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.cur.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(Error::bespoke(format!(
                "expected '{}', but got '{}'",
                expected, c
            ))),
            None => Err(Error::bespoke(format!(
                "expected '{}', but got EOF",
                expected
            ))),
        }
    }

    /// Classify the next value without consuming input.
    fn peek_tag_type(&self) -> Option<Tag> {
        let mut look = self.cur;
        look.skip_whitespace();
        match look.peek()? {
            '{' => Some(Tag::Compound),
            '\'' | '"' => Some(Tag::String),
            '[' => {
                look.next();
                look.skip_whitespace();
                let kind = look.next();
                look.skip_whitespace();
                match (kind, look.peek()) {
                    (Some('B'), Some(';')) => Some(Tag::ByteArray),
                    (Some('I'), Some(';')) => Some(Tag::IntArray),
                    (Some('L'), Some(';')) => Some(Tag::LongArray),
                    _ => Some(Tag::List),
                }
            }
            _ => literal::classify(look.peek_unquoted()),
        }
    }

    /// A quoted or unquoted string, or `None` for an empty unquoted token.
    fn read_snbt_string(&mut self) -> Result<Option<String>> {
        self.cur.skip_whitespace();
        match self.cur.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.cur.next();
                let mut out = String::new();
                loop {
                    match self.cur.next() {
                        None => return Err(Error::bespoke("unexpected EOF in string".to_string())),
                        Some(c) if c == quote => break,
                        Some('\\') => match self.cur.next() {
                            Some(c) if c == quote || c == '\\' => out.push(c),
                            Some(c) => {
                                return Err(Error::bespoke(format!("invalid escape: \\{}", c)))
                            }
                            None => {
                                return Err(Error::bespoke(
                                    "unexpected EOF in string".to_string(),
                                ))
                            }
                        },
                        Some(c) => out.push(c),
                    }
                }
                Ok(Some(out))
            }
            _ => {
                let token = self.cur.peek_unquoted();
                if token.is_empty() {
                    Ok(None)
                } else {
                    self.cur.pos += token.len();
                    Ok(Some(token.to_string()))
                }
            }
        }
    }

    /// Consume an unquoted token, or fail describing what was expected.
    fn take_token(&mut self, expected: Tag) -> Result<&'a str> {
        self.cur.skip_whitespace();
        let token = self.cur.peek_unquoted();
        if token.is_empty() {
            return Err(Error::bespoke(format!("expected {}, but got nothing", expected)));
        }
        self.cur.pos += token.len();
        Ok(token)
    }

    fn begin_collection(&mut self) -> Result<()> {
        self.cur.skip_whitespace();
        self.expect('[')?;
        self.first_entry.push(true);
        Ok(())
    }

    fn begin_array(&mut self, kind: char) -> Result<ArrayInfo> {
        self.begin_collection()?;
        self.cur.skip_whitespace();
        match self.cur.next() {
            Some(c) if c == kind => {}
            other => {
                return Err(Error::bespoke(format!(
                    "expected '{};' array prefix, but got '{}'",
                    kind,
                    other.map(String::from).unwrap_or_else(|| "EOF".to_string())
                )))
            }
        }
        self.cur.skip_whitespace();
        self.expect(';')?;
        self.cur.skip_whitespace();
        let size = if self.cur.peek() == Some(']') {
            0
        } else {
            UNKNOWN_SIZE
        };
        Ok(ArrayInfo { size })
    }

    /// Shared by lists, arrays and compounds: consume the separator, or
    /// report the end of the collection.
    fn begin_collection_entry(&mut self, close: char) -> Result<bool> {
        self.cur.skip_whitespace();
        if self.cur.peek() == Some(close) {
            return Ok(false);
        }
        if self.first_entry.last().copied().unwrap_or(true) {
            if let Some(first) = self.first_entry.last_mut() {
                *first = false;
            }
        } else {
            match self.cur.next() {
                Some(',') => {}
                Some(c) => {
                    return Err(Error::bespoke(format!(
                        "expected ',' or '{}', but got '{}'",
                        close, c
                    )))
                }
                None => {
                    return Err(Error::bespoke(format!(
                        "expected ',' or '{}', but got EOF",
                        close
                    )))
                }
            }
            self.cur.skip_whitespace();
        }
        Ok(true)
    }

    fn end_collection(&mut self, close: char) -> Result<()> {
        self.cur.skip_whitespace();
        self.first_entry.pop();
        self.expect(close)
    }
}

impl NbtReader for SnbtReader<'_> {
    fn begin_root_tag(&mut self) -> Result<RootTagInfo> {
        let tag = self
            .peek_tag_type()
            .ok_or_else(|| Error::bespoke("expected value, but got nothing".to_string()))?;
        Ok(RootTagInfo {
            tag,
            name: String::new(),
        })
    }

    fn begin_compound(&mut self) -> Result<()> {
        self.cur.skip_whitespace();
        self.expect('{')?;
        self.first_entry.push(true);
        Ok(())
    }

    fn begin_compound_entry(&mut self) -> Result<CompoundEntryInfo> {
        self.cur.skip_whitespace();
        if self.cur.peek() == Some('}') {
            return Ok(CompoundEntryInfo::end());
        }
        if self.first_entry.last().copied().unwrap_or(true) {
            if let Some(first) = self.first_entry.last_mut() {
                *first = false;
            }
        } else {
            match self.cur.next() {
                Some(',') => {}
                Some(c) => {
                    return Err(Error::bespoke(format!(
                        "expected ',' or '}}', but got '{}'",
                        c
                    )))
                }
                None => {
                    return Err(Error::bespoke("expected ',' or '}', but got EOF".to_string()))
                }
            }
        }
        let name = self
            .read_snbt_string()?
            .ok_or_else(|| Error::bespoke("expected key, but got nothing".to_string()))?;
        self.cur.skip_whitespace();
        self.expect(':')?;
        let tag = self
            .peek_tag_type()
            .ok_or_else(|| Error::bespoke("expected value, but got nothing".to_string()))?;
        Ok(CompoundEntryInfo { tag, name })
    }

    fn end_compound(&mut self) -> Result<()> {
        self.end_collection('}')
    }

    fn begin_list(&mut self) -> Result<ListInfo> {
        self.begin_collection()?;
        self.cur.skip_whitespace();
        match self.peek_tag_type() {
            Some(element_tag) => Ok(ListInfo {
                element_tag,
                size: UNKNOWN_SIZE,
            }),
            None => Ok(ListInfo {
                element_tag: Tag::End,
                size: 0,
            }),
        }
    }

    fn begin_list_entry(&mut self) -> Result<bool> {
        self.begin_collection_entry(']')
    }

    fn end_list(&mut self) -> Result<()> {
        self.end_collection(']')
    }

    fn begin_byte_array(&mut self) -> Result<ArrayInfo> {
        self.begin_array('B')
    }

    fn begin_byte_array_entry(&mut self) -> Result<bool> {
        self.begin_collection_entry(']')
    }

    fn end_byte_array(&mut self) -> Result<()> {
        self.end_collection(']')
    }

    fn begin_int_array(&mut self) -> Result<ArrayInfo> {
        self.begin_array('I')
    }

    fn begin_int_array_entry(&mut self) -> Result<bool> {
        self.begin_collection_entry(']')
    }

    fn end_int_array(&mut self) -> Result<()> {
        self.end_collection(']')
    }

    fn begin_long_array(&mut self) -> Result<ArrayInfo> {
        self.begin_array('L')
    }

    fn begin_long_array_entry(&mut self) -> Result<bool> {
        self.begin_collection_entry(']')
    }

    fn end_long_array(&mut self) -> Result<()> {
        self.end_collection(']')
    }

    fn read_byte(&mut self) -> Result<i8> {
        let token = self.take_token(Tag::Byte)?;
        if let Some(b) = literal::parse_bool(token) {
            return Ok(b as i8);
        }
        if !literal::matches_byte(token) {
            return Err(Error::bespoke(format!("expected Byte, but was '{}'", token)));
        }
        literal::strip_suffix(token)
            .parse()
            .map_err(|_| Error::bespoke(format!("Byte out of range: '{}'", token)))
    }

    fn read_short(&mut self) -> Result<i16> {
        let token = self.take_token(Tag::Short)?;
        if !literal::matches_short(token) {
            return Err(Error::bespoke(format!(
                "expected Short, but was '{}'",
                token
            )));
        }
        literal::strip_suffix(token)
            .parse()
            .map_err(|_| Error::bespoke(format!("Short out of range: '{}'", token)))
    }

    fn read_int(&mut self) -> Result<i32> {
        let token = self.take_token(Tag::Int)?;
        if !literal::matches_int(token) {
            return Err(Error::bespoke(format!("expected Int, but was '{}'", token)));
        }
        token
            .parse()
            .map_err(|_| Error::bespoke(format!("Int out of range: '{}'", token)))
    }

    fn read_long(&mut self) -> Result<i64> {
        let token = self.take_token(Tag::Long)?;
        if !literal::matches_long(token) {
            return Err(Error::bespoke(format!("expected Long, but was '{}'", token)));
        }
        literal::strip_suffix(token)
            .parse()
            .map_err(|_| Error::bespoke(format!("Long out of range: '{}'", token)))
    }

    fn read_float(&mut self) -> Result<f32> {
        let token = self.take_token(Tag::Float)?;
        if !literal::matches_float(token) {
            return Err(Error::bespoke(format!(
                "expected Float, but was '{}'",
                token
            )));
        }
        literal::strip_suffix(token)
            .parse()
            .map_err(|_| Error::bespoke(format!("invalid Float: '{}'", token)))
    }

    fn read_double(&mut self) -> Result<f64> {
        let token = self.take_token(Tag::Double)?;
        if !literal::matches_double(token) {
            return Err(Error::bespoke(format!(
                "expected Double, but was '{}'",
                token
            )));
        }
        literal::strip_suffix(token)
            .parse()
            .map_err(|_| Error::bespoke(format!("invalid Double: '{}'", token)))
    }

    fn read_string(&mut self) -> Result<String> {
        self.read_snbt_string()?
            .ok_or_else(|| Error::bespoke("expected String, but got nothing".to_string()))
    }
}

/// Writes compact SNBT. Strings are always quoted; keys are left bare when
/// every character is unquoted-safe.
pub(crate) struct SnbtWriter<W: Write> {
    sink: W,
    // One "wrote an entry yet" flag per open collection.
    pending: Vec<bool>,
}

impl<W: Write> SnbtWriter<W> {
    pub fn new(sink: W) -> Self {
        SnbtWriter {
            sink,
            pending: Vec::new(),
        }
    }

    fn open(&mut self, prefix: &str) -> Result<()> {
        self.sink.write_all(prefix.as_bytes())?;
        self.pending.push(true);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.pending.pop();
        Ok(self.sink.write_all(b"]")?)
    }

    fn separator(&mut self) -> Result<()> {
        if let Some(first) = self.pending.last_mut() {
            if *first {
                *first = false;
            } else {
                self.sink.write_all(b",")?;
            }
        }
        Ok(())
    }

    fn write_escaped(&mut self, value: &str) -> Result<()> {
        self.sink.write_all(b"\"")?;
        let mut rest = value;
        while let Some(i) = rest.find(['"', '\\']) {
            self.sink.write_all(rest[..i].as_bytes())?;
            self.sink.write_all(b"\\")?;
            self.sink.write_all(&rest.as_bytes()[i..=i])?;
            rest = &rest[i + 1..];
        }
        self.sink.write_all(rest.as_bytes())?;
        Ok(self.sink.write_all(b"\"")?)
    }

    fn write_int_with<V: itoa::Integer>(&mut self, value: V, suffix: &str) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.sink.write_all(buf.format(value).as_bytes())?;
        Ok(self.sink.write_all(suffix.as_bytes())?)
    }
}

impl<W: Write> NbtWriter for SnbtWriter<W> {
    fn begin_root_tag(&mut self, _tag: Tag, _name: &str) -> Result<()> {
        // SNBT has no root name.
        Ok(())
    }

    fn begin_compound(&mut self) -> Result<()> {
        self.sink.write_all(b"{")?;
        self.pending.push(true);
        Ok(())
    }

    fn begin_compound_entry(&mut self, _tag: Tag, name: &str) -> Result<()> {
        self.separator()?;
        if !name.is_empty() && name.chars().all(is_unquoted_char) {
            self.sink.write_all(name.as_bytes())?;
        } else {
            self.write_escaped(name)?;
        }
        Ok(self.sink.write_all(b":")?)
    }

    fn end_compound(&mut self) -> Result<()> {
        self.pending.pop();
        Ok(self.sink.write_all(b"}")?)
    }

    fn begin_list(&mut self, _element_tag: Tag, _size: i32) -> Result<()> {
        self.open("[")
    }

    fn begin_list_entry(&mut self) -> Result<()> {
        self.separator()
    }

    fn end_list(&mut self) -> Result<()> {
        self.close()
    }

    fn begin_byte_array(&mut self, _size: i32) -> Result<()> {
        self.open("[B;")
    }

    fn begin_byte_array_entry(&mut self) -> Result<()> {
        self.separator()
    }

    fn end_byte_array(&mut self) -> Result<()> {
        self.close()
    }

    fn begin_int_array(&mut self, _size: i32) -> Result<()> {
        self.open("[I;")
    }

    fn begin_int_array_entry(&mut self) -> Result<()> {
        self.separator()
    }

    fn end_int_array(&mut self) -> Result<()> {
        self.close()
    }

    fn begin_long_array(&mut self, _size: i32) -> Result<()> {
        self.open("[L;")
    }

    fn begin_long_array_entry(&mut self) -> Result<()> {
        self.separator()
    }

    fn end_long_array(&mut self) -> Result<()> {
        self.close()
    }

    fn write_byte(&mut self, value: i8) -> Result<()> {
        self.write_int_with(value, "b")
    }

    fn write_short(&mut self, value: i16) -> Result<()> {
        self.write_int_with(value, "s")
    }

    fn write_int(&mut self, value: i32) -> Result<()> {
        self.write_int_with(value, "")
    }

    fn write_long(&mut self, value: i64) -> Result<()> {
        self.write_int_with(value, "l")
    }

    fn write_float(&mut self, value: f32) -> Result<()> {
        let mut buf = ryu::Buffer::new();
        self.sink.write_all(buf.format(value).as_bytes())?;
        Ok(self.sink.write_all(b"f")?)
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        let mut buf = ryu::Buffer::new();
        Ok(self.sink.write_all(buf.format(value).as_bytes())?)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_escaped(value)
    }
}
