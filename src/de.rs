//! Deserialize NBT data into Rust types via serde.
//!
//! The deserializer here is generic over [`NbtReader`], so the same engine
//! decodes every dialect: binary Java or Bedrock, the network framings, and
//! SNBT. You normally drive it through a format handle like
//! [`Nbt`][crate::Nbt] or [`Snbt`][crate::Snbt] rather than directly.
//!
//! # Mapping NBT to Rust types
//!
//! Compounds decode into structs or maps; map keys are always strings.
//! Lists decode into `Vec`s. The dedicated array tags only decode into the
//! [`ByteArray`], [`IntArray`] and [`LongArray`] wrapper types; asking for a
//! plain `Vec<i32>` where the data holds an int array is an error rather
//! than a silent reinterpretation.
//!
//! Unknown compound keys are an error by default, naming the key and the
//! type of the value that was skipped. Configure the format handle with
//! `ignore_unknown_keys` to silently discard them instead. Decoding into a
//! map always yields every key.
//!
//! NBT has no enum representation, so deserializing enums fails with a "not
//! supported" error.
//!
//! [`ByteArray`]: crate::ByteArray
//! [`IntArray`]: crate::IntArray
//! [`LongArray`]: crate::LongArray

use std::fmt::Write as _;

use serde::de::value::StringDeserializer;
use serde::de::{self, DeserializeSeed, Visitor};
use serde::forward_to_deserialize_any;

use crate::error::{Error, Result};
use crate::reader::{NbtReader, UNKNOWN_SIZE};
use crate::{Tag, BYTE_ARRAY_TOKEN, INT_ARRAY_TOKEN, LONG_ARRAY_TOKEN};

/// Engine policy knobs: root name checking and unknown-key handling.
#[derive(Debug, Clone, Default)]
pub(crate) struct EngineConfig {
    pub named_root: bool,
    pub root_name: Option<String>,
    pub lenient_root_names: bool,
    pub ignore_unknown_keys: bool,
    pub human_readable: bool,
}

/// The field or index chain leading to the value currently being decoded,
/// carried into error messages.
#[derive(Debug, Default)]
struct Path(Vec<Segment>);

#[derive(Debug)]
enum Segment {
    Field(String),
    Index(usize),
}

impl Path {
    fn push_field(&mut self, name: String) {
        self.0.push(Segment::Field(name));
    }

    fn push_index(&mut self, index: usize) {
        self.0.push(Segment::Index(index));
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    fn render(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                Segment::Index(i) => {
                    let _ = write!(out, "[{}]", i);
                }
            }
        }
        Some(out)
    }
}

/// A serde deserializer over any [`NbtReader`].
pub struct Deserializer<R: NbtReader> {
    reader: R,
    config: EngineConfig,
    /// The tag of the value the next `deserialize_*` call will consume.
    current: Tag,
    path: Path,
}

impl<R: NbtReader> Deserializer<R> {
    pub(crate) fn new(mut reader: R, config: EngineConfig) -> Result<Self> {
        let root = reader.begin_root_tag()?;
        if config.named_root && !config.lenient_root_names {
            if let Some(expected) = &config.root_name {
                if &root.name != expected {
                    return Err(Error::root_name_mismatch(expected, &root.name));
                }
            }
        }
        Ok(Deserializer {
            reader,
            config,
            current: root.tag,
            path: Path::default(),
        })
    }

    /// Hand the underlying reader back, for end-of-input checks.
    pub(crate) fn into_reader(self) -> R {
        self.reader
    }

    fn expect_tag(&self, expected: Tag) -> Result<()> {
        if self.current == expected {
            Ok(())
        } else {
            Err(Error::mismatched_tag(expected, self.current).at(self.path.render()))
        }
    }

    fn array_elements<'de, V: Visitor<'de>>(&mut self, kind: ArrayKind, visitor: V) -> Result<V::Value> {
        let size = kind.begin(&mut self.reader)?.size;
        let value = visitor.visit_seq(ArrayElements {
            de: self,
            kind,
            remaining: size,
        })?;
        kind.end(&mut self.reader)?;
        Ok(value)
    }
}

/// Which of the three fixed-integer array tags is being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayKind {
    Byte,
    Int,
    Long,
}

impl ArrayKind {
    fn begin<R: NbtReader>(self, reader: &mut R) -> Result<crate::reader::ArrayInfo> {
        match self {
            ArrayKind::Byte => reader.begin_byte_array(),
            ArrayKind::Int => reader.begin_int_array(),
            ArrayKind::Long => reader.begin_long_array(),
        }
    }

    fn entry<R: NbtReader>(self, reader: &mut R) -> Result<bool> {
        match self {
            ArrayKind::Byte => reader.begin_byte_array_entry(),
            ArrayKind::Int => reader.begin_int_array_entry(),
            ArrayKind::Long => reader.begin_long_array_entry(),
        }
    }

    fn end<R: NbtReader>(self, reader: &mut R) -> Result<()> {
        match self {
            ArrayKind::Byte => reader.end_byte_array(),
            ArrayKind::Int => reader.end_int_array(),
            ArrayKind::Long => reader.end_long_array(),
        }
    }

    fn element_tag(self) -> Tag {
        match self {
            ArrayKind::Byte => Tag::Byte,
            ArrayKind::Int => Tag::Int,
            ArrayKind::Long => Tag::Long,
        }
    }

    fn array_tag(self) -> Tag {
        match self {
            ArrayKind::Byte => Tag::ByteArray,
            ArrayKind::Int => Tag::IntArray,
            ArrayKind::Long => Tag::LongArray,
        }
    }

    fn token(self) -> &'static str {
        match self {
            ArrayKind::Byte => BYTE_ARRAY_TOKEN,
            ArrayKind::Int => INT_ARRAY_TOKEN,
            ArrayKind::Long => LONG_ARRAY_TOKEN,
        }
    }
}

impl<'de, R: NbtReader> de::Deserializer<'de> for &mut Deserializer<R> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.current {
            Tag::End => Err(Error::bespoke("unexpected end tag".to_string())),
            Tag::Byte => visitor.visit_i8(self.reader.read_byte()?),
            Tag::Short => visitor.visit_i16(self.reader.read_short()?),
            Tag::Int => visitor.visit_i32(self.reader.read_int()?),
            Tag::Long => visitor.visit_i64(self.reader.read_long()?),
            Tag::Float => visitor.visit_f32(self.reader.read_float()?),
            Tag::Double => visitor.visit_f64(self.reader.read_double()?),
            Tag::String => visitor.visit_string(self.reader.read_string()?),
            Tag::Compound => self.deserialize_map(visitor),
            Tag::List => self.deserialize_seq(visitor),
            // Arrays show up as a single-entry map keyed by a hidden token,
            // so self-describing targets like Value can tell them from
            // lists.
            Tag::ByteArray => visitor.visit_map(ArrayWrapper {
                de: self,
                kind: ArrayKind::Byte,
                value_pending: false,
            }),
            Tag::IntArray => visitor.visit_map(ArrayWrapper {
                de: self,
                kind: ArrayKind::Int,
                value_pending: false,
            }),
            Tag::LongArray => visitor.visit_map(ArrayWrapper {
                de: self,
                kind: ArrayKind::Long,
                value_pending: false,
            }),
        }
    }

    forward_to_deserialize_any! {
        i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 str string
        identifier
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.expect_tag(Tag::Byte)?;
        visitor.visit_bool(self.reader.read_byte()? != 0)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.expect_tag(Tag::String)?;
        let s = self.reader.read_string()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::bespoke(format!(
                "expected single-character string, but was '{}'",
                s
            ))
            .at(self.path.render())),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        // A present entry is always Some; absence never reaches the engine.
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.reader.discard_tag(self.current)?;
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        let kind = match name {
            BYTE_ARRAY_TOKEN => ArrayKind::Byte,
            INT_ARRAY_TOKEN => ArrayKind::Int,
            LONG_ARRAY_TOKEN => ArrayKind::Long,
            _ => return visitor.visit_newtype_struct(self),
        };
        self.expect_tag(kind.array_tag())?;
        self.array_elements(kind, visitor)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.current {
            Tag::List => {}
            Tag::ByteArray | Tag::IntArray | Tag::LongArray => {
                return Err(Error::array_as_seq().at(self.path.render()))
            }
            other => return Err(Error::mismatched_tag(Tag::List, other).at(self.path.render())),
        }
        let info = self.reader.begin_list()?;
        let value = visitor.visit_seq(ListElements {
            de: self,
            element_tag: info.element_tag,
            remaining: info.size,
            index: 0,
        })?;
        self.reader.end_list()?;
        Ok(value)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.expect_tag(Tag::Compound)?;
        self.reader.begin_compound()?;
        let value = visitor.visit_map(CompoundAccess {
            de: self,
            fields: None,
            pending: None,
        })?;
        self.reader.end_compound()?;
        Ok(value)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.expect_tag(Tag::Compound)?;
        self.reader.begin_compound()?;
        let value = visitor.visit_map(CompoundAccess {
            de: self,
            fields: Some(fields),
            pending: None,
        })?;
        self.reader.end_compound()?;
        Ok(value)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        Err(Error::unsupported(
            "decoding enum values is not supported by the NBT format".to_string(),
        ))
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.expect_tag(Tag::ByteArray)?;
        let info = self.reader.begin_byte_array()?;
        let mut data = Vec::new();
        if info.size == UNKNOWN_SIZE {
            while self.reader.begin_byte_array_entry()? {
                data.push(self.reader.read_byte()? as u8);
            }
        } else {
            data.reserve((info.size.max(0) as usize).min(1 << 16));
            for _ in 0..info.size {
                data.push(self.reader.read_byte()? as u8);
            }
        }
        self.reader.end_byte_array()?;
        visitor.visit_byte_buf(data)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.reader.discard_tag(self.current)?;
        visitor.visit_unit()
    }

    fn is_human_readable(&self) -> bool {
        self.config.human_readable
    }
}

struct CompoundAccess<'a, R: NbtReader> {
    de: &'a mut Deserializer<R>,
    /// The target struct's known field names, or `None` when decoding into a
    /// map.
    fields: Option<&'static [&'static str]>,
    pending: Option<(Tag, String)>,
}

impl<'de, R: NbtReader> de::MapAccess<'de> for CompoundAccess<'_, R> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        loop {
            let entry = self.de.reader.begin_compound_entry()?;
            if entry.is_end() {
                return Ok(None);
            }
            if let Some(fields) = self.fields {
                if !fields.contains(&entry.name.as_str()) {
                    if self.de.config.ignore_unknown_keys {
                        self.de.reader.discard_tag(entry.tag)?;
                        continue;
                    }
                    // Describe what would have been thrown away; for lists
                    // the element type makes the message far more useful.
                    let type_name = if entry.tag == Tag::List {
                        match self.de.reader.discard_list_tag() {
                            Ok(element) => format!("List<{}>", element),
                            Err(_) => Tag::List.to_string(),
                        }
                    } else {
                        entry.tag.to_string()
                    };
                    return Err(
                        Error::unknown_key(&entry.name, &type_name).at(self.de.path.render())
                    );
                }
            }
            let key = seed.deserialize(StringDeserializer::<Error>::new(entry.name.clone()))?;
            self.pending = Some((entry.tag, entry.name));
            return Ok(Some(key));
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (tag, name) = self
            .pending
            .take()
            .ok_or_else(|| Error::bespoke("value read before key".to_string()))?;
        self.de.current = tag;
        self.de.path.push_field(name);
        let result = seed
            .deserialize(&mut *self.de)
            .map_err(|e| e.at(self.de.path.render()));
        self.de.path.pop();
        result
    }
}

struct ListElements<'a, R: NbtReader> {
    de: &'a mut Deserializer<R>,
    element_tag: Tag,
    /// Elements left, or [`UNKNOWN_SIZE`].
    remaining: i32,
    index: usize,
}

impl<'de, R: NbtReader> de::SeqAccess<'de> for ListElements<'_, R> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        let has_next = if self.remaining == UNKNOWN_SIZE {
            self.de.reader.begin_list_entry()?
        } else if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            false
        };
        if !has_next {
            return Ok(None);
        }
        self.de.current = self.element_tag;
        self.de.path.push_index(self.index);
        self.index += 1;
        let result = seed
            .deserialize(&mut *self.de)
            .map_err(|e| e.at(self.de.path.render()))
            .map(Some);
        self.de.path.pop();
        result
    }

    fn size_hint(&self) -> Option<usize> {
        (self.remaining >= 0).then(|| self.remaining as usize)
    }
}

struct ArrayElements<'a, R: NbtReader> {
    de: &'a mut Deserializer<R>,
    kind: ArrayKind,
    remaining: i32,
}

impl<'de, R: NbtReader> de::SeqAccess<'de> for ArrayElements<'_, R> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        let has_next = if self.remaining == UNKNOWN_SIZE {
            self.kind.entry(&mut self.de.reader)?
        } else if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            false
        };
        if !has_next {
            return Ok(None);
        }
        self.de.current = self.kind.element_tag();
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        (self.remaining >= 0).then(|| self.remaining as usize)
    }
}

/// Presents an array as a one-entry map keyed by the hidden token.
struct ArrayWrapper<'a, R: NbtReader> {
    de: &'a mut Deserializer<R>,
    kind: ArrayKind,
    value_pending: bool,
}

impl<'de, R: NbtReader> de::MapAccess<'de> for ArrayWrapper<'_, R> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        if self.value_pending {
            return Ok(None);
        }
        self.value_pending = true;
        seed.deserialize(de::value::BorrowedStrDeserializer::new(self.kind.token()))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        seed.deserialize(ArraySeq {
            de: self.de,
            kind: self.kind,
        })
    }
}

/// Deserializes the payload of an array tag as a plain seq of its elements.
struct ArraySeq<'a, R: NbtReader> {
    de: &'a mut Deserializer<R>,
    kind: ArrayKind,
}

impl<'de, R: NbtReader> de::Deserializer<'de> for ArraySeq<'_, R> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.de.array_elements(self.kind, visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}
