//! The pull side of the format protocol.
//!
//! A dialect implements [`NbtReader`] and the structural engine drives it.
//! The trait's provided methods give every dialect the same skip and
//! tree-materialization behavior for free.

use crate::error::{Error, Result};
use crate::value::{Compound, List, Value};
use crate::{ByteArray, IntArray, LongArray, Tag};

/// Reported instead of an element count by dialects that only learn a
/// collection's length at its terminating marker.
pub const UNKNOWN_SIZE: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootTagInfo {
    pub tag: Tag,
    /// Empty for dialects without a named root.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundEntryInfo {
    pub tag: Tag,
    pub name: String,
}

impl CompoundEntryInfo {
    /// The entry reported once a compound's end marker is reached.
    pub fn end() -> Self {
        CompoundEntryInfo {
            tag: Tag::End,
            name: String::new(),
        }
    }

    pub fn is_end(&self) -> bool {
        self.tag == Tag::End
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListInfo {
    pub element_tag: Tag,
    /// Element count, or [`UNKNOWN_SIZE`].
    pub size: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayInfo {
    /// Element count, or [`UNKNOWN_SIZE`].
    pub size: i32,
}

/// Pull-based access to one NBT document in some dialect.
///
/// Calls must follow the NBT grammar: a root tag, then the payload implied
/// by each reported tag. `begin_*_entry` is only called when the matching
/// `begin_*` reported [`UNKNOWN_SIZE`]; sized collections are read by
/// counting. Violations surface as decoding errors, never panics.
pub trait NbtReader {
    fn begin_root_tag(&mut self) -> Result<RootTagInfo>;

    fn begin_compound(&mut self) -> Result<()>;

    /// The next entry's tag and name, or an entry with `Tag::End` once the
    /// compound is exhausted.
    fn begin_compound_entry(&mut self) -> Result<CompoundEntryInfo>;

    fn end_compound(&mut self) -> Result<()>;

    fn begin_list(&mut self) -> Result<ListInfo>;

    /// Whether another element follows. Only valid after an unknown-size
    /// `begin_list`.
    fn begin_list_entry(&mut self) -> Result<bool>;

    fn end_list(&mut self) -> Result<()>;

    fn begin_byte_array(&mut self) -> Result<ArrayInfo>;
    fn begin_byte_array_entry(&mut self) -> Result<bool>;
    fn end_byte_array(&mut self) -> Result<()>;

    fn begin_int_array(&mut self) -> Result<ArrayInfo>;
    fn begin_int_array_entry(&mut self) -> Result<bool>;
    fn end_int_array(&mut self) -> Result<()>;

    fn begin_long_array(&mut self) -> Result<ArrayInfo>;
    fn begin_long_array_entry(&mut self) -> Result<bool>;
    fn end_long_array(&mut self) -> Result<()>;

    fn read_byte(&mut self) -> Result<i8>;
    fn read_short(&mut self) -> Result<i16>;
    fn read_int(&mut self) -> Result<i32>;
    fn read_long(&mut self) -> Result<i64>;
    fn read_float(&mut self) -> Result<f32>;
    fn read_double(&mut self) -> Result<f64>;
    fn read_string(&mut self) -> Result<String>;

    /// Consume a value of the given tag without materializing it.
    fn discard_tag(&mut self, tag: Tag) -> Result<()> {
        match tag {
            Tag::End => {
                return Err(Error::bespoke(
                    "unexpected end tag, expected a value".to_string(),
                ))
            }
            Tag::Byte => {
                self.read_byte()?;
            }
            Tag::Short => {
                self.read_short()?;
            }
            Tag::Int => {
                self.read_int()?;
            }
            Tag::Long => {
                self.read_long()?;
            }
            Tag::Float => {
                self.read_float()?;
            }
            Tag::Double => {
                self.read_double()?;
            }
            Tag::String => {
                self.read_string()?;
            }
            Tag::ByteArray => {
                let info = self.begin_byte_array()?;
                if info.size == UNKNOWN_SIZE {
                    while self.begin_byte_array_entry()? {
                        self.read_byte()?;
                    }
                } else {
                    for _ in 0..info.size {
                        self.read_byte()?;
                    }
                }
                self.end_byte_array()?;
            }
            Tag::IntArray => {
                let info = self.begin_int_array()?;
                if info.size == UNKNOWN_SIZE {
                    while self.begin_int_array_entry()? {
                        self.read_int()?;
                    }
                } else {
                    for _ in 0..info.size {
                        self.read_int()?;
                    }
                }
                self.end_int_array()?;
            }
            Tag::LongArray => {
                let info = self.begin_long_array()?;
                if info.size == UNKNOWN_SIZE {
                    while self.begin_long_array_entry()? {
                        self.read_long()?;
                    }
                } else {
                    for _ in 0..info.size {
                        self.read_long()?;
                    }
                }
                self.end_long_array()?;
            }
            Tag::List => {
                self.discard_list_tag()?;
            }
            Tag::Compound => {
                self.begin_compound()?;
                loop {
                    let entry = self.begin_compound_entry()?;
                    if entry.is_end() {
                        break;
                    }
                    self.discard_tag(entry.tag)?;
                }
                self.end_compound()?;
            }
        }
        Ok(())
    }

    /// Consume a whole list, reporting its element tag for diagnostics.
    fn discard_list_tag(&mut self) -> Result<Tag> {
        let info = self.begin_list()?;
        if info.size == UNKNOWN_SIZE {
            while self.begin_list_entry()? {
                self.discard_tag(info.element_tag)?;
            }
        } else {
            for _ in 0..info.size {
                self.discard_tag(info.element_tag)?;
            }
        }
        self.end_list()?;
        Ok(info.element_tag)
    }

    /// Materialize a value of the given tag as an owned tree.
    fn read_value(&mut self, tag: Tag) -> Result<Value> {
        Ok(match tag {
            Tag::End => {
                return Err(Error::bespoke(
                    "unexpected end tag, expected a value".to_string(),
                ))
            }
            Tag::Byte => Value::Byte(self.read_byte()?),
            Tag::Short => Value::Short(self.read_short()?),
            Tag::Int => Value::Int(self.read_int()?),
            Tag::Long => Value::Long(self.read_long()?),
            Tag::Float => Value::Float(self.read_float()?),
            Tag::Double => Value::Double(self.read_double()?),
            Tag::String => Value::String(self.read_string()?),
            Tag::ByteArray => {
                let info = self.begin_byte_array()?;
                let mut data = sized_vec(info.size);
                if info.size == UNKNOWN_SIZE {
                    while self.begin_byte_array_entry()? {
                        data.push(self.read_byte()?);
                    }
                } else {
                    for _ in 0..info.size {
                        data.push(self.read_byte()?);
                    }
                }
                self.end_byte_array()?;
                Value::ByteArray(ByteArray::new(data))
            }
            Tag::IntArray => {
                let info = self.begin_int_array()?;
                let mut data = sized_vec(info.size);
                if info.size == UNKNOWN_SIZE {
                    while self.begin_int_array_entry()? {
                        data.push(self.read_int()?);
                    }
                } else {
                    for _ in 0..info.size {
                        data.push(self.read_int()?);
                    }
                }
                self.end_int_array()?;
                Value::IntArray(IntArray::new(data))
            }
            Tag::LongArray => {
                let info = self.begin_long_array()?;
                let mut data = sized_vec(info.size);
                if info.size == UNKNOWN_SIZE {
                    while self.begin_long_array_entry()? {
                        data.push(self.read_long()?);
                    }
                } else {
                    for _ in 0..info.size {
                        data.push(self.read_long()?);
                    }
                }
                self.end_long_array()?;
                Value::LongArray(LongArray::new(data))
            }
            Tag::List => {
                let info = self.begin_list()?;
                let mut values = sized_vec(info.size);
                if info.size == UNKNOWN_SIZE {
                    while self.begin_list_entry()? {
                        values.push(self.read_value(info.element_tag)?);
                    }
                } else {
                    for _ in 0..info.size {
                        values.push(self.read_value(info.element_tag)?);
                    }
                }
                self.end_list()?;
                Value::List(List::from_parts(info.element_tag, values))
            }
            Tag::Compound => {
                self.begin_compound()?;
                let mut compound = Compound::new();
                loop {
                    let entry = self.begin_compound_entry()?;
                    if entry.is_end() {
                        break;
                    }
                    let value = self.read_value(entry.tag)?;
                    compound.insert(entry.name, value);
                }
                self.end_compound()?;
                Value::Compound(compound)
            }
        })
    }
}

fn sized_vec<T>(size: i32) -> Vec<T> {
    if size > 0 {
        // Cap the preallocation so a corrupt size can't exhaust memory.
        Vec::with_capacity((size as usize).min(1 << 16))
    } else {
        Vec::new()
    }
}
