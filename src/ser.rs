//! Serialize Rust types into NBT via serde.
//!
//! Generic over [`NbtWriter`], so one engine feeds every dialect. The main
//! wrinkle is that NBT wants a value's tag (and, for compound entries, its
//! name) *before* the payload, while serde only reveals the type when the
//! value itself is serialized. The serializer carries a small state machine
//! and writes the pending header from inside the value's own serialize
//! call. The tricky case is list headers: the element tag comes from the
//! first element, and an empty list is written as `(End, 0)`.

use serde::ser::{self, Impossible, Serialize};

use crate::error::{Error, Result};
use crate::writer::NbtWriter;
use crate::{Tag, BYTE_ARRAY_TOKEN, INT_ARRAY_TOKEN, LONG_ARRAY_TOKEN};

/// Where the next value will land, deciding which header precedes it.
#[derive(Debug)]
enum State {
    /// The document root: tag byte plus the configured root name.
    Root,
    /// First element of a list; the list header is still unwritten.
    ListStart { len: usize },
    /// Subsequent list elements.
    ListRest,
    /// A compound entry: tag byte plus this field name.
    Compound { current_field: String },
}

#[derive(Debug)]
enum TupleState {
    Start { len: usize },
    Rest,
}

pub struct Serializer<W: NbtWriter> {
    writer: W,
    state: State,
    root_name: String,
}

impl<W: NbtWriter> Serializer<W> {
    pub(crate) fn new(writer: W, root_name: String) -> Self {
        Serializer {
            writer,
            state: State::Root,
            root_name,
        }
    }

    fn try_write_header(&mut self, tag: Tag) -> Result<()> {
        match &mut self.state {
            State::Root => {
                self.writer.begin_root_tag(tag, &self.root_name)?;
                // Nothing consults the state again before an entry resets it.
                self.state = State::ListRest;
            }
            State::ListStart { len } => {
                let len = *len;
                self.writer.begin_list(tag, len as i32)?;
                self.writer.begin_list_entry()?;
                self.state = State::ListRest;
            }
            State::ListRest => {
                self.writer.begin_list_entry()?;
            }
            State::Compound { current_field } => {
                let name = std::mem::take(current_field);
                self.writer.begin_compound_entry(tag, &name)?;
            }
        }
        Ok(())
    }
}

impl<'a, W: NbtWriter> ser::Serializer for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = SerializerTuple<'a, W>;
    type SerializeTuple = SerializerTuple<'a, W>;
    type SerializeTupleStruct = SerializerTuple<'a, W>;
    type SerializeTupleVariant = SerializerTuple<'a, W>;
    type SerializeMap = SerializerMap<'a, W>;
    type SerializeStruct = SerializerMap<'a, W>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.serialize_i8(v as i8)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.try_write_header(Tag::Byte)?;
        self.writer.write_byte(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.try_write_header(Tag::Short)?;
        self.writer.write_short(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.try_write_header(Tag::Int)?;
        self.writer.write_int(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.try_write_header(Tag::Long)?;
        self.writer.write_long(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_i8(v as i8)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_i16(v as i16)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_i32(v as i32)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.try_write_header(Tag::Float)?;
        self.writer.write_float(v)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.try_write_header(Tag::Double)?;
        self.writer.write_double(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.serialize_str(v.encode_utf8(&mut [0; 4]))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.try_write_header(Tag::String)?;
        self.writer.write_string(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.try_write_header(Tag::ByteArray)?;
        self.writer.begin_byte_array(v.len() as i32)?;
        for b in v {
            self.writer.begin_byte_array_entry()?;
            self.writer.write_byte(*b as i8)?;
        }
        self.writer.end_byte_array()
    }

    fn serialize_none(self) -> Result<()> {
        // The entry header hasn't been written yet, so a None field simply
        // doesn't appear in the output.
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(Error::unsupported(
            "encoding unit values is not supported by the NBT format".to_string(),
        ))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        let kind = match variant {
            BYTE_ARRAY_TOKEN => ArrayKind::Byte,
            INT_ARRAY_TOKEN => ArrayKind::Int,
            LONG_ARRAY_TOKEN => ArrayKind::Long,
            _ => {
                return Err(Error::unsupported(
                    "encoding enum values is not supported by the NBT format".to_string(),
                ))
            }
        };
        self.try_write_header(kind.tag())?;
        value.serialize(ArraySerializer { ser: self, kind })
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let len =
            len.ok_or_else(|| Error::bespoke("sequences must have a known length".to_string()))?;
        self.serialize_tuple(len)
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.try_write_header(Tag::List)?;

        if len == 0 {
            // No element will ever reveal a tag, so the header is written
            // here; a zero-length list of End tags is the convention.
            self.writer.begin_list(Tag::End, 0)?;
        }

        Ok(SerializerTuple {
            ser: self,
            state: if len == 0 {
                TupleState::Rest
            } else {
                TupleState::Start { len }
            },
        })
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_tuple(len)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.serialize_tuple(len)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.try_write_header(Tag::Compound)?;
        self.writer.begin_compound()?;
        Ok(SerializerMap {
            ser: self,
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::unsupported(
            "encoding enum values is not supported by the NBT format".to_string(),
        ))
    }
}

pub struct SerializerMap<'a, W: NbtWriter> {
    ser: &'a mut Serializer<W>,
    pending_key: Option<String>,
}

impl<W: NbtWriter> ser::SerializeMap for SerializerMap<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.pending_key = Some(key.serialize(NameSerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let name = self
            .pending_key
            .take()
            .ok_or_else(|| Error::bespoke("value serialized before key".to_string()))?;
        self.ser.state = State::Compound {
            current_field: name,
        };
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.ser.writer.end_compound()
    }
}

impl<W: NbtWriter> ser::SerializeStruct for SerializerMap<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        ser::SerializeMap::serialize_entry(self, key, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeMap::end(self)
    }
}

pub struct SerializerTuple<'a, W: NbtWriter> {
    ser: &'a mut Serializer<W>,
    state: TupleState,
}

impl<W: NbtWriter> ser::SerializeSeq for SerializerTuple<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        <Self as ser::SerializeTuple>::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        <Self as ser::SerializeTuple>::end(self)
    }
}

impl<W: NbtWriter> ser::SerializeTuple for SerializerTuple<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        match self.state {
            TupleState::Start { len } => {
                self.ser.state = State::ListStart { len };
                self.state = TupleState::Rest;
                value.serialize(&mut *self.ser)
            }
            TupleState::Rest => {
                self.ser.state = State::ListRest;
                value.serialize(&mut *self.ser)
            }
        }
    }

    fn end(self) -> Result<()> {
        self.ser.writer.end_list()
    }
}

impl<W: NbtWriter> ser::SerializeTupleStruct for SerializerTuple<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        <Self as ser::SerializeTuple>::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        <Self as ser::SerializeTuple>::end(self)
    }
}

impl<W: NbtWriter> ser::SerializeTupleVariant for SerializerTuple<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        <Self as ser::SerializeTuple>::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        <Self as ser::SerializeTuple>::end(self)
    }
}

#[derive(Debug, Clone, Copy)]
enum ArrayKind {
    Byte,
    Int,
    Long,
}

impl ArrayKind {
    fn tag(self) -> Tag {
        match self {
            ArrayKind::Byte => Tag::ByteArray,
            ArrayKind::Int => Tag::IntArray,
            ArrayKind::Long => Tag::LongArray,
        }
    }
}

macro_rules! only_array_seq {
    ($ser:ident($($t:ty),*) -> $res:ty) => {
        fn $ser(self, $(_: $t),*) -> Result<$res> {
            Err(Error::array_as_other())
        }
    };

    ($ser:ident<T>($($t:ty),*) -> $res:ty) => {
        fn $ser<T: ?Sized + Serialize>(self, $(_: $t),*) -> Result<$res> {
            Err(Error::array_as_other())
        }
    };

    ($ser:ident($($t:ty),*)) => {
        only_array_seq!($ser($($t),*) -> Self::Ok);
    };

    ($ser:ident<T>($($t:ty),*)) => {
        only_array_seq!($ser<T>($($t),*) -> Self::Ok);
    };
}

/// Serializes the hidden array-token payload: a seq of fixed-width ints.
struct ArraySerializer<'a, W: NbtWriter> {
    ser: &'a mut Serializer<W>,
    kind: ArrayKind,
}

impl<'a, W: NbtWriter> ser::Serializer for ArraySerializer<'a, W> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = ArraySeqSerializer<'a, W>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Impossible<(), Error>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let len = len
            .ok_or_else(|| Error::bespoke("nbt arrays must have a known length".to_string()))?;
        match self.kind {
            ArrayKind::Byte => self.ser.writer.begin_byte_array(len as i32)?,
            ArrayKind::Int => self.ser.writer.begin_int_array(len as i32)?,
            ArrayKind::Long => self.ser.writer.begin_long_array(len as i32)?,
        }
        Ok(ArraySeqSerializer {
            ser: self.ser,
            kind: self.kind,
        })
    }

    only_array_seq!(serialize_bool(bool));
    only_array_seq!(serialize_i8(i8));
    only_array_seq!(serialize_i16(i16));
    only_array_seq!(serialize_i32(i32));
    only_array_seq!(serialize_i64(i64));
    only_array_seq!(serialize_u8(u8));
    only_array_seq!(serialize_u16(u16));
    only_array_seq!(serialize_u32(u32));
    only_array_seq!(serialize_u64(u64));
    only_array_seq!(serialize_f32(f32));
    only_array_seq!(serialize_f64(f64));
    only_array_seq!(serialize_char(char));
    only_array_seq!(serialize_str(&str));
    only_array_seq!(serialize_bytes(&[u8]));
    only_array_seq!(serialize_none());
    only_array_seq!(serialize_some<T>(&T));
    only_array_seq!(serialize_unit());
    only_array_seq!(serialize_unit_struct(&'static str));
    only_array_seq!(serialize_unit_variant(&'static str, u32, &'static str));
    only_array_seq!(serialize_newtype_struct<T>(&'static str, &T));
    only_array_seq!(serialize_newtype_variant<T>(&'static str, u32, &'static str, &T));
    only_array_seq!(serialize_tuple(usize) -> Self::SerializeTuple);
    only_array_seq!(serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct);
    only_array_seq!(serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant);
    only_array_seq!(serialize_map(Option<usize>) -> Self::SerializeMap);
    only_array_seq!(serialize_struct(&'static str, usize) -> Self::SerializeStruct);
    only_array_seq!(serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant);
}

pub struct ArraySeqSerializer<'a, W: NbtWriter> {
    ser: &'a mut Serializer<W>,
    kind: ArrayKind,
}

impl<W: NbtWriter> ser::SerializeSeq for ArraySeqSerializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        match self.kind {
            ArrayKind::Byte => self.ser.writer.begin_byte_array_entry()?,
            ArrayKind::Int => self.ser.writer.begin_int_array_entry()?,
            ArrayKind::Long => self.ser.writer.begin_long_array_entry()?,
        }
        value.serialize(ElementSerializer {
            writer: &mut self.ser.writer,
        })
    }

    fn end(self) -> Result<()> {
        match self.kind {
            ArrayKind::Byte => self.ser.writer.end_byte_array(),
            ArrayKind::Int => self.ser.writer.end_int_array(),
            ArrayKind::Long => self.ser.writer.end_long_array(),
        }
    }
}

/// Writes one bare integer element, no header.
struct ElementSerializer<'a, W: NbtWriter> {
    writer: &'a mut W,
}

impl<W: NbtWriter> ser::Serializer for ElementSerializer<'_, W> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Impossible<(), Error>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.writer.write_byte(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.writer.write_int(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.writer.write_long(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.writer.write_byte(v as i8)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.writer.write_int(v as i32)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.writer.write_long(v as i64)
    }

    only_array_seq!(serialize_bool(bool));
    only_array_seq!(serialize_i16(i16));
    only_array_seq!(serialize_u16(u16));
    only_array_seq!(serialize_f32(f32));
    only_array_seq!(serialize_f64(f64));
    only_array_seq!(serialize_char(char));
    only_array_seq!(serialize_str(&str));
    only_array_seq!(serialize_bytes(&[u8]));
    only_array_seq!(serialize_none());
    only_array_seq!(serialize_some<T>(&T));
    only_array_seq!(serialize_unit());
    only_array_seq!(serialize_unit_struct(&'static str));
    only_array_seq!(serialize_unit_variant(&'static str, u32, &'static str));
    only_array_seq!(serialize_newtype_struct<T>(&'static str, &T));
    only_array_seq!(serialize_newtype_variant<T>(&'static str, u32, &'static str, &T));
    only_array_seq!(serialize_seq(Option<usize>) -> Self::SerializeSeq);
    only_array_seq!(serialize_tuple(usize) -> Self::SerializeTuple);
    only_array_seq!(serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct);
    only_array_seq!(serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant);
    only_array_seq!(serialize_map(Option<usize>) -> Self::SerializeMap);
    only_array_seq!(serialize_struct(&'static str, usize) -> Self::SerializeStruct);
    only_array_seq!(serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant);
}

macro_rules! must_be_stringy {
    ($name:literal: $ser:ident($($t:ty),*) -> $res:ty) => {
        fn $ser(self, $(_: $t),*) -> Result<$res> {
            Err(Error::bespoke(format!(
                "compound key must be string-like, found {}",
                $name
            )))
        }
    };

    ($name:literal: $ser:ident<T>($($t:ty),*) -> $res:ty) => {
        fn $ser<T: ?Sized + Serialize>(self, $(_: $t),*) -> Result<$res> {
            Err(Error::bespoke(format!(
                "compound key must be string-like, found {}",
                $name
            )))
        }
    };

    ($name:literal: $ser:ident($($t:ty),*)) => {
        must_be_stringy!($name: $ser($($t),*) -> Self::Ok);
    };

    ($name:literal: $ser:ident<T>($($t:ty),*)) => {
        must_be_stringy!($name: $ser<T>($($t),*) -> Self::Ok);
    };
}

/// Captures a compound key as a string; anything that isn't string-like is
/// rejected.
struct NameSerializer;

impl ser::Serializer for NameSerializer {
    type Ok = String;
    type Error = Error;
    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String> {
        value.serialize(self)
    }

    must_be_stringy!("bool": serialize_bool(bool));
    must_be_stringy!("i8": serialize_i8(i8));
    must_be_stringy!("i16": serialize_i16(i16));
    must_be_stringy!("i32": serialize_i32(i32));
    must_be_stringy!("i64": serialize_i64(i64));
    must_be_stringy!("u8": serialize_u8(u8));
    must_be_stringy!("u16": serialize_u16(u16));
    must_be_stringy!("u32": serialize_u32(u32));
    must_be_stringy!("u64": serialize_u64(u64));
    must_be_stringy!("f32": serialize_f32(f32));
    must_be_stringy!("f64": serialize_f64(f64));
    must_be_stringy!("bytes": serialize_bytes(&[u8]));
    must_be_stringy!("none": serialize_none());
    must_be_stringy!("some": serialize_some<T>(&T));
    must_be_stringy!("unit": serialize_unit());
    must_be_stringy!("unit_struct": serialize_unit_struct(&'static str));
    must_be_stringy!("newtype_variant": serialize_newtype_variant<T>(&'static str, u32, &'static str, &T));
    must_be_stringy!("seq": serialize_seq(Option<usize>) -> Self::SerializeSeq);
    must_be_stringy!("tuple": serialize_tuple(usize) -> Self::SerializeTuple);
    must_be_stringy!("tuple_struct": serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct);
    must_be_stringy!("tuple_variant": serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant);
    must_be_stringy!("map": serialize_map(Option<usize>) -> Self::SerializeMap);
    must_be_stringy!("struct": serialize_struct(&'static str, usize) -> Self::SerializeStruct);
    must_be_stringy!("struct_variant": serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant);
}
