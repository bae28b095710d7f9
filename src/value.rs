//! An owned, tree representation of an NBT value.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::{ByteArray, IntArray, LongArray, Tag, BYTE_ARRAY_TOKEN, INT_ARRAY_TOKEN,
            LONG_ARRAY_TOKEN};

/// A compound preserves insertion order, but compares order-independently.
pub type Compound = IndexMap<String, Value>;

/// An owned NBT value of any tag type.
///
/// Useful when the structure isn't known ahead of time, or when writing
/// generic tooling over arbitrary NBT. Prefer deserializing into concrete
/// types where the shape is known.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(ByteArray),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(IntArray),
    LongArray(LongArray),
}

impl Value {
    pub fn tag(&self) -> Tag {
        match self {
            Value::Byte(_) => Tag::Byte,
            Value::Short(_) => Tag::Short,
            Value::Int(_) => Tag::Int,
            Value::Long(_) => Tag::Long,
            Value::Float(_) => Tag::Float,
            Value::Double(_) => Tag::Double,
            Value::ByteArray(_) => Tag::ByteArray,
            Value::String(_) => Tag::String,
            Value::List(_) => Tag::List,
            Value::Compound(_) => Tag::Compound,
            Value::IntArray(_) => Tag::IntArray,
            Value::LongArray(_) => Tag::LongArray,
        }
    }
}

/// An NBT list: homogeneous elements with the element tag carried alongside,
/// so an empty list survives a decode/encode round trip. An empty list always
/// carries `Tag::End`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List {
    element_tag: Tag,
    values: Vec<Value>,
}

impl List {
    pub fn new() -> Self {
        List {
            element_tag: Tag::End,
            values: Vec::new(),
        }
    }

    /// Build a list from values, inferring the element tag from the first and
    /// requiring the rest to match.
    pub fn try_from_values(values: Vec<Value>) -> Result<Self> {
        let element_tag = match values.first() {
            Some(first) => first.tag(),
            None => Tag::End,
        };
        for value in &values {
            if value.tag() != element_tag {
                return Err(Error::bespoke(format!(
                    "list elements must all be {}, found {}",
                    element_tag,
                    value.tag()
                )));
            }
        }
        Ok(List {
            element_tag,
            values,
        })
    }

    pub(crate) fn from_parts(element_tag: Tag, values: Vec<Value>) -> Self {
        if values.is_empty() {
            List::new()
        } else {
            List {
                element_tag,
                values,
            }
        }
    }

    pub fn element_tag(&self) -> Tag {
        self.element_tag
    }
}

impl std::ops::Deref for List {
    type Target = [Value];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// The root of an NBT document: a value plus the name the dialect stores for
/// it. Dialects without a named root use the empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTag {
    pub name: String,
    pub value: Value,
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Byte(v) => serializer.serialize_i8(*v),
            Value::Short(v) => serializer.serialize_i16(*v),
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::Long(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::ByteArray(v) => v.serialize(serializer),
            Value::String(v) => serializer.serialize_str(v),
            Value::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for value in list {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Value::Compound(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    m.serialize_entry(key, value)?;
                }
                m.end()
            }
            Value::IntArray(v) => v.serialize(serializer),
            Value::LongArray(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a valid NBT value")
            }

            fn visit_bool<E>(self, v: bool) -> std::result::Result<Self::Value, E> {
                Ok(Value::Byte(v as i8))
            }

            fn visit_i8<E>(self, v: i8) -> std::result::Result<Self::Value, E> {
                Ok(Value::Byte(v))
            }

            fn visit_i16<E>(self, v: i16) -> std::result::Result<Self::Value, E> {
                Ok(Value::Short(v))
            }

            fn visit_i32<E>(self, v: i32) -> std::result::Result<Self::Value, E> {
                Ok(Value::Int(v))
            }

            fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E> {
                Ok(Value::Long(v))
            }

            fn visit_f32<E>(self, v: f32) -> std::result::Result<Self::Value, E> {
                Ok(Value::Float(v))
            }

            fn visit_f64<E>(self, v: f64) -> std::result::Result<Self::Value, E> {
                Ok(Value::Double(v))
            }

            fn visit_str<E: serde::de::Error>(
                self,
                v: &str,
            ) -> std::result::Result<Self::Value, E> {
                Ok(Value::String(v.to_owned()))
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E> {
                Ok(Value::String(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(value) = seq.next_element()? {
                    values.push(value);
                }
                List::try_from_values(values)
                    .map(Value::List)
                    .map_err(serde::de::Error::custom)
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                // Arrays arrive as a single-entry map keyed by a hidden
                // token; everything else is a real compound.
                let first: Option<String> = map.next_key()?;
                match first.as_deref() {
                    Some(BYTE_ARRAY_TOKEN) => {
                        Ok(Value::ByteArray(ByteArray::new(map.next_value()?)))
                    }
                    Some(INT_ARRAY_TOKEN) => Ok(Value::IntArray(IntArray::new(map.next_value()?))),
                    Some(LONG_ARRAY_TOKEN) => {
                        Ok(Value::LongArray(LongArray::new(map.next_value()?)))
                    }
                    _ => {
                        let mut compound = Compound::new();
                        if let Some(key) = first {
                            compound.insert(key, map.next_value()?);
                            while let Some((key, value)) = map.next_entry()? {
                                compound.insert(key, value);
                            }
                        }
                        Ok(Value::Compound(compound))
                    }
                }
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
