//! The NBT array types: `ByteArray`, `IntArray` and `LongArray`.
//!
//! NBT distinguishes arrays of fixed-width integers from lists. A `Vec<i32>`
//! serializes as a *list* of ints; only these wrapper types produce the
//! dedicated array tags. Their serde impls route through hidden token names
//! so the structural engine can tell them apart from ordinary sequences, and
//! foreign formats like JSON still see plain data.

use std::fmt;
use std::ops::Deref;

use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{BYTE_ARRAY_TOKEN, INT_ARRAY_TOKEN, LONG_ARRAY_TOKEN};

macro_rules! array_type {
    ($name:ident, $elem:ty, $token:expr, $expecting:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            data: Vec<$elem>,
        }

        impl $name {
            pub fn new(data: Vec<$elem>) -> Self {
                Self { data }
            }

            pub fn into_inner(self) -> Vec<$elem> {
                self.data
            }
        }

        impl Deref for $name {
            type Target = [$elem];

            fn deref(&self) -> &Self::Target {
                &self.data
            }
        }

        impl From<Vec<$elem>> for $name {
            fn from(data: Vec<$elem>) -> Self {
                Self::new(data)
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a $elem;
            type IntoIter = std::slice::Iter<'a, $elem>;

            fn into_iter(self) -> Self::IntoIter {
                self.data.iter()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_newtype_variant($token, 0, $token, &self.data)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct InnerVisitor;

                impl<'de> Visitor<'de> for InnerVisitor {
                    type Value = Vec<$elem>;

                    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        f.write_str($expecting)
                    }

                    // Our own engine feeds the elements directly.
                    fn visit_seq<A: SeqAccess<'de>>(
                        self,
                        mut seq: A,
                    ) -> Result<Self::Value, A::Error> {
                        let mut data = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                        while let Some(el) = seq.next_element()? {
                            data.push(el);
                        }
                        Ok(data)
                    }

                    // Self-describing formats see an actual newtype struct.
                    fn visit_newtype_struct<D: Deserializer<'de>>(
                        self,
                        deserializer: D,
                    ) -> Result<Self::Value, D::Error> {
                        Vec::<$elem>::deserialize(deserializer)
                    }
                }

                let data = deserializer.deserialize_newtype_struct($token, InnerVisitor)?;
                Ok(Self::new(data))
            }
        }
    };
}

array_type!(ByteArray, i8, BYTE_ARRAY_TOKEN, "NBT byte array");
array_type!(IntArray, i32, INT_ARRAY_TOKEN, "NBT int array");
array_type!(LongArray, i64, LONG_ARRAY_TOKEN, "NBT long array");
