//! polynbt is a serde codec for Minecraft's NBT format in every dialect the
//! game speaks: Java edition files (big-endian), Bedrock edition files
//! (little-endian), both network framings, and the stringified text form
//! (SNBT).
//!
//! Pick a [`Variant`], build an [`Nbt`] handle, and decode into your own
//! types with serde derive, or into [`Value`] when the shape isn't known
//! ahead of time. Gzip and zlib envelopes are detected from the first byte
//! of the stream.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Player {
//!     name: String,
//!     health: f32,
//! }
//!
//! let player = Player {
//!     name: "alice".to_string(),
//!     health: 20.0,
//! };
//!
//! let bytes = polynbt::to_bytes(&player)?;
//! let back: Player = polynbt::from_bytes(&bytes)?;
//! assert_eq!(player, back);
//! # Ok::<(), polynbt::error::Error>(())
//! ```
//!
//! The same types round-trip through SNBT:
//!
//! ```
//! let value: polynbt::Value = polynbt::from_str("{x: 1, y: 2s, tags: [a, b]}")?;
//! let text = polynbt::to_string(&value)?;
//! assert_eq!(text, r#"{x:1,y:2s,tags:["a","b"]}"#);
//! # Ok::<(), polynbt::error::Error>(())
//! ```
//!
//! NBT's dedicated integer-array tags decode only into the [`ByteArray`],
//! [`IntArray`] and [`LongArray`] wrapper types; lists decode into `Vec`s.

pub mod de;
pub mod error;
pub mod ser;

mod arrays;
mod binary;
mod compression;
mod reader;
mod snbt;
mod value;
mod writer;

#[cfg(test)]
mod test;

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use arrays::{ByteArray, IntArray, LongArray};
pub use compression::Compression;
pub use reader::{
    ArrayInfo, CompoundEntryInfo, ListInfo, NbtReader, RootTagInfo, UNKNOWN_SIZE,
};
pub use value::{Compound, List, NamedTag, Value};
pub use writer::NbtWriter;

use binary::codec::{BedrockCodec, BedrockNetworkCodec, JavaCodec};
use binary::{BinaryNbtReader, BinaryNbtWriter};
use compression::PeekReader;
use de::EngineConfig;
use error::{Error, Result};
use snbt::{SnbtReader, SnbtWriter};

pub(crate) const BYTE_ARRAY_TOKEN: &str = "__polynbt_byte_array";
pub(crate) const INT_ARRAY_TOKEN: &str = "__polynbt_int_array";
pub(crate) const LONG_ARRAY_TOKEN: &str = "__polynbt_long_array";

/// An NBT tag type id. This carries neither the value nor the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Tag {
    /// Terminates a compound, and marks the element type of empty lists.
    #[default]
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

// A derive crate could generate this, but the tag set essentially never
// changes and writing it out keeps the dependency tree small.
impl TryFrom<u8> for Tag {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        use Tag::*;
        Ok(match value {
            0 => End,
            1 => Byte,
            2 => Short,
            3 => Int,
            4 => Long,
            5 => Float,
            6 => Double,
            7 => ByteArray,
            8 => String,
            9 => List,
            10 => Compound,
            11 => IntArray,
            12 => LongArray,
            _ => return Err(Error::invalid_tag(value)),
        })
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> u8 {
        tag as u8
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Tag::End => "End",
            Tag::Byte => "Byte",
            Tag::Short => "Short",
            Tag::Int => "Int",
            Tag::Long => "Long",
            Tag::Float => "Float",
            Tag::Double => "Double",
            Tag::ByteArray => "ByteArray",
            Tag::String => "String",
            Tag::List => "List",
            Tag::Compound => "Compound",
            Tag::IntArray => "IntArray",
            Tag::LongArray => "LongArray",
        })
    }
}

/// Which binary NBT layout a stream uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Java edition files: big-endian, named root.
    Java,
    /// Java edition over the network. From protocol version 764 (1.20.2)
    /// the root tag carries no name.
    JavaNetwork { protocol_version: u32 },
    /// Bedrock edition files: little-endian, named root.
    Bedrock,
    /// Bedrock edition over the network: little-endian with varint ints,
    /// longs, sizes and string lengths.
    BedrockNetwork,
}

/// The two axes on which the binary dialects actually differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether the root tag (and so the document) carries a name.
    pub named_root: bool,
    pub integer_encoding: IntegerEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerEncoding {
    FixedBigEndian,
    FixedLittleEndian,
    VarInt,
}

impl Variant {
    pub fn capabilities(self) -> Capabilities {
        match self {
            Variant::Java => Capabilities {
                named_root: true,
                integer_encoding: IntegerEncoding::FixedBigEndian,
            },
            Variant::JavaNetwork { protocol_version } => Capabilities {
                named_root: protocol_version < 764,
                integer_encoding: IntegerEncoding::FixedBigEndian,
            },
            Variant::Bedrock => Capabilities {
                named_root: true,
                integer_encoding: IntegerEncoding::FixedLittleEndian,
            },
            Variant::BedrockNetwork => Capabilities {
                named_root: true,
                integer_encoding: IntegerEncoding::VarInt,
            },
        }
    }
}

/// A configured binary NBT format: variant, compression, and engine policy.
///
/// ```
/// use polynbt::{Nbt, Variant, Compression};
///
/// let format = Nbt::new(Variant::Bedrock).compression(Compression::Gzip);
/// ```
#[derive(Debug, Clone)]
pub struct Nbt {
    variant: Variant,
    compression: Compression,
    compression_level: Option<u32>,
    root_name: Option<String>,
    lenient_root_names: bool,
    ignore_unknown_keys: bool,
}

impl Default for Nbt {
    fn default() -> Self {
        Nbt::new(Variant::Java)
    }
}

impl Nbt {
    pub fn new(variant: Variant) -> Self {
        Nbt {
            variant,
            compression: Compression::None,
            compression_level: None,
            root_name: None,
            lenient_root_names: false,
            ignore_unknown_keys: false,
        }
    }

    /// The compression this format reads and writes. Decoding fails if the
    /// stream's detected compression differs.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Deflate level 0..=9. Encoder default when unset.
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// The root name to write, and to require when decoding (for variants
    /// with named roots). Unset means write an empty name and accept any.
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = Some(name.into());
        self
    }

    /// Accept any root name when decoding, even if one is configured.
    pub fn lenient_root_names(mut self, lenient: bool) -> Self {
        self.lenient_root_names = lenient;
        self
    }

    /// Discard compound keys the target struct doesn't declare instead of
    /// failing.
    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.ignore_unknown_keys = ignore;
        self
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            named_root: self.variant.capabilities().named_root,
            root_name: self.root_name.clone(),
            lenient_root_names: self.lenient_root_names,
            ignore_unknown_keys: self.ignore_unknown_keys,
            human_readable: false,
        }
    }

    /// Deserialize a `T` from a reader of binary NBT.
    pub fn from_reader<T, R>(&self, source: R) -> Result<T>
    where
        T: DeserializeOwned,
        R: Read,
    {
        let mut source = PeekReader::new(source);
        let detected = Compression::detect(source.peek()?)?;
        if detected != self.compression {
            return Err(Error::mismatched_compression(self.compression, detected));
        }
        let source = detected.decompress(source);
        let caps = self.variant.capabilities();
        match caps.integer_encoding {
            IntegerEncoding::FixedBigEndian => {
                self.decode(BinaryNbtReader::<_, JavaCodec>::new(source, caps.named_root))
            }
            IntegerEncoding::FixedLittleEndian => self.decode(
                BinaryNbtReader::<_, BedrockCodec>::new(source, caps.named_root),
            ),
            IntegerEncoding::VarInt => self.decode(BinaryNbtReader::<_, BedrockNetworkCodec>::new(
                source,
                caps.named_root,
            )),
        }
    }

    /// Deserialize a `T` from a slice of binary NBT.
    pub fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        self.from_reader(bytes)
    }

    /// Serialize a `T` as binary NBT into a writer.
    pub fn to_writer<T, W>(&self, sink: W, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        W: Write,
    {
        let mut sink = self.compression.compress(sink, self.compression_level);
        self.encode(&mut sink, value)?;
        sink.finish()
    }

    /// Serialize a `T` as binary NBT.
    pub fn to_bytes<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.to_writer(&mut bytes, value)?;
        Ok(bytes)
    }

    /// Decode the document as an owned [`Value`] tree with its root name.
    pub fn value_from_reader(&self, source: impl Read) -> Result<NamedTag> {
        let mut source = PeekReader::new(source);
        let detected = Compression::detect(source.peek()?)?;
        if detected != self.compression {
            return Err(Error::mismatched_compression(self.compression, detected));
        }
        let source = detected.decompress(source);
        let caps = self.variant.capabilities();
        match caps.integer_encoding {
            IntegerEncoding::FixedBigEndian => {
                self.read_named(BinaryNbtReader::<_, JavaCodec>::new(source, caps.named_root))
            }
            IntegerEncoding::FixedLittleEndian => self.read_named(
                BinaryNbtReader::<_, BedrockCodec>::new(source, caps.named_root),
            ),
            IntegerEncoding::VarInt => self.read_named(
                BinaryNbtReader::<_, BedrockNetworkCodec>::new(source, caps.named_root),
            ),
        }
    }

    /// Decode the document as an owned [`Value`] tree with its root name.
    pub fn value_from_bytes(&self, bytes: &[u8]) -> Result<NamedTag> {
        self.value_from_reader(bytes)
    }

    /// Encode a [`Value`] tree, rooted under the name in `tag`.
    pub fn value_to_writer(&self, sink: impl Write, tag: &NamedTag) -> Result<()> {
        let mut sink = self.compression.compress(sink, self.compression_level);
        let caps = self.variant.capabilities();
        match caps.integer_encoding {
            IntegerEncoding::FixedBigEndian => write_named(
                BinaryNbtWriter::<_, JavaCodec>::new(&mut sink, caps.named_root),
                tag,
            )?,
            IntegerEncoding::FixedLittleEndian => write_named(
                BinaryNbtWriter::<_, BedrockCodec>::new(&mut sink, caps.named_root),
                tag,
            )?,
            IntegerEncoding::VarInt => write_named(
                BinaryNbtWriter::<_, BedrockNetworkCodec>::new(&mut sink, caps.named_root),
                tag,
            )?,
        }
        sink.finish()
    }

    /// Encode a [`Value`] tree, rooted under the name in `tag`.
    pub fn value_to_bytes(&self, tag: &NamedTag) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.value_to_writer(&mut bytes, tag)?;
        Ok(bytes)
    }

    fn decode<T, R>(&self, reader: R) -> Result<T>
    where
        T: DeserializeOwned,
        R: NbtReader,
    {
        let mut de = de::Deserializer::new(reader, self.engine_config())?;
        T::deserialize(&mut de)
    }

    fn read_named<R: NbtReader>(&self, mut reader: R) -> Result<NamedTag> {
        let caps = self.variant.capabilities();
        let root = reader.begin_root_tag()?;
        if caps.named_root && !self.lenient_root_names {
            if let Some(expected) = &self.root_name {
                if expected != &root.name {
                    return Err(Error::root_name_mismatch(expected, &root.name));
                }
            }
        }
        let value = reader.read_value(root.tag)?;
        Ok(NamedTag {
            name: root.name,
            value,
        })
    }

    fn encode<T, W>(&self, sink: W, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        W: Write,
    {
        let caps = self.variant.capabilities();
        let root_name = self.root_name.clone().unwrap_or_default();
        match caps.integer_encoding {
            IntegerEncoding::FixedBigEndian => {
                let writer = BinaryNbtWriter::<_, JavaCodec>::new(sink, caps.named_root);
                let mut ser = ser::Serializer::new(writer, root_name);
                value.serialize(&mut ser)
            }
            IntegerEncoding::FixedLittleEndian => {
                let writer = BinaryNbtWriter::<_, BedrockCodec>::new(sink, caps.named_root);
                let mut ser = ser::Serializer::new(writer, root_name);
                value.serialize(&mut ser)
            }
            IntegerEncoding::VarInt => {
                let writer = BinaryNbtWriter::<_, BedrockNetworkCodec>::new(sink, caps.named_root);
                let mut ser = ser::Serializer::new(writer, root_name);
                value.serialize(&mut ser)
            }
        }
    }
}

fn write_named<W: NbtWriter>(mut writer: W, tag: &NamedTag) -> Result<()> {
    writer.begin_root_tag(tag.value.tag(), &tag.name)?;
    writer.write_value(&tag.value)
}

/// The stringified text format.
#[derive(Debug, Clone, Default)]
pub struct Snbt {
    ignore_unknown_keys: bool,
}

impl Snbt {
    pub fn new() -> Self {
        Snbt::default()
    }

    /// Discard compound keys the target struct doesn't declare instead of
    /// failing.
    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.ignore_unknown_keys = ignore;
        self
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            named_root: false,
            root_name: None,
            lenient_root_names: false,
            ignore_unknown_keys: self.ignore_unknown_keys,
            human_readable: true,
        }
    }

    /// Deserialize a `T` from SNBT text. The whole input must be consumed.
    pub fn from_str<T: DeserializeOwned>(&self, input: &str) -> Result<T> {
        let reader = SnbtReader::new(input);
        let mut de = de::Deserializer::new(reader, self.engine_config())?;
        let value = T::deserialize(&mut de)?;
        de.into_reader().finish()?;
        Ok(value)
    }

    /// Serialize a `T` as compact SNBT.
    pub fn to_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let mut out = Vec::new();
        let writer = SnbtWriter::new(&mut out);
        let mut ser = ser::Serializer::new(writer, String::new());
        value.serialize(&mut ser)?;
        String::from_utf8(out).map_err(|_| Error::bespoke("snbt output was not utf-8".to_string()))
    }

    /// Parse SNBT text into an owned [`Value`] tree.
    pub fn value_from_str(&self, input: &str) -> Result<Value> {
        let mut reader = SnbtReader::new(input);
        let root = reader.begin_root_tag()?;
        let value = reader.read_value(root.tag)?;
        reader.finish()?;
        Ok(value)
    }

    /// Render a [`Value`] tree as compact SNBT.
    pub fn value_to_string(&self, value: &Value) -> Result<String> {
        let mut out = Vec::new();
        let mut writer = SnbtWriter::new(&mut out);
        writer.write_value(value)?;
        String::from_utf8(out).map_err(|_| Error::bespoke("snbt output was not utf-8".to_string()))
    }
}

/// Deserialize a `T` from uncompressed Java edition NBT.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Nbt::new(Variant::Java).from_bytes(bytes)
}

/// Deserialize a `T` from a reader of uncompressed Java edition NBT.
pub fn from_reader<T: DeserializeOwned>(source: impl Read) -> Result<T> {
    Nbt::new(Variant::Java).from_reader(source)
}

/// Serialize a `T` as uncompressed Java edition NBT.
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Nbt::new(Variant::Java).to_bytes(value)
}

/// Serialize a `T` as uncompressed Java edition NBT into a writer.
pub fn to_writer<T: Serialize + ?Sized>(sink: impl Write, value: &T) -> Result<()> {
    Nbt::new(Variant::Java).to_writer(sink, value)
}

/// Deserialize a `T` from SNBT text.
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    Snbt::new().from_str(input)
}

/// Serialize a `T` as compact SNBT.
pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Snbt::new().to_string(value)
}
