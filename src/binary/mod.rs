//! The binary dialects: type byte, optional length-prefixed name, payload.
//!
//! All three binary layouts share this reader/writer pair; the codec type
//! parameter supplies the primitive encodings. Whether roots and compound
//! entries carry names is a per-variant capability, passed in at
//! construction.

pub(crate) mod codec;

use std::io::{Read, Write};
use std::marker::PhantomData;

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::reader::{ArrayInfo, CompoundEntryInfo, ListInfo, NbtReader, RootTagInfo};
use crate::writer::NbtWriter;
use crate::Tag;

use codec::BinaryCodec;

pub(crate) struct BinaryNbtReader<R, C> {
    source: R,
    named_root: bool,
    _codec: PhantomData<C>,
}

impl<R: Read, C: BinaryCodec> BinaryNbtReader<R, C> {
    pub fn new(source: R, named_root: bool) -> Self {
        BinaryNbtReader {
            source,
            named_root,
            _codec: PhantomData,
        }
    }

    fn read_tag(&mut self) -> Result<Tag> {
        let id = self.source.read_u8()?;
        Tag::try_from(id)
    }

    fn read_size(&mut self) -> Result<i32> {
        let size = C::read_size(&mut self.source)?;
        if size < 0 {
            return Err(Error::bespoke(format!("negative collection size: {}", size)));
        }
        Ok(size)
    }
}

/// Binary collections are always sized up front, so the entry accessors are
/// never part of a valid call sequence.
fn sized_entry<T>() -> Result<T> {
    Err(Error::bespoke(
        "entry accessor called on a sized collection".to_string(),
    ))
}

impl<R: Read, C: BinaryCodec> NbtReader for BinaryNbtReader<R, C> {
    fn begin_root_tag(&mut self) -> Result<RootTagInfo> {
        let tag = self.read_tag()?;
        let name = if self.named_root && tag != Tag::End {
            C::read_string(&mut self.source)?
        } else {
            String::new()
        };
        Ok(RootTagInfo { tag, name })
    }

    fn begin_compound(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_compound_entry(&mut self) -> Result<CompoundEntryInfo> {
        let tag = self.read_tag()?;
        if tag == Tag::End {
            Ok(CompoundEntryInfo::end())
        } else {
            let name = C::read_string(&mut self.source)?;
            Ok(CompoundEntryInfo { tag, name })
        }
    }

    fn end_compound(&mut self) -> Result<()> {
        // The end byte was consumed by begin_compound_entry.
        Ok(())
    }

    fn begin_list(&mut self) -> Result<ListInfo> {
        let element_tag = self.read_tag()?;
        let size = self.read_size()?;
        if element_tag == Tag::End && size != 0 {
            return Err(Error::bespoke(format!(
                "unexpected list of type 'end' with nonzero length {}",
                size
            )));
        }
        Ok(ListInfo { element_tag, size })
    }

    fn begin_list_entry(&mut self) -> Result<bool> {
        sized_entry()
    }

    fn end_list(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_byte_array(&mut self) -> Result<ArrayInfo> {
        Ok(ArrayInfo {
            size: self.read_size()?,
        })
    }

    fn begin_byte_array_entry(&mut self) -> Result<bool> {
        sized_entry()
    }

    fn end_byte_array(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_int_array(&mut self) -> Result<ArrayInfo> {
        Ok(ArrayInfo {
            size: self.read_size()?,
        })
    }

    fn begin_int_array_entry(&mut self) -> Result<bool> {
        sized_entry()
    }

    fn end_int_array(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_long_array(&mut self) -> Result<ArrayInfo> {
        Ok(ArrayInfo {
            size: self.read_size()?,
        })
    }

    fn begin_long_array_entry(&mut self) -> Result<bool> {
        sized_entry()
    }

    fn end_long_array(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_byte(&mut self) -> Result<i8> {
        Ok(self.source.read_i8()?)
    }

    fn read_short(&mut self) -> Result<i16> {
        C::read_i16(&mut self.source)
    }

    fn read_int(&mut self) -> Result<i32> {
        C::read_i32(&mut self.source)
    }

    fn read_long(&mut self) -> Result<i64> {
        C::read_i64(&mut self.source)
    }

    fn read_float(&mut self) -> Result<f32> {
        C::read_f32(&mut self.source)
    }

    fn read_double(&mut self) -> Result<f64> {
        C::read_f64(&mut self.source)
    }

    fn read_string(&mut self) -> Result<String> {
        C::read_string(&mut self.source)
    }
}

pub(crate) struct BinaryNbtWriter<W, C> {
    sink: W,
    named_root: bool,
    _codec: PhantomData<C>,
}

impl<W: Write, C: BinaryCodec> BinaryNbtWriter<W, C> {
    pub fn new(sink: W, named_root: bool) -> Self {
        BinaryNbtWriter {
            sink,
            named_root,
            _codec: PhantomData,
        }
    }

    fn write_tag(&mut self, tag: Tag) -> Result<()> {
        Ok(self.sink.write_u8(tag as u8)?)
    }
}

impl<W: Write, C: BinaryCodec> NbtWriter for BinaryNbtWriter<W, C> {
    fn begin_root_tag(&mut self, tag: Tag, name: &str) -> Result<()> {
        self.write_tag(tag)?;
        if self.named_root {
            C::write_string(&mut self.sink, name)?;
        }
        Ok(())
    }

    fn begin_compound(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_compound_entry(&mut self, tag: Tag, name: &str) -> Result<()> {
        self.write_tag(tag)?;
        C::write_string(&mut self.sink, name)
    }

    fn end_compound(&mut self) -> Result<()> {
        self.write_tag(Tag::End)
    }

    fn begin_list(&mut self, element_tag: Tag, size: i32) -> Result<()> {
        if size < 0 {
            return Err(Error::bespoke(
                "binary lists require a known size".to_string(),
            ));
        }
        self.write_tag(element_tag)?;
        C::write_size(&mut self.sink, size)
    }

    fn begin_list_entry(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_list(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_byte_array(&mut self, size: i32) -> Result<()> {
        C::write_size(&mut self.sink, size)
    }

    fn begin_byte_array_entry(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_byte_array(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_int_array(&mut self, size: i32) -> Result<()> {
        C::write_size(&mut self.sink, size)
    }

    fn begin_int_array_entry(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_int_array(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_long_array(&mut self, size: i32) -> Result<()> {
        C::write_size(&mut self.sink, size)
    }

    fn begin_long_array_entry(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_long_array(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_byte(&mut self, value: i8) -> Result<()> {
        Ok(self.sink.write_i8(value)?)
    }

    fn write_short(&mut self, value: i16) -> Result<()> {
        C::write_i16(&mut self.sink, value)
    }

    fn write_int(&mut self, value: i32) -> Result<()> {
        C::write_i32(&mut self.sink, value)
    }

    fn write_long(&mut self, value: i64) -> Result<()> {
        C::write_i64(&mut self.sink, value)
    }

    fn write_float(&mut self, value: f32) -> Result<()> {
        C::write_f32(&mut self.sink, value)
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        C::write_f64(&mut self.sink, value)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        C::write_string(&mut self.sink, value)
    }
}
