//! Per-dialect primitive encodings.
//!
//! The three binary dialects share one reader/writer; everything that
//! actually differs between them lives behind [`BinaryCodec`]: byte order,
//! varint vs fixed integers, string transcoding and length prefixes.

use std::io::{Read, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

pub(crate) trait BinaryCodec {
    fn read_i16(source: &mut impl Read) -> Result<i16>;
    fn read_i32(source: &mut impl Read) -> Result<i32>;
    fn read_i64(source: &mut impl Read) -> Result<i64>;
    fn read_f32(source: &mut impl Read) -> Result<f32>;
    fn read_f64(source: &mut impl Read) -> Result<f64>;
    /// List and array element counts.
    fn read_size(source: &mut impl Read) -> Result<i32>;
    fn read_string(source: &mut impl Read) -> Result<String>;

    fn write_i16(sink: &mut impl Write, value: i16) -> Result<()>;
    fn write_i32(sink: &mut impl Write, value: i32) -> Result<()>;
    fn write_i64(sink: &mut impl Write, value: i64) -> Result<()>;
    fn write_f32(sink: &mut impl Write, value: f32) -> Result<()>;
    fn write_f64(sink: &mut impl Write, value: f64) -> Result<()>;
    fn write_size(sink: &mut impl Write, value: i32) -> Result<()>;
    fn write_string(sink: &mut impl Write, value: &str) -> Result<()>;
}

/// Java edition: fixed big-endian, strings in Java's modified UTF-8 with a
/// u16 length prefix.
pub(crate) struct JavaCodec;

impl BinaryCodec for JavaCodec {
    fn read_i16(source: &mut impl Read) -> Result<i16> {
        Ok(source.read_i16::<BigEndian>()?)
    }

    fn read_i32(source: &mut impl Read) -> Result<i32> {
        Ok(source.read_i32::<BigEndian>()?)
    }

    fn read_i64(source: &mut impl Read) -> Result<i64> {
        Ok(source.read_i64::<BigEndian>()?)
    }

    fn read_f32(source: &mut impl Read) -> Result<f32> {
        Ok(source.read_f32::<BigEndian>()?)
    }

    fn read_f64(source: &mut impl Read) -> Result<f64> {
        Ok(source.read_f64::<BigEndian>()?)
    }

    fn read_size(source: &mut impl Read) -> Result<i32> {
        Ok(source.read_i32::<BigEndian>()?)
    }

    fn read_string(source: &mut impl Read) -> Result<String> {
        let len = source.read_u16::<BigEndian>()? as usize;
        let mut data = vec![0u8; len];
        source.read_exact(&mut data)?;
        Ok(cesu8::from_java_cesu8(&data)
            .map_err(|_| Error::nonunicode_string(&data))?
            .into_owned())
    }

    fn write_i16(sink: &mut impl Write, value: i16) -> Result<()> {
        Ok(sink.write_i16::<BigEndian>(value)?)
    }

    fn write_i32(sink: &mut impl Write, value: i32) -> Result<()> {
        Ok(sink.write_i32::<BigEndian>(value)?)
    }

    fn write_i64(sink: &mut impl Write, value: i64) -> Result<()> {
        Ok(sink.write_i64::<BigEndian>(value)?)
    }

    fn write_f32(sink: &mut impl Write, value: f32) -> Result<()> {
        Ok(sink.write_f32::<BigEndian>(value)?)
    }

    fn write_f64(sink: &mut impl Write, value: f64) -> Result<()> {
        Ok(sink.write_f64::<BigEndian>(value)?)
    }

    fn write_size(sink: &mut impl Write, value: i32) -> Result<()> {
        Ok(sink.write_i32::<BigEndian>(value)?)
    }

    fn write_string(sink: &mut impl Write, value: &str) -> Result<()> {
        let data = cesu8::to_java_cesu8(value);
        sink.write_u16::<BigEndian>(u16_len(data.len())?)?;
        Ok(sink.write_all(&data)?)
    }
}

/// Bedrock edition files: fixed little-endian, plain UTF-8 strings with a
/// u16 length prefix.
pub(crate) struct BedrockCodec;

impl BinaryCodec for BedrockCodec {
    fn read_i16(source: &mut impl Read) -> Result<i16> {
        Ok(source.read_i16::<LittleEndian>()?)
    }

    fn read_i32(source: &mut impl Read) -> Result<i32> {
        Ok(source.read_i32::<LittleEndian>()?)
    }

    fn read_i64(source: &mut impl Read) -> Result<i64> {
        Ok(source.read_i64::<LittleEndian>()?)
    }

    fn read_f32(source: &mut impl Read) -> Result<f32> {
        Ok(source.read_f32::<LittleEndian>()?)
    }

    fn read_f64(source: &mut impl Read) -> Result<f64> {
        Ok(source.read_f64::<LittleEndian>()?)
    }

    fn read_size(source: &mut impl Read) -> Result<i32> {
        Ok(source.read_i32::<LittleEndian>()?)
    }

    fn read_string(source: &mut impl Read) -> Result<String> {
        let len = source.read_u16::<LittleEndian>()? as usize;
        read_utf8(source, len)
    }

    fn write_i16(sink: &mut impl Write, value: i16) -> Result<()> {
        Ok(sink.write_i16::<LittleEndian>(value)?)
    }

    fn write_i32(sink: &mut impl Write, value: i32) -> Result<()> {
        Ok(sink.write_i32::<LittleEndian>(value)?)
    }

    fn write_i64(sink: &mut impl Write, value: i64) -> Result<()> {
        Ok(sink.write_i64::<LittleEndian>(value)?)
    }

    fn write_f32(sink: &mut impl Write, value: f32) -> Result<()> {
        Ok(sink.write_f32::<LittleEndian>(value)?)
    }

    fn write_f64(sink: &mut impl Write, value: f64) -> Result<()> {
        Ok(sink.write_f64::<LittleEndian>(value)?)
    }

    fn write_size(sink: &mut impl Write, value: i32) -> Result<()> {
        Ok(sink.write_i32::<LittleEndian>(value)?)
    }

    fn write_string(sink: &mut impl Write, value: &str) -> Result<()> {
        sink.write_u16::<LittleEndian>(u16_len(value.len())?)?;
        Ok(sink.write_all(value.as_bytes())?)
    }
}

/// Bedrock over the network: Int, Long and sizes are zigzag varints, string
/// lengths are unsigned varints, Short/Float/Double stay fixed
/// little-endian.
pub(crate) struct BedrockNetworkCodec;

impl BinaryCodec for BedrockNetworkCodec {
    fn read_i16(source: &mut impl Read) -> Result<i16> {
        Ok(source.read_i16::<LittleEndian>()?)
    }

    fn read_i32(source: &mut impl Read) -> Result<i32> {
        let raw = read_varu32(source)?;
        Ok(zigzag_decode32(raw))
    }

    fn read_i64(source: &mut impl Read) -> Result<i64> {
        let raw = read_varu64(source)?;
        Ok(zigzag_decode64(raw))
    }

    fn read_f32(source: &mut impl Read) -> Result<f32> {
        Ok(source.read_f32::<LittleEndian>()?)
    }

    fn read_f64(source: &mut impl Read) -> Result<f64> {
        Ok(source.read_f64::<LittleEndian>()?)
    }

    fn read_size(source: &mut impl Read) -> Result<i32> {
        Self::read_i32(source)
    }

    fn read_string(source: &mut impl Read) -> Result<String> {
        let len = read_varu32(source)? as usize;
        read_utf8(source, len)
    }

    fn write_i16(sink: &mut impl Write, value: i16) -> Result<()> {
        Ok(sink.write_i16::<LittleEndian>(value)?)
    }

    fn write_i32(sink: &mut impl Write, value: i32) -> Result<()> {
        write_varu32(sink, zigzag_encode32(value))
    }

    fn write_i64(sink: &mut impl Write, value: i64) -> Result<()> {
        write_varu64(sink, zigzag_encode64(value))
    }

    fn write_f32(sink: &mut impl Write, value: f32) -> Result<()> {
        Ok(sink.write_f32::<LittleEndian>(value)?)
    }

    fn write_f64(sink: &mut impl Write, value: f64) -> Result<()> {
        Ok(sink.write_f64::<LittleEndian>(value)?)
    }

    fn write_size(sink: &mut impl Write, value: i32) -> Result<()> {
        Self::write_i32(sink, value)
    }

    fn write_string(sink: &mut impl Write, value: &str) -> Result<()> {
        if value.len() > u32::MAX as usize {
            return Err(Error::bespoke("string too long for nbt".to_string()));
        }
        write_varu32(sink, value.len() as u32)?;
        Ok(sink.write_all(value.as_bytes())?)
    }
}

fn read_utf8(source: &mut impl Read, len: usize) -> Result<String> {
    let mut data = vec![0u8; len];
    source.read_exact(&mut data)?;
    String::from_utf8(data).map_err(|e| Error::nonunicode_string(e.as_bytes()))
}

fn u16_len(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::bespoke("string too long for nbt".to_string()))
}

pub(crate) fn read_varu32(source: &mut impl Read) -> Result<u32> {
    let mut result = 0u32;
    for shift in (0..35).step_by(7) {
        let byte = source.read_u8()?;
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(Error::bespoke("varint32 too long".to_string()))
}

pub(crate) fn read_varu64(source: &mut impl Read) -> Result<u64> {
    let mut result = 0u64;
    for shift in (0..70).step_by(7) {
        let byte = source.read_u8()?;
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(Error::bespoke("varint64 too long".to_string()))
}

pub(crate) fn write_varu32(sink: &mut impl Write, mut value: u32) -> Result<()> {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            sink.write_u8(byte)?;
            return Ok(());
        }
        sink.write_u8(byte | 0x80)?;
    }
}

pub(crate) fn write_varu64(sink: &mut impl Write, mut value: u64) -> Result<()> {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            sink.write_u8(byte)?;
            return Ok(());
        }
        sink.write_u8(byte | 0x80)?;
    }
}

pub(crate) fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

pub(crate) fn zigzag_decode32(raw: u32) -> i32 {
    ((raw >> 1) as i32) ^ -((raw & 1) as i32)
}

pub(crate) fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub(crate) fn zigzag_decode64(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}
