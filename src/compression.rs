//! Compression envelopes around binary NBT payloads.
//!
//! Files in the wild come uncompressed, gzipped, or zlib-deflated, and the
//! three are distinguishable from the first byte alone: an uncompressed
//! payload starts with a tag type id (0..=12), gzip with `0x1F`, zlib with
//! `0x78`.

use std::fmt::Display;
use std::io::{Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

use crate::error::{Error, Result};

/// The compression applied to a binary NBT payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zlib,
}

impl Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Compression::None => "None",
            Compression::Gzip => "Gzip",
            Compression::Zlib => "Zlib",
        })
    }
}

impl Compression {
    /// Classify a payload by its first byte without consuming it.
    ///
    /// Uncompressed data starts with a tag type id, gzip with the `0x1F8B`
    /// magic, zlib with a `0x78` CMF byte. Anything else is an error naming
    /// the byte.
    pub fn detect(first_byte: u8) -> Result<Compression> {
        match first_byte {
            0..=12 => Ok(Compression::None),
            0x1F => Ok(Compression::Gzip),
            0x78 => Ok(Compression::Zlib),
            other => Err(Error::unknown_compression(other)),
        }
    }

    pub(crate) fn decompress<R: Read>(self, source: R) -> CompressedReader<R> {
        match self {
            Compression::None => CompressedReader::Plain(source),
            Compression::Gzip => CompressedReader::Gzip(GzDecoder::new(source)),
            Compression::Zlib => CompressedReader::Zlib(ZlibDecoder::new(source)),
        }
    }

    pub(crate) fn compress<W: Write>(self, sink: W, level: Option<u32>) -> CompressedWriter<W> {
        let level = level
            .map(flate2::Compression::new)
            .unwrap_or_else(flate2::Compression::default);
        match self {
            Compression::None => CompressedWriter::Plain(sink),
            Compression::Gzip => CompressedWriter::Gzip(GzEncoder::new(sink, level)),
            Compression::Zlib => CompressedWriter::Zlib(ZlibEncoder::new(sink, level)),
        }
    }
}

/// One byte of lookahead over a `Read`, so compression detection can see the
/// first byte and still hand it to the inflate filter.
pub(crate) struct PeekReader<R> {
    inner: R,
    peeked: Option<u8>,
}

impl<R: Read> PeekReader<R> {
    pub fn new(inner: R) -> Self {
        PeekReader {
            inner,
            peeked: None,
        }
    }

    pub fn peek(&mut self) -> Result<u8> {
        if let Some(b) = self.peeked {
            return Ok(b);
        }
        let mut buf = [0u8; 1];
        self.inner
            .read_exact(&mut buf)
            .map_err(|_| Error::unexpected_eof())?;
        self.peeked = Some(buf[0]);
        Ok(buf[0])
    }
}

impl<R: Read> Read for PeekReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            return Ok(1);
        }
        self.inner.read(buf)
    }
}

pub(crate) enum CompressedReader<R: Read> {
    Plain(R),
    Gzip(GzDecoder<R>),
    Zlib(ZlibDecoder<R>),
}

impl<R: Read> Read for CompressedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            CompressedReader::Plain(r) => r.read(buf),
            CompressedReader::Gzip(r) => r.read(buf),
            CompressedReader::Zlib(r) => r.read(buf),
        }
    }
}

pub(crate) enum CompressedWriter<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Zlib(ZlibEncoder<W>),
}

impl<W: Write> CompressedWriter<W> {
    /// Flush the compressor trailer. Must be called once writing is done;
    /// dropping an encoder silently truncates the stream.
    pub fn finish(self) -> Result<()> {
        match self {
            CompressedWriter::Plain(mut w) => w.flush()?,
            CompressedWriter::Gzip(enc) => {
                enc.finish()?;
            }
            CompressedWriter::Zlib(enc) => {
                enc.finish()?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            CompressedWriter::Plain(w) => w.write(buf),
            CompressedWriter::Gzip(w) => w.write(buf),
            CompressedWriter::Zlib(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            CompressedWriter::Plain(w) => w.flush(),
            CompressedWriter::Gzip(w) => w.flush(),
            CompressedWriter::Zlib(w) => w.flush(),
        }
    }
}
