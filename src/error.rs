//! Contains the Error and Result type used by the codec.
use std::fmt::Display;

/// Errors that can occur while encoding or decoding NBT data.
///
/// Every failure carries a human readable message, and decoding failures
/// additionally carry the structural path (field/index chain) at which they
/// occurred when the engine knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    msg: String,
    path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorKind {
    Decoding,
    CompressionDetection,
    Unsupported,
}

/// Convenience type for Result.
pub type Result<T> = std::result::Result<T, Error>;

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} (at {})", self.msg, path),
            None => f.write_str(&self.msg),
        }
    }
}

impl serde::de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::bespoke(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::bespoke(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::unexpected_eof()
        } else {
            Error::bespoke(format!("io error: {}", e))
        }
    }
}

impl Error {
    fn new(kind: ErrorKind, msg: String) -> Error {
        Error {
            kind,
            msg,
            path: None,
        }
    }

    /// True for failures to classify a stream's compression envelope.
    pub fn is_compression_detection(&self) -> bool {
        self.kind == ErrorKind::CompressionDetection
    }

    /// True when a requested feature is deliberately not supported by the
    /// NBT format, as opposed to the input being malformed.
    pub fn is_unsupported(&self) -> bool {
        self.kind == ErrorKind::Unsupported
    }

    /// Attach a structural path unless a deeper frame already did.
    pub(crate) fn at(mut self, path: Option<String>) -> Error {
        if self.path.is_none() {
            self.path = path;
        }
        self
    }

    pub(crate) fn bespoke(msg: String) -> Error {
        Error::new(ErrorKind::Decoding, msg)
    }

    pub(crate) fn invalid_tag(tag: u8) -> Error {
        Error::new(ErrorKind::Decoding, format!("invalid nbt tag value: {}", tag))
    }

    pub(crate) fn unexpected_eof() -> Error {
        Error::new(
            ErrorKind::Decoding,
            "eof: unexpectedly ran out of input".to_owned(),
        )
    }

    pub(crate) fn nonunicode_string(data: &[u8]) -> Error {
        Error::new(
            ErrorKind::Decoding,
            format!(
                "invalid nbt string: nonunicode: {}",
                String::from_utf8_lossy(data)
            ),
        )
    }

    pub(crate) fn unknown_compression(byte: u8) -> Error {
        Error::new(
            ErrorKind::CompressionDetection,
            format!(
                "unable to detect compression, unexpected first byte: 0x{:02X}",
                byte
            ),
        )
    }

    pub(crate) fn mismatched_compression(
        configured: crate::Compression,
        detected: crate::Compression,
    ) -> Error {
        Error::new(
            ErrorKind::Decoding,
            format!(
                "expected {} compression, but detected {}",
                configured, detected
            ),
        )
    }

    pub(crate) fn root_name_mismatch(expected: &str, actual: &str) -> Error {
        Error::new(
            ErrorKind::Decoding,
            format!(
                "encountered root NBT name '{}', but expected '{}'",
                actual, expected
            ),
        )
    }

    pub(crate) fn unknown_key(name: &str, discarded_type: &str) -> Error {
        Error::new(
            ErrorKind::Decoding,
            format!("encountered unknown key '{}' ({})", name, discarded_type),
        )
    }

    pub(crate) fn mismatched_tag(expected: crate::Tag, actual: crate::Tag) -> Error {
        Error::new(
            ErrorKind::Decoding,
            format!("expected {}, but was {}", expected, actual),
        )
    }

    pub(crate) fn array_as_seq() -> Error {
        Error::new(
            ErrorKind::Decoding,
            "expected NBT Array, found seq: use ByteArray, IntArray or LongArray types".into(),
        )
    }

    pub(crate) fn array_as_other() -> Error {
        Error::new(
            ErrorKind::Decoding,
            "nbt arrays only serialize from sequences of their element type".into(),
        )
    }

    pub(crate) fn input_not_consumed() -> Error {
        Error::new(ErrorKind::Decoding, "input wasn't fully consumed".into())
    }

    pub(crate) fn unsupported(msg: String) -> Error {
        Error::new(ErrorKind::Unsupported, msg)
    }
}
