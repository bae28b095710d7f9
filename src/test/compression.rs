use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::{test::builder::Builder, Compression, Nbt, Value, Variant};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct V {
    x: i32,
    name: String,
}

fn sample() -> V {
    V {
        x: 99,
        name: "compressed".to_string(),
    }
}

#[test]
fn every_first_byte_classifies_or_errors() {
    for byte in 0u8..=u8::MAX {
        match Compression::detect(byte) {
            Ok(Compression::None) => assert!(byte <= 12),
            Ok(Compression::Gzip) => assert_eq!(byte, 0x1F),
            Ok(Compression::Zlib) => assert_eq!(byte, 0x78),
            Err(e) => {
                assert!(e.is_compression_detection());
                assert!(e.to_string().contains(&format!("0x{:02X}", byte)));
            }
        }
    }
}

#[test]
fn gzip_round_trip() {
    let format = Nbt::new(Variant::Java).compression(Compression::Gzip);
    let bytes = format.to_bytes(&sample()).unwrap();

    assert_eq!(bytes[0], 0x1F);
    assert_eq!(bytes[1], 0x8B);

    let back: V = format.from_bytes(&bytes).unwrap();
    assert_eq!(back, sample());
}

#[test]
fn zlib_round_trip() {
    let format = Nbt::new(Variant::Java).compression(Compression::Zlib);
    let bytes = format.to_bytes(&sample()).unwrap();

    assert_eq!(bytes[0], 0x78);

    let back: V = format.from_bytes(&bytes).unwrap();
    assert_eq!(back, sample());
}

#[test]
fn explicit_compression_level_still_round_trips() {
    for level in [0, 1, 9] {
        let format = Nbt::new(Variant::Java)
            .compression(Compression::Gzip)
            .compression_level(level);
        let bytes = format.to_bytes(&sample()).unwrap();
        let back: V = format.from_bytes(&bytes).unwrap();
        assert_eq!(back, sample(), "at level {}", level);
    }
}

#[test]
fn mismatched_compression_names_both() {
    let gzipped = Nbt::new(Variant::Java)
        .compression(Compression::Gzip)
        .to_bytes(&sample())
        .unwrap();

    let e = Nbt::new(Variant::Java)
        .from_bytes::<V>(&gzipped)
        .unwrap_err();
    assert_eq!(e.to_string(), "expected None compression, but detected Gzip");
    assert!(!e.is_compression_detection());

    let plain = Nbt::new(Variant::Java).to_bytes(&sample()).unwrap();
    let e = Nbt::new(Variant::Java)
        .compression(Compression::Zlib)
        .from_bytes::<V>(&plain)
        .unwrap_err();
    assert_eq!(e.to_string(), "expected Zlib compression, but detected None");
}

#[test]
fn undetectable_first_byte_errors() {
    let e = Nbt::new(Variant::Java)
        .from_bytes::<Value>(&[0xAB, 0xCD])
        .unwrap_err();
    assert!(e.is_compression_detection());
    assert_eq!(
        e.to_string(),
        "unable to detect compression, unexpected first byte: 0xAB"
    );
}

#[test]
fn compressed_value_round_trip() {
    let payload = Builder::new()
        .start_compound("root")
        .int("x", 7)
        .end_compound()
        .build();

    let plain = Nbt::new(Variant::Java);
    let tag = plain.value_from_bytes(&payload).unwrap();
    assert_eq!(tag.name, "root");

    let zlib = Nbt::new(Variant::Java).compression(Compression::Zlib);
    let compressed = zlib.value_to_bytes(&tag).unwrap();
    assert_eq!(zlib.value_from_bytes(&compressed).unwrap(), tag);

    // And the recompressed document inflates back to the original bytes.
    let mut inflated = Vec::new();
    let mut dec = flate2::write::ZlibDecoder::new(&mut inflated);
    dec.write_all(&compressed).unwrap();
    dec.finish().unwrap();
    assert_eq!(inflated, payload);
}
