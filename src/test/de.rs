use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    from_bytes, from_reader,
    test::builder::Builder,
    ByteArray, IntArray, LongArray, Nbt, Tag, Value, Variant,
};

fn from_all<T>(payload: &[u8]) -> T
where
    T: serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let v_bytes: T = from_bytes(payload).unwrap();
    let v_read: T = from_reader(payload).unwrap();
    assert_eq!(v_bytes, v_read);
    v_bytes
}

#[test]
fn error_impls_sync_send() {
    fn i<T: Clone + Send + Sync + std::error::Error>(_: T) {}
    i(Error::invalid_tag(1));
}

#[test]
fn descriptive_error_on_gzip_magic() {
    let r = from_bytes::<Value>(&[0x1f, 0x8b]);
    let e = r.unwrap_err();
    assert!(e.to_string().contains("Gzip"));
}

#[test]
fn simple_byte() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        abc: i8,
        def: i8,
    }

    let payload = Builder::new()
        .start_compound("")
        .byte("abc", 123)
        .byte("def", 111)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());

    assert_eq!(v.abc, 123);
    assert_eq!(v.def, 111);
}

#[test]
fn simple_floats() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct V {
        f: f32,
        d: f64,
    }

    let payload = Builder::new()
        .start_compound("object")
        .float("f", 1.23)
        .double("d", 2.34)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());

    assert_eq!(v.f, 1.23);
    assert_eq!(v.d, 2.34);
}

#[test]
fn simple_shorts() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        abc: i16,
        def: u16,
    }

    let payload = Builder::new()
        .start_compound("")
        .short("abc", 256)
        .short("def", 257)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());

    assert_eq!(v.abc, 256);
    assert_eq!(v.def, 257);
}

#[test]
fn short_to_u16_out_of_range_errors() {
    #[derive(Debug, Deserialize)]
    struct V {
        _abc: u16,
    }

    let payload = Builder::new()
        .start_compound("")
        .short("_abc", -123)
        .end_compound()
        .build();

    let v: Result<V> = from_bytes(payload.as_slice());
    assert!(v.is_err());
}

#[test]
fn numbers_widen() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        a: u32,
        b: u32,
        c: i64,
    }

    let payload = Builder::new()
        .start_compound("")
        .byte("a", 123)
        .short("b", 2 << 8)
        .int("c", 2 << 24)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());

    assert_eq!(v.a, 123);
    assert_eq!(v.b, 2 << 8);
    assert_eq!(v.c, 2 << 24);
}

#[test]
fn long_and_string() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        n: i64,
        s: String,
    }

    let payload = Builder::new()
        .start_compound("")
        .long("n", i64::MIN)
        .string("s", "hello")
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());

    assert_eq!(v.n, i64::MIN);
    assert_eq!(v.s, "hello");
}

#[test]
fn bool_from_byte() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        yes: bool,
        no: bool,
    }

    let payload = Builder::new()
        .start_compound("")
        .byte("yes", 1)
        .byte("no", 0)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());

    assert!(v.yes);
    assert!(!v.no);
}

#[test]
fn char_from_single_character_string() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        c: char,
    }

    let payload = Builder::new()
        .start_compound("")
        .string("c", "x")
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.c, 'x');
}

#[test]
fn char_from_long_string_errors() {
    #[derive(Debug, Deserialize)]
    struct V {
        _c: char,
    }

    let payload = Builder::new()
        .start_compound("")
        .string("_c", "xy")
        .end_compound()
        .build();

    let v: Result<V> = from_bytes(payload.as_slice());
    assert!(v.is_err());
}

#[test]
fn nested_compound() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Inner {
        b: i32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        a: Inner,
    }

    let payload = Builder::new()
        .start_compound("")
        .start_compound("a")
        .int("b", 42)
        .end_compound()
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.a.b, 42);
}

#[test]
fn list_of_ints() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        xs: Vec<i32>,
    }

    let payload = Builder::new()
        .start_compound("")
        .start_list("xs", Tag::Int, 3)
        .int_payload(1)
        .int_payload(2)
        .int_payload(3)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.xs, [1, 2, 3]);
}

#[test]
fn empty_list_of_end() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        xs: Vec<i32>,
    }

    let payload = Builder::new()
        .start_compound("")
        .start_list("xs", Tag::End, 0)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert!(v.xs.is_empty());
}

#[test]
fn list_of_end_with_nonzero_length_errors() {
    let payload = Builder::new()
        .start_compound("")
        .start_list("xs", Tag::End, 3)
        .end_compound()
        .build();

    let v: Result<Value> = from_bytes(payload.as_slice());
    let e = v.unwrap_err();
    assert!(e.to_string().contains("end"));
}

#[test]
fn nested_lists() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        xs: Vec<Vec<i16>>,
    }

    let payload = Builder::new()
        .start_compound("")
        .start_list("xs", Tag::List, 2)
        .start_anon_list(Tag::Short, 2)
        .short_payload(1)
        .short_payload(2)
        .start_anon_list(Tag::Short, 1)
        .short_payload(3)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.xs, [vec![1, 2], vec![3]]);
}

#[test]
fn list_of_compounds() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Entry {
        id: i32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        entries: Vec<Entry>,
    }

    let payload = Builder::new()
        .start_compound("")
        .start_list("entries", Tag::Compound, 2)
        .start_anon_compound()
        .int("id", 1)
        .end_anon_compound()
        .start_anon_compound()
        .int("id", 2)
        .end_anon_compound()
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.entries, [Entry { id: 1 }, Entry { id: 2 }]);
}

#[test]
fn arrays_into_wrapper_types() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        bs: ByteArray,
        is: IntArray,
        ls: LongArray,
    }

    let payload = Builder::new()
        .start_compound("")
        .byte_array("bs", &[-1, 2, 3])
        .int_array("is", &[4, -5, 6])
        .long_array("ls", &[7, 8, i64::MAX])
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());

    assert_eq!(&*v.bs, [-1, 2, 3]);
    assert_eq!(&*v.is, [4, -5, 6]);
    assert_eq!(&*v.ls, [7, 8, i64::MAX]);
}

#[test]
fn int_array_into_vec_errors() {
    #[derive(Debug, Deserialize)]
    struct V {
        _is: Vec<i32>,
    }

    let payload = Builder::new()
        .start_compound("")
        .int_array("_is", &[1, 2, 3])
        .end_compound()
        .build();

    let v: Result<V> = from_bytes(payload.as_slice());
    let e = v.unwrap_err();
    assert!(e.to_string().contains("IntArray"));
}

#[test]
fn byte_array_into_bytes() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        #[serde(with = "serde_bytes_shim")]
        data: Vec<u8>,
    }

    // A stand-in for serde_bytes: drive deserialize_byte_buf directly.
    mod serde_bytes_shim {
        pub fn deserialize<'de, D: serde::Deserializer<'de>>(
            de: D,
        ) -> Result<Vec<u8>, D::Error> {
            struct V;
            impl serde::de::Visitor<'_> for V {
                type Value = Vec<u8>;
                fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    f.write_str("bytes")
                }
                fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                    Ok(v)
                }
            }
            de.deserialize_byte_buf(V)
        }
    }

    let payload = Builder::new()
        .start_compound("")
        .byte_array("data", &[1, 2, -1])
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.data, [1, 2, 255]);
}

#[test]
fn unknown_key_errors_by_default() {
    #[derive(Debug, Deserialize)]
    struct V {
        _a: i8,
    }

    let payload = Builder::new()
        .start_compound("")
        .byte("_a", 1)
        .int("extra", 2)
        .end_compound()
        .build();

    let v: Result<V> = from_bytes(payload.as_slice());
    let e = v.unwrap_err();
    assert_eq!(e.to_string(), "encountered unknown key 'extra' (Int)");
}

#[test]
fn unknown_list_key_names_element_type() {
    #[derive(Debug, Deserialize)]
    struct V {
        _a: i8,
    }

    let payload = Builder::new()
        .start_compound("")
        .byte("_a", 1)
        .start_list("extra", Tag::Int, 2)
        .int_payload(1)
        .int_payload(2)
        .end_compound()
        .build();

    let v: Result<V> = from_bytes(payload.as_slice());
    let e = v.unwrap_err();
    assert_eq!(e.to_string(), "encountered unknown key 'extra' (List<Int>)");
}

#[test]
fn unknown_keys_ignored_when_configured() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        a: i8,
    }

    // Every discardable shape sits before the wanted field, so a skip that
    // leaves the cursor anywhere but exactly past the value breaks the test.
    let payload = Builder::new()
        .start_compound("")
        .int("extra", 2)
        .start_compound("nested")
        .string("s", "deep")
        .end_compound()
        .start_list("list", Tag::Compound, 2)
        .start_anon_compound()
        .long("l", 19)
        .end_anon_compound()
        .start_anon_compound()
        .end_anon_compound()
        .int_array("arr", &[1, 2, 3])
        .string("text", "skipped")
        .byte("a", 1)
        .end_compound()
        .build();

    let format = Nbt::new(Variant::Java).ignore_unknown_keys(true);
    let v: V = format.from_bytes(payload.as_slice()).unwrap();
    assert_eq!(v.a, 1);
}

#[test]
fn map_always_yields_every_key() {
    let payload = Builder::new()
        .start_compound("")
        .int("a", 1)
        .int("b", 2)
        .end_compound()
        .build();

    let v: HashMap<String, i32> = from_all(payload.as_slice());
    assert_eq!(v.len(), 2);
    assert_eq!(v["a"], 1);
    assert_eq!(v["b"], 2);
}

#[test]
fn optional_field_missing_is_none() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        a: i8,
        b: Option<i8>,
    }

    let payload = Builder::new()
        .start_compound("")
        .byte("a", 1)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.b, None);
}

#[test]
fn optional_field_present_is_some() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        b: Option<i8>,
    }

    let payload = Builder::new()
        .start_compound("")
        .byte("b", 7)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.b, Some(7));
}

#[test]
fn enums_are_unsupported() {
    #[derive(Debug, Deserialize)]
    enum E {
        #[allow(unused)]
        A,
    }

    #[derive(Debug, Deserialize)]
    struct V {
        _e: E,
    }

    let payload = Builder::new()
        .start_compound("")
        .string("_e", "A")
        .end_compound()
        .build();

    let v: Result<V> = from_bytes(payload.as_slice());
    let e = v.unwrap_err();
    assert!(e.is_unsupported());
}

#[test]
fn error_carries_field_path() {
    #[derive(Debug, Deserialize)]
    struct Inner {
        _b: Vec<i32>,
    }

    #[derive(Debug, Deserialize)]
    struct V {
        _a: Inner,
    }

    let payload = Builder::new()
        .start_compound("")
        .start_compound("_a")
        .short("_b", 3)
        .end_compound()
        .end_compound()
        .build();

    let v: Result<V> = from_bytes(payload.as_slice());
    let e = v.unwrap_err();
    assert_eq!(e.to_string(), "expected List, but was Short (at _a._b)");
}

#[test]
fn error_carries_list_index_path() {
    #[derive(Debug, Deserialize)]
    struct Entry {
        _b: String,
    }

    #[derive(Debug, Deserialize)]
    struct V {
        _a: Vec<Entry>,
    }

    let payload = Builder::new()
        .start_compound("")
        .start_list("_a", Tag::Compound, 2)
        .start_anon_compound()
        .string("_b", "ok")
        .end_anon_compound()
        .start_anon_compound()
        .int("_b", 3)
        .end_anon_compound()
        .end_compound()
        .build();

    let v: Result<V> = from_bytes(payload.as_slice());
    let e = v.unwrap_err();
    assert!(e.to_string().ends_with("(at _a[1]._b)"), "got: {}", e);
}

#[test]
fn eof_is_a_decoding_error() {
    let payload = Builder::new()
        .start_compound("")
        .tag(Tag::Int)
        .name("truncated")
        .build();

    let v: Result<Value> = from_bytes(payload.as_slice());
    let e = v.unwrap_err();
    assert!(e.to_string().contains("eof"));
}

#[test]
fn invalid_tag_byte_errors() {
    let payload = Builder::new()
        .start_compound("")
        .raw_bytes(&[0x0D])
        .build();

    let v: Result<Value> = from_bytes(payload.as_slice());
    let e = v.unwrap_err();
    assert_eq!(e.to_string(), "invalid nbt tag value: 13");
}

#[test]
fn root_name_verified_when_configured() {
    #[derive(Debug, Deserialize)]
    struct V {
        x: i32,
    }

    let payload = Builder::new()
        .start_compound("hello")
        .int("x", 5)
        .end_compound()
        .build();

    let format = Nbt::new(Variant::Java).root_name("hello");
    let v: V = format.from_bytes(payload.as_slice()).unwrap();
    assert_eq!(v.x, 5);

    let format = Nbt::new(Variant::Java).root_name("world");
    let e = format.from_bytes::<V>(payload.as_slice()).unwrap_err();
    assert_eq!(
        e.to_string(),
        "encountered root NBT name 'hello', but expected 'world'"
    );

    let format = Nbt::new(Variant::Java)
        .root_name("world")
        .lenient_root_names(true);
    let v: V = format.from_bytes(payload.as_slice()).unwrap();
    assert_eq!(v.x, 5);
}

#[test]
fn any_root_name_accepted_when_unconfigured() {
    #[derive(Debug, Deserialize)]
    struct V {
        x: i32,
    }

    let payload = Builder::new()
        .start_compound("whatever")
        .int("x", 5)
        .end_compound()
        .build();

    let v: V = from_bytes(payload.as_slice()).unwrap();
    assert_eq!(v.x, 5);
}

#[test]
fn java_network_root_name_cutoff() {
    #[derive(Debug, Deserialize)]
    struct V {
        x: i32,
    }

    // 1.20.2 and later drop the root name on the wire.
    let unnamed = Builder::new()
        .start_unnamed_compound()
        .int("x", 5)
        .end_compound()
        .build();

    let format = Nbt::new(Variant::JavaNetwork {
        protocol_version: 764,
    });
    let v: V = format.from_bytes(unnamed.as_slice()).unwrap();
    assert_eq!(v.x, 5);

    // Earlier protocols keep it.
    let named = Builder::new()
        .start_compound("")
        .int("x", 5)
        .end_compound()
        .build();

    let format = Nbt::new(Variant::JavaNetwork {
        protocol_version: 763,
    });
    let v: V = format.from_bytes(named.as_slice()).unwrap();
    assert_eq!(v.x, 5);
}

#[test]
fn cesu8_string_decodes() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        s: String,
    }

    // U+10400 encodes as a six-byte surrogate pair in Java's modified UTF-8.
    let payload = Builder::new()
        .start_compound("")
        .string("s", "a\u{10400}b")
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.s, "a\u{10400}b");
}

#[test]
fn newtype_struct_is_transparent() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Wrapper(i32);

    #[derive(Debug, Deserialize, PartialEq)]
    struct V {
        x: Wrapper,
    }

    let payload = Builder::new()
        .start_compound("")
        .int("x", 9)
        .end_compound()
        .build();

    let v: V = from_all(payload.as_slice());
    assert_eq!(v.x, Wrapper(9));
}
