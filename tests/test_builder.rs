use bsondoc::builder::Core;
use bsondoc::types::*;
use bsondoc::{doc, DocumentValue, Element, Error, Oid};

fn every_type() -> DocumentValue {
    let scope = doc! { "x": 1 }.unwrap();
    let mut core = Core::new_document();
    core.key_view("double").unwrap().append(1.5).unwrap();
    core.key_view("string").unwrap().append("s").unwrap();
    core.key_view("document").unwrap().open_document().unwrap().close_document().unwrap();
    core.key_view("array").unwrap().open_array().unwrap().close_array().unwrap();
    core.key_view("binary")
        .unwrap()
        .append(BBinary {
            subtype: BinarySubtype::Uuid,
            bytes: &[7; 16],
        })
        .unwrap();
    core.key_view("undefined").unwrap().append(BUndefined).unwrap();
    core.key_view("oid").unwrap().append(Oid::new()).unwrap();
    core.key_view("bool").unwrap().append(false).unwrap();
    core.key_view("date").unwrap().append(BDate::now()).unwrap();
    core.key_view("null").unwrap().append(BNull).unwrap();
    core.key_view("regex").unwrap().append(BRegex::new(".*", "")).unwrap();
    core.key_view("dbpointer")
        .unwrap()
        .append(BDbPointer {
            collection: "db.coll".into(),
            value: Oid::new(),
        })
        .unwrap();
    core.key_view("code").unwrap().append(BCode::new("f()")).unwrap();
    core.key_view("symbol").unwrap().append(BSymbol::new("s")).unwrap();
    core.key_view("codewscope")
        .unwrap()
        .append(BCodeWScope {
            code: "x".into(),
            scope: scope.view(),
        })
        .unwrap();
    core.key_view("int32").unwrap().append(1).unwrap();
    core.key_view("timestamp")
        .unwrap()
        .append(BTimestamp {
            increment: 1,
            timestamp: 2,
        })
        .unwrap();
    core.key_view("int64").unwrap().append(1i64).unwrap();
    core.key_view("decimal128").unwrap().append(BDecimal128::new(1, 2)).unwrap();
    core.key_view("minkey").unwrap().append(BMinKey).unwrap();
    core.key_view("maxkey").unwrap().append(BMaxKey).unwrap();
    core.extract_document().unwrap()
}

macro_rules! getters {
    ($e:expr; $($ty:ident => $get:ident),* $(,)?) => {
        vec![$((Type::$ty, $e.$get().map(|_| ()))),*]
    };
}

fn all_getters(e: &Element) -> Vec<(Type, bsondoc::Result<()>)> {
    getters! { e;
        Double => get_double,
        String => get_string,
        Document => get_document,
        Array => get_array,
        Binary => get_binary,
        Undefined => get_undefined,
        Oid => get_oid,
        Bool => get_bool,
        Date => get_date,
        Null => get_null,
        Regex => get_regex,
        DbPointer => get_dbpointer,
        Code => get_code,
        Symbol => get_symbol,
        CodeWScope => get_codewscope,
        Int32 => get_int32,
        Timestamp => get_timestamp,
        Int64 => get_int64,
        Decimal128 => get_decimal128,
        MinKey => get_minkey,
        MaxKey => get_maxkey,
    }
}

#[test]
fn test_type_mismatch_for_every_pair() {
    let value = every_type();
    let view = value.view();
    let mut seen = 0;

    for element in view {
        let element = element.unwrap();
        let actual = element.element_type();
        for (expected, result) in all_getters(&element) {
            if expected == actual {
                assert!(result.is_ok(), "{} getter failed", actual);
            } else {
                assert_eq!(result, Err(Error::TypeMismatch { expected, actual }));
            }
        }
        assert!(element.value().is_ok());
        seen += 1;
    }
    assert_eq!(seen, 21);
}

#[test]
fn test_eod_getters_fail() {
    let value = every_type();
    let missing = value.view().get("missing").unwrap();
    assert!(missing.is_eod());
    for (expected, result) in all_getters(&missing) {
        assert_eq!(
            result,
            Err(Error::TypeMismatch {
                expected,
                actual: Type::Eod
            })
        );
    }
    assert!(missing.value().is_err());
    assert!(missing.get("x").unwrap().is_eod());
    assert!(missing.at(0).unwrap().is_eod());
}

#[test]
fn test_structural_violations() {
    let expected = doc! { "a": { "b": [1] } }.unwrap();

    let mut core = Core::new_document();
    assert!(matches!(core.close_document(), Err(Error::InvalidState(_))));
    assert!(matches!(core.append(1), Err(Error::InvalidState(_))));
    assert!(matches!(core.open_array(), Err(Error::InvalidState(_))));
    assert!(matches!(core.view_array(), Err(Error::InvalidState(_))));

    core.key_view("a").unwrap();
    assert!(matches!(core.key_view("again"), Err(Error::InvalidState(_))));
    assert!(matches!(core.view_document(), Err(Error::InvalidState(_))));
    assert!(matches!(
        core.concatenate(expected.view()),
        Err(Error::InvalidState(_))
    ));
    core.open_document().unwrap();
    assert!(matches!(core.close_array(), Err(Error::InvalidState(_))));

    core.key_view("b").unwrap().open_array().unwrap();
    assert!(matches!(core.key_view("c"), Err(Error::InvalidState(_))));
    assert!(matches!(core.close_document(), Err(Error::InvalidState(_))));
    assert!(matches!(core.extract_document(), Err(Error::InvalidState(_))));
    core.append(1).unwrap().close_array().unwrap();
    core.close_document().unwrap();

    assert_eq!(core.extract_document().unwrap().as_bytes(), expected.as_bytes());
}

#[test]
fn test_invalid_payloads() {
    let mut core = Core::new_document();
    assert_eq!(core.key_owned(String::from("a\0")).err(), Some(Error::InvalidKey));
    core.key_view("r").unwrap();
    assert_eq!(
        core.append(BRegex::new("a", "i\0")).err(),
        Some(Error::InvalidString)
    );
    assert_eq!(
        core.append(BDbPointer {
            collection: "c".into(),
            value: Oid::parse("nope"),
        })
        .err(),
        Some(Error::InvalidOid)
    );
    core.append(BRegex::new("a", "i")).unwrap();
    assert_eq!(core.view_document().unwrap().iter().count(), 1);
}

#[test]
fn test_clear_is_idempotent() {
    let mut core = Core::new_array();
    core.append(1).unwrap().open_document().unwrap();
    core.key_view("x").unwrap();

    core.clear().unwrap();
    let once = core.view_array().unwrap().as_bytes().to_vec();
    core.clear().unwrap().clear().unwrap();
    let twice = core.view_array().unwrap().as_bytes().to_vec();

    let mut fresh = Core::new_array();
    assert_eq!(once, twice);
    assert_eq!(once, fresh.view_array().unwrap().as_bytes());
    assert_eq!(core.depth(), 1);

    // still an array root
    assert!(matches!(core.key_view("k"), Err(Error::InvalidState(_))));
    core.append("after").unwrap();
    assert_eq!(core.view_array().unwrap().len_elements().unwrap(), 1);
}

#[test]
fn test_extracted_builder() {
    let mut core = Core::new_document();
    core.key_view("k").unwrap().append(1).unwrap();
    let value = core.extract_document().unwrap();
    assert_eq!(value.view().get("k").unwrap().get_int32().unwrap().value, 1);

    assert_eq!(core.key_view("k").err(), Some(Error::Extracted));
    assert_eq!(core.append(1).err(), Some(Error::Extracted));
    assert_eq!(core.open_document().err(), Some(Error::Extracted));
    assert_eq!(core.close_document().err(), Some(Error::Extracted));
    assert_eq!(core.view_document().err(), Some(Error::Extracted));
    assert_eq!(core.extract_document().err(), Some(Error::Extracted));
    assert_eq!(core.clear().err(), Some(Error::Extracted));

    // reassignment is the way out
    core = Core::new_document();
    assert!(core.view_document().unwrap().is_empty());
}

#[test]
fn test_concatenate_document() {
    let source = doc! { "a": 1, "b": "two" }.unwrap();

    let mut core = Core::new_document();
    core.key_view("x").unwrap().append(0).unwrap();
    core.concatenate(source.view()).unwrap();
    core.concatenate(Default::default()).unwrap();

    let view = core.view_document().unwrap();
    let keys: Vec<_> = view.iter().map(|e| e.unwrap().key()).collect();
    assert_eq!(keys, ["x", "a", "b"]);
    assert_eq!(view.get("b").unwrap().get_string().unwrap().value, "two");
}

#[test]
fn test_concatenate_renumbers_arrays() {
    let source = doc! { "a": 1, "b": { "c": true } }.unwrap();
    let tail = bsondoc::array!["y", "z"].unwrap();

    let mut core = Core::new_array();
    core.append("first").unwrap();
    core.concatenate(source.view()).unwrap();
    core.concatenate(tail.view().as_document()).unwrap();

    let expected = bsondoc::array!["first", 1, { "c": true }, "y", "z"].unwrap();
    let view = core.view_array().unwrap();
    assert_eq!(view.as_bytes(), expected.as_bytes());
    assert_eq!(view.get(4).unwrap().get_string().unwrap().value, "z");
}

#[test]
fn test_concatenate_rejects_corrupt_source() {
    // second element has an unknown type
    let bytes = b"\x12\x00\x00\x00\x08a\x00\x01\x42b\x00\x00\x00\x00\x00\x00\x00\x00";
    let source = bsondoc::DocumentView::new(&bytes[..]).unwrap();

    let mut core = Core::new_document();
    assert!(matches!(core.concatenate(source), Err(Error::Malformed { .. })));
    assert!(core.view_document().unwrap().is_empty());
}

#[test]
fn test_binary_alloc() {
    let mut core = Core::new_array();
    {
        let bytes = core.append_binary_alloc(BinarySubtype::UserDefined(0x80), 4).unwrap();
        bytes.copy_from_slice(&[1, 2, 3, 4]);
    }
    // an untouched allocation stays zeroed
    core.append_binary_alloc(BinarySubtype::Generic, 2).unwrap();

    let view = core.view_array().unwrap();
    let first = view.get(0).unwrap().get_binary().unwrap();
    assert_eq!(first.subtype, BinarySubtype::UserDefined(0x80));
    assert_eq!(first.bytes, &[1, 2, 3, 4]);
    assert_eq!(view.get(1).unwrap().get_binary().unwrap().bytes, &[0, 0]);

    let mut core = Core::new_document();
    assert!(matches!(
        core.append_binary_alloc(BinarySubtype::Generic, 1),
        Err(Error::InvalidState(_))
    ));
}

#[test]
fn test_binary_alloc_too_large() {
    let mut core = Core::new_array();
    assert_eq!(
        core.append_binary_alloc(BinarySubtype::Generic, usize::MAX).err(),
        Some(Error::InvalidState("value too large"))
    );
    assert_eq!(
        core.append_binary_alloc(BinarySubtype::Generic, i32::MAX as usize).err(),
        Some(Error::InvalidState("value too large"))
    );

    // the failed calls left no header behind
    assert_eq!(core.view_array().unwrap().as_bytes(), &[5, 0, 0, 0, 0]);
    core.append_binary_alloc(BinarySubtype::Generic, 1).unwrap()[0] = 9;
    let view = core.view_array().unwrap();
    assert_eq!(view.get(0).unwrap().get_binary().unwrap().bytes, &[9]);
}

#[test]
fn test_native_conversions() {
    let mut core = Core::new_array();
    core.append(1u8)
        .unwrap()
        .append(-2i16)
        .unwrap()
        .append(3u32)
        .unwrap()
        .append(4.5f32)
        .unwrap()
        .append(Some(String::from("five")))
        .unwrap()
        .append(None::<&str>)
        .unwrap();
    let view = core.view_array().unwrap();
    let types: Vec<_> = view.iter().map(|e| e.unwrap().element_type()).collect();
    assert_eq!(
        types,
        [
            Type::Int32,
            Type::Int32,
            Type::Int64,
            Type::Double,
            Type::String,
            Type::Null
        ]
    );
    // no implicit widening when comparing
    assert_ne!(Bson::from(100i32), Bson::from(100i64));
}
