use std::cell::Cell;
use std::error::Error;
use std::rc::Rc;

use facet::Facet;
use facet_mapstructure::{
    DecodeErrorKind, DecodeHook, Decoder, DecoderConfig, Kind, Value, ValueType, value,
};
use facet_testhelpers::test;

#[derive(Facet, Debug, Default, PartialEq)]
struct Config {
    a: String,
    b: Vec<String>,
    c: u32,
}

fn decode_with<'f, T: Facet<'f>>(
    hook: DecodeHook,
    input: &Value,
    target: &mut T,
) -> Result<(), facet_mapstructure::DecodeError> {
    let config = DecoderConfig {
        decode_hook: Some(hook),
        ..Default::default()
    };
    Decoder::new(config, target)?.decode(input)
}

#[test]
fn kind_hook_splits_strings_into_sequences() {
    let hook = DecodeHook::from_kind(|from, to, value| {
        Ok(match (from, to, value) {
            (Kind::String, Kind::Sequence, Value::String(s)) => {
                Some(Value::Sequence(s.split(',').map(Value::from).collect()))
            }
            _ => None,
        })
    });

    let mut config = Config::default();
    decode_with(hook, &value!({ "a": "x,y", "b": "x,y" }), &mut config).unwrap();
    assert_eq!(config.a, "x,y");
    assert_eq!(config.b, ["x", "y"]);
}

#[test]
fn type_hook_sees_the_target_shape() {
    let hook = DecodeHook::from_type(|from, to, value| {
        if from == ValueType::String && to.type_identifier == "u32" {
            if let Value::String(s) = value {
                return Ok(Some(Value::Uint(s.len() as u64)));
            }
        }
        Ok(None)
    });

    let mut config = Config::default();
    decode_with(hook, &value!({ "a": "abc", "c": "four" }), &mut config).unwrap();
    assert_eq!(config.a, "abc");
    assert_eq!(config.c, 4);
}

#[test]
fn hook_error_aborts_the_decode() {
    let hook = DecodeHook::from_kind(|_, to, _| {
        if to == Kind::Sequence {
            return Err("boom".into());
        }
        Ok(None)
    });

    let mut config = Config {
        a: "before".into(),
        ..Default::default()
    };
    let err = decode_with(hook, &value!({ "a": "after", "b": [] }), &mut config).unwrap_err();

    assert!(matches!(err.kind(), DecodeErrorKind::Hook { .. }));
    assert_eq!(err.to_string(), "error decoding 'b': boom");
    assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("boom"));
    assert_eq!(config.a, "before");
}

#[test]
fn hook_returning_null_skips_the_target() {
    let hook = DecodeHook::from_kind(|from, _, _| {
        Ok((from == Kind::Uint).then_some(Value::Null))
    });

    let mut config = Config {
        c: 3,
        ..Default::default()
    };
    decode_with(hook, &value!({ "a": "kept", "c": 7u32 }), &mut config).unwrap();
    assert_eq!(config.a, "kept");
    assert_eq!(config.c, 3);
}

#[test]
fn hook_runs_on_every_value() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let hook = DecodeHook::from_kind(move |_, _, _| {
        counter.set(counter.get() + 1);
        Ok(None)
    });

    let mut config = Config::default();
    decode_with(hook, &value!({ "a": "x", "b": ["1", "2"] }), &mut config).unwrap();

    // root, a, b, b[0], b[1]
    assert_eq!(calls.get(), 5);
}

#[test]
fn root_hook_sees_the_record_kind() {
    let seen = Rc::new(Cell::new(None));
    let sink = seen.clone();
    let hook = DecodeHook::from_kind(move |from, to, _| {
        if sink.get().is_none() {
            sink.set(Some((from, to)));
        }
        Ok(None)
    });

    let mut config = Config::default();
    decode_with(hook, &value!({}), &mut config).unwrap();
    assert_eq!(seen.get(), Some((Kind::Mapping, Kind::Record)));
}

#[test]
fn hook_borrows_the_source_node() {
    let input = value!({ "b": ["1", "2"] });
    let node = input.as_mapping().and_then(|m| m.get("b")).unwrap() as *const Value as usize;
    let borrowed = Rc::new(Cell::new(false));
    let sink = borrowed.clone();
    let hook = DecodeHook::from_type(move |_, _, value| {
        if value.as_sequence().is_some() {
            sink.set(std::ptr::eq(value, node as *const Value));
        }
        Ok(None)
    });

    let mut config = Config::default();
    decode_with(hook, &input, &mut config).unwrap();
    assert!(borrowed.get());
    assert_eq!(config.b, ["1", "2"]);
}
