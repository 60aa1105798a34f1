use facet::Facet;
use facet_mapstructure::{Decoder, DecoderConfig, FieldErrorKind, Value, value};
use facet_testhelpers::test;

#[derive(Facet, Debug, Default, PartialEq)]
struct Basic {
    vstring: String,
    vint: i32,
}

#[derive(Facet, Debug, Default, PartialEq)]
struct Outer {
    name: String,
    inner: Basic,
}

fn strict_decode<'f, T: Facet<'f>>(input: &Value, target: &mut T) -> Result<(), facet_mapstructure::DecodeError> {
    let config = DecoderConfig {
        error_unused: true,
        ..Default::default()
    };
    Decoder::new(config, target)?.decode(input)
}

#[test]
fn extra_key_is_reported() {
    let input = value!({ "vstring": "hello", "vint": 1, "extra": true });

    let mut basic = Basic::default();
    let err = strict_decode(&input, &mut basic).unwrap_err();
    assert_eq!(err.to_string(), "1 error(s) decoding:\n\n* '' has invalid keys: extra");

    // the known fields are still written
    assert_eq!(
        basic,
        Basic {
            vstring: "hello".into(),
            vint: 1,
        }
    );
}

#[test]
fn invalid_keys_are_sorted() {
    let input = value!({ "zeta": 1, "vint": 1, "alpha": 2, "mid": 3 });

    let mut basic = Basic::default();
    let err = strict_decode(&input, &mut basic).unwrap_err();
    let errors = err.field_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].kind,
        FieldErrorKind::UnusedKeys(vec!["alpha".into(), "mid".into(), "zeta".into()])
    );
}

#[test]
fn nested_records_report_their_own_path() {
    let input = value!({
        "name": "n",
        "inner": { "vint": 2, "stray": "x" }
    });

    let mut outer = Outer::default();
    let err = strict_decode(&input, &mut outer).unwrap_err();
    assert_eq!(
        err.field_errors()[0].to_string(),
        "'inner' has invalid keys: stray"
    );
    assert_eq!(outer.inner.vint, 2);
}

#[test]
fn no_extra_keys_no_error() {
    let mut basic = Basic::default();
    strict_decode(&value!({ "VString": "x" }), &mut basic).unwrap();
    assert_eq!(basic.vstring, "x");
}

#[test]
fn unused_keys_are_ignored_by_default() {
    let mut basic = Basic::default();
    facet_mapstructure::decode(&value!({ "vint": 5, "extra": true }), &mut basic).unwrap();
    assert_eq!(basic.vint, 5);
}
