use facet::Facet;
use facet_mapstructure::{FieldErrorKind, Value, decode, value, weak_decode};
use facet_testhelpers::test;

#[derive(Facet, Debug, Default, PartialEq)]
struct Scalars {
    vbool: bool,
    vstring: String,
    vint: i32,
    vuint: u32,
    vfloat: f64,
}

#[test]
fn scalars_convert_across_categories() {
    let input = value!({
        "vbool": 1,
        "vstring": true,
        "vint": "42",
        "vuint": (-1),
        "vfloat": "3.25"
    });

    let mut scalars = Scalars::default();
    weak_decode(&input, &mut scalars).unwrap();
    assert_eq!(
        scalars,
        Scalars {
            vbool: true,
            vstring: "1".into(),
            vint: 42,
            vuint: u32::MAX,
            vfloat: 3.25,
        }
    );
}

#[test]
fn strings_into_booleans() {
    let cases = [
        ("true", true),
        ("T", true),
        ("1", true),
        ("False", false),
        ("0", false),
        ("", false),
    ];
    for (input, expected) in cases {
        let mut scalars = Scalars::default();
        weak_decode(&value!({ "vbool": input }), &mut scalars).unwrap();
        assert_eq!(scalars.vbool, expected, "{input:?}");
    }

    let mut scalars = Scalars::default();
    let err = weak_decode(&value!({ "vbool": "yes" }), &mut scalars).unwrap_err();
    assert_eq!(
        err.field_errors()[0].to_string(),
        r#"cannot parse 'vbool' as bool: parsing "yes": invalid syntax"#
    );
}

#[test]
fn scalars_into_strings() {
    let cases = [
        (value!(false), "0"),
        (value!(-7i64), "-7"),
        (value!(7u64), "7"),
        (value!(1.5), "1.5"),
        (value!(100.0), "100"),
        (Value::Bytes(b"raw".to_vec()), "raw"),
    ];
    for (input, expected) in cases {
        let mut out = String::new();
        weak_decode(&input, &mut out).unwrap();
        assert_eq!(out, expected, "{input:?}");
    }
}

#[test]
fn numbers_from_booleans_and_floats() {
    let mut scalars = Scalars::default();
    weak_decode(
        &value!({ "vint": true, "vuint": 9.99, "vfloat": false }),
        &mut scalars,
    )
    .unwrap();
    assert_eq!(scalars.vint, 1);
    assert_eq!(scalars.vuint, 9);
    assert_eq!(scalars.vfloat, 0.0);
}

#[test]
fn integer_prefixes() {
    let cases = [
        ("0x1f", 31),
        ("0X1F", 31),
        ("0o17", 15),
        ("017", 15),
        ("0b101", 5),
        ("0x_ff", 255),
        ("-0x10", -16),
        ("+12", 12),
        ("0", 0),
    ];
    for (input, expected) in cases {
        let mut n = 0i32;
        weak_decode(&value!(input), &mut n).unwrap();
        assert_eq!(n, expected, "{input:?}");
    }
}

#[test]
fn malformed_integer_strings() {
    for input in ["abc", "1_000", "0x", "0x1__0", "12a", "0b2", ""] {
        let mut n = 0i32;
        let err = weak_decode(&value!(input), &mut n).unwrap_err();
        assert!(
            matches!(
                err.field_errors()[0].kind,
                FieldErrorKind::ParseFailure {
                    reason: "invalid syntax",
                    ..
                }
            ),
            "{input:?}: {err}"
        );
    }
}

#[test]
fn parse_failure_message_names_field_and_input() {
    #[derive(Facet, Debug, Default)]
    struct Counter {
        count: i32,
    }

    let mut counter = Counter::default();
    let err = weak_decode(&value!({ "count": "abc" }), &mut counter).unwrap_err();
    assert_eq!(
        err.to_string(),
        "1 error(s) decoding:\n\n* cannot parse 'count' as i32: parsing \"abc\": invalid syntax"
    );
}

#[test]
fn string_outside_width_is_out_of_range() {
    let mut n = 0u8;
    let err = weak_decode(&value!("300"), &mut n).unwrap_err();
    assert_eq!(
        err.field_errors()[0].to_string(),
        r#"cannot parse '' as u8: parsing "300": value out of range"#
    );

    let mut n = 0u8;
    let err = weak_decode(&value!("-1"), &mut n).unwrap_err();
    assert!(matches!(
        err.field_errors()[0].kind,
        FieldErrorKind::ParseFailure { .. }
    ));
}

#[test]
fn decimal_strings_round_trip_through_i64() {
    for sample in [i64::MIN, -9_000_000_000, -1, 0, 1, 42, i64::MAX] {
        let mut n = 0i64;
        weak_decode(&value!(sample.to_string()), &mut n).unwrap();
        assert_eq!(n, sample);
    }
}

#[test]
fn every_i8_round_trips_through_its_decimal_string() {
    for sample in i8::MIN..=i8::MAX {
        let mut n = 0i8;
        weak_decode(&value!(sample.to_string()), &mut n).unwrap();
        assert_eq!(n, sample);
    }
}

#[test]
fn float_strings() {
    let mut f = 0f32;
    weak_decode(&value!("2.5"), &mut f).unwrap();
    assert_eq!(f, 2.5);

    let err = weak_decode(&value!("two"), &mut f).unwrap_err();
    assert_eq!(
        err.field_errors()[0].to_string(),
        r#"cannot parse '' as f32: parsing "two": invalid syntax"#
    );
}

#[test]
fn float_strings_outside_the_width_are_out_of_range() {
    let mut scalars = Scalars {
        vfloat: 1.5,
        ..Default::default()
    };
    let err = weak_decode(&value!({ "vfloat": "1e400" }), &mut scalars).unwrap_err();
    assert_eq!(
        err.field_errors()[0].to_string(),
        r#"cannot parse 'vfloat' as f64: parsing "1e400": value out of range"#
    );
    assert_eq!(scalars.vfloat, 1.5);

    let mut f = 0f32;
    let err = weak_decode(&value!("1e39"), &mut f).unwrap_err();
    assert_eq!(
        err.field_errors()[0].to_string(),
        r#"cannot parse '' as f32: parsing "1e39": value out of range"#
    );
}

#[test]
fn hexadecimal_float_strings() {
    let mut scalars = Scalars::default();
    weak_decode(&value!({ "vfloat": "0x1p-2" }), &mut scalars).unwrap();
    assert_eq!(scalars.vfloat, 0.25);

    weak_decode(&value!({ "vfloat": "-0X1.8P1" }), &mut scalars).unwrap();
    assert_eq!(scalars.vfloat, -3.0);

    let err = weak_decode(&value!({ "vfloat": "0x1.8" }), &mut scalars).unwrap_err();
    assert_eq!(
        err.field_errors()[0].to_string(),
        r#"cannot parse 'vfloat' as f64: parsing "0x1.8": invalid syntax"#
    );
}

#[test]
fn strict_mode_rejects_the_same_inputs() {
    let input = value!({ "vbool": 1, "vstring": true, "vint": "42" });

    let mut scalars = Scalars::default();
    let err = decode(&input, &mut scalars).unwrap_err();
    let paths: Vec<_> = err.field_errors().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["vbool", "vstring", "vint"]);
}
