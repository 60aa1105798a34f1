//! Scalar conversion rules, strict and weak.

use facet_core::Shape;
use facet_reflect::{Partial, ReflectError};

use crate::error::FieldErrorKind;
use crate::kind::{FloatWidth, IntWidth, UintWidth};
use crate::Value;

const INVALID_SYNTAX: &str = "invalid syntax";
const OUT_OF_RANGE: &str = "value out of range";

/// A fully converted scalar, ready to be written into a partial of the matching width.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
    Bool(bool),
    String(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(f32),
    F64(f64),
}

impl Scalar {
    pub(crate) fn write(self, partial: &mut Partial<'_>) -> Result<(), ReflectError> {
        match self {
            Scalar::Bool(v) => partial.set(v)?,
            Scalar::String(v) => partial.set(v)?,
            Scalar::I8(v) => partial.set(v)?,
            Scalar::I16(v) => partial.set(v)?,
            Scalar::I32(v) => partial.set(v)?,
            Scalar::I64(v) => partial.set(v)?,
            Scalar::I128(v) => partial.set(v)?,
            Scalar::Isize(v) => partial.set(v)?,
            Scalar::U8(v) => partial.set(v)?,
            Scalar::U16(v) => partial.set(v)?,
            Scalar::U32(v) => partial.set(v)?,
            Scalar::U64(v) => partial.set(v)?,
            Scalar::U128(v) => partial.set(v)?,
            Scalar::Usize(v) => partial.set(v)?,
            Scalar::F32(v) => partial.set(v)?,
            Scalar::F64(v) => partial.set(v)?,
        };
        Ok(())
    }

    /// Wrapping conversion, the way `as` narrows.
    fn int(width: IntWidth, v: i128) -> Scalar {
        match width {
            IntWidth::I8 => Scalar::I8(v as i8),
            IntWidth::I16 => Scalar::I16(v as i16),
            IntWidth::I32 => Scalar::I32(v as i32),
            IntWidth::I64 => Scalar::I64(v as i64),
            IntWidth::I128 => Scalar::I128(v),
            IntWidth::Isize => Scalar::Isize(v as isize),
        }
    }

    fn uint(width: UintWidth, v: u128) -> Scalar {
        match width {
            UintWidth::U8 => Scalar::U8(v as u8),
            UintWidth::U16 => Scalar::U16(v as u16),
            UintWidth::U32 => Scalar::U32(v as u32),
            UintWidth::U64 => Scalar::U64(v as u64),
            UintWidth::U128 => Scalar::U128(v),
            UintWidth::Usize => Scalar::Usize(v as usize),
        }
    }

    /// Saturating float truncation.
    fn int_from_float(width: IntWidth, f: f64) -> Scalar {
        match width {
            IntWidth::I8 => Scalar::I8(f as i8),
            IntWidth::I16 => Scalar::I16(f as i16),
            IntWidth::I32 => Scalar::I32(f as i32),
            IntWidth::I64 => Scalar::I64(f as i64),
            IntWidth::I128 => Scalar::I128(f as i128),
            IntWidth::Isize => Scalar::Isize(f as isize),
        }
    }

    fn uint_from_float(width: UintWidth, f: f64) -> Scalar {
        match width {
            UintWidth::U8 => Scalar::U8(f as u8),
            UintWidth::U16 => Scalar::U16(f as u16),
            UintWidth::U32 => Scalar::U32(f as u32),
            UintWidth::U64 => Scalar::U64(f as u64),
            UintWidth::U128 => Scalar::U128(f as u128),
            UintWidth::Usize => Scalar::Usize(f as usize),
        }
    }

    fn float(width: FloatWidth, f: f64) -> Scalar {
        match width {
            FloatWidth::F32 => Scalar::F32(f as f32),
            FloatWidth::F64 => Scalar::F64(f),
        }
    }
}

fn mismatch(shape: &'static Shape, value: &Value) -> FieldErrorKind {
    FieldErrorKind::TypeMismatch {
        expected: shape,
        got: value.value_type(),
        value: value.to_string(),
    }
}

fn parse_failure(target: &'static str, input: &str, reason: &'static str) -> FieldErrorKind {
    FieldErrorKind::ParseFailure {
        target,
        input: input.to_owned(),
        reason,
    }
}

pub(crate) fn to_bool(value: &Value, shape: &'static Shape, weak: bool) -> Result<Scalar, FieldErrorKind> {
    let b = match value {
        Value::Bool(b) => *b,
        Value::Int(i) if weak => *i != 0,
        Value::Uint(u) if weak => *u != 0,
        Value::Float(f) if weak => *f != 0.0,
        Value::String(s) if weak => match parse_bool(s) {
            Some(b) => b,
            None if s.is_empty() => false,
            None => return Err(parse_failure("bool", s, INVALID_SYNTAX)),
        },
        _ => return Err(mismatch(shape, value)),
    };
    Ok(Scalar::Bool(b))
}

pub(crate) fn to_string(value: &Value, shape: &'static Shape, weak: bool) -> Result<Scalar, FieldErrorKind> {
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) if weak => (if *b { "1" } else { "0" }).to_owned(),
        Value::Int(i) if weak => i.to_string(),
        Value::Uint(u) if weak => u.to_string(),
        Value::Float(f) if weak => format_float(*f),
        Value::Bytes(bytes) if weak => match String::from_utf8(bytes.clone()) {
            Ok(s) => s,
            Err(_) => {
                return Err(parse_failure(
                    "string",
                    &String::from_utf8_lossy(bytes),
                    "invalid utf-8",
                ));
            }
        },
        _ => return Err(mismatch(shape, value)),
    };
    Ok(Scalar::String(s))
}

pub(crate) fn to_int(
    value: &Value,
    shape: &'static Shape,
    width: IntWidth,
    weak: bool,
) -> Result<Scalar, FieldErrorKind> {
    let overflow = |repr: String| FieldErrorKind::Overflow {
        value: repr,
        target: width.name(),
    };
    let checked = |v: i128| {
        if weak || width.contains(v) {
            Ok(Scalar::int(width, v))
        } else {
            Err(overflow(v.to_string()))
        }
    };

    match value {
        Value::Int(i) => checked(i128::from(*i)),
        Value::Uint(u) => checked(i128::from(*u)),
        Value::Float(f) if weak => Ok(Scalar::int_from_float(width, *f)),
        Value::Float(f) => {
            let t = f.trunc();
            // 2^127 is exactly representable; anything at or beyond it does not fit an i128
            if t.is_finite() && t >= -(2f64.powi(127)) && t < 2f64.powi(127) {
                checked(t as i128).map_err(|_| overflow(f.to_string()))
            } else {
                Err(overflow(f.to_string()))
            }
        }
        Value::Bool(b) if weak => Ok(Scalar::int(width, i128::from(*b))),
        Value::String(s) if weak => parse_int(s, width.bits())
            .map(|v| Scalar::int(width, v))
            .map_err(|reason| parse_failure(width.name(), s, reason)),
        _ => Err(mismatch(shape, value)),
    }
}

pub(crate) fn to_uint(
    value: &Value,
    shape: &'static Shape,
    width: UintWidth,
    weak: bool,
) -> Result<Scalar, FieldErrorKind> {
    let overflow = |repr: String| FieldErrorKind::Overflow {
        value: repr,
        target: width.name(),
    };
    let checked = |v: u128| {
        if weak || v <= width.max() {
            Ok(Scalar::uint(width, v))
        } else {
            Err(overflow(v.to_string()))
        }
    };

    match value {
        Value::Uint(u) => checked(u128::from(*u)),
        Value::Int(i) if weak => Ok(Scalar::uint(width, *i as u128)),
        Value::Int(i) => match u128::try_from(*i) {
            Ok(v) => checked(v),
            Err(_) => Err(overflow(i.to_string())),
        },
        Value::Float(f) if weak => Ok(Scalar::uint_from_float(width, *f)),
        Value::Float(f) => {
            let t = f.trunc();
            if t.is_finite() && t >= 0.0 && t < 2f64.powi(128) {
                checked(t as u128).map_err(|_| overflow(f.to_string()))
            } else {
                Err(overflow(f.to_string()))
            }
        }
        Value::Bool(b) if weak => Ok(Scalar::uint(width, u128::from(*b))),
        Value::String(s) if weak => parse_uint(s, width.bits())
            .map(|v| Scalar::uint(width, v))
            .map_err(|reason| parse_failure(width.name(), s, reason)),
        _ => Err(mismatch(shape, value)),
    }
}

pub(crate) fn to_float(
    value: &Value,
    shape: &'static Shape,
    width: FloatWidth,
    weak: bool,
) -> Result<Scalar, FieldErrorKind> {
    let f = match value {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f64,
        Value::Uint(u) => *u as f64,
        Value::Bool(b) if weak => f64::from(u8::from(*b)),
        Value::String(s) if weak => {
            parse_float(s, width).map_err(|reason| parse_failure(width.name(), s, reason))?
        }
        _ => return Err(mismatch(shape, value)),
    };
    Ok(Scalar::float(width, f))
}

/// Parses a boolean literal: `1 t T TRUE true True` and `0 f F FALSE false False`.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parses a signed integer literal that must fit in `bits` bits.
///
/// The base is taken from the prefix (`0x`, `0o`, `0b`, or a bare leading `0` for octal);
/// underscores may separate digits only when a prefix is present.
pub(crate) fn parse_int(s: &str, bits: u32) -> Result<i128, &'static str> {
    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = parse_magnitude(body)?;
    let limit = 1u128 << (bits - 1);
    if negative {
        if magnitude > limit {
            return Err(OUT_OF_RANGE);
        }
        // -(2^127) is the one magnitude that does not fit positively
        Ok(0i128.wrapping_sub_unsigned(magnitude))
    } else if magnitude >= limit {
        Err(OUT_OF_RANGE)
    } else {
        Ok(magnitude as i128)
    }
}

/// Parses an unsigned integer literal that must fit in `bits` bits. Signs are rejected.
pub(crate) fn parse_uint(s: &str, bits: u32) -> Result<u128, &'static str> {
    let magnitude = parse_magnitude(s)?;
    let max = if bits == 128 { u128::MAX } else { (1u128 << bits) - 1 };
    if magnitude > max {
        return Err(OUT_OF_RANGE);
    }
    Ok(magnitude)
}

fn parse_magnitude(s: &str) -> Result<u128, &'static str> {
    let prefixed = |p: &str| {
        s.get(..2)
            .filter(|head| head.eq_ignore_ascii_case(p))
            .map(|_| &s[2..])
    };
    let (base, digits, zero_allowed) = if let Some(rest) = prefixed("0x") {
        (16, rest, false)
    } else if let Some(rest) = prefixed("0o") {
        (8, rest, false)
    } else if let Some(rest) = prefixed("0b") {
        (2, rest, false)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..], true)
    } else {
        (10, s, false)
    };
    let has_prefix = base != 10;

    if digits.is_empty() && !(zero_allowed || s == "0") {
        return Err(INVALID_SYNTAX);
    }
    if digits.contains('_') && (!has_prefix || digits.ends_with('_') || digits.contains("__")) {
        return Err(INVALID_SYNTAX);
    }

    let mut n: u128 = 0;
    let mut seen_digit = false;
    for c in digits.chars() {
        if c == '_' {
            continue;
        }
        let d = c.to_digit(base).ok_or(INVALID_SYNTAX)?;
        seen_digit = true;
        n = n
            .checked_mul(u128::from(base))
            .and_then(|n| n.checked_add(u128::from(d)))
            .ok_or(OUT_OF_RANGE)?;
    }
    if !seen_digit && !zero_allowed && s != "0" {
        return Err(INVALID_SYNTAX);
    }
    Ok(n)
}

/// Shortest decimal that round-trips, never in exponent form.
/// Parses a float literal for a `width`-bit target.
///
/// Accepts decimal literals, hexadecimal ones with a binary exponent (`0x1.8p3`, underscores
/// allowed between digits), and `inf`, `infinity` or `nan` in any case. A finite literal whose
/// magnitude does not fit the width is out of range.
pub(crate) fn parse_float(s: &str, width: FloatWidth) -> Result<f64, &'static str> {
    let (negative, signed, body) = match s.as_bytes().first() {
        Some(b'-') => (true, true, &s[1..]),
        Some(b'+') => (false, true, &s[1..]),
        _ => (false, false, s),
    };

    let magnitude = if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
        return Ok(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    } else if body.eq_ignore_ascii_case("nan") && !signed {
        return Ok(f64::NAN);
    } else if let Some(hex) = body
        .get(..2)
        .filter(|head| head.eq_ignore_ascii_case("0x"))
        .map(|_| &body[2..])
    {
        let magnitude = parse_hex_float(hex)?;
        match width {
            FloatWidth::F32 => f64::from(magnitude as f32),
            FloatWidth::F64 => magnitude,
        }
    } else if body.starts_with(['+', '-'])
        || !body.chars().all(|c| c.is_ascii_digit() || ".eE+-".contains(c))
    {
        return Err(INVALID_SYNTAX);
    } else {
        match width {
            FloatWidth::F32 => body.parse::<f32>().map(f64::from),
            FloatWidth::F64 => body.parse::<f64>(),
        }
        .map_err(|_| INVALID_SYNTAX)?
    };

    if magnitude.is_infinite() {
        return Err(OUT_OF_RANGE);
    }
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parses the part of a hexadecimal float literal after `0x`: hex digits with an optional
/// point, then a mandatory `p` exponent.
fn parse_hex_float(s: &str) -> Result<f64, &'static str> {
    let (mantissa, exponent) = s.split_once(['p', 'P']).ok_or(INVALID_SYNTAX)?;
    if mantissa.ends_with('_') || mantissa.contains("__") {
        return Err(INVALID_SYNTAX);
    }
    let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(INVALID_SYNTAX);
    }
    // saturates; anything this large overflows or underflows anyway
    let saturated = if exponent.starts_with('-') { -1 << 32 } else { 1 << 32 };
    let mut exp: i64 = exponent.parse().unwrap_or(saturated);

    let mut bits: u128 = 0;
    let mut sticky = false;
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in mantissa.chars() {
        match c {
            '_' => {}
            '.' if !seen_point => seen_point = true,
            _ => {
                let digit = c.to_digit(16).ok_or(INVALID_SYNTAX)?;
                seen_digit = true;
                if bits >> 120 == 0 {
                    bits = bits << 4 | u128::from(digit);
                    if seen_point {
                        exp -= 4;
                    }
                } else {
                    sticky |= digit != 0;
                    if !seen_point {
                        exp += 4;
                    }
                }
            }
        }
    }
    if !seen_digit {
        return Err(INVALID_SYNTAX);
    }
    // far below the rounding bit, so it only breaks ties
    if sticky {
        bits |= 1;
    }

    let mut x = bits as f64;
    let mut exp = exp.clamp(-5000, 5000) as i32;
    while exp != 0 && x != 0.0 && x.is_finite() {
        let step = exp.clamp(-1000, 1000);
        x *= 2f64.powi(step);
        exp -= step;
    }
    Ok(x)
}

pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_owned()
    } else if f.is_infinite() {
        (if f > 0.0 { "+Inf" } else { "-Inf" }).to_owned()
    } else {
        f.to_string()
    }
}
