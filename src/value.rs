//! The dynamic value tree consumed by the decoder.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use facet::Facet;
use indexmap::{Equivalent, IndexMap};

use crate::Kind;

/// A loosely-typed value, as produced by a config parser or an untyped payload decoder.
///
/// The decoder never mutates a `Value`; it only reads it. A record field of type `Value`
/// accepts any source unchanged.
///
/// Floats compare by value with `0.0 == -0.0`, and a NaN equals a NaN with the same bits, so
/// any `Value` can be a [`Mapping`] key.
#[derive(Debug, Clone, Default, Facet)]
#[repr(u8)]
pub enum Value {
    /// An absent value. Decoding it is a no-op: the target keeps its current state.
    #[default]
    Null,
    /// An explicitly uninitialised value. Decoding it resets the target to its default.
    Invalid,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    Uint(u64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// An ordered sequence of values.
    Sequence(Vec<Value>),
    /// A key-value mapping.
    Mapping(Mapping),
}

/// The concrete runtime type of a [`Value`], handed to type-keyed decode hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// [`Value::Null`]
    Null,
    /// [`Value::Invalid`]
    Invalid,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::Uint`]
    Uint,
    /// [`Value::Float`]
    Float,
    /// [`Value::String`]
    String,
    /// [`Value::Bytes`]
    Bytes,
    /// [`Value::Sequence`]
    Sequence,
    /// [`Value::Mapping`]
    Mapping,
}

impl ValueType {
    /// The canonical kind this runtime type collapses to.
    pub fn kind(self) -> Kind {
        match self {
            ValueType::Null | ValueType::Invalid => Kind::Invalid,
            ValueType::Bool => Kind::Bool,
            ValueType::Int => Kind::Int,
            ValueType::Uint => Kind::Uint,
            ValueType::Float => Kind::Float,
            ValueType::String => Kind::String,
            ValueType::Bytes | ValueType::Sequence => Kind::Sequence,
            ValueType::Mapping => Kind::Mapping,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Invalid => "invalid",
            ValueType::Bool => "bool",
            ValueType::Int => "i64",
            ValueType::Uint => "u64",
            ValueType::Float => "f64",
            ValueType::String => "string",
            ValueType::Bytes => "bytes",
            ValueType::Sequence => "sequence",
            ValueType::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Returns the runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Invalid => ValueType::Invalid,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Uint(_) => ValueType::Uint,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Sequence(_) => ValueType::Sequence,
            Value::Mapping(_) => ValueType::Mapping,
        }
    }

    /// Returns the canonical kind of this value.
    pub fn kind(&self) -> Kind {
        self.value_type().kind()
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string slice if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the mapping if this is a [`Value::Mapping`].
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`Value::Sequence`].
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

/// Bits of a float used for equality and hashing, with both zeroes folded together.
fn float_key(x: f64) -> u64 {
    if x == 0.0 { 0 } else { x.to_bits() }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Invalid, Value::Invalid) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_key(*a) == float_key(*b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Hash tag of [`Value::String`], shared with [`StrKey`].
const STRING_TAG: u8 = 6;

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Invalid => 1u8.hash(state),
            Value::Bool(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            Value::Int(i) => {
                3u8.hash(state);
                i.hash(state);
            }
            Value::Uint(u) => {
                4u8.hash(state);
                u.hash(state);
            }
            Value::Float(x) => {
                5u8.hash(state);
                float_key(*x).hash(state);
            }
            Value::String(s) => StrKey(s).hash(state),
            Value::Bytes(bytes) => {
                7u8.hash(state);
                bytes.hash(state);
            }
            Value::Sequence(items) => {
                8u8.hash(state);
                items.hash(state);
            }
            // order-insensitive, like `PartialEq`
            Value::Mapping(mapping) => {
                9u8.hash(state);
                mapping.len().hash(state);
            }
        }
    }
}

/// Looks up a [`Value::String`] key without allocating.
struct StrKey<'a>(&'a str);

impl Hash for StrKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        STRING_TAG.hash(state);
        self.0.hash(state);
    }
}

impl Equivalent<Value> for StrKey<'_> {
    fn equivalent(&self, key: &Value) -> bool {
        key.as_str() == Some(self.0)
    }
}

/// Renders scalars bare (strings without quotes), which is how map keys appear in field paths.
impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Invalid => f.write_str("invalid"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Bytes(bytes) => write!(f, "{bytes:?}"),
            Value::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Mapping(mapping) => {
                f.write_str("map[")?;
                for (i, (k, v)) in mapping.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// An insertion-ordered mapping from [`Value`] keys to [`Value`]s.
///
/// Inserting an existing key replaces its value in place. Two mappings are equal when they hold
/// the same entries, in any order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Facet)]
pub struct Mapping {
    #[facet(opaque)]
    entries: IndexMap<Value, Value>,
}

impl Mapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty mapping with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry, returning the previous value stored under an equal key.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Looks up the value stored under a string key (exact match).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&StrKey(key))
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter()
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys()
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Mapping {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident as $repr:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v as $repr)
                }
            }
        )*
    };
}

impl_from!(Int as i64: i8, i16, i32, i64, isize);
impl_from!(Uint as u64: u8, u16, u32, u64, usize);
impl_from!(Float as f64: f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(mapping: Mapping) -> Self {
        Value::Mapping(mapping)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Builds a [`Value`] tree with a JSON-like syntax.
///
/// Negative numbers and other multi-token expressions must be parenthesized when nested.
///
/// ```
/// use facet_mapstructure::{value, Value};
///
/// let v = value!({
///     "name": "demo",
///     "ports": [80, 443],
///     "offset": (-3),
///     "extra": null
/// });
/// assert_eq!(v.as_mapping().unwrap().get("name"), Some(&Value::from("demo")));
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Sequence(::std::vec![ $( $crate::value!($elem) ),* ])
    };
    ({ $($key:tt : $val:tt),* $(,)? }) => {
        $crate::Value::Mapping(
            <$crate::Mapping as ::core::iter::FromIterator<($crate::Value, $crate::Value)>>::from_iter([
                $( ($crate::value!($key), $crate::value!($val)) ),*
            ])
        )
    };
    ($other:expr) => {
        $crate::Value::from($other)
    };
}
