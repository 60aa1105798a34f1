//! Collapses facet shapes into the handful of categories the decoder dispatches on.

use std::fmt::{self, Display};

use facet::Facet;
use facet_core::{Def, Field, KnownPointer, Shape, StructKind, Type, UserType};

use crate::Value;

/// The canonical category of a type or value, with width and signedness variants collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Absent, uninitialised, or not decodable.
    Invalid,
    /// `bool`
    Bool,
    /// `String`
    String,
    /// Any signed integer width.
    Int,
    /// Any unsigned integer width.
    Uint,
    /// `f32` or `f64`.
    Float,
    /// `Vec<T>` or any sequence-shaped value.
    Sequence,
    /// `HashMap`/`BTreeMap` or any mapping-shaped value.
    Mapping,
    /// `Option<T>` and owning smart pointers.
    Optional,
    /// A struct with named fields.
    Record,
    /// A [`Value`] field, which accepts any source unchanged.
    Passthrough,
}

impl Kind {
    /// Normalizes a target shape to its canonical kind.
    pub fn of(shape: &'static Shape) -> Kind {
        Target::describe(shape).kind()
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Invalid => "invalid",
            Kind::Bool => "bool",
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::Sequence => "sequence",
            Kind::Mapping => "mapping",
            Kind::Optional => "optional",
            Kind::Record => "record",
            Kind::Passthrough => "passthrough",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
}

impl IntWidth {
    pub(crate) fn bits(self) -> u32 {
        match self {
            IntWidth::I8 => 8,
            IntWidth::I16 => 16,
            IntWidth::I32 => 32,
            IntWidth::I64 => 64,
            IntWidth::I128 => 128,
            IntWidth::Isize => isize::BITS,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            IntWidth::I8 => "i8",
            IntWidth::I16 => "i16",
            IntWidth::I32 => "i32",
            IntWidth::I64 => "i64",
            IntWidth::I128 => "i128",
            IntWidth::Isize => "isize",
        }
    }

    pub(crate) fn contains(self, v: i128) -> bool {
        let bits = self.bits();
        if bits == 128 {
            return true;
        }
        let max = (1i128 << (bits - 1)) - 1;
        let min = -(1i128 << (bits - 1));
        (min..=max).contains(&v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UintWidth {
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
}

impl UintWidth {
    pub(crate) fn bits(self) -> u32 {
        match self {
            UintWidth::U8 => 8,
            UintWidth::U16 => 16,
            UintWidth::U32 => 32,
            UintWidth::U64 => 64,
            UintWidth::U128 => 128,
            UintWidth::Usize => usize::BITS,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            UintWidth::U8 => "u8",
            UintWidth::U16 => "u16",
            UintWidth::U32 => "u32",
            UintWidth::U64 => "u64",
            UintWidth::U128 => "u128",
            UintWidth::Usize => "usize",
        }
    }

    pub(crate) fn max(self) -> u128 {
        match self.bits() {
            128 => u128::MAX,
            bits => (1u128 << bits) - 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub(crate) fn name(self) -> &'static str {
        match self {
            FloatWidth::F32 => "f32",
            FloatWidth::F64 => "f64",
        }
    }
}

/// What the decoder knows about a destination, derived once per dispatch from its shape.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target {
    Bool,
    String,
    Int(IntWidth),
    Uint(UintWidth),
    Float(FloatWidth),
    Passthrough,
    Optional(&'static Shape),
    Pointer(&'static Shape),
    /// `#[facet(transparent)]` newtypes decode as their inner type.
    Transparent(&'static Shape),
    Sequence(&'static Shape),
    Mapping {
        key: &'static Shape,
        value: &'static Shape,
    },
    Record(&'static [Field]),
    Unsupported,
}

impl Target {
    pub(crate) fn describe(shape: &'static Shape) -> Target {
        if shape == Value::SHAPE {
            return Target::Passthrough;
        }

        match shape.def {
            Def::Option(opt) => return Target::Optional(opt.t),
            Def::Pointer(ptr) => {
                return match (ptr.known, ptr.pointee()) {
                    (
                        Some(KnownPointer::Box | KnownPointer::Rc | KnownPointer::Arc),
                        Some(pointee),
                    ) => Target::Pointer(pointee),
                    _ => Target::Unsupported,
                };
            }
            Def::List(list) => return Target::Sequence(list.t()),
            Def::Map(map) => {
                return Target::Mapping {
                    key: map.k(),
                    value: map.v(),
                };
            }
            _ => {}
        }

        let scalar = match shape.type_identifier {
            "bool" => Some(Target::Bool),
            "String" => Some(Target::String),
            "i8" => Some(Target::Int(IntWidth::I8)),
            "i16" => Some(Target::Int(IntWidth::I16)),
            "i32" => Some(Target::Int(IntWidth::I32)),
            "i64" => Some(Target::Int(IntWidth::I64)),
            "i128" => Some(Target::Int(IntWidth::I128)),
            "isize" => Some(Target::Int(IntWidth::Isize)),
            "u8" => Some(Target::Uint(UintWidth::U8)),
            "u16" => Some(Target::Uint(UintWidth::U16)),
            "u32" => Some(Target::Uint(UintWidth::U32)),
            "u64" => Some(Target::Uint(UintWidth::U64)),
            "u128" => Some(Target::Uint(UintWidth::U128)),
            "usize" => Some(Target::Uint(UintWidth::Usize)),
            "f32" => Some(Target::Float(FloatWidth::F32)),
            "f64" => Some(Target::Float(FloatWidth::F64)),
            _ => None,
        };
        if let Some(scalar) = scalar {
            return scalar;
        }

        if let Some(inner) = shape.inner {
            return Target::Transparent(inner());
        }

        match &shape.ty {
            Type::User(UserType::Struct(struct_type)) if struct_type.kind == StructKind::Struct => {
                Target::Record(struct_type.fields)
            }
            _ => Target::Unsupported,
        }
    }

    pub(crate) fn kind(&self) -> Kind {
        match self {
            Target::Bool => Kind::Bool,
            Target::String => Kind::String,
            Target::Int(_) => Kind::Int,
            Target::Uint(_) => Kind::Uint,
            Target::Float(_) => Kind::Float,
            Target::Passthrough => Kind::Passthrough,
            Target::Optional(_) | Target::Pointer(_) => Kind::Optional,
            Target::Transparent(inner) => Kind::of(inner),
            Target::Sequence(_) => Kind::Sequence,
            Target::Mapping { .. } => Kind::Mapping,
            Target::Record(_) => Kind::Record,
            Target::Unsupported => Kind::Invalid,
        }
    }
}
