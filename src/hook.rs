use std::{error::Error, fmt};

use facet_core::Shape;

use crate::{Kind, Value, ValueType};

/// What a [`DecodeHook`] returns.
///
/// `Ok(None)` decodes the original value unchanged, and `Ok(Some(value))` decodes `value` in its
/// place. Replacing it with [`Value::Null`] makes the current target a no-op. An `Err` aborts the
/// whole decode.
pub type HookResult = Result<Option<Value>, Box<dyn Error + Send + Sync>>;

type TypeHookFn = dyn Fn(ValueType, &'static Shape, &Value) -> HookResult;
type KindHookFn = dyn Fn(Kind, Kind, &Value) -> HookResult;

/// A transform run on every source value before it is dispatched.
///
/// ```
/// use facet_mapstructure::{DecodeHook, Kind, Value};
///
/// // Accept comma-separated strings wherever a sequence is expected.
/// let hook = DecodeHook::from_kind(|from, to, value| {
///     Ok(match (from, to, value) {
///         (Kind::String, Kind::Sequence, Value::String(s)) => {
///             Some(Value::Sequence(s.split(',').map(Value::from).collect()))
///         }
///         _ => None,
///     })
/// });
/// # let _ = hook;
/// ```
pub enum DecodeHook {
    /// Receives the source's runtime type and the target's full shape.
    Type(Box<TypeHookFn>),
    /// Receives only the canonical kinds of source and target.
    Kind(Box<KindHookFn>),
}

impl DecodeHook {
    /// Builds a hook keyed on the source type and target shape.
    pub fn from_type<F>(f: F) -> Self
    where
        F: Fn(ValueType, &'static Shape, &Value) -> HookResult + 'static,
    {
        DecodeHook::Type(Box::new(f))
    }

    /// Builds a hook keyed on the canonical kinds of source and target.
    pub fn from_kind<F>(f: F) -> Self
    where
        F: Fn(Kind, Kind, &Value) -> HookResult + 'static,
    {
        DecodeHook::Kind(Box::new(f))
    }

    pub(crate) fn call(&self, value: &Value, target: &'static Shape) -> HookResult {
        match self {
            DecodeHook::Type(f) => f(value.value_type(), target, value),
            DecodeHook::Kind(f) => f(value.kind(), Kind::of(target), value),
        }
    }
}

impl fmt::Debug for DecodeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeHook::Type(_) => f.write_str("DecodeHook::Type(..)"),
            DecodeHook::Kind(_) => f.write_str("DecodeHook::Kind(..)"),
        }
    }
}
