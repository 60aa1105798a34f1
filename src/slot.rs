//! The write plan produced by a decode, and how it is replayed into a [`Partial`].
//!
//! A decode builds a new value and moves it into the target. Every location the plan does not
//! reach is copied over from the target's current value, so the result looks as if only the
//! reached locations had been written in place.

use facet_core::{Def, Facet, Field, KnownPointer, Type, UserType};
use facet_reflect::{Partial, Peek, ReflectError};

use crate::coerce::Scalar;
use crate::Value;

/// What to write into one location of the target.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    /// Nothing was decoded here: the location keeps its current value, or takes its default
    /// when there is none.
    Keep,
    /// Explicitly reset to the default.
    Zero,
    Scalar(Scalar),
    /// A [`Value`] field, stored as-is.
    Value(Value),
    Some(Box<Slot>),
    Pointer(Box<Slot>),
    Inner(Box<Slot>),
    Sequence(Vec<Slot>),
    /// Entries in source order, upserted into the entries the map already holds. A `fresh`
    /// map starts out empty instead.
    Mapping {
        entries: Vec<(Slot, Slot)>,
        fresh: bool,
    },
    Record {
        fields: &'static [Field],
        /// One entry per field, by index. `None` means the field was not reached.
        slots: Vec<Option<Slot>>,
    },
}

impl Slot {
    /// Writes the plan at the partial's current location. `existing` is the value that location
    /// held before the decode, if any.
    pub(crate) fn write(
        self,
        partial: &mut Partial<'_>,
        existing: Option<Peek<'_, '_>>,
    ) -> Result<(), ReflectError> {
        match self {
            Slot::Keep => match existing {
                Some(existing) => copy(partial, existing)?,
                None => {
                    partial.set_default()?;
                }
            },
            Slot::Zero => {
                partial.set_default()?;
            }
            Slot::Scalar(scalar) => scalar.write(partial)?,
            Slot::Value(value) => {
                partial.set(value)?;
            }
            Slot::Some(inner) => {
                partial.begin_some()?;
                inner.write(partial, None)?;
                partial.end()?;
            }
            Slot::Pointer(inner) => {
                partial.begin_smart_ptr()?;
                inner.write(partial, None)?;
                partial.end()?;
            }
            Slot::Inner(inner) => {
                partial.begin_inner()?;
                let existing = existing
                    .and_then(|peek| peek.into_struct().ok()?.field(0).ok())
                    .filter(|peek| peek.shape() == partial.shape());
                inner.write(partial, existing)?;
                partial.end()?;
            }
            Slot::Sequence(items) => {
                log::trace!("Writing {} list items at {}", items.len(), partial.path());
                partial.begin_list()?;
                for item in items {
                    partial.begin_list_item()?;
                    item.write(partial, None)?;
                    partial.end()?;
                }
            }
            Slot::Mapping { entries, fresh } => {
                partial.begin_map()?;
                if let Some(existing) = existing.filter(|_| !fresh) {
                    let held = existing.into_map()?;
                    log::trace!("Keeping {} map entries at {}", held.len(), partial.path());
                    copy_entries(partial, held.iter())?;
                }
                log::trace!("Writing {} map entries at {}", entries.len(), partial.path());
                for (key, value) in entries {
                    partial.begin_key()?;
                    key.write(partial, None)?;
                    partial.end()?;
                    partial.begin_value()?;
                    value.write(partial, None)?;
                    partial.end()?;
                }
            }
            Slot::Record { fields, .. } if fields.is_empty() => match existing {
                Some(existing) => copy(partial, existing)?,
                None => {
                    partial.set_default()?;
                }
            },
            Slot::Record { fields, slots } => {
                let existing = existing.and_then(|peek| peek.into_struct().ok());
                for (idx, (field, slot)) in fields.iter().zip(slots).enumerate() {
                    let current = existing.and_then(|st| st.field(idx).ok());
                    partial.begin_nth_field(idx)?;
                    match (slot.unwrap_or(Slot::Keep), current) {
                        (Slot::Keep, None) => field_default(partial, field)?,
                        (slot, current) => slot.write(partial, current)?,
                    }
                    partial.end()?;
                }
            }
        }
        Ok(())
    }
}

fn field_default(partial: &mut Partial<'_>, field: &Field) -> Result<(), ReflectError> {
    log::trace!("Setting default for unwritten field: {}", field.name);
    match field.vtable.default_fn {
        Some(default_fn) => partial.set_field_default(default_fn)?,
        None => partial.set_default()?,
    };
    Ok(())
}

fn copy_entries<'mem, 'facet>(
    partial: &mut Partial<'_>,
    entries: impl Iterator<Item = (Peek<'mem, 'facet>, Peek<'mem, 'facet>)>,
) -> Result<(), ReflectError> {
    for (key, value) in entries {
        partial.begin_key()?;
        copy(partial, key)?;
        partial.end()?;
        partial.begin_value()?;
        copy(partial, value)?;
        partial.end()?;
    }
    Ok(())
}

/// Writes a copy of `existing` at the partial's current location.
///
/// `Copy` types are copied bitwise, strings and [`Value`]s are cloned, and containers, structs
/// and enums are rebuilt piece by piece. Anything else takes its default.
fn copy(partial: &mut Partial<'_>, existing: Peek<'_, '_>) -> Result<(), ReflectError> {
    let shape = existing.shape();
    if shape != partial.shape() {
        partial.set_default()?;
        return Ok(());
    }

    if shape.is_copy() {
        partial.set_from_peek(&existing)?;
        return Ok(());
    }
    if shape == Value::SHAPE {
        partial.set(existing.get::<Value>()?.clone())?;
        return Ok(());
    }
    if shape == String::SHAPE {
        partial.set(existing.get::<String>()?.clone())?;
        return Ok(());
    }

    match shape.def {
        Def::Option(_) => {
            match existing.into_option()?.value() {
                Some(inner) => {
                    partial.begin_some()?;
                    copy(partial, inner)?;
                    partial.end()?;
                }
                None => {
                    partial.set_default()?;
                }
            }
            return Ok(());
        }
        Def::Pointer(ptr)
            if matches!(
                ptr.known,
                Some(KnownPointer::Box | KnownPointer::Rc | KnownPointer::Arc)
            ) =>
        {
            let pointee = existing
                .into_pointer()?
                .borrow_inner()
                .filter(|inner| inner.shape().layout.sized_layout().is_ok());
            if let Some(pointee) = pointee {
                partial.begin_smart_ptr()?;
                copy(partial, pointee)?;
                partial.end()?;
                return Ok(());
            }
        }
        Def::List(_) => {
            partial.begin_list()?;
            for item in existing.into_list_like()?.iter() {
                partial.begin_list_item()?;
                copy(partial, item)?;
                partial.end()?;
            }
            return Ok(());
        }
        Def::Array(_) => {
            for (idx, item) in existing.into_list_like()?.iter().enumerate() {
                partial.begin_nth_element(idx)?;
                copy(partial, item)?;
                partial.end()?;
            }
            return Ok(());
        }
        Def::Map(_) => {
            partial.begin_map()?;
            copy_entries(partial, existing.into_map()?.iter())?;
            return Ok(());
        }
        _ => {}
    }

    match &shape.ty {
        Type::User(UserType::Struct(st)) if !st.fields.is_empty() => {
            let existing = existing.into_struct()?;
            for idx in 0..st.fields.len() {
                let field = existing.field(idx).map_err(|_| ReflectError::OperationFailed {
                    shape,
                    operation: "reading a field to keep",
                })?;
                partial.begin_nth_field(idx)?;
                copy(partial, field)?;
                partial.end()?;
            }
            return Ok(());
        }
        Type::User(UserType::Enum(_)) => {
            let existing = existing.into_enum()?;
            if let Ok(variant) = existing.active_variant() {
                partial.select_variant_named(variant.name)?;
                for idx in 0..variant.data.fields.len() {
                    if let Ok(Some(field)) = existing.field(idx) {
                        partial.begin_nth_field(idx)?;
                        copy(partial, field)?;
                        partial.end()?;
                    }
                }
                return Ok(());
            }
        }
        _ => {}
    }

    log::debug!("Cannot copy a {shape} through reflection, resetting it to its default");
    partial.set_default()?;
    Ok(())
}
