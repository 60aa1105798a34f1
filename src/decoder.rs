//! The decode orchestrator: configuration, kind dispatch, and the composite handlers.

use facet_core::{Def, Facet, Shape};
use facet_reflect::{Partial, Peek};

use crate::coerce;
use crate::error::{ConfigError, DecodeError, DecodeErrorKind, FieldError, FieldErrorKind};
use crate::kind::Target;
use crate::slot::Slot;
use crate::{DecodeHook, FieldPath, Metadata, Value};

/// The tag attribute read when [`DecoderConfig::tag_name`] is empty.
pub const DEFAULT_TAG_NAME: &str = "mapstructure";

/// Options for one [`Decoder`].
#[derive(Debug, Default)]
pub struct DecoderConfig<'m> {
    /// Called on every source value before it is dispatched. An error aborts the decode.
    pub decode_hook: Option<DecodeHook>,

    /// Fail when a source mapping has keys that no record field consumed.
    pub error_unused: bool,

    /// Empty a map before decoding entries into it, instead of merging them into the entries it
    /// already holds.
    pub zero_fields: bool,

    /// Enable lossy conversions between scalars (`"42"` into an integer, `true` into `"1"`, ...).
    pub weakly_typed_input: bool,

    /// Where to record used paths and unused keys.
    pub metadata: Option<&'m mut Metadata>,

    /// The facet attribute holding field tags, as in `#[facet(mapstructure = "name,squash")]`.
    pub tag_name: String,
}

/// Decodes [`Value`] trees into one target.
#[derive(Debug)]
pub struct Decoder<'a, 'm, T> {
    config: DecoderConfig<'m>,
    target: &'a mut T,
}

impl<'a, 'm, T> Decoder<'a, 'm, T> {
    /// Binds a configuration to a target, checking that the target type can be decoded into.
    pub fn new<'facet>(mut config: DecoderConfig<'m>, target: &'a mut T) -> Result<Self, DecodeError>
    where
        T: Facet<'facet>,
    {
        let shape = T::SHAPE;
        if let Target::Unsupported = Target::describe(shape) {
            return Err(match shape.def {
                Def::Pointer(_) => ConfigError::NotWritable { shape },
                _ => ConfigError::NotAddressable { shape },
            }
            .into());
        }

        if config.tag_name.is_empty() {
            config.tag_name = DEFAULT_TAG_NAME.to_owned();
        }

        Ok(Self { config, target })
    }

    /// Returns the configuration this decoder was built with.
    pub fn config(&self) -> &DecoderConfig<'m> {
        &self.config
    }

    /// Decodes `input` into the bound target.
    ///
    /// Only the locations the input reaches are written: fields without a source key, and
    /// fields whose value fails to decode, keep what they held. Field failures do not stop the
    /// decode; they are returned together as [`DecodeErrorKind::Fields`]. A [`Value::Null`]
    /// input, or a root value that fails to decode entirely, leaves the target untouched.
    pub fn decode<'facet>(&mut self, input: &Value) -> Result<(), DecodeError>
    where
        T: Facet<'facet>,
    {
        log::trace!("Decoding into {}", T::SHAPE);

        let config = &mut self.config;
        let mut session = Session {
            hook: config.decode_hook.as_ref(),
            error_unused: config.error_unused,
            zero_fields: config.zero_fields,
            weak: config.weakly_typed_input,
            tag_name: &config.tag_name,
            metadata: config.metadata.as_deref_mut(),
            errors: Vec::new(),
        };
        let slot = session.decode(&FieldPath::root(), input, T::SHAPE)?;
        let errors = session.errors;

        if !matches!(slot, Slot::Keep) {
            let mut typed_partial = Partial::alloc::<T>()?;
            slot.write(typed_partial.inner_mut(), Some(Peek::new(&*self.target)))?;
            let boxed_value = typed_partial.build()?;
            log::trace!("Target rebuilt");
            *self.target = *boxed_value;
        }

        if errors.is_empty() {
            Ok(())
        } else {
            log::debug!("{} field(s) failed to decode", errors.len());
            Err(errors.into())
        }
    }
}

/// State for one call to [`Decoder::decode`].
pub(crate) struct Session<'c> {
    hook: Option<&'c DecodeHook>,
    pub(crate) error_unused: bool,
    zero_fields: bool,
    weak: bool,
    pub(crate) tag_name: &'c str,
    pub(crate) metadata: Option<&'c mut Metadata>,
    errors: Vec<FieldError>,
}

impl Session<'_> {
    /// Decodes `value` into a location of type `shape`. Only hook failures are returned as
    /// errors; everything else is collected and reported at the end.
    pub(crate) fn decode(
        &mut self,
        path: &FieldPath,
        value: &Value,
        shape: &'static Shape,
    ) -> Result<Slot, DecodeError> {
        let hooked;
        let value = match (value, self.hook) {
            (Value::Null, _) => return Ok(Slot::Keep),
            (Value::Invalid, _) => return Ok(Slot::Zero),
            (value, None) => value,
            (value, Some(hook)) => {
                hooked = hook
                    .call(value, shape)
                    .map_err(|source| DecodeErrorKind::Hook {
                        path: path.clone(),
                        source,
                    })?;
                match &hooked {
                    None => value,
                    Some(Value::Null) => return Ok(Slot::Keep),
                    Some(Value::Invalid) => return Ok(Slot::Zero),
                    Some(replaced) => replaced,
                }
            }
        };

        let target = Target::describe(shape);
        if let Target::Unsupported = target {
            self.fail(path, FieldErrorKind::Unsupported { shape });
            return Ok(Slot::Keep);
        }

        let slot = self.dispatch(path, value, shape, target)?;

        // recorded even when the handler failed
        if !path.is_root() {
            if let Some(metadata) = self.metadata.as_deref_mut() {
                metadata.keys.push(path.to_string());
            }
        }

        Ok(slot)
    }

    fn dispatch(
        &mut self,
        path: &FieldPath,
        value: &Value,
        shape: &'static Shape,
        target: Target,
    ) -> Result<Slot, DecodeError> {
        log::trace!("Dispatching {} into {shape} ({:?}) at '{path}'", value.value_type(), target.kind());
        let weak = self.weak;
        let scalar = match target {
            Target::Bool => coerce::to_bool(value, shape, weak),
            Target::String => coerce::to_string(value, shape, weak),
            Target::Int(width) => coerce::to_int(value, shape, width, weak),
            Target::Uint(width) => coerce::to_uint(value, shape, width, weak),
            Target::Float(width) => coerce::to_float(value, shape, width, weak),
            Target::Passthrough => return Ok(Slot::Value(value.clone())),
            Target::Optional(inner) => return self.decode_optional(path, value, inner, Slot::Some),
            Target::Pointer(inner) => {
                return self.decode_optional(path, value, inner, Slot::Pointer);
            }
            Target::Transparent(inner) => {
                let slot = self.dispatch(path, value, inner, Target::describe(inner))?;
                return Ok(match slot {
                    Slot::Keep => Slot::Keep,
                    slot => Slot::Inner(Box::new(slot)),
                });
            }
            Target::Sequence(element) => return self.decode_sequence(path, value, element),
            Target::Mapping { key, value: item } => {
                return self.decode_mapping(path, value, shape, key, item);
            }
            Target::Record(fields) => return self.decode_record(path, value, fields),
            Target::Unsupported => Err(FieldErrorKind::Unsupported { shape }),
        };

        Ok(match scalar {
            Ok(scalar) => Slot::Scalar(scalar),
            Err(kind) => {
                self.fail(path, kind);
                Slot::Keep
            }
        })
    }

    pub(crate) fn fail(&mut self, path: &FieldPath, kind: FieldErrorKind) {
        log::debug!("Field error at '{path}': {kind:?}");
        self.errors.push(FieldError {
            path: path.clone(),
            kind,
        });
    }

    pub(crate) fn error_count(&self) -> usize {
        self.errors.len()
    }

    fn decode_optional(
        &mut self,
        path: &FieldPath,
        value: &Value,
        inner: &'static Shape,
        wrap: fn(Box<Slot>) -> Slot,
    ) -> Result<Slot, DecodeError> {
        let before = self.error_count();
        let slot = self.decode(path, value, inner)?;
        if self.error_count() > before {
            return Ok(Slot::Keep);
        }
        Ok(wrap(Box::new(slot)))
    }

    fn decode_sequence(
        &mut self,
        path: &FieldPath,
        value: &Value,
        element: &'static Shape,
    ) -> Result<Slot, DecodeError> {
        let bytes;
        let items = match value {
            Value::Sequence(items) => items.as_slice(),
            Value::Bytes(raw) => {
                bytes = raw
                    .iter()
                    .map(|b| Value::Uint(u64::from(*b)))
                    .collect::<Vec<_>>();
                bytes.as_slice()
            }
            Value::Mapping(m) if self.weak && m.is_empty() => {
                log::debug!("Empty mapping accepted as an empty sequence at '{path}'");
                &[][..]
            }
            _ => {
                self.fail(
                    path,
                    FieldErrorKind::ShapeMismatch {
                        expected: "a sequence",
                        got: format!("'{}'", value.value_type()),
                    },
                );
                return Ok(Slot::Keep);
            }
        };

        let mut slots = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            slots.push(self.decode(&path.index(index), item, element)?);
        }
        Ok(Slot::Sequence(slots))
    }

    fn decode_mapping(
        &mut self,
        path: &FieldPath,
        value: &Value,
        shape: &'static Shape,
        key_shape: &'static Shape,
        value_shape: &'static Shape,
    ) -> Result<Slot, DecodeError> {
        match value {
            Value::Mapping(mapping) => {
                let mut entries = Vec::with_capacity(mapping.len());
                for (key, item) in mapping.iter() {
                    let entry_path = path.key(key);
                    let before = self.error_count();

                    let key = self.decode(&entry_path, key, key_shape)?;
                    if self.error_count() > before {
                        continue;
                    }
                    let item = self.decode(&entry_path, item, value_shape)?;
                    if self.error_count() > before {
                        continue;
                    }
                    entries.push((key, item));
                }
                Ok(Slot::Mapping {
                    entries,
                    fresh: self.zero_fields,
                })
            }
            Value::Sequence(items) if self.weak => {
                log::debug!("Merging {} mappings at '{path}'", items.len());
                let mut merged = Vec::new();
                let mut fresh = self.zero_fields;
                for (index, item) in items.iter().enumerate() {
                    let before = self.error_count();
                    match self.decode(&path.index(index), item, shape)? {
                        Slot::Mapping { entries, fresh: true } => {
                            merged = entries;
                            fresh = true;
                        }
                        Slot::Mapping { entries, .. } => merged.extend(entries),
                        Slot::Zero => {
                            merged.clear();
                            fresh = true;
                        }
                        _ => {}
                    }
                    if self.error_count() > before {
                        break;
                    }
                }
                Ok(Slot::Mapping {
                    entries: merged,
                    fresh,
                })
            }
            _ => {
                self.fail(
                    path,
                    FieldErrorKind::ShapeMismatch {
                        expected: "a mapping",
                        got: format!("'{}'", value.value_type()),
                    },
                );
                Ok(Slot::Keep)
            }
        }
    }
}

/// Decodes `input` into `target` with default, strict settings.
pub fn decode<'facet, T: Facet<'facet>>(input: &Value, target: &mut T) -> Result<(), DecodeError> {
    Decoder::new(DecoderConfig::default(), target)?.decode(input)
}

/// Like [`decode`], with [`DecoderConfig::weakly_typed_input`] enabled.
pub fn weak_decode<'facet, T: Facet<'facet>>(
    input: &Value,
    target: &mut T,
) -> Result<(), DecodeError> {
    let config = DecoderConfig {
        weakly_typed_input: true,
        ..Default::default()
    };
    Decoder::new(config, target)?.decode(input)
}

/// Like [`decode`], also recording used paths and unused keys into `metadata`.
pub fn decode_metadata<'facet, T: Facet<'facet>>(
    input: &Value,
    target: &mut T,
    metadata: &mut Metadata,
) -> Result<(), DecodeError> {
    let config = DecoderConfig {
        metadata: Some(metadata),
        ..Default::default()
    };
    Decoder::new(config, target)?.decode(input)
}
