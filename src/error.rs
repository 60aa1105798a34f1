use std::{
    error::Error,
    fmt::{self, Display},
};

use facet_core::Shape;
use facet_reflect::ReflectError;

use crate::{FieldPath, ValueType};

/// Error type for decoding.
#[derive(Debug)]
pub struct DecodeError {
    kind: DecodeErrorKind,
}

impl DecodeError {
    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// The per-field failures, if this is an aggregate error. Empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match &self.kind {
            DecodeErrorKind::Fields(errors) => errors,
            _ => &[],
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = &self.kind;
        write!(f, "{kind}")
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            DecodeErrorKind::Hook { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl<K: Into<DecodeErrorKind>> From<K> for DecodeError {
    fn from(value: K) -> Self {
        let kind = value.into();
        DecodeError { kind }
    }
}

/// Detailed classification of decode errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// The decode target is not something a decoder can write into.
    Config(ConfigError),
    /// A decode hook failed. This aborts the whole decode.
    Hook {
        /// Where the hook was invoked.
        path: FieldPath,
        /// What the hook returned.
        source: Box<dyn Error + Send + Sync>,
    },
    /// Error from the reflection system while writing the decoded value.
    Reflect(ReflectError),
    /// One or more fields failed to decode; the rest were written.
    Fields(Vec<FieldError>),
}

impl Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::Config(e) => write!(f, "{e}"),
            DecodeErrorKind::Hook { path, source } => {
                write!(f, "error decoding '{path}': {source}")
            }
            DecodeErrorKind::Reflect(e) => write!(f, "{e}"),
            DecodeErrorKind::Fields(errors) => {
                writeln!(f, "{} error(s) decoding:", errors.len())?;
                for error in errors {
                    write!(f, "\n* {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<ConfigError> for DecodeErrorKind {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ReflectError> for DecodeErrorKind {
    fn from(value: ReflectError) -> Self {
        Self::Reflect(value)
    }
}

impl From<Vec<FieldError>> for DecodeErrorKind {
    fn from(value: Vec<FieldError>) -> Self {
        Self::Fields(value)
    }
}

/// The decode target cannot be written to.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The target is a borrowed reference rather than an owned location.
    NotWritable {
        /// The offending target type.
        shape: &'static Shape,
    },
    /// The target type has no decodable representation.
    NotAddressable {
        /// The offending target type.
        shape: &'static Shape,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotWritable { shape } => {
                write!(f, "result must be an owned, writable location, got {shape}")
            }
            ConfigError::NotAddressable { shape } => {
                write!(f, "result must be addressable, got {shape}")
            }
        }
    }
}

impl Error for ConfigError {}

/// One failure at one location. Collected into [`DecodeErrorKind::Fields`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Where it happened.
    pub path: FieldPath,
    /// What happened.
    pub kind: FieldErrorKind,
}

/// Classification of a single field failure.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FieldErrorKind {
    /// The source's type cannot be converted to the target's in the current mode.
    TypeMismatch {
        /// The target type.
        expected: &'static Shape,
        /// The source's runtime type.
        got: ValueType,
        /// The source, rendered.
        value: String,
    },
    /// A number does not fit the target width.
    Overflow {
        /// The number, rendered.
        value: String,
        /// The target type name.
        target: &'static str,
    },
    /// A string could not be parsed as the target scalar.
    ParseFailure {
        /// The target type name.
        target: &'static str,
        /// The string that failed to parse.
        input: String,
        /// Why it failed.
        reason: &'static str,
    },
    /// A composite target received a source of the wrong shape.
    ShapeMismatch {
        /// What the target needed.
        expected: &'static str,
        /// What it got.
        got: String,
    },
    /// The source mapping had keys no field consumed. Sorted.
    UnusedKeys(Vec<String>),
    /// The target type cannot be decoded into.
    Unsupported {
        /// The target type.
        shape: &'static Shape,
    },
    /// A field marked for flattening is not a struct.
    UnsupportedSquash {
        /// The field's type.
        shape: &'static Shape,
    },
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        match &self.kind {
            FieldErrorKind::TypeMismatch {
                expected,
                got,
                value,
            } => write!(
                f,
                "'{path}' expected type '{expected}', got unconvertible type '{got}', value: '{value}'"
            ),
            FieldErrorKind::Overflow { value, target } => {
                write!(f, "cannot parse '{path}', {value} overflows {target}")
            }
            FieldErrorKind::ParseFailure {
                target,
                input,
                reason,
            } => write!(
                f,
                "cannot parse '{path}' as {target}: parsing \"{input}\": {reason}"
            ),
            FieldErrorKind::ShapeMismatch { expected, got } => {
                write!(f, "'{path}' expected {expected}, got {got}")
            }
            FieldErrorKind::UnusedKeys(keys) => {
                write!(f, "'{path}' has invalid keys: {}", keys.join(", "))
            }
            FieldErrorKind::Unsupported { shape } => {
                write!(f, "{path}: unsupported type: {shape}")
            }
            FieldErrorKind::UnsupportedSquash { shape } => {
                write!(f, "{path}: unsupported type for squash: {shape}")
            }
        }
    }
}

impl Error for FieldError {}
