#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod coerce;
mod decoder;
mod error;
mod hook;
mod kind;
mod metadata;
mod path;
mod record;
mod slot;
mod value;

pub use decoder::{DEFAULT_TAG_NAME, Decoder, DecoderConfig, decode, decode_metadata, weak_decode};
pub use error::{ConfigError, DecodeError, DecodeErrorKind, FieldError, FieldErrorKind};
pub use hook::{DecodeHook, HookResult};
pub use kind::Kind;
pub use metadata::Metadata;
pub use path::FieldPath;
pub use value::{Mapping, Value, ValueType};
