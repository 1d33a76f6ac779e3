use std::path::PathBuf;
use thiserror::Error;

use crate::format::Format;
use crate::tree::ValueKind;

/// Top-level error type for the cfgtree library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("unsupported config file extension: {0:?}")]
    UnsupportedFormat(String),

    #[error("{} support is not enabled (build with the `{}` feature)", .0, .0.feature())]
    FormatNotEnabled(Format),

    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("group '{0}' has no config file path")]
    NoFilePath(String),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {format} config: {message}")]
    ParseError { format: Format, message: String },

    #[error("failed to serialize config as {format}: {message}")]
    SerializeError { format: Format, message: String },

    #[error("`{0}` is a plain value, only objects can be registered")]
    NotConfigurable(String),

    #[error("a removal predicate must inspect the name, the value, or both")]
    NoFilterAxis,

    #[error("cycle detected in configuration objects at '{0}'")]
    CycleDetected(String),

    #[error("cannot assign '{path}': {source}")]
    Field { path: String, source: FieldError },
}

impl ConfigError {
    pub(crate) fn parse(format: Format, err: impl std::fmt::Display) -> Self {
        ConfigError::ParseError {
            format,
            message: err.to_string(),
        }
    }

    pub(crate) fn serialize(format: Format, err: impl std::fmt::Display) -> Self {
        ConfigError::SerializeError {
            format,
            message: err.to_string(),
        }
    }
}

/// Returned by [`Configurable::set_field`](crate::Configurable::set_field).
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum FieldError {
    #[error("no field named `{0}`")]
    Unknown(String),

    #[error("expected {expected}, found {found:?}")]
    TypeMismatch {
        expected: &'static str,
        found: ValueKind,
    },

    #[error("field `{0}` is read-only")]
    ReadOnly(String),
}
