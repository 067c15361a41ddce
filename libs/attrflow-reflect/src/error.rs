use crate::native::NativeType;
use crate::path::AttrPath;
use crate::value::{Number, Value, ValueType};

// ---------------------------------------------------------------------------
// Fail-fast: struct tag extraction
// ---------------------------------------------------------------------------

/// Malformed struct metadata. Aborts the whole extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("{path}: can't get struct tags of {ty}, is not a struct")]
    NotAStruct { path: AttrPath, ty: String },

    #[error("{path}: need a field tag on {field}")]
    MissingFieldTag { path: AttrPath, field: String },

    #[error(
        "{path}: invalid field name, must only use lowercase letters, underscores, \
         and numbers, and must start with a letter"
    )]
    InvalidFieldName { path: AttrPath, name: String },

    #[error("{path}: can't use field name for both {first} and {second}")]
    DuplicateFieldName {
        path: AttrPath,
        first: String,
        second: String,
    },
}

// ---------------------------------------------------------------------------
// Reading and validating dynamic values
// ---------------------------------------------------------------------------

/// Why a dynamic value could not be read as a primitive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error("unmarshaling unknown values is not supported")]
    Unknown,

    #[error("can't unmarshal null into {expected}")]
    Null { expected: ValueType },

    #[error("can't unmarshal {found} into {expected}")]
    Mismatch { found: ValueType, expected: ValueType },
}

/// A raw primitive rejected by the value type system.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("{found} is not a valid value for type {expected}")]
    TypeMismatch { found: ValueType, expected: ValueType },

    #[error("{0} is not a finite number")]
    NonFinite(f64),
}

/// An attribute type refused to materialize its value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{type_name}: {reason}")]
pub struct ValueFromError {
    pub type_name: String,
    pub reason: String,
}

impl ValueFromError {
    pub fn new(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Accumulated: conversion diagnostics
// ---------------------------------------------------------------------------

/// Cause attached to a conversion diagnostic.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    #[error("can't unmarshal {} into {target}: {cause}", .value.ty())]
    IncompatibleType {
        value: Value,
        target: NativeType,
        cause: String,
    },

    #[error("{0}")]
    Validation(#[from] ValueError),

    #[error("{0}")]
    Conversion(#[from] ValueFromError),

    #[error("cannot store {number} in {target}")]
    Rounding { number: Number, target: NativeType },

    #[error("{number} is out of range for {target}")]
    Overflow { number: Number, target: NativeType },

    #[error("received null value, however the target type {target} cannot handle null values")]
    UnhandledNull { target: NativeType },

    #[error(
        "received unknown value, however the target type {target} cannot handle unknown values"
    )]
    UnhandledUnknown { target: NativeType },
}

// ---------------------------------------------------------------------------
// Options loading
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
