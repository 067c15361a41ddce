use crate::attr::{AttrType, AttrValue};
use crate::diag::Diagnostics;
use crate::error::ConvertError;
use crate::native::{NativeData, NativeKind, NativeValue};
use crate::path::AttrPath;
use crate::value::{Raw, Value};

/// Convert a bool or string value into `target`.
///
/// The result keeps the target's declared type, so named aliases of
/// `bool`/`String` are filled in place. On failure the target is returned
/// unchanged together with one `IncompatibleType` diagnostic.
pub fn to_native(
    attr_type: &AttrType,
    value: &Value,
    target: &NativeValue,
    path: &AttrPath,
) -> (NativeValue, Diagnostics) {
    let extracted = match target.ty().kind() {
        NativeKind::Bool => value.as_bool().map(NativeData::Bool),
        NativeKind::String => value.as_str().map(|s| NativeData::String(s.to_string())),
        _ => return incompatible(value, target, "unknown type", path),
    };

    match extracted {
        Ok(data) => {
            tracing::trace!(path = %path, attr_type = %attr_type.name(), target = %target.ty(), "converted primitive");
            (target.with_data(data), Diagnostics::new())
        }
        Err(e) => incompatible(value, target, e.to_string(), path),
    }
}

pub fn from_native_bool(
    attr_type: &AttrType,
    value: bool,
    path: &AttrPath,
) -> (Option<AttrValue>, Diagnostics) {
    from_raw(attr_type, Raw::Bool(value), path)
}

pub fn from_native_string(
    attr_type: &AttrType,
    value: &str,
    path: &AttrPath,
) -> (Option<AttrValue>, Diagnostics) {
    from_raw(attr_type, Raw::String(value.to_string()), path)
}

/// Build `attr_type`'s value from a native primitive.
///
/// Validates the payload as a value of its own primitive kind, runs the
/// type's custom validation if it has one, then lets the type materialize
/// its value. Whether the kind fits the type is decided by materialization.
/// Stops at the first fatal diagnostic.
pub(crate) fn from_raw(
    attr_type: &AttrType,
    raw: Raw,
    path: &AttrPath,
) -> (Option<AttrValue>, Diagnostics) {
    let mut diags = Diagnostics::new();

    let value = match Value::new(raw.value_type(), raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(path = %path, attr_type = %attr_type.name(), error = %e, "native value rejected");
            diags.add_conversion_error(path, ConvertError::Validation(e));
            return (None, diags);
        }
    };

    if let Some(custom) = attr_type.validate(&value, path) {
        diags.append(custom);
        if diags.has_error() {
            return (None, diags);
        }
    }

    match attr_type.value_from(&value) {
        Ok(attr_value) => (Some(attr_value), diags),
        Err(e) => {
            tracing::debug!(path = %path, attr_type = %attr_type.name(), error = %e, "value materialization failed");
            diags.add_conversion_error(path, ConvertError::Conversion(e));
            (None, diags)
        }
    }
}

pub(crate) fn incompatible(
    value: &Value,
    target: &NativeValue,
    cause: impl Into<String>,
    path: &AttrPath,
) -> (NativeValue, Diagnostics) {
    let cause = ConvertError::IncompatibleType {
        value: value.clone(),
        target: target.ty().clone(),
        cause: cause.into(),
    };
    tracing::debug!(path = %path, error = %cause, "incompatible conversion target");
    let mut diags = Diagnostics::new();
    diags.add_conversion_error(path, cause);
    (target.clone(), diags)
}
