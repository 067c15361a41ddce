use crate::attr::{AttrType, is_generic_value_target};
use crate::diag::Diagnostics;
use crate::error::ConvertError;
use crate::native::{NativeData, NativeKind, NativeValue, can_be_nil};
use crate::options::Options;
use crate::path::AttrPath;
use crate::primitive::incompatible;
use crate::value::Value;
use crate::{number, primitive};

/// Conversion of struct, slice and map targets.
///
/// Implemented by the enclosing aggregate layer; [`build_value`] calls it
/// once it reaches a known, non-null value for such a target.
pub trait AggregateBuilder {
    fn build_aggregate(
        &self,
        attr_type: &AttrType,
        value: &Value,
        target: &NativeValue,
        options: &Options,
        path: &AttrPath,
    ) -> (NativeValue, Diagnostics);
}

/// Rejects every aggregate target.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAggregates;

impl AggregateBuilder for NoAggregates {
    fn build_aggregate(
        &self,
        _attr_type: &AttrType,
        value: &Value,
        target: &NativeValue,
        _options: &Options,
        path: &AttrPath,
    ) -> (NativeValue, Diagnostics) {
        let cause = format!("{} targets are not supported", target.ty().kind());
        incompatible(value, target, cause, path)
    }
}

/// Convert `value` into `target`.
///
/// Generic-value targets receive the materialized value untouched. Null
/// and unknown values are handled according to `options`; pointers are
/// filled through their pointee. On error the target is returned unchanged.
pub fn build_value(
    attr_type: &AttrType,
    value: &Value,
    target: &NativeValue,
    options: &Options,
    aggregates: &dyn AggregateBuilder,
    path: &AttrPath,
) -> (NativeValue, Diagnostics) {
    let ty = target.ty();

    if is_generic_value_target(ty) {
        return match attr_type.value_from(value) {
            Ok(attr_value) => (
                target.with_data(NativeData::Attr(attr_value)),
                Diagnostics::new(),
            ),
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_conversion_error(path, ConvertError::Conversion(e));
                (target.clone(), diags)
            }
        };
    }

    if !value.is_known() {
        if options.unhandled_unknown_as_empty {
            return (NativeValue::zero(ty.clone()), Diagnostics::new());
        }
        return unhandled(ConvertError::UnhandledUnknown { target: ty.clone() }, target, path);
    }

    if value.is_null() {
        if can_be_nil(ty.kind()) || options.unhandled_null_as_empty {
            return (NativeValue::zero(ty.clone()), Diagnostics::new());
        }
        return unhandled(ConvertError::UnhandledNull { target: ty.clone() }, target, path);
    }

    match ty.kind() {
        NativeKind::Bool | NativeKind::String => {
            primitive::to_native(attr_type, value, target, path)
        }
        NativeKind::Int | NativeKind::Uint | NativeKind::Float => {
            number::to_native(attr_type, value, target, options, path)
        }
        NativeKind::Pointer => build_pointer(attr_type, value, target, options, aggregates, path),
        NativeKind::Struct | NativeKind::Slice | NativeKind::Map => {
            aggregates.build_aggregate(attr_type, value, target, options, path)
        }
        NativeKind::Interface | NativeKind::Other => {
            incompatible(value, target, "unknown type", path)
        }
    }
}

fn build_pointer(
    attr_type: &AttrType,
    value: &Value,
    target: &NativeValue,
    options: &Options,
    aggregates: &dyn AggregateBuilder,
    path: &AttrPath,
) -> (NativeValue, Diagnostics) {
    let pointee = match (target.elem(), target.ty().elem()) {
        (Some(existing), _) => existing.clone(),
        (None, Some(elem)) => NativeValue::zero(elem),
        (None, None) => {
            return incompatible(value, target, "pointer without element type", path);
        }
    };

    let (built, diags) = build_value(attr_type, value, &pointee, options, aggregates, path);
    if diags.has_error() {
        return (target.clone(), diags);
    }
    (target.with_data(NativeData::Pointer(Some(Box::new(built)))), diags)
}

fn unhandled(
    cause: ConvertError,
    target: &NativeValue,
    path: &AttrPath,
) -> (NativeValue, Diagnostics) {
    tracing::debug!(path = %path, error = %cause, "value not representable in target");
    let mut diags = Diagnostics::new();
    diags.add_conversion_error(path, cause);
    (target.clone(), diags)
}
