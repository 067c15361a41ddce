use crate::attr::{AttrType, AttrValue};
use crate::diag::Diagnostics;
use crate::error::ConvertError;
use crate::native::{NativeData, NativeKind, NativeValue};
use crate::options::Options;
use crate::path::AttrPath;
use crate::primitive::{from_raw, incompatible};
use crate::value::{Number, Raw, Value};

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Why a number does not fit the target.
enum Misfit {
    Rounding,
    Overflow,
}

/// Convert a number value into an `i64`, `u64` or `f64` target (or an alias).
///
/// Fractions stored into integers are truncated toward zero only when
/// `options.allow_rounding_numbers` is set. Out-of-range values always fail.
pub fn to_native(
    attr_type: &AttrType,
    value: &Value,
    target: &NativeValue,
    options: &Options,
    path: &AttrPath,
) -> (NativeValue, Diagnostics) {
    let number = match value.as_number() {
        Ok(number) => number,
        Err(e) => return incompatible(value, target, e.to_string(), path),
    };

    let data = match target.ty().kind() {
        NativeKind::Int => to_i64(number, options).map(NativeData::Int),
        NativeKind::Uint => to_u64(number, options).map(NativeData::Uint),
        NativeKind::Float => to_f64(number, options).map(NativeData::Float),
        _ => return incompatible(value, target, "unknown type", path),
    };

    match data {
        Ok(data) => {
            tracing::trace!(path = %path, attr_type = %attr_type.name(), target = %target.ty(), "converted number");
            (target.with_data(data), Diagnostics::new())
        }
        Err(misfit) => {
            let target_ty = target.ty().clone();
            let cause = match misfit {
                Misfit::Rounding => ConvertError::Rounding {
                    number,
                    target: target_ty,
                },
                Misfit::Overflow => ConvertError::Overflow {
                    number,
                    target: target_ty,
                },
            };
            tracing::debug!(path = %path, error = %cause, "number does not fit target");
            let mut diags = Diagnostics::new();
            diags.add_conversion_error(path, cause);
            (target.clone(), diags)
        }
    }
}

pub fn from_native_int(
    attr_type: &AttrType,
    value: i64,
    path: &AttrPath,
) -> (Option<AttrValue>, Diagnostics) {
    from_raw(attr_type, Raw::Number(Number::Int(value)), path)
}

pub fn from_native_uint(
    attr_type: &AttrType,
    value: u64,
    path: &AttrPath,
) -> (Option<AttrValue>, Diagnostics) {
    from_raw(attr_type, Raw::Number(Number::Uint(value)), path)
}

/// Non-finite floats are rejected by validation.
pub fn from_native_float(
    attr_type: &AttrType,
    value: f64,
    path: &AttrPath,
) -> (Option<AttrValue>, Diagnostics) {
    from_raw(attr_type, Raw::Number(Number::Float(value)), path)
}

fn to_i64(number: Number, options: &Options) -> Result<i64, Misfit> {
    match number {
        Number::Int(v) => Ok(v),
        Number::Uint(v) => i64::try_from(v).map_err(|_| Misfit::Overflow),
        Number::Float(v) => truncate(v, -TWO_POW_63, TWO_POW_63, options).map(|t| t as i64),
    }
}

fn to_u64(number: Number, options: &Options) -> Result<u64, Misfit> {
    match number {
        Number::Int(v) => u64::try_from(v).map_err(|_| Misfit::Overflow),
        Number::Uint(v) => Ok(v),
        Number::Float(v) => truncate(v, 0.0, TWO_POW_64, options).map(|t| t as u64),
    }
}

fn to_f64(number: Number, options: &Options) -> Result<f64, Misfit> {
    let (converted, exact) = match number {
        Number::Int(v) => {
            let f = v as f64;
            (f, f as i128 == i128::from(v))
        }
        Number::Uint(v) => {
            let f = v as f64;
            (f, f as u128 == u128::from(v))
        }
        Number::Float(v) if !v.is_finite() => return Err(Misfit::Overflow),
        Number::Float(v) => (v, true),
    };
    if !exact && !options.allow_rounding_numbers {
        return Err(Misfit::Rounding);
    }
    Ok(converted)
}

/// Integral part of `v` if it lies in `[min, max)`.
fn truncate(v: f64, min: f64, max: f64, options: &Options) -> Result<f64, Misfit> {
    if !v.is_finite() {
        return Err(Misfit::Overflow);
    }
    let t = v.trunc();
    if t < min || t >= max {
        return Err(Misfit::Overflow);
    }
    if t != v && !options.allow_rounding_numbers {
        return Err(Misfit::Rounding);
    }
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;
    use crate::native::Reflect;
    use crate::value::ValueType;

    fn path() -> AttrPath {
        AttrPath::root().at_name("port")
    }

    fn rounding() -> Options {
        Options::default().with_allow_rounding_numbers(true)
    }

    fn convert<T: Reflect>(value: Value, options: &Options) -> (NativeValue, Diagnostics) {
        let target = NativeValue::zero_of::<T>();
        to_native(&AttrType::number(), &value, &target, options, &path())
    }

    fn cause(diags: &Diagnostics) -> &ConvertError {
        assert_eq!(diags.len(), 1, "{diags:?}");
        diags.iter().next().and_then(|d| d.cause.as_ref()).unwrap()
    }

    #[test]
    fn exact_integers() {
        let strict = Options::default();
        let (out, diags) = convert::<i64>(Value::number(-42_i64), &strict);
        assert!(diags.is_empty());
        assert_eq!(out.as_i64(), Some(-42));

        let (out, _) = convert::<u64>(Value::number(u64::MAX), &strict);
        assert_eq!(out.as_u64(), Some(u64::MAX));

        let (out, diags) = convert::<i64>(Value::number(8080.0), &strict);
        assert!(diags.is_empty());
        assert_eq!(out.as_i64(), Some(8080));
    }

    #[test]
    fn fraction_needs_rounding_flag() {
        let (out, diags) = convert::<i64>(Value::number(2.75), &Options::default());
        assert_eq!(out.as_i64(), Some(0));
        assert!(matches!(cause(&diags), ConvertError::Rounding { .. }));
        assert!(diags.iter().next().unwrap().detail.ends_with("cannot store 2.75 in i64"));

        let (out, diags) = convert::<i64>(Value::number(2.75), &rounding());
        assert!(diags.is_empty());
        assert_eq!(out.as_i64(), Some(2));
    }

    #[test]
    fn rounding_is_toward_zero() {
        let (out, _) = convert::<i64>(Value::number(-2.75), &rounding());
        assert_eq!(out.as_i64(), Some(-2));

        let (out, _) = convert::<u64>(Value::number(0.9), &rounding());
        assert_eq!(out.as_u64(), Some(0));
    }

    #[test]
    fn out_of_range_always_fails() {
        for options in [Options::default(), rounding()] {
            let (_, diags) = convert::<u64>(Value::number(-1_i64), &options);
            assert!(matches!(cause(&diags), ConvertError::Overflow { .. }));

            let (_, diags) = convert::<i64>(Value::number(u64::MAX), &options);
            assert!(matches!(cause(&diags), ConvertError::Overflow { .. }));

            let (_, diags) = convert::<i64>(Value::number(1e19), &options);
            assert!(matches!(cause(&diags), ConvertError::Overflow { .. }));

            let (_, diags) = convert::<u64>(Value::number(f64::INFINITY), &options);
            assert!(matches!(cause(&diags), ConvertError::Overflow { .. }));
        }
    }

    #[test]
    fn large_integers_into_float() {
        let big = (1_i64 << 53) + 1;
        let (_, diags) = convert::<f64>(Value::number(big), &Options::default());
        assert!(matches!(cause(&diags), ConvertError::Rounding { .. }));

        let (out, diags) = convert::<f64>(Value::number(big), &rounding());
        assert!(diags.is_empty());
        assert_eq!(out.as_f64(), Some((1_u64 << 53) as f64));

        let (out, diags) = convert::<f64>(Value::number(1_i64 << 53), &Options::default());
        assert!(diags.is_empty());
        assert_eq!(out.as_f64(), Some((1_u64 << 53) as f64));
    }

    #[test]
    fn non_finite_into_float_fails() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            for options in [Options::default(), rounding()] {
                let (out, diags) = convert::<f64>(Value::number(v), &options);
                assert_eq!(out.as_f64(), Some(0.0));
                assert!(matches!(cause(&diags), ConvertError::Overflow { .. }));
            }
        }

        let (out, diags) = convert::<f64>(Value::number(-0.5), &Options::default());
        assert!(diags.is_empty());
        assert_eq!(out.as_f64(), Some(-0.5));
    }

    #[test]
    fn non_number_is_incompatible() {
        let (out, diags) = convert::<i64>(Value::string("80"), &Options::default());
        assert_eq!(out.as_i64(), Some(0));
        assert!(matches!(cause(&diags), ConvertError::IncompatibleType { .. }));

        let (_, diags) = convert::<i64>(Value::null(ValueType::Number), &Options::default());
        assert!(matches!(cause(&diags), ConvertError::IncompatibleType { .. }));
    }

    #[test]
    fn non_numeric_target() {
        let (_, diags) = convert::<bool>(Value::number(1_i64), &Options::default());
        match cause(&diags) {
            ConvertError::IncompatibleType { cause, .. } => assert_eq!(cause, "unknown type"),
            other => panic!("unexpected cause: {other:?}"),
        }
    }

    #[test]
    fn from_native_numbers() {
        let ty = AttrType::number();
        let (value, diags) = from_native_int(&ty, -5, &path());
        assert!(diags.is_empty());
        assert_eq!(value.unwrap().value().as_number(), Ok(Number::Int(-5)));

        let (value, _) = from_native_uint(&ty, u64::MAX, &path());
        assert_eq!(value.unwrap().value().as_number(), Ok(Number::Uint(u64::MAX)));

        let (value, _) = from_native_float(&ty, 0.5, &path());
        assert_eq!(value.unwrap().value().as_number(), Ok(Number::Float(0.5)));
    }

    #[test]
    fn from_native_rejects_non_finite() {
        let (value, diags) = from_native_float(&AttrType::number(), f64::NAN, &path());
        assert!(value.is_none());
        assert!(matches!(
            cause(&diags),
            ConvertError::Validation(ValueError::NonFinite(_))
        ));
    }

    #[test]
    fn int_roundtrip() {
        let ty = AttrType::number();
        let (value, _) = from_native_int(&ty, 65_535, &path());
        let target = NativeValue::zero_of::<u64>();
        let (out, diags) =
            to_native(&ty, value.unwrap().value(), &target, &Options::default(), &path());
        assert!(diags.is_empty());
        assert_eq!(out.as_u64(), Some(65_535));
    }
}
