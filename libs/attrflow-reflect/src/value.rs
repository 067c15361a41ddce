use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ExtractError, ValueError};

/// Type of a dynamic value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    Bool,
    String,
    Number,
    List(Box<ValueType>),
    Map(Box<ValueType>),
    Object(BTreeMap<String, ValueType>),
    /// Any type; resolved per value.
    Dynamic,
}

impl ValueType {
    /// True if a value of type `other` may be stored where `self` is expected.
    pub fn accepts(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Dynamic, _) => true,
            (ValueType::List(a), ValueType::List(b)) | (ValueType::Map(a), ValueType::Map(b)) => {
                a.accepts(b)
            }
            (ValueType::Object(a), ValueType::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(name, ty)| b.get(name).is_some_and(|other| ty.accepts(other)))
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => f.write_str("bool"),
            ValueType::String => f.write_str("string"),
            ValueType::Number => f.write_str("number"),
            ValueType::List(elem) => write!(f, "list<{elem}>"),
            ValueType::Map(elem) => write!(f, "map<{elem}>"),
            ValueType::Object(attrs) => {
                f.write_str("object{")?;
                for (i, (name, ty)) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str("}")
            }
            ValueType::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Numeric payload. Integers stay exact; everything else is `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Uint(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<u64> for Number {
    fn from(v: u64) -> Self {
        Number::Uint(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

/// Payload of a known value.
#[derive(Debug, Clone, PartialEq)]
pub enum Raw {
    Bool(bool),
    String(String),
    Number(Number),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(BTreeMap<String, Value>),
}

impl Raw {
    /// Coarse type of the payload; element types are not inspected.
    pub fn value_type(&self) -> ValueType {
        match self {
            Raw::Bool(_) => ValueType::Bool,
            Raw::String(_) => ValueType::String,
            Raw::Number(_) => ValueType::Number,
            Raw::List(_) => ValueType::List(Box::new(ValueType::Dynamic)),
            Raw::Map(_) => ValueType::Map(Box::new(ValueType::Dynamic)),
            Raw::Object(attrs) => ValueType::Object(
                attrs
                    .iter()
                    .map(|(name, value)| (name.clone(), value.ty().clone()))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Known(Raw),
    Null,
    Unknown,
}

/// Dynamic value: a type plus a known payload, null, or unknown.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    ty: ValueType,
    state: State,
}

impl Value {
    /// Build a known value, checking `raw` against `ty`.
    ///
    /// A `Dynamic` type is replaced by the payload's own type.
    pub fn new(ty: ValueType, raw: Raw) -> Result<Self, ValueError> {
        validate_raw(&ty, &raw)?;
        let ty = match ty {
            ValueType::Dynamic => raw.value_type(),
            ty => ty,
        };
        Ok(Self {
            ty,
            state: State::Known(raw),
        })
    }

    pub fn bool(v: bool) -> Self {
        Self {
            ty: ValueType::Bool,
            state: State::Known(Raw::Bool(v)),
        }
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self {
            ty: ValueType::String,
            state: State::Known(Raw::String(v.into())),
        }
    }

    pub fn number(v: impl Into<Number>) -> Self {
        Self {
            ty: ValueType::Number,
            state: State::Known(Raw::Number(v.into())),
        }
    }

    pub fn null(ty: ValueType) -> Self {
        Self {
            ty,
            state: State::Null,
        }
    }

    pub fn unknown(ty: ValueType) -> Self {
        Self {
            ty,
            state: State::Unknown,
        }
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    /// False only for unknown values; null counts as known.
    pub fn is_known(&self) -> bool {
        !matches!(self.state, State::Unknown)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.state, State::Null)
    }

    /// Payload, if the value is known and not null.
    pub fn raw(&self) -> Option<&Raw> {
        match &self.state {
            State::Known(raw) => Some(raw),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Result<bool, ExtractError> {
        match self.extract(ValueType::Bool)? {
            Raw::Bool(v) => Ok(*v),
            _ => Err(self.mismatch(ValueType::Bool)),
        }
    }

    pub fn as_str(&self) -> Result<&str, ExtractError> {
        match self.extract(ValueType::String)? {
            Raw::String(v) => Ok(v),
            _ => Err(self.mismatch(ValueType::String)),
        }
    }

    pub fn as_number(&self) -> Result<Number, ExtractError> {
        match self.extract(ValueType::Number)? {
            Raw::Number(v) => Ok(*v),
            _ => Err(self.mismatch(ValueType::Number)),
        }
    }

    fn extract(&self, expected: ValueType) -> Result<&Raw, ExtractError> {
        match &self.state {
            State::Known(raw) => Ok(raw),
            State::Null => Err(ExtractError::Null { expected }),
            State::Unknown => Err(ExtractError::Unknown),
        }
    }

    fn mismatch(&self, expected: ValueType) -> ExtractError {
        ExtractError::Mismatch {
            found: self.ty.clone(),
            expected,
        }
    }
}

/// Check that `raw` is a valid payload for `ty`.
///
/// Containers are checked element by element; non-finite numbers are rejected.
pub fn validate_raw(ty: &ValueType, raw: &Raw) -> Result<(), ValueError> {
    let mismatch = || ValueError::TypeMismatch {
        found: raw.value_type(),
        expected: ty.clone(),
    };
    if let Raw::Number(Number::Float(v)) = raw {
        if !v.is_finite() {
            return Err(ValueError::NonFinite(*v));
        }
    }
    match (ty, raw) {
        (ValueType::Dynamic, _)
        | (ValueType::Bool, Raw::Bool(_))
        | (ValueType::String, Raw::String(_))
        | (ValueType::Number, Raw::Number(_)) => Ok(()),
        (ValueType::List(elem), Raw::List(items)) => {
            if items.iter().all(|item| elem.accepts(item.ty())) {
                Ok(())
            } else {
                Err(mismatch())
            }
        }
        (ValueType::Map(elem), Raw::Map(entries)) => {
            if entries.values().all(|item| elem.accepts(item.ty())) {
                Ok(())
            } else {
                Err(mismatch())
            }
        }
        (ValueType::Object(attrs), Raw::Object(values)) => {
            let same_shape = attrs.len() == values.len()
                && attrs.iter().all(|(name, attr_ty)| {
                    values
                        .get(name)
                        .is_some_and(|value| attr_ty.accepts(value.ty()))
                });
            if same_shape { Ok(()) } else { Err(mismatch()) }
        }
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_primitives() {
        assert_eq!(Value::bool(true).as_bool(), Ok(true));
        assert_eq!(Value::string("").as_str(), Ok(""));
        assert_eq!(Value::number(3_i64).as_number(), Ok(Number::Int(3)));
    }

    #[test]
    fn extract_wrong_kind() {
        let err = Value::number(1.5).as_bool().unwrap_err();
        assert_eq!(
            err,
            ExtractError::Mismatch {
                found: ValueType::Number,
                expected: ValueType::Bool,
            }
        );
        assert_eq!(err.to_string(), "can't unmarshal number into bool");
    }

    #[test]
    fn extract_null_and_unknown() {
        assert_eq!(
            Value::null(ValueType::String).as_str(),
            Err(ExtractError::Null {
                expected: ValueType::String
            })
        );
        assert_eq!(
            Value::unknown(ValueType::Bool).as_bool(),
            Err(ExtractError::Unknown)
        );
    }

    #[test]
    fn null_is_known() {
        let null = Value::null(ValueType::Bool);
        assert!(null.is_known());
        assert!(null.is_null());
        assert!(null.raw().is_none());

        let unknown = Value::unknown(ValueType::Bool);
        assert!(!unknown.is_known());
        assert!(!unknown.is_null());
    }

    #[test]
    fn new_resolves_dynamic_type() {
        let value = Value::new(ValueType::Dynamic, Raw::String("x".into())).unwrap();
        assert_eq!(value.ty(), &ValueType::String);
    }

    #[test]
    fn validate_rejects_mismatch_and_non_finite() {
        assert_eq!(
            validate_raw(&ValueType::Bool, &Raw::String("true".into())),
            Err(ValueError::TypeMismatch {
                found: ValueType::String,
                expected: ValueType::Bool,
            })
        );
        assert!(matches!(
            validate_raw(&ValueType::Number, &Raw::Number(Number::Float(f64::NAN))),
            Err(ValueError::NonFinite(_))
        ));
    }

    #[test]
    fn validate_containers() {
        let list_ty = ValueType::List(Box::new(ValueType::String));
        let good = Raw::List(vec![Value::string("a"), Value::null(ValueType::String)]);
        let bad = Raw::List(vec![Value::string("a"), Value::bool(false)]);
        assert!(validate_raw(&list_ty, &good).is_ok());
        assert!(validate_raw(&list_ty, &bad).is_err());

        let object_ty = ValueType::Object(BTreeMap::from([
            ("name".to_string(), ValueType::String),
            ("port".to_string(), ValueType::Number),
        ]));
        let object = Raw::Object(BTreeMap::from([
            ("name".to_string(), Value::string("api")),
            ("port".to_string(), Value::number(8080_i64)),
        ]));
        assert!(validate_raw(&object_ty, &object).is_ok());

        let missing = Raw::Object(BTreeMap::from([("name".to_string(), Value::string("api"))]));
        assert!(validate_raw(&object_ty, &missing).is_err());
    }

    #[test]
    fn display_types() {
        let ty = ValueType::Object(BTreeMap::from([
            ("tags".to_string(), ValueType::Map(Box::new(ValueType::String))),
            ("ids".to_string(), ValueType::List(Box::new(ValueType::Number))),
        ]));
        assert_eq!(ty.to_string(), "object{ids: list<number>, tags: map<string>}");
    }
}
