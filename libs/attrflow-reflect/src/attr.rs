use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::diag::Diagnostics;
use crate::error::ValueFromError;
use crate::native::{NativeKind, NativeType, Reflect};
use crate::path::AttrPath;
use crate::value::{Value, ValueType};

/// Extra validation run on a value before it is materialized.
pub type ValidateFn = Arc<dyn Fn(&Value, &AttrPath) -> Diagnostics + Send + Sync>;

/// Builds the type's own value from a raw dynamic value.
pub type ValueFromFn = Arc<dyn Fn(&Value) -> Result<AttrValue, ValueFromError> + Send + Sync>;

/// Schema attribute type.
///
/// Capabilities are optional function fields: a type without `validate`
/// skips custom validation, a type without `value_from` wraps the raw
/// value after checking its type.
#[derive(Clone)]
pub struct AttrType {
    name: Cow<'static, str>,
    value_type: ValueType,
    validate: Option<ValidateFn>,
    value_from: Option<ValueFromFn>,
}

impl AttrType {
    pub fn new(name: impl Into<Cow<'static, str>>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            validate: None,
            value_from: None,
        }
    }

    pub fn bool() -> Self {
        Self::new("bool", ValueType::Bool)
    }

    pub fn string() -> Self {
        Self::new("string", ValueType::String)
    }

    pub fn number() -> Self {
        Self::new("number", ValueType::Number)
    }

    pub fn with_validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &AttrPath) -> Diagnostics + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(f));
        self
    }

    pub fn with_value_from<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<AttrValue, ValueFromError> + Send + Sync + 'static,
    {
        self.value_from = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn has_validator(&self) -> bool {
        self.validate.is_some()
    }

    /// Run custom validation. `None` if the type has none.
    pub fn validate(&self, value: &Value, path: &AttrPath) -> Option<Diagnostics> {
        self.validate.as_ref().map(|validate| validate(value, path))
    }

    /// Materialize this type's value from `value`.
    pub fn value_from(&self, value: &Value) -> Result<AttrValue, ValueFromError> {
        if let Some(value_from) = &self.value_from {
            return value_from(value);
        }
        if !self.value_type.accepts(value.ty()) {
            return Err(ValueFromError::new(
                self.name.to_string(),
                format!("expected {} value, got {}", self.value_type, value.ty()),
            ));
        }
        Ok(AttrValue::new(self.name.clone(), value.clone()))
    }
}

impl fmt::Debug for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrType")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("validate", &self.validate.is_some())
            .field("value_from", &self.value_from.is_some())
            .finish()
    }
}

/// Value materialized by an [`AttrType`].
///
/// As a native type this is the generic dynamic value: a target of this
/// type receives the value as-is instead of being converted.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrValue {
    type_name: Cow<'static, str>,
    value: Value,
}

impl AttrValue {
    pub fn new(type_name: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        !self.value.is_known()
    }
}

impl Reflect for AttrValue {
    fn native_type() -> NativeType {
        NativeType::new::<AttrValue>("AttrValue", NativeKind::Interface)
    }
}

/// True iff `target` is exactly the generic dynamic value type.
///
/// Named aliases of it are concrete types and do not match.
pub fn is_generic_value_target(target: &NativeType) -> bool {
    target.is::<AttrValue>()
}
