use std::any::TypeId;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::attr::AttrValue;

/// Static kind of a native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Bool,
    String,
    Int,
    Uint,
    Float,
    /// Owning reference that may be absent (`Option`, `Box`).
    Pointer,
    /// Type-erased value.
    Interface,
    Slice,
    Map,
    Struct,
    /// Anything the converters know nothing about.
    Other,
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NativeKind::Bool => "bool",
            NativeKind::String => "string",
            NativeKind::Int => "int",
            NativeKind::Uint => "uint",
            NativeKind::Float => "float",
            NativeKind::Pointer => "pointer",
            NativeKind::Interface => "interface",
            NativeKind::Slice => "slice",
            NativeKind::Map => "map",
            NativeKind::Struct => "struct",
            NativeKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// True if the kind can hold an absent value.
pub fn can_be_nil(kind: NativeKind) -> bool {
    matches!(
        kind,
        NativeKind::Pointer | NativeKind::Slice | NativeKind::Map | NativeKind::Interface
    )
}

/// Declared field of a struct type.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Rust identifier.
    pub ident: Cow<'static, str>,
    /// External name. `None` when the field carries no tag.
    pub tag: Option<Cow<'static, str>>,
    /// Field is visible outside its declaring module.
    pub exported: bool,
    /// Lazily built so self-referential types terminate.
    pub ty: fn() -> NativeType,
}

/// Runtime descriptor of a native type.
///
/// Two descriptors are equal iff they describe the same Rust type.
#[derive(Clone)]
pub struct NativeType {
    name: Cow<'static, str>,
    kind: NativeKind,
    type_id: TypeId,
    elem: Option<fn() -> NativeType>,
    fields: Vec<FieldInfo>,
}

impl NativeType {
    pub fn new<T: 'static>(name: impl Into<Cow<'static, str>>, kind: NativeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_id: TypeId::of::<T>(),
            elem: None,
            fields: Vec::new(),
        }
    }

    /// Set the pointee/element type (pointer, slice, map).
    pub fn with_elem(mut self, elem: fn() -> NativeType) -> Self {
        self.elem = Some(elem);
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldInfo>) -> Self {
        self.fields = fields;
        self
    }

    /// Named type `T` sharing this type's underlying kind and layout.
    pub fn alias<T: 'static>(self, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NativeKind {
        self.kind
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn elem(&self) -> Option<NativeType> {
        self.elem.map(|elem| elem())
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }
}

impl PartialEq for NativeType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for NativeType {}

impl Hash for NativeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeType")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Types the converters can describe at runtime.
///
/// Implemented for the supported primitives and containers; use
/// `#[derive(Reflect)]` for structs and newtypes.
pub trait Reflect: 'static {
    fn native_type() -> NativeType;
}

macro_rules! reflect_primitive {
    ($($ty:ty => $name:literal, $kind:ident;)*) => {
        $(
            impl Reflect for $ty {
                fn native_type() -> NativeType {
                    NativeType::new::<$ty>($name, NativeKind::$kind)
                }
            }
        )*
    };
}

reflect_primitive! {
    bool => "bool", Bool;
    String => "String", String;
    i64 => "i64", Int;
    u64 => "u64", Uint;
    f64 => "f64", Float;
}

impl<T: Reflect> Reflect for Option<T> {
    fn native_type() -> NativeType {
        NativeType::new::<Self>(format!("Option<{}>", T::native_type()), NativeKind::Pointer)
            .with_elem(T::native_type)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn native_type() -> NativeType {
        NativeType::new::<Self>(format!("Box<{}>", T::native_type()), NativeKind::Pointer)
            .with_elem(T::native_type)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn native_type() -> NativeType {
        NativeType::new::<Self>(format!("Vec<{}>", T::native_type()), NativeKind::Slice)
            .with_elem(T::native_type)
    }
}

impl<T: Reflect> Reflect for BTreeMap<String, T> {
    fn native_type() -> NativeType {
        let name = format!("BTreeMap<String, {}>", T::native_type());
        NativeType::new::<Self>(name, NativeKind::Map).with_elem(T::native_type)
    }
}

impl<T: Reflect> Reflect for HashMap<String, T> {
    fn native_type() -> NativeType {
        let name = format!("HashMap<String, {}>", T::native_type());
        NativeType::new::<Self>(name, NativeKind::Map).with_elem(T::native_type)
    }
}

/// Payload of a [`NativeValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum NativeData {
    Bool(bool),
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    /// `None` is a nil reference.
    Pointer(Option<Box<NativeValue>>),
    /// `None` is an empty interface.
    Interface(Option<Box<NativeValue>>),
    Slice(Vec<NativeValue>),
    Map(BTreeMap<String, NativeValue>),
    /// Field values in declaration order.
    Struct(Vec<NativeValue>),
    /// Dynamic value stored in a generic-value target.
    Attr(AttrValue),
    /// Value of an `Other` kind; never inspected.
    Opaque,
}

/// A native value together with its static type.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeValue {
    ty: NativeType,
    data: NativeData,
}

impl NativeValue {
    pub fn new(ty: NativeType, data: NativeData) -> Self {
        Self { ty, data }
    }

    /// Zero value of `ty`: `false`, `""`, `0`, nil, empty, or a struct of zeroes.
    pub fn zero(ty: NativeType) -> Self {
        let data = match ty.kind() {
            NativeKind::Bool => NativeData::Bool(false),
            NativeKind::String => NativeData::String(String::new()),
            NativeKind::Int => NativeData::Int(0),
            NativeKind::Uint => NativeData::Uint(0),
            NativeKind::Float => NativeData::Float(0.0),
            NativeKind::Pointer => NativeData::Pointer(None),
            NativeKind::Interface => NativeData::Interface(None),
            NativeKind::Slice => NativeData::Slice(Vec::new()),
            NativeKind::Map => NativeData::Map(BTreeMap::new()),
            NativeKind::Struct => NativeData::Struct(
                ty.fields()
                    .iter()
                    .map(|field| NativeValue::zero((field.ty)()))
                    .collect(),
            ),
            NativeKind::Other => NativeData::Opaque,
        };
        Self { ty, data }
    }

    pub fn zero_of<T: Reflect>() -> Self {
        Self::zero(T::native_type())
    }

    /// Value of the same type carrying `data`.
    pub fn with_data(&self, data: NativeData) -> Self {
        Self {
            ty: self.ty.clone(),
            data,
        }
    }

    pub fn ty(&self) -> &NativeType {
        &self.ty
    }

    pub fn data(&self) -> &NativeData {
        &self.data
    }

    pub fn into_data(self) -> NativeData {
        self.data
    }

    /// Referenced value of a non-nil pointer or interface.
    pub fn elem(&self) -> Option<&NativeValue> {
        match &self.data {
            NativeData::Pointer(inner) | NativeData::Interface(inner) => inner.as_deref(),
            _ => None,
        }
    }

    pub fn field(&self, index: usize) -> Option<&NativeValue> {
        match &self.data {
            NativeData::Struct(fields) => fields.get(index),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            NativeData::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            NativeData::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.data {
            NativeData::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.data {
            NativeData::Uint(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.data {
            NativeData::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_attr(&self) -> Option<&AttrValue> {
        match &self.data {
            NativeData::Attr(v) => Some(v),
            _ => None,
        }
    }

    /// True for a nil pointer or empty interface.
    pub fn is_nil(&self) -> bool {
        matches!(
            self.data,
            NativeData::Pointer(None) | NativeData::Interface(None)
        )
    }
}

/// Follow pointers and interfaces down to the innermost concrete value.
///
/// Stops at the last valid layer when a nil reference is reached.
pub fn resolve(value: &NativeValue) -> &NativeValue {
    let mut current = value;
    while let Some(inner) = current.elem() {
        current = inner;
    }
    current
}
