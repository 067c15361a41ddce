pub mod attr;
pub mod diag;
pub mod error;
pub mod into;
pub mod native;
pub mod number;
pub mod options;
pub mod path;
pub mod primitive;
pub mod tags;
pub mod util;
pub mod value;

pub use attrflow_reflect_derive::Reflect;

pub use attr::{AttrType, AttrValue, is_generic_value_target};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use into::{AggregateBuilder, NoAggregates, build_value};
pub use native::{
    FieldInfo, NativeData, NativeKind, NativeType, NativeValue, Reflect, can_be_nil, resolve,
};
pub use options::Options;
pub use path::AttrPath;
pub use tags::{EXCLUDED_TAG, extract_tags, is_valid_field_name, struct_tags};
pub use util::join_natural;
pub use value::{Number, Raw, Value, ValueType};
