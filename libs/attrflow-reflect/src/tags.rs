use std::collections::HashMap;

use crate::error::TagError;
use crate::native::{NativeKind, NativeType, NativeValue, resolve};
use crate::path::AttrPath;

/// Tag marking a field as excluded from conversion.
pub const EXCLUDED_TAG: &str = "-";

/// Map external field names of the struct behind `value` to field positions.
///
/// Pointers and interfaces are resolved first.
pub fn extract_tags(
    value: &NativeValue,
    path: &AttrPath,
) -> Result<HashMap<String, usize>, TagError> {
    struct_tags(resolve(value).ty(), path)
}

/// Map external field names of struct type `ty` to field positions.
///
/// Unexported and excluded fields are skipped. Any other field must carry
/// a valid, unique name.
pub fn struct_tags(ty: &NativeType, path: &AttrPath) -> Result<HashMap<String, usize>, TagError> {
    let tags = collect_tags(ty, path).inspect_err(|err| {
        tracing::debug!(path = %path, ty = %ty, error = %err, "struct tag extraction failed");
    })?;
    tracing::trace!(path = %path, ty = %ty, fields = tags.len(), "extracted struct tags");
    Ok(tags)
}

fn collect_tags(ty: &NativeType, path: &AttrPath) -> Result<HashMap<String, usize>, TagError> {
    if ty.kind() != NativeKind::Struct {
        return Err(TagError::NotAStruct {
            path: path.clone(),
            ty: ty.name().to_string(),
        });
    }

    let mut tags: HashMap<String, usize> = HashMap::new();
    for (index, field) in ty.fields().iter().enumerate() {
        if !field.exported {
            continue;
        }
        let tag = match field.tag.as_deref() {
            Some(EXCLUDED_TAG) => continue,
            Some(tag) if !tag.is_empty() => tag,
            _ => {
                return Err(TagError::MissingFieldTag {
                    path: path.clone(),
                    field: field.ident.to_string(),
                });
            }
        };

        let field_path = path.at_name(tag);
        if !is_valid_field_name(tag) {
            return Err(TagError::InvalidFieldName {
                path: field_path,
                name: tag.to_string(),
            });
        }
        if let Some(&other) = tags.get(tag) {
            return Err(TagError::DuplicateFieldName {
                path: field_path,
                first: ty.fields()[other].ident.to_string(),
                second: field.ident.to_string(),
            });
        }
        tags.insert(tag.to_string(), index);
    }
    Ok(tags)
}

/// True iff `name` matches `^[a-z][a-z0-9_]*$`.
pub fn is_valid_field_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_lowercase() => {
            bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        }
        _ => false,
    }
}
