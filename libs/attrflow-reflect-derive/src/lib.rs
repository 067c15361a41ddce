use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, LitStr, Type, Visibility};

/// Derive macro for runtime type descriptors.
///
/// Implements `attrflow_reflect::native::Reflect` for the annotated type.
///
/// - Structs with named fields become `Struct` descriptors. Each field
///   records its identifier, whether it is `pub`, and its external name
///   from `#[reflect(name = "...")]`. `#[reflect(skip)]` excludes a field.
///   Names are checked when tags are extracted, not here.
/// - Single-field tuple structs become named aliases of the inner type.
///
/// # Example
///
/// ```ignore
/// #[derive(Reflect)]
/// pub struct Listener {
///     #[reflect(name = "host")]
///     pub host: String,
///
///     #[reflect(name = "port")]
///     pub port: Option<u64>,
///
///     #[reflect(skip)]
///     pub resolved: Option<String>,
///
///     cache: Vec<u8>,
/// }
///
/// #[derive(Reflect)]
/// pub struct Region(String);
/// ```
///
/// Public, non-skipped fields must have types implementing `Reflect`.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Reflect does not support generic types",
        ));
    }

    let body = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => struct_body(name, fields.named.iter())?,
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                let inner = &fields.unnamed[0].ty;
                let name_str = name.to_string();
                quote! {
                    <#inner as ::attrflow_reflect::native::Reflect>::native_type()
                        .alias::<Self>(#name_str)
                }
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Reflect only supports structs with named fields or single-field tuple structs",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Reflect only supports structs",
            ))
        }
    };

    let expanded = quote! {
        impl ::attrflow_reflect::native::Reflect for #name {
            fn native_type() -> ::attrflow_reflect::native::NativeType {
                #body
            }
        }
    };

    Ok(TokenStream::from(expanded))
}

fn struct_body<'a>(
    name: &syn::Ident,
    fields: impl Iterator<Item = &'a Field>,
) -> Result<proc_macro2::TokenStream, syn::Error> {
    let name_str = name.to_string();
    let mut field_tokens = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_name_str = field_name.to_string();
        let field_ty = &field.ty;
        let exported = matches!(field.vis, Visibility::Public(_));

        let tag = parse_tag(field)?;
        let tag_expr = match &tag {
            Some(tag) => quote! {
                ::std::option::Option::Some(::std::borrow::Cow::Borrowed(#tag))
            },
            None => quote! { ::std::option::Option::None },
        };

        let skipped = tag.as_deref() == Some(EXCLUDED_TAG);
        let ty_expr = if exported && !skipped {
            quote! { <#field_ty as ::attrflow_reflect::native::Reflect>::native_type }
        } else {
            opaque_type(field_ty)
        };

        field_tokens.push(quote! {
            ::attrflow_reflect::native::FieldInfo {
                ident: ::std::borrow::Cow::Borrowed(#field_name_str),
                tag: #tag_expr,
                exported: #exported,
                ty: #ty_expr,
            }
        });
    }

    Ok(quote! {
        ::attrflow_reflect::native::NativeType::new::<Self>(
            #name_str,
            ::attrflow_reflect::native::NativeKind::Struct,
        )
        .with_fields(::std::vec![
            #(#field_tokens),*
        ])
    })
}

const EXCLUDED_TAG: &str = "-";

/// Read `#[reflect(name = "...")]` / `#[reflect(skip)]`.
fn parse_tag(field: &Field) -> Result<Option<String>, syn::Error> {
    let mut name: Option<String> = None;
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("reflect") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown reflect attribute (expected `name` or `skip`)"))
            }
        })?;
    }

    match (name, skip) {
        (Some(_), true) => Err(syn::Error::new_spanned(
            field,
            "#[reflect(skip)] cannot be combined with a name",
        )),
        (_, true) => Ok(Some(EXCLUDED_TAG.to_string())),
        (name, false) => Ok(name),
    }
}

/// Descriptor for fields the converters never look into.
fn opaque_type(ty: &Type) -> proc_macro2::TokenStream {
    let ty_str = quote!(#ty).to_string().replace(' ', "");
    quote! {
        || ::attrflow_reflect::native::NativeType::new::<#ty>(
            #ty_str,
            ::attrflow_reflect::native::NativeKind::Other,
        )
    }
}
