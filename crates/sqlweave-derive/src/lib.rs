//! Derive macro exposing struct fields as named SQL row values.
//!
//! This crate provides `#[derive(Row)]`, which implements
//! `sqlweave_core::row::RowAccessor` so a struct can feed the named
//! parameters of a batch statement or the rows of an INSERT.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta};

/// Derives `RowAccessor` for a struct with named fields.
///
/// Every field type must implement `ToSqlValue` and `Clone`.
///
/// # Field Attributes
///
/// - `#[row(name = "column_name")]` - The name the value is read under
///   (optional, defaults to the field name)
/// - `#[row(skip)]` - Leaves the field out of the row
///
/// # Generated Items
///
/// For a struct `Order`, this macro generates:
///
/// - `impl RowAccessor for Order`
/// - `Order::ROW_FIELDS` - The exposed names, in declaration order
#[proc_macro_derive(Row, attributes(row))]
pub fn derive_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_row_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_row_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Row derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Row derive only supports structs",
            ));
        }
    };

    let mut exposed: Vec<(Ident, String)> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_row_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let name = attrs.name.unwrap_or_else(|| field_name.to_string());
        if let Some((previous, _)) = exposed.iter().find(|(_, n)| *n == name) {
            return Err(syn::Error::new_spanned(
                field,
                format!("row name '{name}' is already used by field '{previous}'"),
            ));
        }
        exposed.push((field_name.clone(), name));
    }

    let arms = exposed.iter().map(|(field, name)| {
        quote! {
            #name => ::std::option::Option::Some(
                ::sqlweave_core::value::ToSqlValue::to_sql_value(
                    ::std::clone::Clone::clone(&self.#field),
                ),
            ),
        }
    });
    let names = exposed.iter().map(|(_, name)| name);

    Ok(quote! {
        impl #impl_generics ::sqlweave_core::row::RowAccessor
            for #struct_name #ty_generics #where_clause
        {
            fn value(&self, name: &str) -> ::std::option::Option<::sqlweave_core::value::SqlValue> {
                match name {
                    #(#arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl #impl_generics #struct_name #ty_generics #where_clause {
            /// Names of the values exposed by the row, in declaration order.
            pub const ROW_FIELDS: &'static [&'static str] = &[#(#names),*];
        }
    })
}

#[derive(Default)]
struct RowAttrs {
    name: Option<String>,
    skip: bool,
}

fn parse_row_attrs(attrs: &[Attribute]) -> syn::Result<RowAttrs> {
    let mut result = RowAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("row") {
            continue;
        }
        // Handle empty attribute like #[row]
        if matches!(attr.meta, Meta::Path(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                result.skip = true;
                Ok(())
            } else if meta.path.is_ident("name") {
                let value: Expr = meta.value()?.parse()?;
                match value {
                    Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) => {
                        result.name = Some(s.value());
                        Ok(())
                    }
                    other => Err(syn::Error::new_spanned(
                        other,
                        "expected a string literal",
                    )),
                }
            } else {
                Err(meta.error("unknown row attribute, expected `name` or `skip`"))
            }
        })?;
    }

    Ok(result)
}
