// SPDX-License-Identifier: MIT

//! Entity derive implementation.
//!
//! Parses the struct definition plus its storage attributes into a list of
//! [`FieldDef`]s, validates the declaration, and generates the
//! `relmap_core::Entity` implementation: the static descriptor table,
//! field-value access for binding, and row extraction.

use darling::{FromDeriveInput, ast::Data, util::Ignored};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, DeriveInput, Field, Ident, Type, parse_macro_input};

/// Entity-level `#[entity(...)]` options.
#[derive(FromDeriveInput)]
#[darling(attributes(entity), supports(struct_named))]
struct EntityOpts {
    ident: Ident,
    data:  Data<Ignored, Field>,
    /// Explicit table name; the bare type name when absent.
    #[darling(default)]
    table: Option<String>
}

/// Semantic kind a field's Rust type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MappedKind {
    Integer,
    BigInt,
    Boolean,
    Text,
    Timestamp,
    /// Any non-primitive path type; must implement `DbEnum`.
    EnumRef
}

/// One parsed field with its storage flags.
struct FieldDef {
    ident:      Ident,
    ty:         Type,
    kind:       MappedKind,
    is_key:     bool,
    is_serial:  bool,
    not_null:   bool,
    is_unique:  bool,
    references: Option<Ident>
}

impl FieldDef {
    fn from_field(field: &Field) -> darling::Result<Self> {
        let ident = field.ident.clone().ok_or_else(|| {
            darling::Error::custom("Entity fields must be named").with_span(field)
        })?;
        let ty = field.ty.clone();
        let kind = mapped_kind(&ty)?;

        let mut def = Self {
            ident,
            ty,
            kind,
            is_key: false,
            is_serial: false,
            not_null: false,
            is_unique: false,
            references: None
        };

        for attr in &field.attrs {
            if attr.path().is_ident("key") {
                def.is_key = true;
            } else if attr.path().is_ident("serial") {
                def.is_serial = true;
            } else if attr.path().is_ident("not_null") {
                def.not_null = true;
            } else if attr.path().is_ident("unique") {
                def.is_unique = true;
            } else if attr.path().is_ident("references") {
                def.references = Some(parse_references(attr)?);
            }
        }

        if def.references.is_some() && def.kind != MappedKind::Integer {
            return Err(darling::Error::custom(
                "#[references] is only legal on i32 fields"
            )
            .with_span(field));
        }

        Ok(def)
    }
}

/// Parse `#[references(EntityName)]`.
fn parse_references(attr: &Attribute) -> darling::Result<Ident> {
    attr.parse_args::<Ident>().map_err(darling::Error::from)
}

/// Map a field's Rust type to its semantic kind.
fn mapped_kind(ty: &Type) -> darling::Result<MappedKind> {
    let Type::Path(path) = ty else {
        return Err(darling::Error::custom("unsupported field type").with_span(ty));
    };
    let Some(segment) = path.path.segments.last() else {
        return Err(darling::Error::custom("unsupported field type").with_span(ty));
    };

    Ok(match segment.ident.to_string().as_str() {
        "i32" => MappedKind::Integer,
        "i64" => MappedKind::BigInt,
        "bool" => MappedKind::Boolean,
        "String" => MappedKind::Text,
        "NaiveDateTime" => MappedKind::Timestamp,
        "Option" => {
            return Err(darling::Error::custom(
                "Option fields are not supported; nullability is the #[not_null] column constraint"
            )
            .with_span(ty));
        }
        _ => MappedKind::EnumRef
    })
}

/// Entry point for `#[derive(Entity)]`.
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match generate(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into()
    }
}

fn generate(input: &DeriveInput) -> darling::Result<TokenStream2> {
    let opts = EntityOpts::from_derive_input(input)?;
    let fields = match &opts.data {
        Data::Struct(fields) => &fields.fields,
        Data::Enum(_) => {
            return Err(darling::Error::custom("Entity can only be derived for structs")
                .with_span(input));
        }
    };

    let defs: darling::Result<Vec<FieldDef>> =
        fields.iter().map(FieldDef::from_field).collect();
    let defs = defs?;

    let keys = defs.iter().filter(|d| d.is_key).count();
    if keys > 1 {
        return Err(
            darling::Error::custom("at most one field may carry #[key]").with_span(&input.ident)
        );
    }

    let name = &opts.ident;
    let name_str = name.to_string();
    let table_str = opts.table.clone().unwrap_or_else(|| name_str.clone());

    let field_metas = defs.iter().map(field_meta_tokens);
    let value_arms = defs.iter().map(value_arm_tokens);
    let extractions = defs.iter().map(extraction_tokens);

    Ok(quote! {
        impl ::relmap_core::Entity for #name {
            fn entity_name() -> &'static str {
                #name_str
            }

            fn table() -> &'static str {
                #table_str
            }

            fn describe() -> ::std::vec::Vec<::relmap_core::FieldMeta> {
                ::std::vec![#(#field_metas),*]
            }

            fn value(&self, field: &str) -> ::relmap_core::Value {
                match field {
                    #(#value_arms,)*
                    _ => ::relmap_core::Value::Null
                }
            }

            fn from_row(
                row: &dyn ::relmap_core::RowAccess
            ) -> ::std::result::Result<Self, ::relmap_core::MapperError> {
                ::std::result::Result::Ok(Self {
                    #(#extractions),*
                })
            }
        }
    })
}

/// `FieldMeta { … }` literal for one field.
fn field_meta_tokens(def: &FieldDef) -> TokenStream2 {
    let name = def.ident.to_string();
    let ty = &def.ty;
    let kind = match def.kind {
        MappedKind::Integer => quote!(::relmap_core::FieldKind::Integer),
        MappedKind::BigInt => quote!(::relmap_core::FieldKind::BigInt),
        MappedKind::Boolean => quote!(::relmap_core::FieldKind::Boolean),
        MappedKind::Text => quote!(::relmap_core::FieldKind::Text),
        MappedKind::Timestamp => quote!(::relmap_core::FieldKind::Timestamp),
        MappedKind::EnumRef => {
            quote!(::relmap_core::FieldKind::Enum(<#ty as ::relmap_core::DbEnum>::enum_meta()))
        }
    };
    let is_key = def.is_key;
    let is_serial = def.is_serial;
    let not_null = def.not_null;
    let is_unique = def.is_unique;
    let references = match &def.references {
        Some(other) => {
            quote!(::core::option::Option::Some(<#other as ::relmap_core::Entity>::table()))
        }
        None => quote!(::core::option::Option::None)
    };

    quote! {
        ::relmap_core::FieldMeta {
            name: #name,
            kind: #kind,
            is_key: #is_key,
            is_serial: #is_serial,
            not_null: #not_null,
            is_unique: #is_unique,
            references: #references
        }
    }
}

/// One `"name" => Value::…` arm of the `value` match.
fn value_arm_tokens(def: &FieldDef) -> TokenStream2 {
    let ident = &def.ident;
    let name = ident.to_string();
    match def.kind {
        MappedKind::Integer => quote!(#name => ::relmap_core::Value::Int(self.#ident)),
        MappedKind::BigInt => quote!(#name => ::relmap_core::Value::Long(self.#ident)),
        MappedKind::Boolean => quote!(#name => ::relmap_core::Value::Bool(self.#ident)),
        MappedKind::Text => quote!(#name => ::relmap_core::Value::Text(self.#ident.clone())),
        MappedKind::Timestamp => {
            quote!(#name => ::relmap_core::Value::Timestamp(self.#ident))
        }
        MappedKind::EnumRef => quote! {
            #name => ::relmap_core::Value::Text(
                ::relmap_core::DbEnum::symbol(&self.#ident).to_string()
            )
        }
    }
}

/// One `field: row.get(…)` initializer of `from_row`.
fn extraction_tokens(def: &FieldDef) -> TokenStream2 {
    let ident = &def.ident;
    let ty = &def.ty;
    let name = ident.to_string();
    match def.kind {
        MappedKind::Integer => quote!(#ident: row.get(#name)?.into_int(#name)?),
        MappedKind::BigInt => quote!(#ident: row.get(#name)?.into_long(#name)?),
        MappedKind::Boolean => quote!(#ident: row.get(#name)?.into_bool(#name)?),
        MappedKind::Text => quote!(#ident: row.get(#name)?.into_text(#name)?),
        MappedKind::Timestamp => quote!(#ident: row.get(#name)?.into_timestamp(#name)?),
        MappedKind::EnumRef => quote! {
            #ident: <#ty as ::relmap_core::DbEnum>::from_symbol(
                &row.get(#name)?.into_text(#name)?
            )?
        }
    }
}
