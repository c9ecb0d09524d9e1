// SPDX-License-Identifier: MIT

//! DbEnum derive implementation.
//!
//! Generates the `relmap_core::DbEnum` implementation for a fieldless enum:
//! the static type descriptor, symbol lookup, and strict parsing of stored
//! text back into a variant.

use darling::{FromDeriveInput, ast::Data, util::Ignored};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, Ident, Variant, parse_macro_input};

/// `#[db_enum(...)]` options.
#[derive(FromDeriveInput)]
#[darling(attributes(db_enum), supports(enum_unit))]
struct EnumOpts {
    ident: Ident,
    data:  Data<Variant, Ignored>,
    /// Database type name; the bare type name when absent.
    #[darling(default)]
    name:  Option<String>
}

/// Entry point for `#[derive(DbEnum)]`.
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match generate(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into()
    }
}

fn generate(input: &DeriveInput) -> darling::Result<TokenStream2> {
    let opts = EnumOpts::from_derive_input(input)?;
    let variants = match &opts.data {
        Data::Enum(variants) => variants,
        Data::Struct(_) => {
            return Err(darling::Error::custom("DbEnum can only be derived for enums")
                .with_span(input));
        }
    };
    if variants.is_empty() {
        return Err(darling::Error::custom("DbEnum needs at least one variant")
            .with_span(&input.ident));
    }

    let name = &opts.ident;
    let type_name = opts.name.clone().unwrap_or_else(|| name.to_string());

    let idents: Vec<&Ident> = variants.iter().map(|v| &v.ident).collect();
    let symbols: Vec<String> = idents.iter().map(|i| i.to_string()).collect();

    Ok(quote! {
        impl ::relmap_core::DbEnum for #name {
            fn enum_meta() -> ::relmap_core::EnumMeta {
                ::relmap_core::EnumMeta {
                    type_name: #type_name,
                    symbols:   &[#(#symbols),*]
                }
            }

            fn symbol(&self) -> &'static str {
                match self {
                    #(Self::#idents => #symbols),*
                }
            }

            fn from_symbol(
                symbol: &str
            ) -> ::std::result::Result<Self, ::relmap_core::MapperError> {
                match symbol {
                    #(#symbols => ::std::result::Result::Ok(Self::#idents),)*
                    other => {
                        ::std::result::Result::Err(::relmap_core::MapperError::UnknownSymbol {
                            enum_type: #type_name,
                            value:     other.to_string()
                        })
                    }
                }
            }
        }
    })
}
