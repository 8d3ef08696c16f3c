use darling::Error;
use darling::ast::NestedMeta;
use quote::quote;
use syn::{Data, DeriveInput, Fields, ItemStruct, parse_macro_input};

use proc_macro::TokenStream;

/// Serialises a struct big-endian, field by field, in declaration order.
#[proc_macro_derive(ToBytes)]
pub fn derive_to_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    let fields: Vec<syn::Member> = match input.data {
        Data::Struct(ref s) => match s.fields {
            Fields::Named(ref nf) => nf
                .named
                .iter()
                .filter_map(|f| f.ident.clone())
                .map(syn::Member::from)
                .collect(),
            Fields::Unnamed(ref uf) => uf
                .unnamed
                .iter()
                .enumerate()
                .map(|(i, _)| syn::Index::from(i).into())
                .collect(),
            Fields::Unit => Vec::new(),
        },
        _ => {
            return TokenStream::from(
                syn::Error::new_spanned(&name, "ToBytes can only be derived for structs")
                    .to_compile_error(),
            );
        }
    };

    let expanded = quote! {
        impl crate::utils::byteorder::WriteBytesBe for #name {
            fn write_be(&self, dst: &mut Vec<u8>) {
                #( crate::utils::byteorder::WriteBytesBe::write_be(&self.#fields, dst); )*
            }
        }
    };

    TokenStream::from(expanded)
}

/// Marks a struct as a sub-record whose payload is exactly its fields.
///
/// `#[fixed_layout(0x94)]` implements `FixedLayout` with the given type code;
/// the struct must also derive `ToBytes`.
#[proc_macro_attribute]
pub fn fixed_layout(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(Error::from(e).write_errors());
        }
    };

    let Some(first) = args.first() else {
        return TokenStream::from(Error::custom("fixed_layout expects a type code").write_errors());
    };

    let code = match first {
        NestedMeta::Lit(syn::Lit::Int(lit)) => match lit.base10_parse::<u16>() {
            Ok(code) => code,
            Err(e) => return TokenStream::from(e.to_compile_error()),
        },
        _ => {
            return TokenStream::from(
                syn::Error::new_spanned(first, "fixed_layout expects an integer, e.g. 0x94")
                    .to_compile_error(),
            );
        }
    };

    let input = parse_macro_input!(item as ItemStruct);
    let name = &input.ident;

    let expanded = quote! {
        #input

        impl crate::utils::byteorder::FixedLayout for #name {
            fn type_code(&self) -> u16 {
                #code
            }

            fn payload(&self) -> Vec<u8> {
                let mut vec = Vec::new();
                crate::utils::byteorder::WriteBytesBe::write_be(self, &mut vec);
                vec
            }
        }
    };
    TokenStream::from(expanded)
}
