//! Procedural macros for `tiny_rasterizer`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, Index};

/// Derives `tiny_rasterizer::Interpolate` for a struct.
///
/// Every field is interpolated with its own `Interpolate` implementation, so nested
/// attribute structs recurse down to their numeric leaves. Fields whose type has no
/// implementation (strings, booleans, references...) fail to compile, as do enums and
/// unions.
#[proc_macro_derive(Interpolate)]
pub fn derive_interpolate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    return match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    };
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let data = match &input.data {
        Data::Struct(data) => data,
        Data::Enum(_) | Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "Interpolate can only be derived for structs with numeric fields",
            ));
        }
    };

    let body = match &data.fields {
        Fields::Named(fields) => {
            let inits = fields.named.iter().map(|field| {
                let ident = &field.ident;
                let ty = &field.ty;
                quote! {
                    #ident: <#ty as ::tiny_rasterizer::Interpolate>::interpolate(
                        &v0.#ident, &v1.#ident, &v2.#ident, weights,
                    )
                }
            });
            quote! { Self { #(#inits,)* } }
        }
        Fields::Unnamed(fields) => {
            let inits = fields.unnamed.iter().enumerate().map(|(i, field)| {
                let index = Index::from(i);
                let ty = &field.ty;
                quote! {
                    <#ty as ::tiny_rasterizer::Interpolate>::interpolate(
                        &v0.#index, &v1.#index, &v2.#index, weights,
                    )
                }
            });
            quote! { Self( #(#inits,)* ) }
        }
        Fields::Unit => quote! { Self },
    };

    // Generic structs only implement the trait when every field type does.
    let mut generics = input.generics.clone();
    {
        let where_clause = generics.make_where_clause();
        for field in data.fields.iter() {
            let ty = &field.ty;
            where_clause
                .predicates
                .push(parse_quote!(#ty: ::tiny_rasterizer::Interpolate));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    return Ok(quote! {
        impl #impl_generics ::tiny_rasterizer::Interpolate for #name #ty_generics #where_clause {
            #[inline]
            #[allow(unused_variables)]
            fn interpolate(
                v0: &Self,
                v1: &Self,
                v2: &Self,
                weights: &::tiny_rasterizer::Barycentric,
            ) -> Self {
                return #body;
            }
        }
    });
}
