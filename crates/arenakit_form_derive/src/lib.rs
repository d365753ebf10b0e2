use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derives `arenakit::form::FormModel` for a struct with named fields.
///
/// For `struct EventForm { title: SharedString }` this generates:
/// - `EventFormFields`, whose methods return one lens per field,
/// - `EventFormTitleLens`, implementing `FieldLens<EventForm>`,
/// - `EventFormPatch`, an all-optional mirror used by `FormController::set_values`.
#[proc_macro_derive(FormModel)]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let vis = input.vis;
    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");
    let patch_struct_ident = format_ident!("{model_ident}Patch");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let arenakit = arenakit_path();
    let mut lens_defs = Vec::new();
    let mut fields_methods = Vec::new();
    let mut field_keys = Vec::new();
    let mut patch_fields = Vec::new();
    let mut patch_methods = Vec::new();
    let mut apply_arms = Vec::new();
    let mut differs_arms = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_ty = field.ty;
        let field_name = field_ident.to_string();
        let lens_ident = format_ident!("{model_ident}{}Lens", to_pascal_case(&field_name));

        lens_defs.push(quote! {
            #[derive(Clone, Copy, Debug, Default)]
            #vis struct #lens_ident;

            impl #arenakit::form::FieldLens<#model_ident> for #lens_ident {
                type Value = #field_ty;

                fn key(self) -> #arenakit::form::FieldKey {
                    #arenakit::form::FieldKey::new(#field_name)
                }

                fn get<'a>(self, model: &'a #model_ident) -> &'a Self::Value {
                    &model.#field_ident
                }

                fn set(self, model: &mut #model_ident, value: Self::Value) {
                    model.#field_ident = value;
                }
            }
        });

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> #lens_ident {
                #lens_ident
            }
        });

        field_keys.push(quote! {
            #arenakit::form::FieldKey::new(#field_name)
        });

        patch_fields.push(quote! {
            pub #field_ident: ::core::option::Option<#field_ty>
        });

        patch_methods.push(quote! {
            pub fn #field_ident(mut self, value: impl ::core::convert::Into<#field_ty>) -> Self {
                self.#field_ident = ::core::option::Option::Some(value.into());
                self
            }
        });

        apply_arms.push(quote! {
            if let ::core::option::Option::Some(value) = patch.#field_ident {
                self.#field_ident = value;
                written.push(#arenakit::form::FieldKey::new(#field_name));
            }
        });

        differs_arms.push(quote! {
            #field_name => self.#field_ident != other.#field_ident,
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        #vis struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        #[derive(Clone, Default)]
        #vis struct #patch_struct_ident {
            #(#patch_fields,)*
        }

        impl #patch_struct_ident {
            pub fn new() -> Self {
                ::core::default::Default::default()
            }

            #(#patch_methods)*
        }

        impl #arenakit::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;
            type Patch = #patch_struct_ident;

            const FIELD_KEYS: &'static [#arenakit::form::FieldKey] = &[#(#field_keys),*];

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            #[allow(unused_mut)]
            fn apply_patch(
                &mut self,
                patch: Self::Patch,
            ) -> ::std::vec::Vec<#arenakit::form::FieldKey> {
                let mut written = ::std::vec::Vec::new();
                #(#apply_arms)*
                written
            }

            #[allow(unused_variables)]
            fn field_differs(&self, other: &Self, key: #arenakit::form::FieldKey) -> bool {
                match key.as_str() {
                    #(#differs_arms)*
                    _ => false,
                }
            }
        }

        #(#lens_defs)*
    }
    .into()
}

fn arenakit_path() -> TokenStream2 {
    match crate_name("arenakit") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::arenakit),
    }
}

fn to_pascal_case(input: &str) -> String {
    let mut out = String::new();
    for segment in input.split('_') {
        if segment.is_empty() {
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
