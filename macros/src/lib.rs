//! Derive macros for slicekit
//!
//! This crate provides procedural macros to reduce boilerplate when writing
//! closed-set event enums for slice reducers.
//!
//! # Available Macros
//!
//! - `#[derive(Event)]` - Implements `slicekit_core::event::Event` for an enum
//!
//! # Example
//!
//! ```ignore
//! use slicekit_macros::Event;
//!
//! #[derive(Event, Clone, Debug)]
//! enum TodoEvent {
//!     #[init]
//!     Init,
//!
//!     AddItem { text: String },
//!
//!     #[event_type = "TOGGLE"]
//!     ToggleItem { index: usize },
//! }
//!
//! // Generated:
//! assert_eq!(TodoEvent::AddItem { text: "a".into() }.event_type(), "ADD_ITEM");
//! assert_eq!(TodoEvent::ToggleItem { index: 0 }.event_type(), "TOGGLE");
//! assert_eq!(TodoEvent::init().event_type(), "@@slicekit/INIT");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, Meta, parse_macro_input};

/// Value of `slicekit_core::event::INIT_EVENT_TYPE`; only an `#[init]`
/// variant may produce it.
const RESERVED_INIT_TYPE: &str = "@@slicekit/INIT";

/// Derive macro for event enums
///
/// Implements `slicekit_core::event::Event` with an `event_type()` that
/// returns each variant's name in `SCREAMING_SNAKE_CASE`, and generates an
/// inherent `event_types()` listing every discriminant of the enum.
///
/// # Attributes
///
/// - `#[event_type = "NAME"]` - Use `NAME` as the variant's discriminant
/// - `#[init]` - Mark a unit variant as the synthetic initialization event.
///   Its discriminant is `slicekit_core::event::INIT_EVENT_TYPE` and the
///   enum gets an `InitEvent` implementation returning it.
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - `#[init]` is placed on a variant with fields, or on more than one variant
/// - `#[init]` and `#[event_type]` are combined on one variant
/// - `#[event_type]` is not a string literal
/// - `#[event_type]` names the reserved initialization discriminant
/// - Two variants end up with the same discriminant
#[proc_macro_derive(Event, attributes(event_type, init))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_event(&input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand_event(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(Event)] can only be used on enums",
        ));
    };

    let mut type_arms = Vec::new();
    let mut type_names = Vec::new();
    let mut init_variant = None;
    let mut seen = std::collections::HashSet::new();

    for variant in &data_enum.variants {
        let variant_name = &variant.ident;
        let is_init = has_attribute(&variant.attrs, "init");
        let explicit = event_type_attribute(&variant.attrs)?;

        let pattern = match &variant.fields {
            Fields::Named(_) => quote! { Self::#variant_name { .. } },
            Fields::Unnamed(_) => quote! { Self::#variant_name(..) },
            Fields::Unit => quote! { Self::#variant_name },
        };

        if is_init {
            if !matches!(variant.fields, Fields::Unit) {
                return Err(syn::Error::new_spanned(
                    variant,
                    "#[init] can only mark a unit variant",
                ));
            }
            if explicit.is_some() {
                return Err(syn::Error::new_spanned(
                    variant,
                    "#[init] variants cannot set #[event_type]",
                ));
            }
            if init_variant.replace(variant_name).is_some() {
                return Err(syn::Error::new_spanned(
                    variant,
                    "Only one variant can be marked #[init]",
                ));
            }
            type_arms.push(quote! { #pattern => ::slicekit_core::event::INIT_EVENT_TYPE, });
            type_names.push(quote! { ::slicekit_core::event::INIT_EVENT_TYPE });
            continue;
        }

        let discriminant =
            explicit.unwrap_or_else(|| screaming_snake_case(&variant_name.to_string()));

        if discriminant == RESERVED_INIT_TYPE {
            return Err(syn::Error::new_spanned(
                variant,
                format!("Event type \"{RESERVED_INIT_TYPE}\" is reserved for the #[init] variant"),
            ));
        }

        if !seen.insert(discriminant.clone()) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("Event type \"{discriminant}\" is used by more than one variant"),
            ));
        }

        type_arms.push(quote! { #pattern => #discriminant, });
        type_names.push(quote! { #discriminant });
    }

    let init_impl = init_variant.map(|variant| {
        quote! {
            impl #impl_generics ::slicekit_core::event::InitEvent for #name #ty_generics #where_clause {
                fn init() -> Self {
                    Self::#variant
                }
            }
        }
    });

    let match_body = if type_arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! {
            match self {
                #(#type_arms)*
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::slicekit_core::event::Event for #name #ty_generics #where_clause {
            fn event_type(&self) -> &str {
                #match_body
            }
        }

        impl #impl_generics #name #ty_generics #where_clause {
            /// Every discriminant this enum can produce, in declaration order
            #[must_use]
            pub const fn event_types() -> &'static [&'static str] {
                &[#(#type_names),*]
            }
        }

        #init_impl
    })
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// Reads `#[event_type = "..."]` if present
fn event_type_attribute(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("event_type")) else {
        return Ok(None);
    };

    let Meta::NameValue(meta) = &attr.meta else {
        return Err(syn::Error::new_spanned(
            attr,
            "Expected #[event_type = \"NAME\"]",
        ));
    };

    match &meta.value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) if !value.value().is_empty() => Ok(Some(value.value())),
        other => Err(syn::Error::new_spanned(
            other,
            "#[event_type] must be a non-empty string literal",
        )),
    }
}

/// `AddItem` -> `ADD_ITEM`, `HTTPRequest` -> `HTTP_REQUEST`
fn screaming_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }

    out
}
