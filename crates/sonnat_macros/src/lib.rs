use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Meta, Type, parse_macro_input, spanned::Spanned};

/// Maps every variant of a field-less enum onto a theme token.
///
/// ```ignore
/// #[derive(IntoThemeField)]
/// #[field(sonnat_theme::TypographyVariant)]
/// pub enum TextVariant {
///     #[theme(typography().variants.h1)]
///     H1,
/// }
/// ```
///
/// generates `fn resolve<'a>(&self, theme: &'a sonnat_theme::Theme) -> &'a Field`.
#[proc_macro_derive(IntoThemeField, attributes(theme, field))]
pub fn into_theme_field_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "#[derive(IntoThemeField)] can only be used on enums",
        ));
    };

    let field_type = enum_field_type(&input)?;

    let variant_matches = data_enum
        .variants
        .iter()
        .map(|variant| {
            if !variant.fields.is_empty() {
                return Err(syn::Error::new(
                    variant.span(),
                    "#[derive(IntoThemeField)] variants can't carry fields",
                ));
            }

            let ident = &variant.ident;
            let field_path = theme_expr(&variant.attrs, variant.span())?;

            Ok(quote! {
                #name::#ident => &theme.#field_path,
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl #name {
            pub fn resolve<'a>(&self, theme: &'a ::sonnat_theme::Theme) -> &'a #field_type {
                match self {
                    #(#variant_matches)*
                }
            }
        }
    })
}

fn theme_expr(attrs: &[Attribute], span: proc_macro2::Span) -> syn::Result<Expr> {
    let theme_attr = attrs
        .iter()
        .find(|attr| attr.path().is_ident("theme"))
        .ok_or_else(|| syn::Error::new(span, "variant is missing a #[theme(...)] attribute"))?;

    match &theme_attr.meta {
        Meta::List(list) => syn::parse2(list.tokens.clone()),
        meta => Err(syn::Error::new(meta.span(), "#[theme(...)] must be a list")),
    }
}

fn enum_field_type(input: &DeriveInput) -> syn::Result<Type> {
    let field_attr = input
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("field"))
        .ok_or_else(|| {
            syn::Error::new(input.span(), "enum is missing a #[field(...)] attribute")
        })?;

    match &field_attr.meta {
        Meta::List(list) => syn::parse2::<Type>(list.tokens.clone()),
        meta => Err(syn::Error::new(
            meta.span(),
            "#[field(...)] must be a list, like #[field(String)]",
        )),
    }
}
