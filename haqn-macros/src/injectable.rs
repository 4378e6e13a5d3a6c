use darling::{FromDeriveInput, FromField, ast};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, GenericArgument, Ident, Lit, PathArguments, Type, parse_macro_input};

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: Ident,
    generics: syn::Generics,
    data: ast::Data<(), InjectField>,
    #[darling(default)]
    name: Option<String>,
    #[darling(multiple)]
    implements: Vec<String>,
    #[darling(default)]
    extends: Option<String>,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    class: Option<String>,
    #[darling(default)]
    default: Option<Lit>,
    #[darling(default)]
    optional: bool,
    #[darling(default)]
    skip: bool,
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let parsed = match InjectableInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(err) => return err.write_errors().into(),
    };

    match expand(parsed) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: InjectableInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Injectable cannot be derived for generic types; register a ClassDescriptor by hand",
        ));
    }

    let name = match &input.name {
        Some(name) => quote!(#name),
        None => quote!(::core::concat!(::core::module_path!(), "::", ::core::stringify!(#ident))),
    };

    let implements = input.implements.iter().map(|interface| quote!(.implements(#interface)));
    let extends = input.extends.as_ref().map(|parent| quote!(.extends(#parent)));

    let fields = match input.data {
        ast::Data::Struct(fields) => fields,
        ast::Data::Enum(_) => {
            return Err(syn::Error::new_spanned(ident, "Injectable can only be derived for structs"));
        }
    };

    let build = if fields.style.is_unit() {
        quote!(.without_constructor(|| #ident))
    } else {
        constructor(ident, &fields.fields)?
    };

    Ok(quote! {
        impl ::haqn::Injectable for #ident {
            const NAME: &'static str = #name;

            fn descriptor() -> ::haqn::reflection::ClassDescriptor {
                ::haqn::reflection::ClassDescriptor::new(<Self as ::haqn::Injectable>::NAME)
                    #(#implements)*
                    #extends
                    #build
            }
        }

        ::haqn::inventory::submit! {
            ::haqn::reflection::ClassRegistration::new(<#ident as ::haqn::Injectable>::descriptor)
        }
    })
}

fn constructor(ident: &Ident, fields: &[InjectField]) -> syn::Result<TokenStream2> {
    let mut params = Vec::new();
    let mut inits = Vec::new();

    for field in fields {
        let Some(field_ident) = &field.ident else {
            continue;
        };

        if field.skip {
            inits.push(quote!(#field_ident: ::core::default::Default::default()));
            continue;
        }

        let position = params.len();
        params.push(parameter(field_ident, field)?);
        inits.push(quote!(#field_ident: args.get(#position)?));
    }

    Ok(quote! {
        .constructor([#(#params),*], |args: ::haqn::Args| {
            ::core::result::Result::Ok(#ident { #(#inits),* })
        })
    })
}

fn parameter(field_ident: &Ident, field: &InjectField) -> syn::Result<TokenStream2> {
    let param_name = field.name.clone().unwrap_or_else(|| field_ident.to_string());

    let (hint, nullable) = match (&field.class, injected_class(&field.ty)) {
        (Some(class), Some((_, nullable))) => (quote!(.class(#class)), nullable),
        (Some(class), None) => (quote!(.class(#class)), false),
        (None, Some((inner, nullable))) => (quote!(.class(<#inner as ::haqn::Injectable>::NAME)), nullable),
        (None, None) => {
            let builtin = builtin_name(&field.ty);
            (quote!(.builtin(#builtin)), false)
        }
    };

    if nullable && field.default.is_some() {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "an Option<Arc<_>> parameter already defaults to null",
        ));
    }

    let default = match &field.default {
        Some(lit) => quote!(.with_default(#lit)),
        None if nullable => quote!(.with_default(::haqn::Value::Null)),
        None => quote!(),
    };
    let optional = field.optional.then(|| quote!(.optional()));

    Ok(quote! {
        ::haqn::reflection::Parameter::new(#param_name) #hint #default #optional
    })
}

/// `Arc<T>` yields `(T, false)`, `Option<Arc<T>>` yields `(T, true)`.
fn injected_class(ty: &Type) -> Option<(&Type, bool)> {
    if let Some(inner) = single_generic(ty, "Arc") {
        return matches!(inner, Type::Path(_)).then_some((inner, false));
    }
    let inner = single_generic(ty, "Option")?;
    let inner = single_generic(inner, "Arc")?;
    matches!(inner, Type::Path(_)).then_some((inner, true))
}

fn single_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn builtin_name(ty: &Type) -> String {
    let name = match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        other => quote!(#other).to_string(),
    };

    match name.as_str() {
        "String" | "str" => "string".to_string(),
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => "int".to_string(),
        "f32" | "f64" => "float".to_string(),
        "bool" => "bool".to_string(),
        "Vec" | "BTreeMap" | "HashMap" => "array".to_string(),
        _ => name,
    }
}
