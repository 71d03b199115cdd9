use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Lit, Meta, Token};

/// Helper enum for parsed attribute values
enum MetaValue {
    Str(String),
    Expr(Expr),
    Flag,
}

/// Declares a struct whose members are `envfield::Field<T>` handles, and an
/// `envfield::Declare` impl that registers all of them in one call.
///
/// ```rust,ignore
/// define_config! {
///     pub struct ServerConfig {
///         /// Port to listen on
///         #[field(env = "PORT", default = 8080, required)]
///         pub port: i64,
///         #[field(env = "MODE", default = String::from("dev"), allowed = ["dev", "prod"])]
///         pub mode: String,
///     }
/// }
///
/// let config = ServerConfig::declare(&mut registry);
/// ```
#[proc_macro]
pub fn define_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_config(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_config(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let vis = &input.vis;
    let struct_attrs = &input.attrs;

    // Extract fields from the struct
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "define_config! only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "define_config! only supports structs",
            ));
        }
    };

    let mut field_defs = Vec::new();
    let mut declare_fields = Vec::new();
    let mut field_names = Vec::new();

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let field_vis = &field.vis;
        let field_type = &field.ty;
        let config = parse_field_config(field)?;

        // Keep doc comments and cfg attributes on the generated member
        let kept_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| !attr.path().is_ident("field"))
            .collect();
        let cfg_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .collect();

        field_defs.push(quote! {
            #(#kept_attrs)*
            #field_vis #field_name: ::envfield::Field<#field_type>
        });

        let env_var = &config.env_var;
        let default = &config.default;
        let mut options = quote! { ::envfield::Options::new() };
        if config.required {
            options = quote! { #options.required() };
        }
        if let Some(allowed) = &config.allowed {
            options = quote! { #options.allowed_values(#allowed) };
        }
        if let Some(description) = &config.description {
            options = quote! { #options.description(#description) };
        }

        declare_fields.push(quote! {
            #(#cfg_attrs)*
            let #field_name = __envfield_registry.field::<#field_type>(#env_var, #default, #options);
        });
        field_names.push(quote! {
            #(#cfg_attrs)*
            #field_name
        });
    }

    // Generate the struct definition
    let struct_def = quote! {
        #(#struct_attrs)*
        #vis struct #struct_name {
            #(#field_defs),*
        }
    };

    let declare_impl = quote! {
        impl ::envfield::Declare for #struct_name {
            fn declare(__envfield_registry: &mut ::envfield::Registry) -> Self {
                #(#declare_fields)*

                Self {
                    #(#field_names),*
                }
            }
        }

        impl #struct_name {
            /// Declare every field of this group in `registry`
            #vis fn declare(__envfield_registry: &mut ::envfield::Registry) -> Self {
                <Self as ::envfield::Declare>::declare(__envfield_registry)
            }
        }
    };

    Ok(quote! {
        #struct_def
        #declare_impl
    })
}

#[derive(Debug)]
struct FieldConfig {
    env_var: String,
    default: Expr,
    required: bool,
    allowed: Option<Expr>,
    description: Option<String>,
}

/// Parse #[field(env = "X", default = val, required, allowed = [..], doc = "Y")] syntax
fn parse_field_list(meta_list: &syn::MetaList) -> syn::Result<HashMap<String, MetaValue>> {
    let mut values = HashMap::new();

    meta_list.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("expected identifier"))?
            .to_string();

        match key.as_str() {
            "env" | "doc" => {
                meta.input.parse::<Token![=]>()?;
                let value: syn::LitStr = meta.input.parse()?;
                values.insert(key, MetaValue::Str(value.value()));
            }
            "default" | "allowed" => {
                meta.input.parse::<Token![=]>()?;
                let expr: Expr = meta.input.parse()?;
                values.insert(key, MetaValue::Expr(expr));
            }
            "required" => {
                values.insert(key, MetaValue::Flag);
            }
            _ => {
                return Err(meta.error(
                    "unknown field option, expected one of: env, default, required, allowed, doc",
                ));
            }
        }

        Ok(())
    })?;

    Ok(values)
}

fn parse_field_config(field: &syn::Field) -> syn::Result<FieldConfig> {
    // Find the #[field(...)] attribute
    let field_attr = field
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("field"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                field,
                "field must have #[field(...)] attribute with env and default",
            )
        })?;

    // Parse it as a Meta::List
    let mut parsed = match &field_attr.meta {
        Meta::List(list) => parse_field_list(list)?,
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field attribute must be a list: #[field(env = \"...\", ...)]",
            ));
        }
    };

    let env_var = match parsed.remove("env") {
        Some(MetaValue::Str(s)) => s,
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field must have env = \"VAR_NAME\"",
            ));
        }
    };

    let default = match parsed.remove("default") {
        Some(MetaValue::Expr(e)) => e,
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field must have default = value",
            ));
        }
    };

    let allowed = match parsed.remove("allowed") {
        Some(MetaValue::Expr(e)) => Some(e),
        _ => None,
    };

    // An explicit doc wins over doc comments
    let description = match parsed.remove("doc") {
        Some(MetaValue::Str(s)) => Some(s.trim().to_string()),
        _ => doc_comment(&field.attrs),
    };

    Ok(FieldConfig {
        env_var,
        default,
        required: parsed.contains_key("required"),
        allowed,
        description,
    })
}

/// Joins `///` lines into a single sentence
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}
