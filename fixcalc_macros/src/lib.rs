use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, PatType, Type};

enum ParamKind {
    /// A number; sentinels never reach the body.
    Fixed,
    /// Passed through unchanged, sentinels included.
    Value,
}

fn param_kind(ty: &Type, fn_name: &Ident) -> syn::Result<ParamKind> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            match segment.ident.to_string().as_str() {
                "Fixed" => return Ok(ParamKind::Fixed),
                "Value" => return Ok(ParamKind::Value),
                _ => {}
            }
        }
    }
    Err(syn::Error::new(
        ty.span(),
        format!("Unsupported parameter type for {}, expected Fixed or Value", fn_name),
    ))
}

/// Turns `fn f(x: Fixed, y: Value) -> Value` into a function callable from
/// expressions, `fn f(args: &mut Args<'_>) -> Value`.
///
/// All arguments are evaluated once, left to right. A call with the wrong
/// number of arguments yields `Value::Undefined`. If a `Fixed` parameter
/// receives a sentinel the body is skipped and the sentinel returned
/// (`Undefined` wins over `Overflow`). `Args` and `Value` must be in scope.
#[proc_macro_attribute]
pub fn fixcalc_fn(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    match expand(input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

fn expand(input: ItemFn) -> syn::Result<TokenStream2> {
    let fn_name = &input.sig.ident;
    let fn_vis = &input.vis;
    let fn_attrs = &input.attrs;
    let fn_body = &input.block;
    let fn_output = &input.sig.output;

    let mut extractions = Vec::new();
    let mut fixed_indices = Vec::new();

    for (i, arg) in input.sig.inputs.iter().enumerate() {
        let FnArg::Typed(PatType { pat, ty, .. }) = arg else {
            return Err(syn::Error::new(arg.span(), "self parameters are not supported"));
        };
        let arg_name = match **pat {
            Pat::Ident(ref ident) => &ident.ident,
            _ => return Err(syn::Error::new(pat.span(), "Unsupported pattern")),
        };

        let extract_code = match param_kind(ty, fn_name)? {
            ParamKind::Fixed => {
                fixed_indices.push(i);
                quote! {
                    let #arg_name = match __values[#i] {
                        Value::Number(n) => n,
                        _ => return Value::Undefined,
                    };
                }
            }
            ParamKind::Value => quote! {
                let #arg_name = __values[#i];
            },
        };
        extractions.push(extract_code);
    }

    let args_len = extractions.len();
    let evaluation = if args_len == 0 {
        quote! {}
    } else {
        quote! { let __values = args.eval_all(); }
    };
    let guard = if fixed_indices.is_empty() {
        quote! {}
    } else {
        quote! {
            let mut __sentinel = None;
            for &i in &[#(#fixed_indices),*] {
                match __values[i] {
                    Value::Undefined => return Value::Undefined,
                    Value::Overflow => __sentinel = Some(Value::Overflow),
                    Value::Number(_) => {}
                }
            }
            if let Some(sentinel) = __sentinel {
                return sentinel;
            }
        }
    };

    Ok(quote! {
        #(#fn_attrs)*
        #fn_vis fn #fn_name(args: &mut Args<'_>) #fn_output {
            if args.len() != #args_len {
                return Value::Undefined;
            }

            #evaluation
            #guard
            #(#extractions)*

            #fn_body
        }
    })
}
