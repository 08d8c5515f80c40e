//! Calibench Macros
//!
//! Procedural macros for benchmark and trigger registration.
//!
//! ## Macros
//!
//! - `#[bench]` - Register a top-level benchmark function
//! - `#[trigger]` - Register a hook run once before or after the suite

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{ItemFn, ReturnType, parse_macro_input};

// ============================================================================
// Attribute Parsing Helpers
// ============================================================================

mod attr {
    use syn::meta::ParseNestedMeta;

    /// Get the attribute name as a string
    pub fn name(meta: &ParseNestedMeta) -> String {
        meta.path
            .get_ident()
            .map(|i| i.to_string())
            .unwrap_or_default()
    }

    /// Parse a string literal attribute: `attr = "value"`
    pub fn string(meta: &ParseNestedMeta) -> syn::Result<String> {
        let value: syn::LitStr = meta.value()?.parse()?;
        Ok(value.value())
    }

    /// Parse a positive integer literal attribute: `attr = 42`
    pub fn positive_int(meta: &ParseNestedMeta) -> syn::Result<u64> {
        let value: syn::LitInt = meta.value()?.parse()?;
        let n: u64 = value.base10_parse()?;
        if n == 0 {
            return Err(syn::Error::new_spanned(value, "must be greater than zero"));
        }
        Ok(n)
    }

    /// Parse a comma-separated string as tags: `tags = "a, b, c"`
    pub fn tags(meta: &ParseNestedMeta) -> syn::Result<Vec<String>> {
        let value: syn::LitStr = meta.value()?.parse()?;
        Ok(value
            .value()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Create an unknown attribute error
    pub fn unknown(meta: &ParseNestedMeta, name: &str) -> syn::Error {
        meta.error(format!("unknown attribute: {}", name))
    }
}

/// Register a benchmark function
///
/// The function takes `&mut Bencher` and returns either `()` or `Outcome`.
///
/// # Example
///
/// ```ignore
/// #[bench]
/// fn sum(b: &mut Bencher) {
///     for i in 0..b.n() {
///         black_box(i);
///     }
/// }
///
/// // With configuration
/// #[bench(name = "parse/large", time = "250ms", tags = "parser, slow")]
/// fn parse_large(b: &mut Bencher) -> Outcome {
///     let Some(input) = load_fixture() else {
///         return b.skip("fixture missing");
///     };
///     ...
/// }
///
/// // Fixed iteration count
/// #[bench(iterations = 1000)]
/// fn warm_path(b: &mut Bencher) { ... }
/// ```
#[proc_macro_attribute]
pub fn bench(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(args);
    let func = parse_macro_input!(item as ItemFn);

    bench_impl(args, func)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn bench_impl(args: TokenStream2, func: ItemFn) -> Result<TokenStream2, syn::Error> {
    validate_signature(&func, 1, "exactly one argument: `&mut Bencher`")?;

    let config = parse_bench_config(args)?;

    let fn_name = &func.sig.ident;
    let wrapper_name = format_ident!("__calibench_bench_{}", fn_name);

    let call = match func.sig.output {
        ReturnType::Default => quote! {
            #fn_name(bencher);
            ::core::result::Result::Ok(())
        },
        ReturnType::Type(..) => quote! { #fn_name(bencher) },
    };

    let name = config.name.unwrap_or_else(|| fn_name.to_string());
    let tags = &config.tags;
    let iterations = option_tokens(config.iterations);
    let target_ns = option_tokens(config.target_ns);

    Ok(quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #wrapper_name(bencher: &mut ::calibench::Bencher) -> ::calibench::Outcome {
            #call
        }

        ::calibench::internal::inventory::submit! {
            ::calibench::BenchmarkDef {
                name: #name,
                tags: &[#(#tags),*],
                runner_fn: #wrapper_name,
                iterations: #iterations,
                target_ns: #target_ns,
                file: file!(),
                line: line!(),
                module_path: module_path!(),
            }
        }
    })
}

#[derive(Default)]
struct BenchConfig {
    name: Option<String>,
    tags: Vec<String>,
    iterations: Option<u64>,
    target_ns: Option<u64>,
}

fn parse_bench_config(args: TokenStream2) -> Result<BenchConfig, syn::Error> {
    let mut config = BenchConfig::default();
    if args.is_empty() {
        return Ok(config);
    }

    let parser = syn::meta::parser(|meta| {
        let name = attr::name(&meta);
        match name.as_str() {
            "name" => config.name = Some(attr::string(&meta)?),
            "tags" => config.tags = attr::tags(&meta)?,
            "iterations" => config.iterations = Some(attr::positive_int(&meta)?),
            "time" => {
                let value = attr::string(&meta)?;
                config.target_ns = Some(
                    target_nanos(&value)
                        .ok_or_else(|| meta.error(format!("invalid duration: {value:?}")))?,
                );
            }
            _ => return Err(attr::unknown(&meta, &name)),
        }
        Ok(())
    });

    syn::parse::Parser::parse2(parser, args)?;

    if config.iterations.is_some() && config.target_ns.is_some() {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "Calibench: `iterations` and `time` are mutually exclusive",
        ));
    }

    Ok(config)
}

/// Register a hook run once around the whole suite
///
/// The function takes no arguments and returns `()` or `TriggerResult`.
/// A failing trigger is logged and counted; benchmarks still run.
///
/// # Example
///
/// ```ignore
/// #[trigger(before)]
/// fn warm_cache() -> TriggerResult {
///     std::fs::read("fixtures/corpus.bin")?;
///     Ok(())
/// }
///
/// #[trigger(after, name = "cleanup")]
/// fn remove_temp_files() { ... }
/// ```
#[proc_macro_attribute]
pub fn trigger(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(args);
    let func = parse_macro_input!(item as ItemFn);

    trigger_impl(args, func)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn trigger_impl(args: TokenStream2, func: ItemFn) -> Result<TokenStream2, syn::Error> {
    validate_signature(&func, 0, "no arguments")?;

    let mut phase: Option<TokenStream2> = None;
    let mut name: Option<String> = None;
    let parser = syn::meta::parser(|meta| {
        let key = attr::name(&meta);
        match key.as_str() {
            "before" => phase = Some(quote! { ::calibench::TriggerPhase::Before }),
            "after" => phase = Some(quote! { ::calibench::TriggerPhase::After }),
            "name" => name = Some(attr::string(&meta)?),
            _ => return Err(attr::unknown(&meta, &key)),
        }
        Ok(())
    });
    syn::parse::Parser::parse2(parser, args)?;

    let phase = phase.ok_or_else(|| {
        syn::Error::new_spanned(
            &func.sig.ident,
            "Calibench: trigger needs a phase, `#[trigger(before)]` or `#[trigger(after)]`",
        )
    })?;

    let fn_name = &func.sig.ident;
    let wrapper_name = format_ident!("__calibench_trigger_{}", fn_name);
    let name = name.unwrap_or_else(|| fn_name.to_string());

    let call = match func.sig.output {
        ReturnType::Default => quote! {
            #fn_name();
            ::core::result::Result::Ok(())
        },
        ReturnType::Type(..) => quote! { #fn_name() },
    };

    Ok(quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #wrapper_name() -> ::calibench::TriggerResult {
            #call
        }

        ::calibench::internal::inventory::submit! {
            ::calibench::TriggerDef {
                name: #name,
                phase: #phase,
                hook: #wrapper_name,
                file: file!(),
                line: line!(),
            }
        }
    })
}

fn validate_signature(func: &ItemFn, inputs: usize, expected: &str) -> syn::Result<()> {
    if func.sig.inputs.len() != inputs {
        return Err(syn::Error::new_spanned(
            &func.sig,
            format!("Calibench: Function must take {expected}"),
        ));
    }
    if let Some(asyncness) = &func.sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "Calibench: async functions are not supported",
        ));
    }
    Ok(())
}

fn option_tokens(value: Option<u64>) -> TokenStream2 {
    value
        .map(|v| quote! { ::core::option::Option::Some(#v) })
        .unwrap_or(quote! { ::core::option::Option::None })
}

/// Nanoseconds for a `time = "..."` value, using the runtime's duration grammar.
fn target_nanos(s: &str) -> Option<u64> {
    calibench_core::parse_duration(s).ok().filter(|&nanos| nanos > 0)
}
