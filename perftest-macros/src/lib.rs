//! perftest Macros
//!
//! `#[perftest]` registers a check function with the runner.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{ItemFn, ReturnType, parse_macro_input};

/// Register a check function
///
/// The function takes the check context and either returns nothing or a
/// `Result<(), E>` whose error converts into `CheckError` (for example
/// `PerfError`). Only functions whose name starts with `perftest_` and
/// that live in a `perftest_*.rs` module are picked up by discovery.
///
/// # Example
///
/// ```ignore
/// #[perftest]
/// fn perftest_sum(ctx: &mut CheckContext<'_>) -> CheckResult {
///     ctx.time_test(sum_values, (1000u64,), Limit::raw(1e-4))?;
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn perftest(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(args);
    let func = parse_macro_input!(item as ItemFn);

    perftest_impl(args, func)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn perftest_impl(args: TokenStream2, func: ItemFn) -> Result<TokenStream2, syn::Error> {
    if !args.is_empty() {
        return Err(syn::Error::new_spanned(
            args,
            "perftest: the attribute takes no arguments",
        ));
    }
    validate_signature(&func)?;

    let fn_name = &func.sig.ident;
    let fn_name_str = fn_name.to_string();
    let wrapper_name = format_ident!("__perftest_wrapper_{}", fn_name);

    let runner_block = match &func.sig.output {
        ReturnType::Default => quote! {
            #fn_name(ctx);
            ::core::result::Result::Ok(())
        },
        ReturnType::Type(..) => quote! {
            #fn_name(ctx).map_err(::core::convert::Into::into)
        },
    };

    Ok(quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #wrapper_name(ctx: &mut ::perftest::CheckContext<'_>) -> ::perftest::CheckResult {
            #runner_block
        }

        ::perftest::internal::inventory::submit! {
            ::perftest::CheckDef {
                name: #fn_name_str,
                module_path: module_path!(),
                file: file!(),
                line: line!(),
                runner_fn: #wrapper_name,
            }
        }
    })
}

fn validate_signature(func: &ItemFn) -> syn::Result<()> {
    if func.sig.inputs.len() != 1 {
        return Err(syn::Error::new_spanned(
            &func.sig,
            "perftest: Function must take exactly one argument: `&mut CheckContext<'_>`",
        ));
    }
    if func.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            func.sig.asyncness,
            "perftest: checks run synchronously; async functions are not supported",
        ));
    }
    if !func.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.generics,
            "perftest: check functions cannot be generic",
        ));
    }
    Ok(())
}
