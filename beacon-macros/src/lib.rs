//! Defines the beacon runtime macros.

#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

extern crate proc_macro;

mod helpers;

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, ItemFn, ReturnType, Stmt};

use crate::helpers::beacon_crate_path;

/// Macro definition for the beacon runtime.
///
/// This macro should be used once only in a project, on the `main` function.
///
/// _Runs the function on a tokio runtime and waits, before returning, for every task started with
/// `beacon::utils::task::run` (a running scheduler loop included) to be done._
///
/// # Example
/// ```
/// #[beacon_macros::runtime]
/// async fn main() {
///     // whatever
/// }
/// ```
#[proc_macro_attribute]
pub fn runtime(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro(item, false)
}

/// Same as `#[beacon_macros::runtime]` but for tests.
#[proc_macro_attribute]
pub fn test(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro(item, true)
}

fn runtime_macro(item: TokenStream, test: bool) -> TokenStream {
    let beacon = beacon_crate_path();
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = parse_macro_input!(item as ItemFn);

    let mut stmts = block.stmts;

    // A trailing expression is the return value: it must come after the wait.
    let has_return_type = match &sig.output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => {
            !matches!(&**ty, syn::Type::Tuple(tuple) if tuple.elems.is_empty())
        }
    };
    let return_expr = match has_return_type {
        true => match stmts.pop() {
            Some(Stmt::Expr(expr, None)) => Some(expr),
            Some(stmt) => {
                stmts.push(stmt);
                None
            }
            None => None,
        },
        false => None,
    };

    // The tokio re-exported by beacon: callers need no tokio dependency of their own.
    let tokio_path = format!("{}::utils::tokio", beacon);
    let tokio_attr = match test {
        true => quote! { #[#beacon::utils::tokio::test(crate = #tokio_path)] },
        false => quote! { #[#beacon::utils::tokio::main(crate = #tokio_path)] },
    };

    let expanded = quote! {
        #tokio_attr
        #(#attrs)*
        #vis #sig {
            #beacon::utils::task::init_task_channel().await;
            #(#stmts)*
            #beacon::utils::task::wait_for_tasks().await;
            #return_expr
        }
    };

    TokenStream::from(expanded)
}
