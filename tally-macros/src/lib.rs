use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Error, Ident, ItemFn};

/// Proc macro to denote a benchmarked Operation
///
/// Turns a zero-argument `async fn` returning `Result<T, E>` into a function returning a
/// configurable run. `T` must convert into `tally::Metadata` (`()` works) and `E` must implement
/// `Display`. The run is named after the function unless `.name()` is called.
///
/// # Example
/// ```ignore
/// use tally::prelude::*;
///
/// #[operation]
/// async fn insert_transaction() -> Result<Metadata, sqlx::Error> {
///     ...
/// }
///
/// let report = insert_transaction()
///     .target("PostgreSQL")
///     .count(1_000)
///     .concurrency(10)
///     .await?;
/// ```
#[proc_macro_attribute]
pub fn operation(attr: TokenStream, item: TokenStream) -> TokenStream {
    match operation_internal(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn operation_internal(_attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let input = syn::parse2::<ItemFn>(item)?;

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    if sig.asyncness.is_none() {
        return Err(Error::new_spanned(
            sig.fn_token,
            "#[operation] only works on async functions",
        ));
    }

    if !sig.inputs.is_empty() {
        return Err(Error::new_spanned(
            &sig.inputs,
            "#[operation] functions cannot take arguments; capture them in a closure and use `tally::Run::new` instead",
        ));
    }

    let stmts = &block.stmts;

    let op_name = sig.ident.clone();
    let inner_name = Ident::new(&format!("__tally_{}", sig.ident), Span::call_site());
    let mut inner_sig = sig.clone();
    inner_sig.ident = inner_name.clone();

    let mut run_sig = sig;
    run_sig.asyncness = None;
    run_sig.output = syn::parse2(quote! {
        -> impl ::tally::run::ConfigurableRun
    })?;

    Ok(quote! {
        #(#attrs)* #vis #run_sig {
            ::tally::run::Run::new(stringify!(#op_name), #inner_name)
        }

        #[doc(hidden)]
        #(#attrs)* #vis #inner_sig {
            #(#stmts)*
        }
    })
}
