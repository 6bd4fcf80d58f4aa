use proc_macro2::TokenStream;
use quote::quote;

/// Determines what path should be used to refer to the `beacon` crate:
/// `crate::...` from inside beacon itself, `beacon::...` everywhere else.
pub fn beacon_crate_path() -> TokenStream {
    let is_internal = std::env::var("CARGO_CRATE_NAME")
        .map(|crate_name| crate_name == "beacon")
        .unwrap_or_default();

    #[cfg(doctest)]
    let is_internal = false;

    match is_internal {
        true => quote!(crate),
        false => quote!(beacon),
    }
}
