use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one over a fresh server,
/// optionally logging in first, and inject dependencies.
///
/// The optional argument is one of `root`, `party` (registered by root
/// before logging in) or `voter`, logging the client in as the matching
/// example principal.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// [`crate::model::clock::ManualClock`], the clock driving the server's ledger.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Log in the client as root/party/voter if needed.
    let maybe_login = match parse_macro_input!(args as Option<Ident>) {
        None => quote! {},
        Some(arg) if arg == "root" => quote! {
            crate::api::auth::login_as(
                &rocket_client,
                crate::model::common::Principal::example_root(),
            )
            .await;
        },
        Some(arg) if arg == "party" => quote! {
            rocket_client
                .rocket()
                .state::<crate::model::ledger::Ledger>()
                .unwrap()
                .register_party(
                    &crate::model::common::Principal::example_root(),
                    crate::model::common::Principal::example_party(),
                )
                .unwrap();
            crate::api::auth::login_as(
                &rocket_client,
                crate::model::common::Principal::example_party(),
            )
            .await;
        },
        Some(arg) if arg == "voter" => quote! {
            crate::api::auth::login_as(
                &rocket_client,
                crate::model::common::Principal::example_voter(),
            )
            .await;
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected one of `root`, `party` or `voter`")
                .into_compile_error()
                .into();
        }
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup(clock: crate::model::clock::ManualClock) -> rocket::local::asynchronous::Client {
                let rocket = crate::rocket_with_clock(
                    crate::test_figment(),
                    std::sync::Arc::new(clock),
                );
                let rocket_client = rocket::local::asynchronous::Client::tracked(rocket)
                    .await
                    .unwrap();

                #maybe_login

                rocket_client
            }

            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            let clock = crate::model::clock::ManualClock::default();
            let rocket_client = runtime.block_on(setup(clock.clone()));

            runtime.block_on(#new_name(#(#test_args),*));
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_clock = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                // Valid as the last path segment for any type is itself
                let type_ident = &type_path.path.segments.last().unwrap().ident;
                if type_ident == "Client" {
                    if has_client {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                        ));
                    }
                    has_client = true;
                    args.push(quote! { rocket_client });
                    continue;
                } else if type_ident == "ManualClock" {
                    if has_clock {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `ManualClock`",
                        ));
                    }
                    has_clock = true;
                    args.push(quote! { clock });
                    continue;
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `clock_ident: ManualClock`",
        ));
    }

    Ok(args)
}
