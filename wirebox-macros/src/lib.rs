//! Derive macros for Wirebox.
//!
//! `#[derive(Injectable)]` turns a struct whose fields are `Arc<T>`
//! dependencies into a class provider:
//!
//! ```rust,ignore
//! #[derive(Injectable)]
//! #[injectable(scoped, token = "IUserService")]
//! struct UserService {
//!     repo: Arc<UserRepository>,
//!     #[inject(token = "clock")]
//!     clock: Arc<SystemClock>,
//! }
//! ```
//!
//! Container-level options (`#[injectable(...)]`):
//! - `token = "..."`: register under a named token instead of the type
//! - `singleton` / `scoped`: lifetime (transient when neither is given)
//! - `register`: submit the type for `Container::register_discovered()`
//!
//! Field options (`#[inject(...)]`):
//! - `token = "..."`: resolve this field from a named token

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod injectable;

#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::expand(&input)
        .unwrap_or_else(darling::Error::write_errors)
        .into()
}
