//! Types that describe their own registration.
//!
//! [`Injectable`] carries everything a class provider needs: the token,
//! the lifetime, the ordered dependency tokens and the constructor. It
//! is usually derived with `#[derive(Injectable)]` from the `wirebox`
//! crate, but can be written by hand.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! struct Clock;
//!
//! struct Greeter {
//!     clock: Arc<Clock>,
//! }
//!
//! impl Injectable for Greeter {
//!     fn lifetime() -> Lifetime {
//!         Lifetime::Scoped
//!     }
//!
//!     fn dependencies() -> Vec<Token> {
//!         vec![Token::of::<Clock>()]
//!     }
//!
//!     fn construct(args: &mut Arguments) -> Result<Self> {
//!         Ok(Greeter { clock: args.take()? })
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_instance(Token::of::<Clock>(), Clock).unwrap();
//! container.register_injectable::<Greeter>().unwrap();
//!
//! let greeter: Arc<Greeter> = container.resolve_type().unwrap();
//! let clock: Arc<Clock> = container.resolve_type().unwrap();
//! assert!(Arc::ptr_eq(&greeter.clock, &clock));
//! ```

use crate::error::Result;
use crate::lifetime::Lifetime;
use crate::provider::Arguments;
use crate::token::Token;

/// Registration metadata and constructor of a class.
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Token this type is registered under. Defaults to the type itself.
    fn token() -> Token {
        Token::of::<Self>()
    }

    /// Defaults to [`Lifetime::Transient`].
    fn lifetime() -> Lifetime {
        Lifetime::Transient
    }

    /// Dependency tokens, in the order [`construct`](Injectable::construct) takes them.
    fn dependencies() -> Vec<Token>;

    /// Build the value from its resolved dependencies.
    fn construct(args: &mut Arguments) -> Result<Self>;
}

/// Static discovery of `#[injectable(register)]` types.
///
/// Used by the derive macro; not a stable API.
#[doc(hidden)]
pub mod internal {
    use crate::container::Container;
    use crate::error::Result;
    use crate::registry::RegistrationId;

    pub use inventory::submit;

    /// One type submitted for discovery.
    pub struct Discovered {
        pub name: &'static str,
        pub register: fn(&Container) -> Result<RegistrationId>,
    }

    inventory::collect!(Discovered);
}
