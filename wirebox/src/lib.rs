//! # Wirebox: token-based dependency injection for Rust
//!
//! Register providers under tokens, resolve object graphs on demand,
//! and isolate per-request state in scopes.
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox::prelude::*;
//!
//! #[derive(Injectable)]
//! #[injectable(singleton)]
//! struct Config;
//!
//! #[derive(Injectable)]
//! #[injectable(scoped)]
//! struct Session {
//!     config: Arc<Config>,
//! }
//!
//! let container = Container::new();
//! container.register_injectable::<Config>().unwrap();
//! container.register_injectable::<Session>().unwrap();
//!
//! let request = container.create_scope();
//! let session: Arc<Session> = request.resolve_type().unwrap();
//! let config: Arc<Config> = container.resolve_type().unwrap();
//! assert!(Arc::ptr_eq(&session.config, &config));
//! ```

pub use wirebox_container::*;
pub use wirebox_macros::Injectable;
pub use wirebox_support::rendering;

#[doc(hidden)]
pub use wirebox_container::injectable::internal;

pub mod prelude {
    pub use wirebox_container::prelude::*;
    pub use wirebox_macros::Injectable;
}
