//! Instance reuse policies.
//!
//! A [`Lifetime`] is attached to every registration and decides which
//! cache tier (if any) holds the instances it produces:
//! - [`Lifetime::Transient`]: never cached, a new instance every resolve
//! - [`Lifetime::Singleton`]: one instance for the whole scope family
//! - [`Lifetime::Scoped`]: one instance per scope
use std::fmt;

use serde::Serialize;

/// Defines how long a resolved instance is reused.
///
/// # Examples
/// ```
/// use wirebox_container::lifetime::Lifetime;
///
/// assert_eq!(Lifetime::default(), Lifetime::Transient);
/// assert!(Lifetime::Scoped.is_cached());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Lifetime {
    /// New instance created on every resolve call.
    ///
    /// # When to use
    /// - Lightweight stateless services
    /// - Objects with mutable state that shouldn't be shared
    #[default]
    Transient,

    /// One instance shared by the root container and every scope
    /// created from it, directly or transitively.
    ///
    /// Created on first resolve anywhere in the family, lives until
    /// the family is reset or dropped.
    Singleton,

    /// One instance per scope (e.g., per HTTP request).
    ///
    /// Parent, child and sibling scopes never share these instances.
    Scoped,
}

impl Lifetime {
    /// Returns `true` if instances with this lifetime are cached.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::Scoped)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Transient => write!(f, "Transient"),
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Scoped => write!(f, "Scoped"),
        }
    }
}

/// Options accepted by [`Container::register`](crate::container::Container::register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistrationOptions {
    pub lifetime: Lifetime,
}

impl RegistrationOptions {
    pub fn new(lifetime: Lifetime) -> Self {
        Self { lifetime }
    }
}

impl From<Lifetime> for RegistrationOptions {
    fn from(lifetime: Lifetime) -> Self {
        Self { lifetime }
    }
}
