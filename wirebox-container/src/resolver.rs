//! The resolution interface seen by factories and callers.
//!
//! [`Resolver`] is object-safe so factories can receive `&dyn Resolver`.
//! Typed access lives on the [`ResolverApi`] extension trait, which every
//! resolver gets for free.

use std::any::{Any, type_name};
use std::sync::Arc;

use crate::container::ScopeId;
use crate::error::{Result, WireboxError};
use crate::provider::Instance;
use crate::token::Token;

/// Resolves tokens against one scope.
///
/// Implemented by [`Container`](crate::container::Container) itself and
/// by the context a factory receives while it runs. Resolving through
/// the latter keeps the in-progress chain, so cycles that pass through
/// factories are still detected.
pub trait Resolver: Send + Sync {
    /// Resolves the active registration of `token`.
    fn resolve_instance(&self, token: &Token) -> Result<Instance>;

    /// Resolves every registration of `token`, in registration order.
    fn resolve_all_instances(&self, token: &Token) -> Result<Vec<Instance>>;

    /// Returns `true` if `token` has at least one registration.
    fn is_registered(&self, token: &Token) -> bool;

    /// Id of the scope resolutions run against.
    fn scope_id(&self) -> ScopeId;
}

/// Typed helpers over any [`Resolver`].
///
/// ```
/// use std::sync::Arc;
/// use wirebox_container::prelude::*;
///
/// let container = Container::new();
/// container.register_instance("greeting", String::from("hello")).unwrap();
///
/// let greeting: Arc<String> = container.resolve("greeting").unwrap();
/// assert_eq!(greeting.as_str(), "hello");
/// ```
pub trait ResolverApi: Resolver {
    /// Resolves `token` and downcasts the instance to `T`.
    fn resolve<T: Any + Send + Sync>(&self, token: impl Into<Token>) -> Result<Arc<T>> {
        let token = token.into();
        let instance = self.resolve_instance(&token)?;
        downcast(&token, instance)
    }

    /// Resolves the token of type `T` itself.
    fn resolve_type<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.resolve(Token::of::<T>())
    }

    /// Resolves every registration of `token` and downcasts each to `T`.
    fn resolve_all<T: Any + Send + Sync>(&self, token: impl Into<Token>) -> Result<Vec<Arc<T>>> {
        let token = token.into();
        self.resolve_all_instances(&token)?
            .into_iter()
            .map(|instance| downcast(&token, instance))
            .collect()
    }
}

impl<R: Resolver + ?Sized> ResolverApi for R {}

fn downcast<T: Any + Send + Sync>(token: &Token, instance: Instance) -> Result<Arc<T>> {
    instance.downcast::<T>().map_err(|_| WireboxError::TypeMismatch {
        token: token.clone(),
        expected: type_name::<T>(),
    })
}
