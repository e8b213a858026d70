//! Providers: how a registration produces its value.
//!
//! A [`Provider`] is a closed set of strategies:
//! - [`Provider::Class`] builds a type from an ordered list of dependency tokens
//! - [`Provider::Value`] hands out one pre-built instance
//! - [`Provider::Factory`] calls a closure with the active resolver
//! - [`Provider::Token`] forwards to another token's active registration
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! struct Config { url: String }
//! struct Database { url: String }
//!
//! let container = Container::new();
//! container.register_instance(Token::of::<Config>(), Config { url: "postgres://".into() }).unwrap();
//! container
//!     .register_singleton(
//!         Token::of::<Database>(),
//!         Provider::class(vec![Token::of::<Config>()], |args| {
//!             let config: Arc<Config> = args.take()?;
//!             Ok(Database { url: config.url.clone() })
//!         }),
//!     )
//!     .unwrap();
//!
//! let db: Arc<Database> = container.resolve_type().unwrap();
//! assert_eq!(db.url, "postgres://");
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Result, WireboxError};
use crate::injectable::Injectable;
use crate::resolver::Resolver;
use crate::token::Token;

/// A type-erased, shareable instance produced by the container.
///
/// Two resolves returned "the same instance" when their `Instance`s
/// satisfy [`Arc::ptr_eq`].
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Builds an instance from resolved dependencies.
pub type ConstructorFn = Arc<dyn Fn(&mut Arguments) -> Result<Instance> + Send + Sync>;

/// Builds an instance with access to the active resolver.
///
/// # Why `Arc` and not `Box`?
/// Registrations are cloned out of the registry before they run, so no
/// lock is held while user code executes.
pub type FactoryFn = Arc<dyn Fn(&dyn Resolver) -> Result<Instance> + Send + Sync>;

/// Strategy describing how to produce a value for a token.
#[derive(Clone)]
pub enum Provider {
    /// Construct a type from its declared dependencies.
    Class(ClassProvider),
    /// Return a fixed instance, regardless of lifetime.
    Value(Instance),
    /// Invoke a closure with the resolution context.
    Factory(FactoryFn),
    /// Delegate to another token's active registration.
    Token(Token),
}

impl Provider {
    /// A class provider for `T`.
    ///
    /// `dependencies` are resolved in order, in the same scope as the
    /// outer resolve, and handed to `constructor` as [`Arguments`].
    pub fn class<T, F>(dependencies: Vec<Token>, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
    {
        Provider::Class(ClassProvider {
            type_name: type_name::<T>(),
            dependencies,
            constructor: Arc::new(move |args: &mut Arguments| {
                Ok(Arc::new(constructor(args)?) as Instance)
            }),
        })
    }

    /// A class provider built from an [`Injectable`] type's metadata.
    pub fn injectable<T: Injectable>() -> Self {
        Provider::class(T::dependencies(), T::construct)
    }

    /// A value provider owning `value`.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Provider::Value(Arc::new(value))
    }

    /// A value provider sharing an existing `Arc`.
    ///
    /// Resolves return this exact allocation.
    pub fn shared<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Provider::Value(value)
    }

    /// A factory provider.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use wirebox_container::prelude::*;
    ///
    /// let container = Container::new();
    /// container.register_instance("port", 8080u16).unwrap();
    /// container
    ///     .register("addr", Provider::factory(|r| {
    ///         let port: Arc<u16> = r.resolve("port")?;
    ///         Ok(format!("0.0.0.0:{port}"))
    ///     }), Lifetime::Transient)
    ///     .unwrap();
    ///
    /// let addr: Arc<String> = container.resolve("addr").unwrap();
    /// assert_eq!(addr.as_str(), "0.0.0.0:8080");
    /// ```
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
    {
        Provider::Factory(Arc::new(move |resolver: &dyn Resolver| {
            Ok(Arc::new(factory(resolver)?) as Instance)
        }))
    }

    /// A token alias: resolving the registered token resolves `target`.
    pub fn alias(target: impl Into<Token>) -> Self {
        Provider::Token(target.into())
    }

    /// Which variant this is.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Class(_) => ProviderKind::Class,
            Provider::Value(_) => ProviderKind::Value,
            Provider::Factory(_) => ProviderKind::Factory,
            Provider::Token(_) => ProviderKind::Token,
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Class(class) => f.debug_tuple("Class").field(class).finish(),
            Provider::Value(_) => f.write_str("Value(..)"),
            Provider::Factory(_) => f.write_str("Factory(..)"),
            Provider::Token(target) => f.debug_tuple("Token").field(target).finish(),
        }
    }
}

/// Discriminant of [`Provider`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProviderKind {
    Class,
    Value,
    Factory,
    Token,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A constructible type plus the tokens its constructor needs.
#[derive(Clone)]
pub struct ClassProvider {
    type_name: &'static str,
    dependencies: Vec<Token>,
    constructor: ConstructorFn,
}

impl ClassProvider {
    /// Name of the constructed type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Dependency tokens, in constructor order.
    pub fn dependencies(&self) -> &[Token] {
        &self.dependencies
    }

    pub(crate) fn construct(&self, args: &mut Arguments) -> Result<Instance> {
        (self.constructor)(args)
    }
}

impl fmt::Debug for ClassProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassProvider")
            .field("type_name", &self.type_name)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

// ============================================================
// Arguments
// ============================================================

/// Resolved dependencies handed to a class constructor, in declaration order.
pub struct Arguments {
    owner: Token,
    values: std::vec::IntoIter<(Token, Instance)>,
    declared: usize,
    taken: usize,
}

impl Arguments {
    pub(crate) fn new(owner: Token, resolved: Vec<(Token, Instance)>) -> Self {
        Self {
            owner,
            declared: resolved.len(),
            values: resolved.into_iter(),
            taken: 0,
        }
    }

    /// Takes the next argument, converting it to `T`.
    ///
    /// # Errors
    /// - [`WireboxError::MissingArgument`]: all declared arguments were taken
    /// - [`WireboxError::TypeMismatch`]: the instance is not a `T`
    pub fn take<T: FromInstance>(&mut self) -> Result<T> {
        let index = self.taken;
        let (token, instance) = self.values.next().ok_or_else(|| WireboxError::MissingArgument {
            token: self.owner.clone(),
            index,
            declared: self.declared,
        })?;
        self.taken += 1;
        T::from_instance(&token, instance)
    }

    /// Takes the next argument without downcasting it.
    pub fn take_instance(&mut self) -> Result<Instance> {
        let index = self.taken;
        let (_, instance) = self.values.next().ok_or_else(|| WireboxError::MissingArgument {
            token: self.owner.clone(),
            index,
            declared: self.declared,
        })?;
        self.taken += 1;
        Ok(instance)
    }

    /// The token being constructed.
    pub fn owner(&self) -> &Token {
        &self.owner
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.declared - self.taken
    }
}

/// Conversion from a resolved [`Instance`] into a constructor argument.
pub trait FromInstance: Sized {
    /// Token used when a dependency of this type has no explicit token.
    fn default_token() -> Token;

    fn from_instance(token: &Token, instance: Instance) -> Result<Self>;
}

impl<T: Any + Send + Sync> FromInstance for Arc<T> {
    fn default_token() -> Token {
        Token::of::<T>()
    }

    fn from_instance(token: &Token, instance: Instance) -> Result<Self> {
        instance.downcast::<T>().map_err(|_| WireboxError::TypeMismatch {
            token: token.clone(),
            expected: type_name::<T>(),
        })
    }
}
