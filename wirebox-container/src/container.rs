//! # The Container: heart of Wirebox
//!
//! A runtime registry of providers plus the resolution engine that
//! turns tokens into instances while honouring each registration's
//! lifetime.
//!
//! # Architecture
//! ```text
//!                 ┌──────────── family (shared) ────────────┐
//!                 │  Registry            Singleton cache    │
//!                 └──────────────────────────────────────────┘
//!                      ▲                ▲               ▲
//!   root Container ────┘   create_scope()               │
//!   (scoped cache)  ──────────────────► Container ──────┘
//!                                       (scoped cache)
//! ```
//!
//! Every scope is a [`Container`]. Scopes created from one root share its
//! registrations and singletons; each owns a private cache for
//! [`Lifetime::Scoped`] registrations.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! struct RequestId(u64);
//!
//! let container = Container::new();
//! container
//!     .register_scoped(Token::of::<RequestId>(), Provider::factory(|_| Ok(RequestId(7))))
//!     .unwrap();
//!
//! let request = container.create_scope();
//! let a: Arc<RequestId> = request.resolve_type().unwrap();
//! let b: Arc<RequestId> = request.resolve_type().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//!
//! let other: Arc<RequestId> = container.create_scope().resolve_type().unwrap();
//! assert!(!Arc::ptr_eq(&a, &other));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use wirebox_support::rendering::{render_chain, suggest_similar};

use crate::cache::InstanceCache;
use crate::error::{CircularDependencyError, NotRegisteredError, Result, WireboxError};
use crate::graph::GraphValidator;
use crate::injectable::{Injectable, internal::Discovered};
use crate::lifetime::{Lifetime, RegistrationOptions};
use crate::module::Module;
use crate::provider::{Arguments, ClassProvider, Instance, Provider};
use crate::registry::{Registration, RegistrationId, RegistrationInfo, Registry};
use crate::resolver::Resolver;
use crate::token::Token;

// ============================================================
// Settings
// ============================================================

/// How [`Lifetime::Scoped`] registrations behave when resolved on the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopedOnRoot {
    /// The root is a scope like any other and caches its own instances.
    #[default]
    Cache,
    /// The root never caches scoped instances; each resolve builds anew.
    Transient,
}

/// Family-wide container settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSettings {
    pub scoped_on_root: ScopedOnRoot,
    /// Upper bound on "did you mean?" entries in not-registered errors.
    pub max_suggestions: usize,
    /// Run [`Container::validate`] in [`ContainerBuilder::build`].
    pub validate_on_build: bool,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            scoped_on_root: ScopedOnRoot::Cache,
            max_suggestions: 3,
            validate_on_build: true,
        }
    }
}

// ============================================================
// ContainerBuilder
// ============================================================

type Step = Box<dyn FnOnce(&Container) -> Result<()> + Send>;

/// Builds a [`Container`] with settings and an initial set of registrations.
///
/// Registrations are applied in call order. [`build()`](ContainerBuilder::build)
/// reports the first registration error, then validates the graph.
///
/// # Examples
/// ```rust
/// use wirebox_container::prelude::*;
///
/// let container = Container::builder()
///     .max_suggestions(5)
///     .instance("url", String::from("postgres://localhost"))
///     .alias("database_url", "url")
///     .build()
///     .unwrap();
///
/// assert!(container.is_registered("database_url"));
/// ```
pub struct ContainerBuilder {
    settings: ContainerSettings,
    steps: Vec<Step>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            settings: ContainerSettings::default(),
            steps: Vec::new(),
        }
    }

    /// Replace all settings at once.
    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn scoped_on_root(mut self, policy: ScopedOnRoot) -> Self {
        self.settings.scoped_on_root = policy;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.settings.max_suggestions = max;
        self
    }

    pub fn validate_on_build(mut self, validate: bool) -> Self {
        self.settings.validate_on_build = validate;
        self
    }

    /// Queue a registration with explicit options.
    pub fn register(
        self,
        token: impl Into<Token>,
        provider: Provider,
        options: impl Into<RegistrationOptions>,
    ) -> Self {
        let token = token.into();
        let options = options.into();
        self.step(move |c| c.register(token, provider, options).map(|_| ()))
    }

    pub fn singleton(self, token: impl Into<Token>, provider: Provider) -> Self {
        self.register(token, provider, Lifetime::Singleton)
    }

    pub fn scoped(self, token: impl Into<Token>, provider: Provider) -> Self {
        self.register(token, provider, Lifetime::Scoped)
    }

    pub fn transient(self, token: impl Into<Token>, provider: Provider) -> Self {
        self.register(token, provider, Lifetime::Transient)
    }

    /// Queue a pre-built value.
    pub fn instance<T: Send + Sync + 'static>(self, token: impl Into<Token>, value: T) -> Self {
        self.register(token, Provider::value(value), Lifetime::Transient)
    }

    /// Queue a token alias.
    pub fn alias(self, from: impl Into<Token>, to: impl Into<Token>) -> Self {
        self.register(from, Provider::alias(to), Lifetime::Transient)
    }

    pub fn injectable<T: Injectable>(self) -> Self {
        self.step(|c| c.register_injectable::<T>().map(|_| ()))
    }

    /// Queue a [`Module`].
    pub fn module(self, module: impl Module + 'static) -> Self {
        self.step(move |c| c.register_module(&module))
    }

    /// Queue every type discovered through `#[injectable(register)]`.
    pub fn discovered(self) -> Self {
        self.step(|c| c.register_discovered().map(|_| ()))
    }

    /// Build the container.
    ///
    /// # Errors
    /// The first failed registration, or any error from
    /// [`Container::validate`] when validation is enabled.
    pub fn build(self) -> Result<Container> {
        let container = Container::with_settings(self.settings);
        debug!(steps = self.steps.len(), "Building container");

        for step in self.steps {
            step(&container)?;
        }

        if container.family.settings.validate_on_build {
            container.validate()?;
        }

        debug!(registered = container.family.registry.len(), "Container built");
        Ok(container)
    }

    fn step(mut self, step: impl FnOnce(&Container) -> Result<()> + Send + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }
}

// ============================================================
// Container
// ============================================================

/// Identity of one scope within a family. The root is always `ScopeId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// State shared by a root container and every scope created from it.
struct Family {
    registry: Registry,
    singletons: InstanceCache,
    settings: ContainerSettings,
    next_scope: AtomicU64,
    /// Scoped caches of every live scope, the root's included.
    scopes: Mutex<Vec<Weak<InstanceCache>>>,
}

/// A resolution context: the root container or one of its scopes.
///
/// Cloning a `Container` yields another handle to the same scope; use
/// [`create_scope`](Container::create_scope) for an isolated child.
#[derive(Clone)]
pub struct Container {
    family: Arc<Family>,
    scoped: Arc<InstanceCache>,
    id: ScopeId,
    parent: Option<ScopeId>,
    depth: usize,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Create an empty root container with default settings.
    pub fn new() -> Self {
        Self::with_settings(ContainerSettings::default())
    }

    /// Create an empty root container.
    pub fn with_settings(settings: ContainerSettings) -> Self {
        let scoped = Arc::new(InstanceCache::new());
        Self {
            family: Arc::new(Family {
                registry: Registry::new(),
                singletons: InstanceCache::new(),
                settings,
                next_scope: AtomicU64::new(1),
                scopes: Mutex::new(vec![Arc::downgrade(&scoped)]),
            }),
            scoped,
            id: ScopeId(0),
            parent: None,
            depth: 0,
        }
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    // ── Registration ──

    /// Append a registration for `token`.
    ///
    /// The registration is visible to every scope of the family,
    /// including scopes created before this call.
    ///
    /// # Errors
    /// [`WireboxError::InvalidRegistration`] if `provider` and the lifetime
    /// conflict (a token alias must be transient and must not target itself).
    pub fn register(
        &self,
        token: impl Into<Token>,
        provider: Provider,
        options: impl Into<RegistrationOptions>,
    ) -> Result<RegistrationId> {
        self.family
            .registry
            .register(token.into(), provider, options.into().lifetime)
    }

    pub fn register_singleton(&self, token: impl Into<Token>, provider: Provider) -> Result<RegistrationId> {
        self.register(token, provider, Lifetime::Singleton)
    }

    pub fn register_scoped(&self, token: impl Into<Token>, provider: Provider) -> Result<RegistrationId> {
        self.register(token, provider, Lifetime::Scoped)
    }

    pub fn register_transient(&self, token: impl Into<Token>, provider: Provider) -> Result<RegistrationId> {
        self.register(token, provider, Lifetime::Transient)
    }

    /// Register a pre-built value. Every resolve returns this same instance.
    pub fn register_instance<T: Send + Sync + 'static>(
        &self,
        token: impl Into<Token>,
        value: T,
    ) -> Result<RegistrationId> {
        self.register(token, Provider::value(value), Lifetime::Transient)
    }

    /// Register `from` as an alias of `to`.
    pub fn register_type(&self, from: impl Into<Token>, to: impl Into<Token>) -> Result<RegistrationId> {
        self.register(from, Provider::alias(to), Lifetime::Transient)
    }

    /// Register an [`Injectable`] type under its own token and lifetime.
    pub fn register_injectable<T: Injectable>(&self) -> Result<RegistrationId> {
        self.register(T::token(), Provider::injectable::<T>(), T::lifetime())
    }

    /// Apply a [`Module`].
    pub fn register_module(&self, module: &dyn Module) -> Result<()> {
        debug!(module = module.name(), "Registering module");
        module.register(self)
    }

    /// Register every type marked `#[injectable(register)]` in the program.
    ///
    /// Types are registered sorted by name, so the order of several
    /// registrations sharing a token is stable between runs.
    /// Returns how many registrations were added.
    pub fn register_discovered(&self) -> Result<usize> {
        let mut discovered: Vec<&Discovered> = inventory::iter::<Discovered>.into_iter().collect();
        discovered.sort_by_key(|entry| entry.name);

        for entry in &discovered {
            trace!(name = entry.name, "Registering discovered type");
            (entry.register)(self)?;
        }

        debug!(count = discovered.len(), "Registered discovered types");
        Ok(discovered.len())
    }

    // ── Queries ──

    /// Returns `true` if `token` has at least one registration.
    pub fn is_registered(&self, token: impl Into<Token>) -> bool {
        self.family.registry.contains(&token.into())
    }

    /// Registrations of `token`, in registration order.
    pub fn registrations_for(&self, token: impl Into<Token>) -> Vec<Arc<Registration>> {
        self.family.registry.registrations_for(&token.into())
    }

    /// The registration a plain resolve of `token` would use.
    ///
    /// # Errors
    /// [`WireboxError::NotRegistered`] if `token` has no registration.
    pub fn active_registration(&self, token: impl Into<Token>) -> Result<Arc<Registration>> {
        let token = token.into();
        self.family
            .registry
            .active(&token)
            .ok_or_else(|| self.not_registered(&token, None))
    }

    /// Snapshot of every registration, ordered by id.
    pub fn registrations(&self) -> Vec<RegistrationInfo> {
        self.family.registry.all().iter().map(|r| r.info()).collect()
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.family.settings
    }

    // ── Scopes ──

    /// Create a child scope.
    ///
    /// The child shares this family's registrations and singletons and
    /// starts with an empty scoped cache of its own.
    pub fn create_scope(&self) -> Container {
        let scoped = Arc::new(InstanceCache::new());
        {
            let mut scopes = self.family.scopes.lock();
            scopes.retain(|cache| cache.strong_count() > 0);
            scopes.push(Arc::downgrade(&scoped));
        }

        let scope = Container {
            family: Arc::clone(&self.family),
            scoped,
            id: ScopeId(self.family.next_scope.fetch_add(1, Ordering::Relaxed)),
            parent: Some(self.id),
            depth: self.depth + 1,
        };
        debug!(scope = %scope.id, parent = %self.id, depth = scope.depth, "Created scope");
        scope
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// The scope this one was created from. `None` for the root.
    pub fn parent_id(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Nesting level; the root is 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    // ── Lifecycle ──

    /// Remove all registrations and cached instances of the family.
    ///
    /// Empties the singleton cache and the scoped cache of every live
    /// scope, so no instance built before the reset is kept alive by the
    /// container. Existing scopes stay usable.
    pub fn reset(&self) {
        debug!(scope = %self.id, "Resetting container");
        self.family.registry.clear();
        self.family.singletons.clear();

        let scopes: Vec<Arc<InstanceCache>> =
            self.family.scopes.lock().iter().filter_map(Weak::upgrade).collect();
        for cache in scopes {
            cache.clear();
        }
    }

    /// Drop cached singletons and this scope's scoped instances,
    /// keeping every registration.
    pub fn clear_instances(&self) {
        debug!(
            scope = %self.id,
            singletons = self.family.singletons.len(),
            scoped = self.scoped.len(),
            "Clearing cached instances"
        );
        self.family.singletons.clear();
        self.scoped.clear();
    }

    // ── Validation ──

    /// Check the graph of active registrations without building anything.
    ///
    /// # Errors
    /// - [`WireboxError::NotRegistered`]: a class dependency or alias target is missing
    /// - [`WireboxError::CircularDependency`]: class dependencies or aliases form a cycle
    /// - [`WireboxError::ScopeMismatch`]: a singleton depends on a scoped registration
    pub fn validate(&self) -> Result<()> {
        let mut validator = GraphValidator::new(
            self.family.registry.active_registrations(),
            self.family.settings.max_suggestions,
        );
        validator.validate()
    }

    // ── Resolution engine ──

    fn resolve_in(&self, token: &Token, frame: Option<&Frame<'_>>) -> Result<Instance> {
        trace!(token = %token, scope = %self.id, "Resolving");
        let registration = self
            .family
            .registry
            .active(token)
            .ok_or_else(|| self.not_registered(token, frame))?;
        self.materialize(&registration, frame)
    }

    fn resolve_all_in(&self, token: &Token, frame: Option<&Frame<'_>>) -> Result<Vec<Instance>> {
        trace!(token = %token, scope = %self.id, "Resolving all");
        let registrations = self.family.registry.registrations_for(token);
        if registrations.is_empty() {
            return Err(self.not_registered(token, frame));
        }

        registrations
            .iter()
            .map(|registration| self.materialize(registration, frame))
            .collect()
    }

    /// Produce the value of one registration in this scope.
    fn materialize(&self, registration: &Registration, parent: Option<&Frame<'_>>) -> Result<Instance> {
        if let Some(chain) = Frame::cycle(parent, registration) {
            warn!(chain = %render_chain(&chain), "Circular dependency detected");
            return Err(WireboxError::CircularDependency(CircularDependencyError { chain }));
        }

        let frame = Frame {
            registration: registration.id(),
            token: registration.token(),
            parent,
        };

        match registration.provider() {
            Provider::Token(target) => {
                trace!(from = %registration.token(), to = %target, "Following token alias");
                self.resolve_in(target, Some(&frame))
            }
            Provider::Value(instance) => Ok(Arc::clone(instance)),
            Provider::Class(class) => self.cached(registration, || self.construct(class, &frame)),
            Provider::Factory(factory) => self.cached(registration, || {
                let context = ResolutionContext {
                    container: self,
                    frame: &frame,
                };
                let resolver: &dyn Resolver = &context;
                factory(resolver)
            }),
        }
    }

    /// Consult the cache tier that `registration`'s lifetime selects.
    fn cached<F>(&self, registration: &Registration, build: F) -> Result<Instance>
    where
        F: FnOnce() -> Result<Instance>,
    {
        let id = registration.id();
        match registration.lifetime() {
            Lifetime::Transient => build(),
            Lifetime::Singleton => self.family.singletons.get_or_try_insert(id, registration.token(), build),
            Lifetime::Scoped
                if self.is_root() && self.family.settings.scoped_on_root == ScopedOnRoot::Transient =>
            {
                build()
            }
            Lifetime::Scoped => self.scoped.get_or_try_insert(id, registration.token(), build),
        }
    }

    fn construct(&self, class: &ClassProvider, frame: &Frame<'_>) -> Result<Instance> {
        let mut resolved = Vec::with_capacity(class.dependencies().len());
        for dependency in class.dependencies() {
            resolved.push((dependency.clone(), self.resolve_in(dependency, Some(frame))?));
        }

        let mut args = Arguments::new(frame.token.clone(), resolved);
        let instance = class.construct(&mut args)?;
        trace!(
            token = %frame.token,
            id = %frame.registration,
            scope = %self.id,
            "Constructed {}",
            class.type_name()
        );
        Ok(instance)
    }

    fn not_registered(&self, token: &Token, frame: Option<&Frame<'_>>) -> WireboxError {
        let suggestions = suggest_similar(
            &token.label(),
            &self.family.registry.token_labels(),
            self.family.settings.max_suggestions,
        );

        WireboxError::NotRegistered(NotRegisteredError {
            requested: token.clone(),
            required_by: frame.map(|frame| frame.token.clone()),
            suggestions,
        })
    }
}

impl Resolver for Container {
    fn resolve_instance(&self, token: &Token) -> Result<Instance> {
        self.resolve_in(token, None)
    }

    fn resolve_all_instances(&self, token: &Token) -> Result<Vec<Instance>> {
        self.resolve_all_in(token, None)
    }

    fn is_registered(&self, token: &Token) -> bool {
        self.family.registry.contains(token)
    }

    fn scope_id(&self) -> ScopeId {
        self.id
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("scope", &self.id)
            .field("parent", &self.parent)
            .field("registered", &self.family.registry.len())
            .field("singletons", &self.family.singletons.len())
            .field("scoped", &self.scoped.len())
            .finish()
    }
}

// ============================================================
// In-progress resolution chain
// ============================================================

/// One registration currently being materialized.
///
/// Frames live on the call stack and link to their caller, so the chain
/// needs no allocation and no locking.
struct Frame<'a> {
    registration: RegistrationId,
    token: &'a Token,
    parent: Option<&'a Frame<'a>>,
}

impl Frame<'_> {
    /// If `registration` is already on the chain ending at `frame`, returns
    /// the tokens from its first occurrence to the repeat.
    fn cycle(mut frame: Option<&Frame<'_>>, registration: &Registration) -> Option<Vec<Token>> {
        let mut chain = Vec::new();
        while let Some(current) = frame {
            chain.push(current.token.clone());
            if current.registration == registration.id() {
                chain.reverse();
                chain.push(registration.token().clone());
                return Some(chain);
            }
            frame = current.parent;
        }
        None
    }
}

/// Resolver handed to factories while they run.
struct ResolutionContext<'a> {
    container: &'a Container,
    frame: &'a Frame<'a>,
}

impl Resolver for ResolutionContext<'_> {
    fn resolve_instance(&self, token: &Token) -> Result<Instance> {
        self.container.resolve_in(token, Some(self.frame))
    }

    fn resolve_all_instances(&self, token: &Token) -> Result<Vec<Instance>> {
        self.container.resolve_all_in(token, Some(self.frame))
    }

    fn is_registered(&self, token: &Token) -> bool {
        self.container.family.registry.contains(token)
    }

    fn scope_id(&self) -> ScopeId {
        self.container.id
    }
}

// ============================================================
// Prelude
// ============================================================

pub mod prelude {
    pub use super::{Container, ContainerBuilder, ContainerSettings, ScopeId, ScopedOnRoot};
    pub use crate::error::{Result, WireboxError};
    pub use crate::injectable::Injectable;
    pub use crate::lifetime::{Lifetime, RegistrationOptions};
    pub use crate::module::Module;
    pub use crate::provider::{Arguments, Instance, Provider};
    pub use crate::resolver::{Resolver, ResolverApi};
    pub use crate::token::Token;
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverApi;
    use std::sync::atomic::AtomicU32;

    #[derive(Debug)]
    struct Foo;
    #[derive(Debug)]
    struct Bar;

    fn counting_factory(counter: &Arc<AtomicU32>) -> Provider {
        let counter = Arc::clone(counter);
        Provider::factory(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)))
    }

    #[test]
    fn transient_creates_new_each_time() {
        let container = Container::new();
        container
            .register_transient(Token::of::<Foo>(), Provider::class(vec![], |_| Ok(Foo)))
            .unwrap();

        let a: Arc<Foo> = container.resolve_type().unwrap();
        let b: Arc<Foo> = container.resolve_type().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn default_lifetime_is_transient() {
        let container = Container::new();
        container
            .register(Token::of::<Foo>(), Provider::class(vec![], |_| Ok(Foo)), RegistrationOptions::default())
            .unwrap();

        let a: Arc<Foo> = container.resolve_type().unwrap();
        let b: Arc<Foo> = container.resolve_type().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn singleton_factory_called_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container.register_singleton("n", counting_factory(&counter)).unwrap();

        let scope = container.create_scope();
        let nested = scope.create_scope();

        let a: Arc<u32> = container.resolve("n").unwrap();
        let b: Arc<u32> = scope.resolve("n").unwrap();
        let c: Arc<u32> = nested.resolve("n").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scoped_cached_per_scope() {
        let counter = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container.register_scoped("n", counting_factory(&counter)).unwrap();

        let root_a: Arc<u32> = container.resolve("n").unwrap();
        let root_b: Arc<u32> = container.resolve("n").unwrap();
        assert!(Arc::ptr_eq(&root_a, &root_b));

        let scope = container.create_scope();
        let scoped_a: Arc<u32> = scope.resolve("n").unwrap();
        let scoped_b: Arc<u32> = scope.resolve("n").unwrap();
        assert!(Arc::ptr_eq(&scoped_a, &scoped_b));
        assert!(!Arc::ptr_eq(&root_a, &scoped_a));

        let sibling: Arc<u32> = container.create_scope().resolve("n").unwrap();
        assert!(!Arc::ptr_eq(&scoped_a, &sibling));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn scoped_on_root_transient_policy() {
        let container = Container::builder()
            .scoped_on_root(ScopedOnRoot::Transient)
            .scoped(Token::of::<Foo>(), Provider::class(vec![], |_| Ok(Foo)))
            .build()
            .unwrap();

        let a: Arc<Foo> = container.resolve_type().unwrap();
        let b: Arc<Foo> = container.resolve_type().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        let scope = container.create_scope();
        let c: Arc<Foo> = scope.resolve_type().unwrap();
        let d: Arc<Foo> = scope.resolve_type().unwrap();
        assert!(Arc::ptr_eq(&c, &d));
    }

    #[test]
    fn value_ignores_lifetime() {
        let container = Container::new();
        container.register("v", Provider::value(5u8), Lifetime::Scoped).unwrap();

        let a: Arc<u8> = container.resolve("v").unwrap();
        let b: Arc<u8> = container.create_scope().resolve("v").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn scoped_dependency_resolves_in_calling_scope() {
        // Transient → Transient → Scoped: the scoped leaf must come from the caller's scope.
        struct Leaf;
        struct Middle(Arc<Leaf>);
        struct Top(Arc<Middle>);

        let container = Container::new();
        container
            .register_scoped(Token::of::<Leaf>(), Provider::class(vec![], |_| Ok(Leaf)))
            .unwrap();
        container
            .register_transient(
                Token::of::<Middle>(),
                Provider::class(vec![Token::of::<Leaf>()], |args| Ok(Middle(args.take()?))),
            )
            .unwrap();
        container
            .register_transient(
                Token::of::<Top>(),
                Provider::class(vec![Token::of::<Middle>()], |args| Ok(Top(args.take()?))),
            )
            .unwrap();

        let scope = container.create_scope();
        let top: Arc<Top> = scope.resolve_type().unwrap();
        let leaf: Arc<Leaf> = scope.resolve_type().unwrap();
        let root_leaf: Arc<Leaf> = container.resolve_type().unwrap();

        assert!(Arc::ptr_eq(&top.0.0, &leaf));
        assert!(!Arc::ptr_eq(&top.0.0, &root_leaf));
    }

    #[test]
    fn latest_registration_wins() {
        let container = Container::new();
        container.register_instance("v", 1u8).unwrap();
        container.register_instance("v", 2u8).unwrap();

        let v: Arc<u8> = container.resolve("v").unwrap();
        assert_eq!(*v, 2);
    }

    #[test]
    fn registration_after_scope_is_visible() {
        let container = Container::new();
        let scope = container.create_scope();
        container.register_instance("late", 1u8).unwrap();

        assert!(scope.is_registered("late"));
        let v: Arc<u8> = scope.resolve("late").unwrap();
        assert_eq!(*v, 1);
    }

    #[test]
    fn alias_has_no_cache_slot() {
        let counter = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container.register_scoped("IBar", counting_factory(&counter)).unwrap();
        container.register_type(Token::of::<Bar>(), "IBar").unwrap();

        let scope = container.create_scope();
        let via_alias: Arc<u32> = scope.resolve(Token::of::<Bar>()).unwrap();
        let direct: Arc<u32> = scope.resolve("IBar").unwrap();
        assert!(Arc::ptr_eq(&via_alias, &direct));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolve_not_registered() {
        let container = Container::new();
        container.register_instance("database", 1u8).unwrap();

        match container.resolve::<u8>("databse") {
            Err(WireboxError::NotRegistered(err)) => {
                assert_eq!(err.requested, Token::named("databse"));
                assert!(err.required_by.is_none());
                assert_eq!(err.suggestions, vec!["\"database\"".to_string()]);
            }
            other => panic!("Expected NotRegistered, got: {other:?}"),
        }
    }

    #[test]
    fn missing_dependency_fails_whole_resolve() {
        let container = Container::new();
        container
            .register_singleton(
                Token::of::<Foo>(),
                Provider::class(vec![Token::named("missing")], |_| Ok(Foo)),
            )
            .unwrap();

        match container.resolve_type::<Foo>() {
            Err(WireboxError::NotRegistered(err)) => {
                assert_eq!(err.requested, Token::named("missing"));
                assert_eq!(err.required_by, Some(Token::of::<Foo>()));
            }
            other => panic!("Expected NotRegistered, got: {:?}", other.map(|_| ())),
        }

        // Nothing was cached for the failed singleton.
        assert_eq!(container.family.singletons.len(), 0);
    }

    #[test]
    fn detects_class_cycle() {
        let container = Container::new();
        container
            .register_singleton("a", Provider::class(vec!["b".into()], |_| Ok(Foo)))
            .unwrap();
        container
            .register_singleton("b", Provider::class(vec!["c".into()], |_| Ok(Foo)))
            .unwrap();
        container
            .register_singleton("c", Provider::class(vec!["a".into()], |_| Ok(Foo)))
            .unwrap();

        match container.resolve::<Foo>("a") {
            Err(WireboxError::CircularDependency(err)) => {
                let chain: Vec<Token> = vec!["a".into(), "b".into(), "c".into(), "a".into()];
                assert_eq!(err.chain, chain);
            }
            other => panic!("Expected CircularDependency, got: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn detects_cycle_through_factory() {
        let container = Container::new();
        container
            .register_transient("a", Provider::factory(|r| r.resolve::<u8>("b").map(|b| *b)))
            .unwrap();
        container
            .register_transient("b", Provider::factory(|r| r.resolve::<u8>("a").map(|a| *a)))
            .unwrap();

        let err = container.resolve::<u8>("a").unwrap_err();
        assert!(err.is_circular());
    }

    #[test]
    fn detects_alias_cycle() {
        let container = Container::new();
        container.register_type("a", "b").unwrap();
        container.register_type("b", "a").unwrap();

        assert!(container.resolve::<u8>("a").unwrap_err().is_circular());
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        struct D;
        let container = Container::new();
        container
            .register_singleton(Token::of::<D>(), Provider::class(vec![], |_| Ok(D)))
            .unwrap();
        container
            .register_transient(
                "pair",
                Provider::class(vec![Token::of::<D>(), Token::of::<D>()], |args| {
                    let a: Arc<D> = args.take()?;
                    let b: Arc<D> = args.take()?;
                    Ok(Arc::ptr_eq(&a, &b))
                }),
            )
            .unwrap();

        let same: Arc<bool> = container.resolve("pair").unwrap();
        assert!(*same);
    }

    #[test]
    fn factory_error_is_propagated_and_not_cached() {
        let attempts = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container
            .register_singleton("flaky", {
                let attempts = Arc::clone(&attempts);
                Provider::factory(move |_| {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(WireboxError::construction("flaky", "first call fails"))
                    } else {
                        Ok(1u8)
                    }
                })
            })
            .unwrap();

        assert!(matches!(
            container.resolve::<u8>("flaky"),
            Err(WireboxError::ConstructionFailed { .. })
        ));
        assert!(container.resolve::<u8>("flaky").is_ok());
        assert!(container.resolve::<u8>("flaky").is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn factory_sees_calling_scope() {
        let container = Container::new();
        container
            .register_transient("scope_id", Provider::factory(|r| Ok(r.scope_id())))
            .unwrap();

        let scope = container.create_scope();
        let id: Arc<ScopeId> = scope.resolve("scope_id").unwrap();
        assert_eq!(*id, scope.id());
    }

    #[test]
    fn singleton_reentered_through_captured_container_is_circular() {
        let container = Container::new();
        let handle = container.clone();
        container
            .register_singleton("a", Provider::factory(move |_| handle.resolve::<u8>("a").map(|a| *a)))
            .unwrap();

        let err = container.resolve::<u8>("a").unwrap_err();
        assert!(err.is_circular());

        // Nothing was cached, so the next attempt hits the same cycle.
        assert!(container.resolve::<u8>("a").unwrap_err().is_circular());
    }

    #[test]
    fn scoped_reentered_through_captured_scope_is_circular() {
        let container = Container::new();
        let scope = container.create_scope();
        let handle = scope.clone();
        container
            .register_scoped("a", Provider::factory(move |_| handle.resolve::<u8>("a").map(|a| *a)))
            .unwrap();

        match scope.resolve::<u8>("a") {
            Err(WireboxError::CircularDependency(err)) => {
                assert_eq!(err.chain, vec![Token::named("a"), Token::named("a")]);
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn reset_drops_scoped_instances_of_every_scope() {
        let container = Container::new();
        container
            .register_scoped(Token::of::<Bar>(), Provider::class(vec![], |_| Ok(Bar)))
            .unwrap();

        let child = container.create_scope();
        let grandchild = child.create_scope();
        let in_child: Arc<Bar> = child.resolve_type().unwrap();
        let in_grandchild: Arc<Bar> = grandchild.resolve_type().unwrap();
        let in_root: Arc<Bar> = container.resolve_type().unwrap();
        assert_eq!(Arc::strong_count(&in_child), 2);
        assert_eq!(Arc::strong_count(&in_grandchild), 2);
        assert_eq!(Arc::strong_count(&in_root), 2);

        container.reset();

        assert_eq!(Arc::strong_count(&in_child), 1);
        assert_eq!(Arc::strong_count(&in_grandchild), 1);
        assert_eq!(Arc::strong_count(&in_root), 1);
    }

    #[test]
    fn dropped_scopes_are_forgotten() {
        let container = Container::new();
        for _ in 0..10 {
            drop(container.create_scope());
        }
        let _live = container.create_scope();

        // The root plus the one live scope; dropped ones are pruned on creation.
        assert_eq!(container.family.scopes.lock().len(), 2);
    }

    #[test]
    fn scope_bookkeeping() {
        let root = Container::new();
        let child = root.create_scope();
        let grandchild = child.create_scope();

        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert_eq!(child.parent_id(), Some(root.id()));
        assert_eq!(grandchild.parent_id(), Some(child.id()));
        assert_eq!(grandchild.depth(), 2);
        assert_ne!(child.id(), grandchild.id());
    }

    #[test]
    fn clone_is_same_scope() {
        let container = Container::new();
        container.register_scoped(Token::of::<Foo>(), Provider::class(vec![], |_| Ok(Foo))).unwrap();

        let scope = container.create_scope();
        let handle = scope.clone();
        let a: Arc<Foo> = scope.resolve_type().unwrap();
        let b: Arc<Foo> = handle.resolve_type().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn reset_clears_everything() {
        let container = Container::new();
        container.register_singleton(Token::of::<Bar>(), Provider::class(vec![], |_| Ok(Bar))).unwrap();
        let _bar: Arc<Bar> = container.resolve_type().unwrap();

        container.reset();

        assert!(!container.is_registered(Token::of::<Bar>()));
        assert!(container.registrations().is_empty());
        assert!(container.resolve_type::<Bar>().unwrap_err().is_not_registered());
    }

    #[test]
    fn clear_instances_keeps_registrations() {
        let container = Container::new();
        container.register_singleton(Token::of::<Bar>(), Provider::class(vec![], |_| Ok(Bar))).unwrap();

        let before: Arc<Bar> = container.resolve_type().unwrap();
        container.clear_instances();
        let after: Arc<Bar> = container.resolve_type().unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn builder_reports_invalid_registration() {
        let result = Container::builder()
            .register("alias", Provider::alias("target"), Lifetime::Singleton)
            .validate_on_build(false)
            .build();

        assert!(matches!(result, Err(WireboxError::InvalidRegistration { .. })));
    }

    #[test]
    fn builder_validates_graph() {
        let result = Container::builder()
            .transient("a", Provider::class(vec!["missing".into()], |_| Ok(Foo)))
            .build();
        assert!(result.unwrap_err().is_not_registered());

        let unchecked = Container::builder()
            .validate_on_build(false)
            .transient("a", Provider::class(vec!["missing".into()], |_| Ok(Foo)))
            .build();
        assert!(unchecked.is_ok());
    }

    #[test]
    fn debug_display() {
        let container = Container::new();
        container.register_instance("a", 1i32).unwrap();
        container.register_instance("b", 2i32).unwrap();

        let debug = format!("{container:?}");
        assert!(debug.contains("Container"));
        assert!(debug.contains("registered: 2"));
    }
}
