//! Core container implementation for Wirebox DI.
//!
//! Maps [`Token`]s to [`Provider`]s and resolves object graphs on demand,
//! honouring each registration's [`Lifetime`] across a tree of scopes.

mod cache;
pub mod container;
pub mod error;
mod graph;
pub mod injectable;
pub mod lifetime;
pub mod module;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod token;

pub use container::{Container, ContainerBuilder, ContainerSettings, ScopeId, ScopedOnRoot, prelude};
pub use error::{Result, WireboxError};
pub use injectable::Injectable;
pub use lifetime::{Lifetime, RegistrationOptions};
pub use module::Module;
pub use provider::{Arguments, FromInstance, Instance, Provider};
pub use registry::{Registration, RegistrationId, RegistrationInfo};
pub use resolver::{Resolver, ResolverApi};
pub use token::Token;
