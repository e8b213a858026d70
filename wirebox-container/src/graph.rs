//! Dependency graph validation.
//!
//! Walks the active registration of every token without constructing
//! anything:
//! - Detects circular dependencies through class dependencies and aliases
//! - Checks that every dependency token is registered
//! - Flags singletons that would capture a scoped instance
//!
//! Factories are opaque: what they resolve is only known when they run,
//! so they are treated as leaves. Resolution still detects cycles that
//! pass through them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use wirebox_support::rendering::{render_chain, suggest_similar};

use crate::error::{
    CircularDependencyError, NotRegisteredError, Result, ScopeMismatchError, WireboxError,
};
use crate::lifetime::Lifetime;
use crate::provider::Provider;
use crate::registry::Registration;
use crate::token::Token;

/// What validation needs to know about one active registration.
#[derive(Debug, Clone)]
pub(crate) struct DependencyInfo {
    pub token: Token,
    /// Class dependencies, or the alias target.
    pub dependencies: Vec<Token>,
    pub lifetime: Lifetime,
    /// Aliases forward; they never hold instances.
    pub is_alias: bool,
}

impl DependencyInfo {
    fn from_registration(registration: &Registration) -> Self {
        let (dependencies, is_alias, lifetime) = match registration.provider() {
            Provider::Class(class) => (class.dependencies().to_vec(), false, registration.lifetime()),
            Provider::Token(target) => (vec![target.clone()], true, registration.lifetime()),
            // A value is shared by every scope, whatever it was registered as.
            Provider::Value(_) => (Vec::new(), false, Lifetime::Singleton),
            Provider::Factory(_) => (Vec::new(), false, registration.lifetime()),
        };

        Self {
            token: registration.token().clone(),
            dependencies,
            lifetime,
            is_alias,
        }
    }
}

/// Validates the active registration graph.
///
/// # Algorithm
/// Depth-first search keyed by token. A "visiting" set detects cycles,
/// the current path is kept for error reporting.
pub(crate) struct GraphValidator {
    nodes: HashMap<Token, DependencyInfo>,
    visiting: HashSet<Token>,
    validated: HashSet<Token>,
    path: Vec<Token>,
    max_suggestions: usize,
}

impl GraphValidator {
    pub fn new(registrations: Vec<Arc<Registration>>, max_suggestions: usize) -> Self {
        let nodes = registrations
            .iter()
            .map(|registration| {
                let info = DependencyInfo::from_registration(registration);
                (info.token.clone(), info)
            })
            .collect();

        Self::from_nodes(nodes, max_suggestions)
    }

    fn from_nodes(nodes: HashMap<Token, DependencyInfo>, max_suggestions: usize) -> Self {
        Self {
            nodes,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
            max_suggestions,
        }
    }

    /// Validates the entire graph.
    ///
    /// # Errors
    /// - [`WireboxError::CircularDependency`]: cycle detected
    /// - [`WireboxError::NotRegistered`]: missing dependency
    /// - [`WireboxError::ScopeMismatch`]: singleton depends on a scoped registration
    #[instrument(skip(self), name = "graph_validation", fields(nodes = self.nodes.len()))]
    pub fn validate(&mut self) -> Result<()> {
        // Sorted so the first reported error is deterministic.
        let mut tokens: Vec<Token> = self.nodes.keys().cloned().collect();
        tokens.sort_by_key(Token::label);

        for token in tokens {
            self.validate_token(&token)?;
        }

        debug!("Dependency graph validation passed");
        Ok(())
    }

    fn validate_token(&mut self, token: &Token) -> Result<()> {
        if self.validated.contains(token) {
            return Ok(());
        }

        if self.visiting.contains(token) {
            let start = self.path.iter().position(|t| t == token).unwrap_or(0);
            let mut chain = self.path[start..].to_vec();
            chain.push(token.clone());

            warn!(chain = %render_chain(&chain), "Circular dependency detected");
            return Err(WireboxError::CircularDependency(CircularDependencyError { chain }));
        }

        let info = self.nodes.get(token).cloned().ok_or_else(|| {
            let labels: Vec<String> = self.nodes.keys().map(Token::label).collect();
            WireboxError::NotRegistered(NotRegisteredError {
                requested: token.clone(),
                required_by: self.path.last().cloned(),
                suggestions: suggest_similar(&token.label(), &labels, self.max_suggestions),
            })
        })?;

        self.visiting.insert(token.clone());
        self.path.push(token.clone());

        for dependency in &info.dependencies {
            if !info.is_alias {
                self.check_captive(&info, dependency)?;
            }
            self.validate_token(dependency)?;
        }

        self.path.pop();
        self.visiting.remove(token);
        self.validated.insert(token.clone());

        Ok(())
    }

    /// A singleton must not hold a scoped instance.
    fn check_captive(&self, consumer: &DependencyInfo, dependency: &Token) -> Result<()> {
        if consumer.lifetime != Lifetime::Singleton {
            return Ok(());
        }

        if let Some(dependency_lifetime) = self.effective_lifetime(dependency) {
            if dependency_lifetime == Lifetime::Scoped {
                warn!(
                    consumer = %consumer.token,
                    dependency = %dependency,
                    "Singleton depends on a scoped registration"
                );
                return Err(WireboxError::ScopeMismatch(ScopeMismatchError {
                    dependency: dependency.clone(),
                    dependency_lifetime,
                    consumer: consumer.token.clone(),
                    consumer_lifetime: consumer.lifetime,
                }));
            }
        }

        Ok(())
    }

    /// Lifetime of the registration `token` ends up at, following aliases.
    ///
    /// `None` if the chain is broken or loops; the DFS reports those.
    fn effective_lifetime(&self, token: &Token) -> Option<Lifetime> {
        let mut seen = HashSet::new();
        let mut current = self.nodes.get(token)?;

        while current.is_alias {
            if !seen.insert(current.token.clone()) {
                return None;
            }
            current = self.nodes.get(current.dependencies.first()?)?;
        }

        Some(current.lifetime)
    }
}
