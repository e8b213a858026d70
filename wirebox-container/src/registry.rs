//! Registration store shared by a whole scope family.
//!
//! The registry maps each [`Token`] to the ordered list of its
//! [`Registration`]s. It is append-only; the only removal is a full
//! [`Registry::clear`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, WireboxError};
use crate::lifetime::Lifetime;
use crate::provider::{Provider, ProviderKind};
use crate::token::Token;

/// Stable identity of a registration, distinct from its token.
///
/// Ids are assigned monotonically and never reused, not even after
/// the registry is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One immutable (token, provider, lifetime) entry.
#[derive(Clone)]
pub struct Registration {
    id: RegistrationId,
    token: Token,
    provider: Provider,
    lifetime: Lifetime,
}

impl Registration {
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Diagnostic snapshot of this registration.
    pub fn info(&self) -> RegistrationInfo {
        RegistrationInfo {
            id: self.id,
            token: self.token.label(),
            lifetime: self.lifetime,
            provider: self.provider.kind(),
            target: match &self.provider {
                Provider::Token(target) => Some(target.label()),
                Provider::Class(class) => Some(class.type_name().to_string()),
                Provider::Value(_) | Provider::Factory(_) => None,
            },
            dependencies: match &self.provider {
                Provider::Class(class) => class.dependencies().iter().map(Token::label).collect(),
                _ => Vec::new(),
            },
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("token", &self.token)
            .field("lifetime", &self.lifetime)
            .field("provider", &self.provider)
            .finish()
    }
}

/// Serializable view of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationInfo {
    pub id: RegistrationId,
    pub token: String,
    pub lifetime: Lifetime,
    pub provider: ProviderKind,
    /// Alias target, or the constructed type for class providers.
    pub target: Option<String>,
    pub dependencies: Vec<String>,
}

/// Stores all registrations of a scope family.
#[derive(Default)]
pub(crate) struct Registry {
    entries: RwLock<HashMap<Token, Vec<Arc<Registration>>>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registration for `token`.
    ///
    /// # Errors
    /// Returns [`WireboxError::InvalidRegistration`] when the provider
    /// and lifetime conflict. Nothing is stored in that case.
    pub fn register(
        &self,
        token: Token,
        provider: Provider,
        lifetime: Lifetime,
    ) -> Result<RegistrationId> {
        check_registration(&token, &provider, lifetime)?;

        // Ids are handed out under the write lock so per-token order matches id order.
        let mut entries = self.entries.write();
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(
            token = %token,
            id = %id,
            lifetime = %lifetime,
            provider = %provider.kind(),
            "Registered provider"
        );

        let registration = Arc::new(Registration {
            id,
            token: token.clone(),
            provider,
            lifetime,
        });
        entries.entry(token).or_default().push(registration);
        Ok(id)
    }

    /// All registrations for `token`, in registration order.
    pub fn registrations_for(&self, token: &Token) -> Vec<Arc<Registration>> {
        self.entries.read().get(token).cloned().unwrap_or_default()
    }

    /// The most recent registration for `token`.
    pub fn active(&self, token: &Token) -> Option<Arc<Registration>> {
        self.entries.read().get(token).and_then(|list| list.last().cloned())
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.entries.read().get(token).is_some_and(|list| !list.is_empty())
    }

    /// Every registration, ordered by id.
    pub fn all(&self) -> Vec<Arc<Registration>> {
        let mut all: Vec<_> = self.entries.read().values().flatten().cloned().collect();
        all.sort_by_key(|registration| registration.id);
        all
    }

    /// The active registration of every token.
    pub fn active_registrations(&self) -> Vec<Arc<Registration>> {
        self.entries
            .read()
            .values()
            .filter_map(|list| list.last().cloned())
            .collect()
    }

    /// Labels of every registered token (for suggestions).
    pub fn token_labels(&self) -> Vec<String> {
        self.entries.read().keys().map(Token::label).collect()
    }

    /// Number of registrations across all tokens.
    pub fn len(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every registration. Ids keep counting up.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        debug!(tokens = entries.len(), "Clearing registry");
        entries.clear();
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tokens", &self.entries.read().len())
            .field("registrations", &self.len())
            .finish()
    }
}

/// Rejects provider/lifetime combinations that can never behave as asked.
fn check_registration(token: &Token, provider: &Provider, lifetime: Lifetime) -> Result<()> {
    if let Provider::Token(target) = provider {
        if target == token {
            return Err(WireboxError::invalid(token, "a token alias cannot target itself"));
        }
        if lifetime != Lifetime::Transient {
            return Err(WireboxError::invalid(
                token,
                format!(
                    "a token alias has no instance of its own, so it cannot be {lifetime}; \
                     set the lifetime on {target} instead"
                ),
            ));
        }
    }
    Ok(())
}
