//! Error types for Wirebox container operations.
//!
//! Every failure names the token involved and, where it helps, the
//! chain of registrations that led to it.

use std::fmt;

use wirebox_support::rendering::render_chain;

use crate::lifetime::Lifetime;
use crate::token::Token;

/// Main error type for all Wirebox operations.
#[derive(Debug, thiserror::Error)]
pub enum WireboxError {
    /// Requested token has no registration.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// A registration was reached again while it was still being built.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// Registration rejected before anything was stored.
    #[error("Invalid registration for {token}: {reason}")]
    InvalidRegistration { token: Token, reason: String },

    /// A singleton would capture a scoped instance. Reported by validation only.
    #[error("{}", .0)]
    ScopeMismatch(ScopeMismatchError),

    /// A resolved instance is not of the requested type.
    #[error("Type mismatch for {token}: expected {expected}")]
    TypeMismatch {
        token: Token,
        expected: &'static str,
    },

    /// A constructor asked for more arguments than were declared.
    #[error("Constructor for {token} requested argument #{index}, but only {declared} dependencies are declared")]
    MissingArgument {
        token: Token,
        index: usize,
        declared: usize,
    },

    /// A factory or constructor returned an error of its own.
    #[error("Failed to construct {token}: {source}")]
    ConstructionFailed {
        token: Token,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl WireboxError {
    /// Wraps a user error raised while building `token`.
    pub fn construction(
        token: impl Into<Token>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        WireboxError::ConstructionFailed {
            token: token.into(),
            source: source.into(),
        }
    }

    pub(crate) fn invalid(token: &Token, reason: impl Into<String>) -> Self {
        WireboxError::InvalidRegistration {
            token: token.clone(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`WireboxError::NotRegistered`].
    pub fn is_not_registered(&self) -> bool {
        matches!(self, WireboxError::NotRegistered(_))
    }

    /// Returns `true` for [`WireboxError::CircularDependency`].
    pub fn is_circular(&self) -> bool {
        matches!(self, WireboxError::CircularDependency(_))
    }
}

/// Error when a token has no registration.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The token that was requested
    pub requested: Token,
    /// The token whose construction needed it (if any)
    pub required_by: Option<Token>,
    /// Registered tokens with similar labels
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(f, "\n  Hint: register a provider for {} before resolving it", self.requested)
    }
}

/// Error when resolution revisits a registration under construction.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Tokens from the first occurrence to the repeated one.
    /// Example: [A, B, C, A]
    pub chain: Vec<Token>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: resolve one side lazily through a factory, or break the cycle"
        )
    }
}

/// A longer-lived registration depends on a scoped one.
///
/// The singleton would keep the scoped instance of whichever scope
/// built it first.
#[derive(Debug)]
pub struct ScopeMismatchError {
    pub dependency: Token,
    pub dependency_lifetime: Lifetime,
    pub consumer: Token,
    pub consumer_lifetime: Lifetime,
}

impl fmt::Display for ScopeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scope mismatch: {} ({}) depends on {} ({})",
            self.consumer, self.consumer_lifetime, self.dependency, self.dependency_lifetime,
        )?;
        write!(
            f,
            "\n  A {} instance would capture the {} instance of the first scope that builds it",
            self.consumer_lifetime, self.dependency_lifetime,
        )?;
        write!(
            f,
            "\n  Hint: make {} Scoped or Transient, or {} Singleton",
            self.consumer, self.dependency,
        )
    }
}

/// Convenient Result type for Wirebox operations.
pub type Result<T> = std::result::Result<T, WireboxError>;
