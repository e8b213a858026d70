//! Registry keys.
//!
//! A [`Token`] is an opaque identifier used to look up registrations.
//! It is either a Rust type identity or a string name; the container
//! treats both identically.

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a set of registrations in the container.
///
/// # Examples
/// ```
/// use wirebox_container::token::Token;
///
/// struct Database;
///
/// let by_type = Token::of::<Database>();
/// assert!(by_type.label().ends_with("Database"));
///
/// let by_name = Token::named("IDatabase");
/// assert_eq!(by_name, Token::from("IDatabase"));
/// assert_ne!(by_type, by_name);
/// ```
#[derive(Clone)]
pub enum Token {
    /// Identity of a Rust type. The name is kept for diagnostics only.
    Type {
        id: TypeId,
        name: &'static str,
    },
    /// An explicit string name.
    Named(Cow<'static, str>),
}

impl Token {
    /// Creates a token for type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Token::Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Creates a token from a string name.
    #[inline]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Token::Named(name.into())
    }

    /// Returns the [`TypeId`] for type tokens.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Token::Type { id, .. } => Some(*id),
            Token::Named(_) => None,
        }
    }

    /// Returns the string for named tokens.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        match self {
            Token::Type { .. } => None,
            Token::Named(name) => Some(name),
        }
    }

    /// Human-readable label used in logs and error messages.
    ///
    /// Type tokens render as the full type name, named tokens as a
    /// quoted string.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Type { id: a, .. }, Token::Type { id: b, .. }) => a == b,
            (Token::Named(a), Token::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

// Only the identity participates; the type name is diagnostic.
impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Token::Type { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            Token::Named(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type { name, .. } => write!(f, "Token({name})"),
            Token::Named(name) => write!(f, "Token({name:?})"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type { name, .. } => f.write_str(name),
            Token::Named(name) => write!(f, "{name:?}"),
        }
    }
}

impl From<&'static str> for Token {
    fn from(name: &'static str) -> Self {
        Token::named(name)
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::named(name)
    }
}

impl From<&Token> for Token {
    fn from(token: &Token) -> Self {
        token.clone()
    }
}
