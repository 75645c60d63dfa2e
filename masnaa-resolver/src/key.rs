//! Identification keys used by directives and arguments.
//!
//! [`ArgumentKey`] identifies an argument slot, either by position or by
//! name. [`Reference`] and [`Expression`] are the typed forms of a service
//! reference and an expression program; they travel through argument
//! normalization untouched.

use std::fmt;

use serde::Serialize;

/// Identifies one argument slot of a factory call.
///
/// Positional and named arguments may be mixed; the container binds
/// them downstream, so the key is preserved exactly as declared.
///
/// # Examples
/// ```
/// use masnaa_resolver::key::ArgumentKey;
///
/// let first = ArgumentKey::Index(0);
/// let named = ArgumentKey::named("$foo");
/// assert_eq!(first.to_string(), "0");
/// assert_eq!(named.to_string(), "$foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ArgumentKey {
    /// Positional slot.
    Index(usize),
    /// Named slot.
    Named(String),
}

impl ArgumentKey {
    /// Creates a named key.
    #[inline]
    pub fn named(name: impl Into<String>) -> Self {
        ArgumentKey::Named(name.into())
    }

    /// Returns `true` for positional keys.
    #[inline]
    pub fn is_positional(&self) -> bool {
        matches!(self, ArgumentKey::Index(_))
    }
}

impl fmt::Display for ArgumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentKey::Index(index) => write!(f, "{index}"),
            ArgumentKey::Named(name) => write!(f, "{name}"),
        }
    }
}

/// A typed reference to another service.
///
/// Unlike a `"@name"` string, a `Reference` never carries a sigil.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    /// Creates a reference to the service `id`.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the referenced service id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A typed expression-language program.
///
/// The program text is stored as written, without the `@=` sigil.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Expression(String);

impl Expression {
    /// Wraps an expression program.
    #[inline]
    pub fn new(program: impl Into<String>) -> Self {
        Self(program.into())
    }

    /// Returns the program text.
    #[inline]
    pub fn program(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
