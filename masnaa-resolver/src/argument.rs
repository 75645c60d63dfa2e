//! Argument normalization.
//!
//! Raw directive arguments are strings, scalars or typed construction
//! helpers. [`normalize`] turns them into [`ResolvedArgument`]s the
//! container's argument-resolution stage understands:
//!
//! | raw value            | resolved                         |
//! |----------------------|----------------------------------|
//! | `"@mailer"`          | `ServiceReference("mailer")`     |
//! | `"%kernel.dir%"`     | `Parameter("kernel.dir")`        |
//! | `"plain"`            | `Literal("plain")`               |
//! | `42`, typed helpers  | `PassthroughTyped(value)`        |
//!
//! Keys and order are preserved.

use serde::Serialize;
use tracing::trace;

use crate::key::{ArgumentKey, Expression, Reference};

/// A raw argument value as declared on a directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Typed(TypedValue),
}

/// Typed construction helpers.
///
/// These are already unambiguous, so normalization never looks inside them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    /// A service reference.
    Reference(Reference),
    /// A container parameter by name.
    Parameter(String),
    /// A lazily iterated list of values.
    Iterator(Vec<Value>),
    /// A closure returning the referenced service.
    ServiceClosure(Reference),
    /// A locator over a fixed set of services.
    ServiceLocator(Vec<Reference>),
    /// An iterator over every service carrying a tag.
    TaggedIterator(String),
    /// An expression evaluated when the argument is resolved.
    Expression(Expression),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<TypedValue> for Value {
    fn from(value: TypedValue) -> Self {
        Value::Typed(value)
    }
}

impl From<Reference> for Value {
    fn from(value: Reference) -> Self {
        Value::Typed(TypedValue::Reference(value))
    }
}

/// One declared argument: a key and its raw value.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub key: ArgumentKey,
    pub value: Value,
}

impl Argument {
    pub fn new(key: ArgumentKey, value: impl Into<Value>) -> Self {
        Self { key, value: value.into() }
    }
}

/// Returns the index the next positional argument should take.
///
/// Positional slots continue after the highest index already used,
/// regardless of named arguments declared in between.
pub fn next_index(arguments: &[Argument]) -> usize {
    arguments
        .iter()
        .filter_map(|a| match a.key {
            ArgumentKey::Index(i) => Some(i + 1),
            ArgumentKey::Named(_) => None,
        })
        .max()
        .unwrap_or(0)
}

/// An argument after sigil interpretation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedArgument {
    /// A plain string, kept verbatim.
    Literal(String),
    /// `@name`: a reference to service `name`.
    ServiceReference(String),
    /// `%name%`: the container parameter `name`.
    Parameter(String),
    /// Non-string values and typed helpers, untouched.
    PassthroughTyped(Value),
}

/// Normalized arguments, in declaration order.
pub type ResolvedArguments = Vec<(ArgumentKey, ResolvedArgument)>;

/// Interprets a single raw value.
pub fn normalize_value(value: &Value) -> ResolvedArgument {
    let Value::String(text) = value else {
        return ResolvedArgument::PassthroughTyped(value.clone());
    };

    if let Some(service) = text.strip_prefix('@') {
        return ResolvedArgument::ServiceReference(service.to_string());
    }

    if text.len() >= 2 && text.starts_with('%') && text.ends_with('%') {
        return ResolvedArgument::Parameter(text[1..text.len() - 1].to_string());
    }

    ResolvedArgument::Literal(text.clone())
}

/// Normalizes a raw argument list, preserving keys and order.
///
/// # Examples
/// ```
/// use masnaa_resolver::argument::{normalize, Argument, ResolvedArgument};
/// use masnaa_resolver::key::ArgumentKey;
///
/// let raw = vec![
///     Argument::new(ArgumentKey::Index(0), "@mailer"),
///     Argument::new(ArgumentKey::named("$dir"), "%kernel.dir%"),
/// ];
/// let normalized = normalize(&raw);
/// assert_eq!(normalized[0].1, ResolvedArgument::ServiceReference("mailer".into()));
/// assert_eq!(normalized[1].1, ResolvedArgument::Parameter("kernel.dir".into()));
/// ```
pub fn normalize(arguments: &[Argument]) -> ResolvedArguments {
    arguments
        .iter()
        .map(|argument| {
            let resolved = normalize_value(&argument.value);
            trace!(key = %argument.key, resolved = ?resolved, "Normalized argument");
            (argument.key.clone(), resolved)
        })
        .collect()
}
