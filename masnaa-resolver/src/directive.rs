//! Factory directives: the declarative input of resolution.
//!
//! A [`FactoryDirective`] says how a declaration should be constructed:
//! by a static method of a class, by a method of another service, or by
//! an expression. It can be built in code (usually by a metadata
//! reflector) or read from a tag attribute map; both surfaces produce the
//! same shape and both validate eagerly.
//!
//! # Examples
//! ```
//! use masnaa_resolver::directive::FactoryDirective;
//!
//! let directive = FactoryDirective::builder()
//!     .service("@mailer.factory")
//!     .method("create")
//!     .argument("%mailer.dsn%")
//!     .build()
//!     .expect("valid directive");
//! assert_eq!(directive.method(), Some("create"));
//!
//! // class + service is rejected before any target is known
//! assert!(FactoryDirective::builder().class("Mailer").service("mailer").build().is_err());
//! ```

use std::fmt;

use crate::argument::{next_index, Argument, Value};
use crate::error::{ConflictError, ConflictKind, InvalidTagError, MasnaaError, Result};
use crate::key::{ArgumentKey, Expression, Reference};
use crate::registry::{AttributeValue, Attributes};

/// The receiver of a service factory: a service id or a typed reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceTarget {
    /// A service id, optionally written with a leading `@`.
    Id(String),
    Reference(Reference),
}

impl ServiceTarget {
    /// Returns the service id without its `@` sigil.
    pub fn id(&self) -> &str {
        match self {
            ServiceTarget::Id(id) => id.strip_prefix('@').unwrap_or(id),
            ServiceTarget::Reference(reference) => reference.id(),
        }
    }
}

impl From<&str> for ServiceTarget {
    fn from(value: &str) -> Self {
        ServiceTarget::Id(value.to_string())
    }
}

impl From<String> for ServiceTarget {
    fn from(value: String) -> Self {
        ServiceTarget::Id(value)
    }
}

impl From<Reference> for ServiceTarget {
    fn from(value: Reference) -> Self {
        ServiceTarget::Reference(value)
    }
}

/// An expression factory, as text or as a typed [`Expression`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionSource {
    Text(String),
    Typed(Expression),
}

impl ExpressionSource {
    /// Returns the program in canonical form, prefixed with `@=`.
    pub fn canonical(&self) -> String {
        let program = match self {
            ExpressionSource::Text(text) => text.as_str(),
            ExpressionSource::Typed(expression) => expression.program(),
        };
        if program.starts_with("@=") {
            program.to_string()
        } else {
            format!("@={program}")
        }
    }
}

impl From<&str> for ExpressionSource {
    fn from(value: &str) -> Self {
        ExpressionSource::Text(value.to_string())
    }
}

impl From<String> for ExpressionSource {
    fn from(value: String) -> Self {
        ExpressionSource::Text(value)
    }
}

impl From<Expression> for ExpressionSource {
    fn from(value: Expression) -> Self {
        ExpressionSource::Typed(value)
    }
}

/// How to construct a declaration, before defaults are inferred.
///
/// Invariants, checked on construction:
/// - at most one of `class`, `service`, `expression` is set;
/// - `method` and `expression` are never both set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactoryDirective {
    pub(crate) class: Option<String>,
    pub(crate) service: Option<ServiceTarget>,
    pub(crate) method: Option<String>,
    pub(crate) expression: Option<ExpressionSource>,
    pub(crate) arguments: Vec<Argument>,
}

impl FactoryDirective {
    /// Starts building a directive.
    pub fn builder() -> FactoryDirectiveBuilder {
        FactoryDirectiveBuilder::default()
    }

    /// A directive with no fields: "call the method I am attached to".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn service(&self) -> Option<&ServiceTarget> {
        self.service.as_ref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn expression(&self) -> Option<&ExpressionSource> {
        self.expression.as_ref()
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Checks the exclusivity invariants.
    ///
    /// # Errors
    /// [`MasnaaError::Conflict`] when more than one of `class`, `service`,
    /// `expression` is set, or when `method` and `expression` are both set.
    pub fn validate(&self) -> Result<()> {
        let receivers: Vec<&'static str> = [
            ("class", self.class.is_some()),
            ("service", self.service.is_some()),
            ("expression", self.expression.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();

        if receivers.len() > 1 {
            return Err(MasnaaError::Conflict(ConflictError {
                kind: ConflictKind::ExclusiveFields(receivers),
            }));
        }

        if self.method.is_some() && self.expression.is_some() {
            return Err(MasnaaError::Conflict(ConflictError {
                kind: ConflictKind::MethodWithExpression,
            }));
        }

        Ok(())
    }

    /// Reads a directive from a tag attribute map.
    ///
    /// Text attributes `class`, `service`, `method` and `expression` map to
    /// the fields of the same name; `arguments` carries the argument list.
    ///
    /// # Errors
    /// [`MasnaaError::InvalidTag`] for unknown keys or mistyped values, and
    /// [`MasnaaError::Conflict`] when the fields violate the invariants.
    pub fn from_attributes(tag: &str, attributes: &Attributes) -> Result<Self> {
        let invalid = |reason: String| {
            MasnaaError::InvalidTag(InvalidTagError { tag: tag.to_string(), reason })
        };

        let mut builder = FactoryDirective::builder();
        for (key, value) in attributes {
            match (key.as_str(), value) {
                ("class", AttributeValue::Text(text)) => builder = builder.class(text.as_str()),
                ("service", AttributeValue::Text(text)) => builder = builder.service(text.as_str()),
                ("method", AttributeValue::Text(text)) => builder = builder.method(text.as_str()),
                ("expression", AttributeValue::Text(text)) => {
                    builder = builder.expression(text.as_str())
                }
                ("arguments", AttributeValue::Arguments(arguments)) => {
                    builder.directive.arguments.extend(arguments.iter().cloned())
                }
                ("class" | "service" | "method" | "expression", AttributeValue::Arguments(_)) => {
                    return Err(invalid(format!("attribute \"{key}\" must be a string")));
                }
                ("arguments", AttributeValue::Text(_)) => {
                    return Err(invalid("attribute \"arguments\" must be an argument list".into()));
                }
                (other, _) => {
                    return Err(invalid(format!("unknown attribute \"{other}\"")));
                }
            }
        }

        builder.build()
    }
}

impl fmt::Display for FactoryDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(class) = &self.class {
            parts.push(format!("class: {class}"));
        }
        if let Some(service) = &self.service {
            parts.push(format!("service: @{}", service.id()));
        }
        if let Some(method) = &self.method {
            parts.push(format!("method: {method}"));
        }
        if let Some(expression) = &self.expression {
            parts.push(format!("expression: {}", expression.canonical()));
        }
        if !self.arguments.is_empty() {
            parts.push(format!("arguments: {}", self.arguments.len()));
        }
        write!(f, "Factory({})", parts.join(", "))
    }
}

/// Builds a [`FactoryDirective`], validating it in [`build()`](Self::build).
#[derive(Debug, Default)]
pub struct FactoryDirectiveBuilder {
    directive: FactoryDirective,
}

impl FactoryDirectiveBuilder {
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.directive.class = Some(class.into());
        self
    }

    pub fn service(mut self, service: impl Into<ServiceTarget>) -> Self {
        self.directive.service = Some(service.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.directive.method = Some(method.into());
        self
    }

    pub fn expression(mut self, expression: impl Into<ExpressionSource>) -> Self {
        self.directive.expression = Some(expression.into());
        self
    }

    /// Appends a positional argument.
    pub fn argument(mut self, value: impl Into<Value>) -> Self {
        let key = ArgumentKey::Index(next_index(&self.directive.arguments));
        self.directive.arguments.push(Argument::new(key, value));
        self
    }

    /// Appends a named argument.
    pub fn named_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.directive
            .arguments
            .push(Argument::new(ArgumentKey::named(name), value));
        self
    }

    /// Validates and returns the directive.
    ///
    /// # Errors
    /// See [`FactoryDirective::validate`].
    pub fn build(self) -> Result<FactoryDirective> {
        self.directive.validate()?;
        Ok(self.directive)
    }
}
