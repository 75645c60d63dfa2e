//! Factory descriptors — the resolved construction recipe.

use std::fmt;

use masnaa_support::rendering::render_callable;
use serde::Serialize;

/// What the container calls to construct a declaration.
///
/// # Examples
/// ```
/// use masnaa_resolver::descriptor::FactoryDescriptor;
///
/// assert_eq!(FactoryDescriptor::class_method("Foo", "create").to_string(), "Foo::create");
/// assert_eq!(FactoryDescriptor::service_method("svc", "__invoke").to_string(), "@svc::__invoke");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactoryDescriptor {
    /// A static method on a class.
    ClassMethod { class: String, method: String },
    /// A method on another service.
    ServiceMethod { service: String, method: String },
    /// An expression program, always starting with `@=`.
    Expression { program: String },
}

impl FactoryDescriptor {
    pub fn class_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        FactoryDescriptor::ClassMethod {
            class: class.into(),
            method: method.into(),
        }
    }

    pub fn service_method(service: impl Into<String>, method: impl Into<String>) -> Self {
        FactoryDescriptor::ServiceMethod {
            service: service.into(),
            method: method.into(),
        }
    }

    /// Creates an expression descriptor; `program` must already be canonical.
    pub fn expression(program: impl Into<String>) -> Self {
        FactoryDescriptor::Expression { program: program.into() }
    }

    /// The method called, if the descriptor is a call.
    pub fn method(&self) -> Option<&str> {
        match self {
            FactoryDescriptor::ClassMethod { method, .. }
            | FactoryDescriptor::ServiceMethod { method, .. } => Some(method),
            FactoryDescriptor::Expression { .. } => None,
        }
    }
}

impl fmt::Display for FactoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryDescriptor::ClassMethod { class, method } => {
                write!(f, "{}", render_callable(class, method))
            }
            FactoryDescriptor::ServiceMethod { service, method } => {
                write!(f, "{}", render_callable(&format!("@{service}"), method))
            }
            FactoryDescriptor::Expression { program } => write!(f, "{program}"),
        }
    }
}
