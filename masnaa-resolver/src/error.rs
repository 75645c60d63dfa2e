//! Error types for Masnaa resolution and registration.
//!
//! Every error is a build-time configuration error. Each one names the
//! rule that was violated and ends with a hint on how to fix it.

use std::fmt;

use masnaa_support::rendering::{render_callable, render_list};

/// Main error type for all Masnaa operations.
#[derive(Debug, thiserror::Error)]
pub enum MasnaaError {
    /// Mutually exclusive fields or competing directive systems.
    #[error("{}", .0)]
    Conflict(ConflictError),

    /// Directive attached to a method that cannot host it.
    #[error("{}", .0)]
    InvalidPlacement(InvalidPlacementError),

    /// More than one directive claims the same declaration.
    #[error("{}", .0)]
    MultipleDirectives(MultipleDirectivesError),

    /// Resolution produced no receiver or no method to call.
    #[error("{}", .0)]
    MissingTarget(MissingTargetError),

    /// An optional capability required by the directive is unavailable.
    #[error("{}", .0)]
    UnsupportedFeature(UnsupportedFeatureError),

    /// A named constructor points at a method the class does not have.
    #[error("{}", .0)]
    UnknownMethod(UnknownMethodError),

    /// A tag attribute map could not be read as a directive.
    #[error("{}", .0)]
    InvalidTag(InvalidTagError),

    /// Any of the above, raised while processing a declaration.
    #[error("Invalid definition \"{id}\": {source}")]
    Definition {
        id: String,
        #[source]
        source: Box<MasnaaError>,
    },
}

impl MasnaaError {
    /// Wraps `self` with the id of the declaration being processed.
    pub fn in_definition(self, id: impl Into<String>) -> Self {
        MasnaaError::Definition {
            id: id.into(),
            source: Box::new(self),
        }
    }

    /// Returns the underlying rule error, unwrapping declaration context.
    pub fn root(&self) -> &MasnaaError {
        match self {
            MasnaaError::Definition { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the declaration id, if the error carries one.
    pub fn definition_id(&self) -> Option<&str> {
        match self {
            MasnaaError::Definition { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Which directive system raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Factory,
    Constructor,
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveKind::Factory => write!(f, "factory"),
            DirectiveKind::Constructor => write!(f, "named constructor"),
        }
    }
}

/// The specific rule behind a [`ConflictError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// More than one of `class`, `service` and `expression` is set.
    ExclusiveFields(Vec<&'static str>),
    /// `method` and `expression` are both set.
    MethodWithExpression,
    /// A method-level directive names a service or an expression.
    ReceiverOnMethod { class: String, method: String },
    /// A factory directive and a named constructor claim the same class.
    CompetingConstructor { class: String, constructor: String },
}

/// Error when directive fields or directive systems conflict.
#[derive(Debug)]
pub struct ConflictError {
    pub kind: ConflictKind,
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConflictKind::ExclusiveFields(fields) => {
                write!(
                    f,
                    "Factory directive declares {}; only one of \"class\", \"service\" or \"expression\" is allowed",
                    render_list(fields),
                )?;
                write!(f, "\n  Hint: Keep the field that names the receiver and drop the others")
            }
            ConflictKind::MethodWithExpression => {
                write!(f, "Factory directive declares both \"method\" and \"expression\"")?;
                write!(f, "\n  Hint: An expression is called as-is; remove \"method\" or move the call into the expression")
            }
            ConflictKind::ReceiverOnMethod { class, method } => {
                write!(
                    f,
                    "Factory directive on method {} cannot declare \"service\" or \"expression\"",
                    render_callable(class, method),
                )?;
                write!(f, "\n  Hint: Attach service and expression factories to the class instead")
            }
            ConflictKind::CompetingConstructor { class, constructor } => {
                write!(
                    f,
                    "Class {class} declares both a factory directive and the named constructor \"{constructor}\"",
                )?;
                write!(f, "\n  Hint: Use either the factory directive or the named constructor, not both")
            }
        }
    }
}

/// Why a method cannot host a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementRule {
    NotPublic,
    NotStatic,
}

/// Error when a directive is attached to a non-static or non-public method.
#[derive(Debug)]
pub struct InvalidPlacementError {
    pub directive: DirectiveKind,
    pub class: String,
    pub method: String,
    pub rule: PlacementRule,
}

impl fmt::Display for InvalidPlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.rule {
            PlacementRule::NotPublic => "not public",
            PlacementRule::NotStatic => "not static",
        };
        write!(
            f,
            "A {} directive can only target public static methods, but {} is {}",
            self.directive,
            render_callable(&self.class, &self.method),
            what,
        )?;
        write!(f, "\n  Hint: Make the method public and static, or move the directive to the class")
    }
}

/// Error when several directives claim the same declaration.
#[derive(Debug)]
pub struct MultipleDirectivesError {
    pub directive: DirectiveKind,
    pub class: String,
    /// Where each directive was found, e.g. `class`, `Foo::create`, `tag #0`.
    pub sources: Vec<String>,
}

impl fmt::Display for MultipleDirectivesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Only one {} directive is allowed on {}, found {}: {}",
            self.directive,
            self.class,
            self.sources.len(),
            render_list(&self.sources),
        )?;
        write!(f, "\n  Hint: Remove all but one directive")
    }
}

/// Error when resolution ends without a complete recipe.
#[derive(Debug)]
pub struct MissingTargetError {
    pub subject: String,
    /// The part that could not be determined, e.g. `method`.
    pub missing: &'static str,
}

impl fmt::Display for MissingTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Factory directive on {} does not determine a {}",
            self.subject, self.missing,
        )?;
        write!(
            f,
            "\n  Hint: Declare \"{}\" explicitly on the directive",
            self.missing,
        )
    }
}

/// Error when a directive needs a capability the host does not provide.
#[derive(Debug)]
pub struct UnsupportedFeatureError {
    pub feature: &'static str,
    pub subject: String,
    pub hint: &'static str,
}

impl fmt::Display for UnsupportedFeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Factory directive on {} requires the {}, which is not available",
            self.subject, self.feature,
        )?;
        write!(f, "\n  Hint: {}", self.hint)
    }
}

/// Error when a named constructor names a method that does not exist.
#[derive(Debug)]
pub struct UnknownMethodError {
    pub class: String,
    pub method: String,
    /// Similar method names the class does have.
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnknownMethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot use non-existent method {} as a named constructor",
            render_callable(&self.class, &self.method),
        )?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(f, "\n  Hint: Check the \"method\" attribute of the constructor tag")
    }
}

/// Error when a tag attribute map is malformed.
#[derive(Debug)]
pub struct InvalidTagError {
    pub tag: String,
    pub reason: String,
}

impl fmt::Display for InvalidTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid tag \"{}\": {}", self.tag, self.reason)?;
        write!(
            f,
            "\n  Hint: Supported attributes are \"class\", \"service\", \"method\", \"expression\" and \"arguments\""
        )
    }
}

/// Convenient Result type for Masnaa operations.
pub type Result<T> = std::result::Result<T, MasnaaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_error_display() {
        let err = MasnaaError::Conflict(ConflictError {
            kind: ConflictKind::ExclusiveFields(vec!["class", "service"]),
        });

        let msg = format!("{err}");
        assert!(msg.contains("\"class\", \"service\""));
        assert!(msg.contains("Hint"));
    }

    #[test]
    fn invalid_placement_error_display() {
        let err = MasnaaError::InvalidPlacement(InvalidPlacementError {
            directive: DirectiveKind::Factory,
            class: "Foo".into(),
            method: "build".into(),
            rule: PlacementRule::NotStatic,
        });

        let msg = format!("{err}");
        assert!(msg.contains("Foo::build"));
        assert!(msg.contains("not static"));
    }

    #[test]
    fn unknown_method_lists_suggestions() {
        let err = MasnaaError::UnknownMethod(UnknownMethodError {
            class: "Foo".into(),
            method: "creat".into(),
            suggestions: vec!["create".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("Did you mean"));
        assert!(msg.contains("- create"));
    }

    #[test]
    fn definition_context_names_declaration() {
        let err = MasnaaError::MissingTarget(MissingTargetError {
            subject: "Foo".into(),
            missing: "method",
        })
        .in_definition("app.foo");

        assert!(format!("{err}").starts_with("Invalid definition \"app.foo\""));
        assert_eq!(err.definition_id(), Some("app.foo"));
        assert!(matches!(err.root(), MasnaaError::MissingTarget(_)));
    }
}
