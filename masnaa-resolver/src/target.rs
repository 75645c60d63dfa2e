//! Target resolution — from a directive to a [`FactoryDescriptor`].
//!
//! Resolution is a pure function of the directive and the place it is
//! attached to. Steps, first applicable wins at each stage:
//!
//! 1. **Placement**: a method target must be public and static, may not
//!    name a service or an expression, and lends its name as the default
//!    `method`.
//! 2. **Class default**: a `method` with no receiver is called on the
//!    declaring class (method target) or the target class.
//! 3. **Invoke default**: a `service` with no `method` is invoked as a
//!    callable.
//! 4. **Exclusivity re-check**: the directive invariants are checked
//!    again on the completed fields.
//! 5. **Descriptor**: expression, then service, then class.

use std::fmt;

use tracing::{debug, trace};

use crate::descriptor::FactoryDescriptor;
use crate::directive::FactoryDirective;
use crate::error::{
    ConflictError, ConflictKind, DirectiveKind, InvalidPlacementError, MasnaaError,
    MissingTargetError, PlacementRule, Result, UnsupportedFeatureError,
};
use crate::settings::Settings;

/// A method a directive is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTarget {
    /// The declaring class.
    pub class: String,
    pub name: String,
    pub is_static: bool,
    pub is_public: bool,
}

/// Where a directive is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationTarget {
    /// A class, by name.
    Class(String),
    Method(MethodTarget),
}

impl DeclarationTarget {
    /// The class the target belongs to.
    pub fn class(&self) -> &str {
        match self {
            DeclarationTarget::Class(class) => class,
            DeclarationTarget::Method(method) => &method.class,
        }
    }
}

impl fmt::Display for DeclarationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationTarget::Class(class) => write!(f, "{class}"),
            DeclarationTarget::Method(method) => write!(f, "{}::{}", method.class, method.name),
        }
    }
}

/// Resolves directives against their targets.
///
/// # Examples
/// ```
/// use masnaa_resolver::descriptor::FactoryDescriptor;
/// use masnaa_resolver::directive::FactoryDirective;
/// use masnaa_resolver::target::{DeclarationTarget, TargetResolver};
///
/// let resolver = TargetResolver::default();
/// let directive = FactoryDirective::builder().method("create").build()?;
/// let descriptor = resolver.resolve(&directive, &DeclarationTarget::Class("Foo".into()))?;
/// assert_eq!(descriptor, FactoryDescriptor::class_method("Foo", "create"));
/// # Ok::<(), masnaa_resolver::MasnaaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TargetResolver {
    invoke_method: String,
    expression_language: bool,
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl TargetResolver {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            invoke_method: settings.invoke_method.clone(),
            expression_language: settings.expression_language,
        }
    }

    /// Resolves `directive`, attached to `target`, into a descriptor.
    ///
    /// # Errors
    /// - [`MasnaaError::InvalidPlacement`]: method target not public/static
    /// - [`MasnaaError::Conflict`]: service/expression on a method target,
    ///   or invariants broken once defaults are filled in
    /// - [`MasnaaError::UnsupportedFeature`]: expression without an
    ///   expression language
    /// - [`MasnaaError::MissingTarget`]: no receiver or no method
    pub fn resolve(
        &self,
        directive: &FactoryDirective,
        target: &DeclarationTarget,
    ) -> Result<FactoryDescriptor> {
        let mut draft = directive.clone();

        if let DeclarationTarget::Method(method) = target {
            check_placement(DirectiveKind::Factory, method)?;

            if draft.service.is_some() || draft.expression.is_some() {
                return Err(MasnaaError::Conflict(ConflictError {
                    kind: ConflictKind::ReceiverOnMethod {
                        class: method.class.clone(),
                        method: method.name.clone(),
                    },
                }));
            }

            if draft.method.is_none() {
                trace!(method = %method.name, "Defaulting method to target method");
                draft.method = Some(method.name.clone());
            }
        }

        if draft.method.is_some() && draft.class.is_none() && draft.service.is_none() {
            trace!(class = %target.class(), "Defaulting class to target class");
            draft.class = Some(target.class().to_string());
        }

        if draft.method.is_none() && draft.service.is_some() {
            trace!(method = %self.invoke_method, "Defaulting method to invoke method");
            draft.method = Some(self.invoke_method.clone());
        }

        draft.validate()?;

        let descriptor = self.describe(draft, target)?;
        debug!(target = %target, descriptor = %descriptor, "Resolved factory");
        Ok(descriptor)
    }

    fn describe(
        &self,
        draft: FactoryDirective,
        target: &DeclarationTarget,
    ) -> Result<FactoryDescriptor> {
        if let Some(expression) = draft.expression {
            if !self.expression_language {
                return Err(MasnaaError::UnsupportedFeature(UnsupportedFeatureError {
                    feature: "expression language",
                    subject: target.to_string(),
                    hint: "Enable `expression_language` in the settings once the host can evaluate expressions, or use a class or service factory",
                }));
            }
            return Ok(FactoryDescriptor::expression(expression.canonical()));
        }

        let missing = |missing| {
            MasnaaError::MissingTarget(MissingTargetError {
                subject: target.to_string(),
                missing,
            })
        };

        if let Some(service) = draft.service {
            if service.id().is_empty() {
                return Err(missing("receiver"));
            }
            let method = draft.method.ok_or_else(|| missing("method"))?;
            return Ok(FactoryDescriptor::service_method(service.id(), method));
        }

        if let Some(class) = draft.class {
            let method = draft.method.ok_or_else(|| missing("method"))?;
            return Ok(FactoryDescriptor::class_method(class, method));
        }

        Err(missing("receiver"))
    }
}

/// Checks that a method can host a directive of kind `directive`.
///
/// # Errors
/// [`MasnaaError::InvalidPlacement`] when the method is not public or not static.
pub fn check_placement(directive: DirectiveKind, method: &MethodTarget) -> Result<()> {
    let rule = if !method.is_public {
        PlacementRule::NotPublic
    } else if !method.is_static {
        PlacementRule::NotStatic
    } else {
        return Ok(());
    };

    Err(MasnaaError::InvalidPlacement(InvalidPlacementError {
        directive,
        class: method.class.clone(),
        method: method.name.clone(),
        rule,
    }))
}
