//! Cross-checks between the factory and named-constructor directive systems.
//!
//! Both systems can supply the construction recipe of a declaration. A
//! declaration may use one or the other; the guard rejects those using
//! both, whether the named constructor comes from class metadata or from
//! the declaration's constructor tag.

use tracing::warn;

use crate::error::{ConflictError, ConflictKind, MasnaaError, Result};
use crate::metadata::ClassMetadata;
use crate::registry::{AttributeValue, Definition};
use crate::target::DeclarationTarget;

/// Returns the named constructor `class` declares, if any.
///
/// A class declares one either at class level or by marking a method.
pub fn competing_constructor(class: &ClassMetadata) -> Option<&str> {
    class.named_constructor().or_else(|| {
        class
            .methods()
            .iter()
            .find(|m| m.is_constructor())
            .map(|m| m.name())
    })
}

/// Returns the named constructor a declaration's `tag` asks for, if tagged.
///
/// A tag without a text `method` attribute still competes and is reported
/// under the tag name.
pub fn tagged_constructor<'d>(definition: &'d Definition, tag: &'d str) -> Option<&'d str> {
    if !definition.has_tag(tag) {
        return None;
    }

    let method = definition
        .tag(tag)
        .first()
        .and_then(|attributes| match attributes.get("method") {
            Some(AttributeValue::Text(method)) => Some(method.as_str()),
            _ => None,
        });
    Some(method.unwrap_or(tag))
}

/// Fails when a named constructor competes with a resolved factory.
///
/// # Errors
/// [`MasnaaError::Conflict`] with [`ConflictKind::CompetingConstructor`]
/// when `competing` is present.
pub fn check_no_competing_constructor(
    target: &DeclarationTarget,
    competing: Option<&str>,
) -> Result<()> {
    let Some(constructor) = competing else {
        return Ok(());
    };

    warn!(target = %target, constructor = %constructor, "Factory competes with named constructor");
    Err(MasnaaError::Conflict(ConflictError {
        kind: ConflictKind::CompetingConstructor {
            class: target.class().to_string(),
            constructor: constructor.to_string(),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MethodMetadata;
    use crate::target::MethodTarget;

    #[test]
    fn no_competitor_passes() {
        let class = ClassMetadata::new("Foo").method(MethodMetadata::public_static("create"));
        assert_eq!(competing_constructor(&class), None);
        assert!(check_no_competing_constructor(&class.target(), None).is_ok());
    }

    #[test]
    fn class_level_constructor_competes() {
        let class = ClassMetadata::new("Foo").constructor("create");
        assert_eq!(competing_constructor(&class), Some("create"));

        let result = check_no_competing_constructor(&class.target(), competing_constructor(&class));
        match result {
            Err(MasnaaError::Conflict(err)) => assert_eq!(
                err.kind,
                ConflictKind::CompetingConstructor { class: "Foo".into(), constructor: "create".into() }
            ),
            other => panic!("Expected Conflict, got: {other:?}"),
        }
    }

    #[test]
    fn marked_method_competes() {
        let class = ClassMetadata::new("Foo")
            .method(MethodMetadata::public_static("create"))
            .method(MethodMetadata::public_static("fromEnv").constructor());
        assert_eq!(competing_constructor(&class), Some("fromEnv"));
    }

    #[test]
    fn constructor_tag_competes() {
        let mut attributes = crate::registry::Attributes::new();
        attributes.insert("method".into(), AttributeValue::from("create"));
        let tagged = Definition::new("Foo").with_tag("masnaa.constructor", attributes);

        assert_eq!(tagged_constructor(&tagged, "masnaa.constructor"), Some("create"));
        assert_eq!(tagged_constructor(&Definition::new("Foo"), "masnaa.constructor"), None);
    }

    #[test]
    fn malformed_constructor_tag_still_competes() {
        let tagged = Definition::new("Foo").with_marker("masnaa.constructor");
        assert_eq!(
            tagged_constructor(&tagged, "masnaa.constructor"),
            Some("masnaa.constructor")
        );
    }

    #[test]
    fn method_target_reports_declaring_class() {
        let target = DeclarationTarget::Method(MethodTarget {
            class: "Foo".into(),
            name: "create".into(),
            is_static: true,
            is_public: true,
        });

        let err = check_no_competing_constructor(&target, Some("make")).unwrap_err();
        assert!(err.to_string().contains("Class Foo"));
    }
}
