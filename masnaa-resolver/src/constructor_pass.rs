//! Named constructor passes.
//!
//! A named constructor is a public static method of the class itself used
//! in place of the regular constructor. It is declared with the
//! constructor tag on the declaration (`{method: "create"}`), at class
//! level in the class metadata, or by marking the method itself. Both
//! passes set the declaration's factory to `Class::method` and leave
//! arguments alone.

use masnaa_support::rendering::suggest_similar;
use tracing::{debug, info, instrument};

use crate::descriptor::FactoryDescriptor;
use crate::error::{
    ConflictError, ConflictKind, DirectiveKind, InvalidTagError, MasnaaError,
    MultipleDirectivesError, Result, UnknownMethodError,
};
use crate::metadata::{ClassMetadata, MetadataReflector};
use crate::pass::{Pass, PassReport, SkipReason};
use crate::registry::{AttributeValue, Definition, DefinitionRegistry};
use crate::settings::Settings;
use crate::target::{check_placement, DeclarationTarget};

const MAX_SUGGESTIONS: usize = 3;

/// Commits resolved constructors once every declaration has resolved.
fn commit(
    registry: &mut dyn DefinitionRegistry,
    pending: Vec<(String, FactoryDescriptor)>,
    report: &mut PassReport,
) {
    for (id, descriptor) in pending {
        if let Some(definition) = registry.definition_mut(&id) {
            definition.set_factory(descriptor.clone());
            report.commit(id, descriptor);
        }
    }
}

fn check_method_target(class: &ClassMetadata, method: &str) -> Result<()> {
    let Some(found) = class.find_method(method) else {
        let available: Vec<&str> = class.methods().iter().map(|m| m.name()).collect();
        return Err(MasnaaError::UnknownMethod(UnknownMethodError {
            class: class.name().to_string(),
            method: method.to_string(),
            suggestions: suggest_similar(method, &available, MAX_SUGGESTIONS),
        }));
    };

    match found.target() {
        DeclarationTarget::Method(target) => check_placement(DirectiveKind::Constructor, &target),
        DeclarationTarget::Class(_) => Ok(()),
    }
}

/// Sets named constructors declared with the constructor tag, or at class
/// level in the metadata of an autoconfigured declaration.
pub struct RegisterConstructors<'r> {
    reflector: &'r dyn MetadataReflector,
    settings: Settings,
}

impl<'r> RegisterConstructors<'r> {
    pub fn new(reflector: &'r dyn MetadataReflector, settings: Settings) -> Self {
        Self { reflector, settings }
    }

    /// The class-level named constructor, for declarations that read metadata.
    fn declared_constructor(&self, definition: &Definition) -> Option<&'r str> {
        if !definition.is_autoconfigured() || definition.has_tag(&self.settings.ignore_tag) {
            return None;
        }
        self.reflector.class(definition.class())?.named_constructor()
    }

    fn tagged_method(&self, definition: &Definition) -> Result<Option<String>> {
        let tag = &self.settings.constructor_tag;
        let invalid = |reason: &str| {
            MasnaaError::InvalidTag(InvalidTagError {
                tag: tag.clone(),
                reason: reason.to_string(),
            })
        };

        match definition.tag(tag).first().map(|attributes| attributes.get("method")) {
            None => Ok(None),
            Some(Some(AttributeValue::Text(method))) => Ok(Some(method.clone())),
            Some(Some(AttributeValue::Arguments(_))) => {
                Err(invalid("attribute \"method\" must be a string"))
            }
            Some(None) => Err(invalid("missing attribute \"method\"")),
        }
    }

    fn resolve(&self, definition: &Definition) -> Result<Option<FactoryDescriptor>> {
        let tag = &self.settings.constructor_tag;
        let declared = self.declared_constructor(definition);

        let mut sources: Vec<String> =
            (0..definition.tag(tag).len()).map(|i| format!("tag {tag} #{i}")).collect();
        if declared.is_some() {
            sources.push(format!("class {}", definition.class()));
        }
        if sources.len() > 1 {
            return Err(MasnaaError::MultipleDirectives(MultipleDirectivesError {
                directive: DirectiveKind::Constructor,
                class: definition.class().to_string(),
                sources,
            }));
        }

        let method = match declared {
            Some(method) => method.to_string(),
            None => match self.tagged_method(definition)? {
                Some(method) => method,
                None => return Ok(None),
            },
        };

        let Some(class) = self.reflector.class(definition.class()) else {
            return Ok(None);
        };

        check_method_target(class, &method)?;
        Ok(Some(FactoryDescriptor::class_method(class.name(), method)))
    }
}

impl Pass for RegisterConstructors<'_> {
    #[instrument(skip(self, registry), name = "register_constructors")]
    fn process(&self, registry: &mut dyn DefinitionRegistry) -> Result<PassReport> {
        let mut report = PassReport::default();
        let mut pending = Vec::new();

        for id in registry.ids() {
            let Some(definition) = registry.definition(&id) else {
                continue;
            };
            if !definition.has_tag(&self.settings.constructor_tag)
                && self.declared_constructor(definition).is_none()
            {
                report.skip(id, SkipReason::NotEligible);
                continue;
            }

            match self.resolve(definition).map_err(|err| err.in_definition(&id))? {
                Some(descriptor) => {
                    debug!(id = %id, descriptor = %descriptor, "Resolved named constructor");
                    pending.push((id, descriptor));
                }
                None => report.skip(id, SkipReason::NoMetadata),
            }
        }

        commit(registry, pending, &mut report);
        info!(committed = report.committed.len(), "Named constructors registered");
        Ok(report)
    }

    fn name(&self) -> &str {
        "register_constructors"
    }
}

/// Sets named constructors declared by marking a static method.
///
/// Only autoconfigured declarations without the ignore tag are read.
pub struct RegisterConstructorAttributes<'r> {
    reflector: &'r dyn MetadataReflector,
    settings: Settings,
}

impl<'r> RegisterConstructorAttributes<'r> {
    pub fn new(reflector: &'r dyn MetadataReflector, settings: Settings) -> Self {
        Self { reflector, settings }
    }

    fn resolve(&self, class: &ClassMetadata) -> Result<Option<FactoryDescriptor>> {
        let marked: Vec<_> = class.methods().iter().filter(|m| m.is_constructor()).collect();

        if marked.len() > 1 {
            return Err(MasnaaError::MultipleDirectives(MultipleDirectivesError {
                directive: DirectiveKind::Constructor,
                class: class.name().to_string(),
                sources: marked.iter().map(|m| m.target().to_string()).collect(),
            }));
        }
        let Some(method) = marked.first() else {
            return Ok(None);
        };

        check_method_target(class, method.name())?;

        if let Some(constructor) = class.named_constructor() {
            return Err(MasnaaError::Conflict(ConflictError {
                kind: ConflictKind::CompetingConstructor {
                    class: class.name().to_string(),
                    constructor: constructor.to_string(),
                },
            }));
        }

        Ok(Some(FactoryDescriptor::class_method(class.name(), method.name())))
    }
}

impl Pass for RegisterConstructorAttributes<'_> {
    #[instrument(skip(self, registry), name = "register_constructor_attributes")]
    fn process(&self, registry: &mut dyn DefinitionRegistry) -> Result<PassReport> {
        let mut report = PassReport::default();
        let mut pending = Vec::new();

        for id in registry.ids() {
            let Some(definition) = registry.definition(&id) else {
                continue;
            };
            if !definition.is_autoconfigured() {
                report.skip(id, SkipReason::NotEligible);
                continue;
            }
            if definition.has_tag(&self.settings.ignore_tag) {
                report.skip(id, SkipReason::Ignored);
                continue;
            }
            let Some(class) = self.reflector.class(definition.class()) else {
                report.skip(id, SkipReason::NoMetadata);
                continue;
            };

            match self.resolve(class).map_err(|err| err.in_definition(&id))? {
                Some(descriptor) => {
                    debug!(id = %id, descriptor = %descriptor, "Resolved named constructor marker");
                    pending.push((id, descriptor));
                }
                None => report.skip(id, SkipReason::NoDirective),
            }
        }

        commit(registry, pending, &mut report);
        info!(committed = report.committed.len(), "Named constructor markers registered");
        Ok(report)
    }

    fn name(&self) -> &str {
        "register_constructor_attributes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlacementRule;
    use crate::metadata::{MethodMetadata, StaticReflector, Visibility};
    use crate::registry::{Attributes, Definitions};

    fn self_factory_class() -> ClassMetadata {
        ClassMetadata::new("SelfFactoryClass")
            .method(MethodMetadata::public_static("create"))
            .method(MethodMetadata::public_static("protectedCreate").with_visibility(Visibility::Private))
            .method(MethodMetadata::public("nonStaticCreate"))
    }

    fn reflector() -> StaticReflector {
        StaticReflector::builder().class(self_factory_class()).build()
    }

    fn constructor_tag(method: &str) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("method".into(), AttributeValue::from(method));
        attributes
    }

    fn tagged(tags: Vec<Attributes>) -> Definitions {
        let definition = tags.into_iter().fold(
            Definition::new("foo").with_class("SelfFactoryClass"),
            |definition, attributes| definition.with_tag("masnaa.constructor", attributes),
        );
        Definitions::new().with(definition)
    }

    fn run_tags(definitions: &mut Definitions) -> Result<PassReport> {
        let reflector = reflector();
        RegisterConstructors::new(&reflector, Settings::default()).process(definitions)
    }

    #[test]
    fn valid_tag_sets_factory() {
        let mut definitions = tagged(vec![constructor_tag("create")]);
        run_tags(&mut definitions).unwrap();
        assert_eq!(
            definitions.get("foo").unwrap().factory(),
            Some(&FactoryDescriptor::class_method("SelfFactoryClass", "create"))
        );
    }

    #[test]
    fn untagged_definition_is_untouched() {
        let mut definitions =
            Definitions::new().with(Definition::new("foo").with_class("SelfFactoryClass"));
        let report = run_tags(&mut definitions).unwrap();
        assert!(definitions.get("foo").unwrap().factory().is_none());
        assert_eq!(report.skipped_for("foo"), Some(SkipReason::NotEligible));
    }

    #[test]
    fn duplicate_tag_fails() {
        let mut definitions = tagged(vec![constructor_tag("create"), constructor_tag("create")]);
        let err = run_tags(&mut definitions).unwrap_err();
        assert!(matches!(err.root(), MasnaaError::MultipleDirectives(_)));
    }

    #[test]
    fn missing_method_attribute_fails() {
        let mut definitions = tagged(vec![Attributes::new()]);
        let err = run_tags(&mut definitions).unwrap_err();
        assert!(matches!(err.root(), MasnaaError::InvalidTag(_)));
    }

    #[test]
    fn unknown_method_suggests_alternatives() {
        let mut definitions = tagged(vec![constructor_tag("creat")]);
        let err = run_tags(&mut definitions).unwrap_err();
        match err.root() {
            MasnaaError::UnknownMethod(err) => {
                assert_eq!(err.method, "creat");
                assert!(err.suggestions.contains(&"create".to_string()));
            }
            other => panic!("Expected UnknownMethod, got: {other:?}"),
        }
    }

    #[test]
    fn private_method_fails() {
        let mut definitions = tagged(vec![constructor_tag("protectedCreate")]);
        let err = run_tags(&mut definitions).unwrap_err();
        match err.root() {
            MasnaaError::InvalidPlacement(err) => assert_eq!(err.rule, PlacementRule::NotPublic),
            other => panic!("Expected InvalidPlacement, got: {other:?}"),
        }
    }

    #[test]
    fn non_static_method_fails() {
        let mut definitions = tagged(vec![constructor_tag("nonStaticCreate")]);
        let err = run_tags(&mut definitions).unwrap_err();
        match err.root() {
            MasnaaError::InvalidPlacement(err) => {
                assert_eq!(err.rule, PlacementRule::NotStatic);
                assert_eq!(err.directive, DirectiveKind::Constructor);
            }
            other => panic!("Expected InvalidPlacement, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_class_is_skipped() {
        let mut definitions = Definitions::new().with(
            Definition::new("bar")
                .with_class("Unknown")
                .with_tag("masnaa.constructor", constructor_tag("create")),
        );
        let report = run_tags(&mut definitions).unwrap();
        assert_eq!(report.skipped_for("bar"), Some(SkipReason::NoMetadata));
    }

    fn run_class_level(class: ClassMetadata, definition: Definition) -> (Result<PassReport>, Definitions) {
        let reflector = StaticReflector::builder().class(class).build();
        let mut definitions = Definitions::new().with(definition);
        let result = RegisterConstructors::new(&reflector, Settings::default()).process(&mut definitions);
        (result, definitions)
    }

    #[test]
    fn class_level_constructor_sets_factory() {
        let class = ClassMetadata::new("Foo")
            .constructor("create")
            .method(MethodMetadata::public_static("create"));
        let (result, definitions) = run_class_level(class, Definition::new("Foo").autoconfigured(true));

        assert_eq!(
            result.unwrap().committed_for("Foo"),
            Some(&FactoryDescriptor::class_method("Foo", "create"))
        );
        assert_eq!(
            definitions.get("Foo").unwrap().factory(),
            Some(&FactoryDescriptor::class_method("Foo", "create"))
        );
    }

    #[test]
    fn class_level_constructor_needs_autoconfiguration() {
        let class = ClassMetadata::new("Foo")
            .constructor("create")
            .method(MethodMetadata::public_static("create"));

        let (result, definitions) = run_class_level(class.clone(), Definition::new("Foo"));
        assert_eq!(result.unwrap().skipped_for("Foo"), Some(SkipReason::NotEligible));
        assert!(definitions.get("Foo").unwrap().factory().is_none());

        let ignored = Definition::new("Foo")
            .autoconfigured(true)
            .with_marker("masnaa.ignore_directives");
        let (result, _) = run_class_level(class, ignored);
        assert_eq!(result.unwrap().skipped_for("Foo"), Some(SkipReason::NotEligible));
    }

    #[test]
    fn class_level_constructor_and_tag_are_multiple() {
        let class = ClassMetadata::new("Foo")
            .constructor("create")
            .method(MethodMetadata::public_static("create"));
        let definition = Definition::new("Foo")
            .autoconfigured(true)
            .with_tag("masnaa.constructor", constructor_tag("create"));
        let (result, _) = run_class_level(class, definition);

        match result.unwrap_err().root() {
            MasnaaError::MultipleDirectives(err) => {
                assert_eq!(err.sources, vec!["tag masnaa.constructor #0", "class Foo"])
            }
            other => panic!("Expected MultipleDirectives, got: {other:?}"),
        }
    }

    #[test]
    fn class_level_constructor_checks_method() {
        let class = ClassMetadata::new("Foo")
            .constructor("build")
            .method(MethodMetadata::public("build"));
        let (result, definitions) = run_class_level(class, Definition::new("Foo").autoconfigured(true));

        assert!(matches!(result.unwrap_err().root(), MasnaaError::InvalidPlacement(_)));
        assert!(definitions.get("Foo").unwrap().factory().is_none());
    }

    fn run_markers(class: ClassMetadata, definition: Definition) -> (Result<PassReport>, Definitions) {
        let reflector = StaticReflector::builder().class(class).build();
        let mut definitions = Definitions::new().with(definition);
        let result = RegisterConstructorAttributes::new(&reflector, Settings::default())
            .process(&mut definitions);
        (result, definitions)
    }

    #[test]
    fn marked_method_becomes_factory() {
        let class = ClassMetadata::new("Foo").method(MethodMetadata::public_static("create").constructor());
        let (result, definitions) = run_markers(class, Definition::new("Foo").autoconfigured(true));

        result.unwrap();
        assert_eq!(
            definitions.get("Foo").unwrap().factory(),
            Some(&FactoryDescriptor::class_method("Foo", "create"))
        );
    }

    #[test]
    fn markers_need_autoconfiguration() {
        let class = ClassMetadata::new("Foo").method(MethodMetadata::public_static("create").constructor());
        let (result, definitions) = run_markers(class, Definition::new("Foo"));

        assert_eq!(result.unwrap().skipped_for("Foo"), Some(SkipReason::NotEligible));
        assert!(definitions.get("Foo").unwrap().factory().is_none());
    }

    #[test]
    fn ignore_tag_skips_markers() {
        let class = ClassMetadata::new("Foo").method(MethodMetadata::public_static("create").constructor());
        let definition = Definition::new("Foo")
            .autoconfigured(true)
            .with_marker("masnaa.ignore_directives");
        let (result, _) = run_markers(class, definition);

        assert_eq!(result.unwrap().skipped_for("Foo"), Some(SkipReason::Ignored));
    }

    #[test]
    fn multiple_markers_fail() {
        let class = ClassMetadata::new("Foo")
            .method(MethodMetadata::public_static("create").constructor())
            .method(MethodMetadata::public_static("fromEnv").constructor());
        let (result, _) = run_markers(class, Definition::new("Foo").autoconfigured(true));

        match result.unwrap_err().root() {
            MasnaaError::MultipleDirectives(err) => assert_eq!(err.sources.len(), 2),
            other => panic!("Expected MultipleDirectives, got: {other:?}"),
        }
    }

    #[test]
    fn marker_and_class_constructor_conflict() {
        let class = ClassMetadata::new("Foo")
            .constructor("create")
            .method(MethodMetadata::public_static("create").constructor());
        let (result, _) = run_markers(class, Definition::new("Foo").autoconfigured(true));

        assert!(matches!(result.unwrap_err().root(), MasnaaError::Conflict(_)));
    }

    #[test]
    fn marker_on_instance_method_fails() {
        let class = ClassMetadata::new("Foo").method(MethodMetadata::public("create").constructor());
        let (result, _) = run_markers(class, Definition::new("Foo").autoconfigured(true));

        assert!(matches!(result.unwrap_err().root(), MasnaaError::InvalidPlacement(_)));
    }
}
