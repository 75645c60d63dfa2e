//! Class metadata — what the passes know about implementation types.
//!
//! A [`MetadataReflector`] answers "what does class `X` look like": its
//! methods, their static-ness and visibility, and the directives attached
//! to the class and its methods. A class that cannot be described is
//! simply unavailable; passes skip such declarations.
//!
//! Two reflectors ship with the crate:
//! - [`StaticReflector`]: built explicitly from [`ClassMetadata`] values;
//! - [`InventoryReflector`]: collects [`ClassRegistration`]s submitted
//!   with `inventory::submit!` anywhere in the binary.
//!
//! # Examples
//! ```
//! use masnaa_resolver::directive::FactoryDirective;
//! use masnaa_resolver::metadata::{ClassMetadata, MetadataReflector, MethodMetadata, StaticReflector};
//!
//! let reflector = StaticReflector::builder()
//!     .class(ClassMetadata::new("Base").method(
//!         MethodMetadata::public_static("create").factory(FactoryDirective::empty()),
//!     ))
//!     .class(ClassMetadata::new("Mailer").extends("Base"))
//!     .build();
//!
//! let mailer = reflector.class("Mailer").expect("Mailer is available");
//! let create = mailer.find_method("create").expect("inherited");
//! assert_eq!(create.declaring_class(), "Base");
//! ```

use std::collections::{HashMap, HashSet};

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::directive::FactoryDirective;
use crate::target::{DeclarationTarget, MethodTarget};

/// Method visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// Describes one method of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodMetadata {
    name: String,
    declaring_class: String,
    is_static: bool,
    visibility: Visibility,
    factories: Vec<FactoryDirective>,
    constructor_marker: bool,
}

impl MethodMetadata {
    fn new(name: impl Into<String>, is_static: bool) -> Self {
        Self {
            name: name.into(),
            declaring_class: String::new(),
            is_static,
            visibility: Visibility::Public,
            factories: Vec::new(),
            constructor_marker: false,
        }
    }

    /// A public static method.
    pub fn public_static(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// A public instance method.
    pub fn public(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attaches a factory directive to the method.
    pub fn factory(mut self, directive: FactoryDirective) -> Self {
        self.factories.push(directive);
        self
    }

    /// Marks the method as the class's named constructor.
    pub fn constructor(mut self) -> Self {
        self.constructor_marker = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class that declares the method (a parent for inherited methods).
    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn factories(&self) -> &[FactoryDirective] {
        &self.factories
    }

    pub fn is_constructor(&self) -> bool {
        self.constructor_marker
    }

    /// The method as a directive placement target.
    pub fn target(&self) -> DeclarationTarget {
        DeclarationTarget::Method(MethodTarget {
            class: self.declaring_class.clone(),
            name: self.name.clone(),
            is_static: self.is_static,
            is_public: self.is_public(),
        })
    }
}

/// Describes a class: its directives and its methods.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    name: String,
    parent: Option<String>,
    factories: Vec<FactoryDirective>,
    constructor: Option<String>,
    methods: Vec<MethodMetadata>,
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            factories: Vec::new(),
            constructor: None,
            methods: Vec::new(),
        }
    }

    /// Sets the parent class; its methods are inherited.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Attaches a class-level factory directive.
    pub fn factory(mut self, directive: FactoryDirective) -> Self {
        self.factories.push(directive);
        self
    }

    /// Declares a class-level named constructor.
    pub fn constructor(mut self, method: impl Into<String>) -> Self {
        self.constructor = Some(method.into());
        self
    }

    /// Adds a method declared by this class.
    pub fn method(mut self, mut method: MethodMetadata) -> Self {
        method.declaring_class = self.name.clone();
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn factories(&self) -> &[FactoryDirective] {
        &self.factories
    }

    /// The class-level named constructor, if declared.
    pub fn named_constructor(&self) -> Option<&str> {
        self.constructor.as_deref()
    }

    /// Declared and inherited methods.
    pub fn methods(&self) -> &[MethodMetadata] {
        &self.methods
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodMetadata> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// The class as a directive placement target.
    pub fn target(&self) -> DeclarationTarget {
        DeclarationTarget::Class(self.name.clone())
    }
}

/// Looks up class metadata by name.
pub trait MetadataReflector {
    /// Returns `None` when the class is unknown or cannot be loaded.
    fn class(&self, name: &str) -> Option<&ClassMetadata>;
}

/// Reflector over an explicit set of classes.
///
/// Methods are flattened along the parent chain when the reflector is
/// built: inherited methods keep their declaring class and a method
/// declared by a subclass hides the inherited one. A class whose chain
/// reaches an unknown parent, or loops, is unavailable.
#[derive(Debug, Default)]
pub struct StaticReflector {
    classes: HashMap<String, ClassMetadata>,
}

impl StaticReflector {
    pub fn builder() -> StaticReflectorBuilder {
        StaticReflectorBuilder::default()
    }

    /// Returns the number of available classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl MetadataReflector for StaticReflector {
    fn class(&self, name: &str) -> Option<&ClassMetadata> {
        self.classes.get(name)
    }
}

/// Builds a [`StaticReflector`].
#[derive(Debug, Default)]
pub struct StaticReflectorBuilder {
    declared: HashMap<String, ClassMetadata>,
}

impl StaticReflectorBuilder {
    /// Declares a class, replacing an earlier declaration of the same name.
    pub fn class(mut self, class: ClassMetadata) -> Self {
        self.declared.insert(class.name.clone(), class);
        self
    }

    /// Flattens inheritance and returns the reflector.
    pub fn build(self) -> StaticReflector {
        let mut resolved: HashMap<String, Vec<MethodMetadata>> = HashMap::new();
        let names: Vec<String> = self.declared.keys().cloned().collect();

        for name in &names {
            let mut visiting = HashSet::new();
            if self.flatten(name, &mut visiting, &mut resolved).is_none() {
                warn!(class = %name, "Class chain cannot be resolved, marking unavailable");
            }
        }

        let classes: HashMap<String, ClassMetadata> = self
            .declared
            .into_iter()
            .filter_map(|(name, mut class)| {
                let methods = resolved.remove(&name)?;
                class.methods = methods;
                Some((name, class))
            })
            .collect();

        debug!(classes = classes.len(), "Built static reflector");
        StaticReflector { classes }
    }

    fn flatten(
        &self,
        name: &str,
        visiting: &mut HashSet<String>,
        resolved: &mut HashMap<String, Vec<MethodMetadata>>,
    ) -> Option<Vec<MethodMetadata>> {
        if let Some(methods) = resolved.get(name) {
            return Some(methods.clone());
        }
        if !visiting.insert(name.to_string()) {
            return None;
        }

        let class = self.declared.get(name)?;
        let mut methods = class.methods.clone();

        if let Some(parent) = &class.parent {
            let inherited = self.flatten(parent, visiting, resolved)?;
            methods.extend(
                inherited
                    .into_iter()
                    .filter(|m| class.methods.iter().all(|own| own.name != m.name)),
            );
        }

        resolved.insert(name.to_string(), methods.clone());
        Some(methods)
    }
}

/// A class description submitted through `inventory`.
///
/// ```rust,ignore
/// fn describe_mailer() -> ClassMetadata {
///     ClassMetadata::new("Mailer").factory(FactoryDirective::builder().method("create").build().unwrap())
/// }
///
/// masnaa_resolver::inventory::submit! {
///     ClassRegistration::new(describe_mailer)
/// }
/// ```
pub struct ClassRegistration {
    describe: fn() -> ClassMetadata,
}

impl ClassRegistration {
    pub const fn new(describe: fn() -> ClassMetadata) -> Self {
        Self { describe }
    }
}

inventory::collect!(ClassRegistration);

/// Reflector over every submitted [`ClassRegistration`].
///
/// The registrations are described and indexed on the first lookup, once
/// per reflector instance.
#[derive(Debug, Default)]
pub struct InventoryReflector {
    index: OnceCell<StaticReflector>,
}

impl InventoryReflector {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self) -> &StaticReflector {
        self.index.get_or_init(|| {
            inventory::iter::<ClassRegistration>
                .into_iter()
                .fold(StaticReflector::builder(), |builder, registration| {
                    builder.class((registration.describe)())
                })
                .build()
        })
    }
}

impl MetadataReflector for InventoryReflector {
    fn class(&self, name: &str) -> Option<&ClassMetadata> {
        self.index().class(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe_registered() -> ClassMetadata {
        ClassMetadata::new("tests::Registered").method(MethodMetadata::public_static("create"))
    }

    inventory::submit! {
        ClassRegistration::new(describe_registered)
    }

    #[test]
    fn method_records_declaring_class() {
        let class = ClassMetadata::new("Foo").method(MethodMetadata::public_static("create"));
        assert_eq!(class.find_method("create").unwrap().declaring_class(), "Foo");
    }

    #[test]
    fn inherited_methods_keep_declaring_class() {
        let reflector = StaticReflector::builder()
            .class(ClassMetadata::new("Base").method(MethodMetadata::public_static("create")))
            .class(ClassMetadata::new("Child").extends("Base"))
            .build();

        let child = reflector.class("Child").unwrap();
        assert_eq!(child.find_method("create").unwrap().declaring_class(), "Base");
    }

    #[test]
    fn override_hides_inherited_method() {
        let reflector = StaticReflector::builder()
            .class(ClassMetadata::new("Base").method(MethodMetadata::public_static("create")))
            .class(
                ClassMetadata::new("Child")
                    .extends("Base")
                    .method(MethodMetadata::public_static("create").factory(FactoryDirective::empty())),
            )
            .build();

        let child = reflector.class("Child").unwrap();
        let creates: Vec<_> = child.methods().iter().filter(|m| m.name() == "create").collect();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].declaring_class(), "Child");
        assert_eq!(creates[0].factories().len(), 1);
    }

    #[test]
    fn unknown_parent_makes_class_unavailable() {
        let reflector = StaticReflector::builder()
            .class(ClassMetadata::new("Orphan").extends("Missing"))
            .class(ClassMetadata::new("Fine"))
            .build();

        assert!(reflector.class("Orphan").is_none());
        assert!(reflector.class("Fine").is_some());
        assert_eq!(reflector.len(), 1);
    }

    #[test]
    fn cyclic_chain_is_unavailable() {
        let reflector = StaticReflector::builder()
            .class(ClassMetadata::new("A").extends("B"))
            .class(ClassMetadata::new("B").extends("A"))
            .build();

        assert!(reflector.is_empty());
    }

    #[test]
    fn method_target_reflects_flags() {
        let method = MethodMetadata::public("build").with_visibility(Visibility::Protected);
        let class = ClassMetadata::new("Foo").method(method);

        match class.find_method("build").unwrap().target() {
            DeclarationTarget::Method(target) => {
                assert_eq!(target.class, "Foo");
                assert!(!target.is_static);
                assert!(!target.is_public);
            }
            other => panic!("Expected method target, got: {other:?}"),
        }
    }

    #[test]
    fn inventory_reflector_finds_submitted_class() {
        let reflector = InventoryReflector::new();
        let class = reflector.class("tests::Registered").unwrap();
        assert!(class.find_method("create").is_some());
        assert!(reflector.class("tests::Unregistered").is_none());
    }
}
