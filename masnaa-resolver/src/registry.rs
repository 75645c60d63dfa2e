//! Definition registry holding the declarations passes read and update.
//!
//! The registry maps declaration ids to [`Definition`] records. Passes
//! read a definition's class, tags and autoconfiguration flag, and write
//! back the resolved factory descriptor and normalized arguments.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::argument::{Argument, ResolvedArguments};
use crate::descriptor::FactoryDescriptor;

/// A value in a tag attribute map.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Arguments(Vec<Argument>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// One tag's attribute map.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A registered declaration.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    id: String,
    class: Option<String>,
    autoconfigured: bool,
    tags: BTreeMap<String, Vec<Attributes>>,
    factory: Option<FactoryDescriptor>,
    arguments: ResolvedArguments,
}

impl Definition {
    /// Creates a definition whose class is its id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the implementation class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Marks the definition for automatic directive processing.
    pub fn autoconfigured(mut self, autoconfigured: bool) -> Self {
        self.autoconfigured = autoconfigured;
        self
    }

    /// Adds a tag with an attribute map.
    pub fn with_tag(mut self, name: impl Into<String>, attributes: Attributes) -> Self {
        self.add_tag(name, attributes);
        self
    }

    /// Adds a tag with no attributes.
    pub fn with_marker(self, name: impl Into<String>) -> Self {
        self.with_tag(name, Attributes::new())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The implementation class, falling back to the id.
    pub fn class(&self) -> &str {
        self.class.as_deref().unwrap_or(&self.id)
    }

    pub fn is_autoconfigured(&self) -> bool {
        self.autoconfigured
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Every attribute map attached under `name`, in insertion order.
    pub fn tag(&self, name: &str) -> &[Attributes] {
        self.tags.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_tag(&mut self, name: impl Into<String>, attributes: Attributes) {
        let name = name.into();
        trace!(id = %self.id, tag = %name, "Tagged definition");
        self.tags.entry(name).or_default().push(attributes);
    }

    pub fn factory(&self) -> Option<&FactoryDescriptor> {
        self.factory.as_ref()
    }

    pub fn set_factory(&mut self, factory: FactoryDescriptor) {
        debug!(id = %self.id, factory = %factory, "Set factory");
        self.factory = Some(factory);
    }

    pub fn arguments(&self) -> &ResolvedArguments {
        &self.arguments
    }

    pub fn set_arguments(&mut self, arguments: ResolvedArguments) {
        self.arguments = arguments;
    }
}

/// Read/write access to the declarations being compiled.
pub trait DefinitionRegistry {
    /// All declaration ids, in a stable order.
    fn ids(&self) -> Vec<String>;

    fn definition(&self, id: &str) -> Option<&Definition>;

    fn definition_mut(&mut self, id: &str) -> Option<&mut Definition>;
}

/// In-memory registry ordered by id.
#[derive(Debug, Default)]
pub struct Definitions {
    definitions: BTreeMap<String, Definition>,
}

impl Definitions {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition, replacing any previous one with the same id.
    pub fn insert(&mut self, definition: Definition) {
        debug!(id = %definition.id(), class = %definition.class(), "Registered definition");
        self.definitions.insert(definition.id().to_string(), definition);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, definition: Definition) -> Self {
        self.insert(definition);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Definition> {
        self.definitions.get(id)
    }

    /// Returns the number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if no definitions are registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl DefinitionRegistry for Definitions {
    fn ids(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }

    fn definition(&self, id: &str) -> Option<&Definition> {
        self.definitions.get(id)
    }

    fn definition_mut(&mut self, id: &str) -> Option<&mut Definition> {
        self.definitions.get_mut(id)
    }
}
