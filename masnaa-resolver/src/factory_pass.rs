//! The factory registration pass.
//!
//! For every eligible declaration the pass discovers the factory
//! directives attached to its class, to the class's methods and to the
//! declaration's factory tags, then runs:
//!
//! ```text
//! Unprocessed ─▶ DirectivesDiscovered ─▶ Validated ─▶ Resolved ─▶ Committed
//!      │                 │                   │            │
//!      └──── Skipped ◀───┘                   └── Failed ◀─┘
//! ```
//!
//! Resolution of all declarations happens before anything is committed:
//! one failing declaration aborts the pass and leaves the registry as it
//! was.

use std::fmt;

use tracing::{debug, info, instrument, trace};

use crate::argument::{normalize, ResolvedArguments};
use crate::descriptor::FactoryDescriptor;
use crate::directive::FactoryDirective;
use crate::error::{DirectiveKind, MasnaaError, MultipleDirectivesError, Result};
use crate::guard::{check_no_competing_constructor, competing_constructor, tagged_constructor};
use crate::metadata::{ClassMetadata, MetadataReflector};
use crate::pass::{Pass, PassReport, SkipReason};
use crate::registry::{Definition, DefinitionRegistry};
use crate::settings::Settings;
use crate::target::{check_placement, DeclarationTarget, TargetResolver};

/// Decides whether a declaration is processed at all.
pub type EligibilityFn = Box<dyn Fn(&Definition, &Settings) -> bool + Send + Sync>;

/// Progress of one declaration through the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unprocessed,
    DirectivesDiscovered,
    Validated,
    Resolved,
    Committed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unprocessed => "unprocessed",
            Stage::DirectivesDiscovered => "directives discovered",
            Stage::Validated => "validated",
            Stage::Resolved => "resolved",
            Stage::Committed => "committed",
        };
        write!(f, "{name}")
    }
}

/// Tracks one declaration's stage; stages only move forward.
#[derive(Debug)]
struct Progress {
    id: String,
    stage: Stage,
}

impl Progress {
    fn new(id: &str) -> Self {
        Self { id: id.to_string(), stage: Stage::Unprocessed }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "{} cannot go from {} to {next}", self.id, self.stage);
        trace!(id = %self.id, from = %self.stage, to = %next, "Declaration advanced");
        self.stage = next;
    }
}

/// A directive together with where it was found.
#[derive(Debug)]
struct Site {
    source: String,
    directive: FactoryDirective,
    target: DeclarationTarget,
}

/// A resolved declaration waiting to be committed.
#[derive(Debug)]
struct Pending {
    progress: Progress,
    descriptor: FactoryDescriptor,
    arguments: ResolvedArguments,
}

/// Registers factories from directives.
///
/// # Examples
/// ```
/// use masnaa_resolver::prelude::*;
///
/// let reflector = StaticReflector::builder()
///     .class(ClassMetadata::new("Foo").method(
///         MethodMetadata::public_static("create").factory(FactoryDirective::empty()),
///     ))
///     .build();
/// let mut definitions = Definitions::new()
///     .with(Definition::new("foo").with_class("Foo").autoconfigured(true));
///
/// RegisterFactories::builder(&reflector).build().process(&mut definitions)?;
///
/// assert_eq!(
///     definitions.get("foo").and_then(Definition::factory),
///     Some(&FactoryDescriptor::class_method("Foo", "create")),
/// );
/// # Ok::<(), MasnaaError>(())
/// ```
pub struct RegisterFactories<'r> {
    reflector: &'r dyn MetadataReflector,
    settings: Settings,
    resolver: TargetResolver,
    eligible: EligibilityFn,
}

impl<'r> RegisterFactories<'r> {
    pub fn builder(reflector: &'r dyn MetadataReflector) -> RegisterFactoriesBuilder<'r> {
        RegisterFactoriesBuilder {
            reflector,
            settings: Settings::default(),
            eligible: None,
        }
    }

    /// Default eligibility: autoconfigured, or carrying the factory tag.
    pub fn default_eligibility(definition: &Definition, settings: &Settings) -> bool {
        definition.is_autoconfigured() || definition.has_tag(&settings.factory_tag)
    }

    /// Resolves one declaration, returning what to commit.
    fn process_definition(
        &self,
        definition: &Definition,
        class: &ClassMetadata,
    ) -> Result<Option<Pending>> {
        let mut progress = Progress::new(definition.id());

        let mut sites = self.discover(definition, class)?;
        progress.advance(Stage::DirectivesDiscovered);

        if sites.len() > 1 {
            return Err(MasnaaError::MultipleDirectives(MultipleDirectivesError {
                directive: DirectiveKind::Factory,
                class: class.name().to_string(),
                sources: sites.into_iter().map(|site| site.source).collect(),
            }));
        }
        let Some(site) = sites.pop() else {
            trace!(id = %definition.id(), "No factory directive");
            return Ok(None);
        };
        site.directive.validate()?;
        progress.advance(Stage::Validated);

        let descriptor = self.resolver.resolve(&site.directive, &site.target)?;
        let competing = competing_constructor(class)
            .or_else(|| tagged_constructor(definition, &self.settings.constructor_tag));
        check_no_competing_constructor(&site.target, competing)?;
        let arguments = normalize(site.directive.arguments());
        progress.advance(Stage::Resolved);

        debug!(
            id = %definition.id(),
            source = %site.source,
            descriptor = %descriptor,
            arguments = arguments.len(),
            "Resolved factory directive"
        );
        Ok(Some(Pending {
            progress,
            descriptor,
            arguments,
        }))
    }

    /// Collects every factory directive attached to the declaration.
    fn discover(&self, definition: &Definition, class: &ClassMetadata) -> Result<Vec<Site>> {
        let mut sites: Vec<Site> = class
            .factories()
            .iter()
            .map(|directive| Site {
                source: class.name().to_string(),
                directive: directive.clone(),
                target: class.target(),
            })
            .collect();

        for method in class.methods() {
            if method.factories().is_empty() {
                continue;
            }
            let target = method.target();
            if let DeclarationTarget::Method(method_target) = &target {
                check_placement(DirectiveKind::Factory, method_target)?;
            }
            sites.extend(method.factories().iter().map(|directive| Site {
                source: target.to_string(),
                directive: directive.clone(),
                target: target.clone(),
            }));
        }

        let tag = &self.settings.factory_tag;
        for (index, attributes) in definition.tag(tag).iter().enumerate() {
            if attributes.is_empty() {
                continue;
            }
            sites.push(Site {
                source: format!("tag {tag} #{index}"),
                directive: FactoryDirective::from_attributes(tag, attributes)?,
                target: class.target(),
            });
        }

        Ok(sites)
    }
}

impl Pass for RegisterFactories<'_> {
    #[instrument(skip(self, registry), name = "register_factories")]
    fn process(&self, registry: &mut dyn DefinitionRegistry) -> Result<PassReport> {
        let mut report = PassReport::default();
        let mut pending = Vec::new();

        for id in registry.ids() {
            let Some(definition) = registry.definition(&id) else {
                continue;
            };

            if !(self.eligible)(definition, &self.settings) {
                report.skip(id, SkipReason::NotEligible);
                continue;
            }
            if definition.has_tag(&self.settings.ignore_tag) {
                debug!(id = %id, "Declaration ignores directives, skipping");
                report.skip(id, SkipReason::Ignored);
                continue;
            }
            let Some(class) = self.reflector.class(definition.class()) else {
                debug!(id = %id, class = %definition.class(), "No class metadata, skipping");
                report.skip(id, SkipReason::NoMetadata);
                continue;
            };

            match self
                .process_definition(definition, class)
                .map_err(|err| err.in_definition(&id))?
            {
                Some(resolved) => pending.push(resolved),
                None => report.skip(id, SkipReason::NoDirective),
            }
        }

        for Pending { mut progress, descriptor, arguments } in pending {
            let Some(definition) = registry.definition_mut(&progress.id) else {
                continue;
            };
            definition.set_factory(descriptor.clone());
            definition.set_arguments(arguments);
            progress.advance(Stage::Committed);
            report.commit(progress.id, descriptor);
        }

        info!(
            committed = report.committed.len(),
            skipped = report.skipped.len(),
            "Factory directives registered"
        );
        Ok(report)
    }

    fn name(&self) -> &str {
        "register_factories"
    }
}

/// Builds a [`RegisterFactories`] pass.
pub struct RegisterFactoriesBuilder<'r> {
    reflector: &'r dyn MetadataReflector,
    settings: Settings,
    eligible: Option<EligibilityFn>,
}

impl<'r> RegisterFactoriesBuilder<'r> {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the eligibility predicate.
    pub fn eligible(
        mut self,
        predicate: impl Fn(&Definition, &Settings) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.eligible = Some(Box::new(predicate));
        self
    }

    pub fn build(self) -> RegisterFactories<'r> {
        RegisterFactories {
            reflector: self.reflector,
            resolver: TargetResolver::from_settings(&self.settings),
            settings: self.settings,
            eligible: self
                .eligible
                .unwrap_or_else(|| Box::new(RegisterFactories::default_eligibility) as EligibilityFn),
        }
    }
}
