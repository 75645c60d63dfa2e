//! # The Compiler — runs passes over a registry
//!
//! ```text
//! CompilerBuilder  ──build()──>  Compiler  ──compile(&mut registry)──>  PassReport
//!                                   │
//!                   RegisterConstructors ─▶ RegisterConstructorAttributes ─▶ RegisterFactories
//! ```
//!
//! Passes run in the order they were added. The first failing pass stops
//! the run; passes that already completed keep their results, the failing
//! pass leaves none.
//!
//! # Examples
//! ```rust
//! use masnaa_resolver::prelude::*;
//!
//! let reflector = StaticReflector::builder()
//!     .class(ClassMetadata::new("Mailer").method(
//!         MethodMetadata::public_static("create").factory(FactoryDirective::empty()),
//!     ))
//!     .build();
//!
//! let mut definitions = Definitions::new()
//!     .with(Definition::new("mailer").with_class("Mailer").autoconfigured(true));
//!
//! let report = Compiler::standard(&reflector, Settings::default())
//!     .compile(&mut definitions)
//!     .expect("Failed to compile definitions");
//!
//! assert_eq!(
//!     report.committed_for("mailer"),
//!     Some(&FactoryDescriptor::class_method("Mailer", "create")),
//! );
//! ```

use std::fmt;

use tracing::{debug, info, instrument};

use crate::constructor_pass::{RegisterConstructorAttributes, RegisterConstructors};
use crate::error::Result;
use crate::factory_pass::RegisterFactories;
use crate::metadata::MetadataReflector;
use crate::pass::{Pass, PassReport};
use crate::registry::DefinitionRegistry;
use crate::settings::Settings;

// ============================================================
// CompilerBuilder
// ============================================================

/// Builds a [`Compiler`] from an ordered list of passes.
///
/// # Examples
/// ```rust,ignore
/// let compiler = Compiler::builder()
///     .add_pass(RegisterConstructors::new(&reflector, settings.clone()))
///     .add_pass(RegisterFactories::builder(&reflector).settings(settings).build())
///     .build();
/// ```
pub struct CompilerBuilder<'r> {
    passes: Vec<Box<dyn Pass + 'r>>,
}

impl<'r> CompilerBuilder<'r> {
    fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Appends a pass.
    pub fn add_pass(mut self, pass: impl Pass + 'r) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Appends an already boxed pass.
    pub fn add_boxed_pass(mut self, pass: Box<dyn Pass + 'r>) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn build(self) -> Compiler<'r> {
        Compiler { passes: self.passes }
    }
}

// ═══════════════════════════════════════════
// Compiler
// ═══════════════════════════════════════════

/// An ordered pipeline of passes.
pub struct Compiler<'r> {
    passes: Vec<Box<dyn Pass + 'r>>,
}

impl<'r> Compiler<'r> {
    /// Create a new builder.
    pub fn builder() -> CompilerBuilder<'r> {
        CompilerBuilder::new()
    }

    /// The three directive passes, sharing `settings`.
    ///
    /// Named constructors run first so the factory pass sees them when it
    /// checks for competing recipes.
    pub fn standard(reflector: &'r dyn MetadataReflector, settings: Settings) -> Self {
        Self::builder()
            .add_pass(RegisterConstructors::new(reflector, settings.clone()))
            .add_pass(RegisterConstructorAttributes::new(reflector, settings.clone()))
            .add_pass(RegisterFactories::builder(reflector).settings(settings).build())
            .build()
    }

    /// Number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Runs every pass over `registry` and merges their reports.
    ///
    /// # Errors
    /// The error of the first failing pass.
    #[instrument(skip(self, registry), name = "compile")]
    pub fn compile(&self, registry: &mut dyn DefinitionRegistry) -> Result<PassReport> {
        info!(passes = self.passes.len(), "Compiling definitions");

        let mut report = PassReport::default();
        for pass in &self.passes {
            debug!(pass = %pass.name(), "Running pass");
            let outcome = pass.process(registry)?;
            debug!(pass = %pass.name(), committed = outcome.committed.len(), "Pass finished");
            report.merge(outcome);
        }

        info!(committed = report.committed.len(), "Definitions compiled ✓");
        Ok(report)
    }
}

impl fmt::Debug for Compiler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.passes.iter().map(|pass| pass.name()).collect();
        f.debug_struct("Compiler").field("passes", &names).finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Compiler, CompilerBuilder};
    pub use crate::argument::{Argument, ResolvedArgument, TypedValue, Value};
    pub use crate::constructor_pass::{RegisterConstructorAttributes, RegisterConstructors};
    pub use crate::descriptor::FactoryDescriptor;
    pub use crate::directive::FactoryDirective;
    pub use crate::error::{MasnaaError, Result};
    pub use crate::factory_pass::RegisterFactories;
    pub use crate::key::{ArgumentKey, Expression, Reference};
    pub use crate::metadata::{
        ClassMetadata, ClassRegistration, InventoryReflector, MetadataReflector, MethodMetadata,
        StaticReflector, Visibility,
    };
    pub use crate::pass::{Pass, PassReport, SkipReason};
    pub use crate::registry::{AttributeValue, Attributes, Definition, DefinitionRegistry, Definitions};
    pub use crate::settings::Settings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::prelude::*;

    struct FailingPass;

    impl Pass for FailingPass {
        fn process(&self, _registry: &mut dyn DefinitionRegistry) -> Result<PassReport> {
            Err(MasnaaError::InvalidTag(crate::error::InvalidTagError {
                tag: "broken".into(),
                reason: "always fails".into(),
            }))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct SkipAll;

    impl Pass for SkipAll {
        fn process(&self, registry: &mut dyn DefinitionRegistry) -> Result<PassReport> {
            let mut report = PassReport::default();
            for id in registry.ids() {
                report.skip(id, SkipReason::NotEligible);
            }
            Ok(report)
        }
    }

    fn reflector() -> StaticReflector {
        StaticReflector::builder()
            .class(
                ClassMetadata::new("Mailer")
                    .method(MethodMetadata::public_static("create").factory(FactoryDirective::empty())),
            )
            .class(ClassMetadata::new("Clock").method(MethodMetadata::public_static("now").constructor()))
            .build()
    }

    #[test]
    fn empty_compiler_is_a_no_op() {
        let compiler = Compiler::builder().build();
        let mut definitions = Definitions::new().with(Definition::new("a"));

        let report = compiler.compile(&mut definitions).unwrap();
        assert!(compiler.is_empty());
        assert_eq!(report, PassReport::default());
    }

    #[test]
    fn standard_runs_all_directive_passes() {
        let reflector = reflector();
        let compiler = Compiler::standard(&reflector, Settings::default());
        let mut definitions = Definitions::new()
            .with(Definition::new("mailer").with_class("Mailer").autoconfigured(true))
            .with(Definition::new("Clock").autoconfigured(true));

        let report = compiler.compile(&mut definitions).unwrap();

        assert_eq!(compiler.len(), 3);
        assert_eq!(
            definitions.get("mailer").unwrap().factory(),
            Some(&FactoryDescriptor::class_method("Mailer", "create"))
        );
        assert_eq!(
            report.committed_for("Clock"),
            Some(&FactoryDescriptor::class_method("Clock", "now"))
        );
    }

    #[test]
    fn constructor_tag_and_factory_directive_conflict() {
        let reflector = StaticReflector::builder()
            .class(
                ClassMetadata::new("Foo")
                    .factory(FactoryDirective::builder().service("svc").build().unwrap())
                    .method(MethodMetadata::public_static("create")),
            )
            .build();
        let mut attributes = Attributes::new();
        attributes.insert("method".into(), AttributeValue::from("create"));
        let mut definitions = Definitions::new().with(
            Definition::new("foo")
                .with_class("Foo")
                .autoconfigured(true)
                .with_tag("masnaa.constructor", attributes),
        );

        let err = Compiler::standard(&reflector, Settings::default())
            .compile(&mut definitions)
            .unwrap_err();

        assert_eq!(err.definition_id(), Some("foo"));
        match err.root() {
            MasnaaError::Conflict(err) => assert_eq!(
                err.kind,
                crate::error::ConflictKind::CompetingConstructor {
                    class: "Foo".into(),
                    constructor: "create".into(),
                }
            ),
            other => panic!("Expected Conflict, got: {other:?}"),
        }
    }

    #[test]
    fn class_level_constructor_is_applied() {
        let reflector = StaticReflector::builder()
            .class(
                ClassMetadata::new("Foo")
                    .constructor("create")
                    .method(MethodMetadata::public_static("create")),
            )
            .build();
        let mut definitions = Definitions::new().with(Definition::new("Foo").autoconfigured(true));

        let report = Compiler::standard(&reflector, Settings::default())
            .compile(&mut definitions)
            .unwrap();

        let expected = FactoryDescriptor::class_method("Foo", "create");
        assert_eq!(definitions.get("Foo").unwrap().factory(), Some(&expected));
        assert_eq!(report.committed, vec![("Foo".to_string(), expected)]);
    }

    #[test]
    fn failing_pass_stops_the_run() {
        let reflector = reflector();
        let compiler = Compiler::builder()
            .add_pass(FailingPass)
            .add_pass(RegisterFactories::builder(&reflector).build())
            .build();
        let mut definitions = Definitions::new()
            .with(Definition::new("mailer").with_class("Mailer").autoconfigured(true));

        let err = compiler.compile(&mut definitions).unwrap_err();

        assert!(matches!(err, MasnaaError::InvalidTag(_)));
        assert!(definitions.get("mailer").unwrap().factory().is_none());
    }

    #[test]
    fn reports_are_merged_in_order() {
        let compiler = Compiler::builder()
            .add_pass(SkipAll)
            .add_boxed_pass(Box::new(SkipAll))
            .build();
        let mut definitions = Definitions::new().with(Definition::new("a"));

        let report = compiler.compile(&mut definitions).unwrap();
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn debug_lists_pass_names() {
        let compiler = Compiler::builder().add_pass(FailingPass).build();
        assert_eq!(format!("{compiler:?}"), "Compiler { passes: [\"failing\"] }");
    }
}
