//! The pass trait and what a pass reports.
//!
//! Passes read declarations, resolve directives and commit construction
//! recipes back onto the definitions. A [`Compiler`](crate::compiler::Compiler)
//! runs them in order.
//!
//! # Examples
//! ```rust,ignore
//! struct MarkEverythingSkipped;
//!
//! impl Pass for MarkEverythingSkipped {
//!     fn process(&self, registry: &mut dyn DefinitionRegistry) -> Result<PassReport> {
//!         let mut report = PassReport::default();
//!         for id in registry.ids() {
//!             report.skip(id, SkipReason::NotEligible);
//!         }
//!         Ok(report)
//!     }
//! }
//! ```

use std::fmt;

use masnaa_support::rendering::shorten_type_name;

use crate::descriptor::FactoryDescriptor;
use crate::error::Result;
use crate::registry::DefinitionRegistry;

/// A unit of work run over every declaration.
///
/// A pass either completes for the whole registry or fails without
/// leaving partial results behind.
pub trait Pass {
    /// Processes the registry.
    ///
    /// # Errors
    /// The first directive error encountered, wrapped with the id of the
    /// declaration that raised it.
    fn process(&self, registry: &mut dyn DefinitionRegistry) -> Result<PassReport>;

    /// Optional: human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Why a declaration was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The pass's eligibility predicate rejected it.
    NotEligible,
    /// It carries the ignore tag.
    Ignored,
    /// Its class metadata is unavailable.
    NoMetadata,
    /// No directive is attached to it.
    NoDirective,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotEligible => write!(f, "not eligible"),
            SkipReason::Ignored => write!(f, "ignored"),
            SkipReason::NoMetadata => write!(f, "no class metadata"),
            SkipReason::NoDirective => write!(f, "no directive"),
        }
    }
}

/// What one or more passes did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub committed: Vec<(String, FactoryDescriptor)>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl PassReport {
    pub fn commit(&mut self, id: impl Into<String>, descriptor: FactoryDescriptor) {
        self.committed.push((id.into(), descriptor));
    }

    pub fn skip(&mut self, id: impl Into<String>, reason: SkipReason) {
        self.skipped.push((id.into(), reason));
    }

    /// Appends another report's entries.
    pub fn merge(&mut self, other: PassReport) {
        self.committed.extend(other.committed);
        self.skipped.extend(other.skipped);
    }

    /// The descriptor committed for `id`, if any.
    pub fn committed_for(&self, id: &str) -> Option<&FactoryDescriptor> {
        self.committed
            .iter()
            .rev()
            .find(|(committed, _)| committed == id)
            .map(|(_, descriptor)| descriptor)
    }

    /// The reason `id` was skipped, if it was.
    pub fn skipped_for(&self, id: &str) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|(skipped, _)| skipped == id)
            .map(|(_, reason)| *reason)
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} committed, {} skipped",
            self.committed.len(),
            self.skipped.len()
        )?;
        for (id, descriptor) in &self.committed {
            write!(f, "\n  + {} <- {descriptor}", shorten_type_name(id))?;
        }
        Ok(())
    }
}
