//! # Masnaa — factory directives for dependency injection containers
//!
//! Resolves factory and named-constructor directives attached to classes,
//! methods and tags into construction recipes a container can execute.
//!
//! ```rust
//! use masnaa::prelude::*;
//!
//! let reflector = StaticReflector::builder()
//!     .class(ClassMetadata::new("Clock").method(MethodMetadata::public_static("now").constructor()))
//!     .build();
//! let mut definitions = Definitions::new().with(Definition::new("Clock").autoconfigured(true));
//!
//! Compiler::standard(&reflector, Settings::default()).compile(&mut definitions)?;
//!
//! assert_eq!(
//!     definitions.get("Clock").and_then(Definition::factory),
//!     Some(&FactoryDescriptor::class_method("Clock", "now")),
//! );
//! # Ok::<(), MasnaaError>(())
//! ```

pub use masnaa_resolver::*;
pub use masnaa_support::*;
