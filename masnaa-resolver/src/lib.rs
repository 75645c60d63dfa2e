//! Core factory directive resolution for Masnaa.
//!
//! Reads factory and named-constructor directives off class metadata and
//! tags, validates them, and writes construction recipes back onto the
//! registered definitions.

pub mod argument;
pub mod compiler;
pub mod constructor_pass;
pub mod descriptor;
pub mod directive;
pub mod error;
pub mod factory_pass;
pub mod guard;
pub mod key;
pub mod metadata;
pub mod pass;
pub mod registry;
pub mod settings;
pub mod target;

pub use compiler::prelude;
pub use error::{MasnaaError, Result};
pub use inventory;
pub use key::ArgumentKey;
