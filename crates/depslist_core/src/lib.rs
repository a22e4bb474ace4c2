//! Leaf capabilities for computing JavaScript/TypeScript dependency closures.
//!
//! This crate provides:
//! - Lexical extraction of import/export/require specifiers
//! - Ordered alias rewriting of specifiers
//! - Node-style module resolution behind the [`Resolve`] trait
//! - Detection of the installed package owning a file
//! - Alias rules loaded from `tsconfig.json` path mappings

mod aliases;
mod config;
mod constants;
mod extractor;
mod package;
mod resolver;
mod types;

// Re-export public API
pub use aliases::{AliasError, AliasRules, AliasSpec};
pub use config::read_tsconfig_aliases;
pub use constants::{
    DEFAULT_CONDITION_NAMES, DEFAULT_MAIN_FIELDS, PACKAGE_BOUNDARY_DIR, RESOLVE_EXTENSIONS,
};
pub use extractor::{extract_specifiers, specifiers_for};
pub use package::{package_name, split_package_specifier};
pub use resolver::{NodeResolver, Resolve, ResolveError, ResolverOptions};
pub use types::{SpecKind, Specifier};
