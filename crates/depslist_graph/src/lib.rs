//! Dependency closure computation for JavaScript/TypeScript entry files.
//!
//! Starting from a set of entry files, the traversal reads each file,
//! extracts its import specifiers, rewrites them through alias rules,
//! resolves them and admits every file not seen before. Files are processed
//! a wavefront at a time on the rayon pool. An optional depth bound limits how
//! many package boundaries the closure may cross.
//!
//! # Examples
//!
//! ```no_run
//! use depslist_graph::{Options, deps_list};
//! use std::io::{BufWriter, Write};
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! let options = Options {
//!     cwd: Some(PathBuf::from("/path/to/project")),
//!     resolve_depth: Some(1),
//!     collect_packages: true,
//!     ..Options::default()
//! };
//!
//! let result = deps_list(&[PathBuf::from("src/index.ts")], &options)?;
//!
//! // Use buffered output for better performance
//! let mut stdout = BufWriter::new(std::io::stdout());
//! depslist_graph::print_deps_list(&mut stdout, &result, &options.working_dir()?)?;
//! stdout.flush()?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod options;
mod reporter;
mod traversal;
mod types;

// Re-export public API
pub use error::DepsError;
pub use options::Options;
pub use reporter::{print_deps_list, print_specifiers};
pub use traversal::{deps_list, deps_list_with};
pub use types::DepsList;
