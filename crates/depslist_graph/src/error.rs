use std::{io, path::PathBuf};
use thiserror::Error;

use depslist_core::AliasError;

/// Failures that abort a whole traversal. Unresolvable specifiers are not
/// among them: those only drop the edge.
#[derive(Debug, Error)]
pub enum DepsError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to stat {}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid alias configuration")]
    Alias(#[from] AliasError),
    #[error("failed to determine the working directory")]
    WorkingDirectory(#[source] io::Error),
    #[error("failed to build the traversal thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
