use clap::{ArgAction, Args};
use log::debug;
use path_clean::clean;
use std::{
    env,
    path::{Component, Path, PathBuf},
};

use depslist_core::{
    AliasSpec, DEFAULT_CONDITION_NAMES, DEFAULT_MAIN_FIELDS, PACKAGE_BOUNDARY_DIR,
    RESOLVE_EXTENSIONS, ResolverOptions,
};

use crate::error::DepsError;

#[derive(Debug, Clone, PartialEq, Args)]
pub struct Options {
    /// Base directory for relative entries, aliases and module directories
    /// (defaults to the current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Rewrite specifiers starting with PATTERN to PATH; first match wins
    #[arg(long = "alias", value_name = "PATTERN=PATH")]
    pub aliases: Vec<AliasSpec>,

    /// Extensions tried for extensionless paths
    #[arg(long = "extension", value_delimiter = ',', default_values_t = strings(RESOLVE_EXTENSIONS))]
    pub extensions: Vec<String>,

    /// Cross-package depth bound; only files discovered below it are kept
    /// (unbounded by default)
    #[arg(long)]
    pub resolve_depth: Option<usize>,

    /// Skip computing the latest modification time
    #[arg(long = "no-mtime", action = ArgAction::SetFalse)]
    pub track_modified_time: bool,

    /// Report the installed packages whose files were parsed
    #[arg(long = "packages")]
    pub collect_packages: bool,

    /// `exports` conditions accepted by the resolver
    #[arg(long = "condition", value_delimiter = ',', default_values_t = strings(DEFAULT_CONDITION_NAMES))]
    pub condition_names: Vec<String>,

    /// Manifest fields naming a package entry point, in priority order
    #[arg(long = "main-field", value_delimiter = ',', default_values_t = strings(DEFAULT_MAIN_FIELDS))]
    pub main_fields: Vec<String>,

    /// Module directories; bare names are searched in every ancestor
    /// (defaults to node_modules and <cwd>/node_modules)
    #[arg(long = "modules", value_delimiter = ',')]
    pub modules: Vec<PathBuf>,

    /// Also load alias rules from tsconfig.json path mappings under cwd
    #[arg(long)]
    pub tsconfig: bool,

    /// Worker threads for the traversal (defaults to the global pool)
    #[arg(long)]
    pub jobs: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            cwd: None,
            aliases: Vec::new(),
            extensions: strings(RESOLVE_EXTENSIONS),
            resolve_depth: None,
            track_modified_time: true,
            collect_packages: false,
            condition_names: strings(DEFAULT_CONDITION_NAMES),
            main_fields: strings(DEFAULT_MAIN_FIELDS),
            modules: Vec::new(),
            tsconfig: false,
            jobs: None,
        }
    }
}

impl Options {
    /// The absolute base directory for this call.
    pub fn working_dir(&self) -> Result<PathBuf, DepsError> {
        let current = env::current_dir().map_err(DepsError::WorkingDirectory)?;
        let cwd = match &self.cwd {
            Some(dir) => clean(current.join(dir)),
            None => current,
        };
        debug!("Using working directory: {}", cwd.display());
        Ok(cwd)
    }

    /// Resolver configuration, with module directories completed against `cwd`.
    pub fn resolver_options(&self, cwd: &Path) -> ResolverOptions {
        let modules = if self.modules.is_empty() {
            vec![PathBuf::from(PACKAGE_BOUNDARY_DIR), cwd.join(PACKAGE_BOUNDARY_DIR)]
        } else {
            self.modules
                .iter()
                .map(|m| if is_bare_name(m) { m.clone() } else { clean(cwd.join(m)) })
                .collect()
        };

        ResolverOptions {
            extensions: self.extensions.clone(),
            condition_names: self.condition_names.clone(),
            main_fields: self.main_fields.clone(),
            modules,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn is_bare_name(p: &Path) -> bool {
    let mut components = p.components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}
