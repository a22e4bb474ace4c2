use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use serde_json::Value;
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

use crate::{
    constants::{
        BUILTIN_SCHEME, DEFAULT_CONDITION_NAMES, DEFAULT_MAIN_FIELDS, INDEX_FILE_STEM,
        PACKAGE_BOUNDARY_DIR, PACKAGE_MANIFEST, RESOLVE_EXTENSIONS,
    },
    package::split_package_specifier,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("'{0}' is a built-in module")]
    Builtin(String),
    #[error("cannot find '{specifier}' from {}", from.display())]
    NotFound { specifier: String, from: PathBuf },
    #[error("'{specifier}' is not exported by package '{package}'")]
    NotExported { specifier: String, package: String },
}

/// Maps an import specifier, seen from a directory, to an absolute file.
pub trait Resolve: Sync {
    fn resolve(&self, from_dir: &Path, specifier: &str) -> Result<PathBuf, ResolveError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Extensions to append to extensionless paths, with or without a leading dot
    pub extensions: Vec<String>,
    /// `exports` conditions accepted besides `default`
    pub condition_names: Vec<String>,
    /// Manifest fields naming a package entry point, in priority order
    pub main_fields: Vec<String>,
    /// Directory names searched in every ancestor, or absolute directories
    /// searched as-is
    pub modules: Vec<PathBuf>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            extensions: RESOLVE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            condition_names: DEFAULT_CONDITION_NAMES.iter().map(|s| s.to_string()).collect(),
            main_fields: DEFAULT_MAIN_FIELDS.iter().map(|s| s.to_string()).collect(),
            modules: vec![PathBuf::from(PACKAGE_BOUNDARY_DIR)],
        }
    }
}

/// Node-style resolution: relative and absolute paths, package directories
/// found through `modules`, `exports` maps, main fields and index files.
///
/// Results (including failures) and parsed manifests are memoized, so one
/// resolver should live for one traversal of an unchanging tree.
pub struct NodeResolver {
    options: ResolverOptions,
    cache: DashMap<(PathBuf, String), Result<PathBuf, ResolveError>>,
    manifests: DashMap<PathBuf, Option<Arc<Value>>>,
}

impl NodeResolver {
    pub fn new(mut options: ResolverOptions) -> Self {
        for ext in &mut options.extensions {
            if let Some(bare) = ext.strip_prefix('.') {
                *ext = bare.to_string();
            }
        }
        NodeResolver { options, cache: DashMap::new(), manifests: DashMap::new() }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Number of memoized resolutions.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn resolve_uncached(&self, from_dir: &Path, specifier: &str) -> Result<PathBuf, ResolveError> {
        if specifier.starts_with(BUILTIN_SCHEME) {
            return Err(ResolveError::Builtin(specifier.to_string()));
        }
        let not_found = || ResolveError::NotFound {
            specifier: specifier.to_string(),
            from: from_dir.to_path_buf(),
        };

        if is_path_like(specifier) {
            trace!("Resolving as path: '{}'", specifier);
            let target = clean(from_dir.join(specifier));
            return self.resolve_file_or_directory(&target).ok_or_else(not_found);
        }

        let Some((name, subpath)) = split_package_specifier(specifier) else {
            return Err(not_found());
        };
        trace!("Resolving as package '{}' with subpath '{}'", name, subpath);

        for pkg_dir in self.package_dirs(from_dir, name) {
            if !pkg_dir.is_dir() {
                continue;
            }
            trace!("Checking package directory: {}", pkg_dir.display());
            if let Some(resolved) = self.resolve_in_package(&pkg_dir, name, &subpath, specifier)? {
                return Ok(resolved);
            }
        }

        Err(not_found())
    }

    /// Candidate directories for package `name`, nearest first.
    fn package_dirs(&self, from_dir: &Path, name: &str) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for module in &self.options.modules {
            if module.is_absolute() {
                dirs.push(module.join(name));
                continue;
            }
            for ancestor in from_dir.ancestors() {
                // no node_modules/node_modules
                if ancestor.file_name() == Some(module.as_os_str()) {
                    continue;
                }
                dirs.push(ancestor.join(module).join(name));
            }
        }
        dirs
    }

    fn resolve_in_package(
        &self,
        pkg_dir: &Path,
        name: &str,
        subpath: &str,
        specifier: &str,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let manifest = self.manifest(pkg_dir);

        if let Some(exports) = manifest.as_ref().and_then(|m| m.get("exports"))
            && !exports.is_null()
        {
            let Some(target) = exports_target(exports, subpath, &self.options.condition_names)
            else {
                debug!("Package '{}' does not export '{}'", name, subpath);
                return Err(ResolveError::NotExported {
                    specifier: specifier.to_string(),
                    package: name.to_string(),
                });
            };
            trace!("Export '{}' of '{}' maps to '{}'", subpath, name, target);
            let target = clean(pkg_dir.join(target));
            return Ok(target.is_file().then(|| canonical(target)));
        }

        if subpath == "." {
            if let Some(main) = manifest.as_deref().and_then(|m| self.main_entry(pkg_dir, m)) {
                return Ok(Some(main));
            }
            return Ok(self.resolve_index(pkg_dir));
        }

        Ok(self.resolve_file_or_directory(&clean(pkg_dir.join(subpath))))
    }

    fn main_entry(&self, dir: &Path, manifest: &Value) -> Option<PathBuf> {
        self.options.main_fields.iter().find_map(|field| {
            let main = manifest.get(field)?.as_str()?;
            trace!("Trying main field '{}': '{}'", field, main);
            let target = clean(dir.join(main));
            self.resolve_file(&target).or_else(|| self.resolve_index(&target))
        })
    }

    fn resolve_file_or_directory(&self, p: &Path) -> Option<PathBuf> {
        self.resolve_file(p).or_else(|| self.resolve_directory(p))
    }

    fn resolve_file(&self, p: &Path) -> Option<PathBuf> {
        if p.is_file() {
            return Some(canonical(p.to_path_buf()));
        }
        self.options.extensions.iter().find_map(|ext| {
            let candidate = with_appended_extension(p, ext);
            candidate.is_file().then(|| canonical(candidate))
        })
    }

    fn resolve_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }
        if let Some(main) = self.manifest(dir).as_deref().and_then(|m| self.main_entry(dir, m)) {
            return Some(main);
        }
        self.resolve_index(dir)
    }

    fn resolve_index(&self, dir: &Path) -> Option<PathBuf> {
        self.options.extensions.iter().find_map(|ext| {
            let candidate = dir.join(format!("{}.{}", INDEX_FILE_STEM, ext));
            candidate.is_file().then(|| canonical(candidate))
        })
    }

    fn manifest(&self, dir: &Path) -> Option<Arc<Value>> {
        if let Some(cached) = self.manifests.get(dir) {
            return cached.clone();
        }

        let path = dir.join(PACKAGE_MANIFEST);
        let manifest = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => Some(Arc::new(value)),
                Err(e) => {
                    debug!("Ignoring unparsable {}: {}", path.display(), e);
                    None
                }
            },
            Err(_) => None,
        };

        self.manifests.insert(dir.to_path_buf(), manifest.clone());
        manifest
    }
}

impl Resolve for NodeResolver {
    fn resolve(&self, from_dir: &Path, specifier: &str) -> Result<PathBuf, ResolveError> {
        let key = (from_dir.to_path_buf(), specifier.to_string());
        if let Some(v) = self.cache.get(&key) {
            trace!("Cache hit for resolve: '{}' from {}", specifier, from_dir.display());
            return v.clone();
        }

        let resolved = self.resolve_uncached(from_dir, specifier);
        match &resolved {
            Ok(path) => trace!("Resolved '{}' to {}", specifier, path.display()),
            Err(e) => trace!("Failed to resolve: {}", e),
        }

        self.cache.insert(key, resolved.clone());
        resolved
    }
}

fn is_path_like(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || Path::new(specifier).is_absolute()
}

fn canonical(p: PathBuf) -> PathBuf {
    p.canonicalize().unwrap_or(p)
}

fn with_appended_extension(p: &Path, ext: &str) -> PathBuf {
    let mut s = OsString::from(p.as_os_str());
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Picks the `exports` target for `subpath` (`.` or `./x`), or `None` when
/// the package does not export it.
fn exports_target(exports: &Value, subpath: &str, conditions: &[String]) -> Option<String> {
    let subpaths = match exports {
        Value::Object(map) if map.keys().any(|k| k.starts_with('.')) => map,
        _ if subpath == "." => return conditional_target(exports, conditions),
        _ => return None,
    };

    if let Some(target) = subpaths.get(subpath) {
        return conditional_target(target, conditions);
    }

    // "./features/*": the longest matching prefix wins
    let mut best: Option<(&str, &str, &Value)> = None;
    for (key, target) in subpaths {
        let Some((prefix, suffix)) = key.split_once('*') else { continue };
        if subpath.len() >= prefix.len() + suffix.len()
            && subpath.starts_with(prefix)
            && subpath.ends_with(suffix)
            && best.is_none_or(|(p, _, _)| prefix.len() > p.len())
        {
            best = Some((prefix, suffix, target));
        }
    }

    let (prefix, suffix, target) = best?;
    let matched = &subpath[prefix.len()..subpath.len() - suffix.len()];
    conditional_target(target, conditions).map(|t| t.replace('*', matched))
}

/// Conditions are tried in the object's key order, not in `conditions` order.
fn conditional_target(target: &Value, conditions: &[String]) -> Option<String> {
    match target {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|item| conditional_target(item, conditions)),
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| key.as_str() == "default" || conditions.iter().any(|c| c == *key))
            .find_map(|(_, value)| conditional_target(value, conditions)),
        _ => None,
    }
}
