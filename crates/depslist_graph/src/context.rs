use log::trace;
use parking_lot::Mutex;
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    path::{Path, PathBuf},
};

use depslist_core::{AliasRules, Resolve, package_name};

use crate::types::DepsList;

/// State shared by every file task of one call.
///
/// The file set, depth map, package set and modification-time accumulator
/// sit behind a single lock. Admission (membership check, depth check,
/// insert) happens in one critical section.
pub(crate) struct TraversalContext<'a, R: Resolve + ?Sized> {
    aliases: &'a AliasRules,
    resolver: &'a R,
    resolve_depth: Option<usize>,
    track_modified_time: bool,
    state: Mutex<TraversalState>,
}

#[derive(Debug)]
struct TraversalState {
    files: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
    /// First-discovery depth, only kept when a depth bound is set
    depths: Option<HashMap<PathBuf, usize>>,
    packages: Option<BTreeSet<String>>,
    last_modified_ms: f64,
}

impl<'a, R: Resolve + ?Sized> TraversalContext<'a, R> {
    pub(crate) fn new(
        aliases: &'a AliasRules,
        resolver: &'a R,
        resolve_depth: Option<usize>,
        track_modified_time: bool,
        collect_packages: bool,
    ) -> Self {
        TraversalContext {
            aliases,
            resolver,
            resolve_depth,
            track_modified_time,
            state: Mutex::new(TraversalState {
                files: Vec::new(),
                seen: HashSet::new(),
                depths: resolve_depth.map(|_| HashMap::new()),
                packages: collect_packages.then(BTreeSet::new),
                last_modified_ms: f64::NEG_INFINITY,
            }),
        }
    }

    pub(crate) fn aliases(&self) -> &AliasRules {
        self.aliases
    }

    pub(crate) fn resolver(&self) -> &R {
        self.resolver
    }

    pub(crate) fn tracks_modified_time(&self) -> bool {
        self.track_modified_time
    }

    /// Adds the entries at depth 0 and returns them without duplicates.
    pub(crate) fn seed(&self, entries: &[PathBuf]) -> Vec<PathBuf> {
        let mut state = self.state.lock();
        let mut seeded = Vec::with_capacity(entries.len());

        for entry in entries {
            if !state.seen.insert(entry.clone()) {
                trace!("Ignoring duplicate entry: {}", entry.display());
                continue;
            }
            state.files.push(entry.clone());
            if let Some(depths) = state.depths.as_mut() {
                depths.insert(entry.clone(), 0);
            }
            seeded.push(entry.clone());
        }

        seeded
    }

    /// Admits `dep`, found while parsing `parent`, unless it is already known
    /// or the depth bound excludes it. Returns whether it was admitted.
    ///
    /// Staying inside the parent's package is free; crossing into another
    /// package costs one level. A known file keeps its first-discovered depth
    /// even when this path would be shorter.
    pub(crate) fn admit(&self, parent: &Path, parent_owner: Option<&str>, dep: &Path) -> bool {
        let dep_owner = package_name(dep);
        let mut state = self.state.lock();

        if state.seen.contains(dep) {
            return false;
        }

        let mut dep_depth = None;
        if let (Some(bound), Some(depths)) = (self.resolve_depth, state.depths.as_ref()) {
            let depth = depths.get(parent).copied().unwrap_or(0);
            let candidate = if dep_owner.as_deref() == parent_owner {
                depth
            } else {
                (depth + 1).min(depths.get(dep).copied().unwrap_or(bound))
            };
            if candidate >= bound {
                trace!("Excluding {} at depth {}", dep.display(), candidate);
                return false;
            }
            dep_depth = Some(candidate);
        }

        state.seen.insert(dep.to_path_buf());
        state.files.push(dep.to_path_buf());
        if let (Some(depths), Some(depth)) = (state.depths.as_mut(), dep_depth) {
            depths.insert(dep.to_path_buf(), depth);
        }
        true
    }

    pub(crate) fn record_modified(&self, modified_ms: f64) {
        let mut state = self.state.lock();
        if modified_ms > state.last_modified_ms {
            state.last_modified_ms = modified_ms;
        }
    }

    pub(crate) fn record_package(&self, owner: Option<&str>) {
        let mut state = self.state.lock();
        if let Some(packages) = state.packages.as_mut()
            && let Some(owner) = owner
            && !packages.contains(owner)
        {
            packages.insert(owner.to_string());
        }
    }

    pub(crate) fn into_result(self) -> DepsList {
        let state = self.state.into_inner();
        DepsList {
            files: state.files,
            last_modified_ms: self.track_modified_time.then_some(state.last_modified_ms),
            packages: state.packages.map(|p| p.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depslist_core::ResolveError;

    struct NoResolver;

    impl Resolve for NoResolver {
        fn resolve(&self, from_dir: &Path, specifier: &str) -> Result<PathBuf, ResolveError> {
            Err(ResolveError::NotFound { specifier: specifier.to_string(), from: from_dir.into() })
        }
    }

    fn context(aliases: &AliasRules, resolve_depth: Option<usize>) -> TraversalContext<'_, NoResolver> {
        TraversalContext::new(aliases, &NoResolver, resolve_depth, true, true)
    }

    #[test]
    fn test_seed_deduplicates_entries() {
        let aliases = AliasRules::default();
        let ctx = context(&aliases, Some(2));
        let seeded = ctx.seed(&[PathBuf::from("/p/a.js"), PathBuf::from("/p/b.js"), PathBuf::from("/p/a.js")]);
        assert_eq!(seeded, vec![PathBuf::from("/p/a.js"), PathBuf::from("/p/b.js")]);
        assert_eq!(ctx.into_result().files.len(), 2);
    }

    #[test]
    fn test_same_package_is_free() {
        let aliases = AliasRules::default();
        let ctx = context(&aliases, Some(1));
        ctx.seed(&[PathBuf::from("/p/src/a.js")]);
        assert!(ctx.admit(Path::new("/p/src/a.js"), None, Path::new("/p/src/b.js")));
        assert!(ctx.admit(Path::new("/p/src/b.js"), None, Path::new("/p/src/c.js")));
    }

    #[test]
    fn test_crossing_package_costs_one_level() {
        let aliases = AliasRules::default();
        let ctx = context(&aliases, Some(2));
        let a = Path::new("/p/src/a.js");
        let pad = Path::new("/p/node_modules/left-pad/index.js");
        let num = Path::new("/p/node_modules/is-number/index.js");
        ctx.seed(&[a.to_path_buf()]);

        assert!(ctx.admit(a, None, pad));
        // depth 2 reaches the bound
        assert!(!ctx.admit(pad, Some("left-pad"), num));
        // within left-pad stays at depth 1
        assert!(ctx.admit(pad, Some("left-pad"), Path::new("/p/node_modules/left-pad/lib.js")));

        let result = ctx.into_result();
        assert_eq!(result.files.len(), 3);
        assert!(!result.files.contains(&num.to_path_buf()));
    }

    #[test]
    fn test_known_file_not_readmitted() {
        let aliases = AliasRules::default();
        let ctx = context(&aliases, None);
        ctx.seed(&[PathBuf::from("/p/a.js")]);
        assert!(ctx.admit(Path::new("/p/a.js"), None, Path::new("/p/b.js")));
        assert!(!ctx.admit(Path::new("/p/a.js"), None, Path::new("/p/b.js")));
        assert!(!ctx.admit(Path::new("/p/b.js"), None, Path::new("/p/a.js")));
    }

    #[test]
    fn test_zero_bound_admits_nothing() {
        let aliases = AliasRules::default();
        let ctx = context(&aliases, Some(0));
        ctx.seed(&[PathBuf::from("/p/a.js")]);
        assert!(!ctx.admit(Path::new("/p/a.js"), None, Path::new("/p/b.js")));
    }

    #[test]
    fn test_modified_time_is_max() {
        let aliases = AliasRules::default();
        let ctx = context(&aliases, None);
        ctx.record_modified(2000.0);
        ctx.record_modified(1000.0);
        assert_eq!(ctx.into_result().last_modified_ms, Some(2000.0));
    }

    #[test]
    fn test_modified_time_starts_at_negative_infinity() {
        let aliases = AliasRules::default();
        assert_eq!(context(&aliases, None).into_result().last_modified_ms, Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_packages_sorted_and_distinct() {
        let aliases = AliasRules::default();
        let ctx = context(&aliases, None);
        ctx.record_package(Some("lodash"));
        ctx.record_package(None);
        ctx.record_package(Some("@babel/core"));
        ctx.record_package(Some("lodash"));
        assert_eq!(
            ctx.into_result().packages,
            Some(vec!["@babel/core".to_string(), "lodash".to_string()])
        );
    }

    #[test]
    fn test_optional_outputs_absent_when_disabled() {
        let aliases = AliasRules::default();
        let ctx = TraversalContext::new(&aliases, &NoResolver, None, false, false);
        ctx.record_package(Some("lodash"));
        let result = ctx.into_result();
        assert_eq!(result.last_modified_ms, None);
        assert_eq!(result.packages, None);
    }
}
