use log::{debug, info, trace};
use path_clean::clean;
use rayon::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

use depslist_core::{
    AliasRules, NodeResolver, Resolve, extract_specifiers, package_name, read_tsconfig_aliases,
};

use crate::{context::TraversalContext, error::DepsError, options::Options, types::DepsList};

/// Computes the dependency closure of `entries` with a [`NodeResolver`]
/// configured from `options`.
pub fn deps_list(entries: &[PathBuf], options: &Options) -> Result<DepsList, DepsError> {
    let cwd = options.working_dir()?;
    let resolver = NodeResolver::new(options.resolver_options(&cwd));
    let result = deps_list_with(entries, options, &resolver)?;
    debug!("Resolver cache holds {} entries", resolver.cache_len());
    Ok(result)
}

/// Computes the dependency closure of `entries`, resolving specifiers with
/// `resolver`.
///
/// Every entry is part of the result whether or not it imports anything.
/// Specifiers that fail to resolve are dropped silently; failing to read or
/// stat an admitted file aborts the whole call.
pub fn deps_list_with<R: Resolve + ?Sized>(
    entries: &[PathBuf],
    options: &Options,
    resolver: &R,
) -> Result<DepsList, DepsError> {
    info!("Computing dependency list for {} entries", entries.len());
    let cwd = options.working_dir()?;

    let mut alias_specs = options.aliases.clone();
    if options.tsconfig {
        alias_specs.extend(read_tsconfig_aliases(&cwd));
    }
    let aliases = AliasRules::compile(&alias_specs, &cwd)?;
    debug!("Using {} alias rules", aliases.len());

    // canonical like resolved dependencies; a missing entry keeps its cleaned
    // path so the read error names it
    let entries: Vec<PathBuf> = entries
        .iter()
        .map(|e| {
            let entry = clean(cwd.join(e));
            entry.canonicalize().unwrap_or(entry)
        })
        .collect();
    let ctx = TraversalContext::new(
        &aliases,
        resolver,
        options.resolve_depth,
        options.track_modified_time,
        options.collect_packages,
    );

    match options.jobs {
        Some(jobs) => {
            debug!("Building a traversal pool with {} threads", jobs);
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| traverse(&ctx, &entries))?;
        }
        None => traverse(&ctx, &entries)?,
    }

    let result = ctx.into_result();
    info!("Dependency list complete: {} files", result.files.len());
    Ok(result)
}

/// Expands the closure one wavefront at a time: every file admitted while
/// processing a wavefront makes up the next one.
fn traverse<R: Resolve + ?Sized>(
    ctx: &TraversalContext<'_, R>,
    entries: &[PathBuf],
) -> Result<(), DepsError> {
    let mut wavefront = ctx.seed(entries);
    let mut level = 0;

    while !wavefront.is_empty() {
        debug!("Processing wavefront {} with {} files", level, wavefront.len());
        let admitted: Vec<Vec<PathBuf>> = wavefront
            .par_iter()
            .map(|file| process_file(ctx, file))
            .collect::<Result<_, _>>()?;
        wavefront = admitted.into_iter().flatten().collect();
        level += 1;
    }

    Ok(())
}

/// Reads one admitted file and admits its resolvable dependencies. Returns
/// the newly admitted files.
fn process_file<R: Resolve + ?Sized>(
    ctx: &TraversalContext<'_, R>,
    file: &Path,
) -> Result<Vec<PathBuf>, DepsError> {
    trace!("Thread {:?} processing: {}", thread::current().id(), file.display());

    let (source, modified) = rayon::join(
        || fs::read(file),
        || ctx.tracks_modified_time().then(|| modified_ms(file)),
    );
    let bytes = source.map_err(|source| DepsError::Read { path: file.to_path_buf(), source })?;
    // assets such as images are admitted like any other file
    let source = String::from_utf8_lossy(&bytes);
    if let Some(modified) = modified {
        let ms = modified.map_err(|source| DepsError::Stat { path: file.to_path_buf(), source })?;
        ctx.record_modified(ms);
    }

    let specifiers = extract_specifiers(&source);
    if specifiers.is_empty() {
        return Ok(Vec::new());
    }

    let owner = package_name(file);
    ctx.record_package(owner.as_deref());
    trace!("Found {} specifiers in {}", specifiers.len(), file.display());

    let from_dir = file.parent().unwrap_or(file);
    let mut admitted = Vec::new();
    for specifier in &specifiers {
        let request = ctx.aliases().rewrite(&specifier.request);
        let dep = match ctx.resolver().resolve(from_dir, &request) {
            Ok(dep) => dep,
            Err(e) => {
                trace!("Dropping '{}' from {}: {}", specifier.request, file.display(), e);
                continue;
            }
        };
        if ctx.admit(file, owner.as_deref(), &dep) {
            trace!("Admitted {}", dep.display());
            admitted.push(dep);
        }
    }

    Ok(admitted)
}

/// Modification time in milliseconds since the Unix epoch.
fn modified_ms(path: &Path) -> io::Result<f64> {
    Ok(epoch_ms(fs::metadata(path)?.modified()?))
}

/// Negative for times before the epoch.
fn epoch_ms(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64() * 1000.0,
        Err(e) => -(e.duration().as_secs_f64() * 1000.0),
    }
}
