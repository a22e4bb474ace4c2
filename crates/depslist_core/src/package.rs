use std::path::{Component, Path};

use crate::constants::PACKAGE_BOUNDARY_DIR;

/// Name of the installed package owning `path`, or `None` for project-local
/// files.
///
/// The innermost `node_modules/<name>/...` or `node_modules/@scope/<name>/...`
/// wins, so a package nested inside another package's `node_modules` is its
/// own owner. The path must point inside the package directory.
pub fn package_name(path: &Path) -> Option<String> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(p) => p.to_str(),
            _ => None,
        })
        .collect();

    let boundary = parts.iter().rposition(|p| *p == PACKAGE_BOUNDARY_DIR)?;
    let after = &parts[boundary + 1..];

    match after {
        [scope, name, _, ..] if scope.starts_with('@') && scope.len() > 1 => {
            Some(format!("{}/{}", scope, name))
        }
        [scope, ..] if scope.starts_with('@') => None,
        [name, _, ..] => Some((*name).to_string()),
        _ => None,
    }
}

/// Splits a bare specifier into its package name and a `./`-relative subpath.
///
/// `lodash` → (`lodash`, `.`), `@scope/pkg/a/b` → (`@scope/pkg`, `./a/b`).
/// Returns `None` for relative or absolute specifiers and incomplete scopes.
pub fn split_package_specifier(specifier: &str) -> Option<(&str, String)> {
    if specifier.is_empty() || specifier.starts_with('.') || specifier.starts_with('/') {
        return None;
    }

    let name_end = if specifier.starts_with('@') {
        let scope_end = specifier.find('/')?;
        specifier[scope_end + 1..].find('/').map_or(specifier.len(), |idx| scope_end + 1 + idx)
    } else {
        specifier.find('/').unwrap_or(specifier.len())
    };

    let name = &specifier[..name_end];
    if name.is_empty() || name.ends_with('/') {
        return None;
    }

    let rest = &specifier[name_end..];
    let subpath = if rest.is_empty() { ".".to_string() } else { format!(".{}", rest) };
    Some((name, subpath))
}
