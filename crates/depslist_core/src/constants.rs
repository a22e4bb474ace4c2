//! Resolution defaults shared by the resolver and the traversal options.
//!
//! ## Extensions
//!
//! - **TypeScript**: `.ts`, `.tsx`, `.mts` (ES module), `.cts` (CommonJS)
//! - **JavaScript**: `.js`, `.jsx`, `.mjs` (ES module), `.cjs` (CommonJS)
//! - **JSON**: `.json`, only reachable through `require`/`import` of data files

/// Extensions to try when resolving module imports (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] =
    &["js", "mjs", "cjs", "jsx", "ts", "tsx", "mts", "cts", "json"];

/// Base name of directory index files, completed with each resolve extension
pub const INDEX_FILE_STEM: &str = "index";

/// Directory name marking where an installed package's own files begin
pub const PACKAGE_BOUNDARY_DIR: &str = "node_modules";

/// Manifest file read from package directories
pub const PACKAGE_MANIFEST: &str = "package.json";

/// Export conditions, in priority order, when none are configured
pub const DEFAULT_CONDITION_NAMES: &[&str] = &["import", "require", "node"];

/// Manifest entry-point fields, in priority order, when none are configured
pub const DEFAULT_MAIN_FIELDS: &[&str] = &["module", "main"];

/// Scheme prefix of runtime built-in modules
pub const BUILTIN_SCHEME: &str = "node:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_extensions_have_no_leading_dot() {
        for ext in RESOLVE_EXTENSIONS {
            assert!(!ext.starts_with('.'), "extension '{}' should be bare", ext);
        }
    }

    #[test]
    fn test_resolve_extensions_cover_module_variants() {
        assert!(RESOLVE_EXTENSIONS.contains(&"mts"));
        assert!(RESOLVE_EXTENSIONS.contains(&"cts"));
        assert!(RESOLVE_EXTENSIONS.contains(&"mjs"));
        assert!(RESOLVE_EXTENSIONS.contains(&"cjs"));
    }

    #[test]
    fn test_default_conditions_prefer_import() {
        assert_eq!(DEFAULT_CONDITION_NAMES.first(), Some(&"import"));
        assert_eq!(DEFAULT_MAIN_FIELDS, &["module", "main"]);
    }
}
