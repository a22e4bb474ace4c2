use ignore::WalkBuilder;
use log::{debug, trace};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{fs, path::Path};

use crate::{aliases::AliasSpec, constants::PACKAGE_BOUNDARY_DIR};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    base_url: Option<String>,
    #[serde(default)]
    paths: Map<String, Value>,
}

/// Collects `compilerOptions.paths` of every `tsconfig.json` under `root` as
/// alias rules.
///
/// `"@components/*": ["src/components/*"]` becomes pattern `@components`
/// with replacement `<tsconfig dir>/<baseUrl>/src/components`. Only the
/// first target of each entry is used, and catch-all keys are skipped.
pub fn read_tsconfig_aliases(root: &Path) -> Vec<AliasSpec> {
    debug!("Reading tsconfig paths from root: {:?}", root);

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .filter_entry(|e| e.file_name() != PACKAGE_BOUNDARY_DIR)
        .build();

    let mut tsconfig_files: Vec<_> = walker
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some("tsconfig.json"))
        .collect();
    // shallowest config first, so the project root's aliases take precedence
    tsconfig_files.sort_by_key(|p| p.components().count());
    debug!("Found {} tsconfig.json files", tsconfig_files.len());

    let mut aliases = Vec::new();
    for tsconfig_path in &tsconfig_files {
        trace!("Checking tsconfig at: {:?}", tsconfig_path);
        let Ok(content) = fs::read_to_string(tsconfig_path) else { continue };

        let tsconfig: TsConfig = match serde_json::from_str(&strip_line_comments(&content)) {
            Ok(t) => t,
            Err(e) => {
                debug!("Skipping unparsable {}: {}", tsconfig_path.display(), e);
                continue;
            }
        };

        let options = tsconfig.compiler_options;
        let tsconfig_dir = tsconfig_path.parent().unwrap_or(root);
        let base_path = tsconfig_dir.join(options.base_url.as_deref().unwrap_or("."));

        for (alias, targets) in &options.paths {
            let pattern = alias.trim_end_matches("/*");
            if pattern.is_empty() || pattern.contains('*') {
                trace!("Skipping wildcard tsconfig path '{}'", alias);
                continue;
            }
            let Some(target) = targets.as_array().and_then(|t| t.first()).and_then(|t| t.as_str())
            else {
                continue;
            };

            let replacement = base_path.join(target.trim_end_matches("/*"));
            trace!("Found tsconfig path alias: '{}' -> {:?}", pattern, replacement);
            aliases.push(AliasSpec { pattern: pattern.to_string(), replacement });
        }
    }

    debug!("Loaded {} tsconfig path aliases", aliases.len());
    aliases
}

/// Removes `//` comments up to the end of their line, leaving string
/// contents such as URLs alone.
fn strip_line_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.next_if(|&n| n != '\n').is_some() {}
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_read_tsconfig_aliases_simple() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let tsconfig_content = r#"
{
  "compilerOptions": {
    "baseUrl": ".",
    "paths": {
      "@components/*": ["src/components/*"],
      "@utils": ["src/utils"]
    }
  }
}
"#;
        create_test_file(root, "tsconfig.json", tsconfig_content);

        let aliases = read_tsconfig_aliases(root);
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases[0].pattern, "@components");
        assert_eq!(aliases[0].replacement, root.join("./src/components"));
        assert_eq!(aliases[1].pattern, "@utils");
    }

    #[test]
    fn test_read_tsconfig_aliases_with_base_url() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let tsconfig_content = r#"
{
  "compilerOptions": {
    "baseUrl": "src",
    "paths": {
      "@components/*": ["components/*"]
    }
  }
}
"#;
        create_test_file(root, "tsconfig.json", tsconfig_content);

        let aliases = read_tsconfig_aliases(root);
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].replacement, root.join("src").join("components"));
    }

    #[test]
    fn test_read_tsconfig_aliases_root_config_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        create_test_file(
            root,
            "apps/web/tsconfig.json",
            r#"{ "compilerOptions": { "paths": { "@app/*": ["app/*"] } } }"#,
        );
        create_test_file(
            root,
            "tsconfig.json",
            r#"{ "compilerOptions": { "paths": { "@root/*": ["src/*"] } } }"#,
        );

        let aliases = read_tsconfig_aliases(root);
        let patterns: Vec<_> = aliases.iter().map(|a| a.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["@root", "@app"]);
        assert_eq!(aliases[1].replacement, root.join("apps/web/./app"));
    }

    #[test]
    fn test_read_tsconfig_aliases_with_comments() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let tsconfig_content = r#"
{
  // This is a comment
  "compilerOptions": {
    "baseUrl": ".", // Another comment
    "paths": {
      "@components/*": ["src/components/*"] // Path comment
    }
  }
}
"#;
        create_test_file(root, "tsconfig.json", tsconfig_content);

        assert_eq!(read_tsconfig_aliases(root).len(), 1);
    }

    #[test]
    fn test_read_tsconfig_aliases_skips_catch_all_and_node_modules() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        create_test_file(
            root,
            "tsconfig.json",
            r#"{ "compilerOptions": { "paths": { "*": ["types/*"], "@x": [] } } }"#,
        );
        create_test_file(
            root,
            "node_modules/dep/tsconfig.json",
            r#"{ "compilerOptions": { "paths": { "@dep/*": ["src/*"] } } }"#,
        );

        assert!(read_tsconfig_aliases(root).is_empty());
    }

    #[test]
    fn test_read_tsconfig_aliases_empty() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "tsconfig.json", r#"{ "compilerOptions": { "target": "ES2020" } }"#);
        assert!(read_tsconfig_aliases(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_strip_line_comments_keeps_strings() {
        let stripped = strip_line_comments(
            "{ \"a\": \"https://cdn.example.com/x\", // note\n \"b\": \"say \\\"//hi\\\"\" }",
        );
        assert_eq!(
            stripped,
            "{ \"a\": \"https://cdn.example.com/x\", \n \"b\": \"say \\\"//hi\\\"\" }"
        );
    }

    #[test]
    fn test_read_tsconfig_aliases_with_url_target() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let tsconfig_content = r#"
{
  "compilerOptions": {
    // remote modules
    "paths": {
      "@cdn/*": ["https://cdn.example.com/*"],
      "@utils": ["src/utils"] // local
    }
  }
}
"#;
        create_test_file(root, "tsconfig.json", tsconfig_content);

        let aliases = read_tsconfig_aliases(root);
        let patterns: Vec<_> = aliases.iter().map(|a| a.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["@cdn", "@utils"]);
    }
}
