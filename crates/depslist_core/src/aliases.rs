//! Prefix rewriting of specifiers before resolution.
//!
//! A rule's pattern matches a specifier exactly or as a leading path segment
//! (`@app` matches `@app` and `@app/x`, not `@application`). A trailing `/*`
//! on the pattern is accepted and means the same thing. Rules apply in order
//! and the first match wins.

use log::trace;
use path_clean::clean;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

/// An alias as configured, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSpec {
    pub pattern: String,
    pub replacement: PathBuf,
}

impl FromStr for AliasSpec {
    type Err = String;

    /// Parses `PATTERN=PATH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pattern, replacement) =
            s.split_once('=').ok_or_else(|| format!("expected PATTERN=PATH, got '{}'", s))?;
        Ok(AliasSpec { pattern: pattern.to_string(), replacement: PathBuf::from(replacement) })
    }
}

#[derive(Debug, Error)]
pub enum AliasError {
    #[error("alias pattern is empty")]
    Empty,
    #[error("alias pattern '{pattern}' may only use '*' as a trailing '/*'")]
    Wildcard { pattern: String },
    #[error("alias pattern '{pattern}' does not compile")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
struct AliasRule {
    matcher: Regex,
    replacement: String,
}

/// Validated, ordered alias rules.
#[derive(Debug, Clone, Default)]
pub struct AliasRules {
    rules: Vec<AliasRule>,
}

impl AliasRules {
    /// Validates `specs` and makes every replacement absolute against `cwd`.
    pub fn compile(specs: &[AliasSpec], cwd: &Path) -> Result<Self, AliasError> {
        let mut rules = Vec::with_capacity(specs.len());

        for spec in specs {
            let prefix = spec.pattern.strip_suffix("/*").unwrap_or(&spec.pattern);
            if prefix.is_empty() {
                return Err(AliasError::Empty);
            }
            if prefix.contains('*') {
                return Err(AliasError::Wildcard { pattern: spec.pattern.clone() });
            }

            let matcher = Regex::new(&format!("^{}(/.*)?$", regex::escape(prefix)))
                .map_err(|source| AliasError::Regex { pattern: spec.pattern.clone(), source })?;
            let replacement = clean(cwd.join(&spec.replacement)).to_string_lossy().to_string();

            trace!("Alias rule '{}' -> '{}'", prefix, replacement);
            rules.push(AliasRule { matcher, replacement });
        }

        Ok(AliasRules { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrites `specifier` with the first matching rule, keeping whatever
    /// follows the matched prefix.
    pub fn rewrite<'a>(&self, specifier: &'a str) -> Cow<'a, str> {
        for rule in &self.rules {
            if let Some(caps) = rule.matcher.captures(specifier) {
                let rest = caps.get(1).map_or("", |m| m.as_str());
                let rewritten = format!("{}{}", rule.replacement, rest);
                trace!("Rewrote '{}' to '{}'", specifier, rewritten);
                return Cow::Owned(rewritten);
            }
        }
        Cow::Borrowed(specifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(pattern: &str, replacement: &str) -> AliasSpec {
        AliasSpec { pattern: pattern.to_string(), replacement: PathBuf::from(replacement) }
    }

    #[test]
    fn test_exact_and_prefix_match() {
        let rules = AliasRules::compile(&[spec("@app", "/src/app")], Path::new("/")).unwrap();
        assert_eq!(rules.rewrite("@app"), "/src/app");
        assert_eq!(rules.rewrite("@app/widgets/x"), "/src/app/widgets/x");
    }

    #[test]
    fn test_segment_boundary_required() {
        let rules = AliasRules::compile(&[spec("@app", "/src/app")], Path::new("/")).unwrap();
        assert_eq!(rules.rewrite("@application"), "@application");
        assert!(matches!(rules.rewrite("lodash"), Cow::Borrowed("lodash")));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = AliasRules::compile(
            &[spec("@app/*", "/src/app"), spec("@app/widgets", "/other")],
            Path::new("/"),
        )
        .unwrap();
        assert_eq!(rules.rewrite("@app/widgets/x"), "/src/app/widgets/x");
    }

    #[test]
    fn test_replacement_made_absolute() {
        let rules = AliasRules::compile(&[spec("~", "./src/../lib")], Path::new("/proj")).unwrap();
        assert_eq!(rules.rewrite("~/util"), "/proj/lib/util");
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let rules = AliasRules::compile(&[spec("$lib.x", "/lib")], Path::new("/")).unwrap();
        assert_eq!(rules.rewrite("$lib.x/a"), "/lib/a");
        assert_eq!(rules.rewrite("$libyx/a"), "$libyx/a");
    }

    #[test]
    fn test_malformed_patterns_rejected() {
        assert!(matches!(
            AliasRules::compile(&[spec("", "/x")], Path::new("/")),
            Err(AliasError::Empty)
        ));
        assert!(matches!(
            AliasRules::compile(&[spec("/*", "/x")], Path::new("/")),
            Err(AliasError::Empty)
        ));
        assert!(matches!(
            AliasRules::compile(&[spec("@a*b", "/x")], Path::new("/")),
            Err(AliasError::Wildcard { .. })
        ));
    }

    #[test]
    fn test_parse_alias_spec() {
        let parsed: AliasSpec = "@app=./src/app".parse().unwrap();
        assert_eq!(parsed, spec("@app", "./src/app"));
        assert!("no-equals".parse::<AliasSpec>().is_err());
    }
}
