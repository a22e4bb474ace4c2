//! Lexical extraction of import specifiers.
//!
//! Extraction is textual, not syntactic. Three passes run over the source:
//!
//! 1. escape sequences are dropped so escaped quotes and slashes cannot end
//!    a literal early;
//! 2. regular-expression literals and comments are removed, while string
//!    literals, template literals and division operators are kept verbatim;
//! 3. the remaining text is scanned for `import ... from "x"`, `import("x")`,
//!    `export ... from "x"` and `require("x")`, skipping over string literals.
//!
//! The scan tolerates most real sources but can over- or under-match on
//! unusual formatting (computed specifiers, strings split across lines).

use log::{debug, trace};
use regex::Regex;
use std::{fs, io, path::Path, sync::LazyLock};

use crate::types::{SpecKind, Specifier};

static ESCAPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:\\.)+/|(?:\\.)+").expect("escape pattern is valid"));

static DOUBLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"[^"\n]*""#).expect("string pattern is valid"));

static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^'[^'\n]*'").expect("string pattern is valid"));

static TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^`[^`]*`").expect("template pattern is valid"));

static REGEX_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(?:\[[^\]]*\]|[^/])+/").expect("regex literal pattern is valid"));

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\*(?s:.)+?\*/").expect("block comment pattern is valid"));

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//.*").expect("line comment pattern is valid"));

static SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#""[^"\n]*"|`[^`]*`|'[^'\n]*'|"#,
        r#"(?P<clause>import\s*(?:[A-Za-z0-9_+$\s*,]*(?:\{[^}]+\}\s*)?from\s*)?"#,
        r#"|export\s*(?:\*(?:\s*as\s+[A-Za-z0-9_$]+\s+|\s*)|\{[^}]+\}\s*)from\s*"#,
        r#"|(?:import|require)\s*\(\s*)"#,
        r#"(?:"(?P<dq>[^"'`+]+)"|'(?P<sq>[^"'`+]+)'|`(?P<bt>[^"'`+]+)`)"#,
    ))
    .expect("specifier pattern is valid")
});

/// Returns the specifiers of every import, re-export and require clause in
/// `source`, in source order. Duplicates are kept.
pub fn extract_specifiers(source: &str) -> Vec<Specifier> {
    let unescaped = ESCAPES.replace_all(source, "");
    let cleaned = strip_comments_and_regexes(&unescaped);

    let mut specs = Vec::new();
    let mut pos = 0;
    while let Some(caps) = SPECIFIER.captures_at(&cleaned, pos) {
        let Some(whole) = caps.get(0) else { break };

        // Bare string literals are matched only to be skipped over
        let Some(clause) = caps.name("clause") else {
            pos = whole.end();
            continue;
        };

        // `myrequire(...)`, `$import(...)` and friends are not clauses
        if follows_identifier(&cleaned, whole.start()) {
            pos = whole.start() + 1;
            continue;
        }

        if let Some(request) = caps.name("dq").or_else(|| caps.name("sq")).or_else(|| caps.name("bt"))
        {
            let kind = kind_of(clause.as_str());
            trace!("Found {} specifier: '{}'", kind.as_str(), request.as_str());
            specs.push(Specifier { request: request.as_str().to_string(), kind });
        }
        pos = whole.end();
    }

    specs
}

/// Reads `file` and extracts its specifiers.
pub fn specifiers_for(file: &Path) -> io::Result<Vec<Specifier>> {
    trace!("Scanning file for specifiers: {}", file.display());
    let source = fs::read_to_string(file)?;
    let specs = extract_specifiers(&source);
    debug!("Found {} specifiers in {}", specs.len(), file.display());
    Ok(specs)
}

fn kind_of(clause: &str) -> SpecKind {
    if clause.starts_with("require") {
        SpecKind::Require
    } else if clause.starts_with("export") {
        SpecKind::ReExport
    } else if clause.trim_end().ends_with('(') {
        SpecKind::Dynamic
    } else {
        SpecKind::Static
    }
}

/// Drops comments and regex literals. String and template literals are
/// copied through untouched, as is any `/` that reads as division.
fn strip_comments_and_regexes(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while let Some(c) = source[i..].chars().next() {
        let rest = &source[i..];

        let literal = match c {
            '"' => DOUBLE_QUOTED.find(rest),
            '\'' => SINGLE_QUOTED.find(rest),
            '`' => TEMPLATE.find(rest),
            _ => None,
        };
        if let Some(m) = literal {
            out.push_str(m.as_str());
            i += m.end();
            continue;
        }

        if c == '/' {
            let next = rest[1..].chars().next();
            if !matches!(next, Some('*' | '/')) && follows_operand(source, i) {
                out.push('/');
                i += 1;
                continue;
            }

            let removed = match next {
                Some('*') => BLOCK_COMMENT.find(rest),
                Some('/') => LINE_COMMENT.find(rest),
                _ => REGEX_LITERAL.find(rest),
            };
            if let Some(m) = removed {
                i += m.end();
                continue;
            }
        }

        out.push(c);
        i += c.len_utf8();
    }

    out
}

/// True when the last non-whitespace character before `at` ends an operand,
/// which makes a following `/` a division operator.
fn follows_operand(text: &str, at: usize) -> bool {
    text[..at]
        .trim_end()
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | ')'))
}

fn follows_identifier(text: &str, at: usize) -> bool {
    text[..at].chars().next_back().is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$'))
}
