use serde::Serialize;

/// A literal import target exactly as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specifier {
    pub request: String,
    pub kind: SpecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecKind {
    /// `import x from "..."` or `import "..."`
    Static,
    /// `import("...")`
    Dynamic,
    /// `export ... from "..."`
    ReExport,
    /// `require("...")`
    Require,
}

impl SpecKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecKind::Static => "static",
            SpecKind::Dynamic => "dynamic",
            SpecKind::ReExport => "re-export",
            SpecKind::Require => "require",
        }
    }
}
