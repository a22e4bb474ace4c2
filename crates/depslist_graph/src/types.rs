use serde::Serialize;
use std::path::PathBuf;

/// Result of one dependency-closure computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepsList {
    /// Entries in input order, then dependencies in order of first admission
    pub files: Vec<PathBuf>,
    /// Latest modification time of any file read, in milliseconds since the
    /// Unix epoch; negative infinity when nothing was read. Present iff
    /// modification-time tracking was enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_ms: Option<f64>,
    /// Sorted names of the installed packages owning a parsed file. Present
    /// iff package collection was enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
}
