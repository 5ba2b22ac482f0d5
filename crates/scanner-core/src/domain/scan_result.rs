//! Scan result types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One dependency finding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub source_file: String,
    pub classification: String,
}

/// HTTP method observed at an API call site, or `UNKNOWN`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Unknown,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// One REST API call site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApiCall {
    pub url: String,
    pub method: HttpMethod,
    pub auth_type: String,
    pub source_file: String,
    pub line: u32,
}

/// One infrastructure-as-code finding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InfrastructureComponent {
    pub kind: String,
    pub name: String,
    pub service: String,
    pub subtype: String,
    /// Configuration map serialized as an ordered string/string table so the type stays `Eq`/`Ord`
    /// for deduplication and deterministic JSON output.
    #[serde(default)]
    pub configuration: BTreeMap<String, String>,
    pub source_file: String,
    pub line: u32,
}

/// Per-repository scan output, produced by the Worker from the Scanner and Categorizer
/// collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default)]
    pub dependencies: BTreeSet<Dependency>,
    #[serde(default)]
    pub api_calls: BTreeSet<ApiCall>,
    #[serde(default)]
    pub infrastructure: BTreeSet<InfrastructureComponent>,
    /// category name -> has-any?.
    #[serde(default)]
    pub dependency_categories: BTreeMap<String, bool>,
    /// category name -> has-any? for infrastructure findings.
    #[serde(default)]
    pub infrastructure_categories: BTreeMap<String, bool>,
}

impl ScanResult {
    /// Merge another project's categorized flags into this one using logical OR.
    pub fn merge_categories_any(&mut self, other: &Self) {
        for (k, v) in &other.dependency_categories {
            let entry = self.dependency_categories.entry(k.clone()).or_insert(false);
            *entry = *entry || *v;
        }
        for (k, v) in &other.infrastructure_categories {
            let entry = self
                .infrastructure_categories
                .entry(k.clone())
                .or_insert(false);
            *entry = *entry || *v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_categories_any_is_logical_or() {
        let mut a = ScanResult::default();
        a.dependency_categories.insert("licensing".into(), false);
        let mut b = ScanResult::default();
        b.dependency_categories.insert("licensing".into(), true);

        a.merge_categories_any(&b);
        assert_eq!(a.dependency_categories["licensing"], true);
    }
}
