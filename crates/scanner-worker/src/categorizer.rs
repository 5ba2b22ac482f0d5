//! Default [`Categorizer`] collaborator: a YAML-config-driven policy catalog. Per-language parsers
//! and rule evaluation are out-of-scope collaborators; this is the same kind of minimal concrete
//! default the core already ships for [`scanner_core::StaticAuthVerifier`] — enough for the
//! `scan-worker` binary to run end to end against a real config file.

use std::collections::BTreeMap;
use std::path::Path;

use scanner_core::{CategoryVerdict, Categorizer, CoreError, Dependency};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
struct RawCategory {
    #[serde(default)]
    allowed: Vec<String>,
    #[serde(default)]
    restricted: Vec<String>,
    #[serde(default)]
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    categories: BTreeMap<String, RawCategory>,
}

struct CategoryRules {
    allowed: Vec<String>,
    restricted: Vec<String>,
    patterns: Vec<String>,
}

/// Loads `categories.yaml` once at worker startup and matches dependency names against each
/// category's pattern lists.
pub struct YamlCategorizer {
    category_names: Vec<String>,
    rules: BTreeMap<String, CategoryRules>,
}

impl YamlCategorizer {
    /// Parse a categorizer config file.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::from_io_error(&e))?;
        let raw: RawConfig =
            serde_yaml::from_str(&text).map_err(|e| CoreError::internal(e.to_string()))?;

        let category_names = raw.categories.keys().cloned().collect();
        let rules = raw
            .categories
            .into_iter()
            .map(|(name, cat)| {
                (
                    name,
                    CategoryRules {
                        allowed: cat.allowed,
                        restricted: cat.restricted,
                        patterns: cat.patterns,
                    },
                )
            })
            .collect();

        Ok(Self {
            category_names,
            rules,
        })
    }

    /// Empty catalog used when no config file is configured or resolvable.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            category_names: Vec::new(),
            rules: BTreeMap::new(),
        }
    }

    fn verdict_for(rules: &CategoryRules, name_lower: &str) -> Option<CategoryVerdict> {
        if rules.allowed.iter().any(|p| name_lower.contains(&p.to_lowercase())) {
            Some(CategoryVerdict::Allowed)
        } else if rules
            .restricted
            .iter()
            .any(|p| name_lower.contains(&p.to_lowercase()))
        {
            Some(CategoryVerdict::Restricted)
        } else if rules.patterns.iter().any(|p| name_lower.contains(&p.to_lowercase())) {
            Some(CategoryVerdict::CannotDetermine)
        } else {
            None
        }
    }
}

impl Categorizer for YamlCategorizer {
    fn categorize_dependencies(
        &self,
        deps: &[Dependency],
    ) -> BTreeMap<String, Vec<(Dependency, CategoryVerdict)>> {
        let mut out = BTreeMap::new();
        for (category, rules) in &self.rules {
            let matched: Vec<_> = deps
                .iter()
                .filter_map(|dep| {
                    let name_lower = dep.name.to_lowercase();
                    Self::verdict_for(rules, &name_lower).map(|verdict| (dep.clone(), verdict))
                })
                .collect();
            if !matched.is_empty() {
                out.insert(category.clone(), matched);
            }
        }
        out
    }

    fn categories(&self) -> &[String] {
        &self.category_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_allowed_and_restricted_patterns() {
        let config = "categories:\n  networking:\n    allowed: [\"requests\"]\n    restricted: [\"unsafe-http\"]\n";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.yaml");
        std::fs::write(&path, config).unwrap();

        let categorizer = YamlCategorizer::from_path(&path).unwrap();
        let deps = vec![
            Dependency {
                name: "requests".into(),
                version: None,
                source_file: "requirements.txt".into(),
                classification: "runtime".into(),
            },
            Dependency {
                name: "unsafe-http-client".into(),
                version: None,
                source_file: "requirements.txt".into(),
                classification: "runtime".into(),
            },
            Dependency {
                name: "unrelated".into(),
                version: None,
                source_file: "requirements.txt".into(),
                classification: "runtime".into(),
            },
        ];

        let result = categorizer.categorize_dependencies(&deps);
        let networking = &result["networking"];
        assert_eq!(networking.len(), 2);
        assert!(networking
            .iter()
            .any(|(d, v)| d.name == "requests" && *v == CategoryVerdict::Allowed));
        assert!(networking
            .iter()
            .any(|(d, v)| d.name == "unsafe-http-client" && *v == CategoryVerdict::Restricted));
    }

    #[test]
    fn empty_catalog_has_no_categories() {
        let categorizer = YamlCategorizer::empty();
        assert!(categorizer.categories().is_empty());
        assert!(categorizer.categorize_dependencies(&[]).is_empty());
    }
}
