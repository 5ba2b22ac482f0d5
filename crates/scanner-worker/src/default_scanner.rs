//! Default [`Scanner`] collaborator: a minimal filesystem walker that recognizes common manifest
//! files, infrastructure-as-code filenames, and URL literals in source files. The real per-language
//! parsers, API-call analyzers, and infrastructure scanners are out-of-scope collaborators; this
//! gives the `scan-worker` binary a real implementation to drive end to end, in the same spirit as
//! the regex-driven analyzers the rest of the corpus uses for this kind of lightweight text
//! scanning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use scanner_core::{
    ApiCall, CoreError, Dependency, HttpMethod, InfrastructureComponent, ProgressEvent,
    ScanProjectOutput, Scanner,
};

const SKIP_DIRS: &[&str] = &[".git", "node_modules", "target", ".venv", "vendor"];

/// Recursively walks a repository tree, classifying files by name/extension into dependency
/// manifests, infrastructure declarations, and API-call-bearing source files.
pub struct FileSystemScanner {
    url_pattern: Regex,
}

impl Default for FileSystemScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemScanner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            url_pattern: Regex::new(r#"https?://[^\s'"<>\)]+"#).expect("static pattern is valid"),
        }
    }
}

#[async_trait]
impl Scanner for FileSystemScanner {
    async fn scan_project(
        &self,
        path: &Path,
        progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> Result<ScanProjectOutput, CoreError> {
        let root = path.to_path_buf();
        let url_pattern = self.url_pattern.clone();

        // The walk is bounded by this process's own repository tree and this
        // process does nothing else concurrently, so a blocking walk on the
        // executor thread (rather than spawn_blocking) keeps the progress
        // callback's ordering simple and matches the one-process-per-repo
        // model.
        let files = walk_files(&root);
        let source_files: Vec<String> = files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        let mut dependencies = Vec::new();
        let manifest_total = files
            .iter()
            .filter(|f| manifest_kind(f).is_some())
            .count()
            .max(1) as u64;
        let mut manifest_index = 0u64;
        for rel in &files {
            let Some(kind) = manifest_kind(rel) else {
                continue;
            };
            manifest_index += 1;
            let abs = root.join(rel);
            if let Ok(text) = std::fs::read_to_string(&abs) {
                dependencies.extend(parse_manifest(kind, &text, &rel.to_string_lossy()));
            }
            progress(
                ProgressEvent::for_stage("imports")
                    .with_stage_total(manifest_index, manifest_total)
                    .with_path(rel.to_string_lossy().into_owned()),
            );
        }

        let mut infrastructure = Vec::new();
        for rel in &files {
            if let Some(component) = detect_infrastructure(rel) {
                infrastructure.push(component);
            }
        }

        let mut api_calls = Vec::new();
        let source_total = files.len().max(1) as u64;
        for (index, rel) in files.iter().enumerate() {
            let abs = root.join(rel);
            if let Ok(text) = std::fs::read_to_string(&abs) {
                api_calls.extend(find_api_calls(&url_pattern, &text, &rel.to_string_lossy()));
            }
            progress(
                ProgressEvent::for_stage("api_calls")
                    .with_stage_total(index as u64 + 1, source_total)
                    .with_path(rel.to_string_lossy().into_owned()),
            );
        }

        Ok(ScanProjectOutput {
            dependencies,
            api_calls,
            infrastructure,
            source_files,
        })
    }
}

fn walk_files(root: &Path) -> Vec<PathBuf> {
    fn visit(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(_) => continue,
            };
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if file_type.is_dir() {
                if SKIP_DIRS.contains(&name_str.as_ref()) {
                    continue;
                }
                visit(root, &entry.path(), out);
            } else if file_type.is_file() {
                if let Ok(rel) = entry.path().strip_prefix(root) {
                    out.push(rel.to_path_buf());
                }
            }
        }
    }

    let mut out = Vec::new();
    visit(root, root, &mut out);
    out.sort();
    out
}

#[derive(Clone, Copy)]
enum ManifestKind {
    PythonRequirements,
    NodePackageJson,
    GoMod,
    CargoToml,
}

fn manifest_kind(rel: &Path) -> Option<ManifestKind> {
    match rel.file_name()?.to_str()? {
        "requirements.txt" => Some(ManifestKind::PythonRequirements),
        "package.json" => Some(ManifestKind::NodePackageJson),
        "go.mod" => Some(ManifestKind::GoMod),
        "Cargo.toml" => Some(ManifestKind::CargoToml),
        _ => None,
    }
}

fn parse_manifest(kind: ManifestKind, text: &str, source_file: &str) -> Vec<Dependency> {
    match kind {
        ManifestKind::PythonRequirements => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                let name = line
                    .split(|c: char| c == '=' || c == '<' || c == '>' || c == '~' || c == '!')
                    .next()
                    .unwrap_or(line)
                    .trim()
                    .to_string();
                Dependency {
                    name,
                    version: None,
                    source_file: source_file.to_string(),
                    classification: "runtime".to_string(),
                }
            })
            .collect(),
        ManifestKind::NodePackageJson => {
            let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
                return Vec::new();
            };
            let mut deps = Vec::new();
            for section in ["dependencies", "devDependencies"] {
                let classification = if section == "dependencies" {
                    "runtime"
                } else {
                    "dev"
                };
                if let Some(map) = value.get(section).and_then(serde_json::Value::as_object) {
                    for (name, version) in map {
                        deps.push(Dependency {
                            name: name.clone(),
                            version: version.as_str().map(str::to_string),
                            source_file: source_file.to_string(),
                            classification: classification.to_string(),
                        });
                    }
                }
            }
            deps
        }
        ManifestKind::GoMod => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with("module") && !line.starts_with("go ") && !line.is_empty())
            .filter(|line| *line != "require (" && *line != ")")
            .filter_map(|line| {
                let line = line.trim_start_matches("require").trim();
                let mut parts = line.split_whitespace();
                let name = parts.next()?;
                let version = parts.next();
                Some(Dependency {
                    name: name.to_string(),
                    version: version.map(str::to_string),
                    source_file: source_file.to_string(),
                    classification: "runtime".to_string(),
                })
            })
            .collect(),
        ManifestKind::CargoToml => {
            let mut deps = Vec::new();
            let mut in_dependencies = false;
            for line in text.lines() {
                let trimmed = line.trim();
                if trimmed.starts_with('[') {
                    in_dependencies = trimmed.starts_with("[dependencies");
                    continue;
                }
                if !in_dependencies || trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                if let Some((name, rest)) = trimmed.split_once('=') {
                    let name = name.trim().to_string();
                    let version = rest
                        .trim()
                        .trim_matches(|c| c == '"' || c == '\'')
                        .split(',')
                        .next()
                        .map(|s| s.trim().trim_matches('"').to_string());
                    deps.push(Dependency {
                        name,
                        version,
                        source_file: source_file.to_string(),
                        classification: "runtime".to_string(),
                    });
                }
            }
            deps
        }
    }
}

fn detect_infrastructure(rel: &Path) -> Option<InfrastructureComponent> {
    let name = rel.file_name()?.to_str()?;
    let path_str = rel.to_string_lossy();

    let (kind, service, subtype) = if name == "Dockerfile" || name.starts_with("Dockerfile.") {
        ("container", "docker", "dockerfile")
    } else if name == "docker-compose.yml" || name == "docker-compose.yaml" {
        ("container", "docker", "compose")
    } else if rel.extension().and_then(|e| e.to_str()) == Some("tf") {
        ("iac", "terraform", "resource")
    } else if path_str.contains(".github/workflows") {
        ("ci_cd", "github_actions", "workflow")
    } else if name == "Jenkinsfile" {
        ("ci_cd", "jenkins", "pipeline")
    } else if name == ".gitlab-ci.yml" {
        ("ci_cd", "gitlab_ci", "pipeline")
    } else {
        return None;
    };

    Some(InfrastructureComponent {
        kind: kind.to_string(),
        name: name.to_string(),
        service: service.to_string(),
        subtype: subtype.to_string(),
        configuration: BTreeMap::new(),
        source_file: path_str.into_owned(),
        line: 1,
    })
}

fn find_api_calls(pattern: &Regex, text: &str, source_file: &str) -> Vec<ApiCall> {
    let mut calls = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        for m in pattern.find_iter(line) {
            let url = m.as_str().trim_end_matches(|c| c == ',' || c == ';').to_string();
            let method = infer_method(line);
            calls.push(ApiCall {
                url,
                method,
                auth_type: "unknown".to_string(),
                source_file: source_file.to_string(),
                #[allow(clippy::cast_possible_truncation)]
                line: line_no as u32 + 1,
            });
        }
    }
    calls
}

fn infer_method(line: &str) -> HttpMethod {
    let lower = line.to_lowercase();
    if lower.contains(".post(") || lower.contains("method=\"post\"") {
        HttpMethod::Post
    } else if lower.contains(".put(") {
        HttpMethod::Put
    } else if lower.contains(".patch(") {
        HttpMethod::Patch
    } else if lower.contains(".delete(") {
        HttpMethod::Delete
    } else if lower.contains(".get(") || lower.contains("fetch(") {
        HttpMethod::Get
    } else {
        HttpMethod::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detects_requirements_and_api_calls() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "requests==2.31.0\n# comment\nflask>=2.0\n").unwrap();
        std::fs::write(
            dir.path().join("app.py"),
            "import requests\nresponse = requests.get(\"https://api.example.com/v1/users\")\n",
        )
        .unwrap();

        let scanner = FileSystemScanner::new();
        let events = std::sync::Mutex::new(Vec::new());
        let result = scanner
            .scan_project(dir.path(), &|e| events.lock().unwrap().push(e))
            .await
            .unwrap();

        assert!(result.dependencies.iter().any(|d| d.name == "requests"));
        assert!(result.dependencies.iter().any(|d| d.name == "flask"));
        assert!(result
            .api_calls
            .iter()
            .any(|c| c.url.contains("api.example.com") && c.method == HttpMethod::Get));
        assert!(!events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn detects_dockerfile_as_infrastructure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM rust:1\n").unwrap();

        let scanner = FileSystemScanner::new();
        let result = scanner.scan_project(dir.path(), &|_| {}).await.unwrap();

        assert!(result.infrastructure.iter().any(|c| c.kind == "container"));
    }
}
