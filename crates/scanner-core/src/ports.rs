//! Collaborator interfaces the core consumes. These are the seams at which the out-of-scope
//! external collaborators (per-language parsers, API-call analyzers, infrastructure scanners,
//! categorization rule evaluation, group/namespace enumeration, credential verification) plug into
//! the core. The core depends only on these traits; concrete scanners are injected at the
//! composition root.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{ApiCall, Dependency, InfrastructureComponent, ProgressEvent};
use crate::error::CoreError;

/// A single scanner's raw findings, before categorization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanProjectOutput {
    pub dependencies: Vec<Dependency>,
    pub api_calls: Vec<ApiCall>,
    pub infrastructure: Vec<InfrastructureComponent>,
    pub source_files: Vec<String>,
}

/// Invoked by a Worker with a local repository path and a progress callback; returns the
/// language/IaC analyzers' combined raw findings.
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan_project(
        &self,
        path: &Path,
        progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> Result<ScanProjectOutput, CoreError>;
}

/// One category assignment for a dependency or API call: "allowed", "restricted", or
/// "cannot_determine" (GLOSSARY "Categorization").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryVerdict {
    Allowed,
    Restricted,
    CannotDetermine,
}

/// Evaluates raw findings against a policy catalog. The catalog's fixed `categories` set is loaded
/// from a YAML config file whose path is resolved from `CONFIG_PATH` env or a bundled default.
pub trait Categorizer: Send + Sync {
    /// category name -> deps assigned to it, plus a verdict per dependency.
    fn categorize_dependencies(
        &self,
        deps: &[Dependency],
    ) -> std::collections::BTreeMap<String, Vec<(Dependency, CategoryVerdict)>>;

    /// The fixed set of category names this catalog defines.
    fn categories(&self) -> &[String];
}

/// One project discovered by enumerating a group/namespace URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratedProject {
    pub name: String,
    pub git_url: String,
}

#[async_trait]
pub trait GroupEnumerator: Send + Sync {
    async fn get_project_info(&self, group_url: &str) -> Result<Vec<EnumeratedProject>, CoreError>;
}

/// Verifies HTTP Basic credentials. Credential validation itself is explicitly delegated; the core
/// only needs the yes/no gate.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> bool;
}

/// An [`AuthVerifier`] that accepts a single fixed username/password pair. Useful as the default
/// wired at the composition root when no external identity provider is configured; a production
/// deployment supplies its own.
pub struct StaticAuthVerifier {
    username: String,
    password: String,
}

impl StaticAuthVerifier {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl AuthVerifier for StaticAuthVerifier {
    async fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_auth_verifier_matches_exact_credentials() {
        let verifier = StaticAuthVerifier::new("admin", "hunter2");
        assert!(verifier.verify("admin", "hunter2").await);
        assert!(!verifier.verify("admin", "wrong").await);
        assert!(!verifier.verify("other", "hunter2").await);
    }
}
