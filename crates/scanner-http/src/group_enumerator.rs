//! Default [`GroupEnumerator`] collaborator: resolves a GitLab group/namespace URL to its member
//! projects via the public GitLab REST API. A minimal concrete implementation against the real
//! public API, reusing the workspace's `reqwest` dependency the way `scanner-acquire` already does.

use async_trait::async_trait;
use scanner_core::{CoreError, EnumeratedProject, GroupEnumerator};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GitlabProject {
    name: String,
    http_url_to_repo: String,
}

/// Enumerates projects under a `gitlab.com/<group>` (or self-hosted GitLab) namespace using `GET
/// /api/v4/groups/:id/projects?include_subgroups=true`.
pub struct GitlabGroupEnumerator {
    client: reqwest::Client,
}

impl Default for GitlabGroupEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl GitlabGroupEnumerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl GroupEnumerator for GitlabGroupEnumerator {
    async fn get_project_info(&self, group_url: &str) -> Result<Vec<EnumeratedProject>, CoreError> {
        let (api_base, group_path) = split_group_url(group_url)
            .ok_or_else(|| CoreError::invalid_url("not a recognizable GitLab group URL"))?;

        let encoded_path = urlencode_path(&group_path);
        let endpoint =
            format!("{api_base}/api/v4/groups/{encoded_path}/projects?include_subgroups=true&per_page=100");

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| CoreError::acquisition(format!("group enumeration request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::acquisition(format!(
                "group enumeration failed with status {}",
                response.status()
            )));
        }

        let projects: Vec<GitlabProject> = response
            .json()
            .await
            .map_err(|e| CoreError::acquisition(format!("malformed group enumeration response: {e}")))?;

        Ok(projects
            .into_iter()
            .map(|p| EnumeratedProject {
                name: p.name,
                git_url: p.http_url_to_repo,
            })
            .collect())
    }
}

/// `https://gitlab.com/my-group` -> `("https://gitlab.com", "my-group")`.
fn split_group_url(url: &str) -> Option<(String, String)> {
    let (scheme, rest) = url.split_once("://")?;
    let mut parts = rest.splitn(2, '/');
    let host = parts.next()?;
    let path = parts.next()?.trim_matches('/');
    if path.is_empty() {
        return None;
    }
    Some((format!("{scheme}://{host}"), path.to_string()))
}

fn urlencode_path(path: &str) -> String {
    path.replace('/', "%2F")
}

/// Whether `url` names a group/namespace rather than a single repository: heuristically, exactly
/// one path segment after the host (a single-repo URL is always `host/owner/repo`).
#[must_use]
pub fn is_group_url(url: &str) -> bool {
    let Some((_, rest)) = url.split_once("://").or_else(|| url.split_once('@')) else {
        return false;
    };
    let Some((_, path)) = rest.split_once('/') else {
        return false;
    };
    let path = path.trim_end_matches('/').trim_end_matches(".git");
    !path.is_empty() && !path.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_repo_url_is_not_a_group() {
        assert!(!is_group_url("https://github.com/owner/repo.git"));
        assert!(!is_group_url("https://gitlab.com/owner/project"));
    }

    #[test]
    fn bare_namespace_url_is_a_group() {
        assert!(is_group_url("https://gitlab.com/my-group"));
        assert!(is_group_url("https://gitlab.com/my-group/"));
    }

    #[test]
    fn splits_group_url_into_api_base_and_path() {
        let (base, path) = split_group_url("https://gitlab.com/my-group").unwrap();
        assert_eq!(base, "https://gitlab.com");
        assert_eq!(path, "my-group");
    }
}
