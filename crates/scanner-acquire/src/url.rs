//! Git URL validation and the URL → ZIP archive rewrite rules.

use thiserror::Error;

/// Characters that are never legal inside a validated Git URL.
const SHELL_METACHARACTERS: &[char] = &[';', '&', '|', '$', '`', '<', '>', '(', ')'];

/// Hostnames that are always treated as cloud-metadata endpoints regardless of how they resolve.
const METADATA_HOSTS: &[&str] = &["metadata.google.internal"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("URL contains shell metacharacters")]
    ShellMetacharacters,
    #[error("unsupported URL scheme")]
    UnsupportedScheme,
    #[error("URL has no scheme")]
    MissingScheme,
    #[error("host resolves to a private, loopback, or link-local network")]
    PrivateNetworkHost,
    #[error("host is a cloud metadata endpoint")]
    MetadataHost,
    #[error("port {0} is not one of the standard HTTP(S) ports")]
    NonStandardPort(u16),
    #[error("malformed URL: {0}")]
    Malformed(String),
}

/// Validate a submitted Git URL. Accepts
/// `https://{host}/{owner}/{repo}[.git][/]` and `git@host:owner/repo.git`. Everything else
/// (file/ftp schemes, shell metacharacters, private-network or metadata hosts, non-standard ports)
/// is rejected.
pub fn validate_git_url(raw: &str) -> Result<(), UrlValidationError> {
    if raw.chars().any(|c| SHELL_METACHARACTERS.contains(&c)) {
        return Err(UrlValidationError::ShellMetacharacters);
    }

    if let Some(rest) = raw.strip_prefix("git@") {
        let host = rest.split(':').next().unwrap_or_default();
        return validate_host(host, None);
    }

    let Some((scheme, after_scheme)) = raw.split_once("://") else {
        return Err(UrlValidationError::MissingScheme);
    };

    match scheme {
        "https" | "http" => {}
        "file" | "ftp" => return Err(UrlValidationError::UnsupportedScheme),
        _ => return Err(UrlValidationError::UnsupportedScheme),
    }

    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    if authority.is_empty() {
        return Err(UrlValidationError::Malformed(
            "missing host in URL".to_string(),
        ));
    }

    let (host, port) = match authority.rsplit_once(':') {
        Some((h, p)) => {
            let port: u16 = p
                .parse()
                .map_err(|_| UrlValidationError::Malformed(format!("bad port {p}")))?;
            (h, Some(port))
        }
        None => (authority, None),
    };

    validate_host(host, port)
}

fn validate_host(host: &str, port: Option<u16>) -> Result<(), UrlValidationError> {
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if METADATA_HOSTS.contains(&host) || host == "169.254.169.254" {
        return Err(UrlValidationError::MetadataHost);
    }

    if host == "localhost" || host == "::1" {
        return Err(UrlValidationError::PrivateNetworkHost);
    }

    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        if is_private_or_link_local(&ip) {
            return Err(UrlValidationError::PrivateNetworkHost);
        }
    }

    if let Some(p) = port {
        if p != 80 && p != 443 {
            return Err(UrlValidationError::NonStandardPort(p));
        }
    }

    Ok(())
}

fn is_private_or_link_local(ip: &std::net::IpAddr) -> bool {
    match ip {
        std::net::IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_link_local() || v4.is_private() || v4.is_unspecified()
        }
        std::net::IpAddr::V6(v6) => {
            v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Strip a trailing `.git` suffix and trailing slash, the normalization step that precedes URL →
/// ZIP rewriting.
fn strip_git_suffix(url: &str) -> &str {
    url.trim_end_matches('/').trim_end_matches(".git")
}

/// Rewrite a Git URL to the HTTPS ZIP archive download URL the Acquirer streams instead of invoking
/// `git`. `main` is hard-coded as the branch hint; a repository whose default branch differs will
/// fail acquisition with a 404 rather than being probed for. Idempotent: applying this to its own
/// output returns the same string, since a `.../archive/...zip` URL contains neither a bare
/// `owner/repo` path nor a `.git` suffix to rewrite further.
#[must_use]
pub fn rewrite_to_zip_url(url: &str) -> String {
    let Some(rest) = url.split("://").nth(1) else {
        return url.to_string();
    };
    let scheme = url.split("://").next().unwrap_or("https");
    let stripped = strip_git_suffix(rest);

    // Already an archive URL (a prior call's output fed back in): return unchanged so the
    // rewrite is idempotent, before the host-specific branches below would re-append a suffix.
    if stripped.contains("/archive/") || stripped.ends_with(".zip") {
        return format!("{scheme}://{stripped}");
    }

    if let Some(path) = stripped.strip_prefix("github.com/") {
        return format!("{scheme}://github.com/{path}/archive/refs/heads/main.zip");
    }
    if let Some(path) = stripped.strip_prefix("gitlab.com/") {
        let project = path.rsplit('/').next().unwrap_or(path);
        return format!("{scheme}://gitlab.com/{path}/-/archive/main/{project}-main.zip");
    }
    format!("{scheme}://{stripped}/archive/main.zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_https_github_url() {
        assert!(validate_git_url("https://github.com/owner/repo.git").is_ok());
        assert!(validate_git_url("https://github.com/owner/repo/").is_ok());
    }

    #[test]
    fn accepts_ssh_style_url() {
        assert!(validate_git_url("git@github.com:owner/repo.git").is_ok());
    }

    #[test]
    fn rejects_shell_metacharacters() {
        let err = validate_git_url("https://github.com/a/b.git; rm -rf /").unwrap_err();
        assert_eq!(err, UrlValidationError::ShellMetacharacters);
    }

    #[test]
    fn rejects_file_scheme() {
        assert_eq!(
            validate_git_url("file:///etc/passwd").unwrap_err(),
            UrlValidationError::UnsupportedScheme
        );
    }

    #[test]
    fn rejects_loopback_and_metadata_hosts() {
        assert_eq!(
            validate_git_url("https://127.0.0.1/a/b").unwrap_err(),
            UrlValidationError::PrivateNetworkHost
        );
        assert_eq!(
            validate_git_url("https://169.254.169.254/a/b").unwrap_err(),
            UrlValidationError::MetadataHost
        );
        assert_eq!(
            validate_git_url("https://metadata.google.internal/a/b").unwrap_err(),
            UrlValidationError::MetadataHost
        );
    }

    #[test]
    fn rejects_non_standard_port() {
        assert_eq!(
            validate_git_url("https://github.com:8080/a/b").unwrap_err(),
            UrlValidationError::NonStandardPort(8080)
        );
    }

    #[test]
    fn rewrites_github_url() {
        assert_eq!(
            rewrite_to_zip_url("https://github.com/owner/repo.git"),
            "https://github.com/owner/repo/archive/refs/heads/main.zip"
        );
    }

    #[test]
    fn rewrites_gitlab_url() {
        assert_eq!(
            rewrite_to_zip_url("https://gitlab.com/owner/project.git"),
            "https://gitlab.com/owner/project/-/archive/main/project-main.zip"
        );
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = rewrite_to_zip_url("https://github.com/owner/repo.git");
        let twice = rewrite_to_zip_url(&once);
        assert_eq!(once, twice);
    }
}
