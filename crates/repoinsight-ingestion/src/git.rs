//! GitHub URL handling and repository acquisition
//!
//! URL validation, owner/name extraction, the deterministic repository
//! identifier, and shallow single-branch clones into a reusable
//! per-repository working directory.

use crate::error::{IngestionError, IngestionResult};
use repoinsight_config::GitConfig;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Whether the string is a valid GitHub repository URL.
///
/// Scheme is optional; the host must be `github.com` and the path must
/// carry at least `owner/name`.
pub fn validate_github_url(url: &str) -> bool {
    parse_github_url(url).is_some()
}

/// Heuristic for inputs that look like a repository URL at all
/// (used by the query path's session-or-URL fallback).
pub fn looks_like_repository_url(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.ends_with(".git") && trimmed.trim_end_matches(".git").contains('/') {
        return true;
    }
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.starts_with("github.com/")
        && without_scheme.trim_start_matches("github.com/").contains('/')
}

/// Extract `(owner, name)` from a GitHub URL.
///
/// # Errors
///
/// Returns `IngestionError::InvalidRepositoryUrl` when the URL does
/// not validate.
pub fn extract_repo_info(url: &str) -> IngestionResult<(String, String)> {
    parse_github_url(url).ok_or_else(|| IngestionError::InvalidRepositoryUrl(url.to_string()))
}

fn parse_github_url(url: &str) -> Option<(String, String)> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    let mut parts = without_scheme.split('/');
    let host = parts.next()?.to_lowercase();
    if host != "github.com" && host != "www.github.com" {
        return None;
    }

    let owner = parts.next()?.trim();
    let name = parts.next()?.trim();
    if owner.is_empty() {
        return None;
    }

    // Strip fragment and the .git suffix from the repository name
    let name = name.split('#').next().unwrap_or(name);
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        return None;
    }

    Some((owner.to_string(), name.to_string()))
}

/// Deterministic, collision-resistant collection name for a repository.
///
/// `github_{owner}_{name}_{first8(sha256("owner/name"))}`, all
/// lowercase, so equivalent URLs share a collection and similarly named
/// repositories cannot collide.
///
/// # Errors
///
/// Returns `IngestionError::InvalidRepositoryUrl` when the URL does
/// not validate.
pub fn repository_identifier(url: &str) -> IngestionResult<String> {
    let (owner, name) = extract_repo_info(url)?;
    let owner = owner.to_lowercase();
    let name = name.to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(format!("{owner}/{name}").as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    let prefix = digest.get(..8).unwrap_or("00000000");

    Ok(format!("github_{owner}_{name}_{prefix}"))
}

/// Where a repository's working copy lives under the clone root
pub fn clone_destination(config: &GitConfig, owner: &str, name: &str) -> PathBuf {
    Path::new(&config.clone_dir).join(format!(
        "{}_{}",
        owner.to_lowercase(),
        name.to_lowercase()
    ))
}

/// Clone a repository (shallow, single branch) into its deterministic
/// destination, reusing a valid existing clone unless `force_update`.
///
/// Blocking; callers run it inside `spawn_blocking` with the clone
/// timeout applied around it.
///
/// # Errors
///
/// Returns `IngestionError::InvalidRepositoryUrl` or
/// `IngestionError::CloneFailed`.
pub fn clone_repository(
    url: &str,
    config: &GitConfig,
    force_update: bool,
) -> IngestionResult<PathBuf> {
    let (owner, name) = extract_repo_info(url)?;
    let destination = clone_destination(config, &owner, &name);

    if destination.exists() {
        if !force_update && git2::Repository::open(&destination).is_ok() {
            tracing::info!(path = %destination.display(), "Reusing existing clone");
            return Ok(destination);
        }
        // Stale or forced: clear the directory before cloning fresh
        std::fs::remove_dir_all(&destination)
            .map_err(|e| IngestionError::CloneFailed(format!("failed to clear stale clone: {e}")))?;
    }

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| IngestionError::CloneFailed(format!("failed to create clone dir: {e}")))?;
    }

    let mut fetch_options = git2::FetchOptions::new();
    fetch_options.depth(1);

    tracing::info!(url, path = %destination.display(), "Cloning repository");
    git2::build::RepoBuilder::new()
        .fetch_options(fetch_options)
        .clone(url, &destination)
        .map_err(|e| IngestionError::CloneFailed(e.message().to_string()))?;

    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_github_url_shapes() {
        assert!(validate_github_url("https://github.com/pallets/flask"));
        assert!(validate_github_url("http://github.com/pallets/flask.git"));
        assert!(validate_github_url("github.com/pallets/flask"));
        assert!(validate_github_url("https://www.github.com/pallets/flask#readme"));
    }

    #[test]
    fn rejects_non_github_urls() {
        assert!(!validate_github_url("https://gitlab.com/pallets/flask"));
        assert!(!validate_github_url("https://github.com/pallets"));
        assert!(!validate_github_url(""));
        assert!(!validate_github_url("not a url"));
    }

    #[test]
    fn extracts_owner_and_name() {
        let (owner, name) = extract_repo_info("https://github.com/pallets/flask.git").unwrap();
        assert_eq!(owner, "pallets");
        assert_eq!(name, "flask");
    }

    #[test]
    fn identifier_is_deterministic_across_url_shapes() {
        let a = repository_identifier("https://github.com/pallets/flask").unwrap();
        let b = repository_identifier("http://github.com/Pallets/Flask.git").unwrap();
        let c = repository_identifier("github.com/pallets/flask#readme").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn identifier_shape_matches_the_scheme() {
        let id = repository_identifier("https://github.com/pallets/flask").unwrap();
        assert!(id.starts_with("github_pallets_flask_"));
        assert_eq!(id, id.to_lowercase());

        let suffix = id.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_repositories_get_different_identifiers() {
        let a = repository_identifier("https://github.com/pallets/flask").unwrap();
        let b = repository_identifier("https://github.com/pallets/click").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn url_likeness_heuristic() {
        assert!(looks_like_repository_url("https://github.com/pallets/flask"));
        assert!(looks_like_repository_url("github.com/pallets/flask"));
        assert!(looks_like_repository_url("pallets/flask.git"));
        assert!(!looks_like_repository_url("1f0e6d8c-aaaa-bbbb-cccc-121212121212"));
        assert!(!looks_like_repository_url("where is the routing"));
    }
}
