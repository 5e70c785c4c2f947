//! Wrapper around the `svn` command-line client.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use svn_ci_core::{RepositorySource, SourceError, SourceResult};

/// Server certificate failures accepted without prompting. The trigger runs
/// unattended against internally hosted repositories, so every failure class
/// is listed.
const TRUSTED_CERT_FAILURES: &str = "unknown-ca,cn-mismatch,expired,not-yet-valid,other";

/// Subversion client shelling out to the `svn` binary.
pub struct SvnCliClient {
    binary: String,
    username: String,
    password: String,
}

impl SvnCliClient {
    /// Client using `svn` from `PATH`.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        SvnCliClient {
            binary: "svn".to_string(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Use a specific `svn` binary instead of the one on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn run_svn(&self, args: &[&str], target: &str) -> SourceResult<String> {
        debug!(target = %target, subcommand = %args[0], "running svn");
        let output = Command::new(&self.binary)
            .args(args)
            .arg(target)
            .args([
                "--non-interactive",
                "--no-auth-cache",
                "--trust-server-cert-failures",
                TRUSTED_CERT_FAILURES,
                "--username",
                &self.username,
                "--password",
                &self.password,
            ])
            .output()
            .await
            .map_err(|err| SourceError::request(target, format!("failed to run svn: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::response(target, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl RepositorySource for SvnCliClient {
    async fn latest_revision(&self, repo_url: &str, branch_path: &str) -> SourceResult<i64> {
        let target = join_url(repo_url, branch_path);
        let stdout = self
            .run_svn(
                &["info", "--show-item", "last-changed-revision"],
                &target,
            )
            .await?;
        parse_revision(&stdout).ok_or_else(|| {
            SourceError::response(&target, format!("unparseable revision '{}'", stdout.trim()))
        })
    }

    async fn list_child_directories(
        &self,
        repo_url: &str,
        base_path: &str,
    ) -> SourceResult<Vec<String>> {
        let target = join_url(repo_url, base_path);
        let stdout = self.run_svn(&["list"], &target).await?;
        Ok(parse_directory_listing(&stdout))
    }
}

/// Join a repository URL and a path inside it without doubling separators.
fn join_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.trim_end_matches('/').to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn parse_revision(stdout: &str) -> Option<i64> {
    stdout.trim().parse().ok()
}

/// Directory entries from `svn list` output. Directories end in `/`; files
/// are not branches and are skipped.
fn parse_directory_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_suffix('/'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_appends_path() {
        assert_eq!(
            join_url("https://svn.example.com/repo/", "trunk"),
            "https://svn.example.com/repo/trunk"
        );
    }

    #[test]
    fn join_url_collapses_duplicate_slashes() {
        assert_eq!(
            join_url("https://svn.example.com/repo/", "/branches/feature-a"),
            "https://svn.example.com/repo/branches/feature-a"
        );
    }

    #[test]
    fn join_url_empty_path_is_base() {
        assert_eq!(
            join_url("https://svn.example.com/repo/", ""),
            "https://svn.example.com/repo"
        );
    }

    #[test]
    fn parse_revision_trims_whitespace() {
        assert_eq!(parse_revision("42\n"), Some(42));
        assert_eq!(parse_revision("  108  "), Some(108));
    }

    #[test]
    fn parse_revision_rejects_garbage() {
        assert_eq!(parse_revision("HEAD"), None);
        assert_eq!(parse_revision(""), None);
    }

    #[test]
    fn directory_listing_keeps_directories_only() {
        let stdout = "feature-a/\nREADME.md\nfeature-b/\n";
        assert_eq!(
            parse_directory_listing(stdout),
            vec!["feature-a".to_string(), "feature-b".to_string()]
        );
    }

    #[test]
    fn directory_listing_empty_output() {
        assert!(parse_directory_listing("").is_empty());
    }
}
