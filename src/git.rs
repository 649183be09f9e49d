//! Local repository introspection.
//!
//! [`GitCli`] shells out to the `git` binary; [`RepoInspector`] combines it with
//! the remote [`GitHubClient`] into a single [`RepositoryInfo`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::client::GitHubClient;
use crate::models::{CommitInfo, LocalGitInfo, RepositoryInfo};

const SHORT_HASH_LEN: usize = 7;
const LOG_FORMAT: &str = "--pretty=format:%H|%an|%ae|%ad|%s";

/// Reads the state of the checkout the service runs from.
///
/// Implementations never fail: anything that goes wrong is logged and
/// reported as `None`.
#[async_trait]
pub trait LocalRepoProbe: Send + Sync {
    async fn local_info(&self) -> Option<LocalGitInfo>;
}

#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    timeout: Duration
}

impl GitCli {

    pub fn new(workdir: impl Into<PathBuf>, timeout: Duration) -> Self {

        GitCli {
            workdir: workdir.into(),
            timeout
        }

    }

    async fn run(&self, args: &[&str]) -> Result<String, String> {

        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(&self.workdir)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| format!("git {} timed out after {:?}", args.join(" "), self.timeout))?
            .map_err(|e| format!("failed to run git: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("git {} exited with {}: {}", args.join(" "), output.status, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())

    }

    async fn read(&self) -> Result<LocalGitInfo, String> {

        let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        let log_line = self.run(&["log", "-1", "--date=iso-strict", LOG_FORMAT]).await?;

        let last_commit = parse_commit_line(&log_line)
            .ok_or_else(|| format!("unexpected git log output: {:?}", log_line))?;

        Ok(LocalGitInfo {
            branch,
            last_commit
        })

    }

}

#[async_trait]
impl LocalRepoProbe for GitCli {

    async fn local_info(&self) -> Option<LocalGitInfo> {

        match self.read().await {
            Ok(info) => {
                debug!(branch = %info.branch, commit = %info.last_commit.hash, "read local git info");
                Some(info)
            }
            Err(e) => {
                warn!(workdir = %self.workdir.display(), error = %e, "Could not get local git info");
                None
            }
        }

    }

}

/// Parses a `hash|author|email|date|subject` line. The subject is the last
/// field, so a `|` inside it is kept.
pub fn parse_commit_line(line: &str) -> Option<CommitInfo> {

    let mut fields = line.trim().splitn(5, '|');

    let full_hash = fields.next().filter(|h| !h.is_empty())?;
    let author = fields.next()?;
    let email = fields.next()?;
    let date = fields.next()?;
    let message = fields.next()?;

    Some(CommitInfo {
        hash: short_hash(full_hash),
        full_hash: full_hash.to_string(),
        author: author.to_string(),
        email: email.to_string(),
        date: date.to_string(),
        message: message.to_string()
    })

}

pub fn short_hash(full_hash: &str) -> String {

    full_hash.chars().take(SHORT_HASH_LEN).collect()

}

/// Local and remote repository readers behind one handle.
#[derive(Clone)]
pub struct RepoInspector {
    local: Arc<dyn LocalRepoProbe>,
    remote: GitHubClient
}

impl RepoInspector {

    pub fn new(local: Arc<dyn LocalRepoProbe>, remote: GitHubClient) -> Self {

        RepoInspector { local, remote }

    }

    // the three lookups run concurrently; each one degrades to None on its own
    pub async fn all_info(&self) -> RepositoryInfo {

        let (local, github, workflows) = tokio::join!(
            self.local.local_info(),
            self.remote.repo_info(),
            self.remote.workflow_runs()
        );

        RepositoryInfo {
            local,
            github,
            workflows
        }

    }

}
