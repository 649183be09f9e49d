use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::config::GitHubConfig;
use crate::git::short_hash;
use crate::models::{BranchSummary, RemoteCommit, RemoteRepoInfo, RepoSummary, WorkflowRun};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const MAX_WORKFLOW_RUNS: usize = 5;
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {

    #[error("failed to build GitHub HTTP client: {0}")]
    Build(reqwest::Error),

    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error)

}

// wire shapes of the GitHub REST API, only the fields we read

#[derive(Debug, Deserialize)]
struct ApiRepo {
    name: String,
    full_name: String,
    description: Option<String>,
    html_url: String,
    default_branch: String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    language: Option<String>,
    updated_at: String,
    created_at: String
}

#[derive(Debug, Deserialize)]
struct ApiBranch {
    name: String,
    #[serde(default)]
    protected: bool,
    commit: ApiCommitRef
}

#[derive(Debug, Deserialize)]
struct ApiCommitRef {
    sha: String
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    html_url: String,
    commit: ApiCommitDetail
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    author: ApiAuthor,
    message: String
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    name: String,
    email: String,
    date: String
}

#[derive(Debug, Deserialize)]
struct ApiWorkflowRuns {
    workflow_runs: Vec<ApiWorkflowRun>
}

#[derive(Debug, Deserialize)]
struct ApiWorkflowRun {
    id: u64,
    name: Option<String>,
    status: Option<String>,
    conclusion: Option<String>,
    created_at: String,
    updated_at: String,
    html_url: String,
    head_branch: Option<String>,
    head_sha: String
}

/// Reads repository metadata from the GitHub REST API.
///
/// Without a token every call returns `None` without touching the network.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: Client,
    config: GitHubConfig
}

impl GitHubClient {

    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {

        // GitHub rejects requests without a user agent
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(GitHubError::Build)?;

        Ok(GitHubClient { http_client, config })

    }

    fn repo_url(&self, suffix: &str) -> String {

        format!("{}/repos/{}/{}{}", self.config.api_url, self.config.owner, self.config.repo, suffix)

    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, url: String) -> Result<T, GitHubError> {

        debug!(%url, "GitHub API request");

        let response = self.http_client
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", token))
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?;

        let body = response
            .error_for_status()?
            .json()
            .await?;

        Ok(body)

    }

    pub async fn repo_info(&self) -> Option<RemoteRepoInfo> {

        let Some(token) = self.config.token.as_deref() else {
            warn!("GITHUB_TOKEN not provided, skipping GitHub API calls");
            return None;
        };

        match self.fetch_repo_info(token).await {
            Ok(info) => Some(info),
            Err(e) => {
                error!(error = %e, "Error fetching GitHub repo info");
                None
            }
        }

    }

    async fn fetch_repo_info(&self, token: &str) -> Result<RemoteRepoInfo, GitHubError> {

        let (repo, branches) = tokio::try_join!(
            self.get_json::<ApiRepo>(token, self.repo_url("")),
            self.get_json::<Vec<ApiBranch>>(token, self.repo_url("/branches"))
        )?;

        // "main" wins over whatever the repository declares as default
        let tracked_branch = branches
            .iter()
            .find(|b| b.name == "main")
            .or_else(|| branches.iter().find(|b| b.name == repo.default_branch));

        let latest_commit = match tracked_branch {
            Some(branch) => {
                let url = self.repo_url(&format!("/commits/{}", branch.commit.sha));
                let commit: ApiCommit = self.get_json(token, url).await?;
                Some(RemoteCommit {
                    hash: short_hash(&commit.sha),
                    full_hash: commit.sha,
                    author: commit.commit.author.name,
                    email: commit.commit.author.email,
                    date: commit.commit.author.date,
                    message: commit.commit.message,
                    url: commit.html_url
                })
            }
            None => None
        };

        let branches = branches
            .into_iter()
            .map(|b| BranchSummary {
                last_commit: short_hash(&b.commit.sha),
                name: b.name,
                protected: b.protected
            })
            .collect();

        Ok(RemoteRepoInfo {
            repo: RepoSummary {
                name: repo.name,
                full_name: repo.full_name,
                description: repo.description,
                url: repo.html_url,
                default_branch: repo.default_branch,
                stars: repo.stargazers_count,
                forks: repo.forks_count,
                open_issues: repo.open_issues_count,
                language: repo.language,
                updated_at: repo.updated_at,
                created_at: repo.created_at
            },
            branches,
            latest_commit
        })

    }

    pub async fn workflow_runs(&self) -> Option<Vec<WorkflowRun>> {

        let token = self.config.token.as_deref()?;

        let url = self.repo_url(&format!("/actions/runs?per_page={}", MAX_WORKFLOW_RUNS));
        match self.get_json::<ApiWorkflowRuns>(token, url).await {
            Ok(runs) => Some(
                runs.workflow_runs
                    .into_iter()
                    .take(MAX_WORKFLOW_RUNS)
                    .map(|run| WorkflowRun {
                        id: run.id,
                        name: run.name,
                        status: run.status,
                        conclusion: run.conclusion,
                        created_at: run.created_at,
                        updated_at: run.updated_at,
                        url: run.html_url,
                        branch: run.head_branch,
                        commit: short_hash(&run.head_sha)
                    })
                    .collect()
            ),
            Err(e) => {
                error!(error = %e, "Error fetching GitHub workflow status");
                None
            }
        }

    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const SHA_MAIN: &str = "1111111aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const SHA_DEV: &str = "2222222bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn client_for(server: &MockServer, token: Option<&str>) -> GitHubClient {

        GitHubClient::new(GitHubConfig {
            token: token.map(str::to_string),
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            api_url: server.base_url()
        }).unwrap()

    }

    fn repo_body(default_branch: &str) -> serde_json::Value {

        json!({
            "name": "widgets",
            "full_name": "acme/widgets",
            "description": "Widget service",
            "html_url": "https://github.com/acme/widgets",
            "default_branch": default_branch,
            "stargazers_count": 12,
            "forks_count": 3,
            "open_issues_count": 1,
            "language": "Rust",
            "updated_at": "2024-01-15T10:30:00Z",
            "created_at": "2023-06-01T08:00:00Z"
        })

    }

    fn commit_body(sha: &str) -> serde_json::Value {

        json!({
            "sha": sha,
            "html_url": format!("https://github.com/acme/widgets/commit/{sha}"),
            "commit": {
                "author": { "name": "Ada", "email": "ada@example.com", "date": "2024-01-15T10:30:00Z" },
                "message": "Ship it"
            }
        })

    }

    #[tokio::test]
    async fn test_no_token_skips_network() {

        let server = MockServer::start_async().await;

        // would answer if the client called it
        server.mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widgets");
            then.status(200).json_body(repo_body("main"));
        }).await;

        let client = client_for(&server, None);
        assert!(client.repo_info().await.is_none());
        assert!(client.workflow_runs().await.is_none());

    }

    #[tokio::test]
    async fn test_repo_info_prefers_main_branch() {

        let server = MockServer::start_async().await;

        server.mock_async(|when, then| {
            when.method(GET)
                .path("/repos/acme/widgets")
                .header("authorization", "token t0k3n")
                .header("accept", GITHUB_ACCEPT)
                .header("user-agent", USER_AGENT);
            then.status(200).json_body(repo_body("develop"));
        }).await;

        server.mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widgets/branches");
            then.status(200).json_body(json!([
                { "name": "develop", "protected": false, "commit": { "sha": SHA_DEV } },
                { "name": "main", "protected": true, "commit": { "sha": SHA_MAIN } }
            ]));
        }).await;

        let commit = server.mock_async(|when, then| {
            when.method(GET).path(format!("/repos/acme/widgets/commits/{SHA_MAIN}"));
            then.status(200).json_body(commit_body(SHA_MAIN));
        }).await;

        let info = client_for(&server, Some("t0k3n")).repo_info().await.expect("repo info");

        commit.assert_async().await;
        assert_eq!(info.repo.full_name, "acme/widgets");
        assert_eq!(info.repo.default_branch, "develop");
        assert_eq!(info.repo.stars, 12);
        assert_eq!(info.branches.len(), 2);
        assert_eq!(info.branches[1].last_commit, "1111111");
        assert!(info.branches[1].protected);

        let latest = info.latest_commit.expect("latest commit");
        assert_eq!(latest.hash, "1111111");
        assert_eq!(latest.full_hash, SHA_MAIN);
        assert_eq!(latest.author, "Ada");
        assert_eq!(latest.message, "Ship it");

    }

    #[tokio::test]
    async fn test_repo_info_falls_back_to_default_branch() {

        let server = MockServer::start_async().await;

        server.mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widgets");
            then.status(200).json_body(repo_body("develop"));
        }).await;

        server.mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widgets/branches");
            then.status(200).json_body(json!([
                { "name": "develop", "protected": false, "commit": { "sha": SHA_DEV } }
            ]));
        }).await;

        let commit = server.mock_async(|when, then| {
            when.method(GET).path(format!("/repos/acme/widgets/commits/{SHA_DEV}"));
            then.status(200).json_body(commit_body(SHA_DEV));
        }).await;

        let info = client_for(&server, Some("t0k3n")).repo_info().await.expect("repo info");

        commit.assert_async().await;
        assert_eq!(info.latest_commit.unwrap().hash, "2222222");

    }

    #[tokio::test]
    async fn test_repo_info_without_matching_branch_has_no_commit() {

        let server = MockServer::start_async().await;

        server.mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widgets");
            then.status(200).json_body(repo_body("trunk"));
        }).await;

        server.mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widgets/branches");
            then.status(200).json_body(json!([]));
        }).await;

        let info = client_for(&server, Some("t0k3n")).repo_info().await.expect("repo info");
        assert!(info.branches.is_empty());
        assert!(info.latest_commit.is_none());

    }

    #[tokio::test]
    async fn test_repo_info_failure_is_none() {

        let server = MockServer::start_async().await;

        server.mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widgets");
            then.status(200).json_body(repo_body("main"));
        }).await;

        server.mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widgets/branches");
            then.status(401).json_body(json!({ "message": "Bad credentials" }));
        }).await;

        assert!(client_for(&server, Some("bad")).repo_info().await.is_none());

    }

    #[tokio::test]
    async fn test_workflow_runs_are_capped_and_shortened() {

        let server = MockServer::start_async().await;

        let runs: Vec<serde_json::Value> = (0..7u64)
            .map(|i| json!({
                "id": 100 + i,
                "name": "CI",
                "status": "completed",
                "conclusion": "success",
                "created_at": "2024-01-15T10:30:00Z",
                "updated_at": "2024-01-15T10:35:00Z",
                "html_url": format!("https://github.com/acme/widgets/actions/runs/{}", 100 + i),
                "head_branch": "main",
                "head_sha": SHA_MAIN
            }))
            .collect();

        let mock = server.mock_async(|when, then| {
            when.method(GET)
                .path("/repos/acme/widgets/actions/runs")
                .query_param("per_page", "5");
            then.status(200).json_body(json!({ "total_count": 7, "workflow_runs": runs }));
        }).await;

        let result = client_for(&server, Some("t0k3n")).workflow_runs().await.expect("runs");

        mock.assert_async().await;
        assert_eq!(result.len(), 5);
        assert_eq!(result[0].id, 100);
        assert_eq!(result[0].commit, "1111111");
        assert_eq!(result[0].branch.as_deref(), Some("main"));

    }

    #[tokio::test]
    async fn test_workflow_runs_failure_is_none() {

        let server = MockServer::start_async().await;

        server.mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widgets/actions/runs");
            then.status(200).body("not json");
        }).await;

        assert!(client_for(&server, Some("t0k3n")).workflow_runs().await.is_none());

    }

}
