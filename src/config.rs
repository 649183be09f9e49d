use std::path::PathBuf;
use std::time::Duration;

use crate::models::PlacementInfo;

pub const DEFAULT_APP_NAME: &str = "backstage-node-app";
const DEFAULT_GITHUB_OWNER: &str = "hexspark-digital";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {

    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String
    }

}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub owner: String,
    pub repo: String,
    pub api_url: String
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub app_name: String,
    pub environment: String,
    pub placement: PlacementInfo,
    pub github: GitHubConfig,
    pub git_workdir: PathBuf,
    pub git_timeout: Duration
}

impl AppConfig {

    pub fn from_env() -> Result<Self, ConfigError> {

        Self::from_lookup(|key| std::env::var(key).ok())

    }

    // every setting comes from `lookup`, so tests never touch the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>
    {

        // empty values count as unset, same as an unset shell variable
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let port = parse_var(&var, "PORT", 3000u16, "port number")?;
        let git_timeout_ms = parse_var(&var, "GIT_TIMEOUT_MS", 5000u64, "millisecond count")?;

        let app_name = var("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        let environment = var("APP_ENV").unwrap_or_else(|| "development".to_string());

        let pod_name = var("HOSTNAME");
        let placement = PlacementInfo {
            hostname: pod_name
                .clone()
                .or_else(sysinfo::System::host_name)
                .unwrap_or_else(|| "local".to_string()),
            pod_name: pod_name.unwrap_or_else(|| "local".to_string()),
            node_name: var("NODE_NAME").unwrap_or_else(|| "local".to_string()),
            namespace: var("NAMESPACE").unwrap_or_else(|| "default".to_string()),
            pod_ip: var("POD_IP").unwrap_or_else(|| "127.0.0.1".to_string())
        };

        let github = GitHubConfig {
            token: var("GITHUB_TOKEN"),
            owner: var("GITHUB_OWNER").unwrap_or_else(|| DEFAULT_GITHUB_OWNER.to_string()),
            repo: var("GITHUB_REPO").unwrap_or_else(|| app_name.clone()),
            api_url: var("GITHUB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
        };

        Ok(AppConfig {
            port,
            app_name,
            environment,
            placement,
            github,
            git_workdir: var("GIT_WORKDIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            git_timeout: Duration::from_millis(git_timeout_ms)
        })

    }

    pub fn is_development(&self) -> bool {

        self.environment == "development"

    }

}

fn parse_var<V, T>(var: &V, name: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    V: Fn(&str) -> Option<String>,
    T: std::str::FromStr
{

    match var(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value
        }),
        None => Ok(default)
    }

}
