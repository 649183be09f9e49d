use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// current time as an ISO-8601 string with millisecond precision
pub fn timestamp() -> String {

    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)

}

#[derive(Debug, Serialize)]
pub struct EndpointIndex {
    pub health: &'static str,
    #[serde(rename = "apiStatus")]
    pub api_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<&'static str>,
    pub users: &'static str,
    pub services: &'static str
}

impl EndpointIndex {

    pub fn with_api() -> Self {

        EndpointIndex {
            api: Some("/api"),
            ..Self::without_api()
        }

    }

    pub fn without_api() -> Self {

        EndpointIndex {
            health: "/health",
            api_status: "/api-status",
            api: None,
            users: "/api/users",
            services: "/api/services"
        }

    }

}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeResponse {
    pub message: String,
    pub environment: String,
    pub version: &'static str,
    pub timestamp: String,
    pub hostname: String,
    pub pod_name: String,
    pub node_name: String,
    pub namespace: String,
    pub endpoints: EndpointIndex
}

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub documentation: &'static str
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementInfo {
    pub hostname: String,
    pub pod_name: String,
    pub node_name: String,
    pub namespace: String,
    #[serde(rename = "podIP")]
    pub pod_ip: String
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub hash: String,
    pub full_hash: String,
    pub author: String,
    pub email: String,
    pub date: String,
    pub message: String
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalGitInfo {
    pub branch: String,
    pub last_commit: CommitInfo
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub default_branch: String,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub language: Option<String>,
    pub updated_at: String,
    pub created_at: String
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSummary {
    pub name: String,
    pub protected: bool,
    pub last_commit: String
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCommit {
    pub hash: String,
    pub full_hash: String,
    pub author: String,
    pub email: String,
    pub date: String,
    pub message: String,
    pub url: String
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRepoInfo {
    pub repo: RepoSummary,
    pub branches: Vec<BranchSummary>,
    pub latest_commit: Option<RemoteCommit>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub id: u64,
    pub name: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub url: String,
    pub branch: Option<String>,
    pub commit: String
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryInfo {
    pub local: Option<LocalGitInfo>,
    pub github: Option<RemoteRepoInfo>,
    pub workflows: Option<Vec<WorkflowRun>>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss: u64,
    pub virtual_memory: u64
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuUsage {
    pub percent: f32,
    pub total_millis: u64
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSnapshot {
    pub runtime_version: &'static str,
    pub platform: &'static str,
    pub arch: &'static str,
    pub memory: MemoryUsage,
    pub cpu_usage: CpuUsage
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime: f64,
    pub timestamp: String,
    pub memory: MemoryUsage,
    pub version: &'static str,
    pub environment: String,
    pub git: Option<LocalGitInfo>
}

#[derive(Debug, Serialize)]
pub struct HealthFailure {
    pub status: &'static str,
    pub error: &'static str,
    pub timestamp: String
}

#[derive(Debug, Serialize)]
pub struct ServiceIdentity {
    pub name: String,
    pub version: &'static str,
    pub status: &'static str,
    pub uptime: f64,
    pub timestamp: String,
    pub environment: String,
    pub port: u16
}

#[derive(Debug, Serialize)]
pub struct GitSection {
    pub local: Option<LocalGitInfo>
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub service: ServiceIdentity,
    pub pod: PlacementInfo,
    pub system: RuntimeSnapshot,
    pub git: GitSection,
    pub endpoints: EndpointIndex,
    pub response_time: u64
}

#[derive(Debug, Serialize)]
pub struct DegradedIdentity {
    pub name: String,
    pub status: &'static str,
    pub timestamp: String
}

#[derive(Debug, Serialize)]
pub struct StatusFailure {
    pub service: DegradedIdentity,
    pub error: &'static str
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockUser {
    pub id: u32,
    pub name: &'static str,
    pub email: &'static str,
    pub role: &'static str
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Running,
    Maintenance,
    Deploying,
    Error
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockService {
    pub id: &'static str,
    pub name: &'static str,
    pub status: ServiceStatus,
    pub version: &'static str,
    pub last_deployed: &'static str
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: &'static [MockUser],
    pub total: usize,
    pub timestamp: String
}

#[derive(Debug, Serialize)]
pub struct ServiceList {
    pub services: &'static [MockService],
    pub total: usize,
    pub timestamp: String
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetrics {
    pub requests: u32,
    pub errors: u32,
    pub response_time: u32
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetail {
    pub id: String,
    pub name: String,
    pub status: ServiceStatus,
    pub version: &'static str,
    pub last_deployed: String,
    pub endpoints: Vec<String>,
    pub dependencies: [&'static str; 2],
    pub metrics: ServiceMetrics
}

// name and version are kept as raw JSON so that a missing or mistyped field
// reaches validation instead of failing deserialization
#[derive(Debug, Default, Deserialize)]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub version: Option<Value>
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    pub id: String,
    pub name: Value,
    pub version: Value,
    pub status: ServiceStatus,
    pub last_deployed: String
}

#[cfg(test)]
mod tests {

    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_is_rfc3339() {

        let ts = timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok(), "bad timestamp {ts}");
        assert!(ts.ends_with('Z'));

    }

    #[test]
    fn test_endpoint_index_variants() {

        let with_api = serde_json::to_value(EndpointIndex::with_api()).unwrap();
        assert_eq!(with_api["api"], "/api");
        assert_eq!(with_api["apiStatus"], "/api-status");

        let without_api = serde_json::to_value(EndpointIndex::without_api()).unwrap();
        assert!(without_api.get("api").is_none());
        assert_eq!(without_api.as_object().unwrap().len(), 4);

    }

    #[test]
    fn test_placement_uses_pod_ip_key() {

        let placement = PlacementInfo {
            hostname: "h".to_string(),
            pod_name: "p".to_string(),
            node_name: "n".to_string(),
            namespace: "default".to_string(),
            pod_ip: "10.0.0.1".to_string()
        };

        let value = serde_json::to_value(placement).unwrap();
        assert_eq!(value["podIP"], "10.0.0.1");
        assert_eq!(value["podName"], "p");

    }

    #[test]
    fn test_create_request_ignores_extra_fields() {

        let req: CreateServiceRequest = serde_json::from_value(json!({
            "name": "svc",
            "version": "1.0.0",
            "owner": "team-a"
        })).unwrap();

        assert_eq!(req.name, Some(json!("svc")));
        assert_eq!(req.version, Some(json!("1.0.0")));

    }

    #[test]
    fn test_service_status_serializes_lowercase() {

        assert_eq!(serde_json::to_value(ServiceStatus::Deploying).unwrap(), "deploying");
        assert_eq!(serde_json::to_value(ServiceStatus::Maintenance).unwrap(), "maintenance");

    }

}
