//! Health and status payloads.
//!
//! Both payloads combine process metrics with the local git probe. A failure
//! of the git probe itself is already folded into `None`; what is handled here
//! is the probe task dying or the process metrics being unreadable.

use std::sync::Arc;
use std::time::Instant;

use sysinfo::{ProcessesToUpdate, System};
use tracing::error;

use crate::config::AppConfig;
use crate::git::LocalRepoProbe;
use crate::models::{
    timestamp, CpuUsage, DegradedIdentity, EndpointIndex, GitSection, HealthFailure, HealthReport,
    LocalGitInfo, MemoryUsage, RuntimeSnapshot, ServiceIdentity, StatusFailure, StatusReport
};

pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {

    #[error("could not determine current process: {0}")]
    Pid(&'static str),

    #[error("process {0} not found in process table")]
    ProcessMissing(sysinfo::Pid),

    #[error("local git probe task failed: {0}")]
    Probe(#[from] tokio::task::JoinError)

}

// minimum toolchain the binary was built for
const RUNTIME_VERSION: &str = concat!("rust ", env!("CARGO_PKG_RUST_VERSION"));

impl RuntimeSnapshot {

    pub fn capture() -> Result<Self, RuntimeError> {

        let pid = sysinfo::get_current_pid().map_err(RuntimeError::Pid)?;

        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let process = system.process(pid).ok_or(RuntimeError::ProcessMissing(pid))?;

        Ok(RuntimeSnapshot {
            runtime_version: RUNTIME_VERSION,
            platform: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            memory: MemoryUsage {
                rss: process.memory(),
                virtual_memory: process.virtual_memory()
            },
            cpu_usage: CpuUsage {
                percent: process.cpu_usage(),
                total_millis: process.accumulated_cpu_time()
            }
        })

    }

}

/// Builds the `/health` and `/api-status` payloads.
#[derive(Clone)]
pub struct StatusAggregator {
    config: Arc<AppConfig>,
    probe: Arc<dyn LocalRepoProbe>,
    started_at: Instant
}

impl StatusAggregator {

    pub fn new(config: Arc<AppConfig>, probe: Arc<dyn LocalRepoProbe>, started_at: Instant) -> Self {

        StatusAggregator { config, probe, started_at }

    }

    fn uptime(&self) -> f64 {

        self.started_at.elapsed().as_secs_f64()

    }

    // the probe runs in its own task so a panic inside it cannot take the request down
    async fn local_git(&self) -> Result<Option<LocalGitInfo>, RuntimeError> {

        let probe = self.probe.clone();
        let info = tokio::spawn(async move { probe.local_info().await }).await?;
        Ok(info)

    }

    async fn try_health(&self) -> Result<HealthReport, RuntimeError> {

        let git = self.local_git().await?;
        let runtime = RuntimeSnapshot::capture()?;

        Ok(HealthReport {
            status: "healthy",
            uptime: self.uptime(),
            timestamp: timestamp(),
            memory: runtime.memory,
            version: runtime.runtime_version,
            environment: self.config.environment.clone(),
            git
        })

    }

    pub async fn health(&self) -> Result<HealthReport, HealthFailure> {

        self.try_health().await.map_err(|e| {
            error!(error = %e, "Health check error");
            HealthFailure {
                status: "unhealthy",
                error: "Failed to get health information",
                timestamp: timestamp()
            }
        })

    }

    async fn try_status(&self) -> Result<StatusReport, RuntimeError> {

        let started = Instant::now();

        let git = self.local_git().await?;
        let system = RuntimeSnapshot::capture()?;

        Ok(StatusReport {
            service: ServiceIdentity {
                name: self.config.app_name.clone(),
                version: SERVICE_VERSION,
                status: "running",
                uptime: self.uptime(),
                timestamp: timestamp(),
                environment: self.config.environment.clone(),
                port: self.config.port
            },
            pod: self.config.placement.clone(),
            system,
            git: GitSection { local: git },
            endpoints: EndpointIndex::without_api(),
            response_time: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
        })

    }

    pub async fn status(&self) -> Result<StatusReport, StatusFailure> {

        self.try_status().await.map_err(|e| {
            error!(error = %e, "API status error");
            StatusFailure {
                service: DegradedIdentity {
                    name: self.config.app_name.clone(),
                    status: "error",
                    timestamp: timestamp()
                },
                error: "Failed to get API status information"
            }
        })

    }

}
