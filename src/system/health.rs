//! Health checks and service information

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::core::AppState;
use crate::storage::CatalogStats;

/// Prefix of the blob keys used to probe the storage backend
const PROBE_PREFIX: &str = "health-probe-";

/// System health status reported by `/api/v4/health/`
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall service health status
    pub status: ServiceStatus,
    /// Seconds since the state was built
    pub uptime: u64,
    /// Blob storage backend name
    pub storage: &'static str,
    /// Whether the storage probe succeeded
    pub storage_ok: bool,
    /// Most recent error message (if any)
    pub last_error: Option<String>,
}

/// Service health status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Every subsystem responds
    Healthy,
    /// A subsystem failed its probe
    Unhealthy,
}

/// Static description of the running service for `/api/v4/info/`
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    /// Package name
    pub name: &'static str,
    /// Package version
    pub version: &'static str,
    /// API base path
    pub api_base: &'static str,
    /// Blob storage backend name
    pub storage: &'static str,
    /// Whether uploads complete inside the request
    pub eager_ingest: bool,
    /// Entity counts
    pub catalog: CatalogStats,
}

/// Health checker for the service's subsystems
pub struct HealthChecker<'a> {
    state: &'a AppState,
}

impl<'a> HealthChecker<'a> {
    /// Create a checker over the application state
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Probe every subsystem
    pub fn check(&self) -> HealthStatus {
        let storage_probe = self.check_storage();
        let status = if storage_probe.is_ok() {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        };

        HealthStatus {
            status,
            uptime: self.state.started_at.elapsed().as_secs(),
            storage: self.state.files.name(),
            storage_ok: storage_probe.is_ok(),
            last_error: storage_probe.err(),
        }
    }

    /// Write, read back and delete a probe blob
    ///
    /// Each check uses its own key, so overlapping checks never see each
    /// other's probe.
    fn check_storage(&self) -> std::result::Result<(), String> {
        let files = &self.state.files;
        let key = format!("{}{}", PROBE_PREFIX, Uuid::new_v4().simple());
        let payload = Bytes::from_static(b"ok");
        files.put(&key, payload.clone()).map_err(|e| e.to_string())?;
        let read = files.get(&key).map_err(|e| e.to_string())?;
        files.delete(&key).map_err(|e| e.to_string())?;
        if read != payload {
            return Err("storage probe returned different bytes".to_string());
        }
        Ok(())
    }

    /// Describe the service
    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            name: crate::NAME,
            version: crate::VERSION,
            api_base: crate::api::API_BASE,
            storage: self.state.files.name(),
            eager_ingest: self.state.ingest.is_eager(),
            catalog: self.state.catalog.stats(),
        }
    }
}
